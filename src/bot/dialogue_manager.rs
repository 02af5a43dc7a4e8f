//! Dialogue Manager module: conversation-state loading and state switches

use tracing::{debug, info, warn};

use super::{Engine, Stop};
use crate::error::RouteError;
use crate::handlers::SwitchAction;
use crate::menu::StaticMenu;
use crate::session::SessionContext;

impl<U: Send + Sync + 'static> Engine<U> {
    pub(crate) fn static_menu(&self, state: &str) -> Result<&StaticMenu<U>, RouteError> {
        self.static_menus
            .get(state)
            .ok_or_else(|| RouteError::UnknownState(state.to_string()))
    }

    /// Stored state of the user, assigning the default state on first contact
    /// or when the stored state is no longer registered
    pub(crate) async fn load_state(&self, user_id: i64) -> Result<String, RouteError> {
        let stored = self
            .users
            .get_state(user_id)
            .await
            .map_err(|e| RouteError::collaborator(user_id, "get_state", e))?;

        match stored {
            Some(state) if self.static_menus.contains_key(&state) => Ok(state),
            stored => {
                if let Some(stale) = stored.filter(|state| !state.is_empty()) {
                    warn!(user_id = %user_id, state = %stale, "Stored state is not registered, resetting");
                }

                let default_state = &self.config.default_state;
                if default_state.is_empty() {
                    return Err(RouteError::MissingDefaultState);
                }

                debug!(user_id = %user_id, state = %default_state, "Assigning default state");
                self.users
                    .set_state(user_id, default_state)
                    .await
                    .map_err(|e| RouteError::collaborator(user_id, "set_state", e))?;
                Ok(default_state.clone())
            }
        }
    }

    /// Perform a transition requested by a middleware, handler or button
    pub(crate) async fn switch(
        &self,
        ctx: &mut SessionContext<U>,
        action: SwitchAction,
    ) -> Result<(), Stop> {
        match action {
            SwitchAction::State(state) => self.switch_state(ctx, state).await,
            SwitchAction::InlineMenu { name, edit } => self.open_inline_menu(ctx, &name, edit).await,
        }
    }

    /// Persist `target` and run its menu as a continuation
    ///
    /// A continuation may itself switch again; the cascade is bounded by
    /// `max_switch_hops`.
    pub(crate) async fn switch_state(
        &self,
        ctx: &mut SessionContext<U>,
        mut target: String,
    ) -> Result<(), Stop> {
        let user_id = ctx.user_id();
        let limit = self.config.switch_hop_limit();
        let mut hops = 0;

        loop {
            hops += 1;
            if hops > limit {
                return Err(RouteError::SwitchLimitExceeded {
                    limit,
                    state: target,
                }
                .into());
            }

            let menu = self.static_menu(&target)?;
            self.users
                .set_state(user_id, &target)
                .await
                .map_err(|e| RouteError::collaborator(user_id, "set_state", e))?;

            info!(user_id = %user_id, from = %ctx.state(), to = %target, "Switching state");
            ctx.enter_switched_state(&target);

            match self.run_static_menu(ctx, menu).await? {
                None => return Ok(()),
                Some(SwitchAction::State(next)) => target = next,
                Some(SwitchAction::InlineMenu { name, edit }) => {
                    return self.open_inline_menu(ctx, &name, edit).await
                }
            }
        }
    }
}
