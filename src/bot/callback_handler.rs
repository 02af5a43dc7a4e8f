//! Callback Handler module: inline-menu dispatch for inline keyboard clicks

use tracing::debug;

use super::{guarded, ui_builder, Engine, Stop};
use crate::error::RouteError;
use crate::handlers::Flow;
use crate::inline_action::InlineEffect;
use crate::menu::InlineMenu;
use crate::session::SessionContext;

impl<U: Send + Sync + 'static> Engine<U> {
    pub(crate) fn inline_menu(&self, name: &str) -> Result<&InlineMenu<U>, RouteError> {
        self.inline_menus
            .get(name)
            .ok_or_else(|| RouteError::UnknownInlineMenu(name.to_string()))
    }

    /// Route a click to the inline menu named by its callback data
    pub(crate) async fn process_callback(&self, ctx: &mut SessionContext<U>) -> Result<(), Stop> {
        let payload = ctx
            .event()
            .callback_data()
            .and_then(|data| self.codec.decode(data));
        let Some(payload) = payload else {
            debug!(user_id = %ctx.user_id(), "Ignoring callback without data");
            return Ok(());
        };

        debug!(
            user_id = %ctx.user_id(),
            menu = %payload.menu_prefix,
            action = %payload.action_key,
            "Received callback"
        );

        let menu = self.inline_menu(&payload.menu_prefix)?;

        for middleware in menu.middlewares() {
            match self.run_guarded(ctx, |ctx| middleware(ctx)).await? {
                Flow::Continue => {}
                Flow::Halt => return Ok(()),
                Flow::Switch(action) => return self.switch(ctx, action).await,
            }
        }

        let actions = guarded(|| menu.actions().resolve(ctx))?;
        let conditions = guarded(|| menu.evaluate_conditions(ctx))?;
        let action = guarded(|| actions.find_by_key(&payload.action_key, ctx, &conditions))?
            .ok_or_else(|| RouteError::UnknownCallbackAction {
                menu: payload.menu_prefix.clone(),
                action: payload.action_key.clone(),
            })?;

        match action.effect() {
            InlineEffect::Alert { text, show_alert } => {
                let text = guarded(|| text.resolve(ctx))?;
                ctx.answer_callback(Some(text), *show_alert);
                self.flush(ctx).await?;
            }
            InlineEffect::SwitchState(state) => {
                self.switch_state(ctx, state.clone()).await?;
            }
            InlineEffect::OpenInlineMenu { menu, edit } => {
                self.open_inline_menu(ctx, menu, *edit).await?;
            }
            InlineEffect::Callback(callback) => {
                let args = payload.args.as_slice();
                let flow = self.run_guarded(ctx, |ctx| callback(ctx, args)).await?;
                if let Flow::Switch(action) = flow {
                    self.switch(ctx, action).await?;
                }
            }
            // URL buttons never produce callbacks
            InlineEffect::Url(_) => {}
        }

        Ok(())
    }

    /// Render an inline menu, editing the clicked message when `edit` is set
    pub(crate) async fn open_inline_menu(
        &self,
        ctx: &mut SessionContext<U>,
        name: &str,
        edit: bool,
    ) -> Result<(), Stop> {
        let menu = self.inline_menu(name)?;
        debug!(user_id = %ctx.user_id(), menu = %name, edit = edit, "Opening inline menu");

        let actions = guarded(|| menu.actions().resolve(ctx))?;
        let conditions = guarded(|| menu.evaluate_conditions(ctx))?;
        let text = guarded(|| menu.text().resolve(ctx))?;
        let request = guarded(|| {
            ui_builder::inline_menu_message(
                name,
                text,
                &actions,
                &conditions,
                ctx,
                &self.codec,
                self.config.default_max_per_row,
                edit,
            )
        })?;

        if let Some(request) = request {
            ctx.send(request);
            self.flush(ctx).await?;
        }

        Ok(())
    }
}
