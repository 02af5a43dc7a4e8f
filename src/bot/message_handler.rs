//! Message Handler module: static-menu dispatch for inbound messages

use tracing::debug;

use super::{guarded, ui_builder, Engine, Stop};
use crate::action::ActionEffect;
use crate::handlers::{Flow, SwitchAction};
use crate::menu::StaticMenu;
use crate::session::SessionContext;

impl<U: Send + Sync + 'static> Engine<U> {
    /// Route a message to the static menu of the user's current state
    pub(crate) async fn process_message(&self, ctx: &mut SessionContext<U>) -> Result<(), Stop> {
        let menu = self.static_menu(ctx.state())?;

        match self.run_static_menu(ctx, menu).await? {
            Some(action) => self.switch(ctx, action).await,
            None => Ok(()),
        }
    }

    /// Run one static menu invocation: middleware, action matching, raw
    /// handlers, then the default reply
    ///
    /// Matching and raw handlers are skipped on continuations so the target
    /// state only renders. Returns the transition requested along the way.
    pub(crate) async fn run_static_menu(
        &self,
        ctx: &mut SessionContext<U>,
        menu: &StaticMenu<U>,
    ) -> Result<Option<SwitchAction>, Stop> {
        for middleware in menu.middlewares() {
            match self.run_guarded(ctx, |ctx| middleware(ctx)).await? {
                Flow::Continue => {}
                Flow::Halt => return Ok(None),
                Flow::Switch(action) => return Ok(Some(action)),
            }
        }

        let actions = guarded(|| menu.actions().resolve(ctx))?;
        let conditions = guarded(|| menu.evaluate_conditions(ctx))?;

        // Set once user code may have changed what the conditions see
        let mut handler_ran = false;

        if !ctx.is_switched() {
            let mut run_raw_handler = true;

            if let Some(text) = ctx.event().message_text().map(str::to_string) {
                let matched = guarded(|| actions.find_by_text(&text, ctx, &conditions))?;

                if let Some(action) = matched {
                    debug!(user_id = %ctx.user_id(), state = %ctx.state(), action = ?action.effect(), "Matched action");

                    match action.effect() {
                        ActionEffect::Text(reply) => {
                            let reply = guarded(|| reply.resolve(ctx))?;
                            if !reply.is_empty() {
                                ctx.reply(reply);
                            }
                            self.flush(ctx).await?;
                            return Ok(None);
                        }
                        ActionEffect::SwitchState(state) => {
                            return Ok(Some(SwitchAction::state(state.clone())))
                        }
                        ActionEffect::OpenInlineMenu(name) => {
                            return Ok(Some(SwitchAction::inline_menu(name.clone(), false)))
                        }
                        ActionEffect::Raw => {}
                        ActionEffect::Custom(custom) => {
                            handler_ran = true;
                            match self.run_guarded(ctx, |ctx| custom(ctx)).await? {
                                Flow::Continue => run_raw_handler = false,
                                Flow::Halt => return Ok(None),
                                Flow::Switch(action) => return Ok(Some(action)),
                            }
                        }
                    }
                }
            }

            let raw_handler = ctx
                .event()
                .media_kind()
                .and_then(|kind| menu.raw_handler(kind));

            if let Some(raw_handler) = raw_handler.filter(|_| run_raw_handler) {
                handler_ran = true;
                match self.run_guarded(ctx, |ctx| raw_handler(ctx)).await? {
                    Flow::Continue => {}
                    Flow::Halt => return Ok(None),
                    Flow::Switch(action) => return Ok(Some(action)),
                }
            }
        }

        let (actions, conditions) = if handler_ran {
            (
                guarded(|| menu.actions().resolve(ctx))?,
                guarded(|| menu.evaluate_conditions(ctx))?,
            )
        } else {
            (actions, conditions)
        };

        let text = guarded(|| menu.text().resolve(ctx))?;
        let request = guarded(|| {
            ui_builder::static_menu_message(
                text,
                &actions,
                &conditions,
                ctx,
                self.config.default_max_per_row,
            )
        })?;

        if let Some(request) = request {
            ctx.send(request);
            self.flush(ctx).await?;
        }

        Ok(None)
    }
}
