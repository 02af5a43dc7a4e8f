//! Buttons of inline menus.
//!
//! Every non-URL inline action carries a key (and optional fixed args) that
//! becomes its callback data; clicks are routed back to the action by key.

use std::fmt;
use std::sync::Arc;

use crate::action::{visibility_builders, NamedConditions, Visibility};
use crate::callback_data::CallbackCodec;
use crate::handlers::CallbackHandler;
use crate::layout::{arrange_with_fallback, ButtonOptions, RowPolicy};
use crate::session::SessionContext;
use crate::text::TextBuilder;
use crate::transport::{InlineButton, InlineTarget};

/// Effect of an inline action
pub enum InlineEffect<U> {
    /// Open a link; never reaches the engine
    Url(String),
    /// Render another inline menu, in place when `edit` is set
    OpenInlineMenu { menu: String, edit: bool },
    /// Answer the callback with a toast, or a dialog when `show_alert` is set
    Alert { text: TextBuilder<U>, show_alert: bool },
    /// Switch to a conversation state
    SwitchState(String),
    /// Run the handler with the payload's args
    Callback(CallbackHandler<U>),
}

impl<U> Clone for InlineEffect<U> {
    fn clone(&self) -> Self {
        match self {
            InlineEffect::Url(url) => InlineEffect::Url(url.clone()),
            InlineEffect::OpenInlineMenu { menu, edit } => InlineEffect::OpenInlineMenu {
                menu: menu.clone(),
                edit: *edit,
            },
            InlineEffect::Alert { text, show_alert } => InlineEffect::Alert {
                text: text.clone(),
                show_alert: *show_alert,
            },
            InlineEffect::SwitchState(state) => InlineEffect::SwitchState(state.clone()),
            InlineEffect::Callback(handler) => InlineEffect::Callback(Arc::clone(handler)),
        }
    }
}

impl<U> fmt::Debug for InlineEffect<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineEffect::Url(url) => f.debug_tuple("Url").field(url).finish(),
            InlineEffect::OpenInlineMenu { menu, edit } => f
                .debug_struct("OpenInlineMenu")
                .field("menu", menu)
                .field("edit", edit)
                .finish(),
            InlineEffect::Alert { text, show_alert } => f
                .debug_struct("Alert")
                .field("text", text)
                .field("show_alert", show_alert)
                .finish(),
            InlineEffect::SwitchState(state) => f.debug_tuple("SwitchState").field(state).finish(),
            InlineEffect::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A button of an inline menu
pub struct InlineAction<U> {
    label: TextBuilder<U>,
    key: String,
    args: Vec<String>,
    effect: InlineEffect<U>,
    visibility: Visibility<U>,
    options: ButtonOptions,
}

impl<U> Clone for InlineAction<U> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            key: self.key.clone(),
            args: self.args.clone(),
            effect: self.effect.clone(),
            visibility: self.visibility.clone(),
            options: self.options,
        }
    }
}

impl<U> fmt::Debug for InlineAction<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineAction")
            .field("label", &self.label)
            .field("key", &self.key)
            .field("args", &self.args)
            .field("effect", &self.effect)
            .finish()
    }
}

impl<U> InlineAction<U> {
    pub fn new(
        label: impl Into<TextBuilder<U>>,
        key: impl Into<String>,
        effect: InlineEffect<U>,
    ) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            args: Vec::new(),
            effect,
            visibility: Visibility::default(),
            options: ButtonOptions::default(),
        }
    }

    pub fn url(label: impl Into<TextBuilder<U>>, url: impl Into<String>) -> Self {
        Self::new(label, "", InlineEffect::Url(url.into()))
    }

    pub fn inline_menu(
        label: impl Into<TextBuilder<U>>,
        key: impl Into<String>,
        menu: impl Into<String>,
        edit: bool,
    ) -> Self {
        Self::new(
            label,
            key,
            InlineEffect::OpenInlineMenu {
                menu: menu.into(),
                edit,
            },
        )
    }

    pub fn alert(
        label: impl Into<TextBuilder<U>>,
        key: impl Into<String>,
        text: impl Into<TextBuilder<U>>,
        show_alert: bool,
    ) -> Self {
        Self::new(
            label,
            key,
            InlineEffect::Alert {
                text: text.into(),
                show_alert,
            },
        )
    }

    pub fn switch_state(
        label: impl Into<TextBuilder<U>>,
        key: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self::new(label, key, InlineEffect::SwitchState(state.into()))
    }

    pub fn callback(
        label: impl Into<TextBuilder<U>>,
        key: impl Into<String>,
        handler: CallbackHandler<U>,
    ) -> Self {
        Self::new(label, key, InlineEffect::Callback(handler))
    }

    /// Fixed args appended to the callback data
    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    visibility_builders!();

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn effect(&self) -> &InlineEffect<U> {
        &self.effect
    }

    pub fn options(&self) -> ButtonOptions {
        self.options
    }

    pub fn label(&self, ctx: &SessionContext<U>) -> String {
        self.label.resolve(ctx)
    }

    pub fn is_visible(&self, ctx: &SessionContext<U>, conditions: &NamedConditions) -> bool {
        self.visibility.is_visible(ctx, conditions)
    }

    /// Render as a keyboard button of the named menu
    pub fn to_button(
        &self,
        menu_name: &str,
        codec: &CallbackCodec,
        ctx: &SessionContext<U>,
    ) -> InlineButton {
        let target = match &self.effect {
            InlineEffect::Url(url) => InlineTarget::Url(url.clone()),
            _ => InlineTarget::Callback(codec.encode(menu_name, &self.key, &self.args)),
        };

        InlineButton {
            text: self.label(ctx),
            target,
        }
    }
}

/// Buttons of an inline menu plus their row policy
pub struct InlineActionSet<U> {
    actions: Vec<InlineAction<U>>,
    policy: RowPolicy,
}

impl<U> Default for InlineActionSet<U> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            policy: RowPolicy::default(),
        }
    }
}

impl<U> InlineActionSet<U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: InlineAction<U>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn max_per_row(mut self, max: usize) -> Self {
        self.policy.max_per_row = Some(max);
        self
    }

    pub fn formation(mut self, formation: impl Into<Vec<usize>>) -> Self {
        self.policy.formation = formation.into();
        self
    }

    pub fn actions(&self) -> &[InlineAction<U>] {
        &self.actions
    }

    /// First visible, non-URL action with the given key
    pub fn find_by_key(
        &self,
        key: &str,
        ctx: &SessionContext<U>,
        conditions: &NamedConditions,
    ) -> Option<&InlineAction<U>> {
        self.actions.iter().find(|action| {
            !matches!(action.effect, InlineEffect::Url(_))
                && action.key == key
                && action.is_visible(ctx, conditions)
        })
    }

    /// Rows of visible buttons for the named menu
    pub fn keyboard(
        &self,
        menu_name: &str,
        codec: &CallbackCodec,
        ctx: &SessionContext<U>,
        conditions: &NamedConditions,
        fallback_per_row: usize,
    ) -> Vec<Vec<InlineButton>> {
        let buttons = self
            .actions
            .iter()
            .filter(|action| action.is_visible(ctx, conditions))
            .map(|action| (action.to_button(menu_name, codec, ctx), action.options()))
            .collect();

        arrange_with_fallback(buttons, &self.policy, fallback_per_row)
    }
}

/// Fixed or per-event inline action set
pub enum InlineActionSource<U> {
    Fixed(Arc<InlineActionSet<U>>),
    Deferred(Arc<dyn Fn(&SessionContext<U>) -> InlineActionSet<U> + Send + Sync>),
}

impl<U> InlineActionSource<U> {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> InlineActionSet<U> + Send + Sync + 'static,
    {
        InlineActionSource::Deferred(Arc::new(f))
    }

    pub fn resolve(&self, ctx: &SessionContext<U>) -> Arc<InlineActionSet<U>> {
        match self {
            InlineActionSource::Fixed(set) => Arc::clone(set),
            InlineActionSource::Deferred(build) => Arc::new(build(ctx)),
        }
    }
}

impl<U> From<InlineActionSet<U>> for InlineActionSource<U> {
    fn from(set: InlineActionSet<U>) -> Self {
        InlineActionSource::Fixed(Arc::new(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{callback_handler, Flow};
    use crate::transport::{InboundEvent, Sender};

    fn context() -> SessionContext<()> {
        let from = Sender {
            id: 9,
            ..Default::default()
        };
        SessionContext::new((), InboundEvent::callback(from, "q", "Info:x", Some(1)), "Welcome")
    }

    #[test]
    fn test_buttons_encode_menu_and_key() {
        let ctx = context();
        let set: InlineActionSet<()> = InlineActionSet::new()
            .action(InlineAction::url("Site", "https://example.com"))
            .action(InlineAction::alert("Hi", "hello", "Hello there", false).with_args(["1", "2"]));

        let rows = set.keyboard(
            "Info",
            &CallbackCodec::default(),
            &ctx,
            &NamedConditions::default(),
            2,
        );
        assert_eq!(
            rows,
            vec![vec![
                InlineButton {
                    text: "Site".to_string(),
                    target: InlineTarget::Url("https://example.com".to_string()),
                },
                InlineButton {
                    text: "Hi".to_string(),
                    target: InlineTarget::Callback("Info:hello:1:2".to_string()),
                },
            ]]
        );
    }

    #[test]
    fn test_find_by_key_skips_hidden_and_urls() {
        let ctx = context();
        let mut conditions = NamedConditions::default();
        conditions.insert("paid", false);

        let set: InlineActionSet<()> = InlineActionSet::new()
            .action(InlineAction::url("Link", ""))
            .action(
                InlineAction::callback("Buy", "buy", callback_handler(|_ctx, _args| Ok(Flow::Halt)))
                    .when("paid"),
            )
            .action(InlineAction::switch_state("Back", "back", "Welcome"));

        assert!(set.find_by_key("", &ctx, &conditions).is_none());
        assert!(set.find_by_key("buy", &ctx, &conditions).is_none());
        assert!(set.find_by_key("back", &ctx, &conditions).is_some());

        conditions.insert("paid", true);
        assert!(set.find_by_key("buy", &ctx, &conditions).is_some());
    }
}
