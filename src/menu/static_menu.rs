//! Conversation states.

use std::collections::HashMap;

use crate::action::{ActionSet, ActionSource, ConditionTable, NamedConditions};
use crate::handlers::{handler, Handler, HandlerResult};
use crate::session::SessionContext;
use crate::text::TextBuilder;
use crate::transport::MediaKind;

/// A conversation state: text, reply keyboard, middleware and raw handlers
///
/// Built once while registering, then shared read-only by every event.
pub struct StaticMenu<U> {
    text: TextBuilder<U>,
    actions: ActionSource<U>,
    conditions: ConditionTable<U>,
    middlewares: Vec<Handler<U>>,
    raw_handlers: HashMap<MediaKind, Handler<U>>,
    default_raw_handler: Option<Handler<U>>,
}

impl<U> Default for StaticMenu<U> {
    fn default() -> Self {
        Self {
            text: TextBuilder::static_text(""),
            actions: ActionSource::from(ActionSet::new()),
            conditions: ConditionTable::default(),
            middlewares: Vec::new(),
            raw_handlers: HashMap::new(),
            default_raw_handler: None,
        }
    }
}

impl<U> StaticMenu<U> {
    pub fn new(text: impl Into<TextBuilder<U>>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_actions(mut self, actions: impl Into<ActionSource<U>>) -> Self {
        self.actions = actions.into();
        self
    }

    /// Actions built per event
    pub fn with_deferred_actions<F>(mut self, build: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> ActionSet<U> + Send + Sync + 'static,
    {
        self.actions = ActionSource::deferred(build);
        self
    }

    /// Define a named condition used by `when` / `unless` on this menu's actions
    pub fn define_condition<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> bool + Send + Sync + 'static,
    {
        self.conditions.define(name, predicate);
        self
    }

    /// Append a middleware; middleware runs in registration order
    pub fn with_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.middlewares.push(handler(middleware));
        self
    }

    /// Handle messages of a media kind that matched no action
    pub fn on_media<F>(mut self, kind: MediaKind, raw_handler: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.raw_handlers.insert(kind, handler(raw_handler));
        self
    }

    pub fn on_text<F>(self, raw_handler: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_media(MediaKind::Text, raw_handler)
    }

    pub fn on_photo<F>(self, raw_handler: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_media(MediaKind::Photo, raw_handler)
    }

    /// Handle any message no media-specific handler claimed
    pub fn on_any<F>(mut self, raw_handler: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.default_raw_handler = Some(handler(raw_handler));
        self
    }

    pub fn text(&self) -> &TextBuilder<U> {
        &self.text
    }

    pub fn actions(&self) -> &ActionSource<U> {
        &self.actions
    }

    pub fn middlewares(&self) -> &[Handler<U>] {
        &self.middlewares
    }

    pub fn evaluate_conditions(&self, ctx: &SessionContext<U>) -> NamedConditions {
        self.conditions.evaluate(ctx)
    }

    /// Raw handler for a media kind, falling back to the default one
    pub fn raw_handler(&self, kind: MediaKind) -> Option<&Handler<U>> {
        self.raw_handlers
            .get(&kind)
            .or(self.default_raw_handler.as_ref())
    }
}
