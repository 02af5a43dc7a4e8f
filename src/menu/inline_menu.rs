//! Inline menus.

use crate::action::{ConditionTable, NamedConditions};
use crate::handlers::{handler, Handler, HandlerResult};
use crate::inline_action::{InlineActionSet, InlineActionSource};
use crate::session::SessionContext;
use crate::text::TextBuilder;

/// A message with an attached inline keyboard
///
/// The menu's registered name is the prefix of its buttons' callback data.
pub struct InlineMenu<U> {
    text: TextBuilder<U>,
    actions: InlineActionSource<U>,
    conditions: ConditionTable<U>,
    middlewares: Vec<Handler<U>>,
}

impl<U> InlineMenu<U> {
    pub fn new(text: impl Into<TextBuilder<U>>) -> Self {
        Self {
            text: text.into(),
            actions: InlineActionSource::from(InlineActionSet::new()),
            conditions: ConditionTable::default(),
            middlewares: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: impl Into<InlineActionSource<U>>) -> Self {
        self.actions = actions.into();
        self
    }

    pub fn with_deferred_actions<F>(mut self, build: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> InlineActionSet<U> + Send + Sync + 'static,
    {
        self.actions = InlineActionSource::deferred(build);
        self
    }

    pub fn define_condition<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> bool + Send + Sync + 'static,
    {
        self.conditions.define(name, predicate);
        self
    }

    /// Middleware run before a click on this menu is dispatched
    pub fn with_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
    {
        self.middlewares.push(handler(middleware));
        self
    }

    pub fn text(&self) -> &TextBuilder<U> {
        &self.text
    }

    pub fn actions(&self) -> &InlineActionSource<U> {
        &self.actions
    }

    pub fn middlewares(&self) -> &[Handler<U>] {
        &self.middlewares
    }

    pub fn evaluate_conditions(&self, ctx: &SessionContext<U>) -> NamedConditions {
        self.conditions.evaluate(ctx)
    }
}
