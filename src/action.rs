//! # Action Module
//!
//! Buttons and commands of static menus, their visibility rules and the
//! named-condition table they are evaluated against.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handlers::{Handler, Predicate};
use crate::layout::{arrange_with_fallback, ButtonOptions, RowPolicy};
use crate::session::SessionContext;
use crate::text::TextBuilder;

/// Named boolean conditions evaluated once for a menu invocation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamedConditions(HashMap<String, bool>);

impl NamedConditions {
    /// Value of a condition; undefined conditions are false
    pub fn is_true(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: bool) {
        self.0.insert(name.into(), value);
    }
}

impl FromIterator<(String, bool)> for NamedConditions {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        NamedConditions(iter.into_iter().collect())
    }
}

/// Registry of named condition predicates
pub struct ConditionTable<U> {
    conditions: Vec<(String, Predicate<U>)>,
}

impl<U> Default for ConditionTable<U> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }
}

impl<U> ConditionTable<U> {
    /// Define (or redefine) a named condition
    pub fn define<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&SessionContext<U>) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        self.conditions.retain(|(existing, _)| *existing != name);
        self.conditions.push((name, Arc::new(predicate)));
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate every predicate exactly once against the context
    pub fn evaluate(&self, ctx: &SessionContext<U>) -> NamedConditions {
        self.conditions
            .iter()
            .map(|(name, predicate)| (name.clone(), predicate(ctx)))
            .collect()
    }
}

/// When an action is shown
///
/// All configured parts must hold: the closure, the named condition that must
/// be true and the named condition that must be false.
pub struct Visibility<U> {
    pub(crate) condition: Option<Predicate<U>>,
    pub(crate) when: Option<String>,
    pub(crate) unless: Option<String>,
}

impl<U> Default for Visibility<U> {
    fn default() -> Self {
        Self {
            condition: None,
            when: None,
            unless: None,
        }
    }
}

impl<U> Clone for Visibility<U> {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            when: self.when.clone(),
            unless: self.unless.clone(),
        }
    }
}

impl<U> Visibility<U> {
    pub fn is_visible(&self, ctx: &SessionContext<U>, conditions: &NamedConditions) -> bool {
        let when = self.when.as_deref().map_or(true, |name| conditions.is_true(name));
        let unless = self.unless.as_deref().map_or(true, |name| !conditions.is_true(name));
        let condition = self.condition.as_ref().map_or(true, |predicate| predicate(ctx));

        when && unless && condition
    }
}

/// Builder methods shared by static and inline actions
macro_rules! visibility_builders {
    () => {
        /// Show only while the named condition is true
        pub fn when(mut self, condition: impl Into<String>) -> Self {
            self.visibility.when = Some(condition.into());
            self
        }

        /// Show only while the named condition is false
        pub fn unless(mut self, condition: impl Into<String>) -> Self {
            self.visibility.unless = Some(condition.into());
            self
        }

        /// Show only while the predicate holds
        pub fn only_if<F>(mut self, predicate: F) -> Self
        where
            F: Fn(&SessionContext<U>) -> bool + Send + Sync + 'static,
        {
            self.visibility.condition = Some(Arc::new(predicate));
            self
        }

        pub fn with_options(mut self, options: ButtonOptions) -> Self {
            self.options = options;
            self
        }

        pub fn break_before(mut self) -> Self {
            self.options.break_before = true;
            self
        }

        pub fn break_after(mut self) -> Self {
            self.options.break_after = true;
            self
        }
    };
}

pub(crate) use visibility_builders;

/// Effect of a static-menu action
pub enum ActionEffect<U> {
    /// Send the text
    Text(TextBuilder<U>),
    /// Switch to the named state
    SwitchState(String),
    /// Send the named inline menu
    OpenInlineMenu(String),
    /// Do nothing; the event continues to the menu's raw handlers
    Raw,
    /// Run the handler and follow its flow
    Custom(Handler<U>),
}

impl<U> Clone for ActionEffect<U> {
    fn clone(&self) -> Self {
        match self {
            ActionEffect::Text(text) => ActionEffect::Text(text.clone()),
            ActionEffect::SwitchState(state) => ActionEffect::SwitchState(state.clone()),
            ActionEffect::OpenInlineMenu(menu) => ActionEffect::OpenInlineMenu(menu.clone()),
            ActionEffect::Raw => ActionEffect::Raw,
            ActionEffect::Custom(handler) => ActionEffect::Custom(Arc::clone(handler)),
        }
    }
}

impl<U> fmt::Debug for ActionEffect<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionEffect::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ActionEffect::SwitchState(state) => f.debug_tuple("SwitchState").field(state).finish(),
            ActionEffect::OpenInlineMenu(menu) => {
                f.debug_tuple("OpenInlineMenu").field(menu).finish()
            }
            ActionEffect::Raw => f.write_str("Raw"),
            ActionEffect::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A button or command of a static menu
pub struct Action<U> {
    label: TextBuilder<U>,
    effect: ActionEffect<U>,
    visibility: Visibility<U>,
    options: ButtonOptions,
}

impl<U> Clone for Action<U> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            effect: self.effect.clone(),
            visibility: self.visibility.clone(),
            options: self.options,
        }
    }
}

impl<U> fmt::Debug for Action<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("label", &self.label)
            .field("effect", &self.effect)
            .field("options", &self.options)
            .finish()
    }
}

impl<U> Action<U> {
    pub fn new(label: impl Into<TextBuilder<U>>, effect: ActionEffect<U>) -> Self {
        Self {
            label: label.into(),
            effect,
            visibility: Visibility::default(),
            options: ButtonOptions::default(),
        }
    }

    /// Reply with a text
    pub fn text(label: impl Into<TextBuilder<U>>, reply: impl Into<TextBuilder<U>>) -> Self {
        Self::new(label, ActionEffect::Text(reply.into()))
    }

    /// Switch to a state
    pub fn switch_state(label: impl Into<TextBuilder<U>>, state: impl Into<String>) -> Self {
        Self::new(label, ActionEffect::SwitchState(state.into()))
    }

    /// Send an inline menu
    pub fn inline_menu(label: impl Into<TextBuilder<U>>, menu: impl Into<String>) -> Self {
        Self::new(label, ActionEffect::OpenInlineMenu(menu.into()))
    }

    /// A label that only passes through to raw handlers
    pub fn raw(label: impl Into<TextBuilder<U>>) -> Self {
        Self::new(label, ActionEffect::Raw)
    }

    pub fn custom(label: impl Into<TextBuilder<U>>, handler: Handler<U>) -> Self {
        Self::new(label, ActionEffect::Custom(handler))
    }

    visibility_builders!();

    pub fn label(&self, ctx: &SessionContext<U>) -> String {
        self.label.resolve(ctx)
    }

    pub fn effect(&self) -> &ActionEffect<U> {
        &self.effect
    }

    pub fn options(&self) -> ButtonOptions {
        self.options
    }

    pub fn is_visible(&self, ctx: &SessionContext<U>, conditions: &NamedConditions) -> bool {
        self.visibility.is_visible(ctx, conditions)
    }
}

/// Buttons and commands of a static menu plus their row policy
pub struct ActionSet<U> {
    buttons: Vec<Action<U>>,
    commands: Vec<Action<U>>,
    policy: RowPolicy,
}

impl<U> Default for ActionSet<U> {
    fn default() -> Self {
        Self {
            buttons: Vec::new(),
            commands: Vec::new(),
            policy: RowPolicy::default(),
        }
    }
}

impl<U> ActionSet<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rendered, matchable action
    pub fn button(mut self, action: Action<U>) -> Self {
        self.buttons.push(action);
        self
    }

    /// Add a matchable action that is never rendered (e.g. `/start`)
    pub fn command(mut self, action: Action<U>) -> Self {
        self.commands.push(action);
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

    pub fn buttons(&self) -> &[Action<U>] {
        &self.buttons
    }

    pub fn commands(&self) -> &[Action<U>] {
        &self.commands
    }

    pub fn policy(&self) -> &RowPolicy {
        &self.policy
    }

    /// First visible button, then command, whose resolved label equals `text`
    ///
    /// Labels are resolved in the event's language, so a localized label maps
    /// back to the action that rendered it.
    pub fn find_by_text(
        &self,
        text: &str,
        ctx: &SessionContext<U>,
        conditions: &NamedConditions,
    ) -> Option<&Action<U>> {
        self.buttons
            .iter()
            .chain(self.commands.iter())
            .find(|action| action.is_visible(ctx, conditions) && action.label(ctx) == text)
    }

    /// Rows of visible button labels, `None` when no button is visible
    pub fn keyboard(
        &self,
        ctx: &SessionContext<U>,
        conditions: &NamedConditions,
        fallback_per_row: usize,
    ) -> Option<Vec<Vec<String>>> {
        let labels: Vec<(String, ButtonOptions)> = self
            .buttons
            .iter()
            .filter(|action| action.is_visible(ctx, conditions))
            .map(|action| (action.label(ctx), action.options()))
            .collect();

        if labels.is_empty() {
            return None;
        }

        Some(arrange_with_fallback(labels, &self.policy, fallback_per_row))
    }
}

/// Fixed or per-event action set
pub enum ActionSource<U> {
    Fixed(Arc<ActionSet<U>>),
    Deferred(Arc<dyn Fn(&SessionContext<U>) -> ActionSet<U> + Send + Sync>),
}

impl<U> ActionSource<U> {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&SessionContext<U>) -> ActionSet<U> + Send + Sync + 'static,
    {
        ActionSource::Deferred(Arc::new(f))
    }

    /// The action set for this event
    pub fn resolve(&self, ctx: &SessionContext<U>) -> Arc<ActionSet<U>> {
        match self {
            ActionSource::Fixed(set) => Arc::clone(set),
            ActionSource::Deferred(build) => Arc::new(build(ctx)),
        }
    }
}

impl<U> From<ActionSet<U>> for ActionSource<U> {
    fn from(set: ActionSet<U>) -> Self {
        ActionSource::Fixed(Arc::new(set))
    }
}
