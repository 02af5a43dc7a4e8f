//! Handler signatures shared by menus, actions and the engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::session::SessionContext;

/// Transition requested by a middleware, handler or button
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchAction {
    /// Persist and enter a conversation state
    State(String),
    /// Render an inline menu, editing the originating message when `edit` is set
    InlineMenu { name: String, edit: bool },
}

impl SwitchAction {
    pub fn state(name: impl Into<String>) -> Self {
        SwitchAction::State(name.into())
    }

    pub fn inline_menu(name: impl Into<String>, edit: bool) -> Self {
        SwitchAction::InlineMenu {
            name: name.into(),
            edit,
        }
    }
}

/// What the engine does after a handler returns
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing the event
    Continue,
    /// Stop processing the event
    Halt,
    /// Stop processing and perform the transition
    Switch(SwitchAction),
}

impl Flow {
    pub fn switch_state(name: impl Into<String>) -> Self {
        Flow::Switch(SwitchAction::state(name))
    }

    pub fn open_inline_menu(name: impl Into<String>, edit: bool) -> Self {
        Flow::Switch(SwitchAction::inline_menu(name, edit))
    }
}

pub type HandlerResult = anyhow::Result<Flow>;

/// Middleware, raw-event handler or custom action
pub type Handler<U> = Arc<dyn Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync>;

/// Inline callback handler receiving the payload's trailing args
pub type CallbackHandler<U> =
    Arc<dyn Fn(&mut SessionContext<U>, &[String]) -> HandlerResult + Send + Sync>;

/// Visibility predicate
pub type Predicate<U> = Arc<dyn Fn(&SessionContext<U>) -> bool + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<U, F>(f: F) -> Handler<U>
where
    F: Fn(&mut SessionContext<U>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`CallbackHandler`]
pub fn callback_handler<U, F>(f: F) -> CallbackHandler<U>
where
    F: Fn(&mut SessionContext<U>, &[String]) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}
