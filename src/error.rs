//! # Error Types Module
//!
//! Errors raised while building the engine and while routing a single event.

use thiserror::Error;

/// Errors raised while routing one inbound event.
///
/// Every variant stops processing of the event it was raised for and is
/// delivered to the engine's error handler.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The engine has no default state to fall back to
    #[error("empty default state name")]
    MissingDefaultState,
    /// A switch or stored state named a state nobody registered
    #[error("no static menu registered for state `{0}`")]
    UnknownState(String),
    /// A switch or callback named an inline menu nobody registered
    #[error("no inline menu registered under `{0}`")]
    UnknownInlineMenu(String),
    /// A callback payload addressed an action the inline menu does not have
    #[error("no inline action `{action}` in menu `{menu}`")]
    UnknownCallbackAction { menu: String, action: String },
    /// Cascaded switches within one event went over the configured limit
    #[error("switch limit of {limit} exceeded while switching to `{state}`")]
    SwitchLimitExceeded { limit: usize, state: String },
    /// A repository or transport call failed
    #[error("{operation} failed for user {user_id}: {source:#}")]
    Collaborator {
        user_id: i64,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
    /// A middleware, raw handler, action or callback returned an error
    #[error("handler failed for user {user_id} in state `{state}`: {source:#}")]
    Handler {
        user_id: i64,
        state: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RouteError {
    /// Wrap a collaborator failure with the user and operation it happened in
    pub fn collaborator(user_id: i64, operation: &'static str, source: anyhow::Error) -> Self {
        RouteError::Collaborator {
            user_id,
            operation,
            source,
        }
    }

    /// Whether the error comes from a misconfigured menu graph rather than a failing dependency
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            RouteError::MissingDefaultState
                | RouteError::UnknownState(_)
                | RouteError::UnknownInlineMenu(_)
                | RouteError::UnknownCallbackAction { .. }
                | RouteError::SwitchLimitExceeded { .. }
        )
    }
}

/// Errors raised by [`crate::bot::EngineBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("empty default state name")]
    MissingDefaultState,
    #[error("default state `{0}` has no registered static menu")]
    DefaultStateNotRegistered(String),
    #[error("state `{0}` registered more than once")]
    DuplicateState(String),
    #[error("inline menu `{0}` registered more than once")]
    DuplicateInlineMenu(String),
    #[error("inline menu name `{name}` contains the callback separator `{separator}`")]
    InlineMenuNameContainsSeparator { name: String, separator: String },
    #[error("language config has no localizers")]
    NoLocalizers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = RouteError::UnknownState("Settings".to_string());
        assert_eq!(err.to_string(), "no static menu registered for state `Settings`");

        let err = RouteError::collaborator(42, "set_state", anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "set_state failed for user 42: connection reset");
    }

    #[test]
    fn test_routing_classification() {
        assert!(RouteError::MissingDefaultState.is_routing());
        assert!(RouteError::SwitchLimitExceeded {
            limit: 8,
            state: "Loop".to_string()
        }
        .is_routing());
        assert!(!RouteError::collaborator(1, "find_user", anyhow::anyhow!("down")).is_routing());
    }
}
