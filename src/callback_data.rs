//! # Callback Data Module
//!
//! Encodes and decodes the payload attached to inline buttons:
//! `<menu>:<action>:<arg1>:<arg2>...` with a configurable separator.
//!
//! Values are not escaped, so arguments must not contain the separator or
//! their boundaries are lost.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{DEFAULT_CALLBACK_SEPARATOR, MAX_CALLBACK_DATA_BYTES};

/// Decoded inline-button payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub menu_prefix: String,
    pub action_key: String,
    pub args: Vec<String>,
}

/// Callback payload codec
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackCodec {
    separator: String,
}

impl Default for CallbackCodec {
    fn default() -> Self {
        Self::new(DEFAULT_CALLBACK_SEPARATOR)
    }
}

impl CallbackCodec {
    /// Create a codec; an empty separator falls back to `:`
    pub fn new(separator: impl Into<String>) -> Self {
        let separator = separator.into();
        Self {
            separator: if separator.is_empty() {
                DEFAULT_CALLBACK_SEPARATOR.to_string()
            } else {
                separator
            },
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Join prefix, key and args with the separator
    pub fn encode<S: AsRef<str>>(&self, menu_prefix: &str, action_key: &str, args: &[S]) -> String {
        let mut data = String::with_capacity(menu_prefix.len() + action_key.len() + 1);
        data.push_str(menu_prefix);
        data.push_str(&self.separator);
        data.push_str(action_key);
        for arg in args {
            data.push_str(&self.separator);
            data.push_str(arg.as_ref());
        }

        if data.len() > MAX_CALLBACK_DATA_BYTES {
            warn!(
                data = %data,
                len = data.len(),
                "Callback data exceeds {MAX_CALLBACK_DATA_BYTES} bytes and may be rejected"
            );
        }

        data
    }

    /// Split a raw payload into prefix, key and args
    ///
    /// Returns `None` for an empty payload. A payload without separators is a
    /// prefix with an empty key.
    pub fn decode(&self, data: &str) -> Option<CallbackPayload> {
        if data.is_empty() {
            return None;
        }

        let (menu_prefix, rest) = match data.split_once(self.separator.as_str()) {
            Some((prefix, rest)) => (prefix, Some(rest)),
            None => (data, None),
        };

        let (action_key, args) = match rest.map(|rest| rest.split_once(self.separator.as_str())) {
            Some(Some((key, args))) => (
                key,
                args.split(self.separator.as_str())
                    .map(str::to_string)
                    .collect(),
            ),
            Some(None) => (rest.unwrap_or_default(), Vec::new()),
            None => ("", Vec::new()),
        };

        Some(CallbackPayload {
            menu_prefix: menu_prefix.to_string(),
            action_key: action_key.to_string(),
            args,
        })
    }
}
