//! # Engine Configuration Module
//!
//! This module defines the configuration of the routing engine: the default
//! state, the callback payload separator and the limits applied while routing.

use std::env;

use anyhow::{Context, Result};

// Constants for engine configuration
pub const DEFAULT_CALLBACK_SEPARATOR: &str = ":";
pub const DEFAULT_MAX_SWITCH_HOPS: usize = 8;
pub const DEFAULT_MAX_PER_ROW: usize = 2;
pub const MAX_CALLBACK_DATA_BYTES: usize = 64; // Telegram limit for callback_data

/// Configuration structure for the routing engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// State assigned to users without a stored state
    pub default_state: String,
    /// Separator between prefix, key and args in callback payloads
    pub callback_separator: String,
    /// Maximum cascaded state switches within one event
    pub max_switch_hops: usize,
    /// Row size used once a menu's formation is exhausted and it sets none itself
    pub default_max_per_row: usize,
    /// Chat that receives a copy of every error report
    pub error_chat_id: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_state: String::new(),
            callback_separator: DEFAULT_CALLBACK_SEPARATOR.to_string(),
            max_switch_hops: DEFAULT_MAX_SWITCH_HOPS,
            default_max_per_row: DEFAULT_MAX_PER_ROW,
            error_chat_id: None,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the given default state and default limits
    pub fn new(default_state: impl Into<String>) -> Self {
        Self {
            default_state: default_state.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from `MENU_*` environment variables
    ///
    /// Unset variables keep their defaults; set but malformed numbers are an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(state) = env::var("MENU_DEFAULT_STATE") {
            config.default_state = state;
        }

        if let Ok(separator) = env::var("MENU_CALLBACK_SEPARATOR") {
            if !separator.is_empty() {
                config.callback_separator = separator;
            }
        }

        if let Ok(hops) = env::var("MENU_MAX_SWITCH_HOPS") {
            config.max_switch_hops = hops
                .parse()
                .with_context(|| format!("MENU_MAX_SWITCH_HOPS is not a number: {hops}"))?;
        }

        if let Ok(chat_id) = env::var("MENU_ERROR_CHAT_ID") {
            config.error_chat_id = Some(
                chat_id
                    .parse()
                    .with_context(|| format!("MENU_ERROR_CHAT_ID is not a chat id: {chat_id}"))?,
            );
        }

        Ok(config)
    }

    pub fn with_callback_separator(mut self, separator: impl Into<String>) -> Self {
        self.callback_separator = separator.into();
        self
    }

    pub fn with_max_switch_hops(mut self, hops: usize) -> Self {
        self.max_switch_hops = hops;
        self
    }

    pub fn with_error_chat_id(mut self, chat_id: i64) -> Self {
        self.error_chat_id = Some(chat_id);
        self
    }

    /// Hop limit applied to switch cascades; zero counts as unset
    pub fn switch_hop_limit(&self) -> usize {
        match self.max_switch_hops {
            0 => DEFAULT_MAX_SWITCH_HOPS,
            hops => hops,
        }
    }
}
