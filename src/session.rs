//! Per-event session context handed to middleware, handlers and text builders.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::localization::Localizer;
use crate::transport::{InboundEvent, Keyboard, OutgoingRequest};

/// Mutable scratch space and identity for one inbound event
///
/// A context lives for exactly one event. When a handler switches state the
/// same context (scratch values included) is handed to the target state's
/// menu with [`SessionContext::is_switched`] set.
pub struct SessionContext<U> {
    user: U,
    event: InboundEvent,
    state: String,
    language: Option<Arc<dyn Localizer>>,
    is_switched: bool,
    scratch: HashMap<String, Value>,
    outbox: Vec<OutgoingRequest>,
    pending_language: Option<String>,
    callback_answered: bool,
}

impl<U> SessionContext<U> {
    pub fn new(user: U, event: InboundEvent, state: impl Into<String>) -> Self {
        Self {
            user,
            event,
            state: state.into(),
            language: None,
            is_switched: false,
            scratch: HashMap::new(),
            outbox: Vec::new(),
            pending_language: None,
            callback_answered: false,
        }
    }

    pub fn user(&self) -> &U {
        &self.user
    }

    pub fn event(&self) -> &InboundEvent {
        &self.event
    }

    pub fn user_id(&self) -> i64 {
        self.event.from_user_id()
    }

    pub fn chat_id(&self) -> i64 {
        self.event.chat_id
    }

    /// Name of the state currently being processed
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn language(&self) -> Option<&Arc<dyn Localizer>> {
        self.language.as_ref()
    }

    /// Whether this invocation is the continuation of a state switch
    pub fn is_switched(&self) -> bool {
        self.is_switched
    }

    pub fn set_language(&mut self, language: Option<Arc<dyn Localizer>>) {
        self.language = language;
    }

    /// Switch the event's language and persist the choice once the current handler returns
    pub fn choose_language(&mut self, language: Arc<dyn Localizer>) {
        self.pending_language = Some(language.tag().to_string());
        self.language = Some(language);
    }

    /// Store a scratch value for later middleware, handlers and text builders
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.scratch.insert(key.into(), value);
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id(), error = %e, "Failed to store session value");
            }
        }
    }

    /// Read a scratch value, `None` when missing or of another shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.scratch
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.scratch.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.scratch.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scratch.contains_key(key)
    }

    /// Localize a key through the event's language, falling back to the key itself
    pub fn t(&self, key: &str) -> String {
        self.language
            .as_ref()
            .and_then(|language| language.get(key))
            .unwrap_or_else(|| key.to_string())
    }

    /// Localize a key with arguments, falling back to the key itself
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.language
            .as_ref()
            .and_then(|language| language.get_with_args(key, args))
            .unwrap_or_else(|| key.to_string())
    }

    /// Queue a text message to the event's chat
    pub fn reply(&mut self, text: impl Into<String>) {
        let chat_id = self.chat_id();
        self.outbox.push(OutgoingRequest::SendMessage {
            chat_id,
            text: text.into(),
            keyboard: None,
        });
    }

    /// Queue a text message with a keyboard to the event's chat
    pub fn reply_with_keyboard(&mut self, text: impl Into<String>, keyboard: Keyboard) {
        let chat_id = self.chat_id();
        self.outbox.push(OutgoingRequest::SendMessage {
            chat_id,
            text: text.into(),
            keyboard: Some(keyboard),
        });
    }

    /// Queue an answer to the event's callback query; ignored for message events
    pub fn answer_callback(&mut self, text: Option<String>, show_alert: bool) {
        if let Some(callback) = self.event.callback_query() {
            let callback_id = callback.id.clone();
            self.callback_answered = true;
            self.outbox.push(OutgoingRequest::AnswerCallback {
                callback_id,
                text,
                show_alert,
            });
        }
    }

    /// Queue an arbitrary request
    pub fn send(&mut self, request: OutgoingRequest) {
        self.outbox.push(request);
    }

    pub(crate) fn enter_switched_state(&mut self, state: &str) {
        self.state = state.to_string();
        self.is_switched = true;
    }

    /// Whether an answer to the event's callback query has been queued
    pub fn callback_answered(&self) -> bool {
        self.callback_answered
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<OutgoingRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn take_pending_language(&mut self) -> Option<String> {
        self.pending_language.take()
    }
}
