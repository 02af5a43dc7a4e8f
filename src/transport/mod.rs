//! Transport module: the chat-client boundary of the engine
//!
//! The engine only sees [`InboundEvent`]s and emits [`OutgoingRequest`]s; the
//! `telegram` submodule maps both onto teloxide.

pub mod telegram;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use telegram::TelegramTransport;

/// The account an event came from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

/// Kind of content carried by an inbound message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Text,
    Photo,
    Video,
    Voice,
    Audio,
    Document,
    Sticker,
    Location,
    Contact,
    VideoNote,
    Venue,
    Poll,
    Dice,
    Other,
}

/// A direct message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i32,
    pub text: Option<String>,
    pub media: MediaKind,
}

/// A button click on an inline keyboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCallback {
    pub id: String,
    pub data: Option<String>,
    /// Message the clicked keyboard is attached to, when still accessible
    pub message_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Message(IncomingMessage),
    Callback(IncomingCallback),
}

/// One event from the transport
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub update_id: i64,
    pub chat_id: i64,
    pub private_chat: bool,
    pub from: Sender,
    pub payload: EventPayload,
}

impl InboundEvent {
    /// Build a private text message event
    pub fn text(from: Sender, message_id: i32, text: impl Into<String>) -> Self {
        Self::from_message(
            from,
            IncomingMessage {
                message_id,
                text: Some(text.into()),
                media: MediaKind::Text,
            },
        )
    }

    /// Build a private message event
    pub fn from_message(from: Sender, message: IncomingMessage) -> Self {
        Self {
            update_id: 0,
            chat_id: from.id,
            private_chat: true,
            from,
            payload: EventPayload::Message(message),
        }
    }

    /// Build a private callback event
    pub fn callback(
        from: Sender,
        id: impl Into<String>,
        data: impl Into<String>,
        message_id: Option<i32>,
    ) -> Self {
        Self {
            update_id: 0,
            chat_id: from.id,
            private_chat: true,
            from,
            payload: EventPayload::Callback(IncomingCallback {
                id: id.into(),
                data: Some(data.into()),
                message_id,
            }),
        }
    }

    pub fn is_private_chat(&self) -> bool {
        self.private_chat
    }

    pub fn from_user_id(&self) -> i64 {
        self.from.id
    }

    pub fn message(&self) -> Option<&IncomingMessage> {
        match &self.payload {
            EventPayload::Message(message) => Some(message),
            EventPayload::Callback(_) => None,
        }
    }

    pub fn callback_query(&self) -> Option<&IncomingCallback> {
        match &self.payload {
            EventPayload::Callback(callback) => Some(callback),
            EventPayload::Message(_) => None,
        }
    }

    /// Text of the message, if this is a message carrying text
    pub fn message_text(&self) -> Option<&str> {
        self.message().and_then(|m| m.text.as_deref())
    }

    pub fn callback_data(&self) -> Option<&str> {
        self.callback_query().and_then(|c| c.data.as_deref())
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        self.message().map(|m| m.media)
    }
}

/// Button of an inline keyboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub target: InlineTarget,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineTarget {
    Url(String),
    Callback(String),
}

/// Keyboard attached to an outgoing message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    Reply(Vec<Vec<String>>),
    Inline(Vec<Vec<InlineButton>>),
}

/// A call the engine asks the transport to perform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutgoingRequest {
    SendMessage {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    EditMessageText {
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Vec<Vec<InlineButton>>>,
    },
    AnswerCallback {
        callback_id: String,
        text: Option<String>,
        show_alert: bool,
    },
}

/// Chat client the engine sends through
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a request, returning the id of the sent or edited message when there is one
    async fn send(&self, request: OutgoingRequest) -> anyhow::Result<Option<i32>>;
}
