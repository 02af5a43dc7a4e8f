//! Telegram transport backed by teloxide

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    MessageId, UpdateKind,
};
use tracing::debug;

use super::{
    EventPayload, InboundEvent, IncomingCallback, IncomingMessage, InlineButton, InlineTarget,
    Keyboard, MediaKind, OutgoingRequest, Sender, Transport,
};

/// [`Transport`] implementation issuing Bot API calls through teloxide
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Option<i32>> {
        match request {
            OutgoingRequest::SendMessage {
                chat_id,
                text,
                keyboard,
            } => {
                let request = self.bot.send_message(ChatId(chat_id), text);
                let sent = match keyboard {
                    Some(Keyboard::Reply(rows)) => request.reply_markup(reply_markup(rows)).await,
                    Some(Keyboard::Inline(rows)) => request.reply_markup(inline_markup(rows)?).await,
                    None => request.await,
                }
                .with_context(|| format!("Failed to send message to chat {chat_id}"))?;

                debug!(chat_id, message_id = sent.id.0, "Message sent");
                Ok(Some(sent.id.0))
            }
            OutgoingRequest::EditMessageText {
                chat_id,
                message_id,
                text,
                keyboard,
            } => {
                let request = self
                    .bot
                    .edit_message_text(ChatId(chat_id), MessageId(message_id), text);
                let edited = match keyboard {
                    Some(rows) => request.reply_markup(inline_markup(rows)?).await,
                    None => request.await,
                }
                .with_context(|| format!("Failed to edit message {message_id} in chat {chat_id}"))?;

                Ok(Some(edited.id.0))
            }
            OutgoingRequest::AnswerCallback {
                callback_id,
                text,
                show_alert,
            } => {
                let mut request = self.bot.answer_callback_query(CallbackQueryId(callback_id));
                request.text = text;
                request.show_alert = Some(show_alert);
                request.await.context("Failed to answer callback query")?;

                Ok(None)
            }
        }
    }
}

fn reply_markup(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
}

fn inline_markup(rows: Vec<Vec<InlineButton>>) -> Result<InlineKeyboardMarkup> {
    let mut keyboard = Vec::with_capacity(rows.len());

    for row in rows {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            buttons.push(match button.target {
                InlineTarget::Callback(data) => InlineKeyboardButton::callback(button.text, data),
                InlineTarget::Url(address) => InlineKeyboardButton::url(
                    button.text,
                    address
                        .parse()
                        .with_context(|| format!("Invalid button url: {address}"))?,
                ),
            });
        }
        keyboard.push(buttons);
    }

    Ok(InlineKeyboardMarkup::new(keyboard))
}

/// Convert a teloxide user into the engine's sender
pub fn sender_from_user(user: &teloxide::types::User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}

/// Classify a message by the content it carries
pub fn media_kind_of(msg: &Message) -> MediaKind {
    if msg.text().is_some() {
        MediaKind::Text
    } else if msg.photo().is_some() {
        MediaKind::Photo
    } else if msg.video().is_some() {
        MediaKind::Video
    } else if msg.voice().is_some() {
        MediaKind::Voice
    } else if msg.audio().is_some() {
        MediaKind::Audio
    } else if msg.document().is_some() {
        MediaKind::Document
    } else if msg.sticker().is_some() {
        MediaKind::Sticker
    } else if msg.video_note().is_some() {
        MediaKind::VideoNote
    } else if msg.venue().is_some() {
        // Venues carry a location too, so they are checked first
        MediaKind::Venue
    } else if msg.location().is_some() {
        MediaKind::Location
    } else if msg.contact().is_some() {
        MediaKind::Contact
    } else if msg.poll().is_some() {
        MediaKind::Poll
    } else if msg.dice().is_some() {
        MediaKind::Dice
    } else {
        MediaKind::Other
    }
}

/// Convert a teloxide update into an engine event
///
/// Returns `None` for update kinds the engine does not route (edits, inline
/// queries, channel posts, messages without a sender, ...).
pub fn event_from_update(update: &Update) -> Option<InboundEvent> {
    let update_id = update.id.0 as i64;

    match &update.kind {
        UpdateKind::Message(msg) => {
            let from = msg.from.as_ref()?;
            Some(InboundEvent {
                update_id,
                chat_id: msg.chat.id.0,
                private_chat: msg.chat.is_private(),
                from: sender_from_user(from),
                payload: EventPayload::Message(IncomingMessage {
                    message_id: msg.id.0,
                    text: msg.text().map(str::to_string),
                    media: media_kind_of(msg),
                }),
            })
        }
        UpdateKind::CallbackQuery(q) => {
            let (chat_id, private_chat, message_id) = match &q.message {
                Some(msg) => (msg.chat().id.0, msg.chat().is_private(), Some(msg.id().0)),
                // Callbacks from inline-mode messages have no chat; treat them as private to the sender
                None => (q.from.id.0 as i64, true, None),
            };

            Some(InboundEvent {
                update_id,
                chat_id,
                private_chat,
                from: sender_from_user(&q.from),
                payload: EventPayload::Callback(IncomingCallback {
                    id: q.id.to_string(),
                    data: q.data.clone(),
                    message_id,
                }),
            })
        }
        _ => None,
    }
}
