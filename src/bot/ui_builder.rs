//! UI Builder module for turning menus into outgoing requests

use tracing::warn;

use crate::action::{ActionSet, NamedConditions};
use crate::callback_data::CallbackCodec;
use crate::inline_action::InlineActionSet;
use crate::session::SessionContext;
use crate::transport::{Keyboard, OutgoingRequest};

/// Send the menu text with its reply keyboard; `None` when the text is empty
pub fn static_menu_message<U>(
    text: String,
    actions: &ActionSet<U>,
    conditions: &NamedConditions,
    ctx: &SessionContext<U>,
    fallback_per_row: usize,
) -> Option<OutgoingRequest> {
    if text.is_empty() {
        return None;
    }

    let keyboard = actions
        .keyboard(ctx, conditions, fallback_per_row)
        .map(Keyboard::Reply);

    Some(OutgoingRequest::SendMessage {
        chat_id: ctx.chat_id(),
        text,
        keyboard,
    })
}

/// Send or edit an inline menu message; `None` when the text is empty
///
/// Editing targets the message the clicked keyboard belongs to. When the
/// event carries no such message, a new message is sent instead.
#[allow(clippy::too_many_arguments)]
pub fn inline_menu_message<U>(
    menu_name: &str,
    text: String,
    actions: &InlineActionSet<U>,
    conditions: &NamedConditions,
    ctx: &SessionContext<U>,
    codec: &CallbackCodec,
    fallback_per_row: usize,
    edit: bool,
) -> Option<OutgoingRequest> {
    if text.is_empty() {
        return None;
    }

    let rows = actions.keyboard(menu_name, codec, ctx, conditions, fallback_per_row);
    let keyboard = (!rows.is_empty()).then_some(rows);

    if edit {
        let message_id = ctx
            .event()
            .callback_query()
            .and_then(|callback| callback.message_id);

        match message_id {
            Some(message_id) => {
                return Some(OutgoingRequest::EditMessageText {
                    chat_id: ctx.chat_id(),
                    message_id,
                    text,
                    keyboard,
                })
            }
            None => {
                warn!(
                    user_id = %ctx.user_id(),
                    menu = %menu_name,
                    "No message to edit for inline menu, sending a new one"
                );
            }
        }
    }

    Some(OutgoingRequest::SendMessage {
        chat_id: ctx.chat_id(),
        text,
        keyboard: keyboard.map(Keyboard::Inline),
    })
}
