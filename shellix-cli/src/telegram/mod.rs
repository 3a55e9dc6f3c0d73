//! Telegram Bot API transport.
//!
//! Only the slice of the API the bot needs: long-polled updates, text and
//! MarkdownV2 messages, inline keyboards, documents and callback answers.

mod client;
mod types;

pub use client::BotClient;
pub use types::Update;

use shellix::{Request, UserId};

/// An update resolved into who asked, where to answer and what was asked.
#[derive(Debug, PartialEq, Eq)]
pub struct Routed {
    pub user: UserId,
    pub chat_id: i64,
    pub request: Request,
    /// Callback to acknowledge, for inline-keyboard presses.
    pub callback_id: Option<String>,
}

/// Resolve an update. Updates without a sender, text or known callback data
/// are ignored.
pub fn route(update: &Update) -> Option<Routed> {
    if let Some(message) = &update.message {
        let user = message.from.as_ref()?;
        let request = Request::parse(message.text.as_deref()?)?;
        return Some(Routed {
            user: UserId::from(user.id),
            chat_id: message.chat.id,
            request,
            callback_id: None,
        });
    }

    if let Some(query) = &update.callback_query {
        let request = Request::from_callback(query.data.as_deref()?)?;
        let chat_id = query
            .message
            .as_ref()
            .map_or(query.from.id, |message| message.chat.id);
        return Some(Routed {
            user: UserId::from(query.from.id),
            chat_id,
            request,
            callback_id: Some(query.id.clone()),
        });
    }

    None
}
