//! Notification module for relaying decoded events to Telegram.
//!
//! ## Flow
//!
//! ```text
//! InboundEvent → OutboundMessage → TelegramClient::send_message
//! ```

pub mod message;
pub mod telegram;

use tracing::info;

use crate::error::NotifyError;
use crate::github::InboundEvent;

pub use message::{format_watch_message, OutboundMessage, ParseMode};
pub use telegram::{BotUser, SentMessage, TelegramClient};

/// Format and send the notification for `event`.
///
/// A single attempt; the caller decides what to do with a failure.
pub async fn dispatch(client: &TelegramClient, event: &InboundEvent) -> Result<(), NotifyError> {
    let message = OutboundMessage::for_event(client.chat_id(), event);
    let sent = client.send_message(&message).await?;

    info!(
        chat_id = message.chat_id,
        message_id = sent.message_id,
        "notification_sent"
    );

    Ok(())
}
