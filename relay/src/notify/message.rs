//! Outbound chat message construction.

use serde::Serialize;

use crate::github::{InboundEvent, WatchEvent};

/// Text formatting mode understood by the Telegram Bot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    /// No entity parsing; sent without a `parse_mode` field.
    Plain,
    #[serde(rename = "Markdown")]
    Markdown,
}

impl ParseMode {
    fn is_plain(&self) -> bool {
        matches!(self, ParseMode::Plain)
    }
}

/// A single `sendMessage` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(rename = "parse_mode", skip_serializing_if = "ParseMode::is_plain")]
    pub format_mode: ParseMode,
}

impl OutboundMessage {
    /// Build the notification for a decoded webhook event.
    pub fn for_event(chat_id: i64, event: &InboundEvent) -> Self {
        match event {
            InboundEvent::Watch(watch) => Self {
                chat_id,
                text: format_watch_message(watch),
                format_mode: ParseMode::Markdown,
            },
        }
    }
}

/// Render the star notification text (Telegram legacy Markdown).
///
/// Legacy Markdown has no escaping inside an entity, so the repository name
/// goes into the bold spans as is. GitHub repository names cannot contain `*`.
pub fn format_watch_message(event: &WatchEvent) -> String {
    let repo = &event.repository_name;
    format!(
        "New Github star for *{repo}* repo!. \n\
         The *{repo}* repo now has *{count}* stars! 🎉. \n\
         Your new fan is {fan}",
        count = event.star_count,
        fan = escape_markdown(&event.sender_profile_url),
    )
}

/// Escape the characters legacy Markdown treats as entity delimiters.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch(name: &str, count: u64, url: &str) -> WatchEvent {
        WatchEvent {
            repository_name: name.to_string(),
            star_count: count,
            sender_profile_url: url.to_string(),
        }
    }

    #[test]
    fn test_format_watch_message() {
        let text = format_watch_message(&watch("star", 42, "https://github.com/alice"));

        assert_eq!(
            text,
            "New Github star for *star* repo!. \n\
             The *star* repo now has *42* stars! 🎉. \n\
             Your new fan is https://github.com/alice"
        );
    }

    #[test]
    fn test_repo_name_unescaped_inside_bold() {
        let text = format_watch_message(&watch("my_repo", 1, "https://github.com/some_user"));

        assert!(text.contains("*my_repo*"));
        assert!(!text.contains("my\\_repo"));
        assert!(text.contains("https://github.com/some\\_user"));
    }

    #[test]
    fn test_outbound_message_serialization() {
        let event = InboundEvent::Watch(watch("star", 42, "https://github.com/alice"));
        let message = OutboundMessage::for_event(-1001, &event);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["chat_id"], -1001);
        assert_eq!(json["parse_mode"], "Markdown");
        assert!(json["text"].as_str().unwrap().contains("*42*"));
    }

    #[test]
    fn test_plain_message_omits_parse_mode() {
        let message = OutboundMessage {
            chat_id: 1,
            text: "hello".to_string(),
            format_mode: ParseMode::Plain,
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("parse_mode"));
    }
}
