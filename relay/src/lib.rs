//! Stargazer - GitHub star notifications for Telegram.
//!
//! A small webhook relay: GitHub posts a `watch` event when a repository is
//! starred, the relay verifies the signature and sends a Markdown message to
//! one Telegram chat.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → /webhook → signature check → InboundEvent → OutboundMessage → Telegram
//! ```

pub mod config;
pub mod error;
pub mod github;
pub mod notify;
pub mod web;

// Re-export commonly used types
pub use config::{Cli, Config, VERSION};
pub use error::{ConfigError, NotifyError, WebhookError};
pub use github::{parse_webhook, InboundEvent, WatchEvent};
pub use notify::{OutboundMessage, ParseMode, TelegramClient};
pub use web::{router, AppState};
