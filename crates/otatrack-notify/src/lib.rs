//! Update notifications
//!
//! Messages are sent through the Telegram Bot API in HTML mode. Vendor changelogs
//! arrive as loose HTML, so descriptions are cleaned down to the tag subset Telegram
//! accepts ([`sanitize`]). When a message would exceed Telegram's length limit, the
//! full description is published to a Telegraph page and the message carries a
//! truncated copy with a link ([`truncate`], [`telegraph`]).

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod message;
pub mod sanitize;
pub mod telegram;
pub mod telegraph;
pub mod truncate;

pub use error::NotifyError;
pub use message::{BUTTON_TEXT, Notification};
pub use sanitize::clean_description;
pub use telegram::{DeliveryReport, TELEGRAM_API_BASE, TelegramConfig, TelegramNotifier};
pub use telegraph::{PasteService, TELEGRAPH_API_URL, TelegraphClient};
pub use truncate::{DESCRIPTION_MAX_LEN, MESSAGE_MAX_LEN, truncate_description};
