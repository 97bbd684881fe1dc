//! Tutor chat: endpoint config, reply parsing and the conversation session.

mod config;
mod reply;
mod service;
mod session;

pub use config::{BasicAuth, CHAT_PATH, ChatConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, join_url};
pub use reply::{ReplySchema, error_message, extract_reply};
pub use service::{ChatTutorService, GENERIC_FAILURE, localized_prompt};
pub use session::{ChatSession, welcome_message};
