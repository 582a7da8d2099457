//! HTTP surface of the relay: `/api/chat`, `/api/chat/stream` and `/healthz`.

pub mod chat;

pub use chat::{ChatState, chat_router};
