pub mod relay;
pub mod types;

pub use relay::{ErrorBody, RelayEvent, ReplyResult};
pub use types::{ChatRequest, ChatRole, ChatTurn, coerce_text};
