pub mod request;
pub mod response;
pub mod stream;

pub use request::{
    stream_generation_config, stream_safety_settings, transform_request,
    transform_stream_request, transform_turns,
};
pub use response::{EMPTY_REPLY, reply_text, transform_response};
pub use stream::{GeminiToChatStreamState, encode_event};
