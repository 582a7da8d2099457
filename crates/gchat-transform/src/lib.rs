//! Pure conversions between the chat client shapes and Gemini shapes.
//!
//! Nothing in here performs IO; the relays in `gchat-core` feed upstream bytes
//! in and take request bodies, replies and downstream frames out.

pub mod generate_content;
