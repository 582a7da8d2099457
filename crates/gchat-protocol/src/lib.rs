//! Wire types for both sides of the relay.
//!
//! `chat` is the downstream shape the browser client speaks, `gemini` is the
//! upstream `generateContent` shape, and `sse` holds the `data:` line framing
//! shared by the upstream event stream and the downstream relay stream.

pub mod chat;
pub mod gemini;
pub mod sse;
