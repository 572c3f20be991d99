//! Proxy module
//!
//! Handles request forwarding to the Gemini API.

pub mod gemini;
pub mod headers;
pub mod logging;

pub use gemini::{BufferedReply, GeminiRelay, StreamingReply};
pub use logging::RelayContext;
