//! Mock infrastructure for testing external services
//!
//! The only external dependency is the Gemini API, mocked with wiremock.


pub use gemini::*;
