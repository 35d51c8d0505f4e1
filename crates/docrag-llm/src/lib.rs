//! Chat and embedding provider abstraction for docrag.
//!
//! The pipeline only depends on [`LlmProvider`]; [`AnyProvider`] selects the
//! concrete backend at startup.

pub mod any;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
