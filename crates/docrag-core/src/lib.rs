//! Configuration loading, answer generation, and the RAG pipeline.

pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;

pub use config::Config;
pub use error::RagError;
pub use generator::AnswerGenerator;
pub use pipeline::{BuildReport, RagPipeline};
