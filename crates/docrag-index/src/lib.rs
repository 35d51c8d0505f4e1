//! Document loading, vector indexing, and similarity retrieval.
//!
//! Build-time flow: [`DirectoryLoader`] reads files into [`Document`]s,
//! [`IndexBuilder`] splits and embeds them into a [`VectorIndex`], and
//! [`IndexStore`] persists it atomically. Query-time flow: [`IndexStore::load`]
//! followed by [`Retriever::retrieve`].

pub mod builder;
pub mod document;
pub mod error;
pub mod index;
pub mod loader;
pub mod retriever;
pub mod splitter;
pub mod store;

pub use builder::IndexBuilder;
pub use document::{Chunk, Document, DocumentMetadata};
pub use error::{IndexError, Result};
pub use index::{IndexEntry, VectorIndex};
pub use loader::{DirectoryLoader, DocumentLoader, LoadedDocuments, LoaderConfig, SkippedFile};
pub use retriever::{RetrievalConfig, RetrievedContext, Retriever, ScoredChunk};
pub use splitter::{SplitterConfig, TextSplitter};
pub use store::{IndexStore, WriteGuard};
