use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Chunk;
use crate::error::IndexError;

/// On-disk layout version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    /// The id is a UUIDv5 over source, position, and content hash, so rebuilding
    /// unchanged documents yields identical ids.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        let digest = blake3::hash(chunk.content.as_bytes());
        let name = format!(
            "{}#{}#{}",
            chunk.metadata.source,
            chunk.chunk_index,
            digest.to_hex()
        );
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string(),
            source: chunk.metadata.source.clone(),
            chunk_index: chunk.chunk_index,
            content: chunk.content.clone(),
            vector,
        }
    }
}

/// Flat embedding index. `dimensions` is zero until the first entry is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimensions: usize,
    pub entries: Vec<IndexEntry>,
}

impl VectorIndex {
    #[must_use]
    pub fn empty(embedding_model: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            embedding_model: embedding_model.into(),
            dimensions: 0,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] if the vector length differs
    /// from the vectors already stored, or is zero.
    pub fn insert(&mut self, entry: IndexEntry) -> Result<(), IndexError> {
        let actual = entry.vector.len();
        if self.entries.is_empty() && actual > 0 {
            self.dimensions = actual;
        }
        if actual != self.dimensions || actual == 0 {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Structural check applied to freshly deserialized data.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the index is not usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| e.vector.len() != self.dimensions || e.vector.is_empty())
        {
            return Err(format!(
                "entry {} has {} dimensions, index declares {}",
                bad.id,
                bad.vector.len(),
                self.dimensions
            ));
        }
        Ok(())
    }
}
