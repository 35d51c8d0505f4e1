use docrag_index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("answer generation failed: {0}")]
    Generation(String),
}
