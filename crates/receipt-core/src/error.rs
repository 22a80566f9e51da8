use thiserror::Error;

use crate::types::ChunkId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No readable text found in document. This PDF may be scanned or image-based.")]
    EmptyDocument,

    #[error("Lexical index has not been built")]
    IndexNotBuilt,

    #[error("Chunk {id} not found (store holds {len} chunks)")]
    NotFound { id: ChunkId, len: usize },

    #[error("No document indexed yet")]
    NoIndex,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap an embedder failure, keeping the whole cause chain in the message.
    pub fn embedding(err: &anyhow::Error) -> Self {
        Error::Embedding(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
