//! receipt-vector
//!
//! Dense retrieval: an exact squared-L2 index with a parallel metadata list,
//! append-only across documents, plus an embedding cache.

pub mod cache;
pub mod flat;
pub mod index;

pub use cache::{content_hash, CacheStats, CachedEmbedder, DEFAULT_MAX_ENTRIES};
pub use flat::{squared_l2, FlatL2Index};
pub use index::{EmbeddingBatch, EmbeddingIndex, EmbeddingRecord};
