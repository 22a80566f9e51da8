#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! receipt-core
//!
//! Shared domain types, the error taxonomy, the `Embedder` seam, configuration
//! and the chunk store that both retrieval pipelines read from.

pub mod chunk_store;
pub mod config;
pub mod error;
pub mod pages;
pub mod traits;
pub mod types;

pub use chunk_store::ChunkStore;
pub use error::{Error, Result};
pub use traits::Embedder;
pub use types::{Answer, Chunk, ChunkId, EmbeddingMatch, IndexStatus, LexicalMatch, LoadReport, Match, PageText, Pipeline};
