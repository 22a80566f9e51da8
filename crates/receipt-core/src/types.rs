//! Domain types shared by the chunk store, both retrieval pipelines and the
//! query coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage index of a chunk within one document load.
pub type ChunkId = usize;

/// Text of one page as produced by the extractor, before filtering.
///
/// `page` is 1-based. No contiguity or ordering is assumed beyond
/// "as encountered".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self { page, text: text.into() }
    }
}

/// A page-level chunk of the loaded document.
///
/// - `id`: position in the chunk store, also the row in the lexical matrix
/// - `page`: 1-based page number the text came from
/// - `text`: trimmed, never empty
/// - `document_name`: name the document was uploaded under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub page: u32,
    pub text: String,
    pub document_name: String,
}

/// A ranked hit from the lexical pipeline.
///
/// `similarity` is the cosine similarity rounded to three decimals and
/// `text` is a prefix of the chunk text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalMatch {
    pub chunk_id: ChunkId,
    pub page: u32,
    pub similarity: f32,
    pub text: String,
}

/// A ranked hit from the embedding pipeline. `distance` is the squared L2
/// distance between query and chunk vectors; lower is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatch {
    pub page: u32,
    pub document: String,
    pub text: String,
    pub distance: f32,
}

/// Indicates which pipeline answers a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    #[default]
    Lexical,
    Embedding,
}

/// A result from either pipeline. The two pipelines return structurally
/// different shapes, so each keeps its own variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pipeline", rename_all = "lowercase")]
pub enum Match {
    Lexical(LexicalMatch),
    Embedding(EmbeddingMatch),
}

impl Match {
    pub fn page(&self) -> u32 {
        match self {
            Match::Lexical(m) => m.page,
            Match::Embedding(m) => m.page,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Match::Lexical(m) => &m.text,
            Match::Embedding(m) => &m.text,
        }
    }
}

/// Outcome of a successful document load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub document_name: String,
    pub pages_indexed: usize,
    /// Total entries in the cumulative embedding index after this load.
    pub embedding_entries: usize,
}

/// Lexical answer to a question, ranked best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub matches: Vec<LexicalMatch>,
}

/// Snapshot of what the coordinator currently serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub document_name: String,
    pub pages_indexed: usize,
    pub loaded_at: DateTime<Utc>,
    pub embedding_entries: usize,
}
