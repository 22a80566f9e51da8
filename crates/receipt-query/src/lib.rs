//! receipt-query
//!
//! The query coordinator: single entry point for loading documents and
//! answering questions over the lexical and embedding pipelines.
//!
//! Uploads are serialized. Each upload builds its chunk store, lexical index
//! and embedding batch off to the side, then publishes them; queries work on
//! an `Arc` snapshot of the lexical generation and never block an upload for
//! longer than the swap.

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use receipt_core::config::{RetrievalSettings, Settings};
use receipt_core::error::{Error, Result};
use receipt_core::traits::Embedder;
use receipt_core::types::{Answer, EmbeddingMatch, IndexStatus, LexicalMatch, LoadReport, Match, PageText, Pipeline};
use receipt_core::ChunkStore;
use receipt_embed::get_default_embedder;
use receipt_text::LexicalIndex;
use receipt_vector::{CachedEmbedder, EmbeddingBatch, EmbeddingIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    /// Falls back to `retrieval.top_k` when absent.
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub pipeline: Pipeline,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), top_k: None, pipeline: Pipeline::Lexical }
    }

    pub fn top_k(mut self, top_k: usize) -> Self { self.top_k = Some(top_k); self }
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self { self.pipeline = pipeline; self }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub matches: Vec<Match>,
}

/// Chunk store and lexical index of one upload, published together.
struct LexicalGeneration {
    store: ChunkStore,
    index: LexicalIndex,
    loaded_at: DateTime<Utc>,
}

pub struct QueryCoordinator {
    settings: RetrievalSettings,
    embedder: Arc<dyn Embedder>,
    lexical: RwLock<Option<Arc<LexicalGeneration>>>,
    embedding: RwLock<EmbeddingIndex>,
    uploads: Mutex<()>,
}

impl QueryCoordinator {
    pub fn new(embedder: Arc<dyn Embedder>, settings: RetrievalSettings) -> Self {
        let embedding = EmbeddingIndex::new(Arc::clone(&embedder));
        Self { settings, embedder, lexical: RwLock::new(None), embedding: RwLock::new(embedding), uploads: Mutex::new(()) }
    }

    /// Build the embedder the settings describe and wrap it in the cache if
    /// enabled.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let embedder = get_default_embedder(&settings.embedding)?;
        let embedder: Arc<dyn Embedder> = if settings.embedding.cache {
            Arc::new(CachedEmbedder::with_max_entries(embedder, settings.embedding.cache_entries))
        } else {
            Arc::from(embedder)
        };
        Ok(Self::new(embedder, settings.retrieval.clone()))
    }

    pub fn default_top_k(&self) -> usize { self.settings.top_k }

    pub fn load_document(&self, pages: Vec<PageText>, document_name: &str) -> Result<LoadReport> {
        self.load_document_with_progress(pages, document_name, &ProgressBar::hidden())
    }

    /// Replace the lexical generation with `pages` and append them to the
    /// embedding index. On any failure both pipelines keep their state.
    pub fn load_document_with_progress(&self, pages: Vec<PageText>, document_name: &str, progress: &ProgressBar) -> Result<LoadReport> {
        let _upload = self.uploads.lock();

        let store = ChunkStore::from_pages(pages, document_name)?;
        let index = LexicalIndex::build(store.chunks())?;
        progress.set_length(store.len() as u64);
        let batch = EmbeddingBatch::encode(self.embedder.as_ref(), store.chunks(), document_name, progress)?;

        let embedding_entries = {
            let mut embedding = self.embedding.write();
            embedding.commit(batch)?;
            embedding.len()
        };
        let pages_indexed = store.len();
        let generation = LexicalGeneration { store, index, loaded_at: Utc::now() };
        *self.lexical.write() = Some(Arc::new(generation));
        progress.finish_and_clear();

        info!(document = document_name, pages_indexed, embedding_entries, "document indexed");
        Ok(LoadReport { document_name: document_name.to_string(), pages_indexed, embedding_entries })
    }

    fn lexical_snapshot(&self) -> Option<Arc<LexicalGeneration>> {
        self.lexical.read().clone()
    }

    /// Lexical answer: top `top_k` chunks of the current document by TF-IDF
    /// cosine similarity.
    pub fn answer(&self, question: &str, top_k: usize) -> Result<Answer> {
        let generation = self.lexical_snapshot().ok_or(Error::NoIndex)?;
        let hits = generation.index.query(question, top_k).map_err(|err| match err {
            Error::IndexNotBuilt => Error::NoIndex,
            other => other,
        })?;

        let mut matches = Vec::with_capacity(hits.len());
        for hit in hits {
            let chunk = match generation.store.get(hit.chunk_id) {
                Ok(chunk) => chunk,
                Err(err) => {
                    error!(%err, "lexical index and chunk store disagree");
                    continue;
                }
            };
            matches.push(LexicalMatch {
                chunk_id: chunk.id,
                page: chunk.page,
                similarity: round3(hit.score),
                text: chunk.text.chars().take(self.settings.snippet_chars).collect(),
            });
        }
        debug!(question, matches = matches.len(), "answered");
        Ok(Answer { question: question.to_string(), matches })
    }

    /// Semantic search over every document loaded so far. Never fails for
    /// lack of documents; an empty index gives no matches.
    pub fn semantic_search(&self, question: &str, top_k: usize) -> Result<Vec<EmbeddingMatch>> {
        self.embedding.read().search(question, top_k)
    }

    pub fn handle_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let top_k = request.top_k.unwrap_or(self.settings.top_k);
        let matches = match request.pipeline {
            Pipeline::Lexical => self.answer(&request.question, top_k)?.matches.into_iter().map(Match::Lexical).collect(),
            Pipeline::Embedding => {
                if self.lexical.read().is_none() && self.embedding.read().is_empty() { return Err(Error::NoIndex); }
                self.semantic_search(&request.question, top_k)?.into_iter().map(Match::Embedding).collect()
            }
        };
        Ok(QueryResponse { question: request.question.clone(), matches })
    }

    pub fn status(&self) -> Option<IndexStatus> {
        let generation = self.lexical_snapshot()?;
        Some(IndexStatus {
            document_name: generation.store.document_name().to_string(),
            pages_indexed: generation.store.len(),
            loaded_at: generation.loaded_at,
            embedding_entries: self.embedding_entries(),
        })
    }

    pub fn embedding_entries(&self) -> usize { self.embedding.read().len() }
}

/// Three decimals, computed on the widened score with ties to even.
#[allow(clippy::cast_possible_truncation)]
fn round3(score: f32) -> f32 {
    ((f64::from(score) * 1000.0).round_ties_even() / 1000.0) as f32
}
