use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, info, warn};

use receipt_core::error::{Error, Result};
use receipt_core::traits::Embedder;
use receipt_core::types::{Chunk, EmbeddingMatch};

use crate::flat::FlatL2Index;

const ENCODE_BATCH: usize = 32;

/// Metadata kept alongside each stored vector, in the same slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingRecord {
    pub text: String,
    pub page: u32,
    pub document_name: String,
}

/// Vectors for one document, encoded and checked but not yet visible.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    document_name: String,
    dim: usize,
    records: Vec<EmbeddingRecord>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingBatch {
    /// Encode `chunks` with `embedder`. Fails without side effects if any
    /// chunk cannot be encoded or comes back with the wrong length.
    pub fn encode(embedder: &dyn Embedder, chunks: &[Chunk], document_name: &str, progress: &ProgressBar) -> Result<Self> {
        let dim = embedder.dim();
        let mut vectors = Vec::with_capacity(chunks.len());
        for group in chunks.chunks(ENCODE_BATCH) {
            let texts: Vec<String> = group.iter().map(|c| c.text.clone()).collect();
            let encoded = embedder.embed_batch(&texts).map_err(|e| Error::embedding(&e))?;
            if encoded.len() != texts.len() {
                return Err(Error::Embedding(format!("embedder returned {} vectors for {} texts", encoded.len(), texts.len())));
            }
            if let Some(bad) = encoded.iter().find(|v| v.len() != dim) {
                return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
            }
            vectors.extend(encoded);
            progress.inc(group.len() as u64);
        }
        let records = chunks
            .iter()
            .map(|c| EmbeddingRecord { text: c.text.clone(), page: c.page, document_name: document_name.to_string() })
            .collect();
        Ok(Self { document_name: document_name.to_string(), dim, records, vectors })
    }

    pub fn document_name(&self) -> &str { &self.document_name }
    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

/// Append-only embedding index, cumulative across documents.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    flat: FlatL2Index,
    documents: Vec<EmbeddingRecord>,
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let flat = FlatL2Index::new(embedder.dim());
        Self { embedder, flat, documents: Vec::new() }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(text).map_err(|e| Error::embedding(&e))?;
        if vector.len() != self.flat.dim() {
            return Err(Error::DimensionMismatch { expected: self.flat.dim(), actual: vector.len() });
        }
        Ok(vector)
    }

    pub fn prepare(&self, chunks: &[Chunk], document_name: &str) -> Result<EmbeddingBatch> {
        EmbeddingBatch::encode(self.embedder.as_ref(), chunks, document_name, &ProgressBar::hidden())
    }

    /// Make a prepared batch searchable. Vectors and metadata grow together.
    pub fn commit(&mut self, batch: EmbeddingBatch) -> Result<usize> {
        if batch.dim != self.flat.dim() {
            return Err(Error::DimensionMismatch { expected: self.flat.dim(), actual: batch.dim });
        }
        let added = batch.records.len();
        self.flat.add(&batch.vectors)?;
        self.documents.extend(batch.records);
        info!(document = %batch.document_name, added, total = self.documents.len(), "embedding batch committed");
        Ok(added)
    }

    /// Encode and append `chunks` in order. Prior entries are never touched.
    pub fn add(&mut self, chunks: &[Chunk], document_name: &str) -> Result<usize> {
        let batch = self.prepare(chunks, document_name)?;
        self.commit(batch)
    }

    /// The `top_k` entries nearest to `query`, closest first. An empty index
    /// answers with no matches.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<EmbeddingMatch>> {
        if self.flat.is_empty() || top_k == 0 { return Ok(Vec::new()); }
        let query_vector = self.encode(query)?;
        let neighbors = self.flat.search(&query_vector, top_k)?;
        let matches: Vec<EmbeddingMatch> = neighbors
            .into_iter()
            .filter_map(|(slot, distance)| match self.documents.get(slot) {
                Some(record) => Some(EmbeddingMatch {
                    page: record.page,
                    document: record.document_name.clone(),
                    text: record.text.clone(),
                    distance,
                }),
                None => {
                    warn!(slot, known = self.documents.len(), "skipping vector slot without metadata");
                    None
                }
            })
            .collect();
        debug!(hits = matches.len(), "embedding search");
        Ok(matches)
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> { Arc::clone(&self.embedder) }
    pub fn dimension(&self) -> usize { self.flat.dim() }
    pub fn documents(&self) -> &[EmbeddingRecord] { &self.documents }
    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
}
