//! In-memory embedding cache keyed by `(embedder_id, content_hash)`.
//!
//! The cache is consulted before calling the wrapped embedder and written
//! through on misses, so re-uploading a document with unchanged pages does not
//! re-run the model. It holds at most `max_entries` vectors and evicts the
//! oldest insertions first.

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

use receipt_core::traits::Embedder;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
    pub evictions: usize,
}

#[derive(Default)]
struct CacheState {
    vectors: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
    hits: usize,
    misses: usize,
    evictions: usize,
}

impl CacheState {
    fn insert(&mut self, key: String, vector: Vec<f32>, max_entries: usize) {
        if self.vectors.insert(key.clone(), vector).is_some() { return; }
        self.order.push_back(key);
        while self.vectors.len() > max_entries {
            let Some(oldest) = self.order.pop_front() else { break };
            self.vectors.remove(&oldest);
            self.evictions += 1;
        }
    }
}

pub struct CachedEmbedder<E> {
    inner: E,
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self::with_max_entries(inner, DEFAULT_MAX_ENTRIES)
    }

    /// A cache holding at most `max_entries` vectors (at least one).
    pub fn with_max_entries(inner: E, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        info!(model = inner.model_id(), max_entries, "embedding cache enabled");
        Self { inner, max_entries, state: Mutex::new(CacheState::default()) }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats { hits: state.hits, misses: state.misses, entries: state.vectors.len(), evictions: state.evictions }
    }

    pub fn max_entries(&self) -> usize { self.max_entries }

    fn key(&self, text: &str) -> String {
        format!("{}:{}", self.inner.model_id(), content_hash(text))
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn model_id(&self) -> &str { self.inner.model_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| self.key(t)).collect();
        let mut out: Vec<Option<Vec<f32>>> = {
            let state = self.state.lock();
            keys.iter().map(|k| state.vectors.get(k).cloned()).collect()
        };

        let miss_slots: Vec<usize> = (0..texts.len()).filter(|&i| out[i].is_none()).collect();
        let hits = texts.len() - miss_slots.len();
        if !miss_slots.is_empty() {
            // The model runs outside the lock.
            let miss_texts: Vec<String> = miss_slots.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&miss_texts)?;
            if fresh.len() != miss_texts.len() {
                return Err(anyhow!("embedder returned {} vectors for {} texts", fresh.len(), miss_texts.len()));
            }
            let mut state = self.state.lock();
            for (&slot, vector) in miss_slots.iter().zip(fresh) {
                state.insert(keys[slot].clone(), vector.clone(), self.max_entries);
                out[slot] = Some(vector);
            }
        }

        let mut state = self.state.lock();
        state.hits += hits;
        state.misses += miss_slots.len();
        drop(state);
        debug!(hits, misses = miss_slots.len(), "embedding cache lookup");

        out.into_iter()
            .map(|v| v.ok_or_else(|| anyhow!("embedding cache lost a vector")))
            .collect()
    }
}
