use std::cmp::Ordering;
use tracing::{debug, info};

use receipt_core::error::{Error, Result};
use receipt_core::types::{Chunk, ChunkId};

use crate::analyzer::{build_analyzer, tokenize_with};
use crate::vectorizer::{SparseVector, TfidfVectorizer};

/// A chunk id with its cosine similarity to the query. Unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalHit {
    pub chunk_id: ChunkId,
    pub score: f32,
}

/// Fitted vectorizer plus one normalized row per chunk, built together so
/// vocabulary and matrix always come from the same generation.
#[derive(Debug, Clone)]
struct TfidfMatrix {
    vectorizer: TfidfVectorizer,
    chunk_ids: Vec<ChunkId>,
    rows: Vec<SparseVector>,
}

/// TF-IDF index over the chunks of one document.
///
/// Starts unbuilt; every `rebuild` refits from scratch. Queries never refit.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    matrix: Option<TfidfMatrix>,
}

impl LexicalIndex {
    pub fn new() -> Self { Self::default() }

    /// Fit a fresh index over `chunks`.
    pub fn build(chunks: &[Chunk]) -> Result<Self> {
        if chunks.is_empty() { return Err(Error::EmptyDocument); }
        let mut analyzer = build_analyzer();
        let tokenized: Vec<Vec<String>> = chunks.iter().map(|c| tokenize_with(&mut analyzer, &c.text)).collect();
        let vectorizer = TfidfVectorizer::fit(&tokenized);
        let rows = tokenized.iter().map(|tokens| vectorizer.transform(tokens)).collect();
        let chunk_ids = chunks.iter().map(|c| c.id).collect();
        info!(chunks = chunks.len(), vocabulary = vectorizer.len(), "built lexical index");
        Ok(Self { matrix: Some(TfidfMatrix { vectorizer, chunk_ids, rows }) })
    }

    /// Replace the index with one fitted over `chunks`. A failed rebuild
    /// leaves the current state as it was.
    pub fn rebuild(&mut self, chunks: &[Chunk]) -> Result<()> {
        *self = Self::build(chunks)?;
        Ok(())
    }

    /// Rank chunks by cosine similarity to `text`, best first, ties by lower
    /// chunk id. Returns at most `top_k` hits.
    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<LexicalHit>> {
        let matrix = self.matrix.as_ref().ok_or(Error::IndexNotBuilt)?;
        let query = matrix.vectorizer.transform(&tokenize_with(&mut build_analyzer(), text));
        let mut hits: Vec<LexicalHit> = matrix
            .chunk_ids
            .iter()
            .zip(&matrix.rows)
            .map(|(&chunk_id, row)| LexicalHit { chunk_id, score: query.dot(row).clamp(-1.0, 1.0) })
            .collect();
        hits.sort_by(rank_order);
        hits.truncate(top_k.min(matrix.rows.len()));
        debug!(terms = query.entries().len(), hits = hits.len(), "lexical query");
        Ok(hits)
    }

    pub fn is_built(&self) -> bool { self.matrix.is_some() }
    pub fn num_chunks(&self) -> usize { self.matrix.as_ref().map_or(0, |m| m.rows.len()) }
    pub fn vocabulary_len(&self) -> usize { self.matrix.as_ref().map_or(0, |m| m.vectorizer.len()) }
    pub fn idf(&self, term: &str) -> Option<f32> { self.matrix.as_ref()?.vectorizer.idf(term) }
}

fn rank_order(a: &LexicalHit, b: &LexicalHit) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_rank_lower_id_first() {
        let mut hits = vec![
            LexicalHit { chunk_id: 2, score: 0.5 },
            LexicalHit { chunk_id: 0, score: 0.5 },
            LexicalHit { chunk_id: 1, score: 0.9 },
        ];
        hits.sort_by(rank_order);
        let ids: Vec<ChunkId> = hits.iter().map(|h| h.chunk_id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
    }
}
