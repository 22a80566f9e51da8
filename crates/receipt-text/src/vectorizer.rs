//! TF-IDF weighting over a fixed vocabulary.
//!
//! Weights follow the smoothed formulation: raw term count times
//! `ln((1 + N) / (1 + df)) + 1`, then L2 normalization of each vector. Columns
//! are assigned in lexicographic term order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A sparse vector with columns in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    fn from_unsorted(mut entries: Vec<(usize, f32)>) -> Self {
        entries.sort_unstable_by_key(|&(col, _)| col);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f32)] { &self.entries }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in &mut self.entries { *w /= norm; }
        }
    }

    /// Dot product by merging the two column lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut sum) = (0usize, 0usize, 0f32);
        while i < self.entries.len() && j < other.entries.len() {
            let (a_col, a_w) = self.entries[i];
            let (b_col, b_w) = other.entries[j];
            match a_col.cmp(&b_col) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => { sum += a_w * b_w; i += 1; j += 1; }
            }
        }
        sum
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF weights from tokenized documents.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let n_docs = documents.len();
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in documents {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique { *document_frequency.entry(term).or_insert(0) += 1; }
        }

        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (col, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), col);
            idf.push(smoothed_idf(n_docs, df));
        }
        Self { vocabulary, idf }
    }

    /// Project tokens onto the fitted vocabulary. Unknown terms are ignored;
    /// the vocabulary never grows here.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in tokens {
            if let Some(&col) = self.vocabulary.get(token) { *counts.entry(col).or_insert(0) += 1; }
        }
        #[allow(clippy::cast_precision_loss)]
        let entries = counts.into_iter().map(|(col, tf)| (col, tf as f32 * self.idf[col])).collect();
        let mut vector = SparseVector::from_unsorted(entries);
        vector.normalize();
        vector
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&col| self.idf[col])
    }

    pub fn column(&self, term: &str) -> Option<usize> { self.vocabulary.get(term).copied() }
    pub fn len(&self) -> usize { self.idf.len() }
    pub fn is_empty(&self) -> bool { self.idf.is_empty() }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn smoothed_idf(n_docs: usize, df: usize) -> f32 {
    (((1 + n_docs) as f64 / (1 + df) as f64).ln() + 1.0) as f32
}
