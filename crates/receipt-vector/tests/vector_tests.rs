use std::sync::Arc;

use receipt_core::{Chunk, ChunkStore, Embedder, Error, PageText};
use receipt_embed::HashEmbedder;
use receipt_vector::{CachedEmbedder, EmbeddingIndex};

fn chunks(name: &str, texts: &[&str]) -> Vec<Chunk> {
    let pages = texts.iter().enumerate().map(|(i, t)| PageText::new(i as u32 + 1, *t));
    ChunkStore::from_pages(pages, name).expect("store").chunks().to_vec()
}

fn index() -> EmbeddingIndex {
    EmbeddingIndex::new(Arc::new(HashEmbedder::new(384)))
}

const HANDBOOK: [&str; 3] = [
    "expense claims must include receipts",
    "annual leave accrues monthly",
    "laptops are replaced every three years",
];
const SECURITY: [&str; 2] = [
    "passwords rotate every ninety days",
    "report phishing emails to the security desk",
];

#[test]
fn empty_index_returns_no_matches() {
    let index = index();
    assert!(index.is_empty());
    assert!(index.search("anything", 3).expect("search").is_empty());
}

#[test]
fn fewer_entries_than_k_returns_all_entries() {
    let mut index = index();
    index.add(&chunks("handbook.pdf", &HANDBOOK[..2]), "handbook.pdf").expect("add");
    assert_eq!(index.search("leave", 10).expect("search").len(), 2);
    assert_eq!(index.search("leave", 1).expect("search").len(), 1);
}

#[test]
fn exact_text_is_its_own_nearest_neighbor() {
    let mut index = index();
    index.add(&chunks("handbook.pdf", &HANDBOOK), "handbook.pdf").expect("add");
    for (i, text) in HANDBOOK.iter().enumerate() {
        let hits = index.search(text, 3).expect("search");
        assert_eq!(hits[0].text, *text);
        assert_eq!(hits[0].page, i as u32 + 1);
        assert!(hits[0].distance.abs() < 1e-5, "distance {}", hits[0].distance);
        for pair in hits.windows(2) { assert!(pair[0].distance <= pair[1].distance); }
    }
}

#[test]
fn documents_accumulate_across_adds() {
    let mut index = index();
    index.add(&chunks("handbook.pdf", &HANDBOOK), "handbook.pdf").expect("add");
    index.add(&chunks("security.pdf", &SECURITY), "security.pdf").expect("add");
    assert_eq!(index.len(), 5);
    assert_eq!(index.documents()[3].document_name, "security.pdf");

    let hits = index.search(SECURITY[1], 1).expect("search");
    assert_eq!(hits[0].document, "security.pdf");
    assert_eq!(hits[0].page, 2);
    let hits = index.search(HANDBOOK[0], 1).expect("search");
    assert_eq!(hits[0].document, "handbook.pdf");
}

#[test]
fn add_order_does_not_change_membership_or_nearest() {
    let mut ab = index();
    ab.add(&chunks("handbook.pdf", &HANDBOOK), "handbook.pdf").expect("add");
    ab.add(&chunks("security.pdf", &SECURITY), "security.pdf").expect("add");
    let mut ba = index();
    ba.add(&chunks("security.pdf", &SECURITY), "security.pdf").expect("add");
    ba.add(&chunks("handbook.pdf", &HANDBOOK), "handbook.pdf").expect("add");

    let key = |m: &receipt_core::EmbeddingMatch| (m.document.clone(), m.page, m.text.clone());
    for query in ["receipts for expenses", "phishing", "laptops every three years"] {
        let mut left: Vec<_> = ab.search(query, 5).expect("search").iter().map(key).collect();
        let mut right: Vec<_> = ba.search(query, 5).expect("search").iter().map(key).collect();
        assert_eq!(ab.search(query, 1).expect("search")[0].distance, ba.search(query, 1).expect("search")[0].distance);
        left.sort();
        right.sort();
        assert_eq!(left, right);
    }
}

struct FlakyEmbedder {
    inner: HashEmbedder,
    fail_on: &'static str,
}

impl Embedder for FlakyEmbedder {
    fn model_id(&self) -> &str { "flaky" }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains(self.fail_on)) { anyhow::bail!("model crashed on input"); }
        self.inner.embed_batch(texts)
    }
}

#[test]
fn failed_encoding_commits_nothing() {
    let mut index = EmbeddingIndex::new(Arc::new(FlakyEmbedder { inner: HashEmbedder::new(16), fail_on: "poison" }));
    index.add(&chunks("a.pdf", &["first page"]), "a.pdf").expect("add");

    let err = index.add(&chunks("b.pdf", &["fine page", "poison page"]), "b.pdf").unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
    assert_eq!(index.len(), 1);
    assert_eq!(index.search("fine page", 5).expect("search").len(), 1);
}

struct WrongDim;

impl Embedder for WrongDim {
    fn model_id(&self) -> &str { "wrong" }
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 8 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
    }
}

#[test]
fn wrong_length_vectors_are_rejected() {
    let mut index = EmbeddingIndex::new(Arc::new(WrongDim));
    let err = index.add(&chunks("a.pdf", &["text"]), "a.pdf").unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3 }));
    assert!(index.is_empty());
}

#[test]
fn cache_skips_repeated_texts() {
    let cached = CachedEmbedder::new(HashEmbedder::new(32));
    let first = cached.embed_batch(&["alpha".to_string(), "beta".to_string()]).expect("embed");
    let second = cached.embed_batch(&["beta".to_string(), "gamma".to_string()]).expect("embed");
    assert_eq!(first[1], second[0]);

    let stats = cached.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.entries, 3);
    assert_eq!(cached.model_id(), "hash:xxh64:d32");
}

#[test]
fn cache_evicts_oldest_entries_past_its_limit() {
    let cached = CachedEmbedder::with_max_entries(HashEmbedder::new(16), 2);
    let texts = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();

    cached.embed_batch(&texts(&["alpha", "beta", "gamma"])).expect("embed");
    let stats = cached.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.evictions, 1);

    cached.embed_batch(&texts(&["gamma", "alpha"])).expect("embed");
    let stats = cached.stats();
    assert_eq!(stats.hits, 1, "gamma is still cached");
    assert_eq!(stats.misses, 4, "alpha was evicted");
    assert_eq!(stats.entries, 2);
    assert_eq!(cached.max_entries(), 2);
}

#[test]
fn duplicate_texts_in_one_batch_take_one_slot() {
    let cached = CachedEmbedder::with_max_entries(HashEmbedder::new(16), 4);
    let out = cached.embed_batch(&["same".to_string(), "same".to_string()]).expect("embed");
    assert_eq!(out[0], out[1]);
    assert_eq!(cached.stats().entries, 1);
    assert_eq!(cached.stats().evictions, 0);
}
