//! receipt-text
//!
//! Lexical retrieval: tantivy's analyzer for tokens, TF-IDF weighting and
//! cosine ranking over the chunks of the current document.

pub mod analyzer;
pub mod index;
pub mod vectorizer;

pub use index::{LexicalHit, LexicalIndex};
pub use vectorizer::{SparseVector, TfidfVectorizer};
