//! Authoritative ordered chunk list for the active document.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkId, PageText};

#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    document_name: String,
    chunks: Vec<Chunk>,
}

impl ChunkStore {
    pub fn new() -> Self { Self::default() }

    /// Build a store from extracted pages, dropping pages whose trimmed text
    /// is empty. Ids are assigned in encounter order.
    pub fn from_pages<I>(pages: I, document_name: &str) -> Result<Self>
    where
        I: IntoIterator<Item = PageText>,
    {
        let mut chunks = Vec::new();
        let mut skipped = 0usize;
        for page in pages {
            let text = page.text.trim();
            if text.is_empty() {
                skipped += 1;
                continue;
            }
            chunks.push(Chunk {
                id: chunks.len(),
                page: page.page,
                text: text.to_string(),
                document_name: document_name.to_string(),
            });
        }
        if chunks.is_empty() {
            debug!(document = document_name, skipped, "no readable pages");
            return Err(Error::EmptyDocument);
        }
        debug!(document = document_name, chunks = chunks.len(), skipped, "chunked document");
        Ok(Self { document_name: document_name.to_string(), chunks })
    }

    /// Replace the whole chunk set. On failure the current set is kept.
    pub fn load<I>(&mut self, pages: I, document_name: &str) -> Result<usize>
    where
        I: IntoIterator<Item = PageText>,
    {
        let next = Self::from_pages(pages, document_name)?;
        *self = next;
        info!(document = document_name, chunks = self.chunks.len(), "chunk store loaded");
        Ok(self.chunks.len())
    }

    pub fn get(&self, id: ChunkId) -> Result<&Chunk> {
        self.chunks.get(id).ok_or(Error::NotFound { id, len: self.chunks.len() })
    }

    pub fn document_name(&self) -> &str { &self.document_name }
    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> { self.chunks.iter() }
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

impl<'a> IntoIterator for &'a ChunkStore {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter { self.chunks.iter() }
}
