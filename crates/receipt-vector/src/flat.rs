//! Exact nearest-neighbor search by squared Euclidean distance over a flat,
//! row-major vector buffer.

use receipt_core::error::{Error, Result};

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new() } }

    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.data.len().checked_div(self.dim).unwrap_or(0) }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Append vectors in order. Every vector is checked before any is
    /// written, so a bad batch adds nothing.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: bad.len() });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors { self.data.extend_from_slice(v); }
        Ok(())
    }

    pub fn vector(&self, idx: usize) -> Option<&[f32]> {
        if self.dim == 0 { return None; }
        self.data.chunks_exact(self.dim).nth(idx)
    }

    /// The `k` closest slots as `(slot, squared distance)`, nearest first,
    /// ties by lower slot.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if self.dim == 0 || k == 0 { return Ok(Vec::new()); }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| squared_l2(query, row))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}
