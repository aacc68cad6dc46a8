//! Flat vector index: exhaustive squared-Euclidean search over every stored embedding.
//! Append-only; serialized as JSON so it can be reloaded without re-embedding.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Brute-force nearest-neighbor index over fixed-dimension vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append a vector. Its position is the id search results refer to.
    pub fn add(&mut self, embedding: Vec<f32>) -> Result<usize, StoreError> {
        if embedding.len() != self.dimension {
            return Err(StoreError::Dimension {
                expected: self.dimension,
                got: embedding.len(),
            });
        }
        self.vectors.push(embedding);
        Ok(self.vectors.len() - 1)
    }

    /// Returns up to `k` `(position, squared L2 distance)` pairs, closest first.
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::Dimension {
                expected: self.dimension,
                got: query.len(),
            });
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let s = serde_json::to_string(self).map_err(StoreError::Serialize)?;
        std::fs::write(path, s).map_err(StoreError::Io)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let s = std::fs::read_to_string(path).map_err(StoreError::Io)?;
        serde_json::from_str(&s).map_err(StoreError::Serialize)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("dimension mismatch: index has {expected}, vector has {got}")]
    Dimension { expected: usize, got: usize },
    #[error("index I/O failed: {0}")]
    Io(std::io::Error),
    #[error("index (de)serialization failed: {0}")]
    Serialize(serde_json::Error),
}
