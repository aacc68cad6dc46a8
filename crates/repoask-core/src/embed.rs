//! Embeds a corpus chunk by chunk, keeping each vector paired with its source path.

use std::path::PathBuf;

use crate::chunks::Chunk;
use crate::provider::Embedder;

const PROGRESS_EVERY: usize = 100;

/// One successfully embedded chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub path: PathBuf,
    pub embedding: Vec<f32>,
}

/// Embeds every chunk in order, one request each.
///
/// Failed chunks are logged and dropped together with their path, so the output never
/// misaligns. The dimension is fixed by the first vector; vectors of another size are
/// dropped as well.
pub async fn embed_chunks<E: Embedder>(embedder: &E, chunks: &[Chunk]) -> Vec<EmbeddedChunk> {
    let mut out = Vec::with_capacity(chunks.len());
    let mut dimension = None;
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 && i % PROGRESS_EVERY == 0 {
            tracing::info!("embedded {i}/{} chunks", chunks.len());
        }
        let embedding = match embedder.embed(&chunk.text).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(path = %chunk.path.display(), "skipping chunk {i}: {e}");
                continue;
            }
        };
        let expected = *dimension.get_or_insert(embedding.len());
        if embedding.len() != expected {
            tracing::warn!(
                path = %chunk.path.display(),
                "skipping chunk {i}: dimension {} differs from {expected}",
                embedding.len()
            );
            continue;
        }
        out.push(EmbeddedChunk {
            path: chunk.path.clone(),
            embedding,
        });
    }
    out
}
