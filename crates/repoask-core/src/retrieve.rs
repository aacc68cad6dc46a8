//! Query-time retrieval: embed the query, search the index, map hits back to files.

use std::path::PathBuf;

use crate::index::ChunkIndex;
use crate::openai::ApiError;
use crate::provider::Embedder;
use crate::store::StoreError;

/// One retrieved chunk: the file it came from and its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub path: PathBuf,
    pub distance: f32,
}

/// Returns the `k` nearest chunks' files, closest first.
/// Positions with no mapping entry are logged and left out.
pub async fn search<E: Embedder>(
    embedder: &E,
    index: &ChunkIndex,
    query: &str,
    k: usize,
) -> Result<Vec<SearchHit>, RetrieveError> {
    let query_embedding = embedder.embed(query).await?;
    let hits = index
        .index
        .search(&query_embedding, k)?
        .into_iter()
        .filter_map(|(position, distance)| match index.path_of(position) {
            Some(path) => Some(SearchHit {
                path: path.to_path_buf(),
                distance,
            }),
            None => {
                tracing::warn!("no file path recorded for chunk {position}");
                None
            }
        })
        .collect();
    Ok(hits)
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("could not embed query: {0}")]
    Embed(#[from] ApiError),
    #[error("search failed: {0}")]
    Search(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FlatIndex;

    /// Embeds every query to the same point.
    struct Fixed(Vec<f32>);

    impl Embedder for Fixed {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            Ok(self.0.clone())
        }
    }

    fn chunk_index(points: &[(f32, &str)], paths_len: usize) -> ChunkIndex {
        let mut index = FlatIndex::new(1);
        let mut paths = Vec::new();
        for (x, path) in points {
            index.add(vec![*x]).unwrap();
            paths.push(PathBuf::from(path));
        }
        paths.truncate(paths_len);
        ChunkIndex { index, paths }
    }

    #[tokio::test]
    async fn hits_are_closest_first_and_mapped_to_paths() {
        let idx = chunk_index(
            &[(5.0, "far.rs"), (1.0, "near.rs"), (2.0, "mid.rs"), (1.5, "near.rs")],
            4,
        );
        let hits = search(&Fixed(vec![0.0]), &idx, "where is parsing?", 3)
            .await
            .unwrap();
        let paths: Vec<_> = hits.iter().map(|h| h.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["near.rs", "near.rs", "mid.rs"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(hits[0].distance, 1.0);
    }

    #[tokio::test]
    async fn k_larger_than_index_returns_everything() {
        let idx = chunk_index(&[(1.0, "a.rs"), (2.0, "b.rs")], 2);
        let hits = search(&Fixed(vec![0.0]), &idx, "q", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn unmapped_positions_are_skipped() {
        let idx = chunk_index(&[(1.0, "a.rs"), (0.0, "lost.rs")], 1);
        let hits = search(&Fixed(vec![0.0]), &idx, "q", 5).await.unwrap();
        assert_eq!(
            hits,
            vec![SearchHit {
                path: PathBuf::from("a.rs"),
                distance: 1.0
            }]
        );
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_an_error() {
        let idx = chunk_index(&[(1.0, "a.rs")], 1);
        let err = search(&Fixed(vec![0.0, 0.0]), &idx, "q", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrieveError::Search(_)));
    }
}
