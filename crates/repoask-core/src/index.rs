//! Index pipeline: scan → chunk → embed → flat index, plus the two on-disk artifacts.
//!
//! The index file holds the vectors; the mapping file holds one source path per line in
//! insertion order. Line `i` names the file behind vector `i`, so the two are always
//! written together and never reconciled on load.

use std::fs;
use std::path::{Path, PathBuf};

use crate::chunks::chunk_files;
use crate::config::Config;
use crate::embed::embed_chunks;
use crate::provider::Embedder;
use crate::repo::{scan_repo, ScanError};
use crate::store::{FlatIndex, StoreError};

/// The vector index and its positional chunk → file path mapping.
#[derive(Debug, Clone)]
pub struct ChunkIndex {
    pub index: FlatIndex,
    pub paths: Vec<PathBuf>,
}

impl ChunkIndex {
    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Source path of the chunk at `position`, if the mapping has one.
    pub fn path_of(&self, position: usize) -> Option<&Path> {
        self.paths.get(position).map(PathBuf::as_path)
    }

    /// Writes both artifacts. The stale mapping is removed before either file is replaced,
    /// so an interrupted save leaves nothing that `artifacts_exist` would accept.
    pub fn save(&self, index_path: &Path, mapping_path: &Path) -> Result<(), IndexError> {
        let index_tmp = tmp_sibling(index_path);
        let mapping_tmp = tmp_sibling(mapping_path);
        self.index.save(&index_tmp)?;
        let mut mapping = String::new();
        for path in &self.paths {
            mapping.push_str(&path.to_string_lossy());
            mapping.push('\n');
        }
        fs::write(&mapping_tmp, mapping).map_err(IndexError::Io)?;

        if mapping_path.exists() {
            fs::remove_file(mapping_path).map_err(IndexError::Io)?;
        }
        fs::rename(&index_tmp, index_path).map_err(IndexError::Io)?;
        fs::rename(&mapping_tmp, mapping_path).map_err(IndexError::Io)?;
        Ok(())
    }

    /// Reads both artifacts as they are. No check that their lengths agree.
    pub fn load(index_path: &Path, mapping_path: &Path) -> Result<Self, IndexError> {
        let index = FlatIndex::load(index_path)?;
        let mapping = fs::read_to_string(mapping_path).map_err(IndexError::Io)?;
        let paths = mapping.lines().map(PathBuf::from).collect();
        Ok(Self { index, paths })
    }
}

/// True when both the index and the mapping file exist.
pub fn artifacts_exist(index_path: &Path, mapping_path: &Path) -> bool {
    index_path.is_file() && mapping_path.is_file()
}

/// Runs the full pipeline over the repository at `root` and returns the in-memory index.
/// Fails with [`IndexError::NoEmbeddings`] when not a single chunk could be embedded.
pub async fn build_index<E: Embedder>(
    root: &Path,
    embedder: &E,
    config: &Config,
) -> Result<ChunkIndex, IndexError> {
    tracing::info!("Reading files from the repository...");
    let files = scan_repo(root)?;
    let chunks = chunk_files(&files, config.max_chunk_chars);
    tracing::info!("{} file(s), {} chunk(s)", files.len(), chunks.len());

    tracing::info!("Generating embeddings...");
    let embedded = embed_chunks(embedder, &chunks).await;
    let Some(first) = embedded.first() else {
        return Err(IndexError::NoEmbeddings);
    };

    tracing::info!("Indexing embeddings...");
    let mut index = FlatIndex::new(first.embedding.len());
    let mut paths = Vec::with_capacity(embedded.len());
    for chunk in embedded {
        index.add(chunk.embedding)?;
        paths.push(chunk.path);
    }
    Ok(ChunkIndex { index, paths })
}

/// Loads the persisted artifacts when both exist; otherwise builds and persists them.
pub async fn load_or_build<E: Embedder>(
    root: &Path,
    embedder: &E,
    config: &Config,
) -> Result<ChunkIndex, IndexError> {
    if artifacts_exist(&config.index_path, &config.mapping_path) {
        tracing::info!("Loading existing index and file paths...");
        return ChunkIndex::load(&config.index_path, &config.mapping_path);
    }
    let built = build_index(root, embedder, config).await?;
    built.save(&config.index_path, &config.mapping_path)?;
    tracing::info!("Indexing completed.");
    Ok(built)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("no embeddings were generated; check the input data and API responses")]
    NoEmbeddings,
    #[error("index error: {0}")]
    Store(#[from] StoreError),
    #[error("mapping I/O failed: {0}")]
    Io(std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use reqwest::StatusCode;

    use super::*;
    use crate::openai::ApiError;

    /// Records every input; embeds a text as `[word count, char count]`.
    #[derive(Default)]
    struct Recording {
        inputs: RefCell<Vec<String>>,
    }

    impl Embedder for Recording {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
            self.inputs.borrow_mut().push(text.to_string());
            Ok(vec![
                text.split_whitespace().count() as f32,
                text.len() as f32,
            ])
        }
    }

    struct Refusing {
        calls: Cell<usize>,
    }

    impl Embedder for Refusing {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            self.calls.set(self.calls.get() + 1);
            Err(ApiError::Status {
                status: StatusCode::BAD_REQUEST,
                body: "invalid".into(),
            })
        }
    }

    fn config_in(dir: &Path) -> Config {
        Config {
            index_path: dir.join("index.json"),
            mapping_path: dir.join("file_paths.txt"),
            ..Config::default()
        }
    }

    fn two_file_repo(dir: &Path) -> PathBuf {
        let root = dir.join("repo");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("README.md"), "A tiny parser.").unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn parse() {}").unwrap();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        root
    }

    #[tokio::test]
    async fn two_files_build_two_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = two_file_repo(dir.path());
        let config = config_in(dir.path());
        let embedder = Recording::default();

        let built = load_or_build(&root, &embedder, &config).await.unwrap();

        assert_eq!(embedder.inputs.borrow().len(), 2);
        assert_eq!(built.len(), 2);
        assert_eq!(built.index.dimension(), 2);
        assert_eq!(
            built.paths,
            vec![root.join("README.md"), root.join("src/lib.rs")]
        );
        assert!(artifacts_exist(&config.index_path, &config.mapping_path));
        let mapping = fs::read_to_string(&config.mapping_path).unwrap();
        assert_eq!(mapping.lines().count(), built.len());
    }

    #[tokio::test]
    async fn existing_artifacts_skip_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let root = two_file_repo(dir.path());
        let config = config_in(dir.path());
        load_or_build(&root, &Recording::default(), &config)
            .await
            .unwrap();

        let second = Recording::default();
        let loaded = load_or_build(&root, &second, &config).await.unwrap();
        assert!(second.inputs.borrow().is_empty());
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.paths.len(), loaded.index.len());
    }

    #[tokio::test]
    async fn no_embeddings_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = two_file_repo(dir.path());
        let config = config_in(dir.path());
        let embedder = Refusing { calls: Cell::new(0) };

        let err = load_or_build(&root, &embedder, &config).await.unwrap_err();
        assert!(matches!(err, IndexError::NoEmbeddings));
        assert_eq!(embedder.calls.get(), 2);
        assert!(!config.index_path.exists());
        assert!(!config.mapping_path.exists());
    }

    #[test]
    fn mismatched_artifacts_load_without_validation() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut index = FlatIndex::new(1);
        index.add(vec![1.0]).unwrap();
        index.add(vec![2.0]).unwrap();
        index.save(&config.index_path).unwrap();
        fs::write(&config.mapping_path, "only/one.rs\n").unwrap();

        let loaded = ChunkIndex::load(&config.index_path, &config.mapping_path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.paths.len(), 1);
        assert_eq!(loaded.path_of(0), Some(Path::new("only/one.rs")));
        assert_eq!(loaded.path_of(1), None);
    }

    #[test]
    fn save_replaces_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.mapping_path, "stale.rs\nstale2.rs\n").unwrap();
        let mut index = FlatIndex::new(1);
        index.add(vec![0.5]).unwrap();
        let chunk_index = ChunkIndex {
            index,
            paths: vec![PathBuf::from("fresh.rs")],
        };
        chunk_index
            .save(&config.index_path, &config.mapping_path)
            .unwrap();

        assert_eq!(
            fs::read_to_string(&config.mapping_path).unwrap(),
            "fresh.rs\n"
        );
        assert!(!tmp_sibling(&config.index_path).exists());
        assert!(!tmp_sibling(&config.mapping_path).exists());
    }
}
