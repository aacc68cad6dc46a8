//! Reading a cloned repository's files as text.
//!
//! Version-control metadata and media files are skipped; everything else is read with
//! lenient UTF-8 decoding so one odd file never aborts ingestion.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions (lowercase, without the dot) treated as media and never read.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "gif", "jpg", "jpeg", "png", "bmp", "tiff", "svg"];

/// A repository file we read: path and full text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// Walks `root` and returns every non-media file outside `.git`, in walk order.
/// Entries are sorted by file name so the order is stable across runs.
/// Files that can't be read are logged and skipped.
pub fn scan_repo(root: &Path) -> Result<Vec<SourceFile>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_vcs_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!("walk error under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || is_media(entry.path()) {
            continue;
        }
        match read_lenient(entry.path()) {
            Ok(content) => files.push(SourceFile {
                path: entry.path().to_path_buf(),
                content,
            }),
            Err(e) => tracing::error!("error reading file {}: {e}", entry.path().display()),
        }
    }
    Ok(files)
}

/// Reads a file as text, dropping byte sequences that aren't valid UTF-8.
pub fn read_lenient(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_lenient(&bytes))
}

fn decode_lenient(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

fn is_vcs_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}

fn is_media(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            MEDIA_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
