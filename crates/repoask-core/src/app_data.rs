//! Where repoask keeps its own settings.
//!
//! Index artifacts live in the working directory next to the cloned repository;
//! only the config file is stored here.

use std::path::PathBuf;

/// Returns the directory where repoask stores its config.
/// On Linux: `~/.local/share/repoask/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("dev", "repoask", "repoask")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
