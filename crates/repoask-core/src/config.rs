//! Tunables for the pipeline, read from `config.toml` in the app data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_data;

const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the OpenAI-compatible API (without trailing `/embeddings`).
    pub base_url: String,
    pub embed_model: String,
    pub chat_model: String,
    /// Character cap per chunk.
    pub max_chunk_chars: usize,
    /// Number of nearest chunks retrieved per query.
    pub top_k: usize,
    /// Total context budget, in whitespace-delimited words.
    pub max_context_tokens: usize,
    /// Words reserved out of the budget for the system/user scaffolding.
    pub context_overhead_tokens: usize,
    pub max_output_tokens: u32,
    /// Attempts per chunk when the embedding service answers 5xx.
    pub embed_retries: u32,
    pub backoff_base_ms: u64,
    /// Upper bound on drop-last-file resubmissions after a context length rejection.
    pub max_shrink_attempts: usize,
    pub index_path: PathBuf,
    pub mapping_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            max_chunk_chars: crate::chunks::DEFAULT_MAX_CHARS,
            top_k: 5,
            max_context_tokens: 16384,
            context_overhead_tokens: 1000,
            max_output_tokens: 1500,
            embed_retries: 5,
            backoff_base_ms: 1000,
            max_shrink_attempts: 16,
            index_path: PathBuf::from("kernel_index.json"),
            mapping_path: PathBuf::from("file_paths.txt"),
        }
    }
}

impl Config {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Word budget left for file contents once the scaffolding is reserved.
    pub fn content_budget(&self) -> usize {
        self.max_context_tokens
            .saturating_sub(self.context_overhead_tokens)
    }
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    load_config_from(&data_dir.join(CONFIG_FILENAME))
}

/// Load config from an explicit file. Returns default config if missing or invalid.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&s) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {e}");
            Config::default()
        }
    }
}
