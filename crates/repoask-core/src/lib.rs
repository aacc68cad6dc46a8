//! All backend logic independent of how the tool is run.
//!
//! Pipeline: [repo] → [chunks] → [embed] → [index] at startup, then [retrieve] → [answer]
//! per query, tied together by a [session::Session].

pub mod answer;
pub mod app_data;
pub mod chunks;
pub mod config;
pub mod embed;
pub mod index;
pub mod openai;
pub mod provider;
pub mod repl;
pub mod repo;
pub mod retrieve;
pub mod session;
pub mod store;

pub use app_data::app_data_dir;
pub use chunks::{chunk_file, chunk_files, split_text, Chunk, DEFAULT_MAX_CHARS};
pub use config::{load_config, load_config_from, Config};
pub use index::{artifacts_exist, build_index, load_or_build, ChunkIndex, IndexError};
pub use openai::{ApiError, OpenAiClient};
pub use provider::{ChatModel, Embedder, Message, Role};
pub use repo::{scan_repo, ScanError, SourceFile};
pub use retrieve::SearchHit;
pub use session::{Answer, Session, SessionError};
pub use store::FlatIndex;
