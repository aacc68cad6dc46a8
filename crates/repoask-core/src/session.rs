//! The context every query runs against: config, both remote services, and the index.

use std::path::Path;

use crate::answer::{read_contents, synthesize, AnswerError, SynthesisLimits};
use crate::config::Config;
use crate::index::{load_or_build, ChunkIndex, IndexError};
use crate::provider::{ChatModel, Embedder};
use crate::retrieve::{search, RetrieveError, SearchHit};

/// An answer and the hits whose files fed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug)]
pub struct Session<E, C> {
    config: Config,
    embedder: E,
    chat: C,
    index: ChunkIndex,
}

impl<E: Embedder, C: ChatModel> Session<E, C> {
    pub fn new(config: Config, embedder: E, chat: C, index: ChunkIndex) -> Self {
        Self {
            config,
            embedder,
            chat,
            index,
        }
    }

    /// Loads the persisted index, or builds it from the repository at `repo_root`.
    pub async fn open(
        config: Config,
        repo_root: &Path,
        embedder: E,
        chat: C,
    ) -> Result<Self, SessionError> {
        let index = load_or_build(repo_root, &embedder, &config).await?;
        tracing::info!("index ready: {} chunk(s)", index.len());
        Ok(Self::new(config, embedder, chat, index))
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    /// Retrieve the nearest chunks' files and synthesize an answer from them.
    pub async fn ask(&self, query: &str) -> Result<Answer, SessionError> {
        let hits = search(&self.embedder, &self.index, query, self.config.top_k).await?;
        let contents = read_contents(hits.iter().map(|h| h.path.as_path()));
        let limits = SynthesisLimits {
            content_budget: self.config.content_budget(),
            max_shrink_attempts: self.config.max_shrink_attempts,
        };
        let text = synthesize(&self.chat, query, &contents, limits).await?;
        Ok(Answer { text, hits })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
}
