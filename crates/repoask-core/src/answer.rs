//! Answer synthesis: fit retrieved file contents into the context budget, ask the chat
//! model, and drop trailing files while the model rejects the prompt as too long.
//!
//! Token counts are approximated by whitespace-delimited words.

use std::path::Path;

use crate::openai::ApiError;
use crate::provider::{ChatModel, Message};
use crate::repo::read_lenient;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Approximate token count: whitespace-delimited words.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keeps whole contents in order while they fit in `budget` words. The first one that
/// doesn't fit is cut to exactly the words left, and nothing after it is kept.
pub fn fit_to_budget(contents: &[String], budget: usize) -> Vec<String> {
    let mut kept = Vec::new();
    let mut used = 0;
    for content in contents {
        let tokens = count_tokens(content);
        if used + tokens > budget {
            let remaining = budget - used;
            if remaining > 0 {
                let truncated: Vec<&str> = content.split_whitespace().take(remaining).collect();
                kept.push(truncated.join(" "));
            }
            break;
        }
        kept.push(content.clone());
        used += tokens;
    }
    kept
}

/// Reads each path once per occurrence. Unreadable files are logged and skipped.
pub fn read_contents<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<String> {
    paths
        .into_iter()
        .filter_map(|path| match read_lenient(path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::error!("error reading file {}: {e}", path.display());
                None
            }
        })
        .collect()
}

pub fn build_messages(query: &str, contents: &[String]) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Based on the following files, answer the query: {query}\n\n{}",
            contents.join("\n\n")
        )),
    ]
}

/// Limits for one synthesis call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisLimits {
    /// Words available for file contents.
    pub content_budget: usize,
    /// Maximum number of drop-last-and-resubmit rounds.
    pub max_shrink_attempts: usize,
}

/// Asks `chat` to answer `query` from `contents`.
///
/// Each context length rejection drops the last included content and resubmits. Fails
/// with the rejection once nothing is left to drop or the shrink attempts run out; any
/// other error is returned immediately.
pub async fn synthesize<C: ChatModel>(
    chat: &C,
    query: &str,
    contents: &[String],
    limits: SynthesisLimits,
) -> Result<String, AnswerError> {
    let mut included = fit_to_budget(contents, limits.content_budget);
    let mut shrinks = 0;
    loop {
        let messages = build_messages(query, &included);
        match chat.complete(&messages).await {
            Ok(answer) => return Ok(answer),
            Err(ApiError::ContextLengthExceeded(body)) => {
                if included.is_empty() || shrinks >= limits.max_shrink_attempts {
                    return Err(AnswerError::ContextLength {
                        attempts: shrinks + 1,
                        body,
                    });
                }
                included.pop();
                shrinks += 1;
                tracing::warn!(
                    "context length exceeded, retrying with {} file(s)",
                    included.len()
                );
            }
            Err(e) => return Err(AnswerError::Chat(e)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("prompt still too long after {attempts} attempt(s): {body}")]
    ContextLength { attempts: usize, body: String },
    #[error("chat completion failed: {0}")]
    Chat(ApiError),
}
