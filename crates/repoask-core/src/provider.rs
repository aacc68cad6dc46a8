//! Seams for the two remote services so the pipeline can run against fakes.

use serde::{Deserialize, Serialize};

use crate::openai::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Turns one text into one embedding vector.
#[allow(async_fn_in_trait)]
pub trait Embedder {
    /// Embed a single text. Implementations own their retry policy.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

/// Generates an answer from role-tagged messages.
#[allow(async_fn_in_trait)]
pub trait ChatModel {
    /// Returns the text of the first choice.
    async fn complete(&self, messages: &[Message]) -> Result<String, ApiError>;
}
