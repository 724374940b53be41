//! Request and response types for the Prem chat completions API
//!
//! Optional request fields are modelled as `Option` and skipped when absent, so a
//! request only carries what the caller actually supplied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PremError, Result};

/// Similarity threshold applied when RAG is requested without one
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.65;

/// Number of context chunks retrieved when RAG is requested without a limit
pub const DEFAULT_CONTEXT_LIMIT: u32 = 3;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Body of an outgoing message: literal text or a server-side template reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Template {
        template_id: String,
        params: BTreeMap<String, String>,
    },
    Text {
        content: String,
    },
}

/// A single outgoing chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl ChatMessage {
    /// Create a user message with literal text
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            body: MessageBody::Text {
                content: content.into(),
            },
        }
    }

    /// Create a user message that references a prompt template
    #[must_use]
    pub fn template(template_id: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            role: Role::User,
            body: MessageBody::Template {
                template_id: template_id.into(),
                params,
            },
        }
    }
}

/// Repositories used to augment a chat request with retrieved context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryContext {
    pub ids: Vec<i64>,
    pub similarity_threshold: f64,
    pub limit: u32,
}

impl RepositoryContext {
    /// Build a context, filling in the default threshold and limit
    ///
    /// # Errors
    ///
    /// Returns a validation error if the threshold is outside `[0, 1]`
    pub fn new(ids: Vec<i64>, similarity_threshold: Option<f64>, limit: Option<u32>) -> Result<Self> {
        let similarity_threshold = similarity_threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(PremError::Validation(format!(
                "similarity_threshold must be between 0 and 1, got {similarity_threshold}"
            )));
        }

        Ok(Self {
            ids,
            similarity_threshold,
            limit: limit.unwrap_or(DEFAULT_CONTEXT_LIMIT),
        })
    }
}

/// Optional settings merged into a [`ChatRequest`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub repositories: Option<RepositoryContext>,
}

/// Body of `POST /v1/chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub project_id: String,
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repositories: Option<RepositoryContext>,
}

impl ChatRequest {
    /// Build a single-message request for a project
    #[must_use]
    pub fn new(project_id: impl Into<String>, message: ChatMessage, options: ChatOptions) -> Self {
        let ChatOptions {
            model,
            system_prompt,
            temperature,
            max_tokens,
            repositories,
        } = options;

        Self {
            project_id: project_id.into(),
            messages: vec![message],
            model,
            system_prompt,
            temperature,
            max_tokens,
            repositories,
        }
    }
}

/// Message returned in a completion choice
///
/// Kept as the raw JSON object so it is written back exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMessage(pub Map<String, Value>);

impl ResponseMessage {
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn content(&self) -> Option<&str> {
        self.0.get("content").and_then(Value::as_str)
    }
}

/// One completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Choice {
    pub fn finish_reason(&self) -> Option<&str> {
        self.extra.get("finish_reason").and_then(Value::as_str)
    }
}

/// A retrieved context chunk attached to a RAG response
///
/// Any field may be missing or null; unknown fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentChunk(pub Map<String, Value>);

impl DocumentChunk {
    pub fn repository_id(&self) -> Option<i64> {
        self.0.get("repository_id").and_then(Value::as_i64)
    }

    pub fn document_id(&self) -> Option<i64> {
        self.0.get("document_id").and_then(Value::as_i64)
    }

    pub fn chunk_id(&self) -> Option<i64> {
        self.0.get("chunk_id").and_then(Value::as_i64)
    }

    pub fn document_name(&self) -> Option<&str> {
        self.0.get("document_name").and_then(Value::as_str)
    }

    pub fn similarity_score(&self) -> Option<f64> {
        self.0.get("similarity_score").and_then(Value::as_f64)
    }

    pub fn content(&self) -> Option<&str> {
        self.0.get("content").and_then(Value::as_str)
    }
}

/// Response of `POST /v1/chat/completions`
///
/// Only `choices` is modelled. Everything else, including `document_chunks`
/// and `trace_id`, stays in `extra` and is written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatResponse {
    /// Interpret a raw response body
    ///
    /// A body without a `choices` field becomes an empty response.
    ///
    /// # Errors
    ///
    /// Returns [`PremError::MalformedResponse`] if the body is not an object or its
    /// fields have the wrong shape
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.as_object().is_some_and(|body| body.contains_key("choices")) {
            return Ok(Self::default());
        }

        serde_json::from_value(value).map_err(|e| PremError::MalformedResponse(e.to_string()))
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.extra.get("trace_id").and_then(Value::as_str)
    }

    /// Retrieved chunks, skipping entries that are not objects
    pub fn document_chunks(&self) -> Vec<DocumentChunk> {
        self.extra
            .get("document_chunks")
            .and_then(Value::as_array)
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(|chunk| chunk.as_object().cloned().map(DocumentChunk))
                    .collect()
            })
            .unwrap_or_default()
    }
}
