//! `chat` tool: free-text chat completion with optional RAG context

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::Result,
    messages::{ChatMessage, ChatOptions, ChatRequest, RepositoryContext},
    tools::{Tool, ToolContext},
};

/// Input for ChatTool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatInput {
    /// The chat message to send
    pub query: String,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Repositories to retrieve context from; enables RAG when present
    #[serde(default)]
    pub repository_ids: Option<Vec<i64>>,

    #[serde(default)]
    pub similarity_threshold: Option<f64>,

    #[serde(default)]
    pub limit: Option<u32>,
}

impl ChatInput {
    /// Build the outgoing request for a project
    ///
    /// # Errors
    ///
    /// Returns a validation error if the RAG settings are out of range
    pub fn into_request(self, project_id: &str) -> Result<ChatRequest> {
        let repositories = self
            .repository_ids
            .map(|ids| RepositoryContext::new(ids, self.similarity_threshold, self.limit))
            .transpose()?;

        let options = ChatOptions {
            model: self.model,
            system_prompt: self.system_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            repositories,
        };

        Ok(ChatRequest::new(project_id, ChatMessage::user(self.query), options))
    }
}

/// ChatTool implementation
pub struct ChatTool;

#[async_trait]
impl Tool for ChatTool {
    type Input = ChatInput;

    fn name(&self) -> &'static str {
        "chat"
    }

    fn description(&self) -> &'static str {
        "Chat with Prem AI - supports chat completions with optional RAG capabilities."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The chat message to send"
                },
                "system_prompt": {
                    "type": "string",
                    "description": "Optional system prompt to guide the model's behavior"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model to use for completion"
                },
                "temperature": {
                    "type": "number",
                    "description": "Optional temperature for response generation"
                },
                "max_tokens": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Optional maximum tokens to generate"
                },
                "repository_ids": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "Optional array of repository IDs for RAG"
                },
                "similarity_threshold": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "description": "Optional similarity threshold for RAG (default 0.65)"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Optional limit of context chunks for RAG (default 3)"
                }
            },
            "required": ["query"]
        })
    }

    fn error_label(&self) -> &'static str {
        "Chat error"
    }

    async fn call(&self, input: Self::Input, context: &ToolContext) -> Result<String> {
        let guard = context.active_requests.track("chat");
        tracing::debug!(
            request_id = guard.id(),
            rag = input.repository_ids.is_some(),
            "sending chat completion"
        );

        let request = input.into_request(&context.project_id)?;
        let response = context.api.create_chat_completion(&request).await;

        match &response {
            Ok(r) => tracing::debug!(request_id = guard.id(), choices = r.choices.len(), "chat completed"),
            Err(e) => tracing::warn!(request_id = guard.id(), error = %e, "chat failed"),
        }

        Ok(serde_json::to_string_pretty(&response?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::PremError,
        messages::{ChatResponse, DEFAULT_CONTEXT_LIMIT, DEFAULT_SIMILARITY_THRESHOLD},
        tools::{testing::FakeApi, ToolHandler},
    };
    use pretty_assertions::assert_eq;

    fn sample_response() -> ChatResponse {
        ChatResponse::from_value(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello, Ada!"},
                "finish_reason": "stop"
            }],
            "trace_id": "trace-42"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_plain_query_sends_minimal_request() {
        let (api, context) = FakeApi::new().with_chat_result(Ok(sample_response())).into_context();

        let result = ChatTool.invoke(json!({"query": "Hello"}), &context).await.unwrap();
        assert!(!result.is_error);

        let sent = serde_json::to_value(api.last_chat_request()).unwrap();
        assert_eq!(
            sent,
            json!({
                "project_id": "proj-test",
                "messages": [{"role": "user", "content": "Hello"}]
            })
        );
    }

    #[tokio::test]
    async fn test_success_text_round_trips_response() {
        let expected = sample_response();
        let (_api, context) = FakeApi::new().with_chat_result(Ok(expected.clone())).into_context();

        let result = ChatTool.invoke(json!({"query": "Hello"}), &context).await.unwrap();
        let text = result.first_text().unwrap();

        let parsed: ChatResponse = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.choices, expected.choices);
        assert_eq!(parsed.trace_id(), Some("trace-42"));
        assert!(text.contains('\n'), "response text should be pretty-printed");
    }

    #[tokio::test]
    async fn test_optional_fields_are_forwarded() {
        let (api, context) = FakeApi::new().into_context();

        ChatTool
            .invoke(
                json!({
                    "query": "Summarise",
                    "system_prompt": "Be brief",
                    "model": "llama-3",
                    "temperature": 0.0,
                    "max_tokens": 256
                }),
                &context,
            )
            .await
            .unwrap();

        let sent = api.last_chat_request();
        assert_eq!(sent.system_prompt.as_deref(), Some("Be brief"));
        assert_eq!(sent.model.as_deref(), Some("llama-3"));
        assert_eq!(sent.temperature, Some(0.0));
        assert_eq!(sent.max_tokens, Some(256));
        assert!(sent.repositories.is_none());
    }

    #[tokio::test]
    async fn test_repository_ids_use_default_rag_settings() {
        let (api, context) = FakeApi::new().into_context();

        ChatTool
            .invoke(json!({"query": "What is our leave policy?", "repository_ids": [12, 15]}), &context)
            .await
            .unwrap();

        let repositories = api.last_chat_request().repositories.unwrap();
        assert_eq!(repositories.ids, vec![12, 15]);
        assert_eq!(repositories.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(repositories.limit, DEFAULT_CONTEXT_LIMIT);
    }

    #[tokio::test]
    async fn test_explicit_rag_settings_override_defaults() {
        let (api, context) = FakeApi::new().into_context();

        ChatTool
            .invoke(
                json!({"query": "q", "repository_ids": [1], "similarity_threshold": 0.8, "limit": 0}),
                &context,
            )
            .await
            .unwrap();

        let repositories = api.last_chat_request().repositories.unwrap();
        assert_eq!(repositories.similarity_threshold, 0.8);
        assert_eq!(repositories.limit, 0);
    }

    #[tokio::test]
    async fn test_rag_settings_without_ids_are_ignored() {
        let (api, context) = FakeApi::new().into_context();

        ChatTool
            .invoke(json!({"query": "q", "similarity_threshold": 0.9, "limit": 5}), &context)
            .await
            .unwrap();

        assert!(api.last_chat_request().repositories.is_none());
    }

    #[tokio::test]
    async fn test_request_id_tracked_for_call_duration() {
        let (api, context) = FakeApi::new().into_context();

        ChatTool.invoke(json!({"query": "Hello"}), &context).await.unwrap();

        let seen = api.in_flight_seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 1);
        assert!(seen[0][0].starts_with("chat-"));
        assert!(context.active_requests.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_reported_and_untracked() {
        let (api, context) = FakeApi::new()
            .with_chat_result(Err(PremError::Remote {
                status: 503,
                message: "upstream unavailable".to_string(),
            }))
            .into_context();

        let result = ChatTool.invoke(json!({"query": "Hello"}), &context).await.unwrap();

        assert!(result.is_error);
        let text = result.first_text().unwrap();
        assert!(text.starts_with("Chat error: "));
        assert!(text.contains("upstream unavailable"));
        assert_eq!(api.in_flight_seen.lock().unwrap().len(), 1);
        assert!(context.active_requests.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_threshold_never_reaches_api() {
        let (api, context) = FakeApi::new().into_context();

        let result = ChatTool
            .invoke(json!({"query": "q", "repository_ids": [1], "similarity_threshold": 2.0}), &context)
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(api.chat_requests.lock().unwrap().is_empty());
        assert!(context.active_requests.is_empty());
    }
}
