//! `prem_chat_with_template` tool: chat driven by a server-side prompt template

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::Result,
    messages::{ChatMessage, ChatOptions, ChatRequest},
    tools::{Tool, ToolContext},
};

/// Input for TemplateChatTool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateChatInput {
    /// ID of the prompt template to use
    pub template_id: String,

    /// Values substituted into the template by the server
    pub params: BTreeMap<String, String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl TemplateChatInput {
    /// Build the outgoing request for a project
    #[must_use]
    pub fn into_request(self, project_id: &str) -> ChatRequest {
        let options = ChatOptions {
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..ChatOptions::default()
        };

        ChatRequest::new(
            project_id,
            ChatMessage::template(self.template_id, self.params),
            options,
        )
    }
}

/// TemplateChatTool implementation
pub struct TemplateChatTool;

#[async_trait]
impl Tool for TemplateChatTool {
    type Input = TemplateChatInput;

    fn name(&self) -> &'static str {
        "prem_chat_with_template"
    }

    fn description(&self) -> &'static str {
        "Chat using a predefined Prem AI prompt template"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "template_id": {
                    "type": "string",
                    "description": "ID of the prompt template to use"
                },
                "params": {
                    "type": "object",
                    "additionalProperties": {"type": "string"},
                    "description": "Parameters to fill in the template"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model to use"
                },
                "temperature": {
                    "type": "number",
                    "description": "Optional temperature parameter"
                },
                "max_tokens": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Optional maximum tokens to generate"
                }
            },
            "required": ["template_id", "params"]
        })
    }

    fn error_label(&self) -> &'static str {
        "Template chat error"
    }

    async fn call(&self, input: Self::Input, context: &ToolContext) -> Result<String> {
        let guard = context.active_requests.track("template");
        tracing::debug!(
            request_id = guard.id(),
            template_id = %input.template_id,
            params = input.params.len(),
            "sending template chat completion"
        );

        let request = input.into_request(&context.project_id);
        let response = context.api.create_chat_completion(&request).await;

        if let Err(e) = &response {
            tracing::warn!(request_id = guard.id(), error = %e, "template chat failed");
        }

        Ok(serde_json::to_string_pretty(&response?)?)
    }
}
