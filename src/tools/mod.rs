//! Tool system for prem-mcp
//!
//! Each MCP tool implements [`Tool`] with a typed input. [`ToolHandler`] erases
//! that type so the registry can decode raw JSON arguments and convert the
//! outcome into the uniform [`ToolCallResult`] envelope in one place.

pub mod chat;
pub mod template_chat;
pub mod upload_document;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{PremError, Result},
    mcp::protocol::{ToolCallResult, ToolDefinition},
    requests::ActiveRequests,
    services::PremApi,
};

pub use self::{chat::ChatTool, template_chat::TemplateChatTool, upload_document::UploadDocumentTool};

/// Shared state handed to every tool call
#[derive(Clone)]
pub struct ToolContext {
    /// Remote API client
    pub api: Arc<dyn PremApi>,

    /// Project that scopes chat requests
    pub project_id: String,

    /// Chat calls currently in flight
    pub active_requests: ActiveRequests,
}

impl ToolContext {
    /// Create a context with an empty in-flight set
    pub fn new(api: Arc<dyn PremApi>, project_id: impl Into<String>) -> Self {
        Self {
            api,
            project_id: project_id.into(),
            active_requests: ActiveRequests::new(),
        }
    }
}

/// Core tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// Arguments accepted by this tool
    type Input: DeserializeOwned + Send;

    /// Tool name as registered with the MCP client
    fn name(&self) -> &'static str;

    /// Human-readable description shown to the client
    fn description(&self) -> &'static str;

    /// JSON schema for the tool arguments
    fn input_schema(&self) -> Value;

    /// Prefix for error text, e.g. `Chat error`
    fn error_label(&self) -> &'static str;

    /// Execute the tool, returning the text payload of a successful call
    async fn call(&self, input: Self::Input, context: &ToolContext) -> Result<String>;
}

/// Type-erased tool as stored in the registry
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Definition reported by `tools/list`
    fn definition(&self) -> ToolDefinition;

    /// Decode arguments and run the tool
    ///
    /// Only argument decoding fails with `Err`; every failure past that point is
    /// reported inside the returned envelope.
    async fn invoke(&self, arguments: Value, context: &ToolContext) -> Result<ToolCallResult>;
}

#[async_trait]
impl<T: Tool> ToolHandler for T {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    async fn invoke(&self, arguments: Value, context: &ToolContext) -> Result<ToolCallResult> {
        let input: T::Input =
            serde_json::from_value(arguments).map_err(|e| PremError::InvalidArguments(e.to_string()))?;

        Ok(into_envelope(self.error_label(), self.call(input, context).await))
    }
}

/// Convert a tool outcome into the response envelope
#[must_use]
pub fn into_envelope(error_label: &str, outcome: Result<String>) -> ToolCallResult {
    match outcome {
        Ok(text) => ToolCallResult::text(text),
        Err(e) => ToolCallResult::error(format!("{error_label}: {e}")),
    }
}

/// Registry of the tools served over MCP, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three Prem tools
    #[must_use]
    pub fn with_prem_tools() -> Self {
        let mut registry = Self::new();
        registry.register(ChatTool);
        registry.register(UploadDocumentTool);
        registry.register(TemplateChatTool);
        registry
    }

    /// Add a tool
    pub fn register(&mut self, tool: impl ToolHandler + 'static) {
        self.tools.push(Arc::new(tool));
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.iter().find(|t| t.definition().name == name).cloned()
    }

    /// Definitions of all registered tools
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}

/// In-memory [`PremApi`] used by the tool and server tests
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        messages::{ChatRequest, ChatResponse},
        services::DocumentUpload,
    };

    /// Upload as seen by the fake
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedUpload {
        pub repository_id: String,
        pub file_name: String,
        pub length: u64,
    }

    /// Records requests and answers with canned results
    pub struct FakeApi {
        pub chat_result: Mutex<Option<Result<ChatResponse>>>,
        pub upload_result: Mutex<Option<Result<Value>>>,
        pub chat_requests: Mutex<Vec<ChatRequest>>,
        pub uploads: Mutex<Vec<RecordedUpload>>,
        /// In-flight ids observed while a chat call was inside the API
        pub in_flight_seen: Mutex<Vec<Vec<String>>>,
        pub active_requests: Mutex<Option<ActiveRequests>>,
    }

    impl FakeApi {
        pub fn new() -> Self {
            Self {
                chat_result: Mutex::new(None),
                upload_result: Mutex::new(None),
                chat_requests: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
                in_flight_seen: Mutex::new(Vec::new()),
                active_requests: Mutex::new(None),
            }
        }

        pub fn with_chat_result(self, result: Result<ChatResponse>) -> Self {
            *self.chat_result.lock().unwrap() = Some(result);
            self
        }

        pub fn with_upload_result(self, result: Result<Value>) -> Self {
            *self.upload_result.lock().unwrap() = Some(result);
            self
        }

        /// Build a context around this fake that lets it observe the in-flight set
        pub fn into_context(self) -> (Arc<Self>, ToolContext) {
            let api = Arc::new(self);
            let context = ToolContext::new(api.clone(), "proj-test");
            *api.active_requests.lock().unwrap() = Some(context.active_requests.clone());
            (api, context)
        }

        pub fn last_chat_request(&self) -> ChatRequest {
            self.chat_requests.lock().unwrap().last().cloned().expect("no chat request recorded")
        }
    }

    #[async_trait]
    impl PremApi for FakeApi {
        async fn create_chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.chat_requests.lock().unwrap().push(request.clone());
            if let Some(active) = self.active_requests.lock().unwrap().as_ref() {
                self.in_flight_seen.lock().unwrap().push(active.ids());
            }
            self.chat_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(ChatResponse::default()))
        }

        async fn create_document(&self, repository_id: &str, upload: DocumentUpload) -> Result<Value> {
            self.uploads.lock().unwrap().push(RecordedUpload {
                repository_id: repository_id.to_string(),
                file_name: upload.file_name,
                length: upload.length,
            });
            self.upload_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(serde_json::json!({})))
        }
    }
}
