//! Service layer for the Prem AI API
//!
//! [`PremApi`] is the seam between the tool handlers and the remote service;
//! [`prem::PremClient`] is the HTTP implementation used at runtime.

pub mod prem;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::Result,
    messages::{ChatRequest, ChatResponse},
};

pub use prem::PremClient;

/// A file ready to be streamed into a repository
#[derive(Debug)]
pub struct DocumentUpload {
    /// Base name sent as the multipart file name
    pub file_name: String,
    /// Size of the file in bytes
    pub length: u64,
    /// Open handle, read once while uploading
    pub file: tokio::fs::File,
}

/// Operations the tools need from the Prem API
#[async_trait]
pub trait PremApi: Send + Sync {
    /// Create a chat completion
    async fn create_chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Create a document in a repository, returning the creation response as-is
    async fn create_document(&self, repository_id: &str, upload: DocumentUpload) -> Result<Value>;
}
