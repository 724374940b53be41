//! `prem_upload_document` tool: upload a local file into a Prem repository

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{PremError, Result},
    services::DocumentUpload,
    tools::{Tool, ToolContext},
};

/// Input for UploadDocumentTool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDocumentInput {
    /// ID of the repository to upload to
    pub repository_id: String,

    /// Path to the file to upload
    pub file_path: String,
}

/// UploadDocumentTool implementation
pub struct UploadDocumentTool;

impl UploadDocumentTool {
    /// Open the file and collect what the multipart upload needs
    async fn prepare(file_path: &str) -> Result<DocumentUpload> {
        let path = Path::new(file_path);
        let not_found = || PremError::Validation(format!("File not found: {file_path}"));

        let metadata = tokio::fs::metadata(path).await.map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        let file = tokio::fs::File::open(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| file_path.to_string(), |name| name.to_string_lossy().into_owned());

        Ok(DocumentUpload {
            file_name,
            length: metadata.len(),
            file,
        })
    }
}

#[async_trait]
impl Tool for UploadDocumentTool {
    type Input = UploadDocumentInput;

    fn name(&self) -> &'static str {
        "prem_upload_document"
    }

    fn description(&self) -> &'static str {
        "Upload a document to a Prem AI repository"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repository_id": {
                    "type": "string",
                    "description": "ID of the repository to upload to"
                },
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to upload"
                }
            },
            "required": ["repository_id", "file_path"]
        })
    }

    fn error_label(&self) -> &'static str {
        "Document upload error"
    }

    async fn call(&self, input: Self::Input, context: &ToolContext) -> Result<String> {
        let upload_id = Uuid::new_v4();
        tracing::info!(
            %upload_id,
            repository_id = %input.repository_id,
            file_path = %input.file_path,
            "starting document upload"
        );

        let outcome = match Self::prepare(&input.file_path).await {
            Ok(upload) => context.api.create_document(&input.repository_id, upload).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(created) => {
                tracing::info!(%upload_id, response = %created, "document upload successful");
                Ok(serde_json::to_string_pretty(&created)?)
            }
            Err(e) => {
                tracing::warn!(%upload_id, error = %e, "document upload failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{testing::FakeApi, testing::RecordedUpload, ToolHandler};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_missing_file_never_calls_api() {
        let (api, context) = FakeApi::new().into_context();

        let result = UploadDocumentTool
            .invoke(
                json!({"repository_id": "42", "file_path": "/nonexistent/report.pdf"}),
                &context,
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(
            result.first_text(),
            Some("Document upload error: File not found: /nonexistent/report.pdf")
        );
        assert!(api.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let (api, context) = FakeApi::new().into_context();
        let path = dir.path().display().to_string();

        let result = UploadDocumentTool
            .invoke(json!({"repository_id": "42", "file_path": path}), &context)
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains(&path));
        assert!(api.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_sends_name_and_size() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "hello repository").unwrap();
        temp_file.flush().unwrap();

        let (api, context) = FakeApi::new()
            .with_upload_result(Ok(json!({"document_id": 7, "status": "PENDING"})))
            .into_context();

        let result = UploadDocumentTool
            .invoke(
                json!({"repository_id": "42", "file_path": temp_file.path().display().to_string()}),
                &context,
            )
            .await
            .unwrap();

        assert!(!result.is_error);
        let created: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(created, json!({"document_id": 7, "status": "PENDING"}));

        let expected_name = temp_file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(
            api.uploads.lock().unwrap().clone(),
            vec![RecordedUpload {
                repository_id: "42".to_string(),
                file_name: expected_name,
                length: 16,
            }]
        );
    }

    #[tokio::test]
    async fn test_rejected_upload_is_reported() {
        let temp_file = NamedTempFile::new().unwrap();
        let (_api, context) = FakeApi::new()
            .with_upload_result(Err(PremError::Remote {
                status: 413,
                message: "file too large".to_string(),
            }))
            .into_context();

        let result = UploadDocumentTool
            .invoke(
                json!({"repository_id": "42", "file_path": temp_file.path().display().to_string()}),
                &context,
            )
            .await
            .unwrap();

        assert!(result.is_error);
        let text = result.first_text().unwrap();
        assert!(text.starts_with("Document upload error: "));
        assert!(text.contains("file too large"));
    }

    #[tokio::test]
    async fn test_upload_is_not_tracked_as_chat_request() {
        let temp_file = NamedTempFile::new().unwrap();
        let (_api, context) = FakeApi::new().into_context();

        UploadDocumentTool
            .invoke(
                json!({"repository_id": "1", "file_path": temp_file.path().display().to_string()}),
                &context,
            )
            .await
            .unwrap();

        assert!(context.active_requests.is_empty());
    }
}
