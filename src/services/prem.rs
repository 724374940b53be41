//! Prem AI HTTP client
//!
//! Endpoints used:
//! - `POST /v1/chat/completions`
//! - `POST /v1/repositories/{id}/document` (multipart)

use async_trait::async_trait;
use reqwest::{header, multipart, Body, Client, Response, Url};
use serde_json::Value;
use tokio_util::io::ReaderStream;

use crate::{
    config::Config,
    error::{PremError, Result},
    messages::{ChatRequest, ChatResponse},
};

use super::{DocumentUpload, PremApi};

/// Content type attached to every uploaded document
const UPLOAD_CONTENT_TYPE: &str = "text/plain";

/// Prem AI API client
#[derive(Debug, Clone)]
pub struct PremClient {
    client: Client,
    base_url: String,
}

impl PremClient {
    /// Create a client authenticated with the configured API key
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the HTTP
    /// client cannot be built
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| PremError::Configuration("Invalid API key format".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("prem-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/v1/repositories/{id}/document`, with the id kept as one path segment
    fn document_url(&self, repository_id: &str) -> Result<Url> {
        if matches!(repository_id, "" | "." | "..") {
            return Err(PremError::Validation(format!("Invalid repository id: {repository_id:?}")));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PremError::Configuration(format!("Invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| PremError::Configuration(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v1", "repositories", repository_id, "document"]);
        Ok(url)
    }

    /// Body text of a successful response; non-success statuses become errors
    async fn success_text(response: Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(PremError::Remote {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl PremApi for PremClient {
    async fn create_chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(request)
            .send()
            .await?;

        let text = Self::success_text(response).await?;
        let body = serde_json::from_str(&text).map_err(|e| PremError::MalformedResponse(e.to_string()))?;
        ChatResponse::from_value(body)
    }

    async fn create_document(&self, repository_id: &str, upload: DocumentUpload) -> Result<Value> {
        let url = self.document_url(repository_id)?;
        let DocumentUpload {
            file_name,
            length,
            file,
        } = upload;

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = multipart::Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str(UPLOAD_CONTENT_TYPE)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await?;

        // The document exists once the status is 2xx, whatever the body says
        let text = Self::success_text(response).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
