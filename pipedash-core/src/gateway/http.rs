//! HTTP backend for the dashboard API
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Call | Method | Path | Success body |
//! |------|--------|------|--------------|
//! | history | GET | `/get_chat_history` | `{ "history": string }` |
//! | report | GET | `/get_pipeline_report` | array of row objects |
//! | chart | GET | `/get_pipeline_chart` | PNG bytes |
//! | chat data | GET | `/get_chat_data` | `{ "data": [{filename, type, content}] }` |
//! | status | GET | `/status` | `{ "status": string }` |
//! | chat | POST | `/chat` | `{ "resposta": string }` |
//! | run pipeline | POST | `/run_pipeline` | `{ "message": string }` |
//! | clear context | POST | `/clear_context` | `{ "message": string }` |
//!
//! Non-success responses carry `{ "detail": ... }`, surfaced as
//! [`Error::Status`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::types::{GeneratedDataItem, RawDataItem, ReportRow};

use super::Backend;

/// Response from GET /get_chat_history
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Option<String>,
}

/// Response from GET /get_chat_data
#[derive(Debug, Deserialize)]
struct ChatDataResponse {
    #[serde(default)]
    data: Vec<RawDataItem>,
}

/// Response from GET /status
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// Request body for POST /chat
#[derive(Serialize)]
struct ChatRequest<'a> {
    pergunta: &'a str,
}

/// Response from POST /chat
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    resposta: Option<String>,
}

/// Response from POST /run_pipeline and POST /clear_context
#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

/// HTTP client for the dashboard API
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, image/png"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.normalized_base_url(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http_client.get(self.url(path)).send().await?;
        read_json(path, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut request = self.http_client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        read_json(path, response).await
    }
}

/// Decode a JSON body, or turn a non-success status into [`Error::Status`].
async fn read_json<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// Extract `detail` from an error body. Anything that is not a JSON object
/// (proxy error pages, plain text) yields an empty detail.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        _ => String::new(),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_history(&self) -> Result<Option<String>> {
        let response: HistoryResponse = self.get_json("/get_chat_history").await?;
        Ok(response.history)
    }

    async fn get_report(&self) -> Result<Vec<ReportRow>> {
        self.get_json("/get_pipeline_report").await
    }

    async fn get_chart(&self) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(self.url("/get_pipeline_chart"))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_generated_data(&self) -> Result<Vec<GeneratedDataItem>> {
        let response: ChatDataResponse = self.get_json("/get_chat_data").await?;

        let mut items = Vec::with_capacity(response.data.len());
        for raw in response.data {
            match GeneratedDataItem::try_from(raw) {
                Ok(item) => items.push(item),
                Err(reason) => tracing::warn!(reason = %reason, "Skipping chat data item"),
            }
        }
        Ok(items)
    }

    async fn get_status(&self) -> Result<String> {
        let response: StatusResponse = self.get_json("/status").await?;
        Ok(response.status)
    }

    async fn post_chat(&self, question: &str) -> Result<Option<String>> {
        let request = ChatRequest { pergunta: question };
        let response: ChatResponse = self.post_json("/chat", Some(&request)).await?;
        Ok(response.resposta.filter(|r| !r.is_empty()))
    }

    async fn post_run_pipeline(&self) -> Result<String> {
        let response: MessageResponse = self.post_json::<(), _>("/run_pipeline", None).await?;
        Ok(response.message)
    }

    async fn post_clear_context(&self) -> Result<String> {
        let response: MessageResponse = self.post_json::<(), _>("/clear_context", None).await?;
        Ok(response.message)
    }
}
