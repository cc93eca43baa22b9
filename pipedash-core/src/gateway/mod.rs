//! Remote data gateway
//!
//! Everything the dashboard knows comes from the backend through this module.
//! It is split in two layers:
//!
//! - [`Backend`]: one method per endpoint, returning typed results or
//!   [`Error`]. [`HttpBackend`] talks to the real server; tests plug in an
//!   in-memory implementation.
//! - [`Gateway`]: the per-operation failure policy. Read failures are logged
//!   and returned so callers keep their last-known-good data, the chart
//!   degrades to "no chart", and chat outcomes are always plain values.
//!
//! Nothing here retries on its own. Re-invoking an operation is the retry.

mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::chart::{ChartHandle, ChartStore};
use crate::error::{Error, Result};
use crate::types::{ChatOutcome, GeneratedDataItem, ReportRow, ServerStatus};

pub use http::HttpBackend;

/// Detail shown when the server rejects a chat message without explaining why.
pub const GENERIC_CHAT_ERROR: &str = "Ocorreu um erro.";

/// Transport seam: one call per backend endpoint.
#[async_trait]
pub trait Backend: Send + Sync {
    /// GET /get_chat_history - the `history` field, if present
    async fn get_history(&self) -> Result<Option<String>>;

    /// GET /get_pipeline_report
    async fn get_report(&self) -> Result<Vec<ReportRow>>;

    /// GET /get_pipeline_chart - raw image bytes
    async fn get_chart(&self) -> Result<Vec<u8>>;

    /// GET /get_chat_data
    async fn get_generated_data(&self) -> Result<Vec<GeneratedDataItem>>;

    /// GET /status - the `status` text
    async fn get_status(&self) -> Result<String>;

    /// POST /chat - the `resposta` field, if present
    async fn post_chat(&self, question: &str) -> Result<Option<String>>;

    /// POST /run_pipeline - the `message` field
    async fn post_run_pipeline(&self) -> Result<String>;

    /// POST /clear_context - the `message` field
    async fn post_clear_context(&self) -> Result<String>;
}

/// Failure-isolating facade over a [`Backend`].
///
/// Cheap to clone; every spawned operation gets its own copy.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    charts: ChartStore,
}

impl Gateway {
    pub fn new(backend: Arc<dyn Backend>, charts: ChartStore) -> Self {
        Self { backend, charts }
    }

    /// Fetch the persisted transcript.
    pub async fn fetch_history(&self) -> Result<Option<String>> {
        self.backend
            .get_history()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to fetch chat history"))
    }

    /// Fetch the pipeline report rows.
    pub async fn fetch_report(&self) -> Result<Vec<ReportRow>> {
        self.backend
            .get_report()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to fetch pipeline report"))
    }

    /// Fetch the pipeline chart. Any failure means "no chart".
    pub async fn fetch_chart(&self) -> Option<ChartHandle> {
        let bytes = match self.backend.get_chart().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch pipeline chart");
                return None;
            }
        };

        match self.charts.store(&bytes) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to store pipeline chart");
                None
            }
        }
    }

    /// Fetch the artifacts generated by chat turns.
    pub async fn fetch_generated_data(&self) -> Result<Vec<GeneratedDataItem>> {
        self.backend
            .get_generated_data()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to fetch chat data"))
    }

    /// Probe the backend.
    pub async fn check_status(&self) -> ServerStatus {
        match self.backend.get_status().await {
            Ok(text) => ServerStatus::Online(text),
            Err(e) => {
                tracing::debug!(error = %e, "Status check failed");
                ServerStatus::Offline
            }
        }
    }

    /// Post a chat message. Never fails; every outcome is a value.
    pub async fn send_message(&self, text: &str) -> ChatOutcome {
        match self.backend.post_chat(text).await {
            Ok(Some(reply)) => ChatOutcome::Reply(reply),
            Ok(None) => ChatOutcome::NoReply,
            Err(Error::Status { status, detail }) => {
                tracing::info!(status, detail = %detail, "Chat message rejected");
                if detail.trim().is_empty() {
                    ChatOutcome::Rejected(GENERIC_CHAT_ERROR.to_string())
                } else {
                    ChatOutcome::Rejected(detail)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send chat message");
                ChatOutcome::Transport(e.to_string())
            }
        }
    }

    /// Trigger the pipeline and return its status message.
    pub async fn run_pipeline(&self) -> Result<String> {
        status_message(self.backend.post_run_pipeline().await)
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to run pipeline"))
    }

    /// Clear the assistant's context and return its status message.
    pub async fn clear_context(&self) -> Result<String> {
        status_message(self.backend.post_clear_context().await)
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to clear context"))
    }
}

/// A rejected mutation that still explains itself is a status message too.
fn status_message(result: Result<String>) -> Result<String> {
    match result {
        Err(Error::Status { detail, .. }) if !detail.trim().is_empty() => Ok(detail),
        other => other,
    }
}
