pub mod gemini;

pub use gemini::GeminiAnnotator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::annotation::AnnotationRecord;
use crate::modes::AnalysisMode;
use crate::upload::MediaHandle;

/// User-facing annotation failures. Stale responses are not errors; they are
/// discarded silently by [`AnnotationSession::analyze`].
#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// The source kept returning nothing usable. Terminal after the bounded
    /// retries are exhausted.
    #[error("annotation source returned no usable output after {attempts} attempts")]
    EmptyReply { attempts: u32 },

    /// Terminal upstream failure (HTTP error, undecodable payload).
    #[error("annotation request failed: {0}")]
    Upstream(String),
}

/// One reply from the annotation source: a structured record batch, free
/// text, or nothing usable.
#[derive(Debug, Clone)]
pub enum ModelReply {
    Records(Vec<AnnotationRecord>),
    Text(String),
    Empty,
}

impl ModelReply {
    /// Empty record batches and blank text are both retryable emptiness.
    fn is_empty(&self) -> bool {
        match self {
            ModelReply::Records(records) => records.is_empty(),
            ModelReply::Text(text) => text.trim().is_empty(),
            ModelReply::Empty => true,
        }
    }
}

/// A completed, non-empty analysis.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Records(Vec<AnnotationRecord>),
    Text(String),
}

/// The upstream generative model, held behind a trait so the session logic
/// is testable without a network.
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    async fn annotate(
        &self,
        media: &MediaHandle,
        mode: &AnalysisMode,
    ) -> Result<ModelReply, AnnotatorError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Base endpoint for the generative API.
    pub endpoint: String,

    /// API key; falls back to the `MEDIA_ANNOTATOR_API_KEY` environment
    /// variable when absent.
    pub api_key: Option<String>,

    /// Model identifier sent with each request.
    pub model: String,

    /// Attempts before an all-empty exchange becomes a user-facing error.
    pub max_attempts: u32,

    /// Delay between empty-reply retries, in milliseconds.
    pub retry_delay_ms: u64,

    /// Per-request HTTP timeout, in seconds.
    pub timeout_seconds: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            max_attempts: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 120,
        }
    }
}

/// Dispatches analysis requests and arbitrates between overlapping ones.
///
/// Each request takes a monotonically increasing ticket; when a reply comes
/// back, it is applied only if its ticket is still the latest. A slower
/// earlier request can therefore never overwrite the result of a later one.
/// The session holds its source explicitly; there is no process-wide client.
pub struct AnnotationSession {
    source: Arc<dyn AnnotationSource>,
    latest_ticket: AtomicU64,
    max_attempts: u32,
    retry_delay: Duration,
}

impl AnnotationSession {
    pub fn new(source: Arc<dyn AnnotationSource>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            source,
            latest_ticket: AtomicU64::new(0),
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn with_config(source: Arc<dyn AnnotationSource>, config: &AnnotatorConfig) -> Self {
        Self::new(
            source,
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    /// Run one analysis. Returns `Ok(None)` when the result arrived stale
    /// (a newer request was issued while this one was in flight); stale
    /// results must not be applied to visible state.
    pub async fn analyze(
        &self,
        media: &MediaHandle,
        mode: &AnalysisMode,
    ) -> Result<Option<AnalysisOutcome>, AnnotatorError> {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        info!("🔎 Analysis request #{} ({} mode)", ticket, mode.label());

        let outcome = self.request_with_retry(media, mode).await;

        if self.latest_ticket.load(Ordering::SeqCst) != ticket {
            debug!("Discarding stale analysis result #{}", ticket);
            return Ok(None);
        }

        outcome.map(Some)
    }

    /// Empty replies are retried with a fixed delay up to the attempt bound;
    /// upstream errors are terminal immediately.
    async fn request_with_retry(
        &self,
        media: &MediaHandle,
        mode: &AnalysisMode,
    ) -> Result<AnalysisOutcome, AnnotatorError> {
        for attempt in 1..=self.max_attempts {
            let reply = self.source.annotate(media, mode).await?;

            if reply.is_empty() {
                warn!(
                    "Empty reply from annotation source (attempt {}/{})",
                    attempt, self.max_attempts
                );
                if attempt < self.max_attempts {
                    tokio::time::sleep(self.retry_delay).await;
                }
                continue;
            }

            return Ok(match reply {
                ModelReply::Records(records) => AnalysisOutcome::Records(records),
                ModelReply::Text(text) => AnalysisOutcome::Text(text),
                ModelReply::Empty => unreachable!("empty replies are filtered above"),
            });
        }

        Err(AnnotatorError::EmptyReply {
            attempts: self.max_attempts,
        })
    }
}
