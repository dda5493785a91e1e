//! Live processing progress for one uploaded document, read from the
//! server-sent event stream at `/workspaces/{ws}/documents/{id}/progress`.
//!
//! Each event carries `{documentId, status, progress, message}`. The stream
//! is closed once the document is indexed or failed.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::Result;
use crate::status::{DocumentStatus, Subscription, percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub document_id: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProgressEvent {
    /// Whole percent in `0..=100`. Terminal success counts as complete.
    pub fn percent(&self) -> Option<u64> {
        match self.status {
            DocumentStatus::Indexed => Some(100),
            _ => self.progress.map(percent),
        }
    }
}

pub type ProgressSubscription = Subscription<ProgressEvent>;

/// Splits a `text/event-stream` body into event payloads. Bytes are held
/// until a full line arrives, so chunk boundaries may fall anywhere.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feeds a chunk and returns the `data` of every event it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            if let Some(event) = self.line(text.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let data = self.data.join("\n");
            self.data.clear();
            return Some(data);
        }
        // Comment lines keep the connection alive.
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field == "data" {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }
}

impl ApiClient {
    /// Follows one document's progress until it is indexed or failed, the
    /// stream ends, or the subscription is cancelled.
    pub fn watch_document_progress(
        &self,
        workspace_id: &str,
        document_id: &str,
    ) -> ProgressSubscription {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let api = self.clone();
        let path = format!("/workspaces/{workspace_id}/documents/{document_id}/progress");
        let document_id = document_id.to_string();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("progress stream for {document_id} cancelled"),
                result = follow(&api, &path, &tx) => match result {
                    Ok(()) => debug!("progress stream for {document_id} closed"),
                    Err(e) => warn!("progress stream for {document_id} failed: {e}"),
                },
            }
        });

        Subscription::new(rx, cancel, handle)
    }
}

async fn follow(
    api: &ApiClient,
    path: &str,
    tx: &watch::Sender<Option<ProgressEvent>>,
) -> Result<()> {
    let response = api.open_event_stream(path).await?;
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::default();

    while let Some(chunk) = body.next().await {
        for data in decoder.push(&chunk?) {
            let event: ProgressEvent = match serde_json::from_str(&data) {
                Ok(event) => event,
                Err(e) => {
                    warn!("skipping unreadable progress event: {e}");
                    continue;
                }
            };
            let terminal = event.status.is_terminal();
            if tx.send(Some(event)).is_err() || terminal {
                return Ok(());
            }
        }
    }
    Ok(())
}
