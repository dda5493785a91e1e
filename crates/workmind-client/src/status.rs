//! Polling subscription for document processing status in a knowledge base.
//!
//! The task publishes each snapshot and ends by itself once no document is
//! pending or processing. Cancelling or dropping the subscription stops it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Indexed,
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Indexed | DocumentStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    pub status: DocumentStatus,
    /// Percent complete as reported by the backend; may be fractional.
    #[serde(default)]
    pub processing_progress: f64,
}

impl Document {
    /// Whole percent in `0..=100`, for display.
    pub fn progress_percent(&self) -> u64 {
        percent(self.processing_progress)
    }
}

pub(crate) fn percent(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl KnowledgeBase {
    pub fn has_pending_documents(&self) -> bool {
        self.documents.iter().any(|d| !d.status.is_terminal())
    }
}

/// Latest value from a background watcher plus the handle to stop it.
pub struct Subscription<T> {
    rx: watch::Receiver<Option<T>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

pub type StatusSubscription = Subscription<KnowledgeBase>;

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(
        rx: watch::Receiver<Option<T>>,
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Most recent value, if one has arrived yet.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Waits for the next value. `false` once the watcher has stopped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the watcher to exit. Returns at once if it was already
    /// awaited.
    pub async fn finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("status watcher ended abnormally: {e}");
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl ApiClient {
    /// Polls `GET /workspaces/{ws}/knowledge/{id}` every `interval` while any
    /// document is still pending or processing.
    pub fn watch_knowledge(
        &self,
        workspace_id: &str,
        knowledge_id: &str,
        interval: Duration,
    ) -> StatusSubscription {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let api = self.clone();
        let workspace_id = workspace_id.to_string();
        let knowledge_id = knowledge_id.to_string();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("status watch for {knowledge_id} cancelled");
                        break;
                    }
                    result = api.get_knowledge(&workspace_id, &knowledge_id) => match result {
                        Ok(kb) => {
                            let pending = kb.has_pending_documents();
                            if tx.send(Some(kb)).is_err() {
                                break;
                            }
                            if !pending {
                                debug!("no pending documents in {knowledge_id}, stopping");
                                break;
                            }
                        }
                        // Retried on the next tick.
                        Err(e) => warn!("Polling {knowledge_id} failed: {e}"),
                    },
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        Subscription::new(rx, cancel, handle)
    }
}
