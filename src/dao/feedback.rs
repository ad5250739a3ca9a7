//! Write-only document sinks for user feedback and outbound email requests.
//!
//! The documents are consumed by an external trigger, never read back by this
//! service, so the contract is append-only.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::dao::storage::StorageResult;

/// Feedback document as handed to the external consumer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDocument {
    /// Free-form feedback text.
    pub message: String,
    /// Optional category chosen by the user (bug, idea, ...).
    pub category: Option<String>,
    /// Optional reply-to address.
    pub email: Option<String>,
    /// Room the feedback was filed from, when applicable.
    pub room_code: Option<String>,
    /// Submission time, RFC 3339.
    pub submitted_at: String,
}

/// Outbound email request queued for the external mailer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDocument {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Queue time, RFC 3339.
    pub queued_at: String,
}

/// Append-only sink for feedback and email documents.
pub trait FeedbackSink: Send + Sync {
    /// Persist a feedback document.
    fn submit_feedback(&self, doc: FeedbackDocument) -> BoxFuture<'static, StorageResult<()>>;
    /// Queue an outbound email request.
    fn queue_email(&self, doc: EmailDocument) -> BoxFuture<'static, StorageResult<()>>;
}

/// In-memory sink retaining documents until an external consumer drains them.
#[derive(Clone, Default)]
pub struct MemoryFeedbackSink {
    inner: Arc<SinkInner>,
}

#[derive(Default)]
struct SinkInner {
    feedback: Mutex<Vec<FeedbackDocument>>,
    emails: Mutex<Vec<EmailDocument>>,
}

impl MemoryFeedbackSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all pending feedback documents, oldest first.
    pub async fn drain_feedback(&self) -> Vec<FeedbackDocument> {
        std::mem::take(&mut *self.inner.feedback.lock().await)
    }

    /// Drain all pending email documents, oldest first.
    pub async fn drain_emails(&self) -> Vec<EmailDocument> {
        std::mem::take(&mut *self.inner.emails.lock().await)
    }
}

impl FeedbackSink for MemoryFeedbackSink {
    fn submit_feedback(&self, doc: FeedbackDocument) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            info!(category = ?doc.category, room = ?doc.room_code, "feedback received");
            this.inner.feedback.lock().await.push(doc);
            Ok(())
        })
    }

    fn queue_email(&self, doc: EmailDocument) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            info!(to = %doc.to, "email request queued");
            this.inner.emails.lock().await.push(doc);
            Ok(())
        })
    }
}
