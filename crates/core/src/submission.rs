use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::contact::ContactMessage;
use crate::domain::quote_request::QuoteDraft;

/// Acknowledgement from a sink. Callers only rely on it existing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission backend unavailable: {0}")]
    Unavailable(String),
}

/// Write-only destination for completed quote requests.
#[async_trait]
pub trait QuoteSubmissionSink: Send + Sync {
    async fn create(&self, draft: &QuoteDraft) -> Result<SubmissionReceipt, SubmissionError>;
}

#[async_trait]
pub trait ContactMessageSink: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<SubmissionReceipt, SubmissionError>;
}
