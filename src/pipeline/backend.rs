use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::{Feed, Message};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("archive storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("telegram request failed: {0}")]
    Telegram(String),
    #[error("flood control: {0}")]
    FloodControl(String),
    #[error("malformed entity: {0}")]
    Malformed(String),
}

impl From<teloxide::RequestError> for BackendError {
    fn from(err: teloxide::RequestError) -> Self {
        match err {
            teloxide::RequestError::RetryAfter(_) => BackendError::FloodControl(err.to_string()),
            other => BackendError::Telegram(other.to_string()),
        }
    }
}

/// Capabilities the relay pipeline needs from the messaging backend.
///
/// An implementation is a session: the pipeline holds it exclusively for the
/// duration of one run and never issues two calls concurrently.
#[async_trait]
pub trait FeedBackend: Send {
    async fn enumerate_feeds(&mut self) -> Result<Vec<Feed>, BackendError>;

    /// Case-sensitive lookup by display name. Kind constraints are left to
    /// the caller.
    async fn resolve_feed_by_name(&mut self, name: &str) -> Result<Option<Feed>, BackendError>;

    /// Messages of `feed` sent at or before `until`, newest first. The stream
    /// is lazy; dropping it early releases the underlying cursor.
    fn read_messages<'a>(
        &'a mut self,
        feed: &Feed,
        until: DateTime<Utc>,
    ) -> BoxStream<'a, Result<Message, BackendError>>;

    async fn send_message(&mut self, feed: &Feed, text: &str) -> Result<(), BackendError>;
}
