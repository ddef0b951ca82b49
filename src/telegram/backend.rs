use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream::BoxStream, StreamExt};
use sqlx::{pool::PoolConnection, Sqlite, SqlitePool};
use teloxide::prelude::*;

use crate::{
    db::archive::{self, MessageRow},
    domain::{Feed, Message},
    pipeline::{BackendError, FeedBackend},
};

/// One relay run's exclusive handle on the archive and the bot. The pooled
/// connection returns to the pool when the session is dropped.
pub struct TelegramSession {
    conn: PoolConnection<Sqlite>,
    bot: Bot,
}

impl TelegramSession {
    pub async fn acquire(pool: &SqlitePool, bot: Bot) -> Result<Self, BackendError> {
        let conn = pool.acquire().await?;
        Ok(Self { conn, bot })
    }
}

#[async_trait]
impl FeedBackend for TelegramSession {
    async fn enumerate_feeds(&mut self) -> Result<Vec<Feed>, BackendError> {
        Ok(archive::fetch_feeds(&mut *self.conn).await?)
    }

    async fn resolve_feed_by_name(&mut self, name: &str) -> Result<Option<Feed>, BackendError> {
        Ok(archive::find_feed_by_title(&mut *self.conn, name).await?)
    }

    fn read_messages<'a>(
        &'a mut self,
        feed: &Feed,
        until: DateTime<Utc>,
    ) -> BoxStream<'a, Result<Message, BackendError>> {
        archive::stream_messages(&mut self.conn, feed.id, until)
            .map(|row| row.map_err(BackendError::from).and_then(row_to_message))
            .boxed()
    }

    async fn send_message(&mut self, feed: &Feed, text: &str) -> Result<(), BackendError> {
        self.bot.send_message(ChatId(feed.id), text).await?;
        Ok(())
    }
}

fn row_to_message(row: MessageRow) -> Result<Message, BackendError> {
    let timestamp = DateTime::<Utc>::from_timestamp(row.sent_at, 0).ok_or_else(|| {
        BackendError::Malformed(format!(
            "message {} in chat {} has out-of-range timestamp {}",
            row.message_id, row.chat_id, row.sent_at
        ))
    })?;
    Ok(Message {
        id: row.message_id,
        feed_id: row.chat_id,
        text: row.text,
        timestamp,
    })
}
