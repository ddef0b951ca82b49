use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use sqlx::{
    query, query_as,
    sqlite::{SqliteConnection, SqlitePool, SqliteRow},
    Executor, FromRow, Row, Sqlite,
};

use crate::domain::{ArchiveStats, Feed, FeedKind};

/// Local copy of every group message the bot has observed.
#[derive(Clone)]
pub struct ArchiveRepository {
    pool: SqlitePool,
}

impl ArchiveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Upserts the feed and the message. Re-recording an existing message
    /// (an edit) only replaces its text.
    pub async fn record_message(
        &self,
        feed: &Feed,
        message_id: i64,
        text: Option<&str>,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        query(
            r#"INSERT INTO feeds (chat_id, title, kind, updated_at) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(chat_id) DO UPDATE SET
                    title = excluded.title,
                    kind = excluded.kind,
                    updated_at = MAX(feeds.updated_at, excluded.updated_at)"#,
        )
        .bind(feed.id)
        .bind(feed.name.as_str())
        .bind(feed.kind.as_str())
        .bind(sent_at.timestamp())
        .execute(&mut *tx)
        .await?;

        query(
            r#"INSERT INTO messages (chat_id, message_id, text, sent_at) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(chat_id, message_id) DO UPDATE SET text = excluded.text"#,
        )
        .bind(feed.id)
        .bind(message_id)
        .bind(text)
        .bind(sent_at.timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let affected = query(r#"DELETE FROM messages WHERE sent_at < ?1"#)
            .bind(cutoff.timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    pub async fn stats(&self) -> Result<ArchiveStats> {
        let (feeds, messages): (i64, i64) = query_as(
            r#"SELECT (SELECT COUNT(*) FROM feeds), (SELECT COUNT(*) FROM messages)"#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(ArchiveStats { feeds, messages })
    }
}

/// Feeds ordered by most recent activity.
pub async fn fetch_feeds<'c, E>(executor: E) -> Result<Vec<Feed>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = query_as::<_, FeedRow>(
        r#"SELECT chat_id, title, kind FROM feeds ORDER BY updated_at DESC, chat_id"#,
    )
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Exact, case-sensitive title lookup. Group kinds win over other feeds that
/// share the title.
pub async fn find_feed_by_title<'c, E>(executor: E, title: &str) -> Result<Option<Feed>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row = query_as::<_, FeedRow>(
        r#"SELECT chat_id, title, kind FROM feeds WHERE title = ?1
            ORDER BY CASE WHEN kind IN ('group', 'supergroup') THEN 0 ELSE 1 END,
                     updated_at DESC
            LIMIT 1"#,
    )
    .bind(title)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|row| row.0))
}

/// Streams a feed's messages sent at or before `until`, newest first.
pub fn stream_messages(
    conn: &mut SqliteConnection,
    chat_id: i64,
    until: DateTime<Utc>,
) -> BoxStream<'_, Result<MessageRow, sqlx::Error>> {
    query_as::<_, MessageRow>(
        r#"SELECT chat_id, message_id, text, sent_at FROM messages
            WHERE chat_id = ?1 AND sent_at <= ?2
            ORDER BY sent_at DESC, message_id DESC"#,
    )
    .bind(chat_id)
    .bind(until.timestamp())
    .fetch(conn)
}

struct FeedRow(Feed);

impl<'r> FromRow<'r, SqliteRow> for FeedRow {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        Ok(Self(Feed {
            id: row.try_get("chat_id")?,
            name: row.try_get("title")?,
            kind: FeedKind::from_label(&kind),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: Option<String>,
    pub sent_at: i64,
}

impl<'r> FromRow<'r, SqliteRow> for MessageRow {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            chat_id: row.try_get("chat_id")?,
            message_id: row.try_get("message_id")?,
            text: row.try_get("text")?,
            sent_at: row.try_get("sent_at")?,
        })
    }
}
