use std::{path::Path, str::FromStr, time::Duration};

use anyhow::Result;
use sqlx::{
    query,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

pub mod archive;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS feeds (
        chat_id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        kind TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        chat_id INTEGER NOT NULL,
        message_id INTEGER NOT NULL,
        text TEXT,
        sent_at INTEGER NOT NULL,
        PRIMARY KEY (chat_id, message_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_messages_chat_sent
        ON messages (chat_id, sent_at DESC, message_id DESC)
    "#,
];

pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    for statement in SCHEMA {
        query(statement).execute(&pool).await?;
    }

    Ok(pool)
}
