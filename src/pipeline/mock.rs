use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::{
    stream::{self, BoxStream},
    StreamExt,
};

use crate::domain::{Feed, FeedKind, Message};

use super::backend::{BackendError, FeedBackend};

/// Fixed reference instant shifted by `offset_days`.
pub fn at(offset_days: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + Duration::days(offset_days)
}

/// In-memory backend. Messages are served per feed in insertion order.
#[derive(Default)]
pub struct MockBackend {
    feeds: Vec<Feed>,
    messages: HashMap<i64, Vec<Message>>,
    fail_after: HashMap<i64, usize>,
    failing_sends: HashSet<String>,
    consumed: HashMap<i64, usize>,
    pub reads: Vec<i64>,
    pub sent: Vec<(i64, String)>,
    pub send_attempts: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feed(&mut self, id: i64, name: &str, kind: FeedKind) -> Feed {
        let feed = Feed {
            id,
            name: name.to_string(),
            kind,
        };
        self.feeds.push(feed.clone());
        feed
    }

    pub fn add_group(&mut self, id: i64, name: &str) -> Feed {
        self.add_feed(id, name, FeedKind::Supergroup)
    }

    pub fn push_message(
        &mut self,
        feed_id: i64,
        id: i64,
        text: Option<&str>,
        timestamp: DateTime<Utc>,
    ) {
        self.messages.entry(feed_id).or_default().push(Message {
            id,
            feed_id,
            text: text.map(str::to_string),
            timestamp,
        });
    }

    /// Reading `feed_id` yields `count` messages and then an error.
    pub fn fail_reads_after(&mut self, feed_id: i64, count: usize) {
        self.fail_after.insert(feed_id, count);
    }

    /// Any send whose text contains `needle` fails.
    pub fn fail_sends_containing(&mut self, needle: &str) {
        self.failing_sends.insert(needle.to_string());
    }

    pub fn consumed(&self, feed_id: i64) -> usize {
        self.consumed.get(&feed_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl FeedBackend for MockBackend {
    async fn enumerate_feeds(&mut self) -> Result<Vec<Feed>, BackendError> {
        Ok(self.feeds.clone())
    }

    async fn resolve_feed_by_name(&mut self, name: &str) -> Result<Option<Feed>, BackendError> {
        let mut named = self.feeds.iter().filter(|feed| feed.name == name);
        let first = named.clone().next().cloned();
        Ok(named.find(|feed| feed.kind.is_group()).cloned().or(first))
    }

    fn read_messages<'a>(
        &'a mut self,
        feed: &Feed,
        until: DateTime<Utc>,
    ) -> BoxStream<'a, Result<Message, BackendError>> {
        let feed_id = feed.id;
        self.reads.push(feed_id);

        let mut items: Vec<Result<Message, BackendError>> = self
            .messages
            .get(&feed_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.timestamp <= until)
                    .cloned()
                    .map(Ok)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(&count) = self.fail_after.get(&feed_id) {
            items.truncate(count);
            items.push(Err(BackendError::Telegram(format!(
                "chat {feed_id} not accessible"
            ))));
        }

        let consumed = self.consumed.entry(feed_id).or_insert(0);
        stream::iter(items)
            .map(move |item| {
                *consumed += 1;
                item
            })
            .boxed()
    }

    async fn send_message(&mut self, feed: &Feed, text: &str) -> Result<(), BackendError> {
        self.send_attempts += 1;
        if self.failing_sends.iter().any(|needle| text.contains(needle)) {
            return Err(BackendError::FloodControl("retry after 30s".to_string()));
        }
        self.sent.push((feed.id, text.to_string()));
        Ok(())
    }
}
