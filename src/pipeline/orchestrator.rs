use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    config::RelayConfig,
    domain::{Feed, MatchRecord, RunSummary, ScanWindow},
    infrastructure::shutdown::ShutdownListener,
};

use super::{
    backend::{BackendError, FeedBackend},
    fingerprint::dedup_records,
    formatter::format_post,
    matcher::KeywordFilter,
    scanner::scan_feed,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("destination group {0:?} not found")]
    DestinationNotFound(String),
    #[error("a relay run is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub target_group: String,
    pub lookback: chrono::Duration,
    pub send_delay: Duration,
    pub timezone: Tz,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig, timezone: Tz) -> Self {
        Self {
            target_group: config.target_group.clone(),
            lookback: config.lookback,
            send_delay: config.send_delay,
            timezone,
        }
    }
}

#[derive(Debug, Default)]
struct RelayOutcome {
    sent: usize,
    failed: usize,
    cancelled: bool,
}

/// Scan, deduplicate and relay, one backend call at a time.
pub struct RelayPipeline {
    filter: KeywordFilter,
    settings: RelaySettings,
}

impl RelayPipeline {
    pub fn new(filter: KeywordFilter, settings: RelaySettings) -> Self {
        Self { filter, settings }
    }

    pub async fn run<B: FeedBackend + ?Sized>(
        &self,
        backend: &mut B,
        shutdown: &mut ShutdownListener,
    ) -> Result<RunSummary, PipelineError> {
        self.run_at(backend, Utc::now(), shutdown).await
    }

    pub async fn run_at<B: FeedBackend + ?Sized>(
        &self,
        backend: &mut B,
        now: DateTime<Utc>,
        shutdown: &mut ShutdownListener,
    ) -> Result<RunSummary, PipelineError> {
        let destination = self.resolve_destination(backend).await?;
        tracing::info!(
            target: "relay",
            destination = %destination.name,
            destination_id = destination.id,
            "destination group resolved"
        );

        let sources = self.source_feeds(backend, &destination).await?;
        let window = ScanWindow::trailing(now, self.settings.lookback);
        tracing::info!(
            target: "scanner",
            feeds = sources.len(),
            mode = ?self.filter.mode(),
            job = %self.filter.job().join(", "),
            include = %self.filter.include().join(", "),
            exclude = %self.filter.exclude().join(", "),
            since = %window.since.format("%d/%m/%Y"),
            "scanning source feeds"
        );

        let (records, failed_feeds) = self.scan_all(backend, &sources, &window).await;
        let found = records.len();
        let (mut unique, duplicates) = dedup_records(records);
        sort_newest_first(&mut unique);

        tracing::info!(
            target: "relay",
            unique = unique.len(),
            duplicates,
            destination = %destination.name,
            "relaying unique matches, newest first"
        );

        let outcome = self.relay(backend, &destination, &unique, shutdown).await;

        let summary = RunSummary {
            destination: destination.name,
            window,
            scanned: sources.len(),
            failed_feeds,
            found,
            duplicates,
            unique: unique.len(),
            sent: outcome.sent,
            failed_sends: outcome.failed,
            cancelled: outcome.cancelled,
        };
        log_summary(&summary);
        Ok(summary)
    }

    async fn resolve_destination<B: FeedBackend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<Feed, PipelineError> {
        let target = &self.settings.target_group;
        backend
            .resolve_feed_by_name(target)
            .await?
            .filter(|feed| feed.kind.is_group())
            .ok_or_else(|| PipelineError::DestinationNotFound(target.clone()))
    }

    async fn source_feeds<B: FeedBackend + ?Sized>(
        &self,
        backend: &mut B,
        destination: &Feed,
    ) -> Result<Vec<Feed>, PipelineError> {
        let feeds = backend.enumerate_feeds().await?;
        Ok(feeds
            .into_iter()
            .filter(|feed| feed.kind.is_scan_candidate() && feed.id != destination.id)
            .collect())
    }

    /// Scans feeds in order. A feed that fails contributes nothing.
    async fn scan_all<B: FeedBackend + ?Sized>(
        &self,
        backend: &mut B,
        feeds: &[Feed],
        window: &ScanWindow,
    ) -> (Vec<MatchRecord>, usize) {
        let mut records = Vec::new();
        let mut failed = 0;
        let total = feeds.len();

        for (idx, feed) in feeds.iter().enumerate() {
            let progress = format!("{}/{}", idx + 1, total);
            match scan_feed(backend, feed, window, &self.filter).await {
                Ok(matched) if matched.is_empty() => {
                    tracing::info!(target: "scanner", %progress, feed = %feed.name, "no matches");
                }
                Ok(matched) => {
                    tracing::info!(
                        target: "scanner",
                        %progress,
                        feed = %feed.name,
                        matches = matched.len(),
                        "matches found"
                    );
                    records.extend(matched);
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        target: "scanner",
                        %progress,
                        feed = %feed.name,
                        feed_id = feed.id,
                        error = %err,
                        "failed to scan feed"
                    );
                }
            }
        }

        (records, failed)
    }

    async fn relay<B: FeedBackend + ?Sized>(
        &self,
        backend: &mut B,
        destination: &Feed,
        records: &[MatchRecord],
        shutdown: &mut ShutdownListener,
    ) -> RelayOutcome {
        let mut outcome = RelayOutcome::default();
        let total = records.len();

        for (idx, record) in records.iter().enumerate() {
            if shutdown.is_triggered() {
                outcome.cancelled = true;
                tracing::info!(target: "relay", remaining = total - idx, "shutdown requested; stopping relay");
                break;
            }

            let post = format_post(record, &self.settings.timezone);
            match backend.send_message(destination, &post).await {
                Ok(()) => {
                    outcome.sent += 1;
                    tracing::info!(
                        target: "relay",
                        progress = %format!("{}/{}", outcome.sent, total),
                        date = %record.message.timestamp.with_timezone(&self.settings.timezone).format("%d/%m/%Y"),
                        feed = %record.feed_name,
                        "match relayed"
                    );
                }
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        target: "relay",
                        feed = %record.feed_name,
                        message_id = record.message.id,
                        error = %err,
                        "failed to relay match"
                    );
                    continue;
                }
            }

            // Flood-limit pacing after every successful send.
            if idx + 1 < total && !self.settings.send_delay.is_zero() {
                tokio::select! {
                    _ = sleep(self.settings.send_delay) => {}
                    _ = shutdown.notified() => {
                        outcome.cancelled = true;
                        tracing::info!(target: "relay", remaining = total - idx - 1, "shutdown requested; stopping relay");
                        break;
                    }
                }
            }
        }

        outcome
    }
}

/// Stable, so equal timestamps keep aggregation order.
fn sort_newest_first(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| b.message.timestamp.cmp(&a.message.timestamp));
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        target: "relay",
        since = %summary.window.since.format("%d/%m/%Y"),
        until = %summary.window.until.format("%d/%m/%Y"),
        scanned = summary.scanned,
        failed_feeds = summary.failed_feeds,
        found = summary.found,
        duplicates = summary.duplicates,
        sent = summary.sent,
        failed_sends = summary.failed_sends,
        cancelled = summary.cancelled,
        destination = %summary.destination,
        "relay run finished"
    );
}
