use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::Mutex;
use teloxide::prelude::*;

use crate::{
    db::archive::ArchiveRepository,
    domain::RunSummary,
    infrastructure::{notifier::notify_admin_group, shutdown::Shutdown},
    pipeline::{formatter::format_summary, PipelineError, RelayPipeline},
    telegram::TelegramSession,
};

/// Serializes relay runs: at most one run holds a session at any time.
pub struct RelayRunner {
    pipeline: RelayPipeline,
    archive: ArchiveRepository,
    bot: Bot,
    admin_group_id: Option<i64>,
    timezone: Tz,
    shutdown: Shutdown,
    run_lock: tokio::sync::Mutex<()>,
    last_summary: Mutex<Option<RunSummary>>,
}

impl RelayRunner {
    pub fn new(
        pipeline: RelayPipeline,
        archive: ArchiveRepository,
        bot: Bot,
        admin_group_id: Option<i64>,
        timezone: Tz,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            pipeline,
            archive,
            bot,
            admin_group_id,
            timezone,
            shutdown,
            run_lock: tokio::sync::Mutex::new(()),
            last_summary: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    pub fn last_summary(&self) -> Option<RunSummary> {
        self.last_summary.lock().clone()
    }

    pub async fn run_once(&self, trigger: &str) -> Result<RunSummary, PipelineError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::warn!(target: "relay", trigger, "relay run already in progress; skipping");
            return Err(PipelineError::AlreadyRunning);
        };
        tracing::info!(target: "relay", trigger, "relay run started");

        let result = self.run_with_session().await;
        match &result {
            Ok(summary) => {
                *self.last_summary.lock() = Some(summary.clone());
                let report = format_summary(summary, &self.timezone);
                notify_admin_group(&self.bot, self.admin_group_id, &report).await;
            }
            Err(PipelineError::DestinationNotFound(name)) => {
                tracing::error!(
                    target: "relay",
                    destination = %name,
                    "destination group not found; create a group with this name and add the bot"
                );
                let text = format!("❌ Grupo '{name}' não encontrado!");
                notify_admin_group(&self.bot, self.admin_group_id, &text).await;
            }
            Err(err) => {
                tracing::error!(target: "relay", error = %err, "relay run failed");
            }
        }
        result
    }

    async fn run_with_session(&self) -> Result<RunSummary, PipelineError> {
        let mut session = TelegramSession::acquire(self.archive.pool(), self.bot.clone()).await?;
        let mut shutdown = self.shutdown.subscribe();
        self.pipeline.run(&mut session, &mut shutdown).await
    }

    pub fn spawn_run(self: &Arc<Self>, trigger: &'static str) {
        let runner = self.clone();
        tokio::spawn(async move {
            let _ = runner.run_once(trigger).await;
        });
    }

    /// Waits for an in-flight run to release its session.
    pub async fn wait_idle(&self) {
        let _guard = self.run_lock.lock().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MatchMode,
        db::init_pool,
        domain::{Feed, FeedKind},
        pipeline::{KeywordFilter, RelaySettings},
    };

    async fn runner() -> (tempfile::TempDir, RelayRunner) {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_pool(&dir.path().join("archive.db")).await.unwrap();
        let pipeline = RelayPipeline::new(
            KeywordFilter::new(MatchMode::Strict, ["python"], ["estágio"], ["vaga"]),
            RelaySettings {
                target_group: "Vagas".to_string(),
                lookback: chrono::Duration::days(30),
                send_delay: std::time::Duration::ZERO,
                timezone: chrono_tz::UTC,
            },
        );
        let (shutdown, _) = Shutdown::new();
        let runner = RelayRunner::new(
            pipeline,
            ArchiveRepository::new(pool),
            Bot::new("0:test"),
            None,
            chrono_tz::UTC,
            shutdown,
        );
        (dir, runner)
    }

    #[tokio::test]
    async fn missing_destination_is_reported_and_not_recorded() {
        let (_dir, runner) = runner().await;
        let feed = Feed {
            id: -5,
            name: "Devs".to_string(),
            kind: FeedKind::Supergroup,
        };
        runner
            .archive
            .record_message(&feed, 1, Some("vaga python"), chrono::Utc::now())
            .await
            .unwrap();

        let err = runner.run_once("test").await.unwrap_err();
        assert!(matches!(err, PipelineError::DestinationNotFound(_)));
        assert!(runner.last_summary().is_none());
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn concurrent_trigger_is_rejected() {
        let (_dir, runner) = runner().await;
        let _guard = runner.run_lock.try_lock().unwrap();

        assert!(runner.is_running());
        let err = runner.run_once("test").await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyRunning));
    }

    #[tokio::test]
    async fn run_without_matches_records_summary() {
        let (_dir, runner) = runner().await;
        let destination = Feed {
            id: -100,
            name: "Vagas".to_string(),
            kind: FeedKind::Supergroup,
        };
        let source = Feed {
            id: -5,
            name: "Devs".to_string(),
            kind: FeedKind::Group,
        };
        let now = chrono::Utc::now();
        runner.archive.record_message(&destination, 1, Some("oi"), now).await.unwrap();
        runner
            .archive
            .record_message(&source, 2, Some("Python meetup hoje"), now)
            .await
            .unwrap();

        let summary = runner.run_once("test").await.unwrap();
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.found, 0);
        assert_eq!(summary.sent, 0);
        assert_eq!(runner.last_summary().map(|s| s.scanned), Some(1));
    }
}
