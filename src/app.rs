use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use teloxide::prelude::*;
use tokio::time::timeout;

use crate::{
    config::AppConfig,
    db::{self, archive::ArchiveRepository},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    pipeline::{KeywordFilter, RelayPipeline, RelaySettings},
    tasks::{
        relay::RelayRunner,
        scheduler::{configure_relay_jobs, RelayCallback},
    },
    telegram::TelegramService,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct JobRelayApp {
    config: Arc<AppConfig>,
    archive: ArchiveRepository,
    runner: Arc<RelayRunner>,
    bot: Bot,
    shutdown: Shutdown,
}

impl JobRelayApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let pool = db::init_pool(&paths.db_path)
            .await
            .with_context(|| format!("failed to open archive {}", paths.db_path.display()))?;
        let archive = ArchiveRepository::new(pool);

        let bot = Bot::new(&config.telegram_bot_token);
        let pipeline = RelayPipeline::new(
            KeywordFilter::from_config(&config.filter),
            RelaySettings::from_config(&config.relay, config.timezone),
        );
        let runner = Arc::new(RelayRunner::new(
            pipeline,
            archive.clone(),
            bot.clone(),
            config.admin_group_id,
            config.timezone,
            shutdown.clone(),
        ));

        Ok(Self {
            config,
            archive,
            runner,
            bot,
            shutdown,
        })
    }

    /// Single relay pass over what is already archived, then exit.
    pub async fn run_once(self) -> Result<()> {
        let result = self.runner.run_once("once").await;
        self.archive.close().await;
        result?;
        Ok(())
    }

    /// Collector plus scheduled relay runs until a shutdown signal.
    pub async fn run(self) -> Result<()> {
        let JobRelayApp {
            config,
            archive,
            runner,
            bot,
            shutdown,
        } = self;

        tracing::info!(
            target: "lifecycle",
            destination = %config.relay.target_group,
            lookback_days = config.relay.lookback.num_days(),
            "job relay bot starting"
        );

        if let Some(cutoff) = Utc::now().checked_sub_signed(config.archive.retention) {
            match archive.prune_before(cutoff).await {
                Ok(removed) => tracing::info!(target: "db", removed, "archive pruned"),
                Err(err) => tracing::warn!(target: "db", error = %err, "archive prune failed"),
            }
        }

        let callback: RelayCallback = {
            let runner = runner.clone();
            Arc::new(move || runner.spawn_run("schedule"))
        };
        let mut scheduler = configure_relay_jobs(&config.scheduler.cron_specs, callback).await?;

        if config.relay.run_on_startup {
            runner.spawn_run("startup");
        }

        let telegram = TelegramService::new(bot, config.clone(), archive.clone(), runner.clone());
        let mut shutdown_listener = shutdown.subscribe();
        let mut telegram_future = Box::pin(telegram.run(shutdown.subscribe()));
        let mut telegram_completed = false;

        tokio::select! {
            _ = shutdown_listener.notified() => {
                tracing::info!(target: "lifecycle", "shutdown signal received");
            }
            res = &mut telegram_future => {
                telegram_completed = true;
                if let Err(err) = res {
                    tracing::error!(target: "collector", ?err, "collector stopped with error");
                } else {
                    tracing::info!(target: "collector", "collector stopped");
                }
            }
        }

        shutdown.trigger();

        if !telegram_completed {
            match timeout(SHUTDOWN_TIMEOUT, &mut telegram_future).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(target: "collector", ?err, "collector stopped with error");
                }
                Err(_) => tracing::warn!(
                    target: "collector",
                    "collector did not stop within {:?}; forcing exit",
                    SHUTDOWN_TIMEOUT
                ),
            }
        }

        match timeout(SHUTDOWN_TIMEOUT, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(target: "scheduler", ?err, "scheduler shutdown failed"),
            Err(_) => tracing::warn!(
                target: "scheduler",
                "scheduler did not stop within {:?}",
                SHUTDOWN_TIMEOUT
            ),
        }

        if timeout(SHUTDOWN_TIMEOUT, runner.wait_idle()).await.is_err() {
            tracing::warn!(
                target: "relay",
                "relay run still active after {:?}; abandoning it",
                SHUTDOWN_TIMEOUT
            );
        }

        if timeout(SHUTDOWN_TIMEOUT, archive.close()).await.is_err() {
            tracing::warn!(target: "db", "archive did not close within {:?}", SHUTDOWN_TIMEOUT);
        }

        tracing::info!(target: "lifecycle", "job relay bot stopped");
        Ok(())
    }
}
