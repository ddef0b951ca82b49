use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use teloxide::{
    dispatching::Dispatcher, error_handlers::ErrorHandler, prelude::*, types::Message,
    update_listeners, utils::command::BotCommands,
};

use crate::{
    config::AppConfig,
    db::archive::ArchiveRepository,
    infrastructure::shutdown::ShutdownListener,
    pipeline::formatter::format_summary,
    tasks::relay::RelayRunner,
};

use super::{
    types::{AppState, BotResult, RelayCommand},
    utils::{feed_from_chat, format_archive_stats, user_to_i64},
};

/// Long-polling collector: archives group traffic and answers bot commands.
pub struct TelegramService {
    bot: Bot,
    state: Arc<AppState>,
}

struct ListenerErrorLogger;

impl ErrorHandler<teloxide::RequestError> for ListenerErrorLogger {
    fn handle_error(self: Arc<Self>, error: teloxide::RequestError) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match &error {
                teloxide::RequestError::Network(source) => {
                    tracing::error!(
                        target: "collector",
                        timeout = source.is_timeout(),
                        connect = source.is_connect(),
                        error = %error,
                        "Telegram polling network failure"
                    );
                }
                _ => {
                    tracing::error!(target: "collector", error = %error, "update listener error");
                }
            }
        })
    }
}

impl TelegramService {
    pub fn new(
        bot: Bot,
        config: Arc<AppConfig>,
        archive: ArchiveRepository,
        runner: Arc<RelayRunner>,
    ) -> Self {
        let state = Arc::new(AppState {
            config,
            archive,
            runner,
        });
        Self { bot, state }
    }

    pub async fn run(&self, mut shutdown: ShutdownListener) -> Result<()> {
        self.bot.set_my_commands(RelayCommand::bot_commands()).await?;
        let me = self.bot.get_me().await?;
        tracing::info!(
            target: "collector",
            bot_id = me.id.0,
            username = ?me.username,
            "Telegram bot connected"
        );

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .branch(
                        dptree::entry()
                            .filter_command::<RelayCommand>()
                            .endpoint(Self::on_command),
                    )
                    .branch(dptree::endpoint(Self::on_feed_message)),
            )
            .branch(Update::filter_edited_message().endpoint(Self::on_feed_message))
            .branch(Update::filter_channel_post().endpoint(Self::on_feed_message));

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![self.state.clone()])
            .default_handler(|update| async move {
                tracing::debug!(target: "collector", ?update, "unhandled update");
            })
            .build();

        let listener = update_listeners::polling_default(self.bot.clone()).await;
        let shutdown_token = dispatcher.shutdown_token();
        let mut dispatcher_future = Box::pin(
            dispatcher.dispatch_with_listener(listener, Arc::new(ListenerErrorLogger)),
        );
        let mut dispatcher_finished = false;

        tokio::select! {
            _ = shutdown.notified() => {
                tracing::info!(target: "collector", "collector shutdown requested");
                if let Ok(wait) = shutdown_token.shutdown() {
                    wait.await;
                }
            }
            _ = &mut dispatcher_future => {
                dispatcher_finished = true;
                tracing::info!(target: "collector", "dispatcher stopped");
            }
        }

        if !dispatcher_finished {
            dispatcher_future.await;
        }

        Ok(())
    }

    async fn on_feed_message(msg: Message, state: Arc<AppState>) -> BotResult<()> {
        let Some(feed) = feed_from_chat(&msg.chat) else {
            return Ok(());
        };
        let text = msg.text().or_else(|| msg.caption());

        if let Err(err) = state
            .archive
            .record_message(&feed, i64::from(msg.id.0), text, msg.date)
            .await
        {
            tracing::error!(
                target: "collector",
                error = %err,
                chat_id = feed.id,
                message_id = msg.id.0,
                "failed to archive message"
            );
        }
        Ok(())
    }

    async fn on_command(
        bot: Bot,
        msg: Message,
        cmd: RelayCommand,
        state: Arc<AppState>,
    ) -> BotResult<()> {
        match cmd {
            RelayCommand::Help => {
                bot.send_message(msg.chat.id, RelayCommand::descriptions().to_string())
                    .await?;
            }
            RelayCommand::Chatid => {
                bot.send_message(msg.chat.id, format!("ID do chat atual: {}", msg.chat.id))
                    .await?;
            }
            RelayCommand::Status => {
                let mut reply = match state.archive.stats().await {
                    Ok(stats) => format_archive_stats(&stats),
                    Err(err) => {
                        tracing::error!(target: "db", error = %err, "failed to read archive stats");
                        "🗄️ Arquivo indisponível".to_string()
                    }
                };
                reply.push_str("\n\n");
                match state.runner.last_summary() {
                    Some(summary) => {
                        reply.push_str(&format_summary(&summary, &state.config.timezone))
                    }
                    None => reply.push_str("Nenhuma execução desde o início do bot."),
                }
                bot.send_message(msg.chat.id, reply).await?;
            }
            RelayCommand::Relay => {
                let is_admin = msg
                    .from
                    .as_ref()
                    .map(|user| state.is_admin_user(user_to_i64(user)))
                    .unwrap_or(false);
                if !is_admin {
                    bot.send_message(msg.chat.id, "Este comando é apenas para o administrador.")
                        .await?;
                    return Ok(());
                }
                if state.runner.is_running() {
                    bot.send_message(msg.chat.id, "Já existe uma execução em andamento.")
                        .await?;
                    return Ok(());
                }
                state.runner.spawn_run("command");
                bot.send_message(msg.chat.id, "🔎 Busca de vagas iniciada.")
                    .await?;
            }
        }
        Ok(())
    }
}
