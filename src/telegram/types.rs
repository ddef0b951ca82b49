use std::sync::Arc;

use teloxide::utils::command::BotCommands;

use crate::{config::AppConfig, db::archive::ArchiveRepository, tasks::relay::RelayRunner};

pub type BotResult<T> = Result<T, teloxide::RequestError>;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub archive: ArchiveRepository,
    pub runner: Arc<RelayRunner>,
}

impl AppState {
    pub fn is_admin_user(&self, user_id: i64) -> bool {
        self.config.admin_user_id.map_or(false, |id| id == user_id)
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Comandos disponíveis:")]
pub enum RelayCommand {
    #[command(description = "ajuda")]
    Help,
    #[command(description = "estado do arquivo e da última execução")]
    Status,
    #[command(description = "ID do chat atual")]
    Chatid,
    #[command(description = "buscar vagas e reenviar agora (admin)")]
    Relay,
}
