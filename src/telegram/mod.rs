pub mod backend;
pub mod handler;
pub mod types;
pub mod utils;

pub use backend::TelegramSession;
pub use handler::TelegramService;
