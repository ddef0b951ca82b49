pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, FilterConfig, MatchMode, RelayConfig};
pub use loader::load_config;
