pub mod backend;
pub mod fingerprint;
pub mod formatter;
pub mod matcher;
#[cfg(test)]
pub mod mock;
pub mod orchestrator;
pub mod scanner;

pub use backend::{BackendError, FeedBackend};
pub use matcher::KeywordFilter;
pub use orchestrator::{PipelineError, RelayPipeline, RelaySettings};
