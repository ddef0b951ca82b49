pub mod feed;
pub mod types;

pub use feed::{Feed, FeedKind, MatchRecord, Message};
pub use types::{ArchiveStats, RunSummary, ScanWindow};
