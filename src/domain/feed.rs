use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Group,
    Supergroup,
    BroadcastChannel,
    Other,
}

impl FeedKind {
    /// Basic groups and supergroups; the only kinds a destination may be.
    pub fn is_group(self) -> bool {
        matches!(self, FeedKind::Group | FeedKind::Supergroup)
    }

    /// Whether feeds of this kind are scanned for matches.
    pub fn is_scan_candidate(self) -> bool {
        self.is_group()
    }

    /// Inverse of [`FeedKind::as_str`]; unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "group" => FeedKind::Group,
            "supergroup" => FeedKind::Supergroup,
            "channel" => FeedKind::BroadcastChannel,
            _ => FeedKind::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedKind::Group => "group",
            FeedKind::Supergroup => "supergroup",
            FeedKind::BroadcastChannel => "channel",
            FeedKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub kind: FeedKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub feed_id: i64,
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A message that passed the keyword filter, paired with the display name of
/// the feed it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub message: Message,
    pub feed_name: String,
}

impl MatchRecord {
    pub fn text(&self) -> &str {
        self.message.text.as_deref().unwrap_or_default()
    }
}
