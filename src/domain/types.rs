use chrono::{DateTime, Duration, Utc};

/// Trailing time window shared by every feed scanned in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl ScanWindow {
    /// Clamps `since` to the earliest representable instant when the
    /// lookback reaches past it.
    pub fn trailing(now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            since: now
                .checked_sub_signed(lookback)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            until: now,
        }
    }

    pub fn is_before_start(&self, instant: DateTime<Utc>) -> bool {
        instant < self.since
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub destination: String,
    pub window: ScanWindow,
    pub scanned: usize,
    pub failed_feeds: usize,
    pub found: usize,
    pub duplicates: usize,
    pub unique: usize,
    pub sent: usize,
    pub failed_sends: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveStats {
    pub feeds: i64,
    pub messages: i64,
}
