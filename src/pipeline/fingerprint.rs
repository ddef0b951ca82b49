use std::{collections::HashSet, fmt};

use crate::domain::MatchRecord;

/// MD5 digest of whitespace- and case-normalized message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Self(md5::compute(normalize(text).as_bytes()).0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps the first record seen for each fingerprint, preserving input order.
/// Returns the survivors and the number of records dropped.
pub fn dedup_records(records: Vec<MatchRecord>) -> (Vec<MatchRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<MatchRecord> = records
        .into_iter()
        .filter(|record| {
            let fingerprint = Fingerprint::of(record.text());
            let first = seen.insert(fingerprint);
            if !first {
                tracing::debug!(
                    target: "dedup",
                    %fingerprint,
                    feed = %record.feed_name,
                    message_id = record.message.id,
                    "duplicate match dropped"
                );
            }
            first
        })
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::Message;

    fn record(id: i64, feed: &str, text: &str) -> MatchRecord {
        MatchRecord {
            message: Message {
                id,
                feed_id: 1,
                text: Some(text.to_string()),
                timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(id),
            },
            feed_name: feed.to_string(),
        }
    }

    #[test]
    fn fingerprint_ignores_case_and_whitespace_runs() {
        assert_eq!(Fingerprint::of("Hello   World"), Fingerprint::of("hello world"));
        assert_eq!(
            Fingerprint::of("  Vaga\n\tPython  "),
            Fingerprint::of("vaga python")
        );
        assert_ne!(Fingerprint::of("vaga python"), Fingerprint::of("vaga rust"));
    }

    #[test]
    fn fingerprint_is_md5_of_normalized_text() {
        assert_eq!(
            Fingerprint::of("Hello   World").to_string(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let records = vec![
            record(1, "A", "Vaga Python"),
            record(2, "B", "vaga   python"),
            record(3, "B", "Vaga Rust"),
            record(4, "C", "VAGA PYTHON"),
            record(5, "C", "vaga rust"),
            record(6, "C", "Vaga Go"),
        ];
        let (unique, dropped) = dedup_records(records);
        assert_eq!(dropped, 3);
        let ids: Vec<i64> = unique.iter().map(|r| r.message.id).collect();
        assert_eq!(ids, vec![1, 3, 6]);
        assert_eq!(unique[0].feed_name, "A");
    }

    #[test]
    fn dedup_of_empty_input_is_empty() {
        let (unique, dropped) = dedup_records(Vec::new());
        assert!(unique.is_empty());
        assert_eq!(dropped, 0);
    }
}
