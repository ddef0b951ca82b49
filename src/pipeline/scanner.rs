use futures::StreamExt;

use crate::domain::{Feed, MatchRecord, ScanWindow};

use super::{
    backend::{BackendError, FeedBackend},
    matcher::KeywordFilter,
};

/// Walks one feed newest-first and collects matching messages until the
/// first message older than `window.since`.
///
/// Backends must deliver messages in non-increasing timestamp order; an
/// out-of-order message older than the window truncates the scan.
pub async fn scan_feed<B: FeedBackend + ?Sized>(
    backend: &mut B,
    feed: &Feed,
    window: &ScanWindow,
    filter: &KeywordFilter,
) -> Result<Vec<MatchRecord>, BackendError> {
    let mut matched = Vec::new();
    let mut messages = backend.read_messages(feed, window.until);

    while let Some(message) = messages.next().await {
        let message = message?;
        if window.is_before_start(message.timestamp) {
            break;
        }
        let is_match = message
            .text
            .as_deref()
            .map(|text| filter.matches(text))
            .unwrap_or(false);
        if is_match {
            matched.push(MatchRecord {
                message,
                feed_name: feed.name.clone(),
            });
        }
    }

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        config::MatchMode,
        pipeline::mock::{at, MockBackend},
    };

    fn filter() -> KeywordFilter {
        KeywordFilter::new(MatchMode::Strict, ["python"], ["estágio"], ["vaga"])
    }

    fn window() -> ScanWindow {
        ScanWindow::trailing(at(0), Duration::days(30))
    }

    #[tokio::test]
    async fn returns_in_window_prefix_and_stops_early() {
        let mut backend = MockBackend::new();
        let feed = backend.add_group(1, "A");
        backend.push_message(1, 10, Some("vaga python 1"), at(-1));
        backend.push_message(1, 11, Some("vaga python 2"), at(-29));
        backend.push_message(1, 12, Some("vaga python 3"), at(-31));
        backend.push_message(1, 13, Some("vaga python 4"), at(-40));

        let matched = scan_feed(&mut backend, &feed, &window(), &filter()).await.unwrap();

        let ids: Vec<i64> = matched.iter().map(|r| r.message.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(backend.consumed(1), 3);
        assert!(matched.iter().all(|r| r.feed_name == "A"));
    }

    #[tokio::test]
    async fn message_exactly_at_boundary_is_kept() {
        let mut backend = MockBackend::new();
        let feed = backend.add_group(1, "A");
        let window = window();
        backend.push_message(1, 10, Some("vaga python"), window.since);

        let matched = scan_feed(&mut backend, &feed, &window, &filter()).await.unwrap();
        assert_eq!(matched.len(), 1);
    }

    #[tokio::test]
    async fn skips_non_matching_and_textless_messages() {
        let mut backend = MockBackend::new();
        let feed = backend.add_group(1, "A");
        backend.push_message(1, 10, None, at(-1));
        backend.push_message(1, 11, Some(""), at(-2));
        backend.push_message(1, 12, Some("Python meetup"), at(-3));
        backend.push_message(1, 13, Some("Vaga de Python Developer"), at(-4));

        let matched = scan_feed(&mut backend, &feed, &window(), &filter()).await.unwrap();
        let ids: Vec<i64> = matched.iter().map(|r| r.message.id).collect();
        assert_eq!(ids, vec![13]);
    }

    #[tokio::test]
    async fn read_error_is_returned() {
        let mut backend = MockBackend::new();
        let feed = backend.add_group(1, "A");
        backend.push_message(1, 10, Some("vaga python"), at(-1));
        backend.fail_reads_after(1, 1);

        let result = scan_feed(&mut backend, &feed, &window(), &filter()).await;
        assert!(result.is_err());
    }
}
