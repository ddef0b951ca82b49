use std::convert::TryFrom;

use teloxide::types::{Chat, User};

use crate::domain::{ArchiveStats, Feed, FeedKind};

/// Maps a chat to an archivable feed. Private chats are not feeds.
pub fn feed_from_chat(chat: &Chat) -> Option<Feed> {
    if chat.is_private() {
        return None;
    }
    let kind = classify_chat(chat.is_group(), chat.is_supergroup(), chat.is_channel());
    Some(Feed {
        id: chat.id.0,
        name: chat.title().unwrap_or_default().to_string(),
        kind,
    })
}

fn classify_chat(is_group: bool, is_supergroup: bool, is_channel: bool) -> FeedKind {
    if is_supergroup {
        FeedKind::Supergroup
    } else if is_group {
        FeedKind::Group
    } else if is_channel {
        FeedKind::BroadcastChannel
    } else {
        FeedKind::Other
    }
}

pub fn user_to_i64(user: &User) -> i64 {
    i64::try_from(user.id.0).unwrap_or(i64::MAX)
}

pub fn format_archive_stats(stats: &ArchiveStats) -> String {
    format!(
        "🗄️ Arquivo: {} grupo(s), {} mensagem(ns)",
        stats.feeds, stats.messages
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supergroup_flag_wins_over_group() {
        assert_eq!(classify_chat(true, true, false), FeedKind::Supergroup);
        assert_eq!(classify_chat(true, false, false), FeedKind::Group);
        assert_eq!(classify_chat(false, false, true), FeedKind::BroadcastChannel);
        assert_eq!(classify_chat(false, false, false), FeedKind::Other);
    }

    #[test]
    fn archive_stats_are_rendered() {
        let stats = ArchiveStats {
            feeds: 3,
            messages: 120,
        };
        assert_eq!(
            format_archive_stats(&stats),
            "🗄️ Arquivo: 3 grupo(s), 120 mensagem(ns)"
        );
    }
}
