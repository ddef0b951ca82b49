use teloxide::prelude::*;

/// Sends a plain-text report to the admin group, if one is configured.
/// Failures are logged and otherwise ignored.
pub async fn notify_admin_group(bot: &Bot, admin_group_id: Option<i64>, text: &str) {
    let Some(admin_group_id) = admin_group_id.filter(|id| *id != 0) else {
        return;
    };
    if let Err(err) = bot.send_message(ChatId(admin_group_id), text).await {
        tracing::warn!(
            target: "relay",
            error = %err,
            admin_group_id,
            "failed to send admin notification"
        );
    }
}
