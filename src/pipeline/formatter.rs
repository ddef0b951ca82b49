use chrono_tz::Tz;

use crate::domain::{MatchRecord, RunSummary};

const SEPARATOR_WIDTH: usize = 40;

/// Renders the post relayed to the destination group. The message text is
/// embedded verbatim.
pub fn format_post(record: &MatchRecord, tz: &Tz) -> String {
    let separator = "━".repeat(SEPARATOR_WIDTH);
    let posted_at = record
        .message
        .timestamp
        .with_timezone(tz)
        .format("%d/%m/%Y %H:%M");
    format!(
        "📌 Vaga encontrada!\n\
         {separator}\n\
         📂 Grupo: {group}\n\
         📅 Data: {posted_at}\n\
         {separator}\n\n\
         {text}\n\n\
         {separator}",
        group = record.feed_name,
        text = record.text(),
    )
}

/// Plain-text run report for the admin group and `/status`.
pub fn format_summary(summary: &RunSummary, tz: &Tz) -> String {
    let since = summary.window.since.with_timezone(tz).format("%d/%m/%Y");
    let until = summary.window.until.with_timezone(tz).format("%d/%m/%Y");
    let mut report = format!(
        "📊 Resumo\n\
         📅 Período: {since} até {until}\n\
         📂 Grupos escaneados: {scanned}\n\
         🔍 Vagas encontradas: {found}\n\
         🔄 Duplicadas puladas: {duplicates}\n\
         ✅ Vagas enviadas: {sent}\n\
         📬 Destino: {destination}",
        scanned = summary.scanned,
        found = summary.found,
        duplicates = summary.duplicates,
        sent = summary.sent,
        destination = summary.destination,
    );
    if summary.failed_feeds > 0 {
        report.push_str(&format!("\n⚠️ Grupos com erro: {}", summary.failed_feeds));
    }
    if summary.failed_sends > 0 {
        report.push_str(&format!("\n⚠️ Envios com erro: {}", summary.failed_sends));
    }
    if summary.cancelled {
        report.push_str("\n⏹️ Execução interrompida");
    }
    report
}
