// CSV export of per-record reconciliation decisions

use std::io::Write;

use gymdesk_recon::model::MatchResult;

/// CSV header for the run details report.
const DETAILS_HEADER: &[&str] = &[
    "record_id",
    "free_text",
    "catalog_id",
    "catalog_label",
    "score",
    "accepted",
    "derived_count",
    "outcome",
    "error",
];

/// Write one row per processed record, in processing order.
pub fn write_details_csv(details: &[MatchResult], writer: impl Write) -> Result<(), String> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(DETAILS_HEADER)
        .map_err(|e| format!("CSV write error: {e}"))?;

    for d in details {
        let score = format!("{:.4}", d.score);
        let count = d.derived_count.map(|c| c.to_string()).unwrap_or_default();
        let outcome = d.outcome.to_string();
        csv.write_record([
            d.record_id.as_str(),
            d.free_text.as_str(),
            d.catalog_id.as_deref().unwrap_or(""),
            d.catalog_label.as_deref().unwrap_or(""),
            score.as_str(),
            if d.accepted { "true" } else { "false" },
            count.as_str(),
            outcome.as_str(),
            d.error.as_deref().unwrap_or(""),
        ])
        .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv.flush().map_err(|e| format!("CSV flush error: {e}"))?;
    Ok(())
}
