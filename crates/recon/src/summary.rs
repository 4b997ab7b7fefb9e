use crate::model::{MatchOutcome, MatchResult, ReconSummary};

/// Count per-record outcomes into the run summary.
pub fn compute_summary(details: &[MatchResult]) -> ReconSummary {
    let mut summary = ReconSummary {
        processed: details.len(),
        ..ReconSummary::default()
    };

    for d in details {
        match d.outcome {
            MatchOutcome::Updated | MatchOutcome::WouldUpdate => summary.updated += 1,
            MatchOutcome::BelowThreshold | MatchOutcome::NoCandidate => summary.skipped += 1,
            MatchOutcome::PersistFailed => {
                summary.skipped += 1;
                summary.failed += 1;
            }
        }
    }

    summary
}
