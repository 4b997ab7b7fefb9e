use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use crate::config::ReconConfig;
use crate::error::{LoadTarget, ReconError};
use crate::matcher::best_match;
use crate::model::{
    Candidate, CatalogEntry, MatchOutcome, MatchResult, ReconMeta, ReconRecord, ReconResult,
    RecordUpdate,
};
use crate::similarity::Similarity;
use crate::store::RecordStore;
use crate::summary::compute_summary;

/// Run one reconciliation pass over every eligible record in `store`.
///
/// Records and catalog are loaded once; a failure of either load is the
/// only error this returns. Per-record write failures are logged and
/// counted, and the run continues. `now` is used both for the store's
/// eligibility predicate and for remaining-day counts.
pub fn run<St, Sc>(
    store: &mut St,
    scorer: &Sc,
    config: &ReconConfig,
    now: DateTime<Utc>,
) -> Result<ReconResult, ReconError>
where
    St: RecordStore + ?Sized,
    Sc: Similarity + ?Sized,
{
    let records = store
        .load_eligible_records(now)
        .map_err(|source| ReconError::Load {
            what: LoadTarget::Records,
            source,
        })?;
    let catalog = store.load_catalog().map_err(|source| ReconError::Load {
        what: LoadTarget::Catalog,
        source,
    })?;

    info!(
        "reconcile '{}': {} eligible record(s), {} catalog entr{}",
        config.name,
        records.len(),
        catalog.len(),
        if catalog.len() == 1 { "y" } else { "ies" }
    );

    let details: Vec<MatchResult> = records
        .iter()
        .map(|record| reconcile_record(store, scorer, config, &catalog, record, now))
        .collect();

    let summary = compute_summary(&details);
    debug!(
        "reconcile '{}'{}: {} processed, {} updated, {} skipped ({} failed)",
        config.name,
        if config.dry_run { " (dry run)" } else { "" },
        summary.processed,
        summary.updated,
        summary.skipped,
        summary.failed,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            scorer: scorer.name(),
            threshold: config.threshold,
            dry_run: config.dry_run,
            catalog_size: catalog.len(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: now.to_rfc3339(),
        },
        summary,
        details,
    })
}

fn reconcile_record<St, Sc>(
    store: &mut St,
    scorer: &Sc,
    config: &ReconConfig,
    catalog: &[CatalogEntry],
    record: &ReconRecord,
    now: DateTime<Utc>,
) -> MatchResult
where
    St: RecordStore + ?Sized,
    Sc: Similarity + ?Sized,
{
    let candidate = best_match(record, catalog, scorer);
    let mut result = MatchResult {
        record_id: record.id.clone(),
        free_text: record.free_text.clone(),
        catalog_id: candidate.catalog_id().map(str::to_string),
        catalog_label: candidate.entry.map(|e| e.label.clone()),
        score: candidate.score,
        accepted: false,
        derived_count: None,
        outcome: MatchOutcome::NoCandidate,
        error: None,
    };

    let entry = match candidate.entry {
        Some(entry) if accepts(&candidate, config.threshold) => entry,
        Some(entry) => {
            info!(
                "{}: skipped '{}', best candidate {} '{}' scored {:.3} (threshold {})",
                record.id, record.free_text, entry.id, entry.label, candidate.score, config.threshold
            );
            result.outcome = MatchOutcome::BelowThreshold;
            return result;
        }
        None => {
            info!("{}: skipped '{}', catalog is empty", record.id, record.free_text);
            return result;
        }
    };

    let count = remaining_days(record.reference_expiry, now);
    result.derived_count = Some(count);

    if config.dry_run {
        info!(
            "{}: would match '{}' -> {} '{}' (score {:.3}), {} day(s) remaining",
            record.id, record.free_text, entry.id, entry.label, candidate.score, count
        );
        result.outcome = MatchOutcome::WouldUpdate;
        result.accepted = result.outcome.is_accepted();
        return result;
    }

    let update = RecordUpdate {
        catalog_ref: entry.id.clone(),
        count,
    };
    match store.persist_record_update(&record.id, &update) {
        Ok(()) => {
            info!(
                "{}: matched '{}' -> {} '{}' (score {:.3}), {} day(s) remaining",
                record.id, record.free_text, entry.id, entry.label, candidate.score, count
            );
            result.outcome = MatchOutcome::Updated;
        }
        Err(e) => {
            warn!("{}: update to {} failed: {e}", record.id, entry.id);
            result.outcome = MatchOutcome::PersistFailed;
            result.error = Some(e.to_string());
        }
    }
    result.accepted = result.outcome.is_accepted();

    result
}

/// Acceptance policy: a candidate exists and its score strictly exceeds
/// `threshold`.
pub fn accepts(candidate: &Candidate<'_>, threshold: f64) -> bool {
    candidate.entry.is_some() && candidate.score > threshold
}

/// Whole days from `now` until `expiry`, any partial day rounded up.
/// Zero when `expiry` is not in the future.
pub fn remaining_days(expiry: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let remaining = expiry - now;
    if remaining <= Duration::zero() {
        return 0;
    }
    let whole = remaining.num_days();
    let days = if remaining > Duration::days(whole) {
        whole + 1
    } else {
        whole
    };
    u32::try_from(days).unwrap_or(u32::MAX)
}
