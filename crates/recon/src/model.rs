use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A finalized record still missing one or both derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconRecord {
    pub id: String,
    /// Human-entered label naming the intended catalog entry.
    pub free_text: String,
    pub reference_expiry: DateTime<Utc>,
    pub derived_catalog_ref: Option<String>,
    pub derived_count: Option<u32>,
}

impl ReconRecord {
    /// True once both derived fields are populated.
    pub fn is_reconciled(&self) -> bool {
        self.derived_catalog_ref.is_some() && self.derived_count.is_some()
    }
}

/// Reference item the free text is matched against. Labels are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub label: String,
}

/// Derived fields written back to a record in one atomic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub catalog_ref: String,
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Best catalog candidate for one record.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub entry: Option<&'a CatalogEntry>,
    pub score: f64,
}

impl Candidate<'_> {
    pub fn catalog_id(&self) -> Option<&str> {
        self.entry.map(|e| e.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Accepted and persisted.
    Updated,
    /// Accepted in a dry run; nothing written.
    WouldUpdate,
    /// Best candidate did not clear the acceptance threshold.
    BelowThreshold,
    /// Catalog was empty.
    NoCandidate,
    /// Accepted but the store rejected the write.
    PersistFailed,
}

impl MatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Updated | Self::WouldUpdate | Self::PersistFailed)
    }
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Updated => write!(f, "updated"),
            Self::WouldUpdate => write!(f, "would_update"),
            Self::BelowThreshold => write!(f, "below_threshold"),
            Self::NoCandidate => write!(f, "no_candidate"),
            Self::PersistFailed => write!(f, "persist_failed"),
        }
    }
}

/// Per-record decision. Transient; never persisted by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub record_id: String,
    pub free_text: String,
    pub catalog_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_label: Option<String>,
    pub score: f64,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_count: Option<u32>,
    pub outcome: MatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub processed: usize,
    /// Records written (or that would be written, in a dry run).
    pub updated: usize,
    /// Records left untouched, including persistence failures.
    pub skipped: usize,
    /// Subset of `skipped` whose write was rejected by the store.
    pub failed: usize,
}

impl ReconSummary {
    /// No persistence failures occurred.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub details: Vec<MatchResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub scorer: String,
    pub threshold: f64,
    pub dry_run: bool,
    pub catalog_size: usize,
    pub engine_version: String,
    pub run_at: String,
}
