//! `gymdesk-recon` — fuzzy record reconciliation engine.
//!
//! Pure engine crate: matches free-text labels on incomplete records against
//! a reference catalog and writes derived fields back through a
//! [`RecordStore`]. No CLI or database dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod similarity;
pub mod store;
pub mod summary;

pub use config::ReconConfig;
pub use engine::run;
pub use error::{ReconError, StoreError};
pub use model::{CatalogEntry, MatchOutcome, MatchResult, ReconRecord, ReconResult, RecordUpdate};
pub use similarity::{CosineSimilarity, Similarity, Vectorizer};
pub use store::{MemoryStore, RecordStore};
