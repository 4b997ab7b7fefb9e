//! Record store seam and an in-memory implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_COMPLETED_STATUS;
use crate::error::StoreError;
use crate::model::{CatalogEntry, ReconRecord, RecordUpdate};

/// Storage the reconciler reads from and writes back to.
///
/// The store owns the eligibility predicate: `load_eligible_records` returns
/// only finalized records whose expiry is after `now` and that still miss a
/// derived field.
pub trait RecordStore {
    fn load_eligible_records(&self, now: DateTime<Utc>) -> Result<Vec<ReconRecord>, StoreError>;

    fn load_catalog(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Write both derived fields of one record atomically.
    fn persist_record_update(
        &mut self,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError>;
}

/// A record plus the status flag the eligibility predicate looks at.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: ReconRecord,
    pub status: String,
}

/// Vector-backed store. Load order is insertion order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Vec<StoredRecord>,
    catalog: Vec<CatalogEntry>,
    completed_status: String,
    failing_ids: HashSet<String>,
    fail_record_load: bool,
    fail_catalog_load: bool,
    writes: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            catalog: Vec::new(),
            completed_status: DEFAULT_COMPLETED_STATUS.into(),
            failing_ids: HashSet::new(),
            fail_record_load: false,
            fail_catalog_load: false,
            writes: 0,
        }
    }
}

impl MemoryStore {
    pub fn new(catalog: Vec<CatalogEntry>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn with_completed_status(mut self, status: impl Into<String>) -> Self {
        self.completed_status = status.into();
        self
    }

    pub fn insert(&mut self, record: ReconRecord, status: impl Into<String>) {
        self.records.push(StoredRecord {
            record,
            status: status.into(),
        });
    }

    /// Make every write to `record_id` fail.
    pub fn fail_writes_for(&mut self, record_id: impl Into<String>) {
        self.failing_ids.insert(record_id.into());
    }

    /// Make the eligible-record load fail.
    pub fn fail_record_load(&mut self) {
        self.fail_record_load = true;
    }

    /// Make the catalog load fail. Records still load.
    pub fn fail_catalog_load(&mut self) {
        self.fail_catalog_load = true;
    }

    pub fn get(&self, record_id: &str) -> Option<&ReconRecord> {
        self.records
            .iter()
            .find(|r| r.record.id == record_id)
            .map(|r| &r.record)
    }

    /// Number of successful writes since creation.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn is_eligible(&self, stored: &StoredRecord, now: DateTime<Utc>) -> bool {
        stored.status == self.completed_status
            && stored.record.reference_expiry > now
            && !stored.record.is_reconciled()
    }
}

impl RecordStore for MemoryStore {
    fn load_eligible_records(&self, now: DateTime<Utc>) -> Result<Vec<ReconRecord>, StoreError> {
        if self.fail_record_load {
            return Err(StoreError::Backend("memory store: record load disabled".into()));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| self.is_eligible(r, now))
            .map(|r| r.record.clone())
            .collect())
    }

    fn load_catalog(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        if self.fail_catalog_load {
            return Err(StoreError::Backend("memory store: catalog load disabled".into()));
        }
        Ok(self.catalog.clone())
    }

    fn persist_record_update(
        &mut self,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError> {
        if self.failing_ids.contains(record_id) {
            return Err(StoreError::Injected {
                record_id: record_id.into(),
            });
        }
        let stored = self
            .records
            .iter_mut()
            .find(|r| r.record.id == record_id)
            .ok_or_else(|| StoreError::NotFound {
                record_id: record_id.into(),
            })?;
        stored.record.derived_catalog_ref = Some(update.catalog_ref.clone());
        stored.record.derived_count = Some(update.count);
        self.writes += 1;
        Ok(())
    }
}
