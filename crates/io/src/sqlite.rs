// Record store over the membership SQLite database

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use gymdesk_recon::config::DEFAULT_COMPLETED_STATUS;
use gymdesk_recon::error::StoreError;
use gymdesk_recon::model::{CatalogEntry, ReconRecord, RecordUpdate};
use gymdesk_recon::store::RecordStore;

use crate::SCHEMA_VERSION;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS packages (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    price_cents INTEGER,
    duration_days INTEGER
);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    user_id TEXT,
    plan_title TEXT NOT NULL,
    status TEXT NOT NULL,           -- 'completed' once the processor confirms
    amount_cents INTEGER,
    expires_at INTEGER NOT NULL,    -- unix seconds, UTC
    product_id TEXT REFERENCES packages(id),
    total_passes INTEGER
);

CREATE INDEX IF NOT EXISTS payments_status_expiry ON payments (status, expires_at);
"#;

const ELIGIBLE_QUERY: &str = "\
SELECT id, plan_title, expires_at, product_id, total_passes
FROM payments
WHERE status = ?1
  AND expires_at > ?2
  AND (product_id IS NULL OR total_passes IS NULL)
ORDER BY id";

/// A row of the `packages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub price_cents: Option<i64>,
    pub duration_days: Option<i64>,
}

/// A row of the `payments` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: String,
    pub user_id: Option<String>,
    pub plan_title: String,
    pub status: String,
    pub amount_cents: Option<i64>,
    pub expires_at: DateTime<Utc>,
    pub product_id: Option<String>,
    pub total_passes: Option<u32>,
}

pub struct SqliteStore {
    conn: Connection,
    completed_status: String,
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn timestamp(col: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(col, secs))
}

fn passes(col: usize, value: Option<i64>) -> rusqlite::Result<Option<u32>> {
    value
        .map(|v| u32::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(col, v)))
        .transpose()
}

impl SqliteStore {
    /// Open an existing database. The file must already exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| StoreError::Backend(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    /// Create (or reuse) a database file and make sure the schema exists.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("cannot create {}: {e}", path.display())))?;
        let store = Self::from_connection(conn);
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self::from_connection(Connection::open_in_memory().map_err(backend)?);
        store.init_schema()?;
        Ok(store)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            completed_status: DEFAULT_COMPLETED_STATUS.into(),
        }
    }

    /// Status value a payment must carry to be considered finalized.
    pub fn with_completed_status(mut self, status: impl Into<String>) -> Self {
        self.completed_status = status.into();
        self
    }

    /// Create tables if missing. Safe to call on an initialised database.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA).map_err(backend)?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )
            .map_err(backend)?;
        log::debug!("schema v{SCHEMA_VERSION} ready");
        Ok(())
    }

    pub fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    pub fn insert_package(&self, package: &Package) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO packages (id, name, price_cents, duration_days) VALUES (?1, ?2, ?3, ?4)",
                params![package.id, package.name, package.price_cents, package.duration_days],
            )
            .map_err(backend)?;
        Ok(())
    }

    pub fn insert_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO payments (id, user_id, plan_title, status, amount_cents, expires_at, product_id, total_passes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    payment.id,
                    payment.user_id,
                    payment.plan_title,
                    payment.status,
                    payment.amount_cents,
                    payment.expires_at.timestamp(),
                    payment.product_id,
                    payment.total_passes,
                ],
            )
            .map_err(backend)?;
        Ok(())
    }

    pub fn payment(&self, id: &str) -> Result<Option<Payment>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, user_id, plan_title, status, amount_cents, expires_at, product_id, total_passes \
                 FROM payments WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Payment {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        plan_title: row.get(2)?,
                        status: row.get(3)?,
                        amount_cents: row.get(4)?,
                        expires_at: timestamp(5, row.get(5)?)?,
                        product_id: row.get(6)?,
                        total_passes: passes(7, row.get(7)?)?,
                    })
                },
            )
            .optional()
            .map_err(backend)
    }
}

impl RecordStore for SqliteStore {
    fn load_eligible_records(&self, now: DateTime<Utc>) -> Result<Vec<ReconRecord>, StoreError> {
        let mut stmt = self.conn.prepare(ELIGIBLE_QUERY).map_err(backend)?;
        let rows = stmt
            .query_map(params![self.completed_status, now.timestamp()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            })
            .map_err(backend)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, free_text, expires_at, catalog_ref, total_passes) = row.map_err(backend)?;
            let Some(reference_expiry) = Utc.timestamp_opt(expires_at, 0).single() else {
                warn!("{id}: expires_at {expires_at} is out of range, skipping");
                continue;
            };
            // The count is about to be rewritten, so a corrupt value counts as missing.
            let derived_count = total_passes.and_then(|v| u32::try_from(v).ok());
            records.push(ReconRecord {
                id,
                free_text,
                reference_expiry,
                derived_catalog_ref: catalog_ref,
                derived_count,
            });
        }
        Ok(records)
    }

    fn load_catalog(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM packages ORDER BY id")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CatalogEntry {
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            })
            .map_err(backend)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(backend)
    }

    fn persist_record_update(
        &mut self,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(backend)?;
        let changed = tx
            .execute(
                "UPDATE payments SET product_id = ?1, total_passes = ?2 WHERE id = ?3",
                params![update.catalog_ref, update.count, record_id],
            )
            .map_err(backend)?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                record_id: record_id.into(),
            });
        }
        tx.commit().map_err(backend)
    }
}
