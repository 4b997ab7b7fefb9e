// Storage and report I/O

pub mod report;
pub mod sqlite;

pub use sqlite::{Package, Payment, SqliteStore};

/// Schema version stored in `meta`.
/// Increment when the payments/packages layout changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;
