use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, bad n-gram size, etc.).
    ConfigValidation(String),
    /// Bulk load of records or catalog failed. Fatal for the run.
    Load { what: LoadTarget, source: StoreError },
    /// IO error (config file read, etc.).
    Io(String),
}

/// Which of the two up-front bulk reads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Records,
    Catalog,
}

impl fmt::Display for LoadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Records => write!(f, "eligible records"),
            Self::Catalog => write!(f, "catalog"),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Load { what, source } => write!(f, "cannot load {what}: {source}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised by a [`crate::store::RecordStore`] implementation.
#[derive(Debug)]
pub enum StoreError {
    /// Backend query or connection failure.
    Backend(String),
    /// Update targeted a record id the store does not hold.
    NotFound { record_id: String },
    /// Failure injected by a test store.
    Injected { record_id: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(msg) => write!(f, "store error: {msg}"),
            Self::NotFound { record_id } => write!(f, "record '{record_id}' not found"),
            Self::Injected { record_id } => {
                write!(f, "injected failure for record '{record_id}'")
            }
        }
    }
}

impl std::error::Error for StoreError {}
