use serde::Deserialize;

use crate::error::ReconError;
use crate::similarity::{CosineSimilarity, Vectorizer};

/// Minimum score a candidate must strictly exceed to be accepted.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

pub const DEFAULT_COMPLETED_STATUS: &str = "completed";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Compute decisions without writing anything.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_name() -> String {
    "reconcile".into()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            threshold: DEFAULT_THRESHOLD,
            scorer: ScorerConfig::default(),
            store: StoreConfig::default(),
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerKind {
    #[default]
    Word,
    CharNgram,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScorerConfig {
    #[serde(default)]
    pub vectorizer: VectorizerKind,
    /// N-gram size; only read for `char_ngram`.
    #[serde(default = "default_ngram")]
    pub n: usize,
}

fn default_ngram() -> usize {
    2
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerKind::Word,
            n: default_ngram(),
        }
    }
}

impl ScorerConfig {
    pub fn build(&self) -> CosineSimilarity {
        let vectorizer = match self.vectorizer {
            VectorizerKind::Word => Vectorizer::Word,
            VectorizerKind::CharNgram => Vectorizer::CharNgram(self.n),
        };
        CosineSimilarity::new(vectorizer)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Values the record store plugs into its eligibility predicate.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_completed_status")]
    pub completed_status: String,
}

fn default_completed_status() -> String {
    DEFAULT_COMPLETED_STATUS.into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            completed_status: default_completed_status(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn from_path(path: &std::path::Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        if !self.threshold.is_finite() || !(0.0..1.0).contains(&self.threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "threshold must be in [0, 1), got {}",
                self.threshold
            )));
        }

        if self.scorer.vectorizer == VectorizerKind::CharNgram && self.scorer.n == 0 {
            return Err(ReconError::ConfigValidation(
                "scorer.n must be at least 1".into(),
            ));
        }

        if self.store.completed_status.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "store.completed_status must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
