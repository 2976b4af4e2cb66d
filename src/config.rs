// ⚙️ Proof Configuration
// Everything the engine used to read from process-wide settings, as one value.
//
// Load order: defaults → optional TOML file → environment overrides → validate

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// FIXED REFERENCE CONFIGURATION
// ============================================================================

/// Viewing-activity reference columns (lower-case)
pub const VIEWING_REQUIRED: [&str; 4] = ["duration", "start time", "profile name", "title"];

/// Billing-history reference columns (lower-case)
pub const BILLING_REQUIRED: [&str; 3] = ["transaction date", "gross sale amt", "currency"];

/// Fraction of a reference set a header must contain to qualify
pub const REQUIRED_THRESHOLD: f64 = 0.5;

/// Minimum composite score for a valid proof
pub const PROOF_THRESHOLD: f64 = 0.5;

pub const DEFAULT_EXPECTED_ELEMENTS: usize = 1_000_000;
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Literal consumers key on
pub const SCHEMA_TYPE: &str = "netflix-csv";

// ============================================================================
// CONFIG SECTIONS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    pub dlp_id: u64,

    /// Wallet address the contribution is claimed by
    pub owner_address: Option<String>,

    /// Directory scanned for *.csv contributions
    pub input_dir: PathBuf,

    /// Where results.json is written (stdout only when unset)
    pub output_dir: Option<PathBuf>,

    /// Prior contribution count reported by the deployment's own lookup
    pub prior_contributions: Option<u64>,

    pub remote: RemoteConfig,
    pub scoring: ScoringConfig,
    pub bloom: BloomConfig,
    pub logging: LoggingConfig,
}

impl Default for ProofConfig {
    fn default() -> Self {
        ProofConfig {
            dlp_id: 0,
            owner_address: None,
            input_dir: PathBuf::from("/input"),
            output_dir: None,
            prior_contributions: None,
            remote: RemoteConfig::default(),
            scoring: ScoringConfig::default(),
            bloom: BloomConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Encrypted remote source. Inactive unless `file_url` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub file_url: Option<String>,

    /// Wallet signature the blob was encrypted with
    pub signature: Option<String>,

    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            file_url: None,
            signature: None,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn is_enabled(&self) -> bool {
        self.file_url.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub viewing_required: Vec<String>,
    pub billing_required: Vec<String>,
    pub required_threshold: f64,
    pub proof_threshold: f64,

    /// Smallest accepted table
    pub min_rows: usize,
    pub min_columns: usize,

    /// Viewing dates on/after this day earn the recency bonus
    pub recency_cutoff: NaiveDate,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            viewing_required: VIEWING_REQUIRED.iter().map(|c| c.to_string()).collect(),
            billing_required: BILLING_REQUIRED.iter().map(|c| c.to_string()).collect(),
            required_threshold: REQUIRED_THRESHOLD,
            proof_threshold: PROOF_THRESHOLD,
            min_rows: 1,
            min_columns: 3,
            recency_cutoff: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub expected_elements: usize,
    pub false_positive_rate: f64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        BloomConfig {
            expected_elements: DEFAULT_EXPECTED_ELEMENTS,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,

    /// pretty | compact | json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl ProofConfig {
    /// Load configuration: defaults, then `path` if given, then env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => ProofConfig::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from a variable source (the process env in `load`)
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(dlp_id) = var("DLP_ID") {
            match dlp_id.trim().parse() {
                Ok(id) => self.dlp_id = id,
                Err(_) => tracing::warn!("Ignoring invalid DLP_ID: {}", dlp_id),
            }
        }

        if let Some(owner) = var("OWNER_ADDRESS") {
            self.owner_address = Some(owner);
        }

        if let Some(input_dir) = var("INPUT_DIR") {
            self.input_dir = PathBuf::from(input_dir);
        }

        if let Some(output_dir) = var("OUTPUT_DIR") {
            self.output_dir = Some(PathBuf::from(output_dir));
        }

        if let Some(count) = var("PRIOR_CONTRIBUTIONS") {
            match count.trim().parse() {
                Ok(n) => self.prior_contributions = Some(n),
                Err(_) => tracing::warn!("Ignoring invalid PRIOR_CONTRIBUTIONS: {}", count),
            }
        }

        if let Some(url) = var("FILE_URL") {
            self.remote.file_url = Some(url);
        }

        if let Some(signature) = var("SIGNATURE") {
            self.remote.signature = Some(signature);
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;

        if scoring.viewing_required.is_empty() || scoring.billing_required.is_empty() {
            bail!("Reference column sets must not be empty");
        }

        for (name, value) in [
            ("required_threshold", scoring.required_threshold),
            ("proof_threshold", scoring.proof_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                bail!("{} must be in (0, 1], got {}", name, value);
            }
        }

        if scoring.min_columns == 0 {
            bail!("min_columns must be at least 1");
        }

        if self.bloom.expected_elements == 0 {
            bail!("bloom.expected_elements must be positive");
        }

        let p = self.bloom.false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            bail!("bloom.false_positive_rate must be in (0, 1), got {}", p);
        }

        Ok(())
    }

    /// Ownership is claimed whenever an address was supplied
    pub fn has_owner(&self) -> bool {
        self.owner_address
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }
}

// ============================================================================
// TESTS
// ============================================================================
