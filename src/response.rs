// 🧾 Proof Response - the externally consumed result record
// Built once at the end of a run; consumers act on `valid` and `score`.

use crate::config::SCHEMA_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResponse {
    pub dlp_id: u64,
    pub valid: bool,
    pub quality: f64,
    pub uniqueness: f64,
    pub ownership: f64,
    pub score: f64,
    pub attributes: ProofAttributes,
    pub metadata: ProofMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofAttributes {
    /// One entry per successfully scored file, keyed by file name
    pub files: BTreeMap<String, FileMetrics>,

    /// Every recorded error code, in order
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofMetadata {
    pub schema_type: String,
}

impl Default for ProofMetadata {
    fn default() -> Self {
        ProofMetadata {
            schema_type: SCHEMA_TYPE.to_string(),
        }
    }
}

/// Per-file metrics, derived once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub row_count: usize,
    pub new_row_count: usize,
    pub duplicate_row_count: usize,

    /// Rounded to 3 decimals
    pub uniqueness_ratio: f64,

    pub non_null_ratio: f64,
    pub volume_bonus: f64,
    pub recency_bonus: f64,
    pub quality: f64,

    // Diagnostics
    pub columns: Vec<String>,
    pub bytes: u64,
    pub file_type: String,
}

impl ProofResponse {
    /// Result of a run that stopped before any file could be scored
    pub fn aborted(dlp_id: u64, errors: Vec<String>) -> Self {
        ProofResponse {
            dlp_id,
            valid: false,
            quality: 0.0,
            uniqueness: 0.0,
            ownership: 0.0,
            score: 0.0,
            attributes: ProofAttributes {
                files: BTreeMap::new(),
                errors,
            },
            metadata: ProofMetadata::default(),
        }
    }

    pub fn has_error(&self, code: &str) -> bool {
        self.attributes.errors.iter().any(|e| e.starts_with(code))
    }

    pub fn summary(&self) -> String {
        format!(
            "valid={} score={:.3} quality={:.3} files={} errors={}",
            self.valid,
            self.score,
            self.quality,
            self.attributes.files.len(),
            self.attributes.errors.len()
        )
    }
}
