// 📐 Schema Classifier - which Netflix export is this?
// Compares a header set against the viewing and billing reference columns.

use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// FILE CLASS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileClass {
    ViewingActivity,
    BillingHistory,
    Unrecognized,
}

impl FileClass {
    /// Name used in per-file diagnostics
    pub fn file_type(&self) -> &str {
        match self {
            FileClass::ViewingActivity => "netflix-viewing-activity",
            FileClass::BillingHistory => "netflix-billing-history",
            FileClass::Unrecognized => "unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        *self != FileClass::Unrecognized
    }
}

/// Outcome of classifying one header set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub class: FileClass,

    /// Size of the reference set the threshold was compared against (0 when unrecognized)
    pub reference_size: usize,

    /// How many reference columns the header contained
    pub matched: usize,
}

// ============================================================================
// SCHEMA CLASSIFIER
// ============================================================================

pub struct SchemaClassifier {
    viewing_required: BTreeSet<String>,
    billing_required: BTreeSet<String>,
    required_threshold: f64,
}

impl SchemaClassifier {
    /// Classifier with the fixed Netflix reference sets
    pub fn new() -> Self {
        Self::from_config(&ScoringConfig::default())
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        SchemaClassifier {
            viewing_required: normalize_columns(&config.viewing_required),
            billing_required: normalize_columns(&config.billing_required),
            required_threshold: config.required_threshold,
        }
    }

    /// Viewing is checked first, so it wins when both classes qualify
    pub fn classify(&self, header: &BTreeSet<String>) -> Classification {
        let view_matches = header.intersection(&self.viewing_required).count();
        if self.qualifies(view_matches, self.viewing_required.len()) {
            return Classification {
                class: FileClass::ViewingActivity,
                reference_size: self.viewing_required.len(),
                matched: view_matches,
            };
        }

        let bill_matches = header.intersection(&self.billing_required).count();
        if self.qualifies(bill_matches, self.billing_required.len()) {
            return Classification {
                class: FileClass::BillingHistory,
                reference_size: self.billing_required.len(),
                matched: bill_matches,
            };
        }

        Classification {
            class: FileClass::Unrecognized,
            reference_size: 0,
            matched: 0,
        }
    }

    fn qualifies(&self, matched: usize, reference_size: usize) -> bool {
        matched as f64 >= reference_size as f64 * self.required_threshold
    }
}

fn normalize_columns(cols: &[String]) -> BTreeSet<String> {
    cols.iter().map(|c| c.trim().to_lowercase()).collect()
}

impl Default for SchemaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
