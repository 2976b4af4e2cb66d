// ✅ Quality Scorer - one number per contributed file
//
// quality = min(completeness·0.6 + volume + recency + uniqueness·0.3, 1.0),
// rounded to 3 decimals. The cap applies to the sum, not to each part.

use crate::config::ScoringConfig;
use crate::deduplication::DuplicateStats;
use crate::schema::FileClass;
use crate::table::TabularInput;
use crate::temporal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const COMPLETENESS_WEIGHT: f64 = 0.6;
pub const UNIQUENESS_WEIGHT: f64 = 0.3;

/// new rows per full volume point
pub const VOLUME_DIVISOR: f64 = 10_000.0;
pub const VOLUME_CAP: f64 = 0.50;

pub const RECENCY_BONUS: f64 = 0.10;

/// Viewing column checked for recent activity
pub const RECENCY_COLUMN_PREFIX: &str = "start time";

// ============================================================================
// QUALITY BREAKDOWN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub non_null_ratio: f64,
    pub volume_bonus: f64,
    pub recency_bonus: f64,
    pub uniqueness_bonus: f64,

    /// Final capped and rounded value
    pub quality: f64,
}

impl QualityBreakdown {
    pub fn summary(&self) -> String {
        format!(
            "Quality: {:.3} (completeness {:.1}%, volume +{:.4}, recency +{:.2}, uniqueness +{:.3})",
            self.quality,
            self.non_null_ratio * 100.0,
            self.volume_bonus,
            self.recency_bonus,
            self.uniqueness_bonus
        )
    }
}

// ============================================================================
// QUALITY SCORER
// ============================================================================

pub struct QualityScorer {
    recency_cutoff: NaiveDate,
}

impl QualityScorer {
    pub fn new() -> Self {
        Self::from_config(&ScoringConfig::default())
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        QualityScorer {
            recency_cutoff: config.recency_cutoff,
        }
    }

    /// Score a classified table given its duplicate stats. Pure.
    pub fn score(
        &self,
        table: &TabularInput,
        class: FileClass,
        duplicates: &DuplicateStats,
    ) -> QualityBreakdown {
        let non_null_ratio = non_null_ratio(table);
        let volume_bonus = volume_bonus(duplicates.new_rows);
        let recency_bonus = self.recency_bonus(table, class);
        let uniqueness_bonus = duplicates.uniqueness_ratio * UNIQUENESS_WEIGHT;

        let raw = non_null_ratio * COMPLETENESS_WEIGHT + volume_bonus + recency_bonus + uniqueness_bonus;
        let quality = round3(raw.min(1.0));

        QualityBreakdown {
            non_null_ratio,
            volume_bonus,
            recency_bonus,
            uniqueness_bonus,
            quality,
        }
    }

    /// Only viewing files with at least one recent "start time" qualify
    pub fn recency_bonus(&self, table: &TabularInput, class: FileClass) -> f64 {
        if class != FileClass::ViewingActivity {
            return 0.0;
        }

        let Some(column) = table.find_column_with_prefix(RECENCY_COLUMN_PREFIX) else {
            return 0.0;
        };

        if temporal::any_on_or_after(table.column_values(column), self.recency_cutoff) {
            RECENCY_BONUS
        } else {
            0.0
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// 1 - mean over columns of the missing fraction; 0.0 when undefined
pub fn non_null_ratio(table: &TabularInput) -> f64 {
    let rows = table.row_count();
    let cols = table.column_count();

    if rows == 0 || cols == 0 {
        return 0.0;
    }

    let missing_fraction_sum: f64 = (0..cols)
        .map(|col| {
            let missing = table
                .rows
                .iter()
                .filter(|row| row.get(col).map_or(true, |v| v.is_none()))
                .count();
            missing as f64 / rows as f64
        })
        .sum();

    let ratio = 1.0 - missing_fraction_sum / cols as f64;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

pub fn volume_bonus(new_rows: usize) -> f64 {
    (new_rows as f64 / VOLUME_DIVISOR).min(VOLUME_CAP)
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// TESTS
// ============================================================================
