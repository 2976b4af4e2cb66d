// ⚠️ Error Codes - Everything that can land in a proof's error list
//
// The Display output of these enums IS the code consumers see in
// `attributes.errors`, so the format strings are part of the output contract.

use thiserror::Error;

// ============================================================================
// CONTRIBUTION ERRORS (per-file + policy)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContributionError {
    /// Input could not be parsed as CSV at all
    #[error("CSV_READ_ERROR: {0}")]
    CsvRead(String),

    /// Parsed, but fewer rows/columns than the minimum
    #[error("CSV_TOO_SMALL: {name} (rows={rows}, cols={cols})")]
    CsvTooSmall {
        name: String,
        rows: usize,
        cols: usize,
    },

    /// Header matches neither the viewing nor the billing reference set
    #[error("UNRECOGNISED_CSV_STRUCTURE")]
    UnrecognisedStructure,

    /// No file survived classification
    #[error("NO_VALID_CSV_FILES")]
    NoValidFiles,

    /// Owner already contributed before
    #[error("DUPLICATE_CONTRIBUTION")]
    DuplicateContribution,

    /// Composite score under the proof threshold
    #[error("SCORE_BELOW_THRESHOLD")]
    ScoreBelowThreshold,

    /// Run-level prerequisite failure, see `InputError`
    #[error("INPUT_UNAVAILABLE: {0}")]
    InputUnavailable(#[from] InputError),
}

impl ContributionError {
    /// Bare code without detail (e.g. "CSV_TOO_SMALL")
    pub fn code(&self) -> &'static str {
        match self {
            ContributionError::CsvRead(_) => "CSV_READ_ERROR",
            ContributionError::CsvTooSmall { .. } => "CSV_TOO_SMALL",
            ContributionError::UnrecognisedStructure => "UNRECOGNISED_CSV_STRUCTURE",
            ContributionError::NoValidFiles => "NO_VALID_CSV_FILES",
            ContributionError::DuplicateContribution => "DUPLICATE_CONTRIBUTION",
            ContributionError::ScoreBelowThreshold => "SCORE_BELOW_THRESHOLD",
            ContributionError::InputUnavailable(_) => "INPUT_UNAVAILABLE",
        }
    }

    /// Per-file errors exclude one file; everything else concerns the whole run
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            ContributionError::CsvRead(_)
                | ContributionError::CsvTooSmall { .. }
                | ContributionError::UnrecognisedStructure
        )
    }
}

// ============================================================================
// INPUT ERRORS (run-aborting)
// ============================================================================

/// Failures that prevent any file from being obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("input location unreadable: {0}")]
    Location(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_error_code() {
        let err = ContributionError::CsvTooSmall {
            name: "ViewingActivity.csv".to_string(),
            rows: 0,
            cols: 4,
        };
        assert_eq!(
            err.to_string(),
            "CSV_TOO_SMALL: ViewingActivity.csv (rows=0, cols=4)"
        );
        assert_eq!(err.code(), "CSV_TOO_SMALL");

        assert_eq!(
            ContributionError::UnrecognisedStructure.to_string(),
            "UNRECOGNISED_CSV_STRUCTURE"
        );
    }

    #[test]
    fn test_input_error_collapses_into_one_category() {
        let errors: Vec<ContributionError> = vec![
            InputError::MissingCredentials("no signature".to_string()).into(),
            InputError::Download("HTTP 404".to_string()).into(),
            InputError::Decryption("bad tag".to_string()).into(),
        ];

        for err in &errors {
            assert_eq!(err.code(), "INPUT_UNAVAILABLE");
            assert!(err.to_string().starts_with("INPUT_UNAVAILABLE: "));
            assert!(!err.is_file_level());
        }
    }

    #[test]
    fn test_file_level_classification() {
        assert!(ContributionError::CsvRead("x".to_string()).is_file_level());
        assert!(ContributionError::UnrecognisedStructure.is_file_level());
        assert!(!ContributionError::NoValidFiles.is_file_level());
        assert!(!ContributionError::ScoreBelowThreshold.is_file_level());
    }
}
