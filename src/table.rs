// 📄 Tabular Input - one contributed CSV, held as raw text
//
// Values are kept exactly as written so row hashes stay stable:
// the comma-joined row string is a compatibility contract.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

/// Tokens read as missing, following the pandas CSV convention
pub const MISSING_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// How a missing value is rendered when a row is stringified for hashing
pub const MISSING_RENDERING: &str = "nan";

pub fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

// ============================================================================
// TABULAR INPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TabularInput {
    /// File name / identifier
    pub name: String,

    /// Column names in file order, untouched
    pub columns: Vec<String>,

    /// Rows aligned with `columns`; `None` = missing
    pub rows: Vec<Vec<Option<String>>>,

    /// Size of the source bytes
    pub byte_size: u64,
}

impl TabularInput {
    /// Load from a CSV file on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(&name, &bytes)
    }

    /// Parse CSV bytes (first record is the header)
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let columns: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|c| c.to_string())
            .collect();

        if columns.is_empty() || columns.iter().all(|c| c.trim().is_empty()) {
            bail!("No columns to parse from file");
        }

        let mut rows = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            let record = result.context("Failed to read CSV record")?;

            // +2: one for the header, one for 1-based numbering
            if record.len() > columns.len() {
                bail!(
                    "Expected {} fields in line {}, saw {}",
                    columns.len(),
                    index + 2,
                    record.len()
                );
            }

            let mut row: Vec<Option<String>> = record
                .iter()
                .map(|v| if is_missing(v) { None } else { Some(v.to_string()) })
                .collect();
            row.resize(columns.len(), None);

            rows.push(row);
        }

        Ok(TabularInput {
            name: name.to_string(),
            columns,
            rows,
            byte_size: bytes.len() as u64,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Lower-cased, trimmed column names
    pub fn header_set(&self) -> BTreeSet<String> {
        self.columns
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect()
    }

    /// Index of the first column whose name starts with `prefix` (case-insensitive)
    pub fn find_column_with_prefix(&self, prefix: &str) -> Option<usize> {
        let prefix = prefix.to_lowercase();
        self.columns
            .iter()
            .position(|c| c.to_lowercase().starts_with(&prefix))
    }

    /// Present values of one column
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).and_then(|v| v.as_deref()))
    }

    /// Row hashes in row order
    pub fn row_hashes(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(|row| hash_row(row))
    }
}

// ============================================================================
// ROW HASHING
// ============================================================================

/// Comma-joined raw values in column order
pub fn stringify_row(row: &[Option<String>]) -> String {
    row.iter()
        .map(|v| v.as_deref().unwrap_or(MISSING_RENDERING))
        .collect::<Vec<_>>()
        .join(",")
}

/// Hex SHA-256 of a stringified row
pub fn hash_row_str(row_data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(row_data.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn hash_row(row: &[Option<String>]) -> String {
    hash_row_str(&stringify_row(row))
}

// ============================================================================
// TESTS
// ============================================================================
