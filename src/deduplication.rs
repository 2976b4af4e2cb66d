// 🔍 Duplicate Detector - Bloom filter over row hashes
//
// Probabilistic: a new row may be reported as duplicate (false positive),
// a seen row is never reported as new (no false negatives).

use crate::config::BloomConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// DUPLICATE DETECTOR
// ============================================================================

pub struct DuplicateDetector {
    /// Packed bit array, `size` bits used
    bits: Vec<u64>,

    /// m
    size: usize,

    /// k
    num_hashes: usize,

    /// Insertions judged new
    count: usize,

    expected_elements: usize,
    false_positive_rate: f64,

    /// "0".."k-1", so positions can be derived without formatting per row
    index_labels: Vec<String>,

    /// Reused position buffer for test_and_insert
    scratch: Vec<usize>,
}

impl DuplicateDetector {
    /// Size the filter for `expected_elements` at `false_positive_rate`
    pub fn new(expected_elements: usize, false_positive_rate: f64) -> Self {
        let size = optimal_size(expected_elements, false_positive_rate);
        let num_hashes = optimal_num_hashes(size, expected_elements);

        DuplicateDetector {
            bits: vec![0u64; size.div_ceil(64)],
            size,
            num_hashes,
            count: 0,
            expected_elements,
            false_positive_rate,
            index_labels: (0..num_hashes).map(|i| i.to_string()).collect(),
            scratch: Vec::with_capacity(num_hashes),
        }
    }

    pub fn from_config(config: &BloomConfig) -> Self {
        Self::new(config.expected_elements, config.false_positive_rate)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Test membership and insert in one pass.
    ///
    /// Returns `true` (duplicate) iff all k positions were set before this call.
    /// The positions are set either way.
    pub fn test_and_insert(&mut self, item: &str) -> bool {
        let mut positions = std::mem::take(&mut self.scratch);
        positions.clear();
        positions.extend((0..self.num_hashes).map(|i| self.position(item, i)));

        // Check everything before setting anything: two of the k positions can collide
        let is_duplicate = positions.iter().all(|&pos| self.get_bit(pos));

        for &pos in &positions {
            self.set_bit(pos);
        }

        self.scratch = positions;

        if !is_duplicate {
            self.count += 1;
        }

        is_duplicate
    }

    /// Membership probe without inserting
    pub fn contains(&self, item: &str) -> bool {
        (0..self.num_hashes).all(|i| self.get_bit(self.position(item, i)))
    }

    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            count: self.count,
            size: self.size,
            num_hashes: self.num_hashes,
            expected_elements: self.expected_elements,
            false_positive_rate: self.false_positive_rate,
            load_factor: self.count as f64 / self.expected_elements as f64,
        }
    }

    /// i-th bit position: SHA-256("{item}:{i}") as a big-endian integer, mod m
    fn position(&self, item: &str, index: usize) -> usize {
        let mut hasher = Sha256::new();
        hasher.update(item.as_bytes());
        hasher.update(b":");
        hasher.update(self.index_labels[index].as_bytes());
        let digest = hasher.finalize();

        let m = self.size as u128;
        let reduced = digest
            .iter()
            .fold(0u128, |acc, &byte| ((acc << 8) | byte as u128) % m);

        reduced as usize
    }

    fn get_bit(&self, pos: usize) -> bool {
        self.bits[pos / 64] & (1u64 << (pos % 64)) != 0
    }

    fn set_bit(&mut self, pos: usize) {
        self.bits[pos / 64] |= 1u64 << (pos % 64);
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::from_config(&BloomConfig::default())
    }
}

/// m = ceil(-n·ln(p) / (ln 2)²), at least 1
pub fn optimal_size(expected_elements: usize, false_positive_rate: f64) -> usize {
    let n = expected_elements as f64;
    let ln2 = std::f64::consts::LN_2;
    let m = (-n * false_positive_rate.ln() / (ln2 * ln2)).ceil();
    (m as usize).max(1)
}

/// k = round(m/n · ln 2), at least 1
pub fn optimal_num_hashes(size: usize, expected_elements: usize) -> usize {
    let k = (size as f64 / expected_elements.max(1) as f64 * std::f64::consts::LN_2).round();
    (k as usize).max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorStats {
    pub count: usize,
    pub size: usize,
    pub num_hashes: usize,
    pub expected_elements: usize,
    pub false_positive_rate: f64,
    pub load_factor: f64,
}

// ============================================================================
// PER-FILE REDUCTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateStats {
    pub total_rows: usize,
    pub new_rows: usize,
    pub duplicate_rows: usize,

    /// new_rows / total_rows, 0.0 for an empty file
    pub uniqueness_ratio: f64,
}

/// Feed every row hash through the detector
pub fn detect_new_rows<I, S>(hashes: I, detector: &mut DuplicateDetector) -> DuplicateStats
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut new_rows = 0;
    let mut duplicate_rows = 0;

    for hash in hashes {
        if detector.test_and_insert(hash.as_ref()) {
            duplicate_rows += 1;
        } else {
            new_rows += 1;
        }
    }

    let total_rows = new_rows + duplicate_rows;
    let uniqueness_ratio = if total_rows == 0 {
        0.0
    } else {
        new_rows as f64 / total_rows as f64
    };

    DuplicateStats {
        total_rows,
        new_rows,
        duplicate_rows,
        uniqueness_ratio,
    }
}

// ============================================================================
// TESTS
// ============================================================================
