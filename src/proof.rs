// 🧮 Proof Engine - per-file processing, aggregation, threshold gate
//
// Run stages: Init → DuplicateGuardChecked → FilesProcessed → Scored
//             → ThresholdGated → Done
//
// File-level failures are recorded and the next file is processed.
// A failure to obtain input at all ends the run early with valid=false.

use crate::collaborators::{
    AesGcmDecryptor, BlobFetcher, Decryptor, DuplicateCountLookup, StaticCountLookup,
};
use crate::config::{ProofConfig, RemoteConfig};
use crate::data_quality::{round3, QualityScorer};
use crate::deduplication::{detect_new_rows, DuplicateDetector};
use crate::error::{ContributionError, InputError};
use crate::response::{FileMetrics, ProofAttributes, ProofMetadata, ProofResponse};
use crate::schema::SchemaClassifier;
use crate::table::TabularInput;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const QUALITY_WEIGHT: f64 = 0.6;
pub const UNIQUENESS_WEIGHT: f64 = 0.3;
pub const OWNERSHIP_WEIGHT: f64 = 0.1;

/// Aggregate uniqueness is fixed; per-file ratios only feed quality
pub const AGGREGATE_UNIQUENESS: f64 = 1.0;

/// Name given to a decrypted blob whose URL has no usable file name
pub const DEFAULT_BLOB_NAME: &str = "decrypted_file.csv";

// ============================================================================
// RUN STAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStage {
    Init,
    DuplicateGuardChecked,
    FilesProcessed,
    Scored,
    ThresholdGated,
    Done,
}

// ============================================================================
// SCORE CARD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub quality: f64,
    pub uniqueness: f64,
    pub ownership: f64,
    pub score: f64,
}

impl ScoreCard {
    /// Reduce per-file qualities: best file wins, 0.0 when nothing was scored
    pub fn from_files<'a, I>(qualities: I, has_owner: bool) -> Self
    where
        I: IntoIterator<Item = &'a FileMetrics>,
    {
        let quality = qualities
            .into_iter()
            .map(|m| m.quality)
            .fold(0.0, f64::max);
        let ownership = if has_owner { 1.0 } else { 0.0 };

        ScoreCard {
            quality,
            uniqueness: AGGREGATE_UNIQUENESS,
            ownership,
            score: composite_score(quality, AGGREGATE_UNIQUENESS, ownership),
        }
    }
}

pub fn composite_score(quality: f64, uniqueness: f64, ownership: f64) -> f64 {
    quality * QUALITY_WEIGHT + uniqueness * UNIQUENESS_WEIGHT + ownership * OWNERSHIP_WEIGHT
}

// ============================================================================
// INPUT ITEMS
// ============================================================================

/// One unit of input, loaded lazily so read failures stay per-file
pub enum InputItem {
    File(PathBuf),
    Blob { name: String, bytes: Vec<u8> },
    Table(TabularInput),
}

impl InputItem {
    pub fn name(&self) -> String {
        match self {
            InputItem::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            InputItem::Blob { name, .. } => name.clone(),
            InputItem::Table(table) => table.name.clone(),
        }
    }

    pub fn load(self) -> Result<TabularInput> {
        match self {
            InputItem::File(path) => TabularInput::from_path(&path),
            InputItem::Blob { name, bytes } => TabularInput::from_bytes(&name, &bytes),
            InputItem::Table(table) => Ok(table),
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Last path segment of a URL, without query or fragment
fn blob_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);

    path.split_once('/')
        .and_then(|(_host, rest)| rest.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .unwrap_or_else(|| DEFAULT_BLOB_NAME.to_string())
}

// ============================================================================
// PROOF RUN (per-run mutable state)
// ============================================================================

struct ProofRun {
    stage: RunStage,
    errors: Vec<String>,
    files: BTreeMap<String, FileMetrics>,
    detector: DuplicateDetector,
}

impl ProofRun {
    fn new(config: &ProofConfig) -> Self {
        ProofRun {
            stage: RunStage::Init,
            errors: Vec::new(),
            files: BTreeMap::new(),
            detector: DuplicateDetector::from_config(&config.bloom),
        }
    }

    fn advance(&mut self, next: RunStage) {
        debug_assert!(next > self.stage, "run stages only move forward");
        debug!("Run stage {:?} → {:?}", self.stage, next);
        self.stage = next;
    }

    fn record(&mut self, err: ContributionError) {
        let code = err.to_string();
        if err.is_file_level() {
            warn!("{}", code);
        } else {
            error!("{}", code);
        }
        self.errors.push(code);
    }
}

// ============================================================================
// PROOF ENGINE
// ============================================================================

pub struct ProofEngine {
    config: ProofConfig,
    classifier: SchemaClassifier,
    scorer: QualityScorer,
    lookup: Option<Box<dyn DuplicateCountLookup>>,
    fetcher: Option<Box<dyn BlobFetcher>>,
    decryptor: Box<dyn Decryptor>,
}

impl ProofEngine {
    /// Engine with the default collaborators for `config`
    pub fn new(config: ProofConfig) -> Self {
        let lookup = config
            .prior_contributions
            .map(|count| Box::new(StaticCountLookup::new(count)) as Box<dyn DuplicateCountLookup>);

        ProofEngine {
            classifier: SchemaClassifier::from_config(&config.scoring),
            scorer: QualityScorer::from_config(&config.scoring),
            lookup,
            fetcher: default_fetcher(&config.remote),
            decryptor: Box::new(AesGcmDecryptor),
            config,
        }
    }

    pub fn with_lookup(mut self, lookup: impl DuplicateCountLookup + 'static) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl BlobFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn with_decryptor(mut self, decryptor: impl Decryptor + 'static) -> Self {
        self.decryptor = Box::new(decryptor);
        self
    }

    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    /// Run the proof over the configured input (remote blob or input directory)
    pub fn generate(&self) -> ProofResponse {
        self.run(|| self.acquire_inputs())
    }

    /// Run the proof over tables that are already in memory
    pub fn generate_from_tables(&self, tables: Vec<TabularInput>) -> ProofResponse {
        self.run(move || Ok(tables.into_iter().map(InputItem::Table).collect()))
    }

    fn run<F>(&self, acquire: F) -> ProofResponse
    where
        F: FnOnce() -> Result<Vec<InputItem>, InputError>,
    {
        info!("⇢ starting Netflix-CSV proof (dlp_id={})", self.config.dlp_id);
        let mut run = ProofRun::new(&self.config);

        self.check_duplicate_contribution(&mut run);
        run.advance(RunStage::DuplicateGuardChecked);

        let items = match acquire() {
            Ok(items) => items,
            Err(e) => {
                run.record(e.into());
                info!("⇢ proof aborted: no input could be obtained");
                return ProofResponse::aborted(self.config.dlp_id, run.errors);
            }
        };

        for item in items {
            self.process_item(&mut run, item);
        }

        if run.files.is_empty() {
            run.record(ContributionError::NoValidFiles);
        }
        run.advance(RunStage::FilesProcessed);

        let card = ScoreCard::from_files(run.files.values(), self.config.has_owner());
        run.advance(RunStage::Scored);

        let mut valid = run.errors.is_empty();
        if card.score < self.config.scoring.proof_threshold {
            valid = false;
            run.record(ContributionError::ScoreBelowThreshold);
        }
        run.advance(RunStage::ThresholdGated);

        let detector = run.detector.stats();
        debug!(
            "Detector: {} new items, load factor {:.6}",
            detector.count, detector.load_factor
        );
        run.advance(RunStage::Done);

        let response = ProofResponse {
            dlp_id: self.config.dlp_id,
            valid,
            quality: card.quality,
            uniqueness: card.uniqueness,
            ownership: card.ownership,
            score: card.score,
            attributes: ProofAttributes {
                files: run.files,
                errors: run.errors,
            },
            metadata: ProofMetadata::default(),
        };

        info!("⇢ proof complete: {}", response.summary());
        response
    }

    // ------------------------------------------------------------------------
    // Duplicate-contribution guard
    // ------------------------------------------------------------------------

    fn check_duplicate_contribution(&self, run: &mut ProofRun) {
        let owner = match self.config.owner_address.as_deref() {
            Some(owner) if self.config.has_owner() => owner,
            _ => {
                debug!("No owner address, skipping duplicate-contribution guard");
                return;
            }
        };

        let Some(lookup) = self.lookup.as_deref() else {
            debug!("No contribution lookup available, skipping duplicate-contribution guard");
            return;
        };

        match lookup.contribution_count(owner) {
            Ok(0) => debug!("No prior contributions for {}", owner),
            Ok(count) => {
                info!("{} already has {} contribution(s)", owner, count);
                run.record(ContributionError::DuplicateContribution);
            }
            Err(e) => warn!("Contribution lookup unavailable, skipping guard: {:#}", e),
        }
    }

    // ------------------------------------------------------------------------
    // Input acquisition
    // ------------------------------------------------------------------------

    fn acquire_inputs(&self) -> Result<Vec<InputItem>, InputError> {
        match self.config.remote.file_url.as_deref() {
            Some(url) => self.acquire_remote(url, &self.config.remote),
            None => list_directory(&self.config.input_dir),
        }
    }

    fn acquire_remote(&self, url: &str, remote: &RemoteConfig) -> Result<Vec<InputItem>, InputError> {
        let signature = remote
            .signature
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| InputError::MissingCredentials("no signature for encrypted input".to_string()))?;

        let fetcher = self
            .fetcher
            .as_deref()
            .ok_or_else(|| InputError::Download("no blob fetcher available".to_string()))?;

        info!("Downloading encrypted contribution from {}", url);
        let blob = fetcher.fetch(url)?;
        let bytes = self.decryptor.decrypt(&blob, signature)?;
        debug!("Decrypted {} bytes into {} bytes", blob.len(), bytes.len());

        Ok(vec![InputItem::Blob {
            name: blob_name(url),
            bytes,
        }])
    }

    // ------------------------------------------------------------------------
    // Per-file processing
    // ------------------------------------------------------------------------

    fn process_item(&self, run: &mut ProofRun, item: InputItem) {
        let name = item.name();

        let table = match item.load() {
            Ok(table) => table,
            Err(e) => {
                run.record(ContributionError::CsvRead(format!("{}: {:#}", name, e)));
                return;
            }
        };

        let scoring = &self.config.scoring;
        if table.row_count() < scoring.min_rows || table.column_count() < scoring.min_columns {
            run.record(ContributionError::CsvTooSmall {
                name,
                rows: table.row_count(),
                cols: table.column_count(),
            });
            return;
        }

        let classification = self.classifier.classify(&table.header_set());
        if !classification.class.is_recognized() {
            run.record(ContributionError::UnrecognisedStructure);
            return;
        }

        let duplicates = detect_new_rows(table.row_hashes(), &mut run.detector);
        let breakdown = self.scorer.score(&table, classification.class, &duplicates);

        info!(
            "{}: {} ({}/{} reference columns), {} rows, {} new, {}",
            name,
            classification.class.file_type(),
            classification.matched,
            classification.reference_size,
            duplicates.total_rows,
            duplicates.new_rows,
            breakdown.summary()
        );

        let metrics = FileMetrics {
            row_count: duplicates.total_rows,
            new_row_count: duplicates.new_rows,
            duplicate_row_count: duplicates.duplicate_rows,
            uniqueness_ratio: round3(duplicates.uniqueness_ratio),
            non_null_ratio: breakdown.non_null_ratio,
            volume_bonus: breakdown.volume_bonus,
            recency_bonus: breakdown.recency_bonus,
            quality: breakdown.quality,
            columns: table.columns.clone(),
            bytes: table.byte_size,
            file_type: classification.class.file_type().to_string(),
        };

        run.files.insert(name, metrics);
    }
}

/// *.csv entries of `dir`, sorted by name so runs are reproducible
fn list_directory(dir: &Path) -> Result<Vec<InputItem>, InputError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| InputError::Location(format!("{}: {}", dir.display(), e)))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| InputError::Location(format!("{}: {}", dir.display(), e)))?
            .path();

        if is_csv(&path) {
            paths.push(path);
        } else {
            debug!("Skipping non-CSV entry {}", path.display());
        }
    }

    paths.sort();
    Ok(paths.into_iter().map(InputItem::File).collect())
}

#[cfg(feature = "remote")]
fn default_fetcher(remote: &RemoteConfig) -> Option<Box<dyn BlobFetcher>> {
    use crate::collaborators::HttpBlobFetcher;
    let timeout = std::time::Duration::from_secs(remote.timeout_secs);
    Some(Box::new(HttpBlobFetcher::new(timeout)))
}

#[cfg(not(feature = "remote"))]
fn default_fetcher(_remote: &RemoteConfig) -> Option<Box<dyn BlobFetcher>> {
    None
}

// ============================================================================
// TESTS
// ============================================================================
