// End-to-end proof runs over temporary input directories and fake collaborators

use netflix_proof::{
    BlobFetcher, Decryptor, DuplicateCountLookup, InputError, ProofConfig, ProofEngine,
    StaticCountLookup,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VIEWING_CSV: &str = "Profile Name,Start Time,Duration,Attributes,Title\n\
    Alice,2023-01-15 20:31:12,00:45:10,,Dark: Season 1: Secrets\n\
    Alice,2023-01-16 21:02:44,00:51:03,,Dark: Season 1: Lies\n\
    Bob,2019-11-30 09:15:00,01:02:00,Autoplayed,Narcos: Season 1\n";

const BILLING_CSV: &str = "Profile Name,Transaction Date,Service Period Start Date,Currency,Gross Sale Amt\n\
    Alice,2023-01-01,2023-01-01,USD,15.49\n\
    Alice,2023-02-01,2023-02-01,USD,15.49\n";

// ============================================================================
// FAKES
// ============================================================================

struct FailingLookup;

impl DuplicateCountLookup for FailingLookup {
    fn contribution_count(&self, _owner: &str) -> anyhow::Result<u64> {
        anyhow::bail!("rpc timeout")
    }
}

struct FakeFetcher {
    blob: Result<Vec<u8>, InputError>,
}

impl BlobFetcher for FakeFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, InputError> {
        self.blob.clone()
    }
}

/// "Decrypts" by checking the signature and returning the blob as-is
struct PassthroughDecryptor {
    expected_signature: String,
}

impl Decryptor for PassthroughDecryptor {
    fn decrypt(&self, blob: &[u8], signature: &str) -> Result<Vec<u8>, InputError> {
        if signature == self.expected_signature {
            Ok(blob.to_vec())
        } else {
            Err(InputError::Decryption("signature mismatch".to_string()))
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn input_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn config_for(dir: &Path) -> ProofConfig {
    let mut config = ProofConfig::default();
    config.dlp_id = 13;
    config.input_dir = dir.to_path_buf();
    config.bloom.expected_elements = 10_000;
    config
}

fn remote_config(signature: Option<&str>) -> ProofConfig {
    let mut config = ProofConfig::default();
    config.remote.file_url = Some("https://storage.example/u/ViewingActivity.csv".to_string());
    config.remote.signature = signature.map(|s| s.to_string());
    config.bloom.expected_elements = 10_000;
    config
}

// ============================================================================
// DIRECTORY RUNS
// ============================================================================

#[test]
fn test_valid_viewing_and_billing_contribution() {
    let dir = input_dir(&[
        ("ViewingActivity.csv", VIEWING_CSV),
        ("BillingHistory.csv", BILLING_CSV),
    ]);
    let mut config = config_for(dir.path());
    config.owner_address = Some("0xabc".to_string());

    let response = ProofEngine::new(config).generate();

    assert!(response.valid, "errors: {:?}", response.attributes.errors);
    assert_eq!(response.dlp_id, 13);
    assert_eq!(response.ownership, 1.0);
    assert_eq!(response.uniqueness, 1.0);
    assert_eq!(response.attributes.files.len(), 2);
    assert_eq!(response.metadata.schema_type, "netflix-csv");

    let viewing = &response.attributes.files["ViewingActivity.csv"];
    assert_eq!(viewing.file_type, "netflix-viewing-activity");
    assert_eq!(viewing.row_count, 3);
    assert_eq!(viewing.recency_bonus, 0.10);
    assert_eq!(viewing.bytes, VIEWING_CSV.len() as u64);

    let billing = &response.attributes.files["BillingHistory.csv"];
    assert_eq!(billing.file_type, "netflix-billing-history");
    assert_eq!(billing.recency_bonus, 0.0);

    // Best file wins
    let best = viewing.quality.max(billing.quality);
    assert_eq!(response.quality, best);
    assert!((response.score - (best * 0.6 + 0.3 + 0.1)).abs() < 1e-9);
}

#[test]
fn test_empty_directory() {
    let dir = input_dir(&[]);
    let response = ProofEngine::new(config_for(dir.path())).generate();

    assert!(!response.valid);
    assert_eq!(response.quality, 0.0);
    assert!((response.score - 0.3).abs() < 1e-9);
    assert_eq!(
        response.attributes.errors,
        vec!["NO_VALID_CSV_FILES", "SCORE_BELOW_THRESHOLD"]
    );
}

#[test]
fn test_empty_directory_with_owner_still_below_threshold() {
    let dir = input_dir(&[]);
    let mut config = config_for(dir.path());
    config.owner_address = Some("0xabc".to_string());

    let response = ProofEngine::new(config).generate();
    assert!((response.score - 0.4).abs() < 1e-9);
    assert!(!response.valid);
    assert!(response.has_error("SCORE_BELOW_THRESHOLD"));
}

#[test]
fn test_unrecognised_file_does_not_stop_others() {
    let dir = input_dir(&[
        ("a_random.csv", "foo,bar,baz\n1,2,3\n"),
        ("b_viewing.csv", VIEWING_CSV),
    ]);
    let response = ProofEngine::new(config_for(dir.path())).generate();

    assert_eq!(response.attributes.errors, vec!["UNRECOGNISED_CSV_STRUCTURE"]);
    assert!(!response.valid);
    assert_eq!(response.attributes.files.len(), 1);
    assert!(response.attributes.files.contains_key("b_viewing.csv"));
    assert!(response.quality > 0.0);
}

#[test]
fn test_too_small_and_unreadable_files() {
    let dir = input_dir(&[
        ("a_narrow.csv", "Title,Duration\nNarcos,00:10:00\n"),
        ("b_header_only.csv", "Title,Duration,Start Time\n"),
        ("c_broken.csv", "Title,Duration,Start Time\nA,B,C,D,E\n"),
        ("d_empty.csv", ""),
    ]);
    let response = ProofEngine::new(config_for(dir.path())).generate();
    let errors = &response.attributes.errors;

    assert_eq!(errors[0], "CSV_TOO_SMALL: a_narrow.csv (rows=1, cols=2)");
    assert_eq!(errors[1], "CSV_TOO_SMALL: b_header_only.csv (rows=0, cols=3)");
    assert!(errors[2].starts_with("CSV_READ_ERROR: c_broken.csv"));
    assert!(errors[3].starts_with("CSV_READ_ERROR: d_empty.csv"));
    assert_eq!(errors[4], "NO_VALID_CSV_FILES");
    assert_eq!(errors[5], "SCORE_BELOW_THRESHOLD");
    assert_eq!(errors.len(), 6);
    assert!(response.attributes.files.is_empty());
}

#[test]
fn test_non_csv_entries_are_ignored() {
    let dir = input_dir(&[("notes.txt", "hello"), ("ViewingActivity.CSV", VIEWING_CSV)]);
    let response = ProofEngine::new(config_for(dir.path())).generate();

    assert!(response.valid, "errors: {:?}", response.attributes.errors);
    assert_eq!(response.attributes.files.len(), 1);
}

#[test]
fn test_missing_input_directory_aborts() {
    let dir = input_dir(&[]);
    let config = config_for(&dir.path().join("does-not-exist"));

    let response = ProofEngine::new(config).generate();
    assert!(!response.valid);
    assert_eq!(response.score, 0.0);
    assert_eq!(response.attributes.errors.len(), 1);
    assert!(response.attributes.errors[0].starts_with("INPUT_UNAVAILABLE: input location unreadable"));
}

#[test]
fn test_runs_are_reproducible() {
    let dir = input_dir(&[
        ("ViewingActivity.csv", VIEWING_CSV),
        ("BillingHistory.csv", BILLING_CSV),
        ("junk.csv", "x,y,z\n1,2,3\n"),
    ]);

    let first = ProofEngine::new(config_for(dir.path())).generate();
    let second = ProofEngine::new(config_for(dir.path())).generate();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ============================================================================
// DUPLICATE-CONTRIBUTION GUARD
// ============================================================================

#[test]
fn test_prior_contribution_invalidates_but_still_scores() {
    let dir = input_dir(&[("ViewingActivity.csv", VIEWING_CSV)]);
    let mut config = config_for(dir.path());
    config.owner_address = Some("0xabc".to_string());

    let response = ProofEngine::new(config)
        .with_lookup(StaticCountLookup::new(1))
        .generate();

    assert!(!response.valid);
    assert_eq!(response.attributes.errors, vec!["DUPLICATE_CONTRIBUTION"]);
    assert_eq!(response.attributes.files.len(), 1);
    assert!(response.score >= 0.5);
}

#[test]
fn test_prior_contributions_from_config() {
    let dir = input_dir(&[("ViewingActivity.csv", VIEWING_CSV)]);
    let mut config = config_for(dir.path());
    config.owner_address = Some("0xabc".to_string());
    config.prior_contributions = Some(2);

    let response = ProofEngine::new(config).generate();
    assert!(response.has_error("DUPLICATE_CONTRIBUTION"));
}

#[test]
fn test_guard_skipped_without_owner() {
    let dir = input_dir(&[("ViewingActivity.csv", VIEWING_CSV)]);

    let response = ProofEngine::new(config_for(dir.path()))
        .with_lookup(StaticCountLookup::new(5))
        .generate();

    assert!(!response.has_error("DUPLICATE_CONTRIBUTION"));
    assert_eq!(response.ownership, 0.0);
}

#[test]
fn test_guard_skipped_when_lookup_unavailable() {
    let dir = input_dir(&[("ViewingActivity.csv", VIEWING_CSV)]);
    let mut config = config_for(dir.path());
    config.owner_address = Some("0xabc".to_string());

    let response = ProofEngine::new(config).with_lookup(FailingLookup).generate();

    assert!(response.valid, "errors: {:?}", response.attributes.errors);
}

#[test]
fn test_zero_prior_contributions_passes() {
    let dir = input_dir(&[("ViewingActivity.csv", VIEWING_CSV)]);
    let mut config = config_for(dir.path());
    config.owner_address = Some("0xabc".to_string());

    let response = ProofEngine::new(config)
        .with_lookup(StaticCountLookup::new(0))
        .generate();
    assert!(response.valid);
}

// ============================================================================
// THRESHOLD GATE
// ============================================================================

#[test]
fn test_raised_threshold_rejects_otherwise_clean_run() {
    let dir = input_dir(&[("ViewingActivity.csv", VIEWING_CSV)]);
    let mut config = config_for(dir.path());
    config.scoring.proof_threshold = 0.99;

    let response = ProofEngine::new(config).generate();
    assert!(response.score < 0.99);
    assert!(!response.valid);
    assert_eq!(response.attributes.errors, vec!["SCORE_BELOW_THRESHOLD"]);
}

#[test]
fn test_low_quality_file_fails_threshold() {
    // Mostly empty billing table: 1 of 3 columns filled in one of two rows
    let csv = "Transaction Date,Currency,Gross Sale Amt\n2023-01-01,,\n,,\n";
    let dir = input_dir(&[("BillingHistory.csv", csv)]);
    let response = ProofEngine::new(config_for(dir.path())).generate();

    // non_null = 1/6 → quality = 0.1 + 0.0002 + 0.3 = 0.4 → score = 0.24 + 0.3
    let billing = &response.attributes.files["BillingHistory.csv"];
    assert_eq!(billing.quality, 0.4);
    assert!((response.score - 0.54).abs() < 1e-9);
    assert!(response.valid);
}

// ============================================================================
// REMOTE (ENCRYPTED) INPUT
// ============================================================================

#[test]
fn test_remote_blob_is_processed_as_one_table() {
    let engine = ProofEngine::new(remote_config(Some("0xsig")))
        .with_fetcher(FakeFetcher {
            blob: Ok(VIEWING_CSV.as_bytes().to_vec()),
        })
        .with_decryptor(PassthroughDecryptor {
            expected_signature: "0xsig".to_string(),
        });

    let response = engine.generate();
    assert!(response.valid, "errors: {:?}", response.attributes.errors);
    assert!(response.attributes.files.contains_key("ViewingActivity.csv"));
}

#[test]
fn test_remote_without_signature_aborts() {
    let engine = ProofEngine::new(remote_config(None)).with_fetcher(FakeFetcher {
        blob: Ok(VIEWING_CSV.as_bytes().to_vec()),
    });

    let response = engine.generate();
    assert!(!response.valid);
    assert_eq!(response.attributes.errors.len(), 1);
    assert!(response.attributes.errors[0].starts_with("INPUT_UNAVAILABLE: missing credentials"));
}

#[test]
fn test_remote_download_failure_aborts() {
    let engine = ProofEngine::new(remote_config(Some("0xsig"))).with_fetcher(FakeFetcher {
        blob: Err(InputError::Download("HTTP 503".to_string())),
    });

    let response = engine.generate();
    assert!(!response.valid);
    assert_eq!(
        response.attributes.errors,
        vec!["INPUT_UNAVAILABLE: download failed: HTTP 503"]
    );
    assert!(response.attributes.files.is_empty());
}

#[test]
fn test_remote_decryption_failure_aborts() {
    let engine = ProofEngine::new(remote_config(Some("0xwrong")))
        .with_fetcher(FakeFetcher {
            blob: Ok(VIEWING_CSV.as_bytes().to_vec()),
        })
        .with_decryptor(PassthroughDecryptor {
            expected_signature: "0xsig".to_string(),
        });

    let response = engine.generate();
    assert_eq!(
        response.attributes.errors,
        vec!["INPUT_UNAVAILABLE: decryption failed: signature mismatch"]
    );
}

#[test]
fn test_remote_failure_keeps_duplicate_guard_error() {
    let mut config = remote_config(None);
    config.owner_address = Some("0xabc".to_string());

    let response = ProofEngine::new(config)
        .with_lookup(StaticCountLookup::new(1))
        .generate();

    assert_eq!(response.attributes.errors[0], "DUPLICATE_CONTRIBUTION");
    assert!(response.attributes.errors[1].starts_with("INPUT_UNAVAILABLE"));
}
