// Netflix-CSV Proof of Contribution - Core Library
// Exposes the proof engine and its building blocks for the CLI and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod table;          // Tabular input + row hashing
pub mod schema;         // Schema classifier
pub mod deduplication;  // Bloom-filter duplicate detector
pub mod temporal;       // Timestamp parsing for recency
pub mod data_quality;   // Quality scorer
pub mod collaborators;  // Lookup / fetch / decrypt capabilities
pub mod response;       // Proof result model
pub mod proof;          // Proof engine (aggregator)

// Re-export commonly used types
pub use config::{
    ProofConfig, RemoteConfig, ScoringConfig, BloomConfig, LoggingConfig,
    VIEWING_REQUIRED, BILLING_REQUIRED, REQUIRED_THRESHOLD, PROOF_THRESHOLD, SCHEMA_TYPE,
};
pub use error::{ContributionError, InputError};
pub use table::{TabularInput, hash_row, stringify_row};
pub use schema::{SchemaClassifier, FileClass, Classification};
pub use deduplication::{DuplicateDetector, DetectorStats, DuplicateStats, detect_new_rows};
pub use data_quality::{QualityScorer, QualityBreakdown};
pub use collaborators::{
    DuplicateCountLookup, BlobFetcher, Decryptor,
    StaticCountLookup, AesGcmDecryptor,
};
#[cfg(feature = "remote")]
pub use collaborators::HttpBlobFetcher;
pub use response::{ProofResponse, ProofAttributes, ProofMetadata, FileMetrics};
pub use proof::{ProofEngine, RunStage, ScoreCard, InputItem, composite_score};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
