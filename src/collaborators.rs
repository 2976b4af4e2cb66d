// 🔌 Collaborators - capabilities the engine depends on by contract only
//
// Each is a single synchronous call. Implementations own their timeouts;
// the engine turns every failure into a recorded error.

use crate::error::InputError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};

// ============================================================================
// TRAITS
// ============================================================================

/// How many contributions an address has already made
pub trait DuplicateCountLookup: Send + Sync {
    /// `Err` means the lookup was unavailable; the guard is then skipped
    fn contribution_count(&self, owner_address: &str) -> anyhow::Result<u64>;
}

/// Download of an encrypted contribution blob
pub trait BlobFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, InputError>;
}

/// Decryption of a blob with the wallet signature it was encrypted under
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, blob: &[u8], signature: &str) -> Result<Vec<u8>, InputError>;
}

// ============================================================================
// STATIC LOOKUP
// ============================================================================

/// Lookup answered from a count the deployment already knows
pub struct StaticCountLookup {
    count: u64,
}

impl StaticCountLookup {
    pub fn new(count: u64) -> Self {
        StaticCountLookup { count }
    }
}

impl DuplicateCountLookup for StaticCountLookup {
    fn contribution_count(&self, _owner_address: &str) -> anyhow::Result<u64> {
        Ok(self.count)
    }
}

// ============================================================================
// HTTP FETCHER
// ============================================================================

#[cfg(feature = "remote")]
pub struct HttpBlobFetcher {
    agent: ureq::Agent,
}

#[cfg(feature = "remote")]
impl HttpBlobFetcher {
    pub fn new(timeout: std::time::Duration) -> Self {
        HttpBlobFetcher {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

#[cfg(feature = "remote")]
impl BlobFetcher for HttpBlobFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, InputError> {
        use std::io::Read;

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| InputError::Download(e.to_string()))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| InputError::Download(e.to_string()))?;

        Ok(bytes)
    }
}

// ============================================================================
// AES-GCM DECRYPTOR
// ============================================================================

/// Blob framing: 12-byte nonce, then ciphertext with the GCM tag appended
pub const NONCE_LEN: usize = 12;

/// Anything shorter cannot hold a nonce plus a meaningful payload
pub const MIN_BLOB_LEN: usize = 32;

/// AES-256-GCM keyed by SHA-256 of the wallet signature
pub struct AesGcmDecryptor;

impl AesGcmDecryptor {
    pub fn derive_key(signature: &str) -> [u8; 32] {
        Sha256::digest(signature.as_bytes()).into()
    }
}

impl Decryptor for AesGcmDecryptor {
    fn decrypt(&self, blob: &[u8], signature: &str) -> Result<Vec<u8>, InputError> {
        if blob.len() < MIN_BLOB_LEN {
            return Err(InputError::Decryption(format!(
                "encrypted data too short ({} bytes)",
                blob.len()
            )));
        }

        let key = Self::derive_key(signature);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| InputError::Decryption(e.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
