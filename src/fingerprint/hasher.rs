//! Byte-level file hasher with streaming support.
//!
//! # Overview
//! [`ByteHasher`] reads files in fixed [`BLOCK_SIZE`] chunks, so memory use
//! stays constant regardless of file size. Any single byte change produces a
//! different key.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ContentKey, FingerprintError, Fingerprinter};

/// Read buffer size for streaming hashes (64 KiB).
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Digest algorithm used by [`ByteHasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3, 256-bit output.
    #[default]
    Blake3,
    /// SHA-256.
    Sha256,
    /// MD5, matching keys already stored by earlier copy runs.
    Md5,
}

enum State {
    Blake3(Box<blake3::Hasher>),
    Sha256(Sha256),
    Md5(md5::Context),
}

impl State {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Md5 => Self::Md5(md5::Context::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(chunk);
            }
            Self::Sha256(h) => h.update(chunk),
            Self::Md5(h) => h.consume(chunk),
        }
    }

    fn finish(self) -> ContentKey {
        match self {
            Self::Blake3(h) => ContentKey::from_bytes(h.finalize().as_bytes()),
            Self::Sha256(h) => ContentKey::from_bytes(&h.finalize()),
            Self::Md5(h) => ContentKey::from_bytes(&h.compute().0),
        }
    }
}

/// Streaming hasher over raw file bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteHasher {
    algorithm: HashAlgorithm,
}

impl ByteHasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The digest algorithm in use.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash everything readable from `reader`, one block at a time.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentKey> {
        let mut state = State::new(self.algorithm);
        let mut buffer = vec![0u8; BLOCK_SIZE];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
        }

        Ok(state.finish())
    }

    /// Hash an in-memory byte slice.
    #[must_use]
    pub fn hash_bytes(&self, bytes: &[u8]) -> ContentKey {
        let mut state = State::new(self.algorithm);
        state.update(bytes);
        state.finish()
    }
}

impl Fingerprinter for ByteHasher {
    fn fingerprint(&self, path: &Path) -> Result<ContentKey, FingerprintError> {
        let file = File::open(path).map_err(|e| FingerprintError::from_io(path, e))?;
        let key = self
            .hash_reader(file)
            .map_err(|e| FingerprintError::from_io(path, e))?;
        log::trace!("{} {} {}", self.name(), key, path.display());
        Ok(key)
    }

    fn name(&self) -> &'static str {
        match self.algorithm {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Md5 => "md5",
        }
    }
}
