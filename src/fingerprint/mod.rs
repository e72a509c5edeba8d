//! Content fingerprinting.
//!
//! A fingerprint is a stable, comparable [`ContentKey`] derived from a file.
//! Equal content always yields equal keys. Two interchangeable strategies exist:
//!
//! - [`hasher`]: byte-level digest over the raw file bytes (BLAKE3 or SHA-256)
//! - [`perceptual`]: perceptual hash over decoded image pixels
//!
//! The engine only sees the [`Fingerprinter`] trait, so it never depends on
//! which strategy is plugged in.
//!
//! # Example
//!
//! ```no_run
//! use dupemirror::fingerprint::{Fingerprinter, Strategy};
//! use std::path::Path;
//!
//! let fingerprinter = Strategy::Blake3.build();
//! let key = fingerprinter.fingerprint(Path::new("photo.jpg")).unwrap();
//! println!("{key}");
//! ```

pub mod hasher;
pub mod perceptual;

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use hasher::{ByteHasher, HashAlgorithm, BLOCK_SIZE};
pub use perceptual::{PerceptualAlgorithm, PerceptualHasher};

/// Deterministic fingerprint of file content, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Build a key from raw digest bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(to_hex(bytes))
    }

    /// Parse a key from a hex string, normalizing to lowercase.
    ///
    /// Returns `None` for empty input or non-hex characters.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    /// The hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lowercase hex encoding.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// A function from file content to a [`ContentKey`].
pub trait Fingerprinter {
    /// Compute the key for the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] if the file cannot be opened, read or decoded.
    fn fingerprint(&self, path: &Path) -> Result<ContentKey, FingerprintError>;

    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;
}

/// Errors that can occur while fingerprinting a file.
#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be decoded as an image.
    #[error("Failed to decode image {path}: {message}")]
    Decode {
        /// Path of the undecodable file
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}

impl FingerprintError {
    /// Classify an I/O error by kind.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Fingerprint strategy, chosen by configuration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// BLAKE3 over raw bytes
    #[default]
    Blake3,
    /// SHA-256 over raw bytes
    Sha256,
    /// MD5 over raw bytes
    Md5,
    /// Average hash over decoded pixels
    Ahash,
    /// Difference hash over decoded pixels
    Dhash,
    /// DCT-based perceptual hash over decoded pixels
    Phash,
}

impl Strategy {
    /// Whether this strategy decodes images instead of hashing bytes.
    #[must_use]
    pub fn is_perceptual(self) -> bool {
        matches!(self, Self::Ahash | Self::Dhash | Self::Phash)
    }

    /// Instantiate the fingerprinter for this strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn Fingerprinter> {
        match self {
            Self::Blake3 => Box::new(ByteHasher::new(HashAlgorithm::Blake3)),
            Self::Sha256 => Box::new(ByteHasher::new(HashAlgorithm::Sha256)),
            Self::Md5 => Box::new(ByteHasher::new(HashAlgorithm::Md5)),
            Self::Ahash => Box::new(PerceptualHasher::new(PerceptualAlgorithm::Ahash)),
            Self::Dhash => Box::new(PerceptualHasher::new(PerceptualAlgorithm::Dhash)),
            Self::Phash => Box::new(PerceptualHasher::new(PerceptualAlgorithm::Phash)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
            Self::Ahash => "ahash",
            Self::Dhash => "dhash",
            Self::Phash => "phash",
        };
        f.write_str(name)
    }
}
