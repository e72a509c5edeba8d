//! Perceptual image hashing.
//!
//! [`PerceptualHasher`] decodes an image and hashes its pixels, so the key
//! survives re-encoding and small edits. Only used when the caller opts into
//! image comparison; the file formats are whatever the `image` crate decodes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

use super::{ContentKey, FingerprintError, Fingerprinter};

/// Supported perceptual hashing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualAlgorithm {
    /// aHash (Average Hash) - Mean-based, fast but less resilient.
    #[default]
    Ahash,
    /// dHash (Difference Hash) - Gradient-based, very fast and effective.
    Dhash,
    /// pHash (Perceptual Hash) - DCT-based, most resilient to transformations.
    Phash,
}

impl std::fmt::Display for PerceptualAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phash => write!(f, "pHash"),
            Self::Dhash => write!(f, "dHash"),
            Self::Ahash => write!(f, "aHash"),
        }
    }
}

/// Computes perceptual hashes for images.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    algorithm: PerceptualAlgorithm,
}

impl PerceptualHasher {
    /// Create a new `PerceptualHasher` with the given algorithm.
    pub fn new(algorithm: PerceptualAlgorithm) -> Self {
        let config = match algorithm {
            PerceptualAlgorithm::Phash => HasherConfig::new().hash_alg(HashAlg::Median).preproc_dct(),
            PerceptualAlgorithm::Dhash => HasherConfig::new().hash_alg(HashAlg::Gradient),
            PerceptualAlgorithm::Ahash => HasherConfig::new().hash_alg(HashAlg::Mean),
        };

        Self {
            hasher: config.to_hasher(),
            algorithm,
        }
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> PerceptualAlgorithm {
        self.algorithm
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(PerceptualAlgorithm::Ahash)
    }
}

impl Fingerprinter for PerceptualHasher {
    fn fingerprint(&self, path: &Path) -> Result<ContentKey, FingerprintError> {
        // Open separately so I/O failures keep their kind instead of
        // surfacing as decode errors.
        let file = File::open(path).map_err(|e| FingerprintError::from_io(path, e))?;
        let img = image::ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .map_err(|e| FingerprintError::from_io(path, e))?
            .decode()
            .map_err(|e| FingerprintError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let hash = self.hasher.hash_image(&img);
        Ok(ContentKey::from_bytes(hash.as_bytes()))
    }

    fn name(&self) -> &'static str {
        match self.algorithm {
            PerceptualAlgorithm::Ahash => "ahash",
            PerceptualAlgorithm::Dhash => "dhash",
            PerceptualAlgorithm::Phash => "phash",
        }
    }
}
