//! Mirror copying of first-seen files.
//!
//! A source path is re-rooted under the destination by dropping its root
//! (and drive prefix on Windows): `/a/b/c.jpg` under `/out` becomes
//! `/out/a/b/c.jpg`. Paths containing `..` are rejected so a target can never
//! land outside the destination root.
//!
//! Bytes are written to a temporary file in the target directory and then
//! renamed over the target, so a failed copy never leaves a truncated file
//! behind. An existing target is overwritten.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;

use crate::fingerprint::BLOCK_SIZE;

/// Errors that can occur while mirroring a file.
#[derive(thiserror::Error, Debug)]
pub enum MirrorError {
    /// The source contains a parent-directory component.
    #[error("Refusing to mirror {0}: path escapes the destination root")]
    Escapes(PathBuf),

    /// The source has no file components left after dropping its root.
    #[error("Nothing to mirror for {0}")]
    EmptyRelative(PathBuf),

    /// A parent directory of the target could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The source could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Source path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The target could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Target path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// A completed mirror copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOutcome {
    /// Where the file was written
    pub target: PathBuf,
    /// Bytes copied
    pub bytes: u64,
}

/// Compute where `source` lands under `destination_root`.
///
/// # Errors
///
/// Returns [`MirrorError::Escapes`] for paths containing `..` and
/// [`MirrorError::EmptyRelative`] for a bare root.
pub fn mirror_target(source: &Path, destination_root: &Path) -> Result<PathBuf, MirrorError> {
    let mut relative = PathBuf::new();

    for component in source.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => return Err(MirrorError::Escapes(source.to_path_buf())),
            Component::Normal(part) => relative.push(part),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(MirrorError::EmptyRelative(source.to_path_buf()));
    }

    Ok(destination_root.join(relative))
}

/// Copy `source` to its mirrored location under `destination_root`.
///
/// Missing parent directories are created; existing ones are fine.
///
/// # Errors
///
/// Returns [`MirrorError`] if the target cannot be computed, a directory
/// cannot be created, or the copy fails.
pub fn mirror(source: &Path, destination_root: &Path) -> Result<MirrorOutcome, MirrorError> {
    let target = mirror_target(source, destination_root)?;
    // mirror_target always yields at least one component under the root.
    let parent = target.parent().unwrap_or(destination_root);

    fs::create_dir_all(parent).map_err(|source| MirrorError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let bytes = copy_atomically(source, parent, &target)?;
    log::debug!("Mirrored {} -> {} ({bytes} bytes)", source.display(), target.display());

    Ok(MirrorOutcome { target, bytes })
}

fn copy_atomically(source: &Path, parent: &Path, target: &Path) -> Result<u64, MirrorError> {
    let read_err = |e| MirrorError::Read {
        path: source.to_path_buf(),
        source: e,
    };
    let write_err = |e| MirrorError::Write {
        path: target.to_path_buf(),
        source: e,
    };

    let mut reader = File::open(source).map_err(read_err)?;
    let permissions = reader.metadata().map_err(read_err)?.permissions();
    let temp = NamedTempFile::new_in(parent).map_err(write_err)?;

    let mut writer = BufWriter::new(temp);
    let mut buffer = vec![0u8; BLOCK_SIZE];
    let mut bytes = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_err(e)),
        };
        writer.write_all(&buffer[..n]).map_err(write_err)?;
        bytes += n as u64;
    }
    writer.flush().map_err(write_err)?;

    let temp = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
    // Temp files are created owner-only; give the target the source's mode.
    temp.as_file().set_permissions(permissions).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(target).map_err(|e| write_err(e.error))?;

    Ok(bytes)
}
