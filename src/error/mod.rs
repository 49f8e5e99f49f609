//! # Error Module
//!
//! User-friendly error types for the photo merger.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Fatal vs recoverable** - setup failures abort the run; per-file
//!   failures are logged to the conflict log and the run continues
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprinting error: {0}")]
    Digest(#[from] DigestError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Destination index error: {0}")]
    Index(#[from] IndexError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Fatal errors detected before any file is processed
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Destination directory not found: {path}")]
    DestinationNotFound { path: PathBuf },

    #[error("Failed to read destination directory {path}: {source}")]
    DestinationUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open conflict log {path}: {source}")]
    ConflictLogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while enumerating source files.
///
/// Unreadable entries inside a source tree are skipped, not raised;
/// only a missing root is worth refusing the run for.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
}

/// Errors that occur while fingerprinting file content
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Failed to read {path} while hashing: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a valid fingerprint: {value}")]
    InvalidFingerprint { value: String },
}

/// Errors from the processed-file ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to open ledger file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the in-memory destination index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Filename {name} is already reserved by a different photo")]
    NameCollision { name: String },
}

/// Errors from the physical copy step
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Failed to copy {source_path} to {dest_path}: {source}")]
    Io {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_includes_path() {
        let error = SetupError::DestinationNotFound {
            path: PathBuf::from("/photos/library"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/library"));
    }

    #[test]
    fn digest_error_includes_path_and_cause() {
        let error = DigestError::Io {
            path: PathBuf::from("/photos/broken.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated read"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("truncated read"));
    }

    #[test]
    fn name_collision_names_the_file() {
        let error = IndexError::NameCollision {
            name: "IMG_0001.jpg".to_string(),
        };
        assert!(error.to_string().contains("IMG_0001.jpg"));
    }

    #[test]
    fn copy_error_includes_both_paths() {
        let error = CopyError::Io {
            source_path: PathBuf::from("/src/a.jpg"),
            dest_path: PathBuf::from("/dest/a.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/src/a.jpg"));
        assert!(message.contains("/dest/a.jpg"));
    }
}
