//! # Digest Module
//!
//! Computes collision-resistant content fingerprints with SHA-256.
//!
//! Two files are considered the same photo iff their fingerprints are
//! equal; filenames, paths, and metadata never participate. Files are
//! streamed through a fixed buffer, so RAW files and videos of any size
//! hash in constant memory.

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Buffer size for streaming hash computation (64KB)
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// A SHA-256 digest of a file's full byte content.
///
/// Immutable once computed; equality means byte-identical content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    /// Wrap a raw digest
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hex-encode, as stored in the ledger
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form used in ledger records
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        let decoded = hex::decode(s).map_err(|_| DigestError::InvalidFingerprint {
            value: s.to_string(),
        })?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| DigestError::InvalidFingerprint {
                value: s.to_string(),
            })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Fingerprint a file by streaming its bytes through SHA-256.
///
/// Deterministic: identical bytes always yield identical fingerprints.
/// An unreadable or partially readable file yields `DigestError::Io`;
/// callers skip the file for this run and continue.
pub fn fingerprint_file(path: &Path) -> Result<ContentFingerprint, DigestError> {
    let file = File::open(path).map_err(|e| DigestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buffer).map_err(|e| DigestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(ContentFingerprint(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn identical_bytes_identical_fingerprints() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "a.jpg", b"same bytes");
        let b = write_file(&temp_dir, "b.jpg", b"same bytes");

        assert_eq!(
            fingerprint_file(&a).unwrap(),
            fingerprint_file(&b).unwrap()
        );
    }

    #[test]
    fn different_bytes_different_fingerprints() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "a.jpg", b"first");
        let b = write_file(&temp_dir, "b.jpg", b"second");

        assert_ne!(
            fingerprint_file(&a).unwrap(),
            fingerprint_file(&b).unwrap()
        );
    }

    #[test]
    fn filename_does_not_affect_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "IMG_0001.jpg", b"payload");
        let b = write_file(&temp_dir, "vacation.png", b"payload");

        assert_eq!(
            fingerprint_file(&a).unwrap(),
            fingerprint_file(&b).unwrap()
        );
    }

    #[test]
    fn known_sha256_vector() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "abc.bin", b"abc");

        assert_eq!(
            fingerprint_file(&path).unwrap().to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn file_larger_than_buffer_streams() {
        let temp_dir = TempDir::new().unwrap();
        let big = vec![0xABu8; HASH_BUFFER_SIZE * 2 + 17];
        let path = write_file(&temp_dir, "big.cr2", &big);

        // Must match a one-shot hash of the same bytes
        let mut hasher = Sha256::new();
        hasher.update(&big);
        let expected = ContentFingerprint::from_bytes(hasher.finalize().into());

        assert_eq!(fingerprint_file(&path).unwrap(), expected);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = fingerprint_file(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(DigestError::Io { .. })));
    }

    #[test]
    fn hex_round_trip() {
        let fp = ContentFingerprint::from_bytes([7u8; 32]);
        let parsed = ContentFingerprint::from_hex(&fp.to_hex()).unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(ContentFingerprint::from_hex("zz").is_err());
        assert!(ContentFingerprint::from_hex("abcd").is_err()); // too short
    }
}
