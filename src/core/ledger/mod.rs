//! # Ledger Module
//!
//! Persistent record of source files already merged, keyed by content
//! fingerprint. A fingerprint present in the ledger is never reprocessed,
//! even when encountered under a different path or filename in a later
//! run.
//!
//! ## File Format
//! Append-only TSV, one record per line:
//!
//! ```text
//! <hex fingerprint>\t<original source path>\t<RFC 3339 timestamp>
//! ```
//!
//! Unknown trailing fields are ignored so future versions can extend
//! records. A truncated or garbled trailing line is discarded on load,
//! never fatal. Each record is flushed before the next file is
//! processed, so a crash loses at most the record in flight.

use crate::core::digest::ContentFingerprint;
use crate::error::LedgerError;
use chrono::Utc;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Append-only, monotonically growing record of merged fingerprints
pub struct ProcessedLedger {
    seen: HashSet<ContentFingerprint>,
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ProcessedLedger {
    /// Open a ledger file, creating it (and parent directories) if absent.
    ///
    /// All prior records are loaded for O(1) `seen` lookups. Malformed
    /// lines are discarded with a warning rather than aborting startup.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LedgerError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let mut seen = HashSet::new();
        if path.exists() {
            let mut contents = String::new();
            File::open(path)
                .and_then(|mut f| f.read_to_string(&mut contents))
                .map_err(|e| LedgerError::Open {
                    path: path.to_path_buf(),
                    source: e,
                })?;

            for (lineno, line) in contents.lines().enumerate() {
                let line = line.trim_end_matches('\r');
                if line.is_empty() {
                    continue;
                }
                // First field is the fingerprint; anything after the
                // second tab is tolerated for forward compatibility
                let field = line.split('\t').next().unwrap_or("");
                match ContentFingerprint::from_hex(field) {
                    Ok(fp) => {
                        seen.insert(fp);
                    }
                    Err(_) => {
                        warn!(
                            path = %path.display(),
                            line = lineno + 1,
                            "discarding malformed ledger record"
                        );
                    }
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LedgerError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!(path = %path.display(), records = seen.len(), "ledger loaded");

        Ok(Self {
            seen,
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Whether this fingerprint was recorded in this or any prior run
    pub fn seen(&self, fingerprint: &ContentFingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Append a record and flush it to disk before returning.
    pub fn record(
        &mut self,
        fingerprint: ContentFingerprint,
        source_path: &Path,
    ) -> Result<(), LedgerError> {
        let line = format!(
            "{}\t{}\t{}\n",
            fingerprint.to_hex(),
            source_path.display(),
            Utc::now().to_rfc3339(),
        );

        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|e| LedgerError::Append {
                path: self.path.clone(),
                source: e,
            })?;

        self.seen.insert(fingerprint);
        Ok(())
    }

    /// Number of distinct fingerprints recorded
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether any fingerprint has ever been recorded
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fp(byte: u8) -> ContentFingerprint {
        ContentFingerprint::from_bytes([byte; 32])
    }

    #[test]
    fn record_then_seen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.tsv");

        let mut ledger = ProcessedLedger::open(&path).unwrap();
        assert!(!ledger.seen(&fp(1)));

        ledger.record(fp(1), Path::new("/src/a.jpg")).unwrap();
        assert!(ledger.seen(&fp(1)));
        assert!(!ledger.seen(&fp(2)));
    }

    #[test]
    fn records_persist_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.tsv");

        {
            let mut ledger = ProcessedLedger::open(&path).unwrap();
            ledger.record(fp(1), Path::new("/src/a.jpg")).unwrap();
            ledger.record(fp(2), Path::new("/src/b.jpg")).unwrap();
        }

        let ledger = ProcessedLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.seen(&fp(1)));
        assert!(ledger.seen(&fp(2)));
    }

    #[test]
    fn creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/ledger.tsv");

        let ledger = ProcessedLedger::open(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn truncated_trailing_line_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.tsv");

        {
            let mut ledger = ProcessedLedger::open(&path).unwrap();
            ledger.record(fp(1), Path::new("/src/a.jpg")).unwrap();
        }

        // Simulate a crash mid-write: half a fingerprint, no newline
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"0101abcdef").unwrap();
        drop(file);

        let ledger = ProcessedLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.seen(&fp(1)));
    }

    #[test]
    fn unknown_trailing_fields_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.tsv");

        let line = format!(
            "{}\t/src/a.jpg\t2024-01-15T10:00:00+00:00\textra\tfields\n",
            fp(9).to_hex()
        );
        std::fs::write(&path, line).unwrap();

        let ledger = ProcessedLedger::open(&path).unwrap();
        assert!(ledger.seen(&fp(9)));
    }

    #[test]
    fn garbage_file_does_not_abort_startup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.tsv");
        std::fs::write(&path, "not a ledger at all\n\n???\n").unwrap();

        let ledger = ProcessedLedger::open(&path).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn duplicate_records_collapse() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.tsv");

        let mut ledger = ProcessedLedger::open(&path).unwrap();
        ledger.record(fp(3), Path::new("/src/a.jpg")).unwrap();
        ledger.record(fp(3), Path::new("/other/a_copy.jpg")).unwrap();

        assert_eq!(ledger.len(), 1);
    }
}
