//! # Conflict Module
//!
//! Append-only audit log of every non-trivial merge decision: content
//! duplicates, renames, and per-file failures. One human-readable line
//! per decision, flushed before the next file is processed. Nothing is
//! ever rewritten or deleted.

use crate::error::SetupError;
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What the merge engine decided for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Identical content already stored under another filename; not copied
    DuplicateContent { existing_name: String },
    /// Filename was taken by different content; copied under a new name
    Renamed {
        original_name: String,
        dest_name: String,
    },
    /// The file was skipped because of a per-file failure
    Failed { reason: String },
    /// A filename reservation was refused (internal-consistency fault)
    InternalCollision { name: String },
}

/// One append-only audit record, written once per decision
#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub timestamp: DateTime<Utc>,
    pub source: PathBuf,
    pub outcome: ConflictOutcome,
}

impl ConflictRecord {
    /// Build a record stamped with the current time
    pub fn now(source: &Path, outcome: ConflictOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.to_path_buf(),
            outcome,
        }
    }
}

impl std::fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ts = self.timestamp.to_rfc3339();
        let src = self.source.display();
        match &self.outcome {
            ConflictOutcome::DuplicateContent { existing_name } => {
                write!(
                    f,
                    "{ts}\tduplicate-content\t{src}\tsame photo already stored as {existing_name}"
                )
            }
            ConflictOutcome::Renamed {
                original_name,
                dest_name,
            } => {
                write!(
                    f,
                    "{ts}\trenamed\t{src}\t-> {dest_name}\t{original_name} taken by a different photo"
                )
            }
            ConflictOutcome::Failed { reason } => {
                write!(f, "{ts}\tfailed\t{src}\t{reason}")
            }
            ConflictOutcome::InternalCollision { name } => {
                write!(f, "{ts}\tinternal-collision\t{src}\treservation refused for {name}")
            }
        }
    }
}

/// Append-only writer for the conflict log file
pub struct ConflictLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ConflictLog {
    /// Open the log for appending, creating it (and parents) if absent.
    ///
    /// Failure here is fatal to the run: without an audit log no merge
    /// decision should be made.
    pub fn open(path: &Path) -> Result<Self, SetupError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SetupError::ConflictLogOpen {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SetupError::ConflictLogOpen {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Write a run header so records from different runs are separable
    pub fn begin_run(&mut self, run_id: &str) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "# run {} started {}",
            run_id,
            Utc::now().to_rfc3339()
        )?;
        self.writer.flush()
    }

    /// Append one record and flush it before returning
    pub fn record(&mut self, record: &ConflictRecord) -> std::io::Result<()> {
        writeln!(self.writer, "{record}")?;
        self.writer.flush()
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
