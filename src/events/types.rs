//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the merge engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source enumeration events
    Scan(ScanEvent),
    /// Destination index build events
    Index(IndexEvent),
    /// Per-file merge decision events
    Merge(MergeEvent),
    /// Run-level events
    Run(RunEvent),
}

/// Events while enumerating source files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Enumeration has started
    Started { roots: Vec<PathBuf> },
    /// A candidate file was found
    CandidateFound { path: PathBuf },
    /// An entry could not be read; enumeration continues
    Error { path: PathBuf, message: String },
}

/// Events while fingerprinting the existing destination directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Index build has started
    Started { dest_dir: PathBuf },
    /// An existing destination file was fingerprinted
    FileIndexed { name: String },
    /// An existing file could not be fingerprinted and was left out
    Error { path: PathBuf, message: String },
    /// Index build completed
    Completed { total_files: usize },
}

/// Per-file merge outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MergeEvent {
    /// Merging has started
    Started { total_candidates: Option<usize> },
    /// Progress update
    Progress(MergeProgress),
    /// File was copied under its own basename
    Copied { source: PathBuf, dest_name: String },
    /// File was copied under a capture-date name after a filename collision
    Renamed {
        source: PathBuf,
        original_name: String,
        dest_name: String,
    },
    /// Identical content already exists in the destination; nothing copied
    DuplicateContent { source: PathBuf, existing_name: String },
    /// Fingerprint was recorded by a prior run; nothing copied
    AlreadyProcessed { source: PathBuf },
    /// The file failed and was skipped; the run continues
    Failed { source: PathBuf, message: String },
}

/// Progress information during merging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeProgress {
    /// Number of candidates evaluated so far
    pub completed: usize,
    /// Total number of candidates, when pre-counted
    pub total: usize,
    /// Current file being evaluated
    pub current_path: PathBuf,
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// Run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: MergePhase },
    /// Run completed
    Completed { summary: MergeSummary },
}

/// Phases of a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePhase {
    /// Fingerprinting the existing destination directory
    Indexing,
    /// Evaluating and copying source files
    Merging,
}

/// Summary of a completed merge run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Unique id for this run, also stamped into the conflict log
    pub run_id: String,
    /// Candidates evaluated
    pub candidates: usize,
    /// Files copied under their own name
    pub copied: usize,
    /// Files copied under a capture-date name
    pub renamed: usize,
    /// Files skipped because identical content already existed
    pub duplicate_content: usize,
    /// Files skipped because the ledger had seen them in a prior run
    pub already_processed: usize,
    /// Files skipped due to per-file failures
    pub failed: usize,
    /// Bytes physically copied
    pub bytes_copied: u64,
    /// Files already present in the destination before the run
    pub destination_preexisting: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl MergeSummary {
    /// Total number of files that landed in the destination this run
    pub fn files_written(&self) -> usize {
        self.copied + self.renamed
    }
}

impl std::fmt::Display for MergePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergePhase::Indexing => write!(f, "Indexing destination"),
            MergePhase::Merging => write!(f, "Merging"),
        }
    }
}
