//! # Core Module
//!
//! The GUI-agnostic merge decision engine.
//!
//! ## Modules
//! - `scanner` - Enumerates candidate files in source trees
//! - `digest` - Computes content fingerprints (SHA-256)
//! - `capture` - Resolves best-effort capture timestamps
//! - `ledger` - Persistent record of already-merged fingerprints
//! - `index` - In-memory index of the destination directory
//! - `conflict` - Append-only audit log of non-trivial decisions
//! - `merge` - Orchestrates the per-file decision policy

pub mod capture;
pub mod conflict;
pub mod digest;
pub mod index;
pub mod ledger;
pub mod merge;
pub mod scanner;

// Re-export commonly used types
pub use capture::CaptureTimeResolver;
pub use conflict::{ConflictLog, ConflictOutcome, ConflictRecord};
pub use digest::ContentFingerprint;
pub use index::DestinationIndex;
pub use ledger::ProcessedLedger;
pub use merge::{MergeConfig, MergeEngine};
pub use scanner::{ImageFormat, ScanConfig};
