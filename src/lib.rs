//! # Photo Merger
//!
//! Merges photo collections from multiple source trees into one destination
//! library, without ever copying the same photo twice.
//!
//! ## Core Philosophy
//! - **Never overwrite** - An existing destination file is never replaced or renamed
//! - **Content is identity** - Two files are the same photo iff their bytes hash equal
//! - **Safe to re-run** - A persistent ledger makes repeated merges incremental
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - The merge decision engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{MergeError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
