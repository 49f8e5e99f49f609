//! # Capture Module
//!
//! Resolves a best-effort capture timestamp for a file.
//!
//! ## Policy
//! Format-appropriate metadata readers are tried in order; the first one
//! that produces a parseable date wins. When no reader succeeds the
//! filesystem modification time is used. Resolution **never fails** - a
//! missing or corrupt timestamp only affects the rename suffix, never
//! whether a file merges.
//!
//! The timestamp is used only as a renaming input, never for identity.

use crate::core::scanner::ImageFormat;
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// A pluggable capture-time reader for one format family.
///
/// Implementations return `None` on any failure; the resolver moves on
/// to the next reader in the chain.
pub trait CaptureTimeReader: Send + Sync {
    /// Attempt to read an embedded capture timestamp
    fn read_capture_time(&self, path: &Path, format: ImageFormat) -> Option<NaiveDateTime>;
}

/// Reads EXIF `DateTimeOriginal`, falling back to `DateTime`.
///
/// Covers JPEG, TIFF-based RAW, HEIC, PNG, and WebP containers.
pub struct ExifReader;

impl CaptureTimeReader for ExifReader {
    fn read_capture_time(&self, path: &Path, format: ImageFormat) -> Option<NaiveDateTime> {
        if !format.carries_exif() {
            return None;
        }

        let file = File::open(path).ok()?;
        let mut bufreader = BufReader::new(&file);
        let exif_reader = Reader::new().read_from_container(&mut bufreader).ok()?;

        for tag in [Tag::DateTimeOriginal, Tag::DateTime] {
            if let Some(field) = exif_reader.get_field(tag, In::PRIMARY) {
                if let Some(ts) = parse_exif_datetime(&field.value) {
                    return Some(ts);
                }
            }
        }
        None
    }
}

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(value: &Value) -> Option<NaiveDateTime> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        return NaiveDateTime::parse_from_str(s.trim(), "%Y:%m:%d %H:%M:%S").ok();
    }
    None
}

/// Resolves capture timestamps through an ordered reader chain with a
/// filesystem-mtime fallback.
pub struct CaptureTimeResolver {
    readers: Vec<Box<dyn CaptureTimeReader>>,
}

impl CaptureTimeResolver {
    /// Create a resolver with the default reader chain (EXIF only)
    pub fn new() -> Self {
        Self {
            readers: vec![Box::new(ExifReader)],
        }
    }

    /// Append a reader to the chain; earlier readers win
    pub fn with_reader(mut self, reader: Box<dyn CaptureTimeReader>) -> Self {
        self.readers.push(reader);
        self
    }

    /// Resolve a timestamp for the file. Never fails: reader misses fall
    /// back to mtime, and an unreadable mtime degrades to the Unix epoch.
    pub fn resolve(&self, path: &Path, format: ImageFormat) -> NaiveDateTime {
        for reader in &self.readers {
            if let Some(ts) = reader.read_capture_time(path, format) {
                trace!(path = %path.display(), %ts, "capture time from metadata");
                return ts;
            }
        }

        modified_time(path).unwrap_or_else(|| {
            trace!(path = %path.display(), "no usable timestamp, using epoch");
            NaiveDateTime::UNIX_EPOCH
        })
    }
}

impl Default for CaptureTimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Filesystem modification time in local time
fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

/// Format a timestamp as the YYYYMMDD stamp used in renamed filenames
pub fn date_stamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y%m%d").to_string()
}
