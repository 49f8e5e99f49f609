//! # Index Module
//!
//! In-memory index of the destination directory: content fingerprint to
//! filename and filename to fingerprint. Built once at startup by
//! fingerprinting every existing regular file directly under the
//! destination, then mutated as files merge. The index is discarded at
//! process end; the directory itself is the durable state.
//!
//! Invariant: within a run, each filename maps to exactly one
//! fingerprint and vice versa, so no destination file is ever
//! overwritten.

use crate::core::digest::{fingerprint_file, ContentFingerprint};
use crate::core::scanner::ExtensionFilter;
use crate::error::{IndexError, SetupError};
use crate::events::{Event, EventSender, IndexEvent};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Bidirectional fingerprint/filename index of the destination directory
pub struct DestinationIndex {
    by_fingerprint: HashMap<ContentFingerprint, String>,
    by_name: HashMap<String, ContentFingerprint>,
}

impl DestinationIndex {
    /// An empty index, for tests and fresh destinations
    pub fn empty() -> Self {
        Self {
            by_fingerprint: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Build the index by fingerprinting existing destination files.
    ///
    /// Only regular files directly under `dest_dir` whose extension
    /// passes the filter are considered. Files that cannot be read are
    /// left out with a warning. Entries are processed in filename order
    /// so that when the destination already holds identical content
    /// under several names, the fingerprint lookup answer is
    /// deterministic across runs.
    pub fn build(
        dest_dir: &Path,
        filter: &ExtensionFilter,
        events: &EventSender,
    ) -> Result<Self, SetupError> {
        if !dest_dir.is_dir() {
            return Err(SetupError::DestinationNotFound {
                path: dest_dir.to_path_buf(),
            });
        }

        events.send(Event::Index(IndexEvent::Started {
            dest_dir: dest_dir.to_path_buf(),
        }));

        let mut paths = Vec::new();
        let entries = std::fs::read_dir(dest_dir).map_err(|e| SetupError::DestinationUnreadable {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| SetupError::DestinationUnreadable {
                path: dest_dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && filter.should_include(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        // Hash the existing library in parallel; insertion stays ordered
        let fingerprints: Vec<_> = paths
            .par_iter()
            .map(|path| (path, fingerprint_file(path)))
            .collect();

        let mut index = Self::empty();
        for (path, result) in fingerprints {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            match result {
                Ok(fp) => {
                    index.by_fingerprint.entry(fp).or_insert_with(|| name.clone());
                    index.by_name.insert(name.clone(), fp);
                    events.send(Event::Index(IndexEvent::FileIndexed { name }));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not fingerprint existing file");
                    events.send(Event::Index(IndexEvent::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                }
            }
        }

        debug!(files = index.by_name.len(), "destination index built");
        events.send(Event::Index(IndexEvent::Completed {
            total_files: index.by_name.len(),
        }));

        Ok(index)
    }

    /// Filename of an existing destination file with this content, if any
    pub fn find_by_fingerprint(&self, fingerprint: &ContentFingerprint) -> Option<&str> {
        self.by_fingerprint.get(fingerprint).map(|s| s.as_str())
    }

    /// Fingerprint reserved under this filename, if any
    pub fn find_by_name(&self, name: &str) -> Option<&ContentFingerprint> {
        self.by_name.get(name)
    }

    /// Reserve a filename for a fingerprint, inserting both mappings.
    ///
    /// Reserving a name already held by a *different* fingerprint is an
    /// internal-consistency fault and fails; callers log it and skip the
    /// file.
    pub fn reserve(
        &mut self,
        name: &str,
        fingerprint: ContentFingerprint,
    ) -> Result<(), IndexError> {
        match self.by_name.get(name) {
            Some(existing) if *existing != fingerprint => Err(IndexError::NameCollision {
                name: name.to_string(),
            }),
            _ => {
                self.by_name.insert(name.to_string(), fingerprint);
                self.by_fingerprint
                    .entry(fingerprint)
                    .or_insert_with(|| name.to_string());
                Ok(())
            }
        }
    }

    /// Roll back a reservation after a failed copy, so a later run (or a
    /// later candidate) can claim the name again.
    pub fn release(&mut self, name: &str) {
        if let Some(fp) = self.by_name.remove(name) {
            if self.by_fingerprint.get(&fp).map(|n| n.as_str()) == Some(name) {
                self.by_fingerprint.remove(&fp);
            }
        }
    }

    /// Number of filenames currently reserved
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn fp(byte: u8) -> ContentFingerprint {
        ContentFingerprint::from_bytes([byte; 32])
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(content).unwrap();
    }

    #[test]
    fn reserve_and_lookup_both_ways() {
        let mut index = DestinationIndex::empty();
        index.reserve("a.jpg", fp(1)).unwrap();

        assert_eq!(index.find_by_fingerprint(&fp(1)), Some("a.jpg"));
        assert_eq!(index.find_by_name("a.jpg"), Some(&fp(1)));
        assert_eq!(index.find_by_name("b.jpg"), None);
    }

    #[test]
    fn reserving_taken_name_with_other_content_fails() {
        let mut index = DestinationIndex::empty();
        index.reserve("a.jpg", fp(1)).unwrap();

        let result = index.reserve("a.jpg", fp(2));
        assert!(matches!(result, Err(IndexError::NameCollision { .. })));
        // Original mapping untouched
        assert_eq!(index.find_by_name("a.jpg"), Some(&fp(1)));
    }

    #[test]
    fn release_rolls_back_both_mappings() {
        let mut index = DestinationIndex::empty();
        index.reserve("a.jpg", fp(1)).unwrap();
        index.release("a.jpg");

        assert_eq!(index.find_by_name("a.jpg"), None);
        assert_eq!(index.find_by_fingerprint(&fp(1)), None);
        assert!(index.is_empty());

        // The name is claimable again
        index.reserve("a.jpg", fp(2)).unwrap();
    }

    #[test]
    fn release_keeps_primary_name_for_shared_content() {
        let mut index = DestinationIndex::empty();
        index.reserve("a.jpg", fp(1)).unwrap();
        index.reserve("b.jpg", fp(1)).unwrap();

        // a.jpg is the primary name for fp(1); dropping b must not lose it
        index.release("b.jpg");
        assert_eq!(index.find_by_fingerprint(&fp(1)), Some("a.jpg"));
    }

    #[test]
    fn build_indexes_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "one.jpg", b"first");
        write_file(temp_dir.path(), "two.png", b"second");
        write_file(temp_dir.path(), "notes.txt", b"not a photo");

        let index = DestinationIndex::build(
            temp_dir.path(),
            &ExtensionFilter::new(),
            &null_sender(),
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        assert!(index.find_by_name("one.jpg").is_some());
        assert!(index.find_by_name("two.png").is_some());
        assert!(index.find_by_name("notes.txt").is_none());
    }

    #[test]
    fn build_ignores_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "top.jpg", b"top");
        let sub = temp_dir.path().join("2023");
        std::fs::create_dir(&sub).unwrap();
        write_file(&sub, "nested.jpg", b"nested");

        let index = DestinationIndex::build(
            temp_dir.path(),
            &ExtensionFilter::new(),
            &null_sender(),
        )
        .unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.find_by_name("top.jpg").is_some());
    }

    #[test]
    fn build_missing_directory_is_fatal() {
        let result = DestinationIndex::build(
            Path::new("/nonexistent/library"),
            &ExtensionFilter::new(),
            &null_sender(),
        );
        assert!(matches!(
            result,
            Err(SetupError::DestinationNotFound { .. })
        ));
    }

    #[test]
    fn duplicate_content_keeps_first_name_sorted() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "zebra.jpg", b"same");
        write_file(temp_dir.path(), "apple.jpg", b"same");

        let index = DestinationIndex::build(
            temp_dir.path(),
            &ExtensionFilter::new(),
            &null_sender(),
        )
        .unwrap();

        let fp = *index.find_by_name("apple.jpg").unwrap();
        assert_eq!(index.find_by_fingerprint(&fp), Some("apple.jpg"));
    }
}
