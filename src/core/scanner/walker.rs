//! Lazy source enumeration built on walkdir.

use super::filter::ExtensionFilter;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

/// Configuration for source enumeration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extension allow-list (None = default image set)
    pub extensions: Option<Vec<String>>,
    /// Accept video containers in addition to images
    pub include_videos: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: None,
            extensions: None,
            include_videos: false,
        }
    }
}

/// Streams candidate file paths out of one or more source roots.
///
/// The walk is depth-first and lazy; nothing is collected. Unreadable
/// entries are reported through the event channel and skipped.
pub struct SourceWalker {
    config: ScanConfig,
    filter: ExtensionFilter,
}

impl SourceWalker {
    /// Create a new walker with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ExtensionFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        } else if config.include_videos {
            filter = filter.with_videos();
        }

        Self { config, filter }
    }

    /// The filter this walker applies, for reuse when indexing the destination
    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    /// Lazily enumerate candidate files under the given roots, in
    /// deterministic (sorted) per-directory order.
    pub fn candidates<'a>(
        &'a self,
        roots: &'a [PathBuf],
        events: Option<&'a EventSender>,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        if let Some(sender) = events {
            sender.send(Event::Scan(ScanEvent::Started {
                roots: roots.to_vec(),
            }));
        }

        roots.iter().flat_map(move |root| {
            let include_hidden = self.config.include_hidden;
            let mut walk = WalkDir::new(root)
                .follow_links(self.config.follow_symlinks)
                .sort_by_file_name();
            if let Some(depth) = self.config.max_depth {
                walk = walk.max_depth(depth);
            }

            walk.into_iter()
                .filter_entry(move |entry| {
                    // Descend into hidden directories only when configured;
                    // the root itself is always entered
                    if include_hidden || entry.depth() == 0 {
                        return true;
                    }
                    entry
                        .file_name()
                        .to_str()
                        .map(|name| !name.starts_with('.'))
                        .unwrap_or(true)
                })
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => {
                        if !entry.file_type().is_file() {
                            return None;
                        }
                        let path = entry.into_path();
                        if !self.filter.should_include(&path) {
                            return None;
                        }
                        if let Some(sender) = events {
                            sender.send(Event::Scan(ScanEvent::CandidateFound {
                                path: path.clone(),
                            }));
                        }
                        Some(path)
                    }
                    Err(e) => {
                        let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                        warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                        if let Some(sender) = events {
                            sender.send(Event::Scan(ScanEvent::Error {
                                path,
                                message: e.to_string(),
                            }));
                        }
                        None
                    }
                })
        })
    }

    /// Count candidates without materializing them, for progress totals
    pub fn count_candidates(&self, roots: &[PathBuf]) -> usize {
        self.candidates(roots, None).count()
    }
}
