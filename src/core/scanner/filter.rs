//! Extension allow-list filtering for candidate files.

use std::collections::HashSet;
use std::path::Path;

/// Image extensions accepted by default, matching what camera dumps contain
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "cr2", "heic", "heif", "webp", "gif", "bmp", "tiff", "tif",
];

/// Video extensions, opt-in via [`ExtensionFilter::with_videos`]
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Filters files by a case-insensitive extension allow-list
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    /// Lowercased extensions to include
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Create a new filter with the default image extensions
    pub fn new() -> Self {
        Self {
            extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Also accept common video container extensions
    pub fn with_videos(mut self) -> Self {
        self.extensions
            .extend(VIDEO_EXTENSIONS.iter().map(|e| e.to_string()));
        self
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the allow-list entirely; matching stays case-insensitive
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return false;
                }
            }
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_jpeg() {
        let filter = ExtensionFilter::new();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/image.JPEG")));
    }

    #[test]
    fn filter_includes_raw_and_heic() {
        let filter = ExtensionFilter::new();
        assert!(filter.should_include(Path::new("/photos/IMG_1234.CR2")));
        assert!(filter.should_include(Path::new("/photos/IMG_1234.HEIC")));
    }

    #[test]
    fn filter_excludes_videos_by_default() {
        let filter = ExtensionFilter::new();
        assert!(!filter.should_include(Path::new("/photos/clip.mp4")));

        let filter = ExtensionFilter::new().with_videos();
        assert!(filter.should_include(Path::new("/photos/clip.mp4")));
        assert!(filter.should_include(Path::new("/photos/clip.MOV")));
    }

    #[test]
    fn filter_excludes_non_media() {
        let filter = ExtensionFilter::new().with_videos();
        assert!(!filter.should_include(Path::new("/photos/document.pdf")));
        assert!(!filter.should_include(Path::new("/photos/notes.txt")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = ExtensionFilter::new();
        assert!(!filter.should_include(Path::new("/photos/.hidden.jpg")));
    }

    #[test]
    fn filter_can_include_hidden() {
        let filter = ExtensionFilter::new().with_hidden(true);
        assert!(filter.should_include(Path::new("/photos/.hidden.jpg")));
    }

    #[test]
    fn override_strips_leading_dots() {
        let filter =
            ExtensionFilter::new().with_extensions(vec![".PNG".to_string(), "dng".to_string()]);
        assert!(filter.should_include(Path::new("/photos/a.png")));
        assert!(filter.should_include(Path::new("/photos/a.DNG")));
        assert!(!filter.should_include(Path::new("/photos/a.jpg")));
    }

    #[test]
    fn filter_handles_no_extension() {
        let filter = ExtensionFilter::new();
        assert!(!filter.should_include(Path::new("/photos/no_extension")));
    }
}
