//! # Scanner Module
//!
//! Enumerates candidate files in source directory trees.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - Canon RAW (.cr2)
//! - HEIC (.heic, .heif) - iPhone photos
//! - WebP, GIF, BMP, TIFF
//! - Video (.mp4, .mov, .avi, .mkv) when enabled
//!
//! Enumeration is lazy: candidates stream out of the walker one at a
//! time, so arbitrarily large source trees never sit in memory.
//!
//! ## Example
//! ```rust,ignore
//! use photo_merger::core::scanner::{ScanConfig, SourceWalker};
//!
//! let walker = SourceWalker::new(ScanConfig::default());
//! for path in walker.candidates(&["/media/card".into()], None) {
//!     println!("{}", path.display());
//! }
//! ```

mod filter;
mod walker;

pub use filter::ExtensionFilter;
pub use walker::{ScanConfig, SourceWalker};

use serde::{Deserialize, Serialize};

/// File format families, detected from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Heic,
    Gif,
    Bmp,
    Tiff,
    Cr2,
    Video,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::WebP,
            "heic" | "heif" => ImageFormat::Heic,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            "tiff" | "tif" => ImageFormat::Tiff,
            "cr2" => ImageFormat::Cr2,
            "mp4" | "mov" | "avi" | "mkv" => ImageFormat::Video,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Whether EXIF extraction is worth attempting for this format
    pub fn carries_exif(&self) -> bool {
        matches!(
            self,
            ImageFormat::Jpeg
                | ImageFormat::Png
                | ImageFormat::WebP
                | ImageFormat::Heic
                | ImageFormat::Tiff
                | ImageFormat::Cr2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn image_format_from_extension_lowercase() {
        assert_eq!(ImageFormat::from_extension("jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("cr2"), ImageFormat::Cr2);
        assert_eq!(ImageFormat::from_extension("heic"), ImageFormat::Heic);
    }

    #[test]
    fn image_format_from_extension_uppercase() {
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("HEIC"), ImageFormat::Heic);
        assert_eq!(ImageFormat::from_extension("MOV"), ImageFormat::Video);
    }

    #[test]
    fn unknown_extension_returns_unknown() {
        assert_eq!(ImageFormat::from_extension("txt"), ImageFormat::Unknown);
        assert_eq!(ImageFormat::from_extension("pdf"), ImageFormat::Unknown);
    }

    #[test]
    fn from_path_uses_the_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/photos/IMG_0001.CR2")),
            ImageFormat::Cr2
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/photos/no_extension")),
            ImageFormat::Unknown
        );
    }

    #[test]
    fn videos_do_not_carry_exif() {
        assert!(ImageFormat::Jpeg.carries_exif());
        assert!(!ImageFormat::Video.carries_exif());
        assert!(!ImageFormat::Gif.carries_exif());
    }
}
