//! # photo-merge CLI
//!
//! Command-line interface for the photo merger.
//!
//! ## Usage
//! ```bash
//! photo-merge merge ~/Camera ~/Downloads/phone-dump --dest ~/Photos
//! photo-merge merge ~/Camera --dest ~/Photos --include-videos --output json
//! ```

mod cli;

use photo_merger::Result;

fn main() -> Result<()> {
    cli::run()
}
