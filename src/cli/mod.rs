//! # CLI Module
//!
//! Command-line interface for the photo merger.
//!
//! ## Usage
//! ```bash
//! # Merge two source trees into a library
//! photo-merge merge ~/Camera ~/phone-dump --dest ~/Photos
//!
//! # Include videos, JSON summary
//! photo-merge merge ~/Camera --dest ~/Photos --include-videos --output json
//!
//! # Custom allow-list and ledger location
//! photo-merge merge ~/Camera --dest ~/Photos --extensions jpg,png,dng --ledger /var/lib/merge/ledger.tsv
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_merger::core::conflict::ConflictLog;
use photo_merger::core::ledger::ProcessedLedger;
use photo_merger::core::merge::{default_conflict_log_path, default_ledger_path, MergeEngine};
use photo_merger::core::scanner::ScanConfig;
use photo_merger::error::{Result, ScanError};
use photo_merger::events::{Event, EventChannel, MergeEvent, MergeSummary, RunEvent};
use std::path::{Path, PathBuf};
use std::thread;

/// Photo Merger - One library, every photo exactly once
#[derive(Parser, Debug)]
#[command(name = "photo-merge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge source directory trees into a destination library
    Merge {
        /// Source directories to merge from
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory (must already exist)
        #[arg(short, long)]
        dest: PathBuf,

        /// Comma-separated extension allow-list, overriding the default image set
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Also merge common video containers (.mp4, .mov, .avi, .mkv)
        #[arg(long)]
        include_videos: bool,

        /// Ledger file path (default: <dest>/.photo-merge/ledger.tsv)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Conflict log path (default: <dest>/.photo-merge/conflicts.log)
        #[arg(long)]
        conflict_log: Option<PathBuf>,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Single-line counters
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    photo_merger::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            sources,
            dest,
            extensions,
            include_videos,
            ledger,
            conflict_log,
            include_hidden,
            follow_symlinks,
            output,
            verbose,
        } => run_merge(
            sources,
            dest,
            extensions,
            include_videos,
            ledger,
            conflict_log,
            include_hidden,
            follow_symlinks,
            output,
            verbose,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_merge(
    sources: Vec<PathBuf>,
    dest: PathBuf,
    extensions: Option<Vec<String>>,
    include_videos: bool,
    ledger_path: Option<PathBuf>,
    conflict_log_path: Option<PathBuf>,
    include_hidden: bool,
    follow_symlinks: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    let ledger_path = ledger_path.unwrap_or_else(|| default_ledger_path(&dest));
    let conflict_log_path = conflict_log_path.unwrap_or_else(|| default_conflict_log_path(&dest));

    if matches!(output, OutputFormat::Pretty) {
        print_status_header(&term, &sources, &dest, &ledger_path);
    }

    for source in &sources {
        if !source.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: source.clone(),
            }
            .into());
        }
    }

    // Fatal at startup: destination, ledger, and conflict log must be usable
    let ledger = ProcessedLedger::open(&ledger_path)?;
    let conflicts = ConflictLog::open(&conflict_log_path)?;

    let scan = ScanConfig {
        follow_symlinks,
        include_hidden,
        max_depth: None,
        extensions,
        include_videos,
    };

    let mut engine = MergeEngine::builder()
        .sources(sources)
        .dest_dir(dest)
        .scan_config(scan)
        .ledger(ledger)
        .conflict_log(conflicts)
        .build()?;

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose_clone = verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Run(RunEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Merge(MergeEvent::Started { total_candidates }) => {
                    if let Some(ref pb) = progress_clone {
                        if let Some(total) = total_candidates {
                            pb.set_length(total as u64);
                        }
                    }
                }
                Event::Merge(MergeEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .to_string(),
                        );
                    }
                }
                Event::Merge(MergeEvent::Renamed {
                    original_name,
                    dest_name,
                    ..
                }) => {
                    if verbose_clone {
                        if let Some(ref pb) = progress_clone {
                            pb.println(format!(
                                "  {} {} -> {}",
                                style("renamed").yellow(),
                                original_name,
                                dest_name
                            ));
                        }
                    }
                }
                Event::Merge(MergeEvent::DuplicateContent {
                    source,
                    existing_name,
                }) => {
                    if verbose_clone {
                        if let Some(ref pb) = progress_clone {
                            pb.println(format!(
                                "  {} {} already stored as {}",
                                style("duplicate").dim(),
                                source.display(),
                                existing_name
                            ));
                        }
                    }
                }
                Event::Merge(MergeEvent::Failed { source, message }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.println(format!(
                            "  {} {}: {}",
                            style("failed").red(),
                            source.display(),
                            message
                        ));
                    }
                }
                Event::Run(RunEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    // Run the engine
    let summary = engine.run_with_events(&sender)?;

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    match output {
        OutputFormat::Pretty => print_pretty_summary(&term, &summary, &conflict_log_path),
        OutputFormat::Json => print_json_summary(&summary),
        OutputFormat::Minimal => print_minimal_summary(&summary),
    }

    Ok(())
}

/// Pre-run report: sources, destination state, and whether a prior
/// ledger makes this run incremental.
fn print_status_header(term: &Term, sources: &[PathBuf], dest: &Path, ledger_path: &Path) {
    term.write_line(&format!(
        "{} {}",
        style("Photo Merger").bold().cyan(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();

    for (i, source) in sources.iter().enumerate() {
        term.write_line(&format!(
            "  Source {}: {}",
            i + 1,
            display_path(source)
        ))
        .ok();
    }

    let dest_state = match std::fs::read_dir(dest) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                style("(has existing files)").dim().to_string()
            } else {
                style("(empty)").dim().to_string()
            }
        }
        Err(_) => style("(unreadable!)").red().to_string(),
    };
    term.write_line(&format!(
        "  Destination: {} {}",
        display_path(dest),
        dest_state
    ))
    .ok();

    if ledger_path.exists() {
        term.write_line(&format!(
            "  {} previous ledger found, merge is incremental ({})",
            style("✓").green(),
            display_path(ledger_path)
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "  {} no ledger yet, every source file will be evaluated",
            style("·").dim()
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn print_pretty_summary(term: &Term, summary: &MergeSummary, conflict_log_path: &Path) {
    term.write_line("").ok();
    term.write_line(&format!("{} Merge Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} candidates evaluated in {:.1}s",
        style(summary.candidates).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} copied ({})",
        style(summary.copied).cyan(),
        format_bytes(summary.bytes_copied)
    ))
    .ok();

    if summary.renamed > 0 {
        term.write_line(&format!(
            "  {} renamed after filename collisions",
            style(summary.renamed).yellow()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} skipped as duplicate content",
        style(summary.duplicate_content).cyan()
    ))
    .ok();

    if summary.already_processed > 0 {
        term.write_line(&format!(
            "  {} already merged in earlier runs",
            style(summary.already_processed).dim()
        ))
        .ok();
    }

    if summary.failed > 0 {
        term.write_line(&format!(
            "  {} failed (see conflict log)",
            style(summary.failed).red()
        ))
        .ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style(format!(
            "Sources were not modified. Decisions are logged in {}",
            display_path(conflict_log_path)
        ))
        .dim()
    ))
    .ok();
}

fn print_json_summary(summary: &MergeSummary) {
    let output = serde_json::json!({
        "run_id": summary.run_id,
        "candidates": summary.candidates,
        "copied": summary.copied,
        "renamed": summary.renamed,
        "duplicate_content": summary.duplicate_content,
        "already_processed": summary.already_processed,
        "failed": summary.failed,
        "bytes_copied": summary.bytes_copied,
        "destination_preexisting": summary.destination_preexisting,
        "duration_ms": summary.duration_ms,
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn print_minimal_summary(summary: &MergeSummary) {
    println!(
        "copied={} renamed={} duplicates={} already={} failed={}",
        summary.copied,
        summary.renamed,
        summary.duplicate_content,
        summary.already_processed,
        summary.failed
    );
}

/// Shorten paths under the home directory to ~/...
fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
