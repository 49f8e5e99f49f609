//! Merge engine implementation.

use super::copier::{FileCopier, FsCopier};
use super::{default_conflict_log_path, default_ledger_path, MergeConfig};
use crate::core::capture::{date_stamp, CaptureTimeResolver};
use crate::core::conflict::{ConflictLog, ConflictOutcome, ConflictRecord};
use crate::core::digest::fingerprint_file;
use crate::core::index::DestinationIndex;
use crate::core::ledger::ProcessedLedger;
use crate::core::scanner::{ImageFormat, ScanConfig, SourceWalker};
use crate::error::MergeError;
use crate::events::{
    null_sender, Event, EventSender, MergeEvent, MergePhase, MergeProgress, MergeSummary, RunEvent,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Rename-suffix searches deeper than this are logged as anomalies.
/// The search itself stays unbounded.
const SUFFIX_ANOMALY_THRESHOLD: usize = 1000;

/// Builder for the merge engine
pub struct MergeEngineBuilder {
    sources: Vec<PathBuf>,
    dest_dir: Option<PathBuf>,
    scan: ScanConfig,
    ledger: Option<ProcessedLedger>,
    conflicts: Option<ConflictLog>,
    resolver: CaptureTimeResolver,
    copier: Option<Box<dyn FileCopier>>,
}

impl MergeEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            dest_dir: None,
            scan: ScanConfig::default(),
            ledger: None,
            conflicts: None,
            resolver: CaptureTimeResolver::new(),
            copier: None,
        }
    }

    /// Source root directories
    pub fn sources(mut self, sources: Vec<PathBuf>) -> Self {
        self.sources = sources;
        self
    }

    /// Destination directory (must already exist)
    pub fn dest_dir(mut self, dest_dir: PathBuf) -> Self {
        self.dest_dir = Some(dest_dir);
        self
    }

    /// Enumeration configuration
    pub fn scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Use an already-opened ledger instead of the default path
    pub fn ledger(mut self, ledger: ProcessedLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Use an already-opened conflict log instead of the default path
    pub fn conflict_log(mut self, conflicts: ConflictLog) -> Self {
        self.conflicts = Some(conflicts);
        self
    }

    /// Override the capture-time resolver
    pub fn capture_resolver(mut self, resolver: CaptureTimeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Override the physical copy implementation
    pub fn copier(mut self, copier: Box<dyn FileCopier>) -> Self {
        self.copier = Some(copier);
        self
    }

    /// Build the engine. Opens the ledger and conflict log under
    /// `<dest>/.photo-merge/` when none were injected; failure to open
    /// either is fatal, before any file is processed.
    pub fn build(self) -> Result<MergeEngine, MergeError> {
        let dest_dir = self
            .dest_dir
            .ok_or_else(|| MergeError::Config("destination directory is required".to_string()))?;

        let ledger = match self.ledger {
            Some(ledger) => ledger,
            None => ProcessedLedger::open(&default_ledger_path(&dest_dir))?,
        };
        let conflicts = match self.conflicts {
            Some(conflicts) => conflicts,
            None => ConflictLog::open(&default_conflict_log_path(&dest_dir))?,
        };

        Ok(MergeEngine {
            config: MergeConfig {
                sources: self.sources,
                dest_dir,
                scan: self.scan,
            },
            ledger,
            conflicts,
            resolver: self.resolver,
            copier: self.copier.unwrap_or_else(|| Box::new(FsCopier)),
        })
    }
}

impl Default for MergeEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The merge engine.
///
/// Owns the injected ledger, conflict log, capture resolver, and copier;
/// all index and ledger mutations flow through this single writer.
pub struct MergeEngine {
    config: MergeConfig,
    ledger: ProcessedLedger,
    conflicts: ConflictLog,
    resolver: CaptureTimeResolver,
    copier: Box<dyn FileCopier>,
}

impl MergeEngine {
    /// Create a new engine builder
    pub fn builder() -> MergeEngineBuilder {
        MergeEngineBuilder::new()
    }

    /// Run the merge without events
    pub fn run(&mut self) -> Result<MergeSummary, MergeError> {
        self.run_with_events(&null_sender())
    }

    /// Run the merge with event reporting.
    ///
    /// Fatal errors (unreadable destination) abort before any file is
    /// processed; per-file failures are audited and the run continues.
    pub fn run_with_events(&mut self, events: &EventSender) -> Result<MergeSummary, MergeError> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        events.send(Event::Run(RunEvent::Started));
        if let Err(e) = self.conflicts.begin_run(&run_id) {
            warn!(error = %e, "could not write conflict log run header");
        }

        // Phase 1: fingerprint the existing destination
        events.send(Event::Run(RunEvent::PhaseChanged {
            phase: MergePhase::Indexing,
        }));

        let walker = SourceWalker::new(self.config.scan.clone());
        let mut index = DestinationIndex::build(&self.config.dest_dir, walker.filter(), events)?;

        let mut summary = MergeSummary {
            run_id,
            candidates: 0,
            copied: 0,
            renamed: 0,
            duplicate_content: 0,
            already_processed: 0,
            failed: 0,
            bytes_copied: 0,
            destination_preexisting: index.len(),
            duration_ms: 0,
        };

        // Phase 2: evaluate candidates in enumeration order
        events.send(Event::Run(RunEvent::PhaseChanged {
            phase: MergePhase::Merging,
        }));

        let sources = self.config.sources.clone();
        let total = walker.count_candidates(&sources);
        events.send(Event::Merge(MergeEvent::Started {
            total_candidates: Some(total),
        }));

        for path in walker.candidates(&sources, Some(events)) {
            summary.candidates += 1;
            events.send(Event::Merge(MergeEvent::Progress(MergeProgress {
                completed: summary.candidates,
                total,
                current_path: path.clone(),
            })));

            self.merge_one(&path, &mut index, events, &mut summary);
        }

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        events.send(Event::Run(RunEvent::Completed {
            summary: summary.clone(),
        }));

        Ok(summary)
    }

    /// Evaluate a single candidate. Every failure path audits and
    /// returns; nothing here escapes the merge loop.
    fn merge_one(
        &mut self,
        path: &Path,
        index: &mut DestinationIndex,
        events: &EventSender,
        summary: &mut MergeSummary,
    ) {
        let fp = match fingerprint_file(path) {
            Ok(fp) => fp,
            Err(e) => {
                self.fail(path, e.to_string(), events, summary);
                return;
            }
        };

        // Merged by a prior run, possibly from a different path
        if self.ledger.seen(&fp) {
            debug!(path = %path.display(), "already in ledger, skipping");
            summary.already_processed += 1;
            events.send(Event::Merge(MergeEvent::AlreadyProcessed {
                source: path.to_path_buf(),
            }));
            return;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => {
                self.fail(path, "filename is not valid UTF-8".to_string(), events, summary);
                return;
            }
        };

        // Case A: same content already in the destination. Content
        // identity wins over filename identity, so this is checked first.
        if let Some(existing) = index.find_by_fingerprint(&fp).map(str::to_string) {
            if existing != name {
                self.audit(ConflictRecord::now(
                    path,
                    ConflictOutcome::DuplicateContent {
                        existing_name: existing.clone(),
                    },
                ));
            }
            if let Err(e) = self.ledger.record(fp, path) {
                warn!(error = %e, "ledger append failed");
            }
            summary.duplicate_content += 1;
            events.send(Event::Merge(MergeEvent::DuplicateContent {
                source: path.to_path_buf(),
                existing_name: existing,
            }));
            return;
        }

        // Case B: the basename is free. Case C: it is taken by different
        // content, so disambiguate with the capture date.
        let (final_name, renamed) = match index.find_by_name(&name) {
            None => (name.clone(), false),
            Some(_) => {
                let ts = self.resolver.resolve(path, ImageFormat::from_path(path));
                let stamped = format!("{}_{}", date_stamp(&ts), name);
                let final_name = next_free_name(index, &stamped);
                self.audit(ConflictRecord::now(
                    path,
                    ConflictOutcome::Renamed {
                        original_name: name.clone(),
                        dest_name: final_name.clone(),
                    },
                ));
                (final_name, true)
            }
        };

        if index.reserve(&final_name, fp).is_err() {
            warn!(name = %final_name, "filename reservation refused");
            self.audit(ConflictRecord::now(
                path,
                ConflictOutcome::InternalCollision {
                    name: final_name.clone(),
                },
            ));
            summary.failed += 1;
            events.send(Event::Merge(MergeEvent::Failed {
                source: path.to_path_buf(),
                message: format!("reservation refused for {final_name}"),
            }));
            return;
        }

        let dest_path = self.config.dest_dir.join(&final_name);
        match self.copier.copy(path, &dest_path) {
            Ok(bytes) => {
                summary.bytes_copied += bytes;
                if renamed {
                    summary.renamed += 1;
                    events.send(Event::Merge(MergeEvent::Renamed {
                        source: path.to_path_buf(),
                        original_name: name,
                        dest_name: final_name,
                    }));
                } else {
                    summary.copied += 1;
                    events.send(Event::Merge(MergeEvent::Copied {
                        source: path.to_path_buf(),
                        dest_name: final_name,
                    }));
                }
                if let Err(e) = self.ledger.record(fp, path) {
                    warn!(error = %e, "ledger append failed");
                }
            }
            Err(e) => {
                // Roll the reservation back and leave no ledger record,
                // so the next run reattempts this file
                index.release(&final_name);
                self.fail(path, e.to_string(), events, summary);
            }
        }
    }

    fn fail(&mut self, path: &Path, reason: String, events: &EventSender, summary: &mut MergeSummary) {
        warn!(path = %path.display(), %reason, "skipping file");
        self.audit(ConflictRecord::now(
            path,
            ConflictOutcome::Failed {
                reason: reason.clone(),
            },
        ));
        summary.failed += 1;
        events.send(Event::Merge(MergeEvent::Failed {
            source: path.to_path_buf(),
            message: reason,
        }));
    }

    fn audit(&mut self, record: ConflictRecord) {
        if let Err(e) = self.conflicts.record(&record) {
            warn!(error = %e, "conflict log append failed");
        }
    }
}

/// Find the first unreserved filename, starting from `candidate` and
/// appending `_0`, `_1`, ... before the extension. Deterministic and
/// unbounded; unusually deep searches are logged.
fn next_free_name(index: &DestinationIndex, candidate: &str) -> String {
    if index.find_by_name(candidate).is_none() {
        return candidate.to_string();
    }

    let path = Path::new(candidate);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(candidate);
    let ext = path.extension().and_then(|e| e.to_str());

    let mut counter = 0usize;
    loop {
        let attempt = match ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        if index.find_by_name(&attempt).is_none() {
            return attempt;
        }
        if counter >= SUFFIX_ANOMALY_THRESHOLD {
            warn!(candidate, counter, "rename suffix search is unusually deep");
        }
        counter += 1;
    }
}
