//! Photo batches: admission gates, parallel normalization, and the preview list.
//!
//! A batch is the set of photos an operator has picked for one listing and
//! not yet submitted. Each file-selection event goes through three steps:
//!
//! ```text
//! 1. Admit      selection  →  accepted + warnings   (count cap, then size cap)
//! 2. Normalize  accepted   →  previews + warnings   (parallel, per-file errors)
//! 3. Commit     previews   →  batch                 (one serialized append)
//! ```
//!
//! ## Admission
//!
//! The count cap is applied first, by selection position: with `n` photos
//! already in the batch, only the first `max_files - n` files of a selection
//! are considered, and every file after that is rejected whether or not it
//! is valid. Among the considered files, any whose declared size is above
//! `max_file_bytes` is rejected before it is read by the normalizer.
//! Files on disk ([`prepare_files`]) are gated on filesystem metadata, so
//! rejected files are never read at all.
//!
//! Admission sees the batch as it was in step 1. If another selection is
//! committed in between, previews that no longer fit are turned away at
//! commit with the same cap warning, in selection order.
//!
//! ## Failure isolation
//!
//! Every error is scoped to one file and reported as a [`Warning`]. A corrupt
//! or oversized photo never prevents the rest of the selection from landing
//! in the batch.
//!
//! ## Ordering and cancellation
//!
//! Files are normalized in parallel on the rayon pool, but previews are
//! appended in selection order. Progress events are emitted as files finish,
//! so their order may differ.
//!
//! Every [`Batch::clear`] starts a new generation. A [`PendingSelection`]
//! remembers the generation it was admitted against, and committing it after
//! a clear fails with [`BatchError::StaleTicket`] instead of leaking photos
//! from an abandoned form into a fresh one.

use crate::imaging::{NormalizeError, NormalizeParams, RasterBackend, normalize};
use crate::output::format_file_size;
use crate::preview::PreviewEntry;
use crate::types::{Locator, SelectedFile, SourceImage, display_name};
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

/// Most photos a single listing may carry.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Largest file accepted for normalization (5 MiB), checked on declared size.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Caller-side gates applied before a file reaches the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Why a file did not make it into the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningReason {
    /// The batch was already full when this file's turn came.
    CapExceeded { cap: usize },
    /// Declared size above the per-file limit.
    TooLarge { size: u64, limit: u64 },
    /// Not a decodable image.
    Decode(String),
    /// Decoded, but the JPEG re-encode failed.
    Encode(String),
    /// The file could not be read from disk.
    Unreadable(String),
}

/// A non-fatal, per-file problem surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub file_name: String,
    pub reason: WarningReason,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            WarningReason::CapExceeded { cap } => write!(
                f,
                "{}: not added, a listing holds at most {} photos",
                self.file_name, cap
            ),
            WarningReason::TooLarge { size, limit } => write!(
                f,
                "{}: {} exceeds the {} limit",
                self.file_name,
                format_file_size(*size),
                format_file_size(*limit)
            ),
            WarningReason::Decode(reason) => write!(
                f,
                "{}: not a readable image ({})",
                self.file_name, reason
            ),
            WarningReason::Encode(reason) => write!(
                f,
                "{}: could not be re-encoded ({})",
                self.file_name, reason
            ),
            WarningReason::Unreadable(reason) => {
                write!(f, "{}: could not be read ({})", self.file_name, reason)
            }
        }
    }
}

impl Warning {
    pub fn unreadable(file_name: impl Into<String>, err: &std::io::Error) -> Self {
        Self {
            file_name: file_name.into(),
            reason: WarningReason::Unreadable(err.to_string()),
        }
    }
}

impl From<NormalizeError> for Warning {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Decode { file_name, reason } => Self {
                file_name,
                reason: WarningReason::Decode(reason),
            },
            NormalizeError::Encode { file_name, reason } => Self {
                file_name,
                reason: WarningReason::Encode(reason),
            },
        }
    }
}

/// What the admission gates look at: a name and a declared size.
pub trait Declared {
    fn file_name(&self) -> &str;
    fn declared_size(&self) -> u64;
}

impl Declared for SourceImage {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn declared_size(&self) -> u64 {
        self.declared_size
    }
}

impl Declared for SelectedFile {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn declared_size(&self) -> u64 {
        self.declared_size
    }
}

/// A file that passed both admission gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedFile<T = SourceImage> {
    /// 1-based position in the selection.
    pub position: usize,
    pub source: T,
}

/// Result of applying the admission gates to one selection.
#[derive(Debug)]
pub struct Admission<T = SourceImage> {
    pub accepted: Vec<AdmittedFile<T>>,
    pub warnings: Vec<Warning>,
}

/// Apply the count cap, then the size cap, to a selection.
///
/// `existing` is the number of new photos already in the batch.
pub fn admit<T: Declared>(
    existing: usize,
    selection: Vec<T>,
    limits: &AdmissionLimits,
) -> Admission<T> {
    let room = limits.max_files.saturating_sub(existing);
    let mut admission = Admission {
        accepted: Vec::new(),
        warnings: Vec::new(),
    };

    for (i, source) in selection.into_iter().enumerate() {
        if i >= room {
            admission.warnings.push(Warning {
                file_name: source.file_name().to_string(),
                reason: WarningReason::CapExceeded {
                    cap: limits.max_files,
                },
            });
            continue;
        }
        if source.declared_size() > limits.max_file_bytes {
            admission.warnings.push(Warning {
                file_name: source.file_name().to_string(),
                reason: WarningReason::TooLarge {
                    size: source.declared_size(),
                    limit: limits.max_file_bytes,
                },
            });
            continue;
        }
        admission.accepted.push(AdmittedFile {
            position: i + 1,
            source,
        });
    }

    admission
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Only commits can see this: the batch was cleared in between.
    #[error("batch was cleared after this selection was admitted")]
    StaleTicket,
    /// Only [`Batch::add`] can see this.
    #[error("batch is full ({cap} photos)")]
    Full { cap: usize },
}

/// Generation marker tying pending work to the batch state it was admitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTicket {
    generation: u64,
}

/// Ordered preview list for one listing form.
///
/// When a listing is edited, the batch also holds the locators of photos it
/// already has. Those are shown first, can be removed, and do not count
/// against `max_files`, which limits the photos added in this form.
///
/// Entries are identified only by position; removing one shifts the rest.
#[derive(Debug)]
pub struct Batch {
    existing: Vec<Locator>,
    entries: Vec<PreviewEntry>,
    limits: AdmissionLimits,
    generation: u64,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new(AdmissionLimits::default())
    }
}

impl Batch {
    pub fn new(limits: AdmissionLimits) -> Self {
        Self::with_existing(limits, Vec::new())
    }

    /// Batch for editing a listing that already has stored photos.
    pub fn with_existing(limits: AdmissionLimits, existing: Vec<Locator>) -> Self {
        Self {
            existing,
            entries: Vec::new(),
            limits,
            generation: 0,
        }
    }

    /// Stored photos kept from the listing being edited.
    pub fn existing(&self) -> &[Locator] {
        &self.existing
    }

    /// Drop a stored photo from the listing (0-based). Out of range is a no-op.
    pub fn remove_existing(&mut self, index: usize) -> Option<Locator> {
        (index < self.existing.len()).then(|| self.existing.remove(index))
    }

    pub fn limits(&self) -> &AdmissionLimits {
        &self.limits
    }

    pub fn entries(&self) -> &[PreviewEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many more photos fit before the count cap.
    pub fn remaining_capacity(&self) -> usize {
        self.limits.max_files.saturating_sub(self.entries.len())
    }

    /// Sum of the normalized JPEG sizes.
    pub fn total_resized_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.resized_size).sum()
    }

    /// Append one entry at the end.
    pub fn add(&mut self, entry: PreviewEntry) -> Result<(), BatchError> {
        if self.remaining_capacity() == 0 {
            return Err(BatchError::Full {
                cap: self.limits.max_files,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the entry at `index` (0-based). Out of range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<PreviewEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Drop every entry and existing locator, and invalidate outstanding tickets.
    pub fn clear(&mut self) {
        self.existing.clear();
        self.entries.clear();
        self.generation += 1;
    }

    pub fn ticket(&self) -> BatchTicket {
        BatchTicket {
            generation: self.generation,
        }
    }

    /// Append entries computed for `ticket`, in order, while room remains.
    ///
    /// Returns the entries that did not fit. A stale ticket appends nothing.
    pub fn extend_with(
        &mut self,
        ticket: BatchTicket,
        mut entries: Vec<PreviewEntry>,
    ) -> Result<Vec<PreviewEntry>, BatchError> {
        if ticket.generation != self.generation {
            return Err(BatchError::StaleTicket);
        }
        let overflow = entries.split_off(entries.len().min(self.remaining_capacity()));
        self.entries.extend(entries);
        Ok(overflow)
    }
}

/// Progress of a selection, streamed while files are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    SelectionStarted {
        selected: usize,
        admitted: usize,
    },
    FileNormalized {
        /// 1-based position in the selection.
        index: usize,
        file_name: String,
        original_size: u64,
        resized_size: u64,
        width: u32,
        height: u32,
    },
    FileSkipped(Warning),
}

/// A selection that has been admitted but not yet committed to its batch.
#[derive(Debug)]
pub struct PendingSelection {
    pub ticket: BatchTicket,
    pub selected: usize,
    pub admission: Admission,
}

/// What one selection did to the batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SelectionReport {
    pub added: usize,
    pub warnings: Vec<Warning>,
}

/// Per-file outcomes of a normalized selection, in selection order.
pub type Normalized = Vec<Result<PreviewEntry, Warning>>;

fn emit(events: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        // Receiver gone means nobody is watching; processing continues.
        let _ = tx.send(event);
    }
}

/// Step 1: admit a selection against the batch's current size and generation.
pub fn prepare_selection(batch: &Batch, selection: Vec<SourceImage>) -> PendingSelection {
    let selected = selection.len();
    let admission = admit(batch.len(), selection, batch.limits());
    for w in &admission.warnings {
        warn!(file = %w.file_name, "{w}");
    }
    PendingSelection {
        ticket: batch.ticket(),
        selected,
        admission,
    }
}

/// Step 1 for files on disk: admit on filesystem metadata, then read only
/// the admitted files.
///
/// A path that cannot be inspected or read becomes an
/// [`WarningReason::Unreadable`] warning; the rest of the selection goes on.
pub fn prepare_files(batch: &Batch, paths: &[PathBuf]) -> PendingSelection {
    let mut warnings = Vec::new();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match SelectedFile::stat(path) {
            Ok(file) => files.push(file),
            Err(e) => warnings.push(Warning::unreadable(display_name(path), &e)),
        }
    }

    let gated = admit(batch.len(), files, batch.limits());
    warnings.extend(gated.warnings);

    let mut accepted = Vec::with_capacity(gated.accepted.len());
    for AdmittedFile { position, source } in gated.accepted {
        match source.read() {
            Ok(image) => accepted.push(AdmittedFile {
                position,
                source: image,
            }),
            Err(e) => warnings.push(Warning::unreadable(source.file_name, &e)),
        }
    }

    for w in &warnings {
        warn!(file = %w.file_name, "{w}");
    }
    PendingSelection {
        ticket: batch.ticket(),
        selected: paths.len(),
        admission: Admission { accepted, warnings },
    }
}

/// Step 2: normalize admitted files in parallel. Does not touch the batch,
/// so it can run while the form stays interactive.
pub fn normalize_admitted<B: RasterBackend>(
    backend: &B,
    accepted: &[AdmittedFile],
    params: &NormalizeParams,
    events: Option<&Sender<ProcessEvent>>,
) -> Normalized {
    accepted
        .par_iter()
        .map(|file| {
            let outcome = normalize(backend, &file.source, params)
                .map(PreviewEntry::new)
                .map_err(Warning::from);
            match &outcome {
                Ok(entry) => emit(
                    events,
                    ProcessEvent::FileNormalized {
                        index: file.position,
                        file_name: file.source.file_name.clone(),
                        original_size: entry.original_size,
                        resized_size: entry.resized_size,
                        width: entry.image.width,
                        height: entry.image.height,
                    },
                ),
                Err(w) => {
                    warn!(file = %w.file_name, "{w}");
                    emit(events, ProcessEvent::FileSkipped(w.clone()));
                }
            }
            outcome
        })
        .collect()
}

/// Step 3: append the successful previews in selection order.
///
/// `normalized` is the output of [`normalize_admitted`] for this selection.
///
/// Previews that no longer fit, because another selection was committed
/// since step 1, are reported as [`WarningReason::CapExceeded`]. Fails
/// without touching the batch only if it was cleared since step 1.
pub fn commit_selection(
    batch: &mut Batch,
    pending: PendingSelection,
    normalized: Normalized,
) -> Result<SelectionReport, BatchError> {
    let mut warnings = pending.admission.warnings;
    let mut entries = Vec::with_capacity(normalized.len());
    let mut names = Vec::with_capacity(normalized.len());
    for (file, outcome) in pending.admission.accepted.into_iter().zip(normalized) {
        match outcome {
            Ok(entry) => {
                names.push(file.source.file_name);
                entries.push(entry);
            }
            Err(w) => warnings.push(w),
        }
    }
    let offered = entries.len();
    let overflow = batch.extend_with(pending.ticket, entries)?;
    let added = offered - overflow.len();
    let cap = batch.limits().max_files;
    for file_name in names.into_iter().skip(added) {
        let w = Warning {
            file_name,
            reason: WarningReason::CapExceeded { cap },
        };
        warn!(file = %w.file_name, "{w}");
        warnings.push(w);
    }
    info!(
        added,
        skipped = warnings.len(),
        total = batch.len(),
        "selection committed"
    );
    Ok(SelectionReport { added, warnings })
}

/// Run one selection end to end against `batch`.
///
/// Admission warnings are emitted up front; normalization progress is
/// emitted as each file finishes.
pub fn process_selection<B: RasterBackend>(
    backend: &B,
    batch: &mut Batch,
    selection: Vec<SourceImage>,
    params: &NormalizeParams,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<SelectionReport, BatchError> {
    let pending = prepare_selection(batch, selection);
    run_pending(backend, batch, pending, params, events)
}

/// Run one selection of files on disk end to end against `batch`.
pub fn process_files<B: RasterBackend>(
    backend: &B,
    batch: &mut Batch,
    paths: &[PathBuf],
    params: &NormalizeParams,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<SelectionReport, BatchError> {
    let pending = prepare_files(batch, paths);
    run_pending(backend, batch, pending, params, events)
}

fn run_pending<B: RasterBackend>(
    backend: &B,
    batch: &mut Batch,
    pending: PendingSelection,
    params: &NormalizeParams,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<SelectionReport, BatchError> {
    emit(
        events,
        ProcessEvent::SelectionStarted {
            selected: pending.selected,
            admitted: pending.admission.accepted.len(),
        },
    );
    for w in &pending.admission.warnings {
        emit(events, ProcessEvent::FileSkipped(w.clone()));
    }
    let normalized = normalize_admitted(backend, &pending.admission.accepted, params, events);
    commit_selection(batch, pending, normalized)
}
