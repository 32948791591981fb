//! CLI output formatting.
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Selection progress
//!
//! ```text
//! Selected 4 photos (3 admitted)
//!     skipped pano.jpg: 6.2 MB exceeds the 5 MB limit
//!     001 living-room.png → 1440x1080, 2.31 MB → 412.5 KB
//!     003 kitchen.png → 1080x1080, 845 KB → 198.02 KB
//!     skipped notes.jpg: not a readable image (unrecognized image format)
//! ```
//!
//! ## Batch
//!
//! ```text
//! Batch (2 of 10 photos, 610.52 KB)
//! 001 living-room.jpg 1440x1080 412.5 KB
//! 002 kitchen.jpg 1080x1080 198.02 KB
//! ```
//!
//! When editing a listing, its stored photos are listed first:
//!
//! ```text
//! Batch (1 of 10 photos, 412.5 KB)
//! 001 kept https://cdn.example/listing-42/9f3c_front.jpg
//! 002 living-room.jpg 1440x1080 412.5 KB
//! ```

use crate::batch::{Batch, ProcessEvent, SelectionReport};
use crate::upload::Locator;

const SIZE_UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

/// Human-readable byte count: 1024-based, at most two decimals.
///
/// ```text
/// 0       → "0 Bytes"
/// 1536    → "1.5 KB"
/// 2359296 → "2.25 MB"
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::SelectionStarted { selected, admitted } => {
            vec![format!("Selected {} photos ({} admitted)", selected, admitted)]
        }
        ProcessEvent::FileNormalized {
            index,
            file_name,
            original_size,
            resized_size,
            width,
            height,
        } => vec![format!(
            "{}{} {} → {}x{}, {} → {}",
            indent(1),
            format_index(*index),
            file_name,
            width,
            height,
            format_file_size(*original_size),
            format_file_size(*resized_size)
        )],
        ProcessEvent::FileSkipped(warning) => {
            vec![format!("{}skipped {}", indent(1), warning)]
        }
    }
}

/// Format the current preview list: kept photos first, then new ones.
pub fn format_batch(batch: &Batch) -> Vec<String> {
    let mut lines = vec![format!(
        "Batch ({} of {} photos, {})",
        batch.len(),
        batch.limits().max_files,
        format_file_size(batch.total_resized_bytes())
    )];
    for (i, locator) in batch.existing().iter().enumerate() {
        lines.push(format!("{} kept {}", format_index(i + 1), locator));
    }
    let offset = batch.existing().len();
    for (i, entry) in batch.entries().iter().enumerate() {
        lines.push(format!(
            "{} {} {} {}",
            format_index(offset + i + 1),
            entry.image.file_name,
            entry.image.dimensions(),
            format_file_size(entry.resized_size)
        ));
    }
    lines
}

/// Format the end-of-selection summary, repeating warnings so they are not
/// lost among progress lines.
pub fn format_selection_report(report: &SelectionReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Added {} photos, {} skipped",
        report.added,
        report.warnings.len()
    )];
    for w in &report.warnings {
        lines.push(format!("{}{}", indent(1), w));
    }
    lines
}

/// Format the locators returned by the upload sink.
pub fn format_locators(locators: &[Locator]) -> Vec<String> {
    let mut lines = vec![format!("Uploaded {} photos", locators.len())];
    for (i, locator) in locators.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), locator));
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_batch(batch: &Batch) {
    print_lines(&format_batch(batch));
}

pub fn print_selection_report(report: &SelectionReport) {
    print_lines(&format_selection_report(report));
}

pub fn print_locators(locators: &[Locator]) {
    print_lines(&format_locators(locators));
}
