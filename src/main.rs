use clap::{Parser, Subcommand};
use listing_photos::batch::{self, Batch, ProcessEvent, Warning};
use listing_photos::imaging::{self, RustBackend};
use listing_photos::types::{SourceImage, display_name};
use listing_photos::upload::{self, DirectorySink, Locator};
use listing_photos::{config, output};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "listing-photos")]
#[command(about = "Normalize property photos for listings")]
#[command(long_about = "\
Normalize property photos for listings

Photos are scaled down to fit a bounding box (aspect ratio kept, never
upscaled) and re-encoded as JPEG. Directory arguments are searched for
supported images (jpg, jpeg, png, gif, webp, bmp).

Problems with individual files are reported as warnings; the remaining
files are still processed.

Run 'listing-photos gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize photos and write them as JPEG files
    Normalize {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output directory
        #[arg(long, default_value = "normalized")]
        out: PathBuf,
        /// Bounding box width (overrides config)
        #[arg(long)]
        max_width: Option<u32>,
        /// Bounding box height (overrides config)
        #[arg(long)]
        max_height: Option<u32>,
        /// JPEG quality in (0, 1] (overrides config)
        #[arg(long)]
        quality: Option<f32>,
    },
    /// Run one selection through a listing batch and show the previews
    Batch {
        /// Image files or directories, in selection order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Locator of a photo the listing already has (repeatable, kept first)
        #[arg(long = "existing", value_name = "URL")]
        existing: Vec<String>,
        /// Upload the finished batch into this directory
        #[arg(long)]
        store: Option<PathBuf>,
        /// Print a JSON report instead of progress lines
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Normalize {
            paths,
            out,
            max_width,
            max_height,
            quality,
        } => {
            let mut cfg = config::load_config(&cli.config)?;
            if let Some(w) = max_width {
                cfg.images.max_width = w;
            }
            if let Some(h) = max_height {
                cfg.images.max_height = h;
            }
            if let Some(q) = quality {
                cfg.images.quality = q;
            }
            cfg.validate()?;
            init_thread_pool(&cfg.processing);

            let files = expand_paths(&paths);
            let params = cfg.normalize_params();
            let backend = RustBackend::new();

            let (tx, printer) = spawn_printer();
            let results: Vec<_> = files
                .par_iter()
                .enumerate()
                .map_with(tx, |tx, (i, path)| {
                    let result = SourceImage::from_path(path)
                        .map_err(|e| Warning::unreadable(display_name(path), &e))
                        .and_then(|source| {
                            imaging::normalize(&backend, &source, &params).map_err(Warning::from)
                        });
                    let event = match &result {
                        Ok(img) => ProcessEvent::FileNormalized {
                            index: i + 1,
                            file_name: display_name(path),
                            original_size: img.original_size,
                            resized_size: img.byte_len(),
                            width: img.width,
                            height: img.height,
                        },
                        Err(w) => ProcessEvent::FileSkipped(w.clone()),
                    };
                    let _ = tx.send(event);
                    result.ok()
                })
                .collect();
            printer.join().map_err(|_| "progress printer panicked")?;

            std::fs::create_dir_all(&out)?;
            let mut written = 0;
            for image in results.into_iter().flatten() {
                std::fs::write(out.join(&image.file_name), &image.bytes)?;
                written += 1;
            }
            println!(
                "Wrote {} of {} photos to {}",
                written,
                files.len(),
                out.display()
            );
        }
        Command::Batch {
            paths,
            existing,
            store,
            json,
        } => {
            let cfg = config::load_config(&cli.config)?;
            init_thread_pool(&cfg.processing);

            let files = expand_paths(&paths);
            let params = cfg.normalize_params();
            let backend = RustBackend::new();
            let existing = existing.into_iter().map(Locator::new).collect();
            let mut listing = Batch::with_existing(cfg.admission_limits(), existing);

            let report = if json {
                batch::process_files(&backend, &mut listing, &files, &params, None)?
            } else {
                let (tx, printer) = spawn_printer();
                let report =
                    batch::process_files(&backend, &mut listing, &files, &params, Some(&tx));
                drop(tx);
                printer.join().map_err(|_| "progress printer panicked")?;
                report?
            };

            let locators = match &store {
                Some(dir) => {
                    let sink = DirectorySink::new(dir, &cfg.upload.public_base);
                    Some(upload::upload_batch(&sink, &listing)?)
                }
                None => None,
            };

            if json {
                let report = JsonReport::new(&listing, &report.warnings, locators.as_deref());
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_selection_report(&report);
                output::print_batch(&listing);
                if let Some(locators) = &locators {
                    output::print_locators(locators);
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so they never mix with progress lines or JSON.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of CPU cores; config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Print progress events on a dedicated thread as they arrive.
///
/// The thread exits once every sender is dropped.
fn spawn_printer() -> (Sender<ProcessEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_lines(&output::format_process_event(&event));
        }
    });
    (tx, printer)
}

/// Expand directory arguments into the supported images they contain.
///
/// Files named explicitly are kept as given, so an unsupported or missing
/// file still gets a warning instead of silently disappearing. Entries a
/// directory walk cannot reach are logged and skipped.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(imaging::is_supported_extension)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    /// Stored photos kept from the listing, listed before the new ones.
    kept: &'a [Locator],
    photos: Vec<JsonPhoto<'a>>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct JsonPhoto<'a> {
    file_name: &'a str,
    width: u32,
    height: u32,
    original_size: u64,
    resized_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    locator: Option<&'a Locator>,
}

impl<'a> JsonReport<'a> {
    fn new(listing: &'a Batch, warnings: &[Warning], locators: Option<&'a [Locator]>) -> Self {
        let offset = listing.existing().len();
        let photos = listing
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| JsonPhoto {
                file_name: &entry.image.file_name,
                width: entry.image.width,
                height: entry.image.height,
                original_size: entry.original_size,
                resized_size: entry.resized_size,
                locator: locators.and_then(|l| l.get(offset + i)),
            })
            .collect();
        Self {
            kept: listing.existing(),
            photos,
            warnings: warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}
