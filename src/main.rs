//! filekeeper - keep the newest N files of each kind in a folder.
//!
//! Usage:
//!   filekeeper types [FOLDER]                 List distinct file types
//!   filekeeper newest FOLDER [TEMPLATE]       Show the newest file per type
//!   filekeeper prune FOLDER TEMPLATE          Delete all but the newest N
//!   filekeeper compress DEST SOURCE...        Store files gzip-compressed
//!   filekeeper normalize-path RAW             Clean an untrusted path
//!   filekeeper stamp PREFIX EXTENSION         Build a timestamped filename
//!   filekeeper --help                         Show help

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing_subscriber::EnvFilter;

use filekeeper_analyze::FileTypeInventory;
use filekeeper_core::{
    FileTypeKey, Settings, classify, format_elapsed, join_under, normalize, normalize_to_string,
    stamped_filename,
};
use filekeeper_ops::{CompressionNormalizer, RetentionManager};

#[derive(Parser)]
#[command(
    name = "filekeeper",
    version,
    about = "Keep the newest N files of each kind in a folder",
    long_about = "filekeeper groups the files of a folder into types by a stable \
                  name prefix and extension, prunes each type down to its newest \
                  files, and stores files gzip-compressed."
)]
struct Cli {
    /// Settings file (.toml or .json); defaults to the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the prefix delimiter from the settings file
    #[arg(short, long, global = true)]
    delimiter: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the distinct file types in a folder
    Types {
        /// Folder to inspect
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Show the newest file of each type, or of one type
    Newest {
        /// Folder to inspect
        folder: PathBuf,

        /// A filename whose type to look up (all types if omitted)
        template: Option<String>,
    },

    /// Delete all but the newest files sharing a filename's type
    Prune {
        /// Folder to prune
        folder: PathBuf,

        /// A filename whose type is pruned
        template: String,

        /// Number of files to keep (overrides settings)
        #[arg(short, long)]
        keep: Option<usize>,

        /// Move files to the trash instead of deleting them
        #[arg(long)]
        trash: bool,

        /// Show what would be deleted without deleting anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Store files gzip-compressed in a destination folder
    Compress {
        /// Destination folder (created if missing)
        dest: PathBuf,

        /// Files to store
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Gzip level 0-9 (overrides settings)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: Option<u32>,
    },

    /// Normalize an untrusted path into clean tokens
    NormalizePath {
        /// Raw path string
        raw: String,

        /// Resolve the cleaned path under this folder
        #[arg(short, long)]
        base: Option<PathBuf>,
    },

    /// Print a timestamped filename that classifies back to PREFIX and EXTENSION
    Stamp {
        /// Stable name prefix
        prefix: String,

        /// Extension, including the leading dot
        #[arg(default_value = "")]
        extension: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load_default().context("Failed to load default settings")?,
    };
    if let Some(delimiter) = cli.delimiter {
        settings
            .set_prefix_delimiter(delimiter)
            .context("Invalid --delimiter")?;
    }

    match cli.command {
        Command::Types { folder } => run_types(&settings, &folder, cli.format),
        Command::Newest { folder, template } => {
            run_newest(&settings, &folder, template.as_deref(), cli.format)
        }
        Command::Prune {
            folder,
            template,
            keep,
            trash,
            dry_run,
        } => {
            if let Some(keep) = keep {
                settings.retention.keep = keep;
            }
            settings.retention.use_trash |= trash;
            run_prune(&settings, &folder, &template, dry_run, cli.format)
        }
        Command::Compress {
            dest,
            sources,
            level,
        } => {
            if let Some(level) = level {
                settings.compression.level = level;
            }
            run_compress(&settings, &dest, &sources, cli.format)
        }
        Command::NormalizePath { raw, base } => run_normalize_path(&raw, base, cli.format),
        Command::Stamp { prefix, extension } => {
            run_stamp(&settings, &prefix, &extension, cli.format)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Warn once when classification will fall back to the first dot.
fn check_delimiter(settings: &Settings) {
    if let Err(e) = settings.require_prefix_delimiter() {
        tracing::warn!("{e}; file types fall back to the first dot in each name");
    }
}

/// List distinct file types.
fn run_types(settings: &Settings, folder: &Path, format: OutputFormat) -> Result<()> {
    check_delimiter(settings);
    let inventory = FileTypeInventory::new(settings.inventory_config())?;
    let report = inventory
        .distinct_types(folder)
        .with_context(|| format!("Failed to inspect {}", folder.display()))?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(
                " {} - {} types in {} files",
                folder.display(),
                report.type_count(),
                report.files_classified
            );
            println!("{}", "─".repeat(60));
            println!();

            for key in &report.types {
                println!("   {:<30} {}", key.pattern(), display_extension(key));
            }

            if !report.warnings.is_empty() {
                println!();
                println!("{} warning(s) during inventory", report.warnings.len());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Show the newest file per type.
fn run_newest(
    settings: &Settings,
    folder: &Path,
    template: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    check_delimiter(settings);
    let inventory = FileTypeInventory::new(settings.inventory_config())?;

    let newest = match template {
        Some(template) => {
            let key = classify(template, settings.prefix_delimiter());
            let path = inventory.newest_of_type(folder, &key)?;
            vec![(key, path)]
        }
        None => inventory
            .newest_of_each_type(folder)
            .with_context(|| format!("Failed to inspect {}", folder.display()))?,
    };

    match format {
        OutputFormat::Text => {
            for (key, path) in &newest {
                println!("{:<30} {}", key.pattern(), path.display());
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = newest
                .iter()
                .map(|(key, path)| {
                    serde_json::json!({
                        "prefix": key.prefix,
                        "extension": key.extension,
                        "path": path,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

/// Run one retention pass.
fn run_prune(
    settings: &Settings,
    folder: &Path,
    template: &str,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    check_delimiter(settings);
    let started = Instant::now();
    let config = settings.retention_config();
    let use_trash = config.use_trash;
    let manager = RetentionManager::new(config);

    let plan = manager
        .plan(folder, template)
        .with_context(|| format!("Failed to read {}", folder.display()))?;

    if dry_run {
        match format {
            OutputFormat::Text => {
                println!(
                    " {} - keeping {} of {} files",
                    plan.key.pattern(),
                    plan.keep.len(),
                    plan.matched()
                );
                for entry in &plan.keep {
                    println!("   keep   {}", entry.name);
                }
                for entry in &plan.delete {
                    println!("   delete {}", entry.name);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
        }
        return Ok(());
    }

    let report = plan.execute(use_trash);
    let complete = report.complete();

    match format {
        OutputFormat::Text => {
            for path in &report.deleted {
                println!("   removed {}", path.display());
            }
            for error in &report.errors {
                println!("   failed  {error}");
            }
            println!();
            println!(
                " {} in {}",
                complete.summary(),
                format_elapsed(started.elapsed())
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if complete.is_success() {
        Ok(())
    } else {
        Err(eyre!("{} file(s) could not be removed", complete.failed))
    }
}

/// Store files gzip-compressed.
fn run_compress(
    settings: &Settings,
    dest: &Path,
    sources: &[PathBuf],
    format: OutputFormat,
) -> Result<()> {
    let started = Instant::now();
    let normalizer = CompressionNormalizer::new(settings.compression.clone());

    eprintln!("Storing {} file(s) in {}...", sources.len(), dest.display());
    let report = normalizer.normalize_batch(sources, dest);
    let complete = report.complete();

    match format {
        OutputFormat::Text => {
            for (source, output) in sources.iter().zip(&report.outputs) {
                match output {
                    Ok(path) => println!("   {} -> {}", source.display(), path.display()),
                    Err(error) => println!("   failed  {error}"),
                }
            }
            println!();
            println!(
                " {} in {}",
                complete.summary(),
                format_elapsed(started.elapsed())
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if complete.is_success() {
        Ok(())
    } else {
        Err(eyre!("{} file(s) could not be stored", complete.failed))
    }
}

/// Print the cleaned form of a raw path.
fn run_normalize_path(raw: &str, base: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let tokens = normalize(raw);

    match format {
        OutputFormat::Text => match base {
            Some(base) => println!("{}", join_under(base, raw).display()),
            None => println!("{}", normalize_to_string(raw)),
        },
        OutputFormat::Json => {
            let joined = base.map(|base| join_under(base, raw));
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "raw": raw,
                    "tokens": tokens,
                    "path": joined,
                }))?
            );
        }
    }

    Ok(())
}

/// Print a filename stamped with the current local time.
fn run_stamp(
    settings: &Settings,
    prefix: &str,
    extension: &str,
    format: OutputFormat,
) -> Result<()> {
    let delimiter = settings
        .require_prefix_delimiter()
        .context("A prefix delimiter is needed to build a stamped filename")?;
    let name = stamped_filename(prefix, delimiter, &chrono::Local::now(), extension);

    match format {
        OutputFormat::Text => println!("{name}"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "name": name }))?);
        }
    }

    Ok(())
}

fn display_extension(key: &FileTypeKey) -> &str {
    if key.extension.is_empty() {
        "(no extension)"
    } else {
        &key.extension
    }
}
