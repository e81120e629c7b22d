//! # Shelfscan CLI (`shelf`)
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf reconcile <FILE or ->` | Reconcile a JSON array of raw candidates |
//! | `shelf scan <DIR>` | Replay recorded tile replies, then reconcile |
//! | `shelf tiles` | Print the tile plan for an image size |
//! | `shelf check <TITLE>` | Explain whether a single title survives the filters |
//! | `shelf lookup <FILE or ->` | Reconcile, then look titles up in a local catalog |
//!
//! Logs go to stderr. `-v` shows progress, `-vv` shows every rejected
//! candidate; `RUST_LOG` overrides both.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use shelfscan::reconcile::OutputFormat;
use shelfscan::{config, lookup, reconcile, scan};

/// Shelfscan: clean up vision-model readings of a bookshelf photo.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Reconcile noisy vision-model readings of a bookshelf photo into book titles",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile raw candidates into clean titles.
    ///
    /// Input is a JSON array whose items are plain strings or objects with
    /// `title`, optional `confidence` and optional `x`/`y`/`width`/`height`.
    Reconcile {
        /// Candidates file, or `-` for stdin.
        input: String,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Include stage counts and every rejected candidate.
        #[arg(long)]
        report: bool,
    },

    /// Scan a photo from recorded vision replies.
    ///
    /// Plans the tile grid for the image size, feeds one reply file per
    /// tile (sorted by name) through the scan driver, then reconciles.
    Scan {
        /// Directory of recorded replies.
        dir: PathBuf,

        /// Image width in pixels.
        #[arg(long)]
        width: u32,

        /// Image height in pixels.
        #[arg(long)]
        height: u32,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        #[arg(long)]
        report: bool,
    },

    /// Print the tile plan for an image size.
    Tiles {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check one title against the non-book and validity filters.
    Check {
        title: String,

        /// `high`, `medium` or `low`; anything else counts as medium.
        #[arg(long)]
        confidence: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Reconcile candidates, then look them up in a local catalog.
    Lookup {
        /// Candidates file, or `-` for stdin.
        input: String,

        /// JSON array of catalog records.
        #[arg(long)]
        catalog: PathBuf,

        /// ISBNs already in the library, one per line.
        #[arg(long)]
        library: Option<PathBuf>,

        /// Photo reference stored on every new entry.
        #[arg(long)]
        photo: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Reconcile {
            input,
            format,
            report,
        } => {
            reconcile::run_reconcile(&cfg, &input, format, report)?;
        }
        Commands::Scan {
            dir,
            width,
            height,
            format,
            report,
        } => {
            scan::run_scan(&cfg, &dir, width, height, format, report).await?;
        }
        Commands::Tiles {
            width,
            height,
            format,
        } => {
            scan::run_tiles(&cfg, width, height, format)?;
        }
        Commands::Lookup {
            input,
            catalog,
            library,
            photo,
            format,
        } => {
            lookup::run_lookup(
                &cfg,
                &input,
                &catalog,
                library.as_deref(),
                photo.as_deref(),
                format,
            )
            .await?;
        }
        Commands::Check {
            title,
            confidence,
            format,
        } => {
            reconcile::run_check(&title, confidence.as_deref(), format)?;
        }
    }

    Ok(())
}
