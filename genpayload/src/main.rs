//! `genpayload` — packs files into a payload trailer and inspects payloads
//! embedded in other files.
//!
//! # Usage
//!
//! ```text
//! genpayload pack assets/ icon.png > trailer.bin   # trailer to stdout
//! genpayload pack --append ./app assets/           # append to an executable
//! genpayload list ./app                            # size and key per entry
//! genpayload extract ./app img/logo.png > logo.png # one entry to stdout
//! ```
//!
//! Progress is logged to stderr; set `RUST_LOG` to change the level.

mod collect;

use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use payload::{Payload, append_to_file, ignore_missing, load_file};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "genpayload",
    version,
    about = "Append named files to the end of any file"
)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a payload from files and directories.
    Pack {
        /// Append the trailer to this file instead of writing it to stdout.
        #[arg(short, long, value_name = "HOST")]
        append: Option<PathBuf>,

        /// Files and directories to embed. Directories are walked recursively.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the entries embedded in a file.
    List {
        file: PathBuf,
    },

    /// Write a single embedded entry to stdout.
    Extract {
        file: PathBuf,
        key: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Pack { append, paths } => {
            let payload = collect::collect(&paths)?;
            match append {
                Some(host) => {
                    let written = append_to_file(&host, &payload)
                        .with_context(|| format!("failed to append payload to {}", host.display()))?;
                    debug!(written, "appended to {}", host.display());
                }
                None => {
                    let stdout = io::stdout().lock();
                    payload
                        .dump(BufWriter::new(stdout))
                        .context("failed to write payload to stdout")?;
                }
            }
            info!("Done");
        }
        Commands::List { file } => {
            let payload = open(&file)?;
            let mut out = io::stdout().lock();
            for (key, value) in payload.iter() {
                writeln!(out, "{}\t{}", value.len(), String::from_utf8_lossy(key))?;
            }
        }
        Commands::Extract { file, key } => {
            let payload = open(&file)?;
            let value = payload
                .get(&key)
                .with_context(|| format!("no entry named {key:?} in {}", file.display()))?;
            let mut out = io::stdout().lock();
            out.write_all(value)?;
            out.flush()?;
        }
    }

    Ok(())
}

fn open(file: &Path) -> Result<Payload> {
    ignore_missing(load_file(file))
        .with_context(|| format!("failed to load payload from {}", file.display()))
}

fn setup_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}
