//! tp CLI - publish and restore directory snapshots through a patch chain

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tp::ops::{self, StageOptions};
use tp::{Config, Store};

#[derive(Parser)]
#[command(name = "tp")]
#[command(about = "versioned directory distribution over a content-addressed patch chain")]
#[command(version)]
struct Cli {
    /// configuration file
    #[arg(short, long, env = "TP_CONFIG", default_value = "transport.toml")]
    config: PathBuf,

    /// staging directory for uncommitted entries
    #[arg(short, long, env = "TP_STAGING", default_value = ".staging")]
    staging: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// stage a root entry from a directory
    Version {
        /// source directory
        source: PathBuf,

        /// discard a pending staged entry first
        #[arg(short, long)]
        force: bool,
    },

    /// stage a patch of a directory against a tag's head
    Patch {
        /// tag whose head is the base
        tag: String,

        /// source directory
        source: PathBuf,

        /// discard a pending staged entry first
        #[arg(short, long)]
        force: bool,
    },

    /// commit the staged entry and advance a tag
    Commit {
        /// tag to advance
        tag: String,
    },

    /// materialize a tag's head into a directory
    Restore {
        /// tag to restore
        tag: String,

        /// destination directory
        destination: PathBuf,
    },

    /// list tags
    Tags {
        /// glob pattern to filter tag names
        pattern: Option<String>,
    },

    /// show the chain history of a tag
    Log {
        /// tag to show history for
        tag: String,

        /// maximum number of entries to show
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
    },

    /// check that every file of a tag's head can be decoded
    Verify {
        /// tag to verify
        tag: String,
    },

    /// show the pending staged entry
    Status,

    /// drop the pending staged entry
    Discard,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TP_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_store(cli: &Cli) -> tp::Result<Store> {
    let config = Config::load_or_default(&cli.config)?;
    Store::open(&config)
}

fn run(cli: Cli) -> tp::Result<ExitCode> {
    match &cli.command {
        Commands::Version { source, force } => {
            let config = Config::load_or_default(&cli.config)?;
            let options = StageOptions { force: *force };
            let report = ops::version(&config.codec()?, source, &cli.staging, &options)?;
            println!(
                "staged {} ({} changed, {} chunks)",
                report.id, report.changed, report.chunks
            );
        }

        Commands::Patch { tag, source, force } => {
            let store = open_store(&cli)?;
            let options = StageOptions { force: *force };
            let report = ops::patch(&store, tag, source, &cli.staging, &options)?;
            println!(
                "staged {} on {} ({} changed, {} deleted, {} chunks)",
                report.id, report.base_id, report.changed, report.deleted, report.chunks
            );
            store.close()?;
        }

        Commands::Commit { tag } => {
            let store = open_store(&cli)?;
            let report = ops::commit(&store, tag, &cli.staging)?;
            if report.resumed {
                println!("{} -> {} (resumed)", report.tag, report.id);
            } else {
                println!(
                    "{} -> {} ({} chunks uploaded)",
                    report.tag, report.id, report.chunks
                );
            }
            store.close()?;
        }

        Commands::Restore { tag, destination } => {
            let store = open_store(&cli)?;
            let report = ops::restore(&store, tag, destination)?;
            println!(
                "restored {}: {} written, {} up to date, {} removed",
                tag, report.written, report.skipped, report.removed
            );
            store.close()?;
        }

        Commands::Tags { pattern } => {
            let store = open_store(&cli)?;
            for tag in ops::tags(store.meta(), pattern.as_deref())? {
                println!("{}\t{}", tag.name, tag.id);
            }
            store.close()?;
        }

        Commands::Log { tag, max_count } => {
            let store = open_store(&cli)?;
            for entry in ops::log(&store, tag, *max_count)? {
                println!("{}", entry);
            }
            store.close()?;
        }

        Commands::Verify { tag } => {
            let store = open_store(&cli)?;
            let report = ops::verify(&store, tag)?;
            store.close()?;

            println!(
                "{} at {}: {} files, {} contents checked",
                tag, report.head, report.files_checked, report.contents_checked
            );
            for missing in &report.missing {
                println!("missing: {} (chunk {})", missing.file_name, missing.chunk);
            }
            for corrupt in &report.corrupt {
                println!(
                    "corrupt: {} (expected {}, got {})",
                    corrupt.file_name, corrupt.expected, corrupt.actual
                );
            }

            if !report.is_ok() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Status => match ops::status(&cli.staging)? {
            Some(entry) => {
                let base = if entry.base_id.is_root() {
                    "(root)".to_string()
                } else {
                    entry.base_id.to_string()
                };
                println!("staged {} on {}", entry.id, base);
                for changed in &entry.changed {
                    println!("  changed: {}", changed.file_name);
                }
                for deleted in &entry.deleted {
                    println!("  deleted: {}", deleted.file_name);
                }
            }
            None => println!("nothing staged in {}", cli.staging.display()),
        },

        Commands::Discard => {
            if ops::discard(&cli.staging)? {
                println!("discarded {}", cli.staging.display());
            } else {
                println!("nothing staged in {}", cli.staging.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
