//! `pistore`: host identity, path scanning and chunk tooling.
//!
//! ```text
//! pistore host-id                          # print this host's identifier
//! pistore scan /home/me                    # list every path with its POID
//! pistore pack big.iso --offset 4096 --length 1048576
//! pistore verify chunks/*.chunk            # integrity report per chunk
//! ```

mod commands;
mod error;
mod logging;
mod walk;

use clap::{Parser, Subcommand};
use exn::ResultExt;
use pistore_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pistore", version, about = "Content-addressed chunk backup tools")]
struct Cli {
    /// Config file (TOML, YAML or JSON). Defaults to pistore.toml in the
    /// platform config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the identifier of this host.
    HostId,
    /// Walk a path and print the POID of every file and directory in it.
    Scan {
        path: PathBuf,
    },
    /// Build a chunk from (a byte range of) a file and store it.
    Pack {
        file: PathBuf,
        /// Backup version the chunk first appears in.
        #[arg(long, default_value_t = 1)]
        birth_version: u64,
        /// Byte offset within the file to start reading at.
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Number of bytes to read. Reads to end of file when omitted.
        #[arg(long)]
        length: Option<u64>,
    },
    /// Check stored chunk files for damage.
    Verify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print each chunk as JSON instead of a report line.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()).or_raise(|| error::ErrorKind::Config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:?}");
            return ExitCode::FAILURE;
        },
    };
    logging::setup_tracing(&config.log_level);

    let outcome = match cli.command {
        Commands::HostId => commands::host_id(&config),
        Commands::Scan { path } => commands::scan(&config, &path),
        Commands::Pack { file, birth_version, offset, length } => {
            commands::pack(&config, &file, birth_version, offset, length)
        },
        Commands::Verify { files, json } => commands::verify(&files, json),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
