//! Command line entry point for inspecting and validating GEFF stores.
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geff::{GeffReader, ReadOptions, read_to_memory, validate_structure};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "geff", version, about = "Inspect and validate GEFF graph stores")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a store follows the GEFF layout
    Validate {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(long, help = "Also load the graph and check edges, self edges and duplicates")]
        data: bool,
    },
    /// Print the metadata document as JSON
    Info {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

fn install_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn main() -> Result<()> {
    install_tracing_subscriber();
    let cli = Cli::parse();
    match cli.command {
        Command::Validate { path, data } => {
            validate_structure(&path).with_context(|| format!("{path} is not a valid GEFF store"))?;
            if data {
                read_to_memory(&path, &ReadOptions::new().with_data_validation(true))
                    .with_context(|| format!("{path} has invalid graph data"))?;
            }
            println!("{path} is valid");
        }
        Command::Info { path } => {
            let reader = GeffReader::open(&path, false).with_context(|| format!("failed to open {path}"))?;
            println!("{}", reader.metadata().to_json_pretty()?);
        }
    }
    Ok(())
}
