//! nvblob CLI
//!
//! Host tools for working with nvblob partition files.
//!
//! # Commands
//!
//! - `setup` - Initialize a partition, optionally erasing it first
//! - `put` - Write a segment
//! - `get` - Read a segment
//! - `inspect` - List stored segments

mod commands;

use clap::{Parser, Subcommand};
use nvblob_storage::DEFAULT_PARTITION_CAPACITY;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// nvblob partition tools.
#[derive(Parser)]
#[command(name = "nvblob")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the partition file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Partition capacity in bytes
    #[arg(global = true, short, long, default_value_t = DEFAULT_PARTITION_CAPACITY)]
    capacity: usize,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the partition
    Setup {
        /// Erase all segments before initializing
        #[arg(long)]
        force_erase: bool,
    },

    /// Write a segment
    Put {
        /// Segment name
        segment: String,

        /// Stored size of the segment; data is zero-padded to it
        #[arg(long)]
        size: usize,

        /// Text to store
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        value: Option<String>,

        /// File whose contents to store
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Read a segment
    Get {
        /// Segment name
        segment: String,

        /// Number of bytes to read
        #[arg(long)]
        size: usize,

        /// Output format (text, hex)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List stored segments
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Setup { force_erase } => {
            let path = cli.path.ok_or("Partition path required for setup")?;
            commands::setup::run(&path, cli.capacity, force_erase)?;
        }
        Commands::Put {
            segment,
            size,
            value,
            file,
        } => {
            let path = cli.path.ok_or("Partition path required for put")?;
            let data = match (value, file) {
                (Some(value), _) => value.into_bytes(),
                (None, Some(file)) => std::fs::read(file)?,
                (None, None) => return Err("either --value or --file is required".into()),
            };
            commands::put::run(&path, cli.capacity, &segment, size, &data)?;
        }
        Commands::Get {
            segment,
            size,
            format,
        } => {
            let path = cli.path.ok_or("Partition path required for get")?;
            commands::get::run(&path, cli.capacity, &segment, size, &format)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Partition path required for inspect")?;
            commands::inspect::run(&path, cli.capacity, &format)?;
        }
        Commands::Version => {
            println!("nvblob CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("nvblob Core v{}", nvblob_core::VERSION);
            println!("Partition format v{}", nvblob_storage::FORMAT_VERSION);
        }
    }

    Ok(())
}
