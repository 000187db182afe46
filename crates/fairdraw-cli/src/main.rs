//! Fairdraw CLI
//!
//! Command-line interface for simulating draws, checking upkeep on a saved
//! round, and verifying event logs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Fairdraw: recurring prize draws with auditable winner selection
#[derive(Parser)]
#[command(name = "fairdraw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one or more complete draw rounds in memory
    Simulate {
        /// Number of rounds to run
        #[arg(short, long, default_value_t = 3)]
        rounds: u32,

        /// Participants entering each round
        #[arg(short, long, default_value_t = 5)]
        participants: u32,

        /// Entrance fee per entry
        #[arg(short, long, default_value_t = 100)]
        entrance_fee: u64,

        /// Draw interval in milliseconds
        #[arg(short, long, default_value_t = 30_000)]
        interval_ms: i64,

        /// Seed for the simulated randomness source
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Append events to a hash-chained log file
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Write the final round state to a snapshot file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Evaluate the upkeep predicate against a saved round snapshot
    Check {
        /// Round snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Evaluate at this timestamp instead of the wall clock
        #[arg(short, long)]
        now_ms: Option<i64>,

        /// Output format
        #[arg(short, long, default_value = "human", value_parser = ["human", "json"])]
        format: String,
    },

    /// Verify the hash chain of an event log file
    VerifyLog {
        /// Event log file (JSONL)
        #[arg(short, long)]
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Simulate {
            rounds,
            participants,
            entrance_fee,
            interval_ms,
            seed,
            log,
            snapshot,
        } => commands::simulate::run(
            rounds,
            participants,
            entrance_fee,
            interval_ms,
            seed,
            log,
            snapshot,
        ),
        Commands::Check {
            snapshot,
            now_ms,
            format,
        } => commands::check::run(snapshot, now_ms, format),
        Commands::VerifyLog { log } => commands::verify_log::run(log),
    }
}
