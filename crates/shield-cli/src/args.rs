//! CLI argument surface (SPEC_FULL.md §2.4), grounded in
//! `assay-cli/src/cli/args/mod.rs`'s `Cli`/`Command` split.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shield", version, about = "Policy refinement engine for network attack mitigation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the file watcher and message consumer daemon.
    Run(RunArgs),
    /// Process a single attack CSV file and print the emitted HSPL/MSPL.
    Once(OnceArgs),
    /// Load and sanity-check the landscape and recipe library without ingesting events.
    Validate(ValidateArgs),
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "shield.toml")]
    pub config: PathBuf,
}

#[derive(Parser, Clone)]
pub struct OnceArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "shield.toml")]
    pub config: PathBuf,

    /// The attack CSV file to process.
    pub attack_file: PathBuf,

    /// Seed the action/node selection RNG for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Clone)]
pub struct ValidateArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "shield.toml")]
    pub config: PathBuf,
}
