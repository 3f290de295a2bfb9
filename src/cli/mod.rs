pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dendrosort",
    version,
    about = "Guide-tree based FASTA ordering for reproducible aligner benchmarks",
    long_about = "Dendrosort reorders the records of a FASTA file so that similar sequences \
                  appear next to each other, by clustering them into a guide tree and emitting \
                  the leaves in traversal order. Partial-order aligners build their graphs \
                  incrementally, so a stable, similarity-driven input order makes benchmark \
                  runs reproducible and comparable."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reorder FASTA records by a similarity guide tree
    Sort(commands::sort::SortArgs),
}
