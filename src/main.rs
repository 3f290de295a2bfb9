use clap::Parser;
use colored::*;
use dendrosort::cli::{Cli, Commands};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with FASTA output on stdout;
    // DENDROSORT_LOG overrides the --verbose flag.
    let log_level = std::env::var("DENDROSORT_LOG").unwrap_or_else(|_| {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<dendrosort::DendrosortError>() {
            Some(dendrosort::DendrosortError::InvalidInput(_)) => 2,
            Some(dendrosort::DendrosortError::Io(_)) => 3,
            Some(dendrosort::DendrosortError::Parse(_)) => 4,
            Some(dendrosort::DendrosortError::DegenerateTree(_))
            | Some(dendrosort::DendrosortError::InvariantViolation(_)) => 5,
            None => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let num_threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .expect("Failed to initialize thread pool");

    match cli.command {
        Commands::Sort(args) => dendrosort::cli::commands::sort::run(&args)?,
    }

    Ok(())
}
