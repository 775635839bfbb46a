mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analytics::ConvergenceArgs;
use commands::pricing::PriceArgs;
use commands::scenarios::{LadderArgs, SensitivityArgs};

/// Cox-Ross-Rubinstein binomial option pricing
#[derive(Parser)]
#[command(
    name = "crr",
    version,
    about = "European option pricing on a Cox-Ross-Rubinstein binomial lattice",
    long_about = "Prices European calls and puts by backward induction on a recombining \
                  CRR lattice. Parameters come from flags, a JSON/YAML input file, or \
                  JSON piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Reject lattices with more steps than this (bounds latency, O(N^2) work)
    #[arg(long, default_value_t = 100_000, global = true)]
    max_steps: u32,

    /// Enable debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a European call or put
    Price(PriceArgs),
    /// Compare lattice prices at several step counts against Black-Scholes
    Convergence(ConvergenceArgs),
    /// Price across a one-parameter sweep
    Ladder(LadderArgs),
    /// Two-parameter sensitivity grid
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    /// Human-readable line, e.g. "Option Price: 7.48"
    Display,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let limits = commands::Limits {
        max_steps: cli.max_steps,
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Price(args) => commands::pricing::run_price(args, &limits),
        Commands::Convergence(args) => commands::analytics::run_convergence(args, &limits),
        Commands::Ladder(args) => commands::scenarios::run_ladder(args, &limits),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args, &limits),
        Commands::Version => {
            println!("crr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
