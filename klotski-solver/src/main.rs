//! Klotski Solver
//!
//! Solves the 4x5 sliding-block puzzle and prints every move, or serves
//! the solution over HTTP.

mod stats;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use klotski_core::{load_config, load_default_config, render, SolverConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Print the solution to stdout
    Cli,
    /// Serve the solution as HTML and JSON
    Http,
}

#[derive(Parser)]
#[command(name = "klotski", about = "Klotski sliding-block puzzle solver")]
struct Cli {
    /// Run mode
    #[arg(long, value_enum, default_value = "cli", env = "KLOTSKI_MODE")]
    mode: Mode,

    /// Override the Zobrist seed
    #[arg(long, env = "KLOTSKI_SEED")]
    seed: Option<u64>,

    /// Path to klotski.toml (default: auto-discover)
    #[arg(long, env = "KLOTSKI_CONFIG")]
    config: Option<PathBuf>,

    /// Port for http mode
    #[arg(short, long, default_value = "8000", env = "KLOTSKI_PORT")]
    port: u16,

    /// Print only the move list, without a grid per step
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => load_config(path)?,
        None => load_default_config(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    match cli.mode {
        Mode::Cli => run_cli(&config, cli.quiet),
        Mode::Http => klotski_api::serve(config, cli.port).await,
    }
}

fn run_cli(config: &SolverConfig, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = config.board()?;

    println!("Klotski Solver");
    println!("==============");
    println!("Seed: {:#x}", config.seed);
    println!(
        "Goal: {} at ({}, {})",
        config.goal.piece, config.goal.x, config.goal.y
    );

    println!("\nInitial State:\n");
    println!("{}", render(board.root()));

    let start = Instant::now();
    let steps = board.solve()?;
    let elapsed = start.elapsed();

    println!(
        "\nNumber of moves needed to reach final state: {}\n",
        steps.len()
    );
    for (number, step) in steps.iter().enumerate() {
        if quiet {
            println!("{}) {}", number + 1, step);
        } else {
            println!("{}) {}\n", number + 1, step);
            println!("{}", render(&step.arrangement));
        }
    }

    println!("\n==============");
    stats::print_summary(&board.stats(), elapsed);

    board.replay(&steps)?;
    Ok(())
}
