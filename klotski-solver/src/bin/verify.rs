//! Solve the configured layout under several Zobrist seeds and replay each
//! solution through the legality checker.
//!
//! Exits non-zero if any seed fails to solve or replay.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use klotski_core::{load_config, load_default_config, SolverConfig};

#[derive(Parser)]
#[command(name = "verify", about = "Replay solutions across Zobrist seeds")]
struct Cli {
    /// Seeds to try
    #[arg(default_values_t = [0x6b6c_6f74u64, 0, 1, 42, 0xdead_beef])]
    seeds: Vec<u64>,

    /// Path to klotski.toml (default: auto-discover)
    #[arg(long, env = "KLOTSKI_CONFIG")]
    config: Option<PathBuf>,
}

fn verify(config: &SolverConfig) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let mut board = config.board()?;
    let steps = board.solve()?;
    board.replay(&steps)?;
    Ok((steps.len(), board.stats().examined))
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let cli = Cli::parse();
    let base = match cli.config {
        Some(ref path) => load_config(path)?,
        None => load_default_config(),
    };

    let mut failed = 0;
    for &seed in &cli.seeds {
        let config = SolverConfig {
            seed,
            ..base.clone()
        };
        let start = Instant::now();
        match verify(&config) {
            Ok((moves, examined)) => println!(
                "seed {:#018x}: OK   moves={} examined={} time={:.3}s",
                seed,
                moves,
                examined,
                start.elapsed().as_secs_f64()
            ),
            Err(e) => {
                failed += 1;
                println!("seed {:#018x}: FAIL {}", seed, e);
            }
        }
    }

    println!("\n{} passed, {} failed", cli.seeds.len() - failed, failed);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
