use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use klotski_core::{load_config, load_default_config};

#[derive(Parser)]
#[command(name = "klotski-api", about = "Serve a Klotski solution over HTTP")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "KLOTSKI_PORT")]
    port: u16,

    /// Path to klotski.toml (default: auto-discover)
    #[arg(long, env = "KLOTSKI_CONFIG")]
    config: Option<PathBuf>,

    /// Override the Zobrist seed
    #[arg(long, env = "KLOTSKI_SEED")]
    seed: Option<u64>,
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

    klotski_api::serve(config, cli.port).await
}
