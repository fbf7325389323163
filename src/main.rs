// SPDX-License-Identifier: MPL-2.0

use avcam::Config;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "avcam")]
#[command(about = "Capture session manager demo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available capture devices
    Devices,

    /// Take a photo
    Photo,

    /// Record a video
    Record {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=avcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();
    let config = Config::load(&Config::default_path());

    match args.command {
        Commands::Devices => cli::list_devices().await,
        Commands::Photo => cli::take_photo(config).await,
        Commands::Record { duration } => cli::record_video(config, duration).await,
    }
}
