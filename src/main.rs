// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "pocket-camera")]
#[command(about = "Still photo capture from the command line")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/pocket-camera/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a photo and save it to the gallery
    Photo {
        /// Image file to use as the camera sensor (default: test pattern)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Sensor rotation in degrees (0, 90, 180 or 270)
        #[arg(short, long, default_value = "0")]
        rotation: i32,

        /// Gallery directory (default: ~/Pictures/pocket-camera)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the most recent photo in the gallery
    Latest,

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=pocket_camera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Photo {
            source,
            rotation,
            output,
        } => cli::take_photo(config_path, source, rotation, output),
        Commands::Latest => cli::show_latest(config_path),
        Commands::Config { write } => cli::show_config(config_path, write),
    }
}
