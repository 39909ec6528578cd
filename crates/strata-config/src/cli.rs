//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Run-length voxel world generator")]
pub struct CliArgs {
    /// Number of generation worker threads (0 = auto).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Radius, in columns, generated around the origin.
    #[arg(long)]
    pub radius: Option<u32>,

    /// Chunk edge length in cells (power of two up to 128).
    #[arg(long)]
    pub resolution: Option<u8>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Generate a flat world instead of noise terrain.
    #[arg(long)]
    pub flat: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(threads) = args.threads {
            self.generation.worker_threads = threads;
        }
        if let Some(radius) = args.radius {
            self.streaming.initial_radius = radius;
        }
        if let Some(res) = args.resolution {
            self.world.chunk_resolution = res;
        }
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if args.flat {
            self.terrain.flat = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
