//! Demo binary that streams a square of chunk columns around a viewer.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo` to generate the default world.
//! Run with `cargo run -p strata-demo -- --radius 4 --flat` for a quick flat run.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::{DVec3, IVec2, IVec3};
use rustc_hash::FxHashSet;
use strata_config::{CliArgs, Config};
use strata_terrain::{
    ColumnConsumer, ColumnLayout, FlatSource, GenerationPipeline, HeightmapParams, NoiseSource,
    PipelineError, PoolConfig, VolumeSource,
};
use strata_voxel::coords::{column_of, neighbor_positions, positions_around, section_of, to_local};
use strata_voxel::{BlockId, ChunkColumn};
use tracing::{error, info, warn};

/// Give up waiting when no column has arrived for this long.
const STALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("received {received} of {expected} columns ({rejected} rejected as corrupt)")]
    Incomplete {
        received: usize,
        rejected: usize,
        expected: usize,
    },

    #[error("{missing} neighbor(s) of viewer column {center} never arrived")]
    MissingNeighbors { center: IVec2, missing: usize },
}

/// Where the viewer stands, in chunk-grid terms.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ViewerAnchor {
    column: IVec2,
    /// Vertical slice holding the viewer, if it is not below the world.
    slice: Option<usize>,
    /// Cell within that slice.
    local: IVec3,
}

impl ViewerAnchor {
    fn from_config(config: &Config) -> Self {
        let world = DVec3::from_array(config.streaming.viewer);
        let resolution = config.world.chunk_resolution;
        let cell_size = config.world.cell_size;
        let section = section_of(world, resolution, cell_size);
        let global = (world / cell_size).floor().as_ivec3();
        Self {
            column: column_of(world, resolution, cell_size),
            slice: usize::try_from(section.z).ok(),
            local: to_local(global, section, resolution),
        }
    }

    /// Block at the viewer's cell, if `column` is tall enough to hold it.
    fn block_in(&self, column: &ChunkColumn) -> Option<BlockId> {
        let grid = column.slice(self.slice?)?;
        Some(grid.get(self.local.x as u8, self.local.y as u8, self.local.z as u8))
    }
}

/// Consumer that keeps summary statistics instead of the columns themselves.
#[derive(Debug, Default)]
struct WorldStats {
    viewer: ViewerAnchor,
    columns: usize,
    rejected: usize,
    slices: usize,
    uniform_slices: usize,
    regions: usize,
    lod_regions: usize,
    nearest_first: Option<IVec2>,
    viewer_block: Option<BlockId>,
    received: FxHashSet<IVec2>,
}

impl WorldStats {
    fn new(viewer: ViewerAnchor) -> Self {
        Self {
            viewer,
            ..Default::default()
        }
    }

    /// Neighbors of the viewer column that have not been delivered.
    fn missing_neighbors(&self) -> Vec<IVec2> {
        neighbor_positions(self.viewer.column)
            .into_iter()
            .filter(|p| !self.received.contains(p))
            .collect()
    }

    /// Fails unless every expected column arrived intact around the viewer.
    fn ensure_complete(&self, expected: usize) -> Result<(), DemoError> {
        if self.columns < expected {
            return Err(DemoError::Incomplete {
                received: self.columns,
                rejected: self.rejected,
                expected,
            });
        }
        let missing = self.missing_neighbors();
        if !missing.is_empty() {
            return Err(DemoError::MissingNeighbors {
                center: self.viewer.column,
                missing: missing.len(),
            });
        }
        Ok(())
    }

    /// Average region count of a non-uniform slice.
    fn mean_mixed_regions(&self) -> f64 {
        let mixed = self.slices - self.uniform_slices;
        if mixed == 0 {
            0.0
        } else {
            (self.regions - self.uniform_slices) as f64 / mixed as f64
        }
    }
}

impl ColumnConsumer for WorldStats {
    fn on_column_ready(&mut self, column: ChunkColumn) {
        let position = column.position();
        if let Err(e) = column.validate() {
            error!("column {position} is corrupt: {e}");
            self.rejected += 1;
            return;
        }
        self.nearest_first.get_or_insert(position);
        self.received.insert(position);
        self.columns += 1;
        if position == self.viewer.column {
            self.viewer_block = self.viewer.block_in(&column);
        }

        let lod_resolution = (column.resolution() / 4).max(1);
        for grid in column.slices() {
            self.slices += 1;
            if grid.is_uniform() {
                self.uniform_slices += 1;
            }
            self.regions += grid.region_count();
            self.lod_regions += grid.generate_lod(lod_resolution).region_count();
        }
    }
}

fn build_source(config: &Config) -> Arc<dyn VolumeSource> {
    let terrain = &config.terrain;
    let block = BlockId(terrain.solid_block);
    if terrain.flat {
        Arc::new(FlatSource::from_noise_value(0.5, config.world.world_height, block))
    } else {
        let params = HeightmapParams {
            seed: terrain.seed,
            octaves: terrain.octaves,
            base_frequency: terrain.base_frequency,
            amplitude: terrain.amplitude,
            ..Default::default()
        };
        Arc::new(NoiseSource::new(params, terrain.base_height, block))
    }
}

fn pool_config(config: &Config) -> Result<PoolConfig, PipelineError> {
    Ok(PoolConfig {
        worker_count: config.generation.worker_threads,
        idle_interval: Duration::from_millis(config.generation.idle_interval_ms),
        throttle: Duration::from_millis(config.generation.throttle_ms),
        layout: ColumnLayout::from_world_height(
            config.world.chunk_resolution,
            config.world.world_height,
        )?,
    })
}

/// Seeds the pipeline around the viewer and drains it tick by tick until every
/// column arrived.
fn run(config: &Config) -> Result<WorldStats, DemoError> {
    let pool = pool_config(config)?;
    let pipeline = GenerationPipeline::spawn(&pool, build_source(config))?;

    let viewer = ViewerAnchor::from_config(config);
    let radius = config.streaming.initial_radius as i32;
    let positions = positions_around(viewer.column, radius);
    let expected = positions.len();
    pipeline.enqueue_positions(viewer.column, positions);
    info!(
        columns = expected,
        workers = pipeline.pool().worker_count(),
        "Streaming world around viewer column {}",
        viewer.column
    );

    let tick = Duration::from_millis(config.streaming.tick_interval_ms);
    let started = Instant::now();
    let mut last_progress = Instant::now();
    let mut stats = WorldStats::new(viewer);

    while stats.columns + stats.rejected < expected {
        let drained = pipeline.drain_into(&mut stats, config.streaming.columns_per_tick);
        if drained > 0 {
            last_progress = Instant::now();
            tracing::debug!(
                received = stats.columns,
                pending = pipeline.pending_len(),
                ready = pipeline.ready_len(),
                "tick"
            );
        } else if last_progress.elapsed() > STALL_TIMEOUT {
            warn!(
                received = stats.columns,
                rejected = stats.rejected,
                expected,
                "No column arrived within {STALL_TIMEOUT:?}, giving up"
            );
            break;
        }
        std::thread::sleep(tick);
    }

    info!(
        columns = stats.columns,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Streaming finished"
    );
    pipeline.shutdown()?;
    stats.ensure_complete(expected)?;
    Ok(stats)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("strata")
    });

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::from(2);
    }

    match run(&config) {
        Ok(stats) => {
            info!(
                columns = stats.columns,
                slices = stats.slices,
                uniform_slices = stats.uniform_slices,
                regions = stats.regions,
                lod_regions = stats.lod_regions,
                mean_mixed_regions = stats.mean_mixed_regions(),
                "World summary"
            );
            if let Some(first) = stats.nearest_first {
                info!("First column delivered: {first}");
            }
            if let Some(block) = stats.viewer_block {
                info!("Viewer stands in block {block}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Generation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.world.world_height = 64;
        config.generation.worker_threads = 2;
        config.generation.throttle_ms = 0;
        config.streaming.initial_radius = 1;
        config.streaming.tick_interval_ms = 1;
        config.terrain.flat = true;
        config
    }

    #[test]
    fn test_pool_config_from_defaults() {
        let pool = pool_config(&Config::default()).unwrap();
        assert_eq!(pool.layout, ColumnLayout::new(16, 16));
        assert_eq!(pool.worker_count, 0);
        assert_eq!(pool.throttle, Duration::from_millis(10));
    }

    #[test]
    fn test_pool_config_rejects_bad_height() {
        let mut config = Config::default();
        config.world.world_height = 100;
        assert!(matches!(
            pool_config(&config),
            Err(PipelineError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_stats_count_flat_column() {
        let config = small_config();
        let layout = pool_config(&config).unwrap().layout;
        let column = strata_terrain::generate_column(
            build_source(&config).as_ref(),
            IVec2::new(1, 1),
            &layout,
        );
        let mut stats = WorldStats::default();
        stats.on_column_ready(column);
        assert_eq!(stats.columns, 1);
        assert_eq!(stats.rejected, 0);
        assert!(stats.received.contains(&IVec2::new(1, 1)));
        assert_eq!(stats.viewer_block, None);
        assert_eq!(stats.slices, 4);
        // A flat surface at 48 of 64 cells leaves every slice uniform.
        assert_eq!(stats.uniform_slices, 4);
        assert_eq!(stats.regions, 4);
        assert_eq!(stats.mean_mixed_regions(), 0.0);
        assert_eq!(stats.nearest_first, Some(IVec2::new(1, 1)));
    }

    #[test]
    fn test_viewer_anchor_from_config() {
        let anchor = ViewerAnchor::from_config(&Config::default());
        assert_eq!(anchor.column, IVec2::ZERO);
        assert_eq!(anchor.slice, Some(12));
        assert_eq!(anchor.local, IVec3::new(8, 8, 8));

        let mut config = Config::default();
        config.world.cell_size = 2.0;
        config.streaming.viewer = [-40.0, 12.5, 3.0];
        let anchor = ViewerAnchor::from_config(&config);
        assert_eq!(anchor.column, IVec2::new(-2, 0));
        assert_eq!(anchor.slice, Some(0));
        assert_eq!(anchor.local, IVec3::new(12, 6, 1));

        config.streaming.viewer = [0.0, 0.0, -5.0];
        assert_eq!(ViewerAnchor::from_config(&config).slice, None);
    }

    #[test]
    fn test_viewer_block_is_sampled_from_its_column() {
        let mut config = small_config();
        config.streaming.viewer = [3.0, 4.0, 10.0];
        let layout = pool_config(&config).unwrap().layout;
        let mut stats = WorldStats::new(ViewerAnchor::from_config(&config));
        stats.on_column_ready(strata_terrain::generate_column(
            build_source(&config).as_ref(),
            IVec2::ZERO,
            &layout,
        ));
        assert_eq!(stats.viewer_block, Some(BlockId(config.terrain.solid_block)));
    }

    #[test]
    fn test_short_run_is_an_error() {
        let mut stats = WorldStats::default();
        stats.columns = 7;
        stats.rejected = 1;
        let err = stats.ensure_complete(9).unwrap_err();
        assert!(matches!(
            err,
            DemoError::Incomplete {
                received: 7,
                rejected: 1,
                expected: 9
            }
        ));
    }

    #[test]
    fn test_missing_neighbors_are_an_error() {
        let mut stats = WorldStats::new(ViewerAnchor {
            column: IVec2::new(5, 5),
            ..Default::default()
        });
        stats.columns = 4;
        stats.received.extend([
            IVec2::new(5, 5),
            IVec2::new(6, 5),
            IVec2::new(5, 6),
            IVec2::new(9, 9),
        ]);
        assert_eq!(stats.missing_neighbors().len(), 2);
        assert!(matches!(
            stats.ensure_complete(4),
            Err(DemoError::MissingNeighbors { missing: 2, .. })
        ));

        stats.received.extend([IVec2::new(4, 5), IVec2::new(5, 4)]);
        stats.ensure_complete(4).unwrap();
    }

    #[test]
    fn test_run_small_world() {
        let mut config = small_config();
        config.streaming.viewer = [40.0, -8.0, 10.0];
        let stats = run(&config).unwrap();
        assert_eq!(stats.columns, 9);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.slices, 36);
        assert_eq!(stats.viewer.column, IVec2::new(2, -1));
        assert!(stats.missing_neighbors().is_empty());
        assert_eq!(stats.viewer_block, Some(BlockId(config.terrain.solid_block)));
    }
}
