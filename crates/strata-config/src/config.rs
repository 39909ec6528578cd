//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest chunk resolution the voxel storage supports.
const MAX_CHUNK_RESOLUTION: u8 = 128;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Shape of the voxel world.
    pub world: WorldConfig,
    /// Worker pool settings.
    pub generation: GenerationConfig,
    /// Bootstrap and consumer pacing.
    pub streaming: StreamingConfig,
    /// Terrain shaping.
    pub terrain: TerrainConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World shape configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of one chunk in cells. A power of two up to 128.
    pub chunk_resolution: u8,
    /// Height of a chunk column in cells. A multiple of `chunk_resolution`.
    pub world_height: u32,
    /// World-space edge length of one cell.
    pub cell_size: f64,
}

/// Generation worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of worker threads (0 = derive from the CPU count).
    pub worker_threads: usize,
    /// Longest an idle worker waits for work before re-checking for shutdown.
    pub idle_interval_ms: u64,
    /// Pause after each generated column.
    pub throttle_ms: u64,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// World-space position of the viewer; streaming is centered on its column.
    pub viewer: [f64; 3],
    /// Chebyshev radius, in columns, seeded around the viewer at startup.
    pub initial_radius: u32,
    /// Most finished columns handed to the consumer per tick.
    pub columns_per_tick: usize,
    /// Interval between consumer ticks.
    pub tick_interval_ms: u64,
}

/// Terrain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World seed for deterministic generation.
    pub seed: u64,
    /// Use a constant surface instead of noise.
    pub flat: bool,
    /// Mean surface height in cells.
    pub base_height: f64,
    /// Amplitude of the first noise octave in cells.
    pub amplitude: f64,
    /// Frequency of the first noise octave in cycles per cell.
    pub base_frequency: f64,
    /// Number of noise octaves.
    pub octaves: u32,
    /// Block id written into solid cells.
    pub solid_block: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_resolution: 16,
            world_height: 256,
            cell_size: 1.0,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            idle_interval_ms: 10,
            throttle_ms: 10,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            viewer: [8.0, 8.0, 200.0],
            initial_radius: 12,
            columns_per_tick: 10,
            tick_interval_ms: 16,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            flat: false,
            base_height: 128.0,
            amplitude: 24.0,
            base_frequency: 0.01,
            octaves: 4,
            solid_block: 1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects settings the generation pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let res = self.world.chunk_resolution;
        if !res.is_power_of_two() || res > MAX_CHUNK_RESOLUTION {
            return Err(ConfigError::Invalid(format!(
                "world.chunk_resolution must be a power of two up to {MAX_CHUNK_RESOLUTION}, got {res}"
            )));
        }
        let height = self.world.world_height;
        if height == 0 || height % u32::from(res) != 0 {
            return Err(ConfigError::Invalid(format!(
                "world.world_height must be a positive multiple of {res}, got {height}"
            )));
        }
        let cell_size = self.world.cell_size;
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "world.cell_size must be a positive finite length, got {cell_size}"
            )));
        }
        if self.streaming.viewer.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "streaming.viewer must be a finite position, got {:?}",
                self.streaming.viewer
            )));
        }
        if self.streaming.initial_radius == 0 {
            return Err(ConfigError::Invalid(
                "streaming.initial_radius must be at least 1".to_string(),
            ));
        }
        if self.streaming.columns_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "streaming.columns_per_tick must be at least 1".to_string(),
            ));
        }
        if self.terrain.octaves == 0 {
            return Err(ConfigError::Invalid(
                "terrain.octaves must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of vertical chunk slices per column.
    pub fn slices_per_column(&self) -> usize {
        (self.world.world_height / u32::from(self.world.chunk_resolution.max(1))) as usize
    }
}
