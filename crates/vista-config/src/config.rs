//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vista_lod::{LodDescriptor, LodTable};
use vista_mesh::KeyframeCurve;
use vista_stream::StreamerSettings;
use vista_terrain::{
    BandClassifier, CHUNK_SAMPLE_SIZE, Classifier, ColorBand, NoiseParameters,
    default_color_bands,
};

use crate::error::ConfigError;

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Height-field and mesh generation.
    pub terrain: TerrainConfig,
    /// LOD table, movement gating, worker pool.
    pub streaming: StreamingConfig,
    /// Fly-through run of the `vista` binary.
    pub demo: DemoConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Terrain generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Noise parameters. `centre` is ignored; each chunk sets its own.
    pub noise: NoiseParameters,
    /// Samples along each chunk edge.
    pub chunk_sample_size: usize,
    /// World-space height of a curve output of 1.
    pub height_multiplier: f32,
    /// Remapping of normalized heights before scaling.
    pub height_curve: KeyframeCurve,
    /// Colour bands for the classifier. Empty disables colouring.
    pub color_bands: Vec<ColorBand>,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// LOD levels by ascending view distance. The last threshold is the view
    /// distance.
    pub lod_levels: Vec<LodDescriptor>,
    /// Distance the viewer must move before visibility is recomputed.
    pub viewer_move_threshold: f32,
    /// Worker threads (0 = all cores but two).
    pub worker_threads: usize,
}

/// Fly-through configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of ticks to run.
    pub ticks: u32,
    /// Viewer speed in world units per second.
    pub viewer_speed: f32,
    /// Wall-clock time per tick.
    pub tick_interval_ms: u64,
    /// Direction of travel in degrees, counter-clockwise from +X.
    pub heading: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "vista_stream=trace").
    pub log_level: String,
    /// Also write JSON logs to `vista.log` (debug builds only).
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseParameters::default(),
            chunk_sample_size: CHUNK_SAMPLE_SIZE,
            height_multiplier: 40.0,
            height_curve: KeyframeCurve::flat_below(0.3),
            color_bands: default_color_bands(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            lod_levels: LodTable::default_terrain().levels().to_vec(),
            viewer_move_threshold: 25.0,
            worker_threads: 0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            viewer_speed: 120.0,
            tick_interval_ms: 16,
            heading: 30.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

// --- Validation ---

impl Config {
    /// Check that the terrain and streaming sections can drive a streamer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streamer_settings().map(|_| ())
    }

    /// Build streamer settings from the terrain and streaming sections.
    ///
    /// Noise parameters are sanitized, so out-of-range numbers are clamped
    /// rather than rejected. The LOD table and sample size must be valid.
    pub fn streamer_settings(&self) -> Result<StreamerSettings, ConfigError> {
        let lods =
            LodTable::new(self.streaming.lod_levels.clone()).map_err(ConfigError::InvalidLod)?;

        let classifier: Option<Arc<dyn Classifier>> = if self.terrain.color_bands.is_empty() {
            None
        } else {
            Some(Arc::new(BandClassifier::new(self.terrain.color_bands.clone())))
        };

        let settings = StreamerSettings {
            noise: self.terrain.noise.sanitized(),
            chunk_sample_size: self.terrain.chunk_sample_size,
            lods,
            height_multiplier: self.terrain.height_multiplier,
            height_curve: Arc::new(self.terrain.height_curve.clone()),
            classifier,
            viewer_move_threshold: self.streaming.viewer_move_threshold,
            worker_threads: self.streaming.worker_threads,
        };
        settings
            .validate()
            .map_err(ConfigError::InvalidStreaming)?;
        Ok(settings)
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
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

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
