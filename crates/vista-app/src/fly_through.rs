//! Headless fly-through: moves a viewer across the terrain in a straight line
//! and streams chunks around it.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use tracing::{debug, info, warn};
use vista_config::{Config, ConfigError, DemoConfig};
use vista_mesh::MeshData;
use vista_stream::{ChunkCoord, ChunkStreamer, StreamError, TerrainRenderer, ViewerState};
use vista_terrain::ColorBuffer;

/// How long to wait for outstanding jobs after the last tick.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Ticks between progress lines.
const PROGRESS_INTERVAL: u32 = 60;

/// Errors that end a fly-through run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start streamer: {0}")]
    Stream(#[from] StreamError),
}

/// Straight-line viewer path at constant speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightPath {
    /// World units moved per tick.
    pub step: Vec2,
    pub interval: Duration,
}

impl FlightPath {
    pub fn new(demo: &DemoConfig) -> Self {
        let interval = Duration::from_millis(demo.tick_interval_ms);
        // A zero interval still advances the viewer as if ticking at 60 Hz.
        let seconds = if demo.tick_interval_ms == 0 {
            1.0 / 60.0
        } else {
            interval.as_secs_f32()
        };
        let direction = Vec2::from_angle(demo.heading.to_radians());
        Self {
            step: direction * demo.viewer_speed * seconds,
            interval,
        }
    }

    /// Viewer position at `tick`, starting from the origin.
    pub fn position_at(&self, tick: u32) -> Vec2 {
        self.step * tick as f32
    }
}

/// Renderer that logs and counts what it is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoggingRenderer {
    pub shown: u64,
    pub hidden: u64,
    pub meshes: u64,
    pub colors: u64,
}

impl TerrainRenderer for LoggingRenderer {
    fn on_visibility_changed(&mut self, coord: ChunkCoord, visible: bool) {
        if visible {
            self.shown += 1;
        } else {
            self.hidden += 1;
        }
        debug!(%coord, visible, "visibility changed");
    }

    fn on_mesh_ready(&mut self, coord: ChunkCoord, mesh: Arc<MeshData>) {
        self.meshes += 1;
        debug!(
            %coord,
            lod = mesh.lod,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "mesh ready"
        );
    }

    fn on_color_ready(&mut self, coord: ChunkCoord, colors: Arc<ColorBuffer>) {
        self.colors += 1;
        debug!(%coord, bytes = colors.as_bytes().len(), "colours ready");
    }
}

/// What a fly-through run did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub ticks: u32,
    pub final_position: Vec2,
    pub chunks: usize,
    pub visible: usize,
    pub height_jobs: u64,
    pub mesh_jobs: u64,
    pub failures: u64,
    pub renderer: LoggingRenderer,
    /// Whether every outstanding job finished before the settle timeout.
    pub settled: bool,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "flew {} ticks to ({:.1}, {:.1}) in {:.2?}",
            self.ticks, self.final_position.x, self.final_position.y, self.elapsed
        )?;
        writeln!(f, "  chunks:   {} ({} visible)", self.chunks, self.visible)?;
        writeln!(
            f,
            "  jobs:     {} height, {} mesh, {} failed",
            self.height_jobs, self.mesh_jobs, self.failures
        )?;
        write!(
            f,
            "  renderer: {} meshes, {} colour buffers{}",
            self.renderer.meshes,
            self.renderer.colors,
            if self.settled { "" } else { " (unsettled)" }
        )
    }
}

/// Run the fly-through described by `config.demo`.
pub fn run(config: &Config) -> Result<RunSummary, RunError> {
    let settings = config.streamer_settings()?;
    let mut streamer = ChunkStreamer::new(settings, LoggingRenderer::default())?;
    let path = FlightPath::new(&config.demo);
    let ticks = config.demo.ticks;

    info!(ticks, step = %path.step, "fly-through started");
    let start = Instant::now();

    for tick in 0..ticks {
        let report = streamer.tick(ViewerState {
            position: path.position_at(tick),
        });
        if report.recomputed {
            debug!(tick, viewer = %streamer.viewer_chunk(), "visibility recomputed");
        }
        if tick % PROGRESS_INTERVAL == 0 {
            info!(
                tick,
                chunks = streamer.chunk_count(),
                visible = report.visible_chunks,
                pending = report.pending_jobs,
                "progress"
            );
        }
        if !path.interval.is_zero() {
            std::thread::sleep(path.interval);
        }
    }

    let settled = streamer.wait_idle(SETTLE_TIMEOUT);
    if !settled {
        warn!(pending = streamer.pending_jobs(), "jobs still pending at exit");
    }

    let stats = streamer.stats();
    let summary = RunSummary {
        ticks,
        final_position: streamer.viewer_position(),
        chunks: streamer.chunk_count(),
        visible: streamer.visible_chunks().len(),
        height_jobs: stats.height_jobs_submitted,
        mesh_jobs: stats.mesh_jobs_submitted,
        failures: stats.generation_failures + stats.mesh_failures,
        renderer: *streamer.renderer(),
        settled,
        elapsed: start.elapsed(),
    };
    info!(
        chunks = summary.chunks,
        visible = summary.visible,
        failures = summary.failures,
        "fly-through finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_lod::LodDescriptor;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.terrain.chunk_sample_size = 61;
        config.streaming.lod_levels = vec![LodDescriptor::new(0, 60.0), LodDescriptor::new(2, 120.0)];
        config.streaming.viewer_move_threshold = 5.0;
        config.streaming.worker_threads = 2;
        config.demo.ticks = 30;
        config.demo.tick_interval_ms = 0;
        config.demo.viewer_speed = 600.0;
        config.demo.heading = 0.0;
        config
    }

    #[test]
    fn test_flight_path_follows_heading() {
        let demo = DemoConfig {
            ticks: 10,
            viewer_speed: 100.0,
            tick_interval_ms: 500,
            heading: 90.0,
        };
        let path = FlightPath::new(&demo);
        let p = path.position_at(4);
        assert!(p.x.abs() < 1e-3, "{p}");
        assert!((p.y - 200.0).abs() < 1e-3, "{p}");
        assert_eq!(path.interval, Duration::from_millis(500));
    }

    #[test]
    fn test_zero_interval_still_moves() {
        let demo = DemoConfig {
            tick_interval_ms: 0,
            viewer_speed: 60.0,
            heading: 0.0,
            ..Default::default()
        };
        let path = FlightPath::new(&demo);
        assert!((path.position_at(1).x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_run_streams_and_settles() {
        let summary = run(&quick_config()).unwrap();
        assert!(summary.settled);
        assert_eq!(summary.failures, 0);
        assert!(summary.chunks >= 25);
        assert_eq!(summary.height_jobs as usize, summary.chunks);
        assert!(summary.visible > 0);
        assert!(summary.renderer.meshes > 0);
        assert_eq!(summary.renderer.colors, summary.height_jobs);
        // 600 units/s at 60 Hz is 10 per tick.
        assert!((summary.final_position.x - 290.0).abs() < 1e-2);
        assert_eq!(
            summary.renderer.shown - summary.renderer.hidden,
            summary.visible as u64
        );
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let mut config = quick_config();
        config.streaming.lod_levels.clear();
        assert!(matches!(run(&config), Err(RunError::Config(_))));
    }

    #[test]
    fn test_summary_display() {
        let summary = run(&quick_config()).unwrap();
        let text = summary.to_string();
        assert!(text.starts_with("flew 30 ticks"));
        assert!(text.contains("chunks:"));
        assert!(!text.contains("unsettled"));
    }
}
