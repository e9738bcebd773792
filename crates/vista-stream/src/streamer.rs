//! Endless-terrain streaming around a moving viewer.
//!
//! Each [`tick`](ChunkStreamer::tick):
//!
//! 1. Applies every finished background job (height fields and meshes),
//!    refreshing the chunks they belong to.
//! 2. If the viewer moved further than the movement threshold since the last
//!    visibility pass, walks the square neighbourhood of chunks that can be
//!    within view distance. Unknown chunks are created and their height job
//!    submitted. Known chunks get their visibility and LOD refreshed.
//! 3. Hides chunks that were visible before the pass and were not confirmed
//!    visible by it.
//!
//! Meshes are cached per chunk and LOD. A mesh is requested at most once per
//! (chunk, LOD) pair, no matter how often the selector asks for it while the
//! job is in flight. All chunk state lives on the ticking thread; workers only
//! see immutable snapshots (noise parameters, `Arc<HeightField>`).

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use rustc_hash::FxHashSet;
use tracing::{debug, info, trace, warn};
use vista_lod::{LodTable, check_level};
use vista_mesh::{HeightCurve, KeyframeCurve, MeshData, build_terrain_mesh};
use vista_terrain::{CHUNK_SAMPLE_SIZE, ChunkData, Classifier, NoiseParameters, generate_chunk_data};

use crate::chunk::{ChunkCoord, HeightState, LodMeshState, TerrainChunk};
use crate::error::{JobError, StreamError};
use crate::registry::ChunkRegistry;
use crate::renderer::TerrainRenderer;
use crate::work_engine::{WorkEngine, default_worker_count};

/// Everything the streamer needs to generate and select terrain.
#[derive(Clone)]
pub struct StreamerSettings {
    /// Noise parameters shared by every chunk; the centre is set per chunk.
    pub noise: NoiseParameters,
    /// Samples along each chunk edge. The chunk edge length is one less.
    pub chunk_sample_size: usize,
    pub lods: LodTable,
    /// Scale from curve output to world units.
    pub height_multiplier: f32,
    pub height_curve: Arc<dyn HeightCurve>,
    /// Colour classifier run inside each height job. `None` skips colours.
    pub classifier: Option<Arc<dyn Classifier>>,
    /// Distance the viewer must move before visibility is recomputed.
    pub viewer_move_threshold: f32,
    /// Worker threads; 0 picks [`default_worker_count`].
    pub worker_threads: usize,
}

impl StreamerSettings {
    /// Chunk edge length in world units.
    pub fn chunk_edge(&self) -> f32 {
        self.chunk_sample_size.saturating_sub(1) as f32
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        self.lods.check_sample_size(self.chunk_sample_size)?;
        let threshold = self.viewer_move_threshold;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(StreamError::InvalidMoveThreshold(threshold));
        }
        if !self.height_multiplier.is_finite() {
            return Err(StreamError::InvalidHeightMultiplier(self.height_multiplier));
        }
        Ok(())
    }

    fn resolved_worker_count(&self) -> usize {
        match self.worker_threads {
            0 => default_worker_count(),
            n => n,
        }
    }
}

impl Default for StreamerSettings {
    fn default() -> Self {
        Self {
            noise: NoiseParameters::default(),
            chunk_sample_size: CHUNK_SAMPLE_SIZE,
            lods: LodTable::default_terrain(),
            height_multiplier: 40.0,
            height_curve: Arc::new(KeyframeCurve::linear()),
            classifier: None,
            viewer_move_threshold: 25.0,
            worker_threads: 0,
        }
    }
}

impl std::fmt::Debug for StreamerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamerSettings")
            .field("noise", &self.noise)
            .field("chunk_sample_size", &self.chunk_sample_size)
            .field("lods", &self.lods)
            .field("height_multiplier", &self.height_multiplier)
            .field("classifier", &self.classifier.is_some())
            .field("viewer_move_threshold", &self.viewer_move_threshold)
            .field("worker_threads", &self.worker_threads)
            .finish_non_exhaustive()
    }
}

/// Viewer input for one tick: position on the ground plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewerState {
    pub position: Vec2,
}

impl ViewerState {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
        }
    }
}

/// Summary of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Job completions applied at the start of the tick.
    pub completions: usize,
    /// Whether the viewer moved far enough to recompute visibility.
    pub recomputed: bool,
    pub visible_chunks: usize,
    pub pending_jobs: usize,
}

/// Running totals since the streamer was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks_created: u64,
    pub chunks_retired: u64,
    pub height_jobs_submitted: u64,
    pub mesh_jobs_submitted: u64,
    pub completions_applied: u64,
    pub generation_failures: u64,
    pub mesh_failures: u64,
    pub visibility_passes: u64,
}

/// Outcome of [`ChunkStreamer::request_lod_mesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LodRequest {
    /// The mesh is built and cached.
    Cached,
    /// A job for this mesh is already running.
    InFlight,
    /// A new mesh job was submitted.
    Submitted,
    /// An earlier attempt failed; it is not retried.
    Failed,
    /// The chunk's height field is not ready (or failed).
    HeightUnavailable,
    UnknownChunk,
    /// The LOD is above [`MAX_LOD`](vista_lod::MAX_LOD), its stride does not
    /// divide the chunk edge, or its mesh would exceed the vertex ceiling.
    UnsupportedLevel,
}

/// Mutable state reached by job completions.
struct StreamState<R> {
    registry: ChunkRegistry,
    visible: FxHashSet<ChunkCoord>,
    renderer: R,
    stats: StreamStats,
    /// Chunks whose data changed since they were last refreshed.
    dirty: Vec<ChunkCoord>,
}

impl<R: TerrainRenderer> StreamState<R> {
    fn apply_height(&mut self, coord: ChunkCoord, result: Result<ChunkData, JobError>) {
        self.stats.completions_applied += 1;
        let Some(chunk) = self.registry.get_mut(coord) else {
            trace!(%coord, "height finished for retired chunk");
            return;
        };

        match result {
            Ok(data) => {
                if !chunk.resolve_height(HeightState::Ready(Arc::new(data.height))) {
                    return;
                }
                if let Some(colors) = data.colors {
                    self.renderer.on_color_ready(coord, Arc::new(colors));
                }
                self.dirty.push(coord);
            }
            Err(error) => {
                if chunk.resolve_height(HeightState::Failed(error.clone())) {
                    warn!(%coord, %error, "height generation failed");
                    self.stats.generation_failures += 1;
                }
            }
        }
    }

    fn apply_mesh(&mut self, coord: ChunkCoord, lod: u8, result: Result<MeshData, JobError>) {
        self.stats.completions_applied += 1;
        let Some(chunk) = self.registry.get_mut(coord) else {
            trace!(%coord, lod, "mesh finished for retired chunk");
            return;
        };

        match result {
            Ok(mesh) => {
                if chunk.resolve_lod(lod, LodMeshState::Ready(Arc::new(mesh))) {
                    self.dirty.push(coord);
                }
            }
            Err(error) => {
                if chunk.resolve_lod(lod, LodMeshState::Failed(error.clone())) {
                    warn!(%coord, lod, %error, "mesh build failed");
                    self.stats.mesh_failures += 1;
                }
            }
        }
    }

    /// Update visibility, notifying the renderer only on change.
    fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
        let Some(chunk) = self.registry.get_mut(coord) else {
            return;
        };
        if chunk.set_visible(visible) {
            self.renderer.on_visibility_changed(coord, visible);
        }
        if visible {
            self.visible.insert(coord);
        } else {
            self.visible.remove(&coord);
        }
    }
}

/// Streams terrain chunks around a viewer. Owned and ticked by one thread.
pub struct ChunkStreamer<R: TerrainRenderer + 'static> {
    settings: StreamerSettings,
    engine: WorkEngine<StreamState<R>>,
    state: StreamState<R>,
    viewer: Vec2,
    /// Viewer position at the last visibility pass.
    last_update_position: Option<Vec2>,
}

impl<R: TerrainRenderer + 'static> ChunkStreamer<R> {
    /// Validate `settings` and start the worker pool.
    pub fn new(settings: StreamerSettings, renderer: R) -> Result<Self, StreamError> {
        settings.validate()?;
        let engine = WorkEngine::new(settings.resolved_worker_count())?;

        info!(
            workers = engine.worker_count(),
            chunk_edge = settings.chunk_edge(),
            max_view_distance = settings.lods.max_view_distance(),
            lod_levels = settings.lods.levels().len(),
            seed = settings.noise.seed,
            "chunk streamer started"
        );

        Ok(Self {
            settings,
            engine,
            state: StreamState {
                registry: ChunkRegistry::new(),
                visible: FxHashSet::default(),
                renderer,
                stats: StreamStats::default(),
                dirty: Vec::new(),
            },
            viewer: Vec2::ZERO,
            last_update_position: None,
        })
    }

    /// Advance one frame. Never blocks on background work.
    pub fn tick(&mut self, viewer: ViewerState) -> TickReport {
        self.viewer = viewer.position;

        let completions = self.engine.drain(&mut self.state);
        self.refresh_dirty();

        let threshold = self.settings.viewer_move_threshold;
        let recomputed = match self.last_update_position {
            Some(last) => last.distance_squared(self.viewer) > threshold * threshold,
            None => true,
        };
        if recomputed {
            self.last_update_position = Some(self.viewer);
            self.update_visible_chunks();
        }

        TickReport {
            completions,
            recomputed,
            visible_chunks: self.state.visible.len(),
            pending_jobs: self.engine.pending(),
        }
    }

    /// Ask for the mesh of `coord` at `lod`, submitting a job only if no slot
    /// exists for that pair yet.
    pub fn request_lod_mesh(&mut self, coord: ChunkCoord, lod: u8) -> LodRequest {
        if let Err(error) = check_level(self.settings.chunk_sample_size, lod) {
            debug!(%coord, lod, %error, "unsupported mesh level");
            return LodRequest::UnsupportedLevel;
        }
        let Some(chunk) = self.state.registry.get_mut(coord) else {
            return LodRequest::UnknownChunk;
        };
        let Some(field) = chunk.height_field().cloned() else {
            return LodRequest::HeightUnavailable;
        };
        match chunk.mesh_state(lod) {
            Some(LodMeshState::Ready(_)) => return LodRequest::Cached,
            Some(LodMeshState::Pending) => return LodRequest::InFlight,
            Some(LodMeshState::Failed(_)) => return LodRequest::Failed,
            None => {}
        }
        chunk.claim_lod(lod);

        let height_multiplier = self.settings.height_multiplier;
        let curve = Arc::clone(&self.settings.height_curve);
        let submitted = self.engine.submit(
            move || build_terrain_mesh(&field, height_multiplier, curve.as_ref(), lod),
            move |state: &mut StreamState<R>, result| state.apply_mesh(coord, lod, result),
        );

        match submitted {
            Ok(()) => {
                self.state.stats.mesh_jobs_submitted += 1;
                debug!(%coord, lod, "mesh job submitted");
                LodRequest::Submitted
            }
            Err(error) => {
                if let Some(chunk) = self.state.registry.get_mut(coord) {
                    chunk.resolve_lod(lod, LodMeshState::Failed(error));
                }
                LodRequest::Failed
            }
        }
    }

    /// Drop a chunk and everything cached for it. A visible chunk is hidden
    /// first. Late completions for it are discarded.
    pub fn retire(&mut self, coord: ChunkCoord) -> bool {
        self.state.set_visible(coord, false);
        if self.state.registry.retire(coord).is_none() {
            return false;
        }
        self.state.stats.chunks_retired += 1;
        debug!(%coord, "chunk retired");
        true
    }

    /// Retire every chunk further than `distance` from the viewer. Returns
    /// the number retired.
    pub fn retire_beyond(&mut self, distance: f32) -> usize {
        let viewer = self.viewer;
        let far: Vec<ChunkCoord> = self
            .state
            .registry
            .iter()
            .filter(|chunk| chunk.bounds().distance_to(viewer) > distance)
            .map(TerrainChunk::coord)
            .collect();
        for &coord in &far {
            self.retire(coord);
        }
        far.len()
    }

    /// Block until no jobs are pending, applying completions as they land.
    /// Returns `false` if `timeout` expires first.
    ///
    /// Visibility is not recomputed; for shutdown and headless runs.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.engine.drain(&mut self.state);
            self.refresh_dirty();
            if self.engine.pending() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.state.registry.get(coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.state.registry.iter()
    }

    pub fn chunk_count(&self) -> usize {
        self.state.registry.len()
    }

    pub fn is_visible(&self, coord: ChunkCoord) -> bool {
        self.state.visible.contains(&coord)
    }

    /// Coordinates of the currently visible chunks, sorted.
    pub fn visible_chunks(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.state.visible.iter().copied().collect();
        coords.sort_unstable();
        coords
    }

    pub fn viewer_position(&self) -> Vec2 {
        self.viewer
    }

    /// The chunk whose centre is nearest the viewer.
    pub fn viewer_chunk(&self) -> ChunkCoord {
        ChunkCoord::from_world(self.viewer, self.settings.chunk_edge())
    }

    pub fn stats(&self) -> StreamStats {
        self.state.stats
    }

    pub fn pending_jobs(&self) -> usize {
        self.engine.pending()
    }

    pub fn settings(&self) -> &StreamerSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &R {
        &self.state.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.state.renderer
    }

    fn refresh_dirty(&mut self) {
        let dirty = std::mem::take(&mut self.state.dirty);
        for coord in dirty {
            self.refresh_chunk(coord);
        }
    }

    fn update_visible_chunks(&mut self) {
        self.state.stats.visibility_passes += 1;
        let edge = self.settings.chunk_edge();
        let max_view = self.settings.lods.max_view_distance();
        let radius = (max_view / edge).ceil() as i32;
        let centre = ChunkCoord::from_world(self.viewer, edge);

        let previously_visible: Vec<ChunkCoord> = self.state.visible.iter().copied().collect();
        let mut confirmed = FxHashSet::default();

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coord = centre.offset(dx, dy);
                if self.state.registry.contains(coord) {
                    if self.refresh_chunk(coord) {
                        confirmed.insert(coord);
                    }
                } else {
                    self.create_chunk(coord);
                }
            }
        }

        for coord in previously_visible {
            if !confirmed.contains(&coord) {
                self.state.set_visible(coord, false);
            }
        }

        trace!(
            viewer = %self.viewer,
            visible = self.state.visible.len(),
            chunks = self.state.registry.len(),
            "visibility pass"
        );
    }

    /// Recompute visibility and displayed LOD of one chunk. Returns whether
    /// it is visible. Chunks without a height field stay hidden.
    fn refresh_chunk(&mut self, coord: ChunkCoord) -> bool {
        let Some(chunk) = self.state.registry.get(coord) else {
            return false;
        };
        if !chunk.is_height_ready() {
            return false;
        }

        let distance = chunk.bounds().distance_to(self.viewer);
        let visible = distance < self.settings.lods.max_view_distance();
        if visible {
            let lod = self.settings.lods.select(distance).lod;
            if chunk.displayed_lod() != Some(lod) {
                self.show_lod(coord, lod);
            }
        }
        self.state.set_visible(coord, visible);
        visible
    }

    /// Hand the cached mesh for `lod` to the renderer, or request it. The
    /// previous mesh stays displayed until the new one is ready.
    fn show_lod(&mut self, coord: ChunkCoord, lod: u8) {
        if self.request_lod_mesh(coord, lod) != LodRequest::Cached {
            return;
        }
        let Some(chunk) = self.state.registry.get_mut(coord) else {
            return;
        };
        let Some(mesh) = chunk.mesh(lod).cloned() else {
            return;
        };
        chunk.set_displayed_lod(lod);
        trace!(%coord, lod, "mesh displayed");
        self.state.renderer.on_mesh_ready(coord, mesh);
    }

    fn create_chunk(&mut self, coord: ChunkCoord) {
        let edge = self.settings.chunk_edge();
        let chunk = TerrainChunk::new(coord, edge);
        let params = self.settings.noise.with_centre(chunk.centre());
        if !self.state.registry.insert(chunk) {
            return;
        }
        self.state.stats.chunks_created += 1;

        let size = self.settings.chunk_sample_size;
        let classifier = self.settings.classifier.clone();
        let submitted = self.engine.submit(
            move || generate_chunk_data(&params, size, classifier.as_deref()),
            move |state: &mut StreamState<R>, result| state.apply_height(coord, result),
        );

        match submitted {
            Ok(()) => {
                self.state.stats.height_jobs_submitted += 1;
                debug!(%coord, "height job submitted");
            }
            Err(error) => {
                warn!(%coord, %error, "height job rejected");
                if let Some(chunk) = self.state.registry.get_mut(coord) {
                    chunk.resolve_height(HeightState::Failed(error));
                }
                self.state.stats.generation_failures += 1;
            }
        }
    }
}
