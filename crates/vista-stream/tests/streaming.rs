//! End-to-end streaming runs at full chunk resolution.

use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;
use vista_lod::{LodDescriptor, LodTable};
use vista_mesh::KeyframeCurve;
use vista_stream::{
    ChunkCoord, ChunkStreamer, NullRenderer, RecordingRenderer, RenderEvent, StreamerSettings,
    ViewerState,
};
use vista_terrain::{CHUNK_SAMPLE_SIZE, NoiseParameters, NormalizeMode};

const WAIT: Duration = Duration::from_secs(60);

fn settings(lods: &[(u8, f32)]) -> StreamerSettings {
    StreamerSettings {
        noise: NoiseParameters {
            seed: 1,
            scale: 50.0,
            octaves: 3,
            normalize_mode: NormalizeMode::Global,
            ..Default::default()
        },
        chunk_sample_size: CHUNK_SAMPLE_SIZE,
        lods: LodTable::new(
            lods.iter()
                .map(|&(lod, threshold)| LodDescriptor::new(lod, threshold))
                .collect(),
        )
        .unwrap(),
        height_multiplier: 30.0,
        height_curve: Arc::new(KeyframeCurve::flat_below(0.3)),
        classifier: None,
        viewer_move_threshold: 0.5,
        worker_threads: 4,
    }
}

#[test]
fn test_visibility_boundary_is_exclusive() {
    let mut streamer =
        ChunkStreamer::new(settings(&[(0, 150.0), (1, 300.0)]), RecordingRenderer::new())
            .unwrap();
    let origin = ChunkCoord::new(0, 0);

    // Chunk (0, 0) spans [-120, 120]; 420 is exactly 300 from its east edge.
    streamer.tick(ViewerState::new(420.0, 0.0));
    assert!(streamer.wait_idle(WAIT));
    assert!(streamer.chunk(origin).unwrap().is_height_ready());
    assert!(!streamer.is_visible(origin));

    let report = streamer.tick(ViewerState::new(419.0, 0.0));
    assert!(report.recomputed);
    assert!(streamer.is_visible(origin));
    assert!(streamer.renderer().events.contains(&RenderEvent::Visibility {
        coord: origin,
        visible: true
    }));

    assert!(streamer.wait_idle(WAIT));
    assert_eq!(streamer.chunk(origin).unwrap().displayed_lod(), Some(1));
}

#[test]
fn test_neighbouring_chunks_share_borders() {
    let mut streamer =
        ChunkStreamer::new(settings(&[(0, 100.0), (6, 250.0)]), NullRenderer).unwrap();
    streamer.tick(ViewerState::new(0.0, 0.0));
    assert!(streamer.wait_idle(WAIT));

    let field = |x, y| {
        streamer
            .chunk(ChunkCoord::new(x, y))
            .and_then(|c| c.height_field())
            .cloned()
            .unwrap()
    };
    let origin = field(0, 0);
    let east = field(1, 0);
    let north = field(0, 1);
    let last = CHUNK_SAMPLE_SIZE - 1;

    for i in 0..CHUNK_SAMPLE_SIZE {
        assert_eq!(origin.get(last, i), east.get(0, i), "east border, row {i}");
        assert_eq!(north.get(i, last), origin.get(i, 0), "north border, column {i}");
    }
}

#[test]
fn test_fly_through_settles_consistently() {
    let table = [(0, 120.0), (1, 240.0), (3, 360.0), (6, 480.0)];
    let mut streamer = ChunkStreamer::new(settings(&table), RecordingRenderer::new()).unwrap();

    for step in 0..20 {
        let x = step as f32 * 60.0;
        streamer.tick(ViewerState::new(x, x * 0.25));
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(streamer.tick(ViewerState::new(1200.0, 300.0)).recomputed);
    assert!(streamer.wait_idle(WAIT));

    let viewer = streamer.viewer_position();
    let lods = &streamer.settings().lods;
    let max_view = lods.max_view_distance();

    for chunk in streamer.chunks() {
        let distance = chunk.bounds().distance_to(viewer);
        if !chunk.is_height_ready() {
            continue;
        }
        assert_eq!(
            chunk.is_visible(),
            distance < max_view,
            "chunk {} at distance {distance}",
            chunk.coord()
        );
        if chunk.is_visible() {
            let expected = lods.select(distance).lod;
            assert_eq!(chunk.displayed_lod(), Some(expected), "chunk {}", chunk.coord());
        }
    }

    // Replaying the visibility notifications gives the final visible set.
    let mut replayed = FxHashSet::default();
    for event in &streamer.renderer().events {
        if let RenderEvent::Visibility { coord, visible } = *event {
            if visible {
                assert!(replayed.insert(coord), "{coord} shown twice in a row");
            } else {
                assert!(replayed.remove(&coord), "{coord} hidden while hidden");
            }
        }
    }
    let mut replayed: Vec<ChunkCoord> = replayed.into_iter().collect();
    replayed.sort_unstable();
    assert_eq!(replayed, streamer.visible_chunks());

    let stats = streamer.stats();
    assert_eq!(stats.height_jobs_submitted, stats.chunks_created);
    assert_eq!(stats.generation_failures, 0);
    let slots: usize = streamer.chunks().map(|c| c.requested_lods().len()).sum();
    assert_eq!(stats.mesh_jobs_submitted, slots as u64);
}
