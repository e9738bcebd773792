use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vista_mesh::*;
use vista_terrain::{CHUNK_SAMPLE_SIZE, NoiseParameters, NormalizeMode, generate_height_field};

fn field() -> vista_terrain::HeightField {
    let params = NoiseParameters {
        seed: 1,
        normalize_mode: NormalizeMode::Local,
        ..Default::default()
    };
    generate_height_field(&params, CHUNK_SAMPLE_SIZE)
}

fn bench_lod_0(c: &mut Criterion) {
    let field = field();
    let curve = KeyframeCurve::flat_below(0.3);
    c.bench_function("terrain_mesh_lod0", |bencher| {
        bencher.iter(|| black_box(build_terrain_mesh(black_box(&field), 40.0, &curve, 0)))
    });
}

fn bench_lod_6(c: &mut Criterion) {
    let field = field();
    let curve = KeyframeCurve::flat_below(0.3);
    c.bench_function("terrain_mesh_lod6", |bencher| {
        bencher.iter(|| black_box(build_terrain_mesh(black_box(&field), 40.0, &curve, 6)))
    });
}

fn bench_normals(c: &mut Criterion) {
    let mesh = build_terrain_mesh(&field(), 40.0, &KeyframeCurve::linear(), 0);
    c.bench_function("terrain_mesh_normals_lod0", |bencher| {
        bencher.iter(|| black_box(mesh.compute_normals()))
    });
}

criterion_group!(benches, bench_lod_0, bench_lod_6, bench_normals);
criterion_main!(benches);
