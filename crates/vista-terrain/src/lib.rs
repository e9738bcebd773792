//! Procedural height fields: seeded fractal noise, normalization, and colour classification.

mod color;
mod noise_field;
mod seed;

pub use color::{BandClassifier, Classifier, ColorBand, ColorBuffer, Rgba, default_color_bands};
pub use noise_field::{
    CHUNK_SAMPLE_SIZE, ChunkData, HeightField, MAX_LACUNARITY, MAX_OCTAVES, MIN_EFFECTIVE_SCALE,
    NoiseParameters, NormalizeMode, generate_chunk_data, generate_height_field,
};
pub use seed::{OCTAVE_OFFSET_RANGE, octave_offsets, seeded_rng};
