//! Multi-octave fractal noise height fields.
//!
//! Sums several octaves of 2D Perlin noise over a square grid, then maps the
//! raw sums into normalized heights. Two normalization modes exist:
//! [`NormalizeMode::Local`] stretches each grid to exactly `[0, 1]`, while
//! [`NormalizeMode::Global`] uses a fixed, grid-independent mapping so that
//! neighbouring chunks agree along their shared border.

use glam::{DVec2, Vec2};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::color::{Classifier, ColorBuffer};
use crate::seed::octave_offsets;

/// Samples per side of a streamed chunk's height field.
///
/// `CHUNK_SAMPLE_SIZE - 1 = 240` is divisible by every LOD stride
/// (1, 2, 4, 6, 8, 10, 12).
pub const CHUNK_SAMPLE_SIZE: usize = 241;

/// Upper bound on octave count.
pub const MAX_OCTAVES: u32 = 29;

/// Upper bound on lacunarity. Higher values overflow the octave frequency.
pub const MAX_LACUNARITY: f32 = 16.0;

/// Non-positive scales are replaced with this value.
pub const MIN_EFFECTIVE_SCALE: f32 = 0.0001;

/// How raw fractal sums are mapped to heights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Remap the observed `[min, max]` of this grid onto `[0, 1]`.
    Local,
    /// Remap with a grid-independent formula; required for seamless streaming.
    #[default]
    Global,
}

/// Inputs to [`generate_height_field`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    /// World seed. Drives the per-octave sampling offsets.
    pub seed: u64,
    /// Zoom of the first octave, in cells per noise unit.
    pub scale: f32,
    /// Number of octaves to sum.
    pub octaves: u32,
    /// Amplitude multiplier between octaves, `0..=1`.
    pub persistence: f32,
    /// Frequency multiplier between octaves, `>= 1`.
    pub lacunarity: f32,
    /// User offset applied to every chunk.
    pub offset: Vec2,
    /// World-space centre of the chunk being generated.
    pub centre: Vec2,
    /// Normalization mode.
    pub normalize_mode: NormalizeMode,
    /// Estimated fraction of the theoretical maximum the sum actually reaches.
    /// Only used by [`NormalizeMode::Global`].
    pub max_height_estimate: f32,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            centre: Vec2::ZERO,
            normalize_mode: NormalizeMode::Global,
            max_height_estimate: 1.75,
        }
    }
}

impl NoiseParameters {
    /// Return a copy with every field clamped into its usable range.
    ///
    /// Called at the configuration boundary so the generation loop never sees
    /// degenerate values.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };

        Self {
            scale: effective_scale(self.scale),
            octaves: self.octaves.clamp(1, MAX_OCTAVES),
            persistence: finite_or(self.persistence, defaults.persistence).clamp(0.0, 1.0),
            lacunarity: finite_or(self.lacunarity, defaults.lacunarity).clamp(1.0, MAX_LACUNARITY),
            max_height_estimate: if self.max_height_estimate > 0.0 {
                self.max_height_estimate
            } else {
                defaults.max_height_estimate
            },
            ..self.clone()
        }
    }

    /// Copy of these parameters recentred on `centre`.
    pub fn with_centre(&self, centre: Vec2) -> Self {
        Self {
            centre,
            ..self.clone()
        }
    }
}

fn effective_scale(scale: f32) -> f32 {
    if scale > 0.0 { scale } else { MIN_EFFECTIVE_SCALE }
}

/// A square grid of normalized heights, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    size: usize,
    values: Vec<f32>,
}

impl HeightField {
    /// Wrap existing values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != size * size`.
    pub fn new(size: usize, values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            size * size,
            "height field must hold size * size values"
        );
        Self { size, values }
    }

    /// A field where every cell holds `height`.
    pub fn flat(size: usize, height: f32) -> Self {
        Self::new(size, vec![height; size * size])
    }

    /// Samples per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.size + x]
    }

    /// One row of the grid.
    pub fn row(&self, y: usize) -> &[f32] {
        &self.values[y * self.size..(y + 1) * self.size]
    }

    /// All values, row-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest height in the field.
    pub fn min_max(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Output of the per-chunk generation job.
#[derive(Debug)]
pub struct ChunkData {
    /// The normalized height field.
    pub height: HeightField,
    /// Colours from the classifier, when one is configured.
    pub colors: Option<ColorBuffer>,
}

/// Generate a `size × size` height field.
///
/// Cell `(x, y)` of octave `i` samples Perlin noise at
/// `(cell - size / 2 + octave_offset_i) / scale * frequency_i`. Offsets come
/// from [`octave_offsets`], so two chunks whose centres differ by exactly
/// `size - 1` along an axis share identical sample coordinates on their
/// common border.
pub fn generate_height_field(params: &NoiseParameters, size: usize) -> HeightField {
    let scale = f64::from(effective_scale(params.scale));
    let persistence = f64::from(params.persistence);
    let lacunarity = f64::from(params.lacunarity);

    let base = DVec2::new(
        f64::from(params.offset.x) + f64::from(params.centre.x),
        f64::from(params.offset.y) + f64::from(params.centre.y),
    );
    let offsets = octave_offsets(params.seed, params.octaves, base);

    let max_possible_height: f64 = (0..offsets.len())
        .scan(1.0_f64, |amplitude, _| {
            let current = *amplitude;
            *amplitude *= persistence;
            Some(current)
        })
        .sum();

    let perlin = Perlin::new(Perlin::DEFAULT_SEED);
    let half = (size / 2) as f64;

    let mut raw = Vec::with_capacity(size * size);
    let mut min_raw = f64::MAX;
    let mut max_raw = f64::MIN;

    for y in 0..size {
        for x in 0..size {
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut height = 0.0;

            for offset in &offsets {
                let sx = (x as f64 - half + offset.x) / scale * frequency;
                let sy = (y as f64 - half + offset.y) / scale * frequency;

                let value = unit_perlin(&perlin, sx, sy) * 2.0 - 1.0;
                height += value * amplitude;

                amplitude *= persistence;
                frequency *= lacunarity;
            }

            min_raw = min_raw.min(height);
            max_raw = max_raw.max(height);
            raw.push(height);
        }
    }

    let values = match params.normalize_mode {
        NormalizeMode::Local => raw
            .iter()
            .map(|&h| inverse_lerp(min_raw, max_raw, h) as f32)
            .collect(),
        NormalizeMode::Global => {
            let divisor = 2.0 * max_possible_height / f64::from(params.max_height_estimate);
            raw.iter()
                .map(|&h| ((h + 1.0) / divisor).max(0.0) as f32)
                .collect()
        }
    };

    HeightField { size, values }
}

/// Generate a height field and, if a classifier is given, its colours.
pub fn generate_chunk_data(
    params: &NoiseParameters,
    size: usize,
    classifier: Option<&dyn Classifier>,
) -> ChunkData {
    let height = generate_height_field(params, size);
    let colors = classifier.map(|c| c.classify(&height));
    ChunkData { height, colors }
}

/// Perlin noise remapped from `[-1, 1]` into `[0, 1]`.
#[inline]
fn unit_perlin(perlin: &Perlin, x: f64, y: f64) -> f64 {
    (perlin.get([x, y]) * 0.5 + 0.5).clamp(0.0, 1.0)
}

#[inline]
fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if a == b {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}
