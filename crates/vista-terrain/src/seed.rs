//! Deterministic seeded generation utilities.
//!
//! Every octave of the fractal sum samples the noise primitive from its own
//! region of the plane. Those regions are chosen by a ChaCha8 stream seeded
//! from the world seed, so the same seed always lands on the same regions
//! regardless of thread or platform.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
pub const OCTAVE_OFFSET_RANGE: i32 = 10_000;

/// Build the RNG used for octave offset derivation.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Derive one sampling offset per octave.
///
/// `base` is the caller's `offset + centre`. Each octave draws an X then a Y
/// integer from the seeded stream; X is shifted by `base.x` and Y by
/// `-base.y`, because height-field rows advance toward -Y in world space.
pub fn octave_offsets(seed: u64, octaves: u32, base: DVec2) -> Vec<DVec2> {
    let mut rng = seeded_rng(seed);
    (0..octaves)
        .map(|_| {
            let ox = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            let oy = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            DVec2::new(f64::from(ox) + base.x, f64::from(oy) - base.y)
        })
        .collect()
}
