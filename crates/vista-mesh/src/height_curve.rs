//! Height curves remap normalized heights before they are scaled into
//! vertex elevations, e.g. to flatten water or sharpen peaks.

use serde::{Deserialize, Serialize};

/// A mapping from normalized height to curve output.
///
/// Curves are shared between worker threads, so implementations must be
/// `Send + Sync` and free of interior mutation.
pub trait HeightCurve: Send + Sync {
    fn evaluate(&self, t: f32) -> f32;
}

impl<F> HeightCurve for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

/// A single curve key.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear curve through a set of keys, held constant past the
/// first and last key.
///
/// Keys are kept sorted by time, including after deserialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct KeyframeCurve {
    keys: Vec<CurveKey>,
}

impl KeyframeCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// `f(t) = t` over `[0, 1]`.
    pub fn linear() -> Self {
        Self::new(vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)])
    }

    /// Zero up to `water_level`, then rising linearly to 1 at `t = 1`.
    pub fn flat_below(water_level: f32) -> Self {
        Self::new(vec![
            CurveKey::new(0.0, 0.0),
            CurveKey::new(water_level, 0.0),
            CurveKey::new(1.0, 1.0),
        ])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }
}

impl Default for KeyframeCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl From<Vec<CurveKey>> for KeyframeCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<KeyframeCurve> for Vec<CurveKey> {
    fn from(curve: KeyframeCurve) -> Self {
        curve.keys
    }
}

impl HeightCurve for KeyframeCurve {
    fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            // No keys: identity.
            _ => return t,
        };
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; the bounds above guarantee 1..len.
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / span)
    }
}
