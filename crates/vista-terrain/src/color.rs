//! Height-band colour classification.
//!
//! Turns a [`HeightField`] into one RGBA8 colour per cell by looking each
//! height up in a sorted list of [`ColorBand`]s.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::noise_field::HeightField;

/// An 8-bit-per-channel colour.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// A named height band. Cells at or above `threshold` take `color` unless a
/// higher band also matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub name: String,
    pub threshold: f32,
    pub color: Rgba,
}

impl ColorBand {
    pub fn new(name: impl Into<String>, threshold: f32, color: Rgba) -> Self {
        Self {
            name: name.into(),
            threshold,
            color,
        }
    }
}

/// A typical water-to-snow palette.
pub fn default_color_bands() -> Vec<ColorBand> {
    vec![
        ColorBand::new("deep water", 0.0, Rgba::opaque(32, 64, 160)),
        ColorBand::new("shallow water", 0.3, Rgba::opaque(54, 102, 196)),
        ColorBand::new("sand", 0.4, Rgba::opaque(210, 208, 125)),
        ColorBand::new("grass", 0.45, Rgba::opaque(86, 152, 23)),
        ColorBand::new("forest", 0.55, Rgba::opaque(62, 107, 18)),
        ColorBand::new("rock", 0.6, Rgba::opaque(90, 69, 60)),
        ColorBand::new("high rock", 0.7, Rgba::opaque(75, 60, 53)),
        ColorBand::new("snow", 0.9, Rgba::opaque(255, 255, 255)),
    ]
}

/// One colour per height-field cell, row-major like the source field.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBuffer {
    size: usize,
    colors: Vec<Rgba>,
}

impl ColorBuffer {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Rgba {
        self.colors[y * self.size + x]
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Raw RGBA8 bytes, ready for texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Maps heights to colours.
pub trait Classifier: Send + Sync {
    fn classify(&self, field: &HeightField) -> ColorBuffer;
}

/// Picks the colour of the highest band whose threshold the height reaches.
#[derive(Clone, Debug, Default)]
pub struct BandClassifier {
    bands: Vec<ColorBand>,
}

impl BandClassifier {
    /// Build a classifier; bands are sorted by threshold.
    pub fn new(mut bands: Vec<ColorBand>) -> Self {
        bands.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        Self { bands }
    }

    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    /// Colour for a single height. Heights below every band take the first band.
    pub fn color_for(&self, height: f32) -> Rgba {
        let Some(first) = self.bands.first() else {
            return Rgba::TRANSPARENT;
        };
        self.bands
            .iter()
            .take_while(|band| height >= band.threshold)
            .last()
            .unwrap_or(first)
            .color
    }
}

impl Classifier for BandClassifier {
    fn classify(&self, field: &HeightField) -> ColorBuffer {
        ColorBuffer {
            size: field.size(),
            colors: field.values().iter().map(|&h| self.color_for(h)).collect(),
        }
    }
}
