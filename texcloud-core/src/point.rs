//! Point and color types

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A linear RGB color, nominally in [0, 1] per channel
///
/// Values are not clamped: gamma corrected texture samples that went
/// through the brightness boost may exceed 1.0 slightly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Apply `f` to every channel
    pub fn map<F: Fn(f32) -> f32>(self, f: F) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Raise every channel to at least `floor`
    pub fn with_floor(self, floor: f32) -> Self {
        self.map(|c| c.max(floor))
    }

    /// Convert to the 16 bit channels stored in point records
    ///
    /// Channels are saturated to [0, 1] before scaling.
    pub fn to_rgb16(self) -> Rgb16 {
        let scale = |c: f32| (c.clamp(0.0, 1.0) * 65535.0) as u16;
        Rgb16::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// A color with 16 bit channels as stored in LAS point records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb16 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Rgb16 {
    pub const fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    /// Back to normalized floats
    pub fn to_rgb(self) -> Rgb {
        Rgb::new(
            self.r as f32 / 65535.0,
            self.g as f32 / 65535.0,
            self.b as f32 / 65535.0,
        )
    }
}

/// A point with 16 bit color information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint3d {
    pub position: Point3d,
    pub color: Rgb16,
}

impl ColoredPoint3d {
    pub fn new(position: Point3d, color: Rgb16) -> Self {
        Self { position, color }
    }
}

impl Default for ColoredPoint3d {
    fn default() -> Self {
        Self {
            position: Point3d::origin(),
            color: Rgb16::new(u16::MAX, u16::MAX, u16::MAX),
        }
    }
}
