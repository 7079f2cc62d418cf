//! Nearest-pixel texture sampling

use texcloud_core::{Error, Result, Rgb, TextureImage};
use tracing::warn;

/// Factor applied to samples that are not close to white
pub const DEFAULT_BRIGHTNESS_BOOST: f32 = 1.15;

/// Accepted range for the brightness factor
pub const BRIGHTNESS_BOOST_RANGE: std::ops::RangeInclusive<f32> = 1.03..=1.2;

/// Samples with every channel below this value (0-255 scale) get boosted
pub const NEAR_WHITE_THRESHOLD: f32 = 200.0;

/// Tunables of [`sample_texture`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub brightness_boost: f32,
    pub near_white_threshold: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            brightness_boost: DEFAULT_BRIGHTNESS_BOOST,
            near_white_threshold: NEAR_WHITE_THRESHOLD,
        }
    }
}

impl SamplerConfig {
    pub fn with_brightness_boost(mut self, factor: f32) -> Self {
        self.brightness_boost = factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !BRIGHTNESS_BOOST_RANGE.contains(&self.brightness_boost) {
            return Err(Error::InvalidData(format!(
                "brightness boost {} outside {:?}",
                self.brightness_boost, BRIGHTNESS_BOOST_RANGE
            )));
        }
        Ok(())
    }
}

/// Fold a texture coordinate into [0, 1)
///
/// Done in f64 so that `c` and `c + 1.0` wrap to the same value.
pub fn wrap_unit(c: f32) -> f64 {
    if !c.is_finite() {
        return 0.0;
    }
    let wrapped = (c as f64) % 1.0;
    if wrapped < 0.0 {
        wrapped + 1.0
    } else {
        wrapped
    }
}

/// Map a wrapped coordinate onto a pixel index in `0..extent`
fn pixel_index(c: f64, extent: usize) -> usize {
    let last = extent.saturating_sub(1);
    let index = (c * last as f64).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(last)
    }
}

/// Sample `image` at (`u`, `v`)
///
/// `v` is taken in image space (row 0 at the top); callers holding OBJ
/// coordinates flip it first. Coordinates wrap around, so any finite value
/// is accepted.
///
/// # Returns
/// * The color on the 0-255 scale, boosted by `config.brightness_boost` when
///   all channels are below `config.near_white_threshold`. Images with an
///   unsupported channel count (0 or 2) or no pixels yield black and log a
///   warning; this function never fails.
pub fn sample_texture(image: &TextureImage, u: f32, v: f32, config: &SamplerConfig) -> Rgb {
    if image.width() == 0 || image.height() == 0 {
        warn!(width = image.width(), height = image.height(), "Sampling an empty texture");
        return Rgb::BLACK;
    }

    let x = pixel_index(wrap_unit(u), image.width());
    let y = pixel_index(wrap_unit(v), image.height());

    let color = match (image.channels(), image.pixel(x, y)) {
        (channels, Some(px)) if channels >= 3 => Rgb::new(px[0] as f32, px[1] as f32, px[2] as f32),
        (1, Some(px)) => {
            let value = px[0] as f32;
            Rgb::new(value, value, value)
        }
        (channels, _) => {
            warn!(channels, "Unsupported number of texture channels");
            return Rgb::BLACK;
        }
    };

    let threshold = config.near_white_threshold;
    if color.r < threshold && color.g < threshold && color.b < threshold {
        color.map(|c| c * config.brightness_boost)
    } else {
        color
    }
}
