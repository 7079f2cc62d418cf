//! Decoded texture images

use crate::{Error, Result};

/// A decoded image: row-major, `channels` bytes per pixel, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl TextureImage {
    /// Wrap a pixel buffer, checking that its length matches the dimensions
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| Error::InvalidData(format!("image {width}x{height}x{channels} is too large")))?;
        if data.len() != expected {
            return Err(Error::InvalidData(format!(
                "pixel buffer holds {} bytes, {width}x{height}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A single-color RGB image, handy for fixtures
    pub fn solid(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let data = rgb.iter().copied().cycle().take(width * height * 3).collect();
        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes of the pixel at (`x`, `y`), `None` outside the image
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * self.channels;
        self.data.get(offset..offset + self.channels)
    }
}
