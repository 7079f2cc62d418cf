//! Texture image decoding

use image::ColorType;
use std::path::{Path, PathBuf};
use texcloud_core::{Error, Result, TextureImage};
use tracing::debug;

/// Decode a texture into an 8 bit pixel buffer
///
/// Grayscale images keep one channel, images with alpha are expanded to
/// RGBA and everything else to RGB.
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<TextureImage> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|e| Error::texture_load(path, e))?;
    let width = decoded.width() as usize;
    let height = decoded.height() as usize;
    let color = decoded.color();

    let (channels, data) = match color {
        ColorType::L8 | ColorType::L16 => (1, decoded.into_luma8().into_raw()),
        c if c.has_alpha() => (4, decoded.into_rgba8().into_raw()),
        _ => (3, decoded.into_rgb8().into_raw()),
    };
    debug!(
        texture = %path.display(),
        width,
        height,
        channels,
        source_color = ?color,
        "Texture decoded"
    );
    TextureImage::new(width, height, channels, data).map_err(|e| Error::texture_load(path, e))
}

/// Locate a texture named in an MTL file
///
/// Backslash separators written by Windows exporters are converted; relative
/// names are joined onto `base_dir`.
pub fn resolve_texture_path<P: AsRef<Path>>(base_dir: P, texname: &str) -> PathBuf {
    let normalized = texname.trim().replace('\\', "/");
    let candidate = Path::new(&normalized);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.as_ref().join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_load_rgb_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        img.put_pixel(1, 0, Rgb([40, 50, 60]));
        img.save(&path).unwrap();

        let texture = load_texture(&path).unwrap();
        assert_eq!((texture.width(), texture.height(), texture.channels()), (2, 1, 3));
        assert_eq!(texture.pixel(1, 0).unwrap(), &[40, 50, 60]);
    }

    #[test]
    fn test_load_grayscale_and_alpha() {
        let dir = tempfile::tempdir().unwrap();

        let gray_path = dir.path().join("gray.png");
        let gray: GrayImage = ImageBuffer::from_pixel(3, 2, Luma([77]));
        gray.save(&gray_path).unwrap();
        let texture = load_texture(&gray_path).unwrap();
        assert_eq!(texture.channels(), 1);
        assert_eq!(texture.data().len(), 6);
        assert_eq!(texture.pixel(2, 1).unwrap(), &[77]);

        let rgba_path = dir.path().join("rgba.png");
        let rgba: RgbaImage = ImageBuffer::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        rgba.save(&rgba_path).unwrap();
        let texture = load_texture(&rgba_path).unwrap();
        assert_eq!(texture.channels(), 4);
        assert_eq!(texture.pixel(0, 0).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_or_corrupt_texture() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_texture(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, Error::TextureLoad { .. }));
        assert!(err.is_recoverable());

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"not an image").unwrap();
        assert!(matches!(load_texture(&corrupt).unwrap_err(), Error::TextureLoad { .. }));
    }

    #[test]
    fn test_resolve_texture_path() {
        let base = Path::new("/data/mesh");
        assert_eq!(resolve_texture_path(base, "tex/a.jpg"), PathBuf::from("/data/mesh/tex/a.jpg"));
        assert_eq!(resolve_texture_path(base, "tex\\b.jpg"), PathBuf::from("/data/mesh/tex/b.jpg"));
        assert_eq!(resolve_texture_path(base, "/abs/c.jpg"), PathBuf::from("/abs/c.jpg"));
        assert_eq!(resolve_texture_path(base, " d.png "), PathBuf::from("/data/mesh/d.png"));
    }
}
