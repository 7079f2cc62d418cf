//! Core traits for texcloud

use crate::{bounds::Bounds3d, image::TextureImage, mesh::TexturedMesh, point::*, point_cloud::*, Result};
use std::collections::{BTreeMap, HashMap};

/// Objects with an axis aligned bounding box
pub trait Bounded {
    /// Get the bounding box of the object, `None` when it has no points
    fn bounds(&self) -> Option<Bounds3d>;
}

/// Lookup of decoded textures by the file name a material refers to
pub trait TextureSource {
    fn texture(&self, name: &str) -> Option<&TextureImage>;
}

/// Destination for colored points
pub trait PointSink {
    fn add_point(&mut self, point: ColoredPoint3d) -> Result<()>;

    /// Number of points accepted so far
    fn point_count(&self) -> u64;
}

impl Bounded for TexturedMesh {
    fn bounds(&self) -> Option<Bounds3d> {
        if self.positions.is_empty() {
            return None;
        }
        Some(Bounds3d::from_points(self.positions.iter()))
    }
}

impl Bounded for PointCloud<ColoredPoint3d> {
    fn bounds(&self) -> Option<Bounds3d> {
        if self.is_empty() {
            return None;
        }
        Some(Bounds3d::from_points(self.iter().map(|p| &p.position)))
    }
}

impl TextureSource for HashMap<String, TextureImage> {
    fn texture(&self, name: &str) -> Option<&TextureImage> {
        self.get(name)
    }
}

impl TextureSource for BTreeMap<String, TextureImage> {
    fn texture(&self, name: &str) -> Option<&TextureImage> {
        self.get(name)
    }
}

/// A source holding at most one texture, as used by the conversion driver
/// which keeps a single decoded image alive at a time
impl TextureSource for Option<(String, TextureImage)> {
    fn texture(&self, name: &str) -> Option<&TextureImage> {
        match self {
            Some((key, image)) if key == name => Some(image),
            _ => None,
        }
    }
}

impl PointSink for PointCloud<ColoredPoint3d> {
    fn add_point(&mut self, point: ColoredPoint3d) -> Result<()> {
        self.push(point);
        Ok(())
    }

    fn point_count(&self) -> u64 {
        self.len() as u64
    }
}
