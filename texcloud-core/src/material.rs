//! Surface materials

use crate::point::Rgb;
use serde::{Deserialize, Serialize};

/// A named material with a flat diffuse color and an optional texture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// `Kd`; `None` when the material file never set it
    pub diffuse: Option<Rgb>,
    /// `map_Kd` file name as written in the material file
    pub diffuse_texture: Option<String>,
}

impl Material {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            diffuse: None,
            diffuse_texture: None,
        }
    }

    pub fn with_diffuse(mut self, diffuse: Rgb) -> Self {
        self.diffuse = Some(diffuse);
        self
    }

    pub fn with_texture<S: Into<String>>(mut self, texture: S) -> Self {
        let texture = texture.into();
        self.diffuse_texture = if texture.is_empty() { None } else { Some(texture) };
        self
    }

    pub fn has_texture(&self) -> bool {
        self.diffuse_texture.is_some()
    }
}
