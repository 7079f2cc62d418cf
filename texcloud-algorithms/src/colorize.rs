//! Per-material vertex colorization
//!
//! Colors are written into a [`VertexColors`] buffer that the conversion
//! driver allocates once per run. Each call to
//! [`MaterialColorizer::colorize`] only touches vertices of faces bound to the
//! given material, so running it once per material partitions the work
//! without a global face-to-material join. A vertex shared between
//! materials ends up with the color of the material processed last.

use crate::sampling::{sample_texture, SamplerConfig};
use texcloud_core::{Material, Rgb, TextureSource, TexturedMesh};
use tracing::{debug, info, warn};

/// Exponent applied to texture samples
pub const DEFAULT_GAMMA: f32 = 2.2;

/// One color per mesh vertex, white until a material assigns something else
#[derive(Debug, Clone, PartialEq)]
pub struct VertexColors {
    colors: Vec<Rgb>,
}

impl VertexColors {
    /// Allocate the buffer for `vertex_count` vertices
    pub fn allocate(vertex_count: usize) -> Self {
        Self {
            colors: vec![Rgb::WHITE; vertex_count],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, vertex: usize) -> Option<Rgb> {
        self.colors.get(vertex).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rgb> {
        self.colors.iter()
    }

    /// Overwrite one entry; returns false when `vertex` is out of range
    fn set(&mut self, vertex: usize, color: Rgb) -> bool {
        match self.colors.get_mut(vertex) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }
}

/// Tunables of the colorizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorizeConfig {
    pub gamma: f32,
    pub sampler: SamplerConfig,
}

impl Default for ColorizeConfig {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            sampler: SamplerConfig::default(),
        }
    }
}

/// How a material pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// Colors were sampled from the material's texture
    Texture,
    /// The flat diffuse color was assigned
    Diffuse,
    /// Nothing was written
    Untouched,
}

/// Statistics of one material pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorizeStats {
    pub source: ColorSource,
    pub faces: usize,
    pub colored_vertices: usize,
    pub skipped_vertices: usize,
}

impl ColorizeStats {
    fn new(source: ColorSource) -> Self {
        Self {
            source,
            faces: 0,
            colored_vertices: 0,
            skipped_vertices: 0,
        }
    }
}

/// Assigns vertex colors one material at a time
#[derive(Debug, Clone, Default)]
pub struct MaterialColorizer {
    config: ColorizeConfig,
}

impl MaterialColorizer {
    pub fn new(config: ColorizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ColorizeConfig {
        &self.config
    }

    /// Color the vertices of every face bound to `material_id`
    ///
    /// # Arguments
    /// * `mesh` - Mesh whose faces are walked
    /// * `material` - The material at index `material_id`
    /// * `textures` - Decoded textures keyed by the material's texture name
    /// * `colors` - Buffer allocated for `mesh.vertex_count()` vertices
    ///
    /// When the material's texture is available every corner with a valid
    /// vertex and texture coordinate index gets the gamma corrected sample.
    /// Otherwise the flat diffuse color (without gamma correction) is
    /// assigned, or nothing when the material has no diffuse color either.
    /// A textured material on a mesh without texture coordinates is left
    /// alone. Invalid indices are skipped and counted.
    pub fn colorize<T: TextureSource + ?Sized>(
        &self,
        mesh: &TexturedMesh,
        material: &Material,
        material_id: usize,
        textures: &T,
        colors: &mut VertexColors,
    ) -> ColorizeStats {
        if colors.len() != mesh.vertex_count() {
            warn!(
                buffer = colors.len(),
                vertices = mesh.vertex_count(),
                "Vertex color buffer does not match the mesh"
            );
        }

        let texture = material
            .diffuse_texture
            .as_deref()
            .and_then(|name| textures.texture(name).map(|image| (name, image)));

        let stats = match texture {
            None => self.apply_diffuse(mesh, material, material_id, colors),
            Some((name, _)) if !mesh.has_texcoords() => {
                info!(material = %material.name, texture = name, "No texture coordinates found in the mesh");
                ColorizeStats::new(ColorSource::Untouched)
            }
            Some((name, image)) => {
                debug!(
                    material = %material.name,
                    texture = name,
                    width = image.width(),
                    height = image.height(),
                    channels = image.channels(),
                    "Sampling texture"
                );
                let mut stats = ColorizeStats::new(ColorSource::Texture);
                for face in mesh.faces_with_material(material_id) {
                    stats.faces += 1;
                    for corner in &face.vertices {
                        let uv = corner.texcoord.and_then(|t| mesh.texcoords.get(t));
                        let Some(&[u, v]) = uv else {
                            debug!(
                                vertex_index = corner.vertex,
                                texcoord_index = ?corner.texcoord,
                                "Invalid texture coordinate index"
                            );
                            stats.skipped_vertices += 1;
                            continue;
                        };
                        let sample = sample_texture(image, u, 1.0 - v, &self.config.sampler);
                        if colors.set(corner.vertex, self.gamma_correct(sample)) {
                            stats.colored_vertices += 1;
                        } else {
                            debug!(vertex_index = corner.vertex, "Invalid vertex index");
                            stats.skipped_vertices += 1;
                        }
                    }
                }
                stats
            }
        };

        if stats.skipped_vertices > 0 {
            warn!(
                material = %material.name,
                skipped = stats.skipped_vertices,
                "Skipped face corners with invalid indices"
            );
        }
        info!(
            material = %material.name,
            source = ?stats.source,
            faces = stats.faces,
            colored = stats.colored_vertices,
            total = colors.len(),
            "Colorized material"
        );
        stats
    }

    fn apply_diffuse(
        &self,
        mesh: &TexturedMesh,
        material: &Material,
        material_id: usize,
        colors: &mut VertexColors,
    ) -> ColorizeStats {
        let Some(diffuse) = material.diffuse else {
            debug!(material = %material.name, "Material has neither a loaded texture nor a diffuse color");
            return ColorizeStats::new(ColorSource::Untouched);
        };
        if let Some(name) = &material.diffuse_texture {
            debug!(material = %material.name, texture = %name, "Texture not loaded, using diffuse color");
        }

        let mut stats = ColorizeStats::new(ColorSource::Diffuse);
        for face in mesh.faces_with_material(material_id) {
            stats.faces += 1;
            for corner in &face.vertices {
                if colors.set(corner.vertex, diffuse) {
                    stats.colored_vertices += 1;
                } else {
                    debug!(vertex_index = corner.vertex, "Invalid vertex index");
                    stats.skipped_vertices += 1;
                }
            }
        }
        stats
    }

    /// Normalize a 0-255 sample and apply the gamma exponent
    pub fn gamma_correct(&self, sample: Rgb) -> Rgb {
        let gamma = self.config.gamma;
        sample.map(|c| (c / 255.0).powf(gamma))
    }
}
