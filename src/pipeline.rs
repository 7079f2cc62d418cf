//! OBJ to LAS conversion driver
//!
//! One run loads the mesh, computes the rebasing transform, colors the
//! vertices material by material and streams the colored, rebased vertices
//! into a LAS 1.3 file. Every run owns its color buffer and rebaser; nothing
//! is shared between runs.
//!
//! Output files are only created once coloring is done. A run that fails
//! while writing removes the LAS file and the transform sidecar it created.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use texcloud_algorithms::{
    compute_mesh_transform, ColorizeConfig, MaterialColorizer, Rebaser, SamplerConfig, VertexColors,
    DEFAULT_BRIGHTNESS_BOOST, DEFAULT_GAMMA,
};
use texcloud_core::{
    ColoredPoint3d, CoordinateTransform, Error, Material, PointSink, Result, TextureImage, TextureSource,
    TexturedMesh,
};
use texcloud_io::{
    load_obj, load_texture, resolve_texture_path, sidecar_path, write_transform_sidecar, Las13Writer,
    LasSummary, LasWriterOptions,
};
use tracing::{debug, info, warn};

/// Lowest channel value written, keeps points from rendering pure black
pub const DEFAULT_COLOR_FLOOR: f32 = 0.01;

/// Upper bound on the number of materials a mesh may define
pub const DEFAULT_MAX_MATERIALS: usize = 200;

/// Vertices between two progress log lines
pub const PROGRESS_INTERVAL: usize = 1_000_000;

/// Configuration for a conversion run
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Factor applied to texture samples that are not near white
    pub brightness_boost: f32,
    /// Exponent of the gamma correction on textured colors
    pub gamma: f32,
    /// Minimum value of every color channel in [0, 1]
    pub color_floor: f32,
    /// Write `<output>_transform.txt` when coordinates are rebased
    pub write_sidecar: bool,
    pub max_materials: usize,
    /// Directory for relative texture names, defaults to the OBJ directory
    pub texture_dir: Option<PathBuf>,
    pub las: LasWriterOptions,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            brightness_boost: DEFAULT_BRIGHTNESS_BOOST,
            gamma: DEFAULT_GAMMA,
            color_floor: DEFAULT_COLOR_FLOOR,
            write_sidecar: true,
            max_materials: DEFAULT_MAX_MATERIALS,
            texture_dir: None,
            las: LasWriterOptions::default(),
        }
    }
}

impl ConversionOptions {
    pub fn with_brightness_boost(mut self, factor: f32) -> Self {
        self.brightness_boost = factor;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_color_floor(mut self, floor: f32) -> Self {
        self.color_floor = floor;
        self
    }

    pub fn with_sidecar(mut self, enabled: bool) -> Self {
        self.write_sidecar = enabled;
        self
    }

    pub fn with_max_materials(mut self, max: usize) -> Self {
        self.max_materials = max;
        self
    }

    pub fn with_texture_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.texture_dir = Some(dir.into());
        self
    }

    pub fn with_las_options(mut self, las: LasWriterOptions) -> Self {
        self.las = las;
        self
    }

    pub fn colorize_config(&self) -> ColorizeConfig {
        ColorizeConfig {
            gamma: self.gamma,
            sampler: SamplerConfig::default().with_brightness_boost(self.brightness_boost),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.colorize_config().sampler.validate()?;
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(Error::InvalidData(format!("gamma must be positive, got {}", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.color_floor) {
            return Err(Error::InvalidData(format!(
                "color floor must lie in [0, 1], got {}",
                self.color_floor
            )));
        }
        Ok(())
    }
}

/// A texture that could not be used; its material fell back to the diffuse color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTexture {
    pub material: String,
    pub texture: PathBuf,
    pub message: String,
}

/// Outcome of a conversion run
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub sidecar: Option<PathBuf>,
    pub vertex_count: usize,
    pub face_count: usize,
    pub material_count: usize,
    pub textured_materials: usize,
    pub failed_textures: Vec<FailedTexture>,
    pub transform: CoordinateTransform,
    pub substituted_coordinates: u64,
    pub las: LasSummary,
    pub elapsed_seconds: f64,
}

/// Where material textures come from during a run
enum Textures<'a> {
    /// Decoded from disk one material at a time, relative to this directory
    Directory(PathBuf),
    Preloaded(&'a dyn TextureSource),
}

/// Converts textured OBJ meshes into colored LAS 1.3 point clouds
#[derive(Debug, Clone, Default)]
pub struct ObjToLasConverter {
    options: ConversionOptions,
}

impl ObjToLasConverter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert an OBJ file (with its MTL libraries and textures) into a LAS file
    ///
    /// Textures that fail to load are reported and replaced by the material's
    /// diffuse color; every other failure aborts the run.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(&self, obj_path: P, las_path: Q) -> Result<ConversionReport> {
        let start = Instant::now();
        let obj_path = obj_path.as_ref();
        self.options.validate()?;

        info!(input = %obj_path.display(), "Loading OBJ file");
        let (mesh, materials) = load_obj(obj_path)?;
        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            materials = materials.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "OBJ loaded"
        );

        let texture_dir = match &self.options.texture_dir {
            Some(dir) => dir.clone(),
            None => obj_path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let mut report = self.run(
            &mesh,
            &materials,
            Textures::Directory(texture_dir),
            Some(obj_path),
            las_path.as_ref(),
        )?;
        report.input = Some(obj_path.to_path_buf());
        report.elapsed_seconds = start.elapsed().as_secs_f64();
        Ok(report)
    }

    /// Convert an in-memory mesh whose textures are already decoded
    pub fn convert_mesh<T: TextureSource, Q: AsRef<Path>>(
        &self,
        mesh: &TexturedMesh,
        materials: &[Material],
        textures: &T,
        las_path: Q,
    ) -> Result<ConversionReport> {
        let start = Instant::now();
        self.options.validate()?;
        let mut report = self.run(mesh, materials, Textures::Preloaded(textures), None, las_path.as_ref())?;
        report.elapsed_seconds = start.elapsed().as_secs_f64();
        Ok(report)
    }

    fn run(
        &self,
        mesh: &TexturedMesh,
        materials: &[Material],
        textures: Textures<'_>,
        source: Option<&Path>,
        las_path: &Path,
    ) -> Result<ConversionReport> {
        let source_name = source.unwrap_or_else(|| Path::new("<memory>"));
        if mesh.is_empty() {
            return Err(Error::mesh_parse(source_name, "mesh has no vertices"));
        }
        if materials.len() > self.options.max_materials {
            return Err(Error::mesh_parse(
                source_name,
                format!(
                    "{} materials exceed the limit of {}",
                    materials.len(),
                    self.options.max_materials
                ),
            ));
        }

        let transform = compute_mesh_transform(mesh)?;

        let colorizer = MaterialColorizer::new(self.options.colorize_config());
        let mut colors = VertexColors::allocate(mesh.vertex_count());
        let mut failed_textures = Vec::new();
        for (material_id, material) in materials.iter().enumerate() {
            match &textures {
                Textures::Directory(dir) => {
                    let loaded = load_material_texture(material, dir, &mut failed_textures);
                    colorizer.colorize(mesh, material, material_id, &loaded, &mut colors);
                }
                Textures::Preloaded(source) => {
                    if let Some(name) = &material.diffuse_texture {
                        if source.texture(name).is_none() {
                            warn!(material = %material.name, texture = %name, "Texture not provided, using diffuse color");
                            failed_textures.push(FailedTexture {
                                material: material.name.clone(),
                                texture: PathBuf::from(name),
                                message: "texture not provided".to_string(),
                            });
                        }
                    }
                    colorizer.colorize(mesh, material, material_id, *source, &mut colors);
                }
            }
        }

        // nothing touches the output paths before this point
        let sidecar = (transform.needs_transform && self.options.write_sidecar).then(|| sidecar_path(las_path));
        let mut rebaser = Rebaser::new(transform);
        let las = match self.write_output(mesh, &colors, &mut rebaser, sidecar.as_deref(), las_path) {
            Ok(las) => las,
            Err(err) => {
                remove_partial_output(las_path, sidecar.as_deref());
                return Err(err);
            }
        };
        if rebaser.substitutions() > 0 {
            warn!(
                substituted = rebaser.substitutions(),
                "Negative coordinates after rebasing were replaced"
            );
        }

        info!(
            output = %las_path.display(),
            points = las.point_count,
            "Conversion complete"
        );
        Ok(ConversionReport {
            input: None,
            output: las_path.to_path_buf(),
            sidecar,
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            material_count: materials.len(),
            textured_materials: materials.iter().filter(|m| m.has_texture()).count(),
            failed_textures,
            transform,
            substituted_coordinates: rebaser.substitutions(),
            las,
            elapsed_seconds: 0.0,
        })
    }

    /// Write the sidecar (when requested) and the LAS file
    fn write_output(
        &self,
        mesh: &TexturedMesh,
        colors: &VertexColors,
        rebaser: &mut Rebaser,
        sidecar: Option<&Path>,
        las_path: &Path,
    ) -> Result<LasSummary> {
        if let Some(path) = sidecar {
            write_transform_sidecar(path, rebaser.transform())?;
        }
        let mut writer = Las13Writer::with_options(las_path, self.options.las.clone())?;
        write_points(mesh, colors, rebaser, self.options.color_floor, &mut writer)?;
        writer.close()
    }
}

/// Delete what a failed run may have left behind
fn remove_partial_output(las_path: &Path, sidecar: Option<&Path>) {
    for path in std::iter::once(las_path).chain(sidecar) {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed partial output"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove partial output"),
        }
    }
}

/// Decode the texture of `material`, recording a failure instead of aborting
fn load_material_texture(
    material: &Material,
    dir: &Path,
    failed: &mut Vec<FailedTexture>,
) -> Option<(String, TextureImage)> {
    let name = material.diffuse_texture.as_ref()?;
    let path = resolve_texture_path(dir, name);
    match load_texture(&path) {
        Ok(image) => {
            info!(
                material = %material.name,
                texture = %path.display(),
                width = image.width(),
                height = image.height(),
                "Texture loaded"
            );
            Some((name.clone(), image))
        }
        Err(err) => {
            warn!(
                material = %material.name,
                texture = %path.display(),
                error = %err,
                "Failed to load texture, using diffuse color"
            );
            failed.push(FailedTexture {
                material: material.name.clone(),
                texture: path,
                message: err.to_string(),
            });
            None
        }
    }
}

/// Rebase every vertex and hand it to `sink` with its 16 bit color
fn write_points<S: PointSink + ?Sized>(
    mesh: &TexturedMesh,
    colors: &VertexColors,
    rebaser: &mut Rebaser,
    color_floor: f32,
    sink: &mut S,
) -> Result<()> {
    let total = mesh.vertex_count();
    info!(total, "Writing points");
    for (index, (position, color)) in mesh.positions.iter().zip(colors.iter()).enumerate() {
        let position = rebaser.apply_point(*position);
        sink.add_point(ColoredPoint3d::new(position, color.with_floor(color_floor).to_rgb16()))?;

        let processed = index + 1;
        if processed % PROGRESS_INTERVAL == 0 {
            info!(
                processed,
                total,
                percent = %format!("{:.1}", processed as f64 * 100.0 / total as f64),
                "Progress"
            );
        }
    }
    Ok(())
}
