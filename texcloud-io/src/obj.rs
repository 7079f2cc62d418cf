//! Wavefront OBJ and MTL loading
//!
//! Parsing is done by `tobj` built with `f64` positions: georeferenced meshes
//! carry coordinates in the millions and `f32` would lose the millimetre
//! digits.
//!
//! Every `tobj` model (one per `o`/`g` block and `usemtl` switch) becomes a
//! [`Shape`]. A model only carries the vertices its faces reference, so a
//! vertex shared by two material groups appears once per group and vertices
//! no face references are not part of the mesh.

use std::path::Path;
use texcloud_core::{Error, Face, FaceVertex, Material, Point3d, Result, Rgb, Shape, TexturedMesh};
use tracing::{debug, warn};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ..Default::default()
    }
}

/// Read an OBJ file into a mesh and its materials
///
/// A missing or unreadable file is an `InputAccess` error; malformed content,
/// a non-finite position or a file without vertices is a `MeshParse` error.
/// MTL libraries that cannot be loaded only produce a warning.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<(TexturedMesh, Vec<Material>)> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(path, &load_options()).map_err(|e| load_error(path, e))?;

    let materials: Vec<Material> = match materials {
        Ok(materials) => materials.into_iter().map(convert_material).collect(),
        Err(err) => {
            warn!(obj = %path.display(), error = %err, "Material library not loaded, faces keep the default color");
            Vec::new()
        }
    };

    let mesh = mesh_from_models(path, &models)?;
    if mesh.is_empty() {
        return Err(Error::mesh_parse(path, "mesh has no vertices"));
    }
    debug!(
        vertices = mesh.vertex_count(),
        texcoords = mesh.texcoords.len(),
        shapes = mesh.shapes.len(),
        materials = materials.len(),
        "OBJ parsed"
    );
    Ok((mesh, materials))
}

fn load_error(path: &Path, err: tobj::LoadError) -> Error {
    if matches!(err, tobj::LoadError::OpenFileFailed | tobj::LoadError::ReadError) {
        Error::InputAccess {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    } else {
        Error::mesh_parse(path, err.to_string())
    }
}

/// Concatenate the models into one mesh, rebasing their indices
fn mesh_from_models(path: &Path, models: &[tobj::Model]) -> Result<TexturedMesh> {
    let mut mesh = TexturedMesh::new();

    for model in models {
        let source = &model.mesh;
        let vertex_offset = mesh.positions.len();
        let texcoord_offset = mesh.texcoords.len();

        for (index, p) in source.positions.chunks_exact(3).enumerate() {
            let position = Point3d::new(p[0], p[1], p[2]);
            if !position.coords.iter().all(|c| c.is_finite()) {
                return Err(Error::mesh_parse(
                    path,
                    format!(
                        "vertex {} of '{}' has a non-finite coordinate ({}, {}, {})",
                        index, model.name, p[0], p[1], p[2]
                    ),
                ));
            }
            mesh.positions.push(position);
        }
        mesh.texcoords
            .extend(source.texcoords.chunks_exact(2).map(|uv| [uv[0] as f32, uv[1] as f32]));

        let with_texcoords = !source.texcoord_indices.is_empty()
            && source.texcoord_indices.len() == source.indices.len();
        if !source.texcoord_indices.is_empty() && !with_texcoords {
            warn!(shape = %model.name, "Faces mix corners with and without texture coordinates, ignoring them");
        }
        let corner = |i: usize| {
            FaceVertex::new(
                vertex_offset + source.indices[i] as usize,
                with_texcoords.then(|| texcoord_offset + source.texcoord_indices[i] as usize),
            )
        };

        // an empty arity list means every face is a triangle
        let arities: Vec<usize> = if source.face_arities.is_empty() {
            vec![3; source.indices.len() / 3]
        } else {
            source.face_arities.iter().map(|&a| a as usize).collect()
        };
        let mut shape = Shape::new(model.name.clone());
        let mut start = 0;
        for arity in arities {
            let end = (start + arity).min(source.indices.len());
            shape.faces.push(Face::new(source.material_id, (start..end).map(corner).collect()));
            start = end;
        }
        mesh.shapes.push(shape);
    }
    Ok(mesh)
}

fn convert_material(material: tobj::Material) -> Material {
    let mut converted = Material::new(material.name);
    if let Some([r, g, b]) = material.diffuse {
        converted = converted.with_diffuse(Rgb::new(r as f32, g as f32, b as f32));
    }
    if let Some(raw) = material.diffuse_texture.as_deref() {
        converted = converted.with_texture(texture_file_name(raw));
    }
    converted
}

fn texture_option_arity(option: &str) -> Option<usize> {
    match option {
        "-blendu" | "-blendv" | "-boost" | "-cc" | "-clamp" | "-texres" | "-bm" | "-imfchan" | "-type" => Some(1),
        "-mm" => Some(2),
        "-o" | "-s" | "-t" => Some(3),
        _ => None,
    }
}

/// Strip the options in front of the file name of a `map_Kd` statement
fn texture_file_name(raw: &str) -> String {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let Some(arity) = texture_option_arity(tokens[i]) else { break };
        i += 1;
        if arity == 3 {
            // -o, -s and -t take one to three numbers
            let mut taken = 0;
            while taken < 3 && i < tokens.len() && tokens[i].parse::<f64>().is_ok() {
                i += 1;
                taken += 1;
            }
        } else {
            i = (i + arity).min(tokens.len());
        }
    }
    tokens[i..].join(" ")
}
