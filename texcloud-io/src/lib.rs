//! I/O operations for textured meshes and colored point clouds
//!
//! This crate reads Wavefront OBJ meshes with their MTL material libraries
//! (through `tobj`),
//! decodes the texture images those materials refer to and writes colored
//! point clouds as LAS 1.3 (point data record format 3).

pub mod obj;
pub mod texture;
pub mod las;
pub mod sidecar;

pub use obj::load_obj;
pub use texture::{load_texture, resolve_texture_path};
pub use las::{Las13Writer, LasHeader, LasPointRecord, LasSummary, LasWriterOptions};
pub use sidecar::{read_transform_sidecar, sidecar_path, write_transform_sidecar};

use std::path::Path;
use texcloud_core::{ColoredPointCloud, Material, PointSink, Result, TexturedMesh};

/// Trait for reading textured meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<(TexturedMesh, Vec<Material>)>;
}

/// Trait for writing colored point clouds to files
pub trait PointCloudWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &ColoredPointCloud, path: P) -> Result<LasSummary>;
}

pub struct ObjReader;
pub struct LasWriter;

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<(TexturedMesh, Vec<Material>)> {
        load_obj(path)
    }
}

impl PointCloudWriter for LasWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &ColoredPointCloud, path: P) -> Result<LasSummary> {
        let mut writer = Las13Writer::create(path)?;
        for point in cloud {
            writer.add_point(*point)?;
        }
        writer.close()
    }
}
