//! Core data structures and traits for texcloud
//!
//! This crate provides the fundamental types shared by the texcloud crates:
//! textured meshes and their materials, decoded texture images, vertex colors,
//! colored points, bounding boxes, the coordinate rebasing record and the
//! error type used across the workspace.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod material;
pub mod image;
pub mod bounds;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use material::*;
pub use image::*;
pub use bounds::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::Point3;

/// Common result type for texcloud operations
pub type Result<T> = std::result::Result<T, Error>;
