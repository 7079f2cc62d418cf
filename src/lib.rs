//! # texcloud
//!
//! Conversion of textured 3D meshes into colored, georeferenced point clouds.
//!
//! This is the umbrella crate that provides convenient access to all texcloud
//! functionality. Use it to get everything in one place, or depend on the
//! individual crates for more granular control over dependencies.
//!
//! ## Crates
//!
//! - **Core**: Mesh, material, texture, color and transform types
//! - **Algorithms**: Texture sampling, per-material vertex colorization and
//!   coordinate rebasing
//! - **I/O**: OBJ/MTL reading, texture decoding, LAS 1.3 writing and the
//!   transform sidecar file
//!
//! ## Quick Start
//!
//! ```no_run
//! use texcloud::prelude::*;
//!
//! let converter = ObjToLasConverter::new(ConversionOptions::default());
//! let report = converter.convert("site.obj", "site.las")?;
//! println!("{} points written", report.las.point_count);
//! # Ok::<(), texcloud::Error>(())
//! ```

// Re-export core functionality
pub use texcloud_core::*;

// Re-export sub-crates
pub use texcloud_algorithms as algorithms;
pub use texcloud_io as io;

pub mod pipeline;

pub use pipeline::{ConversionOptions, ConversionReport, FailedTexture, ObjToLasConverter};

/// Convenient imports for common use cases
pub mod prelude {
    pub use texcloud_core::*;

    pub use texcloud_algorithms::*;

    pub use texcloud_io::*;

    pub use crate::pipeline::*;
}
