//! # texcloud Algorithms
//!
//! The per-vertex stages of the mesh to point cloud conversion.
//!
//! - [`sampling`]: nearest-pixel texture lookup with UV wraparound and a
//!   brightness boost for non-white samples
//! - [`colorize`]: per-material vertex colorization into a shared color buffer
//! - [`rebase`]: global-to-local coordinate rebasing

pub mod sampling;
pub mod colorize;
pub mod rebase;

// Re-export commonly used items
pub use sampling::*;
pub use colorize::*;
pub use rebase::*;
