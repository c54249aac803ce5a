//! Metaball stroke surfaces for mesh sculpting.
//!
//! Turns a brush stroke into closed, smoothly blended geometry that is
//! appended to an editable mesh.
//!
//! # Overview
//!
//! Each stroke sample goes through four stages:
//! 1. [`AnchorTracker`] records the sample unless it lies too close to the
//!    previous anchor
//! 2. [`build_field`] samples the smooth union of one sphere per anchor on a
//!    regular grid
//! 3. [`compute_surface`] extracts the zero level set with marching cubes
//! 4. [`append_patch`] concatenates the patch onto the mesh buffers and asks
//!    the host to rebuild
//!
//! [`MetaballTool`] drives the whole pipeline from pointer events.
//!
//! # Example
//!
//! ```
//! use mesh_metaball::{append_patch, build_field, compute_surface, MeshBuffers, MetaballParams};
//! use nalgebra::Point3;
//!
//! let params = MetaballParams::default().with_radius(10.0);
//! let anchors = [Point3::new(0.0, 0.0, 0.0), Point3::new(8.0, 0.0, 0.0)];
//!
//! let field = build_field(&anchors, &params);
//! let mut patch = compute_surface(&field).unwrap();
//! patch.to_world(&field.origin(), field.step());
//!
//! let mut mesh = MeshBuffers::new();
//! let summary = append_patch(&mut mesh, &patch).unwrap();
//! assert!(summary.faces_added > 0);
//! assert!(mesh.validate().is_ok());
//! ```
//!
//! # Quality vs Performance
//!
//! - `MetaballParams::preview()` - Coarse grid for interactive feedback
//! - `MetaballParams::default()` - Ten cells per sphere diameter
//! - `MetaballParams::high_quality()` - Fine grid with a larger voxel budget
//!
//! Fields that would exceed the voxel budget are sampled at twice the step.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod anchor;
mod error;
mod field;
mod grid;
mod marching_cubes;
mod merge;
mod mesh;
mod params;
mod patch;
mod tables;
mod tool;

pub use anchor::AnchorTracker;
pub use error::{MetaballError, MetaballResult};
pub use field::{
    GridLayout, build_field, choose_resolution, compute_bounds, sample_field, smooth_min,
    sphere_sdf,
};
pub use grid::VoxelField;
pub use marching_cubes::compute_surface;
pub use merge::{MergeSummary, append_patch};
pub use mesh::{EditableMesh, MeshBuffers};
pub use params::{MetaballParams, SurfaceAttributes};
pub use patch::{SurfacePatch, TRIANGLE_TAG};
pub use tool::{IntersectionSource, MetaballTool, RenderHost, StrokeOutcome};
