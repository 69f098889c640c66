//! Half-edge polyhedral meshes with per-corner vertex attributes, and
//! **Constructive Solid Geometry (CSG)** on them through solid-leaf binary
//! partition trees.
//!
//! A [`MeshEffect`] owns a [`Polyhedra`] (the half-edge topology), a point
//! array and an attribute array (position, normal, two UV sets, material).
//! Meshes are built from polygon batches or indexed vertex streams, edited
//! through attribute preserving edge operations, and exported back to
//! streams, material index groups or collision shapes.
//!
//! ```
//! use mesh_effect::{CsgOps, MeshEffect};
//! use nalgebra::Matrix4;
//!
//! let a = MeshEffect::cube(2.0, 0).unwrap();
//! let b = MeshEffect::cube(2.0, 1).unwrap();
//! let shift = Matrix4::new_translation(&nalgebra::Vector3::new(1.0, 1.0, 1.0));
//! let merged = a.union(&b, &shift).unwrap();
//! assert!((merged.calculate_volume() - 15.0).abs() < 1e-6);
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **chull-io**: convex hull meshes of point clouds
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **legacy-straddle**: trees built with [`StraddleMode::Legacy`] by default

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod csg;
pub mod errors;
pub mod float_types;
pub mod mesh;
pub mod numeric;
pub mod polyhedra;
pub mod sort;
pub mod traits;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use csg::{BooleanOp, Classification, CsgOptions, SolidTree, StraddleMode};
pub use errors::MeshError;
pub use mesh::{MeshEffect, SharedMeshEffect, VertexAttribute};
pub use polyhedra::{EdgeId, Polyhedra};
pub use traits::CsgOps;
