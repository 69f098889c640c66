// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Lazily-initialized vertex weld tolerance used when building meshes.
/// Two positions closer than this (per axis and in distance) become one vertex.
/// Defaults to `1e-6`, but can be overridden:
///  1) **Build-time**: set env var `MESH_EFFECT_TOLERANCE` (e.g. `MESH_EFFECT_TOLERANCE=1e-5 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before using the library
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    1e-6
}

/// Returns the current vertex weld tolerance.
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        if let Some(environment_variable) = option_env!("MESH_EFFECT_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set the weld tolerance programmatically once (subsequent calls are ignored).
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// General purpose geometric epsilon for unit-scale meshes.
pub const EPSILON: Real = 1.0e-5;

/// Faces whose area falls below this are dropped from boolean output.
pub const TRIANGLE_MIN_AREA: Real = 1.0e-9;

/// Faces whose squared (unnormalized) normal magnitude falls below this
/// contribute no plane to a solid tree.
pub const PLANE_MIN_MAG2: f64 = 1.0e-14;

// Pi
/// Archimedes' constant (π)
#[cfg(feature = "f32")]
pub const PI: Real = core::f32::consts::PI;
/// Archimedes' constant (π)
#[cfg(feature = "f64")]
pub const PI: Real = core::f64::consts::PI;

// Tau
/// The full circle constant (τ)
#[cfg(feature = "f32")]
pub const TAU: Real = core::f32::consts::TAU;
/// The full circle constant (τ)
#[cfg(feature = "f64")]
pub const TAU: Real = core::f64::consts::TAU;

use nalgebra::{Point3, Vector3};

/// Widen a mesh point to the f64 working precision of the boolean kernel.
#[inline]
#[allow(clippy::unnecessary_cast)]
pub fn to_big(p: &Point3<Real>) -> Point3<f64> {
    Point3::new(p.x as f64, p.y as f64, p.z as f64)
}

/// Narrow an f64 kernel point back to mesh precision.
#[inline]
#[allow(clippy::unnecessary_cast)]
pub fn from_big(p: &Point3<f64>) -> Point3<Real> {
    Point3::new(p.x as Real, p.y as Real, p.z as Real)
}

/// Narrow an f64 kernel vector back to mesh precision.
#[inline]
#[allow(clippy::unnecessary_cast)]
pub fn vector_from_big(v: &Vector3<f64>) -> Vector3<Real> {
    Vector3::new(v.x as Real, v.y as Real, v.z as Real)
}
