//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use mesh_effect::{MeshEffect, VertexAttribute, float_types::Real};
use nalgebra::{Matrix4, Point3, Vector3};

/// Route `log` output through the test harness; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// `|a - b| <= rel * |b|`
pub fn rel_eq(a: Real, b: Real, rel: Real) -> bool {
    (a - b).abs() <= rel * b.abs()
}

/// Cube spanning `[0, 1]^3`.
pub fn unit_cube() -> MeshEffect {
    MeshEffect::cube(1.0, 0).unwrap()
}

/// Cube of edge `size` centered at the origin.
pub fn centered_cube(size: Real) -> MeshEffect {
    let half = size * 0.5;
    MeshEffect::cube(size, 0)
        .unwrap()
        .transform_into(&Matrix4::new_translation(&Vector3::new(-half, -half, -half)))
}

pub fn translation(x: Real, y: Real, z: Real) -> Matrix4<Real> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// A single flat polygon with +z normals, one attribute per corner.
pub fn flat_polygon(points: &[[Real; 3]], material: u32) -> Vec<VertexAttribute> {
    points
        .iter()
        .map(|p| VertexAttribute {
            normal: Vector3::z(),
            ..VertexAttribute::at(Point3::new(p[0], p[1], p[2])).with_material(material)
        })
        .collect()
}

/// No closed face may collapse to a point.
pub fn assert_no_collapsed_faces(mesh: &MeshEffect) {
    for face in mesh.face_ids() {
        let points = mesh.face_points(face);
        assert!(points.len() >= 3);
        let first = points[0];
        assert!(
            points.iter().any(|p| (p - first).norm() > 0.0),
            "face {:?} has all corners coincident",
            face
        );
    }
}

pub trait TransformInto {
    fn transform_into(self, matrix: &Matrix4<Real>) -> Self;
}

impl TransformInto for MeshEffect {
    fn transform_into(mut self, matrix: &Matrix4<Real>) -> Self {
        self.transform_mesh(matrix).unwrap();
        self
    }
}
