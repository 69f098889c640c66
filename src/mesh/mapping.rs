//! Normal smoothing and texture coordinate generation.
//!
//! Every pass writes a fresh attribute per face corner and then packs the
//! attribute table, so corners that end up identical are shared again.

use super::{MeshEffect, VertexAttribute};
use crate::errors::MeshError;
use crate::float_types::{EPSILON, PI, Real, TAU};
use crate::polyhedra::EdgeId;
use nalgebra::{Point3, Vector2, Vector3};

impl MeshEffect {
    fn rewrite_corners<F>(&mut self, mut rewrite: F) -> Result<(), MeshError>
    where
        F: FnMut(&MeshEffect, EdgeId, &Vector3<Real>, &VertexAttribute) -> VertexAttribute,
    {
        let mut updates = Vec::with_capacity(self.polyhedra.edge_count());
        for face in self.face_ids() {
            let normal = self
                .face_normal(face)
                .try_normalize(Real::EPSILON)
                .unwrap_or_else(Vector3::z);
            for corner in self.polyhedra.face_walk(face) {
                let data = self.polyhedra.he(corner).user_data;
                let old = self.attributes.get(data).copied().ok_or(MeshError::IndexOutOfRange {
                    stream: "attribute",
                    index: data,
                    len: self.attributes.len(),
                })?;
                updates.push((corner, rewrite(self, corner, &normal, &old)));
            }
        }

        let mut attributes = Vec::with_capacity(updates.len());
        for (corner, attribute) in updates {
            self.polyhedra.set_user_data(corner, attributes.len())?;
            attributes.push(attribute);
        }
        self.attributes = attributes;
        self.pack_vertex_arrays()
    }

    fn extent(&self) -> Result<(Point3<Real>, Vector3<Real>), MeshError> {
        let aabb = self.calculate_aabb()?;
        let size = (aabb.maxs - aabb.mins).map(|v| v.max(EPSILON));
        Ok((aabb.mins, size))
    }

    /// Smooth corner normals across edges whose dihedral angle is below
    /// `angle` (radians); sharper edges stay hard.
    pub fn calculate_normals(&mut self, angle: Real) -> Result<(), MeshError> {
        let threshold = angle.cos();
        self.rewrite_corners(|mesh, corner, normal, old| {
            let mut sum = Vector3::zeros();
            for outgoing in mesh.polyhedra.vertex_walk(corner) {
                if mesh.polyhedra.is_open(outgoing) {
                    continue;
                }
                let n = mesh.face_normal(outgoing);
                if n.try_normalize(Real::EPSILON)
                    .is_some_and(|unit| unit.dot(normal) >= threshold)
                {
                    sum += n;
                }
            }
            let mut a = *old;
            a.normal = sum.try_normalize(Real::EPSILON).unwrap_or(*normal);
            a
        })
    }

    /// Project UVs from the bounding box center onto a sphere.
    pub fn spherical_mapping(&mut self, material: u32) -> Result<(), MeshError> {
        let (mins, size) = self.extent()?;
        let center = mins + size * 0.5;
        self.rewrite_corners(|_, _, _, old| {
            let d = (old.position - center)
                .try_normalize(Real::EPSILON)
                .unwrap_or_else(Vector3::y);
            let uv = Vector2::new(
                d.z.atan2(d.x) / TAU + 0.5,
                d.y.clamp(-1.0, 1.0).asin() / PI + 0.5,
            );
            VertexAttribute {
                uv0: uv,
                uv1: uv,
                material,
                ..*old
            }
        })
    }

    /// Planar projection along the dominant axis of each face normal:
    /// x-facing faces get `side`, y-facing `top`, z-facing `front`.
    pub fn box_mapping(&mut self, front: u32, side: u32, top: u32) -> Result<(), MeshError> {
        let (mins, size) = self.extent()?;
        self.rewrite_corners(|_, _, normal, old| {
            let local = (old.position - mins).component_div(&size);
            let (uv, material) = match normal.iamax() {
                0 => (Vector2::new(local.y, local.z), side),
                1 => (Vector2::new(local.z, local.x), top),
                _ => (Vector2::new(local.x, local.y), front),
            };
            VertexAttribute {
                uv0: uv,
                uv1: uv,
                material,
                ..*old
            }
        })
    }

    /// Wrap UVs around the y axis; faces facing mostly up or down are caps
    /// mapped flat in xz.
    pub fn cylindrical_mapping(&mut self, cylinder_material: u32, cap_material: u32) -> Result<(), MeshError> {
        let (mins, size) = self.extent()?;
        let center = mins + size * 0.5;
        self.rewrite_corners(|_, _, normal, old| {
            let local = (old.position - mins).component_div(&size);
            let (uv, material) = if normal.y.abs() > 0.7 {
                (Vector2::new(local.x, local.z), cap_material)
            } else {
                let d = old.position - center;
                (Vector2::new(d.z.atan2(d.x) / TAU + 0.5, local.y), cylinder_material)
            };
            VertexAttribute {
                uv0: uv,
                uv1: uv,
                material,
                ..*old
            }
        })
    }
}
