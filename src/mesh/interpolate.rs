//! Attribute interpolation along edges and inside faces, and the attribute
//! preserving edge edits built on it.

use super::{MeshEffect, VertexAttribute};
use crate::errors::MeshError;
use crate::float_types::Real;
use crate::polyhedra::EdgeId;
use nalgebra::{Point3, Vector2, Vector3};

/// Barycentric weights of `p` in triangle `(a, b, c)`, measured in the
/// triangle's plane. `None` for a zero-area triangle.
fn barycentric(p: &Point3<Real>, a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Option<[Real; 3]> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= Real::EPSILON * d00 * d11 {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some([1.0 - v - w, v, w])
}

impl MeshEffect {
    /// Corner attribute at an arbitrary point of a face.
    ///
    /// The face is fanned from its first corner; the fan triangle that best
    /// contains `point` supplies barycentric weights for the normal and both
    /// UV sets. The position is `point` itself and the material is the face's.
    pub fn interpolate_vertex(&self, point: &Point3<Real>, face: EdgeId) -> Result<VertexAttribute, MeshError> {
        let corners: Vec<VertexAttribute> = self
            .face_attribute_indices(face)
            .into_iter()
            .map(|i| {
                self.attributes.get(i).copied().ok_or(MeshError::IndexOutOfRange {
                    stream: "attribute",
                    index: i,
                    len: self.attributes.len(),
                })
            })
            .collect::<Result<_, _>>()?;
        if corners.len() < 3 {
            return Err(MeshError::DegenerateFace {
                face: face.index(),
                count: corners.len(),
            });
        }

        let mut best: Option<(Real, [usize; 3], [Real; 3])> = None;
        for i in 1..corners.len() - 1 {
            let tri = [0, i, i + 1];
            let Some(weights) = barycentric(
                point,
                &corners[0].position,
                &corners[i].position,
                &corners[i + 1].position,
            ) else {
                continue;
            };
            let worst = weights.iter().copied().fold(Real::MAX, Real::min);
            if best.is_none_or(|(score, _, _)| worst > score) {
                best = Some((worst, tri, weights));
            }
        }

        let mut result = VertexAttribute::at(*point).with_material(corners[0].material);
        let Some((_, tri, weights)) = best else {
            // every fan triangle is degenerate; fall back to the first corner
            result.normal = corners[0].normal;
            result.uv0 = corners[0].uv0;
            result.uv1 = corners[0].uv1;
            return Ok(result);
        };

        let mut normal = Vector3::zeros();
        let mut uv0 = Vector2::zeros();
        let mut uv1 = Vector2::zeros();
        for (&c, &w) in tri.iter().zip(&weights) {
            normal += corners[c].normal * w;
            uv0 += corners[c].uv0 * w;
            uv1 += corners[c].uv1 * w;
        }
        result.normal = normal.try_normalize(Real::EPSILON).unwrap_or(corners[0].normal);
        result.uv0 = uv0;
        result.uv1 = uv1;
        Ok(result)
    }

    /// Split an edge at parameter `t` (0 at its origin, 1 at its target),
    /// interpolating the attributes of both adjacent faces.
    ///
    /// Returns the half-edge that leaves the new vertex on the side of `edge`.
    pub fn insert_edge_vertex(&mut self, edge: EdgeId, t: Real) -> Result<EdgeId, MeshError> {
        let he = *self.polyhedra.get(edge)?;
        let twin = *self.polyhedra.get(he.twin)?;
        let next = *self.polyhedra.get(he.next)?;
        let twin_next = *self.polyhedra.get(twin.next)?;

        let p0 = self.points[he.incident_vertex];
        let p1 = self.points[twin.incident_vertex];
        let position = p0 + (p1 - p0) * t;

        let attribute = |index: usize| -> Result<VertexAttribute, MeshError> {
            self.attributes.get(index).copied().ok_or(MeshError::IndexOutOfRange {
                stream: "attribute",
                index,
                len: self.attributes.len(),
            })
        };

        let side = if he.open {
            None
        } else {
            let mut a = attribute(he.user_data)?.lerp(&attribute(next.user_data)?, t);
            a.position = position;
            Some(a)
        };
        let twin_side = if twin.open {
            None
        } else {
            let mut a = attribute(twin.user_data)?.lerp(&attribute(twin_next.user_data)?, 1.0 - t);
            a.position = position;
            Some(a)
        };

        let vertex = self.points.len();
        let first = self.attributes.len();
        let (side_index, twin_index, fresh) = match (side, twin_side) {
            (Some(a), Some(b)) => (first, first + 1, vec![a, b]),
            (Some(a), None) | (None, Some(a)) => (first, first, vec![a]),
            (None, None) => {
                return Err(MeshError::InvalidTopology(
                    "edge has no closed face on either side".to_string(),
                ));
            },
        };

        let result = self
            .polyhedra
            .split_edge(edge, vertex, side_index, twin_index)?;
        self.attributes.extend(fresh);
        self.points.push(position);
        Ok(result)
    }

    /// Split a face by joining the origins of two of its half-edges.
    pub fn connect_vertex(&mut self, e0: EdgeId, e1: EdgeId) -> Result<EdgeId, MeshError> {
        self.polyhedra.connect_vertex(e0, e1)
    }
}
