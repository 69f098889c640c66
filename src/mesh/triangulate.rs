//! Face triangulation and the reverse pass that merges coplanar triangles
//! back into convex polygons.

use super::{FaceRecord, MeshEffect, newell_normal};
use crate::errors::MeshError;
use crate::float_types::{EPSILON, Real};
use geo::{Coord, LineString, Polygon as GeoPolygon, TriangulateEarcut};
use nalgebra::{Point3, Vector3};

fn fan(count: usize) -> Vec<[usize; 3]> {
    (1..count - 1).map(|i| [0, i, i + 1]).collect()
}

/// Triangulate a simple polygon loop, returning corner index triples wound
/// like the loop itself.
///
/// The loop is projected onto the coordinate plane most aligned with its
/// normal and ear-clipped; if the ear clipper cannot produce `n - 2`
/// triangles (collinear runs, self-touching input) a fan is used instead.
pub fn triangulate_loop(points: &[Point3<Real>]) -> Vec<[usize; 3]> {
    let count = points.len();
    if count < 3 {
        return Vec::new();
    }
    if count == 3 {
        return vec![[0, 1, 2]];
    }

    let normal = newell_normal(points);
    let (u, v) = match normal.iamax() {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let ring: Vec<Coord<Real>> = points.iter().map(|p| Coord { x: p[u], y: p[v] }).collect();
    let polygon = GeoPolygon::new(LineString::new(ring), vec![]);
    let triangulation = polygon.earcut_triangles_raw();

    // the ring is closed by geo, so an index may point at the repeated first coordinate
    let mut triangles: Vec<[usize; 3]> = triangulation
        .triangle_indices
        .chunks_exact(3)
        .map(|t| [t[0] % count, t[1] % count, t[2] % count])
        .collect();
    if triangles.len() != count - 2
        || triangles
            .iter()
            .any(|t| t[0] == t[1] || t[1] == t[2] || t[0] == t[2])
    {
        return fan(count);
    }

    for t in &mut triangles {
        let n = (points[t[1]] - points[t[0]]).cross(&(points[t[2]] - points[t[0]]));
        if n.dot(&normal) < 0.0 {
            t.swap(1, 2);
        }
    }
    triangles
}

/// `true` when every corner of the loop turns the same way around `normal`.
fn is_convex(points: &[Point3<Real>], normal: &Vector3<Real>) -> bool {
    let count = points.len();
    let scale = normal.norm();
    (0..count).all(|i| {
        let a = points[(i + count - 1) % count];
        let b = points[i];
        let c = points[(i + 1) % count];
        (b - a).cross(&(c - b)).dot(normal) >= -EPSILON * scale
    })
}

impl MeshEffect {
    /// Split every face with more than three corners into triangles.
    ///
    /// Point and attribute tables are untouched, so triangulating an
    /// all-triangle mesh changes nothing.
    pub fn triangulate(&mut self) -> Result<(), MeshError> {
        let records = self.face_records();
        if records.iter().all(|face| face.points.len() == 3) {
            return Ok(());
        }

        let mut faces = Vec::with_capacity(records.len() * 2);
        for face in records {
            if face.points.len() == 3 {
                faces.push(face);
                continue;
            }
            let loop_points: Vec<Point3<Real>> =
                face.points.iter().map(|&p| self.points[p]).collect();
            for [a, b, c] in triangulate_loop(&loop_points) {
                faces.push(FaceRecord {
                    points: vec![face.points[a], face.points[b], face.points[c]],
                    attributes: vec![face.attributes[a], face.attributes[b], face.attributes[c]],
                });
            }
        }
        log::debug!("triangulate: {} triangles", faces.len());
        self.rebuild(&faces)
    }

    /// Merge neighbouring faces that share a plane and a material, as long
    /// as the merged face stays convex.
    pub fn convert_to_polygons(&mut self) -> Result<(), MeshError> {
        let mut merged = 0usize;
        for edge in self.edge_ids() {
            let Some(he) = self.polyhedra.edge(edge).copied() else {
                continue;
            };
            if he.open || self.polyhedra.is_open(he.twin) {
                continue;
            }
            if self.polyhedra.face_walk(edge).any(|e| e == he.twin) {
                continue;
            }
            if self.face_material(edge)? != self.face_material(he.twin)? {
                continue;
            }

            let n0 = self.face_normal(edge);
            let n1 = self.face_normal(he.twin);
            if n0.dot(&n1) < (1.0 - EPSILON) * n0.norm() * n1.norm() {
                continue;
            }

            let joined: Vec<Point3<Real>> = self
                .polyhedra
                .face_walk(he.next)
                .take_while(|&e| e != edge)
                .chain(
                    self.polyhedra
                        .face_walk(self.polyhedra.he(he.twin).next)
                        .take_while(|&e| e != he.twin),
                )
                .map(|e| self.points[self.polyhedra.he(e).incident_vertex])
                .collect();
            if !is_convex(&joined, &(n0 + n1)) {
                continue;
            }

            self.polyhedra.delete_edge(edge)?;
            merged += 1;
        }
        log::debug!("convert_to_polygons: {} edges removed", merged);
        Ok(())
    }
}
