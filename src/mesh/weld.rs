//! Vertex welding: sort along x, then sweep a window of width `tol`. Also
//! the T-junction pass that closes cracks between boundary loops.

use super::{MeshEffect, VertexAttribute};
use crate::errors::MeshError;
use crate::float_types::Real;
use crate::polyhedra::EdgeId;
use crate::sort::quick_sort_by;
use hashbrown::HashMap;
use nalgebra::Point3;
use std::cmp::Ordering;

/// Cluster items whose `x` keys lie within `tol` and that `close` accepts.
///
/// Returns one cluster id per item. Clusters are numbered by the first item
/// (in input order) that belongs to them, so the output is stable under
/// reordering of far-apart items.
fn cluster<T, X, C>(items: &[T], tol: Real, x: X, close: C) -> Result<(Vec<usize>, usize), MeshError>
where
    X: Fn(&T) -> Real,
    C: Fn(&T, &T) -> bool,
{
    let mut order: Vec<usize> = (0..items.len()).collect();
    quick_sort_by(&mut order, |&a, &b| {
        x(&items[a])
            .partial_cmp(&x(&items[b]))
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    })?;

    let mut leader = vec![usize::MAX; items.len()];
    for (rank, &i) in order.iter().enumerate() {
        if leader[i] != usize::MAX {
            continue;
        }
        leader[i] = i;
        let xi = x(&items[i]);
        for &j in &order[rank + 1..] {
            if x(&items[j]) - xi > tol {
                break;
            }
            if leader[j] == usize::MAX && close(&items[i], &items[j]) {
                leader[j] = i;
            }
        }
    }

    let mut id_of_leader = vec![usize::MAX; items.len()];
    let mut ids = Vec::with_capacity(items.len());
    let mut count = 0;
    for i in 0..items.len() {
        let l = leader[i];
        if id_of_leader[l] == usize::MAX {
            id_of_leader[l] = count;
            count += 1;
        }
        ids.push(id_of_leader[l]);
    }
    Ok((ids, count))
}

/// Merge points closer than `tol` on every axis.
///
/// Returns the unique points (each the first occurrence of its cluster) and
/// the input index -> unique index map.
pub fn weld_points(
    points: &[Point3<Real>],
    tol: Real,
) -> Result<(Vec<Point3<Real>>, Vec<usize>), MeshError> {
    let (ids, count) = cluster(points, tol, |p| p.x, |a, b| (a - b).amax() <= tol)?;
    let mut unique = vec![Point3::origin(); count];
    let mut seen = vec![false; count];
    for (p, &id) in points.iter().zip(&ids) {
        if !seen[id] {
            unique[id] = *p;
            seen[id] = true;
        }
    }
    Ok((unique, ids))
}

/// Merge corner attributes that agree on every channel within `tol`.
pub fn weld_attributes(
    attributes: &[VertexAttribute],
    tol: Real,
) -> Result<(Vec<VertexAttribute>, Vec<usize>), MeshError> {
    let (ids, count) = cluster(
        attributes,
        tol,
        |a| a.position.x,
        |a, b| a.close_to(b, tol),
    )?;
    let mut unique = vec![VertexAttribute::default(); count];
    let mut seen = vec![false; count];
    for (a, &id) in attributes.iter().zip(&ids) {
        if !seen[id] {
            unique[id] = *a;
            seen[id] = true;
        }
    }
    Ok((unique, ids))
}

impl MeshEffect {
    /// Close the cracks left where a boundary vertex sits on the middle of
    /// another boundary edge (a T-junction).
    ///
    /// Every open edge is split at each boundary vertex lying within `tol` of
    /// it, away from its ends; the new corner on the closed side gets
    /// interpolated attributes. Each split vertex is then replaced by the
    /// boundary vertex it landed on and the faces are rebuilt, which pairs
    /// the matching open edges. Returns the number of splits.
    ///
    /// If the merged faces would not form a manifold surface the splits are
    /// kept but the cracks stay open.
    pub fn weld_t_joints(&mut self, tol: Real) -> Result<usize, MeshError> {
        let open: Vec<EdgeId> = self
            .polyhedra
            .edge_ids()
            .filter(|&e| self.polyhedra.he(e).open)
            .collect();
        let mut boundary: Vec<usize> = open
            .iter()
            .map(|&e| self.polyhedra.he(e).incident_vertex)
            .collect();
        boundary.sort_unstable();
        boundary.dedup();

        // split vertex -> boundary vertex it coincides with
        let mut landed: HashMap<usize, usize> = HashMap::new();
        for edge in open {
            let (a, b) = self.edge_points(edge)?;
            let origin = self.points[a];
            let span = self.points[b] - origin;
            let length = span.norm();
            if length <= tol {
                continue;
            }
            let direction = span / length;

            let mut hits: Vec<(Real, usize)> = boundary
                .iter()
                .filter(|&&p| p != a && p != b)
                .filter_map(|&p| {
                    let offset = self.points[p] - origin;
                    let along = offset.dot(&direction);
                    let inside = along > tol && along < length - tol;
                    (inside && (offset - direction * along).norm() <= tol).then_some((along, p))
                })
                .collect();
            hits.sort_by(|x, y| x.0.total_cmp(&y.0));

            let mut current = edge;
            let mut done = 0.0;
            for (along, p) in hits {
                if along - done <= tol {
                    continue;
                }
                current = self.insert_edge_vertex(current, (along - done) / (length - done))?;
                landed.insert(self.points.len() - 1, p);
                done = along;
            }
        }
        if landed.is_empty() {
            return Ok(0);
        }

        let mut faces = self.face_records();
        for face in &mut faces {
            for (point, &attribute) in face.points.iter_mut().zip(&face.attributes) {
                if let Some(&target) = landed.get(point) {
                    *point = target;
                    if let Some(corner) = self.attributes.get_mut(attribute) {
                        corner.position = self.points[target];
                    }
                }
            }
        }
        match self.rebuild(&faces) {
            Ok(()) => {},
            Err(
                err @ (MeshError::DuplicateEdge { .. }
                | MeshError::NonManifoldEdge { .. }
                | MeshError::DegenerateFace { .. }
                | MeshError::InvalidTopology(_)),
            ) => log::warn!("weld_t_joints: cracks left open, {}", err),
            Err(err) => return Err(err),
        }
        self.remove_unused_vertices();

        log::debug!("weld_t_joints: {} edges split", landed.len());
        Ok(landed.len())
    }
}
