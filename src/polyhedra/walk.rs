//! Restartable walks around a face and around a vertex.

use super::{EdgeId, Polyhedra};

/// Half-edges of one face, following `next`, starting at the given edge.
#[derive(Debug, Clone)]
pub struct FaceWalk<'a> {
    poly: &'a Polyhedra,
    start: EdgeId,
    current: Option<EdgeId>,
    remaining: usize,
}

impl Iterator for FaceWalk<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let id = self.current?;
        if self.remaining == 0 {
            // a next chain that never closes
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        let next = self.poly.edge(id).map(|e| e.next).unwrap_or(EdgeId::NONE);
        self.current = (next != self.start && !next.is_none()).then_some(next);
        Some(id)
    }
}

/// Half-edges leaving one vertex, following `twin(e).next`.
#[derive(Debug, Clone)]
pub struct VertexWalk<'a> {
    poly: &'a Polyhedra,
    start: EdgeId,
    current: Option<EdgeId>,
    remaining: usize,
}

impl Iterator for VertexWalk<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let id = self.current?;
        if self.remaining == 0 {
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        let next = self
            .poly
            .edge(id)
            .and_then(|e| self.poly.edge(e.twin))
            .map(|t| t.next)
            .unwrap_or(EdgeId::NONE);
        self.current = (next != self.start && !next.is_none()).then_some(next);
        Some(id)
    }
}

impl Polyhedra {
    /// Walk the face that `start` belongs to. Re-walking from the same edge
    /// yields the same sequence. A dead handle yields nothing.
    pub fn face_walk(&self, start: EdgeId) -> FaceWalk<'_> {
        FaceWalk {
            poly: self,
            start,
            current: self.edge(start).map(|_| start),
            remaining: self.edge_count(),
        }
    }

    /// Walk the half-edges whose origin is the origin of `start`.
    pub fn vertex_walk(&self, start: EdgeId) -> VertexWalk<'_> {
        VertexWalk {
            poly: self,
            start,
            current: self.edge(start).map(|_| start),
            remaining: self.edge_count(),
        }
    }

    /// Number of edges around the face of `id`.
    pub fn face_degree(&self, id: EdgeId) -> usize {
        self.face_walk(id).count()
    }

    /// Some half-edge leaving `vertex`, preferring a closed one.
    pub fn vertex_edge(&self, vertex: usize) -> Option<EdgeId> {
        let mut fallback = None;
        for id in self.edge_ids() {
            let edge = self.he(id);
            if edge.incident_vertex == vertex {
                if !edge.open {
                    return Some(id);
                }
                fallback.get_or_insert(id);
            }
        }
        fallback
    }
}
