use super::{EdgeId, Polyhedra};
use crate::errors::MeshError;

impl Polyhedra {
    /// Check the structural invariants.
    ///
    /// - `twin` is an involution without fixed points, and twins run in
    ///   opposite directions
    /// - `next` and `prev` are inverse, every face cycle closes, closed faces
    ///   have at least 3 edges
    /// - no half-edge is dangling (both sides open)
    /// - the vertex-pair lookup agrees with the arena
    pub fn sanity(&self) -> Result<(), MeshError> {
        let fail = |id: EdgeId, what: &str| {
            Err(MeshError::InvalidTopology(format!("half-edge {}: {}", id.index(), what)))
        };

        for id in self.edge_ids() {
            let edge = self.he(id);
            let Some(twin) = self.edge(edge.twin) else {
                return fail(id, "missing twin");
            };
            if edge.twin == id || twin.twin != id {
                return fail(id, "twin is not an involution");
            }
            if edge.open && twin.open {
                return fail(id, "dangling edge with both sides open");
            }
            let (Some(next), Some(prev)) = (self.edge(edge.next), self.edge(edge.prev)) else {
                return fail(id, "broken next/prev link");
            };
            if next.prev != id || prev.next != id {
                return fail(id, "next and prev are not inverse");
            }
            if next.incident_vertex != twin.incident_vertex {
                return fail(id, "twin does not run backwards");
            }
            if self.find_edge(edge.incident_vertex, next.incident_vertex) != Some(id) {
                return fail(id, "edge lookup out of date");
            }
        }

        if self.edge_map.len() != self.edge_count() {
            return Err(MeshError::InvalidTopology(format!(
                "edge lookup holds {} entries for {} half-edges",
                self.edge_map.len(),
                self.edge_count()
            )));
        }

        for face in self.faces().into_iter().chain(self.open_faces()) {
            let degree = self.face_degree(face);
            let closes = self
                .face_walk(face)
                .last()
                .is_some_and(|last| self.he(last).next == face);
            if !closes {
                return fail(face, "face cycle does not close");
            }
            if !self.he(face).open && degree < 3 {
                return fail(face, "face with fewer than 3 edges");
            }
        }
        Ok(())
    }
}
