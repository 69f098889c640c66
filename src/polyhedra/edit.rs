//! Local topology edits. Each operation validates first and mutates only
//! once it cannot fail, so an `Err` leaves the polyhedron untouched.

use super::{EdgeId, HalfEdge, Polyhedra};
use crate::errors::MeshError;

impl Polyhedra {
    /// Split a face by a new edge pair joining the origins of `e0` and `e1`,
    /// which must lie on the same closed face and not be adjacent.
    ///
    /// Returns the new half-edge running from `origin(e0)` to `origin(e1)`;
    /// it belongs to the face that continues with `e1`.
    pub fn connect_vertex(&mut self, e0: EdgeId, e1: EdgeId) -> Result<EdgeId, MeshError> {
        let edge0 = *self.get(e0)?;
        let edge1 = *self.get(e1)?;
        let (a, b) = (edge0.incident_vertex, edge1.incident_vertex);

        if e0 == e1 || edge0.open || edge1.open || !self.face_walk(e0).any(|e| e == e1) {
            return Err(MeshError::NotInSameFace { v0: a, v1: b });
        }
        if edge0.next == e1
            || edge1.next == e0
            || self.find_edge(a, b).is_some()
            || self.find_edge(b, a).is_some()
        {
            return Err(MeshError::DuplicateEdge { v0: a, v1: b });
        }

        let p0 = edge0.prev;
        let p1 = edge1.prev;
        let n0 = self.alloc(HalfEdge {
            incident_vertex: a,
            user_data: edge0.user_data,
            twin: EdgeId::NONE,
            next: e1,
            prev: p0,
            open: false,
        });
        let n1 = self.alloc(HalfEdge {
            incident_vertex: b,
            user_data: edge1.user_data,
            twin: n0,
            next: e0,
            prev: p1,
            open: false,
        });
        self.he_mut(n0).twin = n1;
        self.he_mut(p0).next = n0;
        self.he_mut(e1).prev = n0;
        self.he_mut(p1).next = n1;
        self.he_mut(e0).prev = n1;

        self.edge_map.insert((a, b), n0);
        self.edge_map.insert((b, a), n1);
        Ok(n0)
    }

    /// Insert an edge between vertices `v0` and `v1` of the face containing
    /// `face`. Fails with [`MeshError::NotInSameFace`] when either vertex is
    /// not on that face.
    pub fn insert_edge(&mut self, face: EdgeId, v0: usize, v1: usize) -> Result<EdgeId, MeshError> {
        self.get(face)?;
        let find = |v: usize| {
            self.face_walk(face)
                .find(|&e| self.he(e).incident_vertex == v)
        };
        let (e0, e1) = (find(v0), find(v1));
        match (e0, e1) {
            (Some(e0), Some(e1)) => self.connect_vertex(e0, e1),
            _ => Err(MeshError::NotInSameFace { v0, v1 }),
        }
    }

    /// Split the edge of `id` (and its twin) at the new vertex `vertex`.
    ///
    /// `user_data` is the corner payload at `vertex` for the face of `id`,
    /// `twin_user_data` the one for the twin's face. Returns the half-edge
    /// leaving `vertex` on the face of `id`.
    pub fn split_edge(
        &mut self,
        id: EdgeId,
        vertex: usize,
        user_data: usize,
        twin_user_data: usize,
    ) -> Result<EdgeId, MeshError> {
        let edge = *self.get(id)?;
        let twin_id = edge.twin;
        let twin = *self.get(twin_id)?;
        let a = edge.incident_vertex;
        let b = twin.incident_vertex;
        if vertex == a
            || vertex == b
            || self.find_edge(a, vertex).is_some()
            || self.find_edge(vertex, b).is_some()
        {
            return Err(MeshError::DuplicateEdge { v0: a, v1: vertex });
        }

        let e2 = self.alloc(HalfEdge {
            incident_vertex: vertex,
            user_data,
            twin: twin_id,
            next: edge.next,
            prev: id,
            open: edge.open,
        });
        let t2 = self.alloc(HalfEdge {
            incident_vertex: vertex,
            user_data: twin_user_data,
            twin: id,
            next: twin.next,
            prev: twin_id,
            open: twin.open,
        });
        self.he_mut(edge.next).prev = e2;
        self.he_mut(twin.next).prev = t2;
        {
            let e = self.he_mut(id);
            e.next = e2;
            e.twin = t2;
        }
        {
            let t = self.he_mut(twin_id);
            t.next = t2;
            t.twin = e2;
        }

        self.edge_map.remove(&(a, b));
        self.edge_map.remove(&(b, a));
        self.edge_map.insert((a, vertex), id);
        self.edge_map.insert((vertex, b), e2);
        self.edge_map.insert((b, vertex), twin_id);
        self.edge_map.insert((vertex, a), t2);
        Ok(e2)
    }

    /// Replace the diagonal shared by two triangles with the other diagonal.
    ///
    /// For triangles `(a, b, c)` and `(b, a, d)` sharing `a -> b`, the result
    /// is `(d, c, a)` and `(c, d, b)`. Returns the half-edge `d -> c`.
    pub fn flip_edge(&mut self, id: EdgeId) -> Result<EdgeId, MeshError> {
        let edge = *self.get(id)?;
        let twin_id = edge.twin;
        let twin = *self.get(twin_id)?;
        if edge.open || twin.open || self.face_degree(id) != 3 || self.face_degree(twin_id) != 3 {
            return Err(MeshError::InvalidTopology(
                "flip_edge needs two closed triangles".to_string(),
            ));
        }

        let e_next = edge.next;
        let e_prev = edge.prev;
        let t_next = twin.next;
        let t_prev = twin.prev;
        let a = edge.incident_vertex;
        let b = twin.incident_vertex;
        let c = self.he(e_prev).incident_vertex;
        let d = self.he(t_prev).incident_vertex;
        if c == d || self.find_edge(c, d).is_some() || self.find_edge(d, c).is_some() {
            return Err(MeshError::DuplicateEdge { v0: c, v1: d });
        }

        let d_data = self.he(t_prev).user_data;
        let c_data = self.he(e_prev).user_data;
        *self.he_mut(id) = HalfEdge {
            incident_vertex: d,
            user_data: d_data,
            twin: twin_id,
            next: e_prev,
            prev: t_next,
            open: false,
        };
        *self.he_mut(twin_id) = HalfEdge {
            incident_vertex: c,
            user_data: c_data,
            twin: id,
            next: t_prev,
            prev: e_next,
            open: false,
        };
        // face (d, c, a): id -> e_prev -> t_next
        self.he_mut(e_prev).prev = id;
        self.he_mut(e_prev).next = t_next;
        self.he_mut(t_next).prev = e_prev;
        self.he_mut(t_next).next = id;
        // face (c, d, b): twin -> t_prev -> e_next
        self.he_mut(t_prev).prev = twin_id;
        self.he_mut(t_prev).next = e_next;
        self.he_mut(e_next).prev = t_prev;
        self.he_mut(e_next).next = twin_id;

        self.edge_map.remove(&(a, b));
        self.edge_map.remove(&(b, a));
        self.edge_map.insert((d, c), id);
        self.edge_map.insert((c, d), twin_id);
        Ok(id)
    }

    /// Remove an edge pair, merging the two faces on either side.
    ///
    /// Both sides must be distinct closed faces. Returns a half-edge of the
    /// merged face.
    pub fn delete_edge(&mut self, id: EdgeId) -> Result<EdgeId, MeshError> {
        let edge = *self.get(id)?;
        let twin_id = edge.twin;
        let twin = *self.get(twin_id)?;
        if edge.open || twin.open || self.face_walk(id).any(|e| e == twin_id) {
            return Err(MeshError::InvalidTopology(
                "delete_edge needs two distinct closed faces".to_string(),
            ));
        }

        self.he_mut(edge.prev).next = twin.next;
        self.he_mut(twin.next).prev = edge.prev;
        self.he_mut(twin.prev).next = edge.next;
        self.he_mut(edge.next).prev = twin.prev;

        self.edge_map
            .remove(&(edge.incident_vertex, twin.incident_vertex));
        self.edge_map
            .remove(&(twin.incident_vertex, edge.incident_vertex));
        self.release(id);
        self.release(twin_id);
        Ok(edge.next)
    }
}
