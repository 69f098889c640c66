//! Half-edge polyhedron: the topological substrate of a mesh.
//!
//! Half-edges live in an index arena and refer to each other through
//! [`EdgeId`] handles. Faces are not stored; a face is the cycle reached by
//! following `next`. Boundary loops are made of *open* half-edges, created by
//! [`Polyhedra::end_face`] as twins for every edge that has no neighbour.
//!
//! Faces are added in batches:
//! ```
//! # use mesh_effect::polyhedra::Polyhedra;
//! let mut poly = Polyhedra::new();
//! poly.begin_face();
//! poly.add_face(&[0, 1, 2], &[0, 1, 2]).unwrap();
//! poly.add_face(&[0, 2, 3], &[3, 4, 5]).unwrap();
//! poly.end_face().unwrap();
//! assert_eq!(poly.faces().len(), 2);
//! assert!(poly.sanity().is_ok());
//! ```

use crate::errors::MeshError;
use hashbrown::HashMap;

mod edit;
mod sanity;
mod walk;

pub use walk::{FaceWalk, VertexWalk};

/// Handle to a half-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Sentinel for a missing link (only seen between `add_face` and `end_face`).
    pub const NONE: EdgeId = EdgeId(u32::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// One direction of a mesh edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    /// Vertex this half-edge starts from.
    pub incident_vertex: usize,
    /// Per-corner payload; the mesh stores its attribute index here.
    pub user_data: usize,
    pub twin: EdgeId,
    /// Next half-edge around the same face (counter-clockwise).
    pub next: EdgeId,
    pub prev: EdgeId,
    /// Part of a boundary (hole) loop rather than a real polygon.
    pub open: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Polyhedra {
    edges: Vec<Option<HalfEdge>>,
    free: Vec<EdgeId>,
    edge_map: HashMap<(usize, usize), EdgeId>,
    building: bool,
    /// Faces accepted since the last `begin_face`.
    batch_faces: usize,
}

impl Polyhedra {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live half-edges, open ones included.
    pub fn edge_count(&self) -> usize {
        self.edges.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }

    /// Live half-edge handles in arena order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| EdgeId(i as u32))
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&HalfEdge> {
        self.edges.get(id.index()).and_then(|e| e.as_ref())
    }

    /// Like [`Polyhedra::edge`] but reports stale handles as an error.
    #[inline]
    pub fn get(&self, id: EdgeId) -> Result<&HalfEdge, MeshError> {
        self.edge(id).ok_or(MeshError::EdgeNotFound)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: EdgeId) -> Result<&mut HalfEdge, MeshError> {
        self.edges
            .get_mut(id.index())
            .and_then(|e| e.as_mut())
            .ok_or(MeshError::EdgeNotFound)
    }

    // Accessors below assume a live handle; they are only used on ids read
    // out of the structure itself.
    #[inline]
    pub(crate) fn he(&self, id: EdgeId) -> &HalfEdge {
        match &self.edges[id.index()] {
            Some(e) => e,
            None => panic!("dead half-edge {:?}", id),
        }
    }

    #[inline]
    fn he_mut(&mut self, id: EdgeId) -> &mut HalfEdge {
        match &mut self.edges[id.index()] {
            Some(e) => e,
            None => panic!("dead half-edge {:?}", id),
        }
    }

    /// Vertex the half-edge points to.
    pub fn target(&self, id: EdgeId) -> Result<usize, MeshError> {
        let e = self.get(id)?;
        Ok(self.get(e.next)?.incident_vertex)
    }

    /// Half-edge running from `v0` to `v1`, if any.
    pub fn find_edge(&self, v0: usize, v1: usize) -> Option<EdgeId> {
        self.edge_map.get(&(v0, v1)).copied()
    }

    pub fn set_user_data(&mut self, id: EdgeId, user_data: usize) -> Result<(), MeshError> {
        self.get_mut(id)?.user_data = user_data;
        Ok(())
    }

    fn alloc(&mut self, edge: HalfEdge) -> EdgeId {
        match self.free.pop() {
            Some(id) => {
                self.edges[id.index()] = Some(edge);
                id
            },
            None => {
                self.edges.push(Some(edge));
                EdgeId((self.edges.len() - 1) as u32)
            },
        }
    }

    fn release(&mut self, id: EdgeId) {
        if self.edges[id.index()].take().is_some() {
            self.free.push(id);
        }
    }

    /// Start a batch of [`Polyhedra::add_face`] calls.
    ///
    /// Existing boundary loops are dissolved so new faces can attach to
    /// the free sides of boundary edges; [`Polyhedra::end_face`] rebuilds them.
    pub fn begin_face(&mut self) {
        if self.building {
            return;
        }
        let open: Vec<EdgeId> = self.edge_ids().filter(|&id| self.he(id).open).collect();
        for id in open {
            let edge = *self.he(id);
            // the twin is a real edge running the other way
            let target = self.he(edge.twin).incident_vertex;
            self.edge_map.remove(&(edge.incident_vertex, target));
            if let Some(twin) = self.edges.get_mut(edge.twin.index()).and_then(|e| e.as_mut()) {
                twin.twin = EdgeId::NONE;
            }
            self.release(id);
        }
        self.building = true;
        self.batch_faces = 0;
    }

    /// Add one face given its vertex loop and matching per-corner user data.
    ///
    /// Returns the half-edge leaving `vertices[0]`. Nothing is modified on error.
    ///
    /// ## Errors
    /// - [`MeshError::DegenerateFace`] for fewer than 3 vertices or a repeated vertex;
    ///   `face` is the ordinal the face would have had in the current batch
    /// - [`MeshError::DuplicateEdge`] if a directed edge is already used
    /// - [`MeshError::NonManifoldEdge`] if an edge already has two faces
    pub fn add_face(&mut self, vertices: &[usize], user_data: &[usize]) -> Result<EdgeId, MeshError> {
        if !self.building {
            self.begin_face();
        }

        let count = vertices.len();
        let mut distinct = vertices.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if count < 3 || distinct.len() != count {
            return Err(MeshError::DegenerateFace {
                face: self.batch_faces,
                count: distinct.len(),
            });
        }
        if user_data.len() != count {
            return Err(MeshError::InvalidTopology(format!(
                "face has {} vertices but {} user data entries",
                count,
                user_data.len()
            )));
        }

        for i in 0..count {
            let v0 = vertices[i];
            let v1 = vertices[(i + 1) % count];
            if self.edge_map.contains_key(&(v0, v1)) {
                return Err(MeshError::DuplicateEdge { v0, v1 });
            }
            if let Some(&reverse) = self.edge_map.get(&(v1, v0)) {
                if !self.he(reverse).twin.is_none() {
                    return Err(MeshError::NonManifoldEdge { v0, v1 });
                }
            }
        }

        let ids: Vec<EdgeId> = vertices
            .iter()
            .zip(user_data)
            .map(|(&v, &data)| {
                self.alloc(HalfEdge {
                    incident_vertex: v,
                    user_data: data,
                    twin: EdgeId::NONE,
                    next: EdgeId::NONE,
                    prev: EdgeId::NONE,
                    open: false,
                })
            })
            .collect();

        for i in 0..count {
            let id = ids[i];
            let next = ids[(i + 1) % count];
            let prev = ids[(i + count - 1) % count];
            let v0 = vertices[i];
            let v1 = vertices[(i + 1) % count];

            let reverse = self.edge_map.get(&(v1, v0)).copied();
            {
                let edge = self.he_mut(id);
                edge.next = next;
                edge.prev = prev;
                if let Some(reverse) = reverse {
                    edge.twin = reverse;
                }
            }
            if let Some(reverse) = reverse {
                self.he_mut(reverse).twin = id;
            }
            self.edge_map.insert((v0, v1), id);
        }

        self.batch_faces += 1;
        Ok(ids[0])
    }

    /// Close the current batch: give every unpaired half-edge an open twin and
    /// chain the open half-edges into boundary loops.
    pub fn end_face(&mut self) -> Result<(), MeshError> {
        let unpaired: Vec<EdgeId> = self
            .edge_ids()
            .filter(|&id| self.he(id).twin.is_none())
            .collect();

        let mut open_edges = Vec::with_capacity(unpaired.len());
        for id in unpaired {
            let edge = *self.he(id);
            let next = *self.he(edge.next);
            let open = self.alloc(HalfEdge {
                incident_vertex: next.incident_vertex,
                user_data: next.user_data,
                twin: id,
                next: EdgeId::NONE,
                prev: EdgeId::NONE,
                open: true,
            });
            self.he_mut(id).twin = open;
            self.edge_map
                .insert((next.incident_vertex, edge.incident_vertex), open);
            open_edges.push(open);
        }

        // the open edge b->a continues with the open edge leaving a, found by
        // rotating around a through the interior faces
        let limit = self.edge_count();
        for &open in &open_edges {
            let mut h = self.he(open).twin;
            let mut found = None;
            for _ in 0..limit {
                let candidate = self.he(self.he(h).prev).twin;
                if self.he(candidate).open {
                    found = Some(candidate);
                    break;
                }
                h = candidate;
            }
            let Some(next) = found else {
                return Err(MeshError::InvalidTopology(
                    "boundary loop does not close around a vertex".to_string(),
                ));
            };
            self.he_mut(open).next = next;
            self.he_mut(next).prev = open;
        }

        self.building = false;
        Ok(())
    }

    /// Apply a vertex renumbering to every half-edge.
    pub(crate) fn remap_vertices(&mut self, remap: &[usize]) {
        for edge in self.edges.iter_mut().flatten() {
            edge.incident_vertex = remap[edge.incident_vertex];
        }
        self.rebuild_edge_map();
    }

    /// Apply a user-data renumbering to every half-edge.
    pub(crate) fn remap_user_data(&mut self, remap: &[usize]) {
        for edge in self.edges.iter_mut().flatten() {
            if edge.user_data < remap.len() {
                edge.user_data = remap[edge.user_data];
            }
        }
    }

    fn rebuild_edge_map(&mut self) {
        let pairs: Vec<((usize, usize), EdgeId)> = self
            .edge_ids()
            .map(|id| {
                let edge = self.he(id);
                ((edge.incident_vertex, self.he(edge.next).incident_vertex), id)
            })
            .collect();
        self.edge_map = pairs.into_iter().collect();
    }

    /// One representative half-edge per closed (non-open) face, lowest id first.
    pub fn faces(&self) -> Vec<EdgeId> {
        self.collect_loops(false)
    }

    /// One representative half-edge per boundary loop.
    pub fn open_faces(&self) -> Vec<EdgeId> {
        self.collect_loops(true)
    }

    fn collect_loops(&self, open: bool) -> Vec<EdgeId> {
        let mut visited = vec![false; self.edges.len()];
        let mut result = Vec::new();
        for id in self.edge_ids() {
            if visited[id.index()] || self.he(id).open != open {
                continue;
            }
            for e in self.face_walk(id) {
                visited[e.index()] = true;
            }
            result.push(id);
        }
        result
    }

    /// Vertex indices around the face of `id`, starting at its origin.
    pub fn face_vertices(&self, id: EdgeId) -> Vec<usize> {
        self.face_walk(id)
            .map(|e| self.he(e).incident_vertex)
            .collect()
    }

    /// Corner user data around the face of `id`.
    pub fn face_user_data(&self, id: EdgeId) -> Vec<usize> {
        self.face_walk(id).map(|e| self.he(e).user_data).collect()
    }

    pub fn is_open(&self, id: EdgeId) -> bool {
        self.edge(id).is_some_and(|e| e.open)
    }

    pub fn has_open_edges(&self) -> bool {
        self.edges.iter().flatten().any(|e| e.open || e.twin.is_none())
    }
}
