//! Mesh construction, topology and boolean errors

use std::fmt::Display;

/// All the possible failures reported by the mesh engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// (DegenerateFace) A face references fewer than 3 distinct vertices
    DegenerateFace { face: usize, count: usize },
    /// (IndexOutOfRange) An input stream index points outside its buffer
    IndexOutOfRange { stream: &'static str, index: usize, len: usize },
    /// (DuplicateEdge) The directed edge v0 -> v1 is already used by another face
    DuplicateEdge { v0: usize, v1: usize },
    /// (NonManifoldEdge) More than two faces meet at the edge v0 - v1
    NonManifoldEdge { v0: usize, v1: usize },
    /// (NotInSameFace) Two vertices or edges do not belong to one face
    NotInSameFace { v0: usize, v1: usize },
    /// (EdgeNotFound) An edge handle is stale or no edge joins the vertices
    EdgeNotFound,
    /// (InvalidTopology) A structural invariant does not hold
    InvalidTopology(String),
    /// (StackLimit) An explicit traversal stack grew past its soft limit
    StackLimit { limit: usize },
    /// (InvalidRadixPasses) Radix sort needs between 1 and 4 byte passes
    InvalidRadixPasses(usize),
    /// (BufferTooSmall) A caller-owned output buffer cannot hold the stream
    BufferTooSmall { stream: &'static str, needed: usize, len: usize },
    /// (EmptyMesh) The operation needs at least one face
    EmptyMesh,
    /// (DegeneratePlane) A clip plane normal has zero length
    DegeneratePlane,
    /// (ConvexHull) The point cloud does not span a volume
    ConvexHull(String),
    /// (CollisionShape) The collision layer rejected the geometry
    CollisionShape(String),
    /// Indicates an inconsistency while building a triangle mesh
    TriMesh(#[from] crate::float_types::parry3d::shape::TriMeshBuilderError),
}

impl Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::DegenerateFace { face, count } => write!(f, "(DegenerateFace) face {} has only {} distinct vertices", face, count),
            MeshError::IndexOutOfRange { stream, index, len } => write!(f, "(IndexOutOfRange) {} index {} is out of range (len = {})", stream, index, len),
            MeshError::DuplicateEdge { v0, v1 } => write!(f, "(DuplicateEdge) directed edge {} -> {} already exists", v0, v1),
            MeshError::NonManifoldEdge { v0, v1 } => write!(f, "(NonManifoldEdge) edge {} - {} is shared by more than two faces", v0, v1),
            MeshError::NotInSameFace { v0, v1 } => write!(f, "(NotInSameFace) vertices {} and {} do not share a face", v0, v1),
            MeshError::EdgeNotFound => write!(f, "(EdgeNotFound) edge handle is not alive"),
            MeshError::InvalidTopology(msg) => write!(f, "(InvalidTopology) {}", msg),
            MeshError::StackLimit { limit } => write!(f, "(StackLimit) traversal stack exceeded {} entries", limit),
            MeshError::InvalidRadixPasses(passes) => write!(f, "(InvalidRadixPasses) {} passes requested, expected 1..=4", passes),
            MeshError::BufferTooSmall { stream, needed, len } => write!(f, "(BufferTooSmall) {} buffer needs {} values but holds {}", stream, needed, len),
            MeshError::EmptyMesh => write!(f, "(EmptyMesh) the mesh has no faces"),
            MeshError::DegeneratePlane => write!(f, "(DegeneratePlane) plane normal has zero length"),
            MeshError::ConvexHull(msg) => write!(f, "(ConvexHull) {}", msg),
            MeshError::CollisionShape(msg) => write!(f, "(CollisionShape) {}", msg),
            MeshError::TriMesh(tri_mesh_builder_error) => tri_mesh_builder_error.fmt(f),
        }
    }
}
