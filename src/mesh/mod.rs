//! `MeshEffect`: a half-edge polyhedron carrying vertex positions and a
//! separate per-corner attribute table.
//!
//! Every half-edge stores the index of its corner attribute in
//! [`HalfEdge::user_data`](crate::polyhedra::HalfEdge), so one topological
//! vertex may carry different normals, UVs or materials on different faces.

use crate::errors::MeshError;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerance};
use crate::polyhedra::{EdgeId, Polyhedra};
use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Rotation3, SymmetricEigen, Translation3, UnitQuaternion, Vector2, Vector3,
};
use std::sync::Arc;

pub mod collision;
pub mod interpolate;
pub mod mapping;
pub mod shapes;
pub mod streams;
pub mod triangulate;
pub mod weld;

pub use streams::{
    FaceList, IndexedFaceList, IndirectStreams, MaterialGeometry, MaterialGroup, StreamMut,
    VertexStream,
};

/// Per-corner vertex data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttribute {
    pub position: Point3<Real>,
    pub normal: Vector3<Real>,
    pub uv0: Vector2<Real>,
    pub uv1: Vector2<Real>,
    pub material: u32,
}

impl Default for VertexAttribute {
    fn default() -> Self {
        VertexAttribute::at(Point3::origin())
    }
}

impl VertexAttribute {
    pub const fn new(
        position: Point3<Real>,
        normal: Vector3<Real>,
        uv0: Vector2<Real>,
        uv1: Vector2<Real>,
        material: u32,
    ) -> Self {
        VertexAttribute {
            position,
            normal,
            uv0,
            uv1,
            material,
        }
    }

    /// Attribute with only a position; normal and UVs are zero, material 0.
    pub fn at(position: Point3<Real>) -> Self {
        VertexAttribute::new(position, Vector3::zeros(), Vector2::zeros(), Vector2::zeros(), 0)
    }

    pub fn with_material(mut self, material: u32) -> Self {
        self.material = material;
        self
    }

    /// Linear blend between `self` (`t = 0`) and `other` (`t = 1`).
    ///
    /// The normal is renormalized unless it degenerates; the material is
    /// taken from `self`.
    pub fn lerp(&self, other: &VertexAttribute, t: Real) -> VertexAttribute {
        let normal = self.normal + (other.normal - self.normal) * t;
        VertexAttribute {
            position: self.position + (other.position - self.position) * t,
            normal: normal.try_normalize(Real::EPSILON).unwrap_or(normal),
            uv0: self.uv0 + (other.uv0 - self.uv0) * t,
            uv1: self.uv1 + (other.uv1 - self.uv1) * t,
            material: self.material,
        }
    }

    /// All channels equal within `tol`, material equal.
    pub fn close_to(&self, other: &VertexAttribute, tol: Real) -> bool {
        self.material == other.material
            && (self.position - other.position).amax() <= tol
            && (self.normal - other.normal).amax() <= tol
            && (self.uv0 - other.uv0).amax() <= tol
            && (self.uv1 - other.uv1).amax() <= tol
    }
}

/// Snapshot handle for meshes shared between owners (render mesh, collision
/// cache). Mutation goes through `Arc::make_mut`, which clones when shared.
pub type SharedMeshEffect = Arc<MeshEffect>;

/// Face data independent of half-edge ids: point and attribute indices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FaceRecord {
    pub points: Vec<usize>,
    pub attributes: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
struct PolygonBatch {
    corners: Vec<VertexAttribute>,
    face_sizes: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MeshEffect {
    pub(crate) polyhedra: Polyhedra,
    pub(crate) points: Vec<Point3<Real>>,
    pub(crate) attributes: Vec<VertexAttribute>,
    batch: Option<PolygonBatch>,
}

impl MeshEffect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of polygons, welding with the global tolerance.
    pub fn from_polygons(polygons: &[Vec<VertexAttribute>]) -> Result<Self, MeshError> {
        let mut mesh = MeshEffect::new();
        mesh.begin_polygon();
        for polygon in polygons {
            mesh.add_polygon(polygon)?;
        }
        mesh.end_polygon(tolerance())?;
        Ok(mesh)
    }

    pub fn into_shared(self) -> SharedMeshEffect {
        Arc::new(self)
    }

    /// Discard the current content and start collecting polygons.
    pub fn begin_polygon(&mut self) {
        self.polyhedra = Polyhedra::new();
        self.points.clear();
        self.attributes.clear();
        self.batch = Some(PolygonBatch::default());
    }

    /// Queue one polygon, corners in counter-clockwise order.
    pub fn add_polygon(&mut self, corners: &[VertexAttribute]) -> Result<(), MeshError> {
        let Some(batch) = self.batch.as_mut() else {
            return Err(MeshError::InvalidTopology(
                "add_polygon called outside begin_polygon/end_polygon".to_string(),
            ));
        };
        if corners.len() < 3 {
            return Err(MeshError::DegenerateFace {
                face: batch.face_sizes.len(),
                count: corners.len(),
            });
        }
        batch.corners.extend_from_slice(corners);
        batch.face_sizes.push(corners.len());
        Ok(())
    }

    /// Weld the queued corners and build the half-edge faces.
    ///
    /// Positions closer than `tol` become one vertex and identical corner
    /// attributes are shared. Faces that collapse below 3 vertices after
    /// welding are skipped; faces that would reuse a directed edge get
    /// private copies of their vertices so the surface stays 2-manifold.
    pub fn end_polygon(&mut self, tol: Real) -> Result<(), MeshError> {
        let Some(batch) = self.batch.take() else {
            return Err(MeshError::InvalidTopology(
                "end_polygon called without begin_polygon".to_string(),
            ));
        };

        let positions: Vec<Point3<Real>> = batch.corners.iter().map(|c| c.position).collect();
        let (points, point_remap) = weld::weld_points(&positions, tol)?;
        let mut corners = batch.corners;
        for (corner, &point) in corners.iter_mut().zip(&point_remap) {
            corner.position = points[point];
        }
        let (attributes, attribute_remap) = weld::weld_attributes(&corners, tol)?;

        self.points = points;
        self.attributes = attributes;
        self.polyhedra = Polyhedra::new();
        self.polyhedra.begin_face();

        let mut start = 0;
        let mut skipped = 0usize;
        let mut detached = 0usize;
        for (face, &size) in batch.face_sizes.iter().enumerate() {
            let range = start..start + size;
            start += size;

            let mut record = FaceRecord {
                points: Vec::with_capacity(size),
                attributes: Vec::with_capacity(size),
            };
            for corner in range {
                let point = point_remap[corner];
                if record.points.last() == Some(&point) {
                    continue;
                }
                record.points.push(point);
                record.attributes.push(attribute_remap[corner]);
            }
            while record.points.len() > 1 && record.points.first() == record.points.last() {
                record.points.pop();
                record.attributes.pop();
            }
            if record.points.len() < 3 {
                skipped += 1;
                continue;
            }

            match self.polyhedra.add_face(&record.points, &record.attributes) {
                Ok(_) => {},
                Err(MeshError::DuplicateEdge { .. }) | Err(MeshError::NonManifoldEdge { .. }) => {
                    let copies: Vec<usize> = record
                        .points
                        .iter()
                        .map(|&p| {
                            self.points.push(self.points[p]);
                            self.points.len() - 1
                        })
                        .collect();
                    self.polyhedra.add_face(&copies, &record.attributes)?;
                    detached += 1;
                },
                Err(MeshError::DegenerateFace { .. }) => {
                    log::warn!("face {} repeats a vertex after welding, skipped", face);
                    skipped += 1;
                },
                Err(err) => return Err(err),
            }
        }
        self.polyhedra.end_face()?;

        if skipped > 0 || detached > 0 {
            log::warn!(
                "end_polygon: {} faces skipped as degenerate, {} detached to stay manifold",
                skipped,
                detached
            );
        }
        log::debug!(
            "end_polygon: {} faces, {} points, {} attributes",
            self.face_count(),
            self.points.len(),
            self.attributes.len()
        );
        Ok(())
    }

    /// Replace the topology with `faces`, keeping the point and attribute tables.
    pub(crate) fn rebuild(&mut self, faces: &[FaceRecord]) -> Result<(), MeshError> {
        let mut polyhedra = Polyhedra::new();
        polyhedra.begin_face();
        for face in faces {
            polyhedra.add_face(&face.points, &face.attributes)?;
        }
        polyhedra.end_face()?;
        self.polyhedra = polyhedra;
        Ok(())
    }

    pub(crate) fn face_records(&self) -> Vec<FaceRecord> {
        self.face_ids()
            .into_iter()
            .map(|face| FaceRecord {
                points: self.polyhedra.face_vertices(face),
                attributes: self.polyhedra.face_user_data(face),
            })
            .collect()
    }

    pub fn polyhedra(&self) -> &Polyhedra {
        &self.polyhedra
    }

    pub fn points(&self) -> &[Point3<Real>] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// One half-edge per closed face, in a deterministic order.
    pub fn face_ids(&self) -> Vec<EdgeId> {
        self.polyhedra.faces()
    }

    pub fn face_count(&self) -> usize {
        self.polyhedra.faces().len()
    }

    pub fn is_empty(&self) -> bool {
        self.face_count() == 0
    }

    /// One half-edge per undirected edge.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.polyhedra
            .edge_ids()
            .filter(|&e| {
                let edge = self.polyhedra.he(e);
                !edge.open && (self.polyhedra.is_open(edge.twin) || e < edge.twin)
            })
            .collect()
    }

    /// Point indices at both ends of an edge.
    pub fn edge_points(&self, edge: EdgeId) -> Result<(usize, usize), MeshError> {
        let origin = self.polyhedra.get(edge)?.incident_vertex;
        Ok((origin, self.polyhedra.target(edge)?))
    }

    pub fn is_face_open(&self, face: EdgeId) -> bool {
        self.polyhedra.is_open(face)
    }

    pub fn face_point_indices(&self, face: EdgeId) -> Vec<usize> {
        self.polyhedra.face_vertices(face)
    }

    pub fn face_attribute_indices(&self, face: EdgeId) -> Vec<usize> {
        self.polyhedra.face_user_data(face)
    }

    pub fn face_points(&self, face: EdgeId) -> Vec<Point3<Real>> {
        self.polyhedra
            .face_walk(face)
            .map(|e| self.points[self.polyhedra.he(e).incident_vertex])
            .collect()
    }

    pub fn face_material(&self, face: EdgeId) -> Result<u32, MeshError> {
        let data = self.polyhedra.get(face)?.user_data;
        self.attributes
            .get(data)
            .map(|a| a.material)
            .ok_or(MeshError::IndexOutOfRange {
                stream: "attribute",
                index: data,
                len: self.attributes.len(),
            })
    }

    /// Unnormalized face normal (Newell), twice the face area in length.
    pub fn face_normal(&self, face: EdgeId) -> Vector3<Real> {
        newell_normal(&self.face_points(face))
    }

    /// Axis aligned bounds of all referenced points.
    pub fn calculate_aabb(&self) -> Result<Aabb, MeshError> {
        let mut used = self
            .polyhedra
            .edge_ids()
            .map(|e| self.points[self.polyhedra.he(e).incident_vertex]);
        let first = used.next().ok_or(MeshError::EmptyMesh)?;
        let (mins, maxs) = used.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p)));
        Ok(Aabb::new(mins, maxs))
    }

    /// Oriented bounding box of all referenced points.
    ///
    /// The box axes are the principal axes of the points' covariance. Returns
    /// the box frame (origin at the box center) and the half extents along
    /// its local x, y and z.
    pub fn calculate_oobb(&self) -> Result<(Isometry3<Real>, Vector3<Real>), MeshError> {
        let mut used = vec![false; self.points.len()];
        for e in self.polyhedra.edge_ids() {
            used[self.polyhedra.he(e).incident_vertex] = true;
        }
        let points: Vec<Point3<Real>> = self
            .points
            .iter()
            .zip(&used)
            .filter_map(|(p, &keep)| keep.then_some(*p))
            .collect();
        if points.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        let count = points.len() as Real;
        let mean = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / count;
        let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
            let d = p.coords - mean;
            acc + d * d.transpose()
        }) / count;

        let mut axes = SymmetricEigen::new(covariance).eigenvectors;
        if axes.determinant() < 0.0 {
            let flipped = -axes.column(2);
            axes.set_column(2, &flipped);
        }
        let rotation = Rotation3::from_matrix_unchecked(axes);

        let mut lo = Vector3::repeat(Real::MAX);
        let mut hi = Vector3::repeat(Real::MIN);
        for p in &points {
            let local = rotation.inverse_transform_vector(&(p.coords - mean));
            lo = lo.inf(&local);
            hi = hi.sup(&local);
        }
        let center = mean + rotation * ((lo + hi) * 0.5);
        let frame = Isometry3::from_parts(
            Translation3::from(center),
            UnitQuaternion::from_rotation_matrix(&rotation),
        );
        Ok((frame, (hi - lo) * 0.5))
    }

    /// Signed enclosed volume, positive for outward facing closed meshes.
    pub fn calculate_volume(&self) -> Real {
        self.face_ids()
            .into_iter()
            .map(|face| {
                let pts = self.face_points(face);
                let p0 = pts[0].coords;
                pts.windows(2)
                    .skip(1)
                    .map(|w| p0.dot(&w[0].coords.cross(&w[1].coords)))
                    .sum::<Real>()
            })
            .sum::<Real>()
            / 6.0
    }

    pub fn has_open_edges(&self) -> bool {
        self.polyhedra.has_open_edges()
    }

    /// Apply an affine transform to points, corner positions and normals.
    /// A mirroring transform also reverses every face to keep them outward.
    pub fn transform_mesh(&mut self, matrix: &Matrix4<Real>) -> Result<(), MeshError> {
        let linear: Matrix3<Real> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(linear);

        for p in &mut self.points {
            *p = matrix.transform_point(p);
        }
        for a in &mut self.attributes {
            a.position = matrix.transform_point(&a.position);
            let n = normal_matrix * a.normal;
            a.normal = n.try_normalize(Real::EPSILON).unwrap_or(n);
        }

        if linear.determinant() < 0.0 {
            self.reverse_windings()?;
        }
        Ok(())
    }

    /// Reverse the winding of every face and negate the normals.
    pub fn flip_faces(&mut self) -> Result<(), MeshError> {
        for a in &mut self.attributes {
            a.normal = -a.normal;
        }
        self.reverse_windings()
    }

    fn reverse_windings(&mut self) -> Result<(), MeshError> {
        let faces: Vec<FaceRecord> = self
            .face_records()
            .into_iter()
            .map(|mut face| {
                face.points.reverse();
                face.attributes.reverse();
                face
            })
            .collect();
        self.rebuild(&faces)
    }

    /// Drop points and attributes no half-edge refers to, compacting both tables.
    pub fn remove_unused_vertices(&mut self) {
        let mut point_used = vec![false; self.points.len()];
        let mut attribute_used = vec![false; self.attributes.len()];
        for e in self.polyhedra.edge_ids() {
            let edge = self.polyhedra.he(e);
            point_used[edge.incident_vertex] = true;
            if !edge.open && edge.user_data < attribute_used.len() {
                attribute_used[edge.user_data] = true;
            }
        }

        let point_remap = compact(&mut self.points, &point_used);
        let attribute_remap = compact(&mut self.attributes, &attribute_used);
        self.polyhedra.remap_vertices(&point_remap);
        self.polyhedra.remap_user_data(&attribute_remap);
    }

    /// Merge equal corner attributes, then drop everything unreferenced.
    pub fn pack_vertex_arrays(&mut self) -> Result<(), MeshError> {
        let (attributes, remap) = weld::weld_attributes(&self.attributes, 0.0)?;
        self.attributes = attributes;
        self.polyhedra.remap_user_data(&remap);
        self.remove_unused_vertices();
        Ok(())
    }

    pub fn sanity(&self) -> Result<(), MeshError> {
        self.polyhedra.sanity()?;
        for e in self.polyhedra.edge_ids() {
            let edge = self.polyhedra.he(e);
            if edge.incident_vertex >= self.points.len() {
                return Err(MeshError::IndexOutOfRange {
                    stream: "point",
                    index: edge.incident_vertex,
                    len: self.points.len(),
                });
            }
            if !edge.open && edge.user_data >= self.attributes.len() {
                return Err(MeshError::IndexOutOfRange {
                    stream: "attribute",
                    index: edge.user_data,
                    len: self.attributes.len(),
                });
            }
        }
        Ok(())
    }
}

/// Keep the flagged items in order; returns old index -> new index.
fn compact<T: Copy>(items: &mut Vec<T>, keep: &[bool]) -> Vec<usize> {
    let mut remap = vec![usize::MAX; items.len()];
    let mut kept = 0;
    for i in 0..items.len() {
        if keep[i] {
            items[kept] = items[i];
            remap[i] = kept;
            kept += 1;
        }
    }
    items.truncate(kept);
    remap
}

/// Newell normal of a vertex loop; its length is twice the enclosed area.
pub fn newell_normal(points: &[Point3<Real>]) -> Vector3<Real> {
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}
