//! Boolean operations between meshes through solid partition trees.
//!
//! Both operands are triangulated copies. Each operand's faces are clipped
//! against the other's [`SolidTree`], every fragment is classified as
//! outside, inside or on the shared boundary, and the wanted fragments are
//! rebuilt into a new [`MeshEffect`]. Attributes at new corners come from
//! [`MeshEffect::interpolate_vertex`] on the source face, and T-junctions
//! along the seams are welded with [`MeshEffect::weld_t_joints`].

use crate::errors::MeshError;
use crate::float_types::{Real, TRIANGLE_MIN_AREA, from_big, to_big, tolerance};
use crate::mesh::{MeshEffect, VertexAttribute, newell_normal};
use crate::polyhedra::EdgeId;
use crate::traits::CsgOps;
use nalgebra::{Matrix4, Point3, Vector3};

pub mod plane;
pub mod solid_tree;

pub use plane::{PolygonSide, Side, SplitPlane};
pub use solid_tree::{Classification, ClassifiedFragment, SolidTree};

/// What a tree does with a face that straddles a node plane while it is
/// being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StraddleMode {
    /// Clip the face at the plane and insert both parts.
    Split,
    /// Never split: add a `back` child if that slot is empty, otherwise drop
    /// the face. Kept for comparison with older results; booleans on
    /// non-convex clip meshes come out wrong in this mode.
    Legacy,
}

impl Default for StraddleMode {
    fn default() -> Self {
        if cfg!(feature = "legacy-straddle") {
            StraddleMode::Legacy
        } else {
            StraddleMode::Split
        }
    }
}

/// Per-operation knobs of the boolean kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgOptions {
    pub straddle: StraddleMode,
    /// Points closer than this to a node plane count as on it.
    /// `0.0` decides every side exactly.
    pub plane_tolerance: f64,
    /// Soft limit on pending entries of any tree traversal.
    pub stack_limit: usize,
}

impl Default for CsgOptions {
    fn default() -> Self {
        CsgOptions {
            straddle: StraddleMode::default(),
            plane_tolerance: 1.0e-9,
            stack_limit: 1 << 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
}

/// A triangulated operand with its faces in kernel precision.
struct Operand {
    mesh: MeshEffect,
    faces: Vec<EdgeId>,
    loops: Vec<Vec<Point3<f64>>>,
    normals: Vec<Vector3<f64>>,
}

impl Operand {
    fn new(source: &MeshEffect, matrix: Option<&Matrix4<Real>>) -> Result<Self, MeshError> {
        let mut mesh = source.clone();
        if let Some(matrix) = matrix {
            mesh.transform_mesh(matrix)?;
        }
        mesh.triangulate()?;
        let faces = mesh.face_ids();
        let loops: Vec<Vec<Point3<f64>>> = faces
            .iter()
            .map(|&f| mesh.face_points(f).iter().map(to_big).collect())
            .collect();
        let normals = loops.iter().map(|l| big_normal(l)).collect();
        Ok(Operand {
            mesh,
            faces,
            loops,
            normals,
        })
    }

    fn tree(&self, options: CsgOptions) -> Result<SolidTree, MeshError> {
        let mut tree = SolidTree::new(options);
        for points in &self.loops {
            tree.add_face(points)?;
        }
        Ok(tree)
    }

    /// Clip every face against `tree`.
    fn classify(&self, tree: &SolidTree) -> Result<Vec<Fragment>, MeshError> {
        let mut fragments = Vec::with_capacity(self.loops.len());
        for (face, (points, normal)) in self.loops.iter().zip(&self.normals).enumerate() {
            for (points, class) in tree.classify(points, normal)? {
                fragments.push(Fragment { face, points, class });
            }
        }
        Ok(fragments)
    }
}

struct Fragment {
    face: usize,
    points: Vec<Point3<f64>>,
    class: Classification,
}

fn big_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let p0 = points[0];
    points
        .windows(2)
        .skip(1)
        .fold(Vector3::zeros(), |acc, w| acc + (w[0] - p0).cross(&(w[1] - p0)))
}

/// Collects fragments and rebuilds them into a mesh.
#[derive(Default)]
struct Assembly {
    polygons: Vec<Vec<VertexAttribute>>,
    dropped: usize,
}

impl Assembly {
    fn take(
        &mut self,
        operand: &Operand,
        fragments: &[Fragment],
        classes: &[Classification],
        reversed: bool,
    ) -> Result<(), MeshError> {
        for fragment in fragments.iter().filter(|f| classes.contains(&f.class)) {
            let points: Vec<Point3<Real>> = fragment.points.iter().map(from_big).collect();
            if newell_normal(&points).norm() * 0.5 < TRIANGLE_MIN_AREA {
                self.dropped += 1;
                continue;
            }
            let face = operand.faces[fragment.face];
            let mut polygon = points
                .iter()
                .map(|p| operand.mesh.interpolate_vertex(p, face))
                .collect::<Result<Vec<_>, _>>()?;
            if reversed {
                polygon.reverse();
                for corner in &mut polygon {
                    corner.normal = -corner.normal;
                }
            }
            self.polygons.push(polygon);
        }
        Ok(())
    }

    fn finish(self) -> Result<MeshEffect, MeshError> {
        if self.dropped > 0 {
            log::debug!("assembly: {} sliver fragments dropped", self.dropped);
        }
        let mut mesh = MeshEffect::new();
        mesh.begin_polygon();
        for polygon in &self.polygons {
            mesh.add_polygon(polygon)?;
        }
        mesh.end_polygon(tolerance())?;
        // fragments of the two operands meet with different vertex sets
        mesh.weld_t_joints(tolerance())?;
        Ok(mesh)
    }
}

impl MeshEffect {
    /// Solid tree of this mesh's faces.
    pub fn create_solid_tree(&self, options: CsgOptions) -> Result<SolidTree, MeshError> {
        SolidTree::build(self, options)
    }

    /// Boolean combination with `other` placed by `matrix`.
    pub fn boolean(
        &self,
        other: &MeshEffect,
        matrix: &Matrix4<Real>,
        op: BooleanOp,
        options: CsgOptions,
    ) -> Result<MeshEffect, MeshError> {
        let a = Operand::new(self, None)?;
        let b = Operand::new(other, Some(matrix))?;
        let a_fragments = a.classify(&b.tree(options)?)?;
        let b_fragments = b.classify(&a.tree(options)?)?;
        log::debug!(
            "{:?}: {} + {} fragments from {} + {} triangles",
            op,
            a_fragments.len(),
            b_fragments.len(),
            a.faces.len(),
            b.faces.len()
        );

        use Classification::*;
        let mut assembly = Assembly::default();
        match op {
            BooleanOp::Union => {
                assembly.take(&a, &a_fragments, &[Outside, SharedSame], false)?;
                assembly.take(&b, &b_fragments, &[Outside], false)?;
            },
            BooleanOp::Intersection => {
                assembly.take(&a, &a_fragments, &[Inside, SharedSame], false)?;
                assembly.take(&b, &b_fragments, &[Inside], false)?;
            },
            BooleanOp::Difference => {
                assembly.take(&a, &a_fragments, &[Outside, SharedOpposite], false)?;
                assembly.take(&b, &b_fragments, &[Inside], true)?;
            },
        }
        assembly.finish()
    }

    /// Split this mesh by the solid of `clipper` (placed by `matrix`) into
    /// the part outside it and the part inside it. Neither part is capped.
    pub fn clip_mesh_with(
        &self,
        clipper: &MeshEffect,
        matrix: &Matrix4<Real>,
        options: CsgOptions,
    ) -> Result<(MeshEffect, MeshEffect), MeshError> {
        let b = Operand::new(clipper, Some(matrix))?;
        self.clip_mesh_with_tree(&b.tree(options)?)
    }

    /// Split this mesh by a prebuilt tree into `(top, bottom)`: the outside
    /// part plus boundary faces facing into the solid, and the inside part
    /// plus boundary faces facing along it.
    pub fn clip_mesh_with_tree(&self, tree: &SolidTree) -> Result<(MeshEffect, MeshEffect), MeshError> {
        use Classification::*;
        let a = Operand::new(self, None)?;
        let fragments = a.classify(tree)?;
        let mut top = Assembly::default();
        let mut bottom = Assembly::default();
        top.take(&a, &fragments, &[Outside, SharedOpposite], false)?;
        bottom.take(&a, &fragments, &[Inside, SharedSame], false)?;
        Ok((top.finish()?, bottom.finish()?))
    }

    /// Cut by the plane through `point` with normal `normal` into the part in
    /// front of the plane and the part behind it. Both parts are closed
    /// with a cap on the plane.
    pub fn plane_clip_mesh(
        &self,
        point: &Point3<Real>,
        normal: &Vector3<Real>,
    ) -> Result<(MeshEffect, MeshEffect), MeshError> {
        let n = normal
            .try_normalize(Real::EPSILON)
            .ok_or(MeshError::DegeneratePlane)?;
        let aabb = match self.calculate_aabb() {
            Ok(aabb) => aabb,
            Err(MeshError::EmptyMesh) => return Ok((MeshEffect::new(), MeshEffect::new())),
            Err(err) => return Err(err),
        };
        let center = nalgebra::center(&aabb.mins, &aabb.maxs);
        let reach = (aabb.maxs - aabb.mins).norm() + (center - point).norm() + 1.0;

        // any unit vector perpendicular to n, then v = n x u
        let helper = if n.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let u = helper.cross(&n).normalize();
        let v = n.cross(&u);
        let frame = Matrix4::new(
            u.x, v.x, n.x, point.x,
            u.y, v.y, n.y, point.y,
            u.z, v.z, n.z, point.z,
            0.0, 0.0, 0.0, 1.0,
        );
        // half space box: local z in [0, 2 * reach], bottom face on the plane
        let offset = Matrix4::new_translation(&Vector3::new(-reach, -reach, 0.0));
        let slab = MeshEffect::cube(2.0 * reach, 0)?;

        let options = CsgOptions::default();
        let placement = frame * offset;
        let top = self.boolean(&slab, &placement, BooleanOp::Intersection, options)?;
        let bottom = self.boolean(&slab, &placement, BooleanOp::Difference, options)?;
        Ok((top, bottom))
    }

    /// `true` when some part of this mesh, scaled by `scale` about its
    /// bounding box center, lies strictly inside the solid of `tree`.
    pub fn check_intersection(&self, tree: &SolidTree, scale: Real) -> Result<bool, MeshError> {
        if tree.is_empty() || self.is_empty() {
            return Ok(false);
        }
        let aabb = self.calculate_aabb()?;
        let center = to_big(&nalgebra::center(&aabb.mins, &aabb.maxs));
        let scale = f64::from(scale);

        for face in self.face_ids() {
            let points: Vec<Point3<f64>> = self
                .face_points(face)
                .iter()
                .map(|p| center + (to_big(p) - center) * scale)
                .collect();
            let normal = big_normal(&points);
            if tree
                .classify(&points, &normal)?
                .iter()
                .any(|(_, class)| *class == Classification::Inside)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `true` when either mesh has a part strictly inside the other.
    pub fn check_intersection_with(&self, other: &MeshEffect, matrix: &Matrix4<Real>) -> Result<bool, MeshError> {
        let options = CsgOptions::default();
        let a = Operand::new(self, None)?;
        let b = Operand::new(other, Some(matrix))?;
        let inside = |fragments: Vec<Fragment>| fragments.iter().any(|f| f.class == Classification::Inside);
        Ok(inside(a.classify(&b.tree(options)?)?) || inside(b.classify(&a.tree(options)?)?))
    }
}

impl CsgOps for MeshEffect {
    fn union(&self, other: &Self, matrix: &Matrix4<Real>) -> Result<Self, MeshError> {
        self.boolean(other, matrix, BooleanOp::Union, CsgOptions::default())
    }

    fn difference(&self, other: &Self, matrix: &Matrix4<Real>) -> Result<Self, MeshError> {
        self.boolean(other, matrix, BooleanOp::Difference, CsgOptions::default())
    }

    fn intersection(&self, other: &Self, matrix: &Matrix4<Real>) -> Result<Self, MeshError> {
        self.boolean(other, matrix, BooleanOp::Intersection, CsgOptions::default())
    }

    fn clip_mesh(&self, clipper: &Self, matrix: &Matrix4<Real>) -> Result<(Self, Self), MeshError> {
        self.clip_mesh_with(clipper, matrix, CsgOptions::default())
    }

    fn transform(&self, matrix: &Matrix4<Real>) -> Result<Self, MeshError> {
        let mut mesh = self.clone();
        mesh.transform_mesh(matrix)?;
        Ok(mesh)
    }
}
