//! Solid-leaf binary partition tree built from the faces of one mesh.
//!
//! Every node holds the plane of one face. An empty `front` slot is outside
//! the solid, an empty `back` slot is inside. Faces are inserted one at a
//! time: a face descends through the existing planes and becomes a new node
//! wherever it reaches an empty slot.

use super::plane::{PolygonSide, SplitPlane};
use super::{CsgOptions, StraddleMode};
use crate::errors::MeshError;
use crate::float_types::to_big;
use crate::mesh::MeshEffect;
use nalgebra::{Point3, Vector3};

/// Where a polygon fragment ends up relative to a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Outside,
    Inside,
    /// On the boundary, facing the same way as the solid's surface.
    SharedSame,
    /// On the boundary, facing against the solid's surface.
    SharedOpposite,
}

impl Classification {
    const fn is_shared(self) -> bool {
        matches!(self, Classification::SharedSame | Classification::SharedOpposite)
    }
}

/// A piece of a classified polygon.
pub type ClassifiedFragment = (Vec<Point3<f64>>, Classification);

/// A BSP tree node holding the plane of one face.
#[derive(Debug)]
struct Node {
    plane: SplitPlane,
    /// Half-space the plane normal points into.
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
}

impl Node {
    fn new(plane: SplitPlane) -> Self {
        Node {
            plane,
            front: None,
            back: None,
        }
    }
}

type InsertStack<'a> = Vec<(&'a mut Node, Vec<Point3<f64>>)>;
type QueryStack<'a> = Vec<(&'a Node, Vec<Point3<f64>>)>;

/// Continue into a child, or emit the fragment with the class of the empty slot.
fn route<'a>(
    slot: &'a Option<Box<Node>>,
    polygon: Vec<Point3<f64>>,
    leaf: Classification,
    stack: &mut QueryStack<'a>,
    out: &mut Vec<ClassifiedFragment>,
) {
    match slot.as_deref() {
        Some(child) => stack.push((child, polygon)),
        None => out.push((polygon, leaf)),
    }
}

/// Put `polygon` into `slot`: descend into an existing child, or turn an
/// empty slot into a new node carrying `plane`.
fn descend_or_create<'a>(
    slot: &'a mut Option<Box<Node>>,
    polygon: Vec<Point3<f64>>,
    plane: &SplitPlane,
    stack: &mut InsertStack<'a>,
    created: &mut usize,
) {
    match slot {
        Some(child) => stack.push((&mut **child, polygon)),
        None => {
            *slot = Some(Box::new(Node::new(plane.clone())));
            *created += 1;
        },
    }
}

#[derive(Debug, Default)]
pub struct SolidTree {
    root: Option<Box<Node>>,
    options: CsgOptions,
    node_count: usize,
    skipped_faces: usize,
}

impl SolidTree {
    pub fn new(options: CsgOptions) -> Self {
        SolidTree {
            root: None,
            options,
            node_count: 0,
            skipped_faces: 0,
        }
    }

    /// Tree of every closed face of `mesh`.
    pub fn build(mesh: &MeshEffect, options: CsgOptions) -> Result<Self, MeshError> {
        let mut tree = SolidTree::new(options);
        for face in mesh.face_ids() {
            let points: Vec<Point3<f64>> = mesh.face_points(face).iter().map(to_big).collect();
            tree.add_face(&points)?;
        }
        log::debug!(
            "solid tree: {} nodes, {} degenerate faces skipped",
            tree.node_count,
            tree.skipped_faces
        );
        Ok(tree)
    }

    pub fn options(&self) -> &CsgOptions {
        &self.options
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn skipped_faces(&self) -> usize {
        self.skipped_faces
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert one convex face. Returns `false` when the face has no usable
    /// plane (squared normal magnitude at or below the degenerate limit) and
    /// was skipped.
    pub fn add_face(&mut self, points: &[Point3<f64>]) -> Result<bool, MeshError> {
        let Some(plane) = SplitPlane::from_loop(points) else {
            self.skipped_faces += 1;
            log::trace!("solid tree: skipping degenerate face with {} vertices", points.len());
            return Ok(false);
        };

        let tolerance = self.options.plane_tolerance;
        let straddle = self.options.straddle;
        let limit = self.options.stack_limit;
        let root = match self.root.as_deref_mut() {
            Some(root) => root,
            None => {
                self.root = Some(Box::new(Node::new(plane)));
                self.node_count = 1;
                return Ok(true);
            },
        };

        let mut created = 0;
        let mut stack: InsertStack<'_> = vec![(root, points.to_vec())];
        while let Some((node, polygon)) = stack.pop() {
            let Node {
                plane: node_plane,
                front,
                back,
            } = node;
            let (side, sides) = node_plane.classify(&polygon, tolerance);
            match side {
                // the node plane already covers this face
                PolygonSide::Coplanar => {},
                PolygonSide::Front => descend_or_create(front, polygon, &plane, &mut stack, &mut created),
                PolygonSide::Back => descend_or_create(back, polygon, &plane, &mut stack, &mut created),
                PolygonSide::Straddle => match straddle {
                    StraddleMode::Split => {
                        let (front_part, back_part) = node_plane.split(&polygon, &sides);
                        if front_part.len() >= 3 {
                            descend_or_create(front, front_part, &plane, &mut stack, &mut created);
                        }
                        if back_part.len() >= 3 {
                            descend_or_create(back, back_part, &plane, &mut stack, &mut created);
                        }
                    },
                    StraddleMode::Legacy => {
                        if back.is_none() {
                            *back = Some(Box::new(Node::new(plane.clone())));
                            created += 1;
                        }
                    },
                },
            }
            if stack.len() > limit {
                return Err(MeshError::StackLimit { limit });
            }
        }

        log::trace!("solid tree: face added {} nodes", created);
        self.node_count += created;
        Ok(true)
    }

    /// Side of a polygon with respect to the root plane only.
    pub fn root_side(&self, polygon: &[Point3<f64>]) -> Option<PolygonSide> {
        self.root
            .as_deref()
            .map(|root| root.plane.classify(polygon, self.options.plane_tolerance).0)
    }

    /// Clip a convex polygon against the solid.
    ///
    /// `normal` is the polygon's facing direction; it only matters for
    /// fragments lying on the solid's boundary.
    pub fn classify(&self, polygon: &[Point3<f64>], normal: &Vector3<f64>) -> Result<Vec<ClassifiedFragment>, MeshError> {
        let mut out = Vec::new();
        self.descend(self.root.as_deref(), polygon.to_vec(), normal, Classification::Outside, 0, &mut out)?;
        Ok(out)
    }

    fn descend(
        &self,
        start: Option<&Node>,
        polygon: Vec<Point3<f64>>,
        normal: &Vector3<f64>,
        empty: Classification,
        depth: usize,
        out: &mut Vec<ClassifiedFragment>,
    ) -> Result<(), MeshError> {
        let Some(start) = start else {
            out.push((polygon, empty));
            return Ok(());
        };
        let limit = self.options.stack_limit;
        if depth > limit {
            return Err(MeshError::StackLimit { limit });
        }

        let tolerance = self.options.plane_tolerance;
        let mut stack: QueryStack<'_> = vec![(start, polygon)];
        while let Some((node, polygon)) = stack.pop() {
            let (side, sides) = node.plane.classify(&polygon, tolerance);
            match side {
                PolygonSide::Front => route(&node.front, polygon, Classification::Outside, &mut stack, out),
                PolygonSide::Back => route(&node.back, polygon, Classification::Inside, &mut stack, out),
                PolygonSide::Straddle => {
                    let (front_part, back_part) = node.plane.split(&polygon, &sides);
                    if front_part.len() >= 3 {
                        route(&node.front, front_part, Classification::Outside, &mut stack, out);
                    }
                    if back_part.len() >= 3 {
                        route(&node.back, back_part, Classification::Inside, &mut stack, out);
                    }
                },
                PolygonSide::Coplanar => self.coplanar(node, polygon, normal, depth + 1, out)?,
            }
            if stack.len() > limit {
                return Err(MeshError::StackLimit { limit });
            }
        }
        Ok(())
    }

    /// A polygon lying on a node plane is outside/inside according to what
    /// lies just in front of and just behind it.
    fn coplanar(
        &self,
        node: &Node,
        polygon: Vec<Point3<f64>>,
        normal: &Vector3<f64>,
        depth: usize,
        out: &mut Vec<ClassifiedFragment>,
    ) -> Result<(), MeshError> {
        let same_facing = node.plane.normal().dot(normal) > 0.0;

        let mut front_pieces = Vec::new();
        self.descend(node.front.as_deref(), polygon, normal, Classification::Outside, depth, &mut front_pieces)?;
        for (piece, front_class) in front_pieces {
            if front_class.is_shared() {
                out.push((piece, front_class));
                continue;
            }
            let mut back_pieces = Vec::new();
            self.descend(node.back.as_deref(), piece, normal, Classification::Inside, depth, &mut back_pieces)?;
            for (piece, back_class) in back_pieces {
                let class = match (front_class, back_class) {
                    (_, shared) if shared.is_shared() => shared,
                    (Classification::Outside, Classification::Inside) if same_facing => Classification::SharedSame,
                    (Classification::Outside, Classification::Inside) => Classification::SharedOpposite,
                    (Classification::Inside, Classification::Outside) if same_facing => Classification::SharedOpposite,
                    (Classification::Inside, Classification::Outside) => Classification::SharedSame,
                    (_, back_class) => back_class,
                };
                out.push((piece, class));
            }
        }
        Ok(())
    }
}

impl Drop for SolidTree {
    fn drop(&mut self) {
        // unlink children first so dropping a deep tree never recurses
        let mut pending: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.front.take());
            pending.extend(node.back.take());
        }
    }
}
