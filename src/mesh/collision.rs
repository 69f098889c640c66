//! Boundary to the collision layer: meshes go out as parry shapes and parry
//! shapes come back in as meshes.

use super::triangulate::triangulate_loop;
use super::{MeshEffect, VertexAttribute};
use crate::errors::MeshError;
use crate::float_types::{
    Real,
    parry3d::shape::{Shape, SharedShape, TriMesh},
    parry3d::transformation::vhacd::VHACDParameters,
};
use nalgebra::Point3;

type TriangleBuffers = (Vec<Point3<Real>>, Vec<[u32; 3]>);

/// Triangles of a parry shape, recursing through compounds.
fn shape_triangles(shape: &dyn Shape) -> Result<TriangleBuffers, MeshError> {
    if let Some(cuboid) = shape.as_cuboid() {
        return Ok(cuboid.to_trimesh());
    }
    if let Some(ball) = shape.as_ball() {
        return Ok(ball.to_trimesh(24, 12));
    }
    if let Some(cylinder) = shape.as_cylinder() {
        return Ok(cylinder.to_trimesh(24));
    }
    if let Some(capsule) = shape.as_capsule() {
        return Ok(capsule.to_trimesh(24, 6));
    }
    if let Some(polyhedron) = shape.as_convex_polyhedron() {
        return Ok(polyhedron.to_trimesh());
    }
    if let Some(trimesh) = shape.as_trimesh() {
        return Ok((trimesh.vertices().to_vec(), trimesh.indices().to_vec()));
    }
    if let Some(compound) = shape.as_compound() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for (isometry, part) in compound.shapes() {
            let (part_vertices, part_indices) = shape_triangles(&**part)?;
            let base = vertices.len() as u32;
            vertices.extend(part_vertices.iter().map(|p| isometry * p));
            indices.extend(part_indices.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
        }
        return Ok((vertices, indices));
    }
    Err(MeshError::CollisionShape(format!(
        "unsupported shape type {:?}",
        shape.shape_type()
    )))
}

impl MeshEffect {
    /// Referenced points and the triangles of every face, indexing them.
    pub fn triangle_buffers(&self) -> TriangleBuffers {
        let mut remap = vec![u32::MAX; self.points.len()];
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for face in self.face_ids() {
            let corners = self.face_point_indices(face);
            let mut local = Vec::with_capacity(corners.len());
            for &p in &corners {
                if remap[p] == u32::MAX {
                    remap[p] = vertices.len() as u32;
                    vertices.push(self.points[p]);
                }
                local.push(remap[p]);
            }
            let loop_points: Vec<Point3<Real>> = corners.iter().map(|&p| self.points[p]).collect();
            indices.extend(
                triangulate_loop(&loop_points)
                    .into_iter()
                    .map(|[a, b, c]| [local[a], local[b], local[c]]),
            );
        }
        (vertices, indices)
    }

    pub fn to_trimesh(&self) -> Result<TriMesh, MeshError> {
        let (vertices, indices) = self.triangle_buffers();
        if indices.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        Ok(TriMesh::new(vertices, indices)?)
    }

    /// Exact triangle-mesh collision shape.
    pub fn create_collision_tree(&self) -> Result<SharedShape, MeshError> {
        Ok(SharedShape::new(self.to_trimesh()?))
    }

    /// Convex hull collision shape of the mesh points.
    pub fn create_convex_collision(&self) -> Result<SharedShape, MeshError> {
        let (vertices, _) = self.triangle_buffers();
        SharedShape::convex_hull(&vertices)
            .ok_or_else(|| MeshError::CollisionShape("points do not span a convex hull".to_string()))
    }

    /// Approximate convex decomposition with at most `max_convex_count` parts.
    /// A count of 1 or less gives the plain convex hull.
    pub fn create_convex_approximation(&self, max_convex_count: u32) -> Result<SharedShape, MeshError> {
        if max_convex_count <= 1 {
            return self.create_convex_collision();
        }
        let (vertices, indices) = self.triangle_buffers();
        if indices.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        let params = VHACDParameters {
            max_convex_hulls: max_convex_count,
            ..Default::default()
        };
        Ok(SharedShape::convex_decomposition_with_params(&vertices, &indices, &params))
    }

    /// Mesh of a collision shape's surface; coplanar triangles are merged
    /// back into convex polygons.
    pub fn from_collision(shape: &SharedShape, material: u32) -> Result<Self, MeshError> {
        let (vertices, indices) = shape_triangles(&**shape)?;
        let polygons: Vec<Vec<VertexAttribute>> = indices
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|i| vertices[i as usize]);
                let n = (b - a).cross(&(c - a));
                let normal = n.try_normalize(Real::EPSILON).unwrap_or(n);
                [a, b, c]
                    .into_iter()
                    .map(|p| {
                        let mut corner = VertexAttribute::at(p).with_material(material);
                        corner.normal = normal;
                        corner
                    })
                    .collect()
            })
            .collect();
        let mut mesh = MeshEffect::from_polygons(&polygons)?;
        mesh.convert_to_polygons()?;
        mesh.pack_vertex_arrays()?;
        Ok(mesh)
    }
}
