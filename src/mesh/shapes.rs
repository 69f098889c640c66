//! Primitive solids, a textured plane quad and point cloud hulls.

use super::{MeshEffect, VertexAttribute};
use crate::errors::MeshError;
use crate::float_types::{PI, Real, TAU};
use nalgebra::{Matrix4, Point3, Vector2, Vector3};

fn corner(position: Point3<Real>, normal: Vector3<Real>, uv: Vector2<Real>, material: u32) -> VertexAttribute {
    VertexAttribute::new(position, normal, uv, uv, material)
}

impl MeshEffect {
    /// Axis aligned box spanning `[0, width] x [0, length] x [0, height]`.
    ///
    /// ```text
    ///     4-------5
    ///    /|      /|
    ///   0-------1 |
    ///   | |     | |
    ///   | 7-----|-6
    ///   |/      |/
    ///   3-------2
    /// ```
    pub fn cuboid(width: Real, length: Real, height: Real, material: u32) -> Result<Self, MeshError> {
        let p = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(width, 0.0, 0.0),
            Point3::new(width, length, 0.0),
            Point3::new(0.0, length, 0.0),
            Point3::new(0.0, 0.0, height),
            Point3::new(width, 0.0, height),
            Point3::new(width, length, height),
            Point3::new(0.0, length, height),
        ];
        // counter-clockwise seen from outside
        let faces = [
            ([0, 3, 2, 1], -Vector3::z()),
            ([4, 5, 6, 7], Vector3::z()),
            ([0, 1, 5, 4], -Vector3::y()),
            ([3, 7, 6, 2], Vector3::y()),
            ([0, 4, 7, 3], -Vector3::x()),
            ([1, 2, 6, 5], Vector3::x()),
        ];
        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        let polygons: Vec<Vec<VertexAttribute>> = faces
            .iter()
            .map(|(indices, normal)| {
                indices
                    .iter()
                    .zip(&uvs)
                    .map(|(&i, uv)| corner(p[i], *normal, *uv, material))
                    .collect()
            })
            .collect();
        MeshEffect::from_polygons(&polygons)
    }

    pub fn cube(size: Real, material: u32) -> Result<Self, MeshError> {
        Self::cuboid(size, size, size, material)
    }

    /// UV sphere centered at the origin, poles on the y axis.
    pub fn sphere(radius: Real, segments: usize, stacks: usize, material: u32) -> Result<Self, MeshError> {
        let segments = segments.max(3);
        let stacks = stacks.max(2);
        let vertex = |i: usize, j: usize| {
            let u = i as Real / segments as Real;
            let v = j as Real / stacks as Real;
            let (theta, phi) = (u * TAU, v * PI);
            let normal = Vector3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
            corner(Point3::from(normal * radius), normal, Vector2::new(u, v), material)
        };

        let mut polygons = Vec::with_capacity(segments * stacks);
        for i in 0..segments {
            for j in 0..stacks {
                let mut polygon = vec![vertex(i, j)];
                if j > 0 {
                    polygon.push(vertex(i + 1, j));
                }
                if j < stacks - 1 {
                    polygon.push(vertex(i + 1, j + 1));
                }
                polygon.push(vertex(i, j + 1));
                polygons.push(polygon);
            }
        }
        MeshEffect::from_polygons(&polygons)
    }

    /// Closed cylinder around the y axis from `y = 0` to `y = height`.
    pub fn cylinder(radius: Real, height: Real, segments: usize, material: u32) -> Result<Self, MeshError> {
        let segments = segments.max(3);
        let ring = |i: usize| {
            let theta = TAU * (i % segments) as Real / segments as Real;
            Vector3::new(theta.cos(), 0.0, theta.sin())
        };
        let uv = |i: usize, y: Real| Vector2::new(i as Real / segments as Real, y);

        let mut polygons = Vec::with_capacity(segments + 2);
        for i in 0..segments {
            let (n0, n1) = (ring(i), ring(i + 1));
            let bottom0 = Point3::from(n0 * radius);
            let bottom1 = Point3::from(n1 * radius);
            let up = Vector3::y() * height;
            polygons.push(vec![
                corner(bottom0, n0, uv(i, 0.0), material),
                corner(bottom0 + up, n0, uv(i, 1.0), material),
                corner(bottom1 + up, n1, uv(i + 1, 1.0), material),
                corner(bottom1, n1, uv(i + 1, 0.0), material),
            ]);
        }

        let cap = |y: Real, normal: Vector3<Real>| -> Vec<VertexAttribute> {
            (0..segments)
                .map(|i| {
                    let d = ring(i);
                    corner(
                        Point3::new(d.x * radius, y, d.z * radius),
                        normal,
                        Vector2::new(d.x * 0.5 + 0.5, d.z * 0.5 + 0.5),
                        material,
                    )
                })
                .collect()
        };
        polygons.push(cap(0.0, -Vector3::y()));
        let mut top = cap(height, Vector3::y());
        top.reverse();
        polygons.push(top);
        MeshEffect::from_polygons(&polygons)
    }

    /// Rectangle of `width` by `breadth` in the local xy plane of `plane`
    /// (local +z is its normal). Each UV set is the xy of the corner position
    /// transformed by the matching texture matrix.
    pub fn plane_quad(
        plane: &Matrix4<Real>,
        width: Real,
        breadth: Real,
        material: u32,
        texture0: &Matrix4<Real>,
        texture1: &Matrix4<Real>,
    ) -> Result<Self, MeshError> {
        let normal = plane
            .transform_vector(&Vector3::z())
            .try_normalize(Real::EPSILON)
            .ok_or(MeshError::DegeneratePlane)?;
        let (hw, hb) = (width * 0.5, breadth * 0.5);
        let polygon: Vec<VertexAttribute> = [(-hw, -hb), (hw, -hb), (hw, hb), (-hw, hb)]
            .iter()
            .map(|&(x, y)| {
                let position = plane.transform_point(&Point3::new(x, y, 0.0));
                let t0 = texture0.transform_point(&position);
                let t1 = texture1.transform_point(&position);
                VertexAttribute::new(
                    position,
                    normal,
                    Vector2::new(t0.x, t0.y),
                    Vector2::new(t1.x, t1.y),
                    material,
                )
            })
            .collect();
        MeshEffect::from_polygons(&[polygon])
    }

    /// Convex hull of a point cloud. Points closer than `distance_tolerance`
    /// to an already accepted point are ignored.
    #[cfg(feature = "chull-io")]
    pub fn convex_hull(points: &[Point3<Real>], distance_tolerance: Real, material: u32) -> Result<Self, MeshError> {
        use crate::float_types::tolerance;
        use chull::ConvexHullWrapper;

        let (unique, _) = super::weld::weld_points(points, distance_tolerance.max(tolerance()))?;
        let cloud: Vec<Vec<Real>> = unique.iter().map(|p| vec![p.x, p.y, p.z]).collect();
        let hull = ConvexHullWrapper::try_new(&cloud, None)
            .map_err(|e| MeshError::ConvexHull(format!("{:?}", e)))?;
        let (vertices, indices) = hull.vertices_indices();

        let hull_points: Vec<Point3<Real>> = vertices
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        let centroid = hull_points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / hull_points.len().max(1) as Real;

        let polygons: Vec<Vec<VertexAttribute>> = indices
            .chunks_exact(3)
            .map(|tri| {
                let (mut a, b, mut c) = (hull_points[tri[0]], hull_points[tri[1]], hull_points[tri[2]]);
                let mut normal = (b - a).cross(&(c - a));
                if normal.dot(&(a.coords - centroid)) < 0.0 {
                    std::mem::swap(&mut a, &mut c);
                    normal = -normal;
                }
                let normal = normal.try_normalize(Real::EPSILON).unwrap_or(normal);
                [a, b, c]
                    .iter()
                    .map(|p| VertexAttribute::at(*p).with_material(material))
                    .map(|mut v| {
                        v.normal = normal;
                        v
                    })
                    .collect()
            })
            .collect();
        let mut mesh = MeshEffect::from_polygons(&polygons)?;
        mesh.convert_to_polygons()?;
        Ok(mesh)
    }
}
