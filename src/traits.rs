use crate::errors::MeshError;
use crate::float_types::{EPSILON, Real};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Translation3, Vector3};

/// Boolean operations + transformations
///
/// The second operand of every boolean is placed by `matrix` before the
/// operation; pass `Matrix4::identity()` to use it as is.
pub trait CsgOps: Sized + Clone {
    fn union(&self, other: &Self, matrix: &Matrix4<Real>) -> Result<Self, MeshError>;
    fn difference(&self, other: &Self, matrix: &Matrix4<Real>) -> Result<Self, MeshError>;
    fn intersection(&self, other: &Self, matrix: &Matrix4<Real>) -> Result<Self, MeshError>;
    /// Split into the part outside `clipper` and the part inside it.
    fn clip_mesh(&self, clipper: &Self, matrix: &Matrix4<Real>) -> Result<(Self, Self), MeshError>;
    fn transform(&self, matrix: &Matrix4<Real>) -> Result<Self, MeshError>;

    /// Returns a new Self translated by vector.
    fn translate_vector(&self, vector: Vector3<Real>) -> Result<Self, MeshError> {
        self.transform(&Translation3::from(vector).to_homogeneous())
    }

    /// Returns a new Self translated by x, y, and z.
    fn translate(&self, x: Real, y: Real, z: Real) -> Result<Self, MeshError> {
        self.translate_vector(Vector3::new(x, y, z))
    }

    /// Rotates by x_deg, y_deg, z_deg (applied in x, y, z order)
    fn rotate(&self, x_deg: Real, y_deg: Real, z_deg: Real) -> Result<Self, MeshError> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());
        let rot = rz * ry * rx;
        self.transform(&rot.to_homogeneous())
    }

    /// Scales by sx, sy, sz
    fn scale(&self, sx: Real, sy: Real, sz: Real) -> Result<Self, MeshError> {
        let mat4 = Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz));
        self.transform(&mat4)
    }

    /// Reflect about the plane through `point` with normal `normal`.
    ///
    /// A degenerate normal leaves the mesh unchanged. Face winding is
    /// restored by the transform, so the result stays outward facing.
    fn mirror(&self, point: &Point3<Real>, normal: &Vector3<Real>) -> Result<Self, MeshError> {
        let len = normal.norm();
        if len < EPSILON {
            return Ok(self.clone());
        }
        let n = normal / len;

        let t1 = Translation3::from(-point.coords).to_homogeneous();
        // R = I - 2 n n^T
        let mut reflect_4 = Matrix4::identity();
        let reflect_3 = Matrix3::identity() - 2.0 * n * n.transpose();
        reflect_4.fixed_view_mut::<3, 3>(0, 0).copy_from(&reflect_3);
        let t2 = Translation3::from(point.coords).to_homogeneous();

        self.transform(&(t2 * reflect_4 * t1))
    }
}
