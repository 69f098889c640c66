//! Node planes of the solid tree and polygon classification against them.

use crate::float_types::PLANE_MIN_MAG2;
use crate::numeric::{HugeScalar, HugeVector};
use nalgebra::{Point3, Vector3};

/// Side of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// Side of a whole polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonSide {
    Front,
    Back,
    Straddle,
    Coplanar,
}

/// Relative error bound of the plain float plane evaluation.
const FILTER_BOUND: f64 = 8.0 * f64::EPSILON;

/// Plane through the first vertex of a face with a Newell-style normal,
/// kept both exactly and rounded.
#[derive(Debug, Clone)]
pub struct SplitPlane {
    origin: HugeVector,
    normal: HugeVector,
    origin_approx: Point3<f64>,
    normal_approx: Vector3<f64>,
    normal_len: f64,
}

impl SplitPlane {
    /// Plane of a vertex loop, or `None` when the loop has (nearly) no area.
    ///
    /// The normal is the exact sum of the fan cross products
    /// `(p[i] - p[0]) x (p[i+1] - p[0])`, i.e. twice the vector area.
    pub fn from_loop(points: &[Point3<f64>]) -> Option<SplitPlane> {
        if points.len() < 3 {
            return None;
        }
        let origin = HugeVector::from(&points[0]);
        let mut normal = HugeVector::zero();
        let mut e0 = &HugeVector::from(&points[1]) - &origin;
        for p in &points[2..] {
            let e1 = &HugeVector::from(p) - &origin;
            normal = &normal + &e0.cross(&e1);
            e0 = e1;
        }

        let normal_approx = normal.approximate();
        if normal_approx.norm_squared() <= PLANE_MIN_MAG2 {
            return None;
        }
        Some(SplitPlane {
            origin,
            normal,
            origin_approx: points[0],
            normal_approx,
            normal_len: normal_approx.norm(),
        })
    }

    /// Rounded, unnormalized normal.
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal_approx
    }

    pub fn origin(&self) -> &Point3<f64> {
        &self.origin_approx
    }

    /// Rounded `normal . (p - origin)`: signed distance scaled by `|normal|`.
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal_approx.dot(&(p - self.origin_approx))
    }

    /// Side of `p`, with points closer than `tolerance` counted as on the plane.
    ///
    /// The float evaluation decides whenever its error bound allows; otherwise
    /// the exact value is formed and its rounded value is compared instead.
    pub fn side(&self, p: &Point3<f64>, tolerance: f64) -> Side {
        let d = p - self.origin_approx;
        let value = self.normal_approx.dot(&d);
        let magnitude = self.normal_approx.abs().dot(&d.abs());
        let bound = FILTER_BOUND * magnitude;
        let band = tolerance * self.normal_len;

        if value - bound > band {
            return Side::Front;
        }
        if value + bound < -band {
            return Side::Back;
        }
        if value.abs() + bound <= band {
            return Side::On;
        }

        let exact: HugeScalar = self.normal.dot(&(&HugeVector::from(p) - &self.origin));
        let value = exact.approximate();
        if value > band {
            Side::Front
        } else if value < -band {
            Side::Back
        } else {
            Side::On
        }
    }

    /// Classify a polygon; also returns the side of every vertex.
    pub fn classify(&self, polygon: &[Point3<f64>], tolerance: f64) -> (PolygonSide, Vec<Side>) {
        let sides: Vec<Side> = polygon.iter().map(|p| self.side(p, tolerance)).collect();
        let front = sides.contains(&Side::Front);
        let back = sides.contains(&Side::Back);
        let side = match (front, back) {
            (true, true) => PolygonSide::Straddle,
            (true, false) => PolygonSide::Front,
            (false, true) => PolygonSide::Back,
            (false, false) => PolygonSide::Coplanar,
        };
        (side, sides)
    }

    /// Cut a straddling polygon into its front and back parts. On-plane
    /// vertices go to both parts; either part may come back with fewer than
    /// three vertices.
    pub fn split(&self, polygon: &[Point3<f64>], sides: &[Side]) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
        let mut front = Vec::with_capacity(polygon.len() + 2);
        let mut back = Vec::with_capacity(polygon.len() + 2);
        let count = polygon.len();
        for i in 0..count {
            let j = (i + 1) % count;
            let (pi, pj) = (&polygon[i], &polygon[j]);
            match sides[i] {
                Side::Front => front.push(*pi),
                Side::Back => back.push(*pi),
                Side::On => {
                    front.push(*pi);
                    back.push(*pi);
                },
            }
            let crossing = matches!(
                (sides[i], sides[j]),
                (Side::Front, Side::Back) | (Side::Back, Side::Front)
            );
            if crossing {
                let di = self.distance(pi);
                let dj = self.distance(pj);
                let t = (di / (di - dj)).clamp(0.0, 1.0);
                let q = pi + (pj - pi) * t;
                front.push(q);
                back.push(q);
            }
        }
        (front, back)
    }
}
