use super::expansion;
use nalgebra::{Point3, Vector3};
use std::cmp::Ordering;
use std::ops::{Add, Mul, Neg, Sub};

/// Exact scalar built on a non-overlapping floating point expansion.
///
/// Addition, subtraction and multiplication are exact; there is no division.
/// [`HugeScalar::approximate`] rounds back to an `f64` whose sign always
/// matches the sign of the exact value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HugeScalar {
    parts: Vec<f64>,
}

/// Components beyond this trigger a renormalization.
const COMPRESS_THRESHOLD: usize = 16;

impl HugeScalar {
    pub const fn zero() -> Self {
        HugeScalar { parts: Vec::new() }
    }

    fn from_parts(parts: Vec<f64>) -> Self {
        if parts.len() > COMPRESS_THRESHOLD {
            HugeScalar {
                parts: expansion::compress(&parts),
            }
        } else {
            HugeScalar { parts }
        }
    }

    /// Rounded value of the exact number.
    pub fn approximate(&self) -> f64 {
        expansion::estimate(&self.parts)
    }

    /// Exact sign of the value.
    pub fn signum(&self) -> Ordering {
        match self.parts.last() {
            Some(v) if *v > 0.0 => Ordering::Greater,
            Some(v) if *v < 0.0 => Ordering::Less,
            _ => Ordering::Equal,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of stored expansion components.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl From<f64> for HugeScalar {
    fn from(value: f64) -> Self {
        debug_assert!(value.is_finite());
        if value == 0.0 {
            HugeScalar::zero()
        } else {
            HugeScalar { parts: vec![value] }
        }
    }
}

impl From<f32> for HugeScalar {
    fn from(value: f32) -> Self {
        HugeScalar::from(f64::from(value))
    }
}

impl Add<&HugeScalar> for &HugeScalar {
    type Output = HugeScalar;
    fn add(self, rhs: &HugeScalar) -> HugeScalar {
        HugeScalar::from_parts(expansion::sum(&self.parts, &rhs.parts))
    }
}

impl Sub<&HugeScalar> for &HugeScalar {
    type Output = HugeScalar;
    fn sub(self, rhs: &HugeScalar) -> HugeScalar {
        let negated: Vec<f64> = rhs.parts.iter().map(|v| -v).collect();
        HugeScalar::from_parts(expansion::sum(&self.parts, &negated))
    }
}

impl Mul<&HugeScalar> for &HugeScalar {
    type Output = HugeScalar;
    fn mul(self, rhs: &HugeScalar) -> HugeScalar {
        HugeScalar::from_parts(expansion::product(&self.parts, &rhs.parts))
    }
}

impl Neg for &HugeScalar {
    type Output = HugeScalar;
    fn neg(self) -> HugeScalar {
        HugeScalar {
            parts: self.parts.iter().map(|v| -v).collect(),
        }
    }
}

impl Add for HugeScalar {
    type Output = HugeScalar;
    fn add(self, rhs: HugeScalar) -> HugeScalar {
        &self + &rhs
    }
}

impl Sub for HugeScalar {
    type Output = HugeScalar;
    fn sub(self, rhs: HugeScalar) -> HugeScalar {
        &self - &rhs
    }
}

impl Mul for HugeScalar {
    type Output = HugeScalar;
    fn mul(self, rhs: HugeScalar) -> HugeScalar {
        &self * &rhs
    }
}

impl Neg for HugeScalar {
    type Output = HugeScalar;
    fn neg(self) -> HugeScalar {
        -&self
    }
}

/// Exact 3D vector (or point) with [`HugeScalar`] coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HugeVector {
    pub x: HugeScalar,
    pub y: HugeScalar,
    pub z: HugeScalar,
}

impl HugeVector {
    pub const fn zero() -> Self {
        HugeVector {
            x: HugeScalar::zero(),
            y: HugeScalar::zero(),
            z: HugeScalar::zero(),
        }
    }

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        HugeVector {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }

    /// Exact dot product.
    pub fn dot(&self, other: &HugeVector) -> HugeScalar {
        let xx = &self.x * &other.x;
        let yy = &self.y * &other.y;
        let zz = &self.z * &other.z;
        &(&xx + &yy) + &zz
    }

    /// Exact cross product.
    pub fn cross(&self, other: &HugeVector) -> HugeVector {
        HugeVector {
            x: &(&self.y * &other.z) - &(&self.z * &other.y),
            y: &(&self.z * &other.x) - &(&self.x * &other.z),
            z: &(&self.x * &other.y) - &(&self.y * &other.x),
        }
    }

    /// Rounded coordinates.
    pub fn approximate(&self) -> Vector3<f64> {
        Vector3::new(
            self.x.approximate(),
            self.y.approximate(),
            self.z.approximate(),
        )
    }
}

impl From<&Point3<f64>> for HugeVector {
    fn from(p: &Point3<f64>) -> Self {
        HugeVector::new(p.x, p.y, p.z)
    }
}

impl From<&Vector3<f64>> for HugeVector {
    fn from(v: &Vector3<f64>) -> Self {
        HugeVector::new(v.x, v.y, v.z)
    }
}

impl Add<&HugeVector> for &HugeVector {
    type Output = HugeVector;
    fn add(self, rhs: &HugeVector) -> HugeVector {
        HugeVector {
            x: &self.x + &rhs.x,
            y: &self.y + &rhs.y,
            z: &self.z + &rhs.z,
        }
    }
}

impl Sub<&HugeVector> for &HugeVector {
    type Output = HugeVector;
    fn sub(self, rhs: &HugeVector) -> HugeVector {
        HugeVector {
            x: &self.x - &rhs.x,
            y: &self.y - &rhs.y,
            z: &self.z - &rhs.z,
        }
    }
}

impl Neg for &HugeVector {
    type Output = HugeVector;
    fn neg(self) -> HugeVector {
        HugeVector {
            x: -&self.x,
            y: -&self.y,
            z: -&self.z,
        }
    }
}
