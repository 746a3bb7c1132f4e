use nalgebra as na;
use crate::math::Vector2;
use std::fmt;
use std::ops::Mul;

use serde::{Serialize, Deserialize};

/// A 2x2 matrix representation for physics calculations (row major)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix2 {
    pub data: [[f32; 2]; 2],
}

impl Matrix2 {
    /// Creates a new 2x2 matrix from a 2D array
    #[inline]
    pub fn new(data: [[f32; 2]; 2]) -> Self {
        Self { data }
    }

    /// Creates a new 2x2 identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0],
                [0.0, 1.0],
            ],
        }
    }

    /// Creates a new 2x2 zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self { data: [[0.0; 2]; 2] }
    }

    /// Creates a counter-clockwise rotation matrix
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            data: [
                [cos, -sin],
                [sin, cos],
            ],
        }
    }

    /// Creates a diagonal scaling matrix
    #[inline]
    pub fn from_scale(scale: Vector2) -> Self {
        Self {
            data: [
                [scale.x, 0.0],
                [0.0, scale.y],
            ],
        }
    }

    /// Returns the transposed matrix
    #[inline]
    pub fn transpose(&self) -> Self {
        let [[a, b], [c, d]] = self.data;
        Self { data: [[a, c], [b, d]] }
    }

    /// Returns the determinant
    #[inline]
    pub fn determinant(&self) -> f32 {
        let [[a, b], [c, d]] = self.data;
        a * d - b * c
    }

    /// Returns the inverse of the matrix, or `None` if it is singular
    pub fn inverse(&self) -> Option<Self> {
        self.to_nalgebra()
            .try_inverse()
            .map(|m| Self::from_nalgebra(&m))
    }

    /// Multiplies a vector by this matrix
    #[inline]
    pub fn multiply_vector(&self, v: Vector2) -> Vector2 {
        let [[a, b], [c, d]] = self.data;
        Vector2::new(a * v.x + b * v.y, c * v.x + d * v.y)
    }

    /// Multiplies this matrix by another
    pub fn multiply_matrix(&self, other: &Self) -> Self {
        let mut result = Self::zero();

        for i in 0..2 {
            for j in 0..2 {
                let mut sum = 0.0;
                for k in 0..2 {
                    sum += self.data[i][k] * other.data[k][j];
                }
                result.data[i][j] = sum;
            }
        }

        result
    }

    /// Convert to nalgebra Matrix2
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix2<f32> {
        let [[a, b], [c, d]] = self.data;
        na::Matrix2::new(a, b, c, d)
    }

    /// Convert from nalgebra Matrix2
    #[inline]
    pub fn from_nalgebra(m: &na::Matrix2<f32>) -> Self {
        Self {
            data: [
                [m[(0, 0)], m[(0, 1)]],
                [m[(1, 0)], m[(1, 1)]],
            ],
        }
    }
}

impl Default for Matrix2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Vector2> for Matrix2 {
    type Output = Vector2;

    #[inline]
    fn mul(self, rhs: Vector2) -> Vector2 {
        self.multiply_vector(rhs)
    }
}

impl Mul for Matrix2 {
    type Output = Matrix2;

    #[inline]
    fn mul(self, rhs: Matrix2) -> Matrix2 {
        self.multiply_matrix(&rhs)
    }
}

impl fmt::Display for Matrix2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [[a, b], [c, d]] = self.data;
        write!(f, "[[{}, {}], [{}, {}]]", a, b, c, d)
    }
}
