use crate::math::Vector2;

use serde::{Serialize, Deserialize};

/// Axis-Aligned Bounding Box (AABB) in the plane, used by the spatial broad-phases
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vector2,

    /// Maximum corner of the AABB
    pub max: Vector2,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn from_center_half_extents(center: Vector2, half_extents: Vector2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates the square AABB around a circle
    #[inline]
    pub fn from_circle(center: Vector2, radius: f32) -> Self {
        Self::from_center_half_extents(center, Vector2::new(radius, radius))
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents of the AABB in each dimension
    #[inline]
    pub fn extents(&self) -> Vector2 {
        self.max - self.min
    }

    /// Returns the four corners, counter-clockwise from `min`
    #[inline]
    pub fn corners(&self) -> [Vector2; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }

    /// Checks if this AABB contains a point
    #[inline]
    pub fn contains_point(&self, point: Vector2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Checks if this AABB fully contains another AABB
    #[inline]
    pub fn contains_aabb(&self, other: &Self) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x &&
        self.min.y <= other.min.y && self.max.y >= other.max.y
    }

    /// Checks if this AABB intersects with another AABB
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Returns the union of this AABB with another
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Vector2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vector2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Splits the box into its four quadrants: top-left, top-right, bottom-left, bottom-right
    pub fn quadrants(&self) -> [Aabb; 4] {
        let c = self.center();
        [
            Aabb::new(Vector2::new(self.min.x, c.y), Vector2::new(c.x, self.max.y)),
            Aabb::new(c, self.max),
            Aabb::new(self.min, c),
            Aabb::new(Vector2::new(c.x, self.min.y), Vector2::new(self.max.x, c.y)),
        ]
    }
}
