use bitflags::bitflags;
use crate::shapes::Shape;

bitflags! {
    /// A bit mask representing a collision group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionGroup: u32 {
        /// Default group (collides with everything)
        const DEFAULT  = 0x00000001;

        /// Static world objects
        const STATIC   = 0x00000002;

        /// Dynamic objects
        const DYNAMIC  = 0x00000004;

        /// Kinematic objects
        const KINEMATIC = 0x00000008;

        /// Character objects
        const CHARACTER = 0x00000010;

        /// Projectile objects
        const PROJECTILE = 0x00000020;

        /// Sensor objects
        const SENSOR   = 0x00000040;

        /// Debris objects
        const DEBRIS   = 0x00000080;

        /// All groups
        const ALL      = 0xFFFFFFFF;

        // Arbitrary user bits survive serialization
        const _ = !0;
    }
}

/// Type alias for a collision mask (what groups this object collides with)
pub type CollisionMask = CollisionGroup;

impl Default for CollisionGroup {
    fn default() -> Self {
        CollisionGroup::DEFAULT
    }
}

/// Returns whether two shapes accept each other through their group and mask bits.
///
/// A collides with B if A's mask includes B's group and B's mask includes A's group.
#[inline]
pub fn groups_collide(a: &Shape, b: &Shape) -> bool {
    a.collision_group.intersects(b.collision_mask) && b.collision_group.intersects(a.collision_mask)
}
