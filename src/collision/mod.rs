mod collision_pair;
mod broad_phase;
mod narrow_phase;
mod contact_generator;
mod collision_filter;

pub use self::collision_pair::{CollisionPair, flatten_pairs};
pub use self::broad_phase::{
    BroadPhase, NaiveBroadPhase, SapBroadPhase, GridBroadPhase, QuadTreeBroadPhase,
    can_collide, bounding_radius_check,
};
pub use self::narrow_phase::{NarrowPhase, ShapeContext};
pub use self::contact_generator::{ContactPoint, ContactRoutine};
pub use self::collision_filter::{CollisionGroup, CollisionMask, groups_collide};
pub use crate::core::ImpactMatching;
