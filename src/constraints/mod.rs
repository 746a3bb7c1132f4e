mod constraint;
mod distance;
mod lock;
mod point_to_point;
mod prismatic;

pub use self::constraint::Constraint;
pub use self::distance::DistanceConstraint;
pub use self::lock::LockConstraint;
pub use self::point_to_point::PointToPointConstraint;
pub use self::prismatic::PrismaticConstraint;
