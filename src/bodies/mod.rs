mod rigid_body;
mod material;
mod body_type;

pub use self::rigid_body::{RigidBody, RigidBodyHandle, BodyShape};
pub use self::material::{Material, ContactMaterial};
pub use self::body_type::MotionState;
