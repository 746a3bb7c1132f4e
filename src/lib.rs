pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod equations;
pub mod constraints;
pub mod solver;
pub mod forces;
pub mod integration;

/// Re-export common types for easier usage
pub use crate::core::{
    PhysicsWorld, SimulationConfig, WorldOptions, BodyHandle, ConstraintHandle, SpringHandle,
    WorldEvent, WorldEventType, EventQueue, CommandBuffer, ImpactMatching,
};
pub use crate::bodies::{RigidBody, MotionState, Material, ContactMaterial};
pub use crate::shapes::{Shape, ShapeKind, ShapeType};
pub use crate::collision::{CollisionGroup, CollisionMask, BroadPhase, NarrowPhase};
pub use crate::constraints::{Constraint, DistanceConstraint, LockConstraint, PointToPointConstraint, PrismaticConstraint};
pub use crate::solver::{Solver, GsSolver, IslandSolver};
pub use crate::forces::Spring;
pub use crate::math::{Vector2, Matrix2};

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        /// A shape was constructed from degenerate data
        #[error("Invalid geometry: {0}")]
        InvalidGeometry(String),

        /// A broad-phase or narrow-phase strategy was handed a shape it cannot process
        #[error("Unsupported shape in {context}: {shape}")]
        UnsupportedShape {
            context: &'static str,
            shape: &'static str,
        },

        /// A serialized world carries a version tag that cannot be upgraded
        #[error("Unsupported serialization version: {0}")]
        SerializationVersion(String),

        /// A serialized world is structurally invalid
        #[error("Serialization error: {0}")]
        Serialization(String),

        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),
    }

    impl From<serde_json::Error> for PhysicsError {
        fn from(err: serde_json::Error) -> Self {
            PhysicsError::Serialization(err.to_string())
        }
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
