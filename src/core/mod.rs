pub mod world;
pub mod config;
pub mod storage;
pub mod events;
pub mod serialization;

pub use self::world::{PhysicsWorld, WorldOptions};
pub use self::config::{SimulationConfig, ImpactMatching};
pub use self::storage::{BodyStorage, ConstraintStorage, SpringStorage, Storage, HandleStorage, Handle};
pub use self::events::{EventQueue, WorldEvent, WorldEventType, CommandBuffer, EventListener};
pub use self::serialization::{CURRENT_VERSION, upgrade_json};

use serde::{Serialize, Deserialize};
use std::fmt;

/// A unique identifier for a body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyHandle(pub(crate) u32);

/// A unique identifier for a constraint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u32);

/// A unique identifier for a spring in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpringHandle(pub(crate) u32);

impl BodyHandle {
    /// Returns the numeric id of the body
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl ConstraintHandle {
    /// Returns the numeric id of the constraint
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl SpringHandle {
    /// Returns the numeric id of the spring
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}
