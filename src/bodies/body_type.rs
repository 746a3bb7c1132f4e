use serde::{Serialize, Deserialize};

/// Motion state of a rigid body, determining how it behaves in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Dynamic bodies are fully simulated (affected by forces, contacts and constraints)
    #[default]
    Dynamic,

    /// Static bodies never move
    Static,

    /// Kinematic bodies move with their velocity but ignore forces and impulses
    Kinematic,
}

impl MotionState {
    /// Returns true for dynamic bodies
    #[inline]
    pub fn is_dynamic(self) -> bool {
        self == MotionState::Dynamic
    }

    /// Returns true for static bodies
    #[inline]
    pub fn is_static(self) -> bool {
        self == MotionState::Static
    }
}
