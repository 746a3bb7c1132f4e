use crate::math::Vector2;

use serde::{Serialize, Deserialize};

/// How contacts are matched against the previous step to decide whether they are first impacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImpactMatching {
    /// Any contact between the same two bodies counts as continuing
    BodyPair,

    /// Only a contact between the same two shapes counts as continuing
    #[default]
    ShapePair,
}

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Gravity acceleration applied to every dynamic body
    pub gravity: Vector2,

    /// Friction used when no contact material matches a shape pair
    pub default_friction: f32,

    /// Whether springs add their forces each step
    pub apply_spring_forces: bool,

    /// Whether body damping is applied each step
    pub apply_damping: bool,

    /// Whether equations are solved; turning this off leaves contacts unresolved
    pub solve_constraints: bool,

    /// Whether `Impact` events are emitted for first contacts
    pub emit_impact_event: bool,

    /// How first impacts are detected
    pub impact_matching: ImpactMatching,

    /// Records the wall-clock duration of every step
    pub profile: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, -9.78),
            default_friction: 0.3,
            apply_spring_forces: true,
            apply_damping: true,
            solve_constraints: true,
            emit_impact_event: true,
            impact_matching: ImpactMatching::ShapePair,
            profile: false,
        }
    }
}
