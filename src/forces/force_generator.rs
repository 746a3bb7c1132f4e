use crate::core::{BodyHandle, BodyStorage};
use crate::bodies::RigidBody;
use crate::Result;

/// Base trait for force generators that can apply forces to bodies
pub trait ForceGenerator: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the type name of the force generator
    fn generator_type(&self) -> &'static str;

    /// Adds this generator's forces to the bodies' accumulators
    fn apply_forces(&self, bodies: &mut BodyStorage<RigidBody>) -> Result<()>;

    /// Returns the bodies affected by this force generator
    fn get_affected_bodies(&self) -> &[BodyHandle];

    /// Returns true if the force generator affects the given body
    fn affects_body(&self, body: BodyHandle) -> bool {
        self.get_affected_bodies().contains(&body)
    }
}
