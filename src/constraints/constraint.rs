use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::equations::Equation;
use std::any::Any;

/// Base trait for physics constraints.
///
/// A constraint owns a fixed set of equations. Before every solve the world
/// calls `update` with the current state of both bodies; the enabled equations
/// are then handed to the solver and their multipliers copied back afterwards.
pub trait Constraint: Send + Sync + 'static {
    /// Returns the type name of the constraint
    fn constraint_type(&self) -> &'static str;

    /// Returns the bodies involved in the constraint
    fn get_bodies(&self) -> &[BodyHandle];

    /// Checks if the constraint involves a specific body
    fn involves_body(&self, body: BodyHandle) -> bool {
        self.get_bodies().contains(&body)
    }

    /// Refreshes Jacobians, position errors and limit activation
    fn update(&mut self, body_a: &RigidBody, body_b: &RigidBody);

    /// Returns all equations, enabled or not
    fn equations(&self) -> &[Equation];

    /// Returns all equations mutably
    fn equations_mut(&mut self) -> &mut [Equation];

    /// Sets the stiffness of every equation
    fn set_stiffness(&mut self, stiffness: f32) {
        for eq in self.equations_mut() {
            eq.set_stiffness(stiffness, eq.relaxation);
        }
    }

    /// Sets the relaxation of every equation
    fn set_relaxation(&mut self, relaxation: f32) {
        for eq in self.equations_mut() {
            eq.set_stiffness(eq.stiffness, relaxation);
        }
    }

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone the constraint to create a new box
    fn clone_constraint(&self) -> Box<dyn Constraint>;
}
