use crate::constraints::Constraint;
use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::equations::{Equation, EquationKind};
use crate::math::Vector2;
use std::any::Any;

const X: usize = 0;
const Y: usize = 1;
const ROTATION: usize = 2;

/// Welds two bodies together.
///
/// Body B's origin is held at `local_offset_b` in body A's frame and its
/// angle at `angle_a + local_angle_b`.
#[derive(Debug, Clone)]
pub struct LockConstraint {
    /// The bodies involved in the constraint
    bodies: [BodyHandle; 2],

    /// Position of body B in body A's local frame
    local_offset_b: Vector2,

    /// Angle of body B relative to body A
    local_angle_b: f32,

    /// Maximum force of every equation
    max_force: f32,

    /// Equations: x, y, rotation
    equations: Vec<Equation>,
}

impl LockConstraint {
    /// Creates a lock with an explicit relative pose
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, local_offset_b: Vector2, local_angle_b: f32) -> Self {
        let max_force = f32::MAX;
        Self {
            bodies: [body_a, body_b],
            local_offset_b,
            local_angle_b,
            max_force,
            equations: vec![
                Equation::new(body_a, body_b, -max_force, max_force),
                Equation::new(body_a, body_b, -max_force, max_force),
                Equation::rotational_lock(body_a, body_b, local_angle_b),
            ],
        }
    }

    /// Creates a lock that keeps the current relative pose of the two bodies
    pub fn from_bodies(handle_a: BodyHandle, body_a: &RigidBody, handle_b: BodyHandle, body_b: &RigidBody) -> Self {
        let offset = body_b.position.to_local_frame(&body_a.position, body_a.angle);
        Self::new(handle_a, handle_b, offset, body_b.angle - body_a.angle)
    }

    /// Sets the maximum force, builder style
    pub fn with_max_force(mut self, max_force: f32) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Gets the maximum force
    pub fn get_max_force(&self) -> f32 {
        self.max_force
    }

    /// Sets the maximum force of all three equations
    pub fn set_max_force(&mut self, max_force: f32) {
        self.max_force = max_force.abs();
        for eq in &mut self.equations {
            eq.set_max_force(self.max_force);
        }
    }

    /// Gets the position of body B in body A's frame
    pub fn get_local_offset_b(&self) -> Vector2 {
        self.local_offset_b
    }

    /// Sets the position of body B in body A's frame
    pub fn set_local_offset_b(&mut self, offset: Vector2) {
        self.local_offset_b = offset;
    }

    /// Gets the angle of body B relative to body A
    pub fn get_local_angle_b(&self) -> f32 {
        self.local_angle_b
    }

    /// Sets the angle of body B relative to body A
    pub fn set_local_angle_b(&mut self, angle: f32) {
        self.local_angle_b = angle;
    }
}

impl Constraint for LockConstraint {
    fn constraint_type(&self) -> &'static str {
        "LockConstraint"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    fn update(&mut self, body_a: &RigidBody, body_b: &RigidBody) {
        let l = self.local_offset_b.rotate(body_a.angle);
        let error = body_b.position - body_a.position - l;

        let x = &mut self.equations[X];
        x.g = [-1.0, 0.0, -l.cross(&Vector2::unit_x()), 1.0, 0.0, 0.0];
        x.kind = EquationKind::Generic { position_error: error.x };

        let y = &mut self.equations[Y];
        y.g = [0.0, -1.0, -l.cross(&Vector2::unit_y()), 0.0, 1.0, 0.0];
        y.kind = EquationKind::Generic { position_error: error.y };

        self.equations[ROTATION].kind = EquationKind::RotationalLock { angle: self.local_angle_b };
    }

    fn equations(&self) -> &[Equation] {
        &self.equations
    }

    fn equations_mut(&mut self) -> &mut [Equation] {
        &mut self.equations
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_constraint(&self) -> Box<dyn Constraint> {
        Box::new(self.clone())
    }
}
