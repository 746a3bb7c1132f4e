use crate::constraints::Constraint;
use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::equations::{Equation, EquationKind};
use crate::math::Vector2;
use std::any::Any;

const X: usize = 0;
const Y: usize = 1;
const MOTOR: usize = 2;
const UPPER: usize = 3;
const LOWER: usize = 4;

/// Pins a point on one body to a point on another, leaving rotation free.
///
/// Optionally drives the relative angular velocity with a motor and keeps the
/// relative angle `angle_b - angle_a` between a lower and an upper limit.
#[derive(Debug, Clone)]
pub struct PointToPointConstraint {
    /// The bodies involved in the constraint
    bodies: [BodyHandle; 2],

    /// The pivot point on the first body (in local space)
    pivot_a: Vector2,

    /// The pivot point on the second body (in local space)
    pivot_b: Vector2,

    /// Maximum force of the pivot equations
    max_force: f32,

    /// The lower limit of the relative angle (in radians)
    lower_limit: Option<f32>,

    /// The upper limit of the relative angle (in radians)
    upper_limit: Option<f32>,

    /// Relative angle measured by the last update
    relative_angle: f32,

    /// Equations: x, y, motor, upper limit, lower limit
    equations: Vec<Equation>,
}

impl PointToPointConstraint {
    /// Creates a new constraint joining `pivot_a` on body A to `pivot_b` on body B
    pub fn new(body_a: BodyHandle, pivot_a: Vector2, body_b: BodyHandle, pivot_b: Vector2) -> Self {
        let max_force = f32::MAX;

        let mut motor = Equation::rotational_velocity(body_a, body_b, 1.0);
        motor.enabled = false;

        let mut upper = Equation::rotational_lock(body_a, body_b, 0.0);
        upper.min_force = 0.0;
        upper.enabled = false;

        let mut lower = Equation::rotational_lock(body_a, body_b, 0.0);
        lower.max_force = 0.0;
        lower.enabled = false;

        Self {
            bodies: [body_a, body_b],
            pivot_a,
            pivot_b,
            max_force,
            lower_limit: None,
            upper_limit: None,
            relative_angle: 0.0,
            equations: vec![
                Equation::new(body_a, body_b, -max_force, max_force),
                Equation::new(body_a, body_b, -max_force, max_force),
                motor,
                upper,
                lower,
            ],
        }
    }

    /// Sets the maximum force, builder style
    pub fn with_max_force(mut self, max_force: f32) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Gets the pivot on the first body
    pub fn get_pivot_a(&self) -> Vector2 {
        self.pivot_a
    }

    /// Gets the pivot on the second body
    pub fn get_pivot_b(&self) -> Vector2 {
        self.pivot_b
    }

    /// Gets the maximum force of the pivot equations
    pub fn get_max_force(&self) -> f32 {
        self.max_force
    }

    /// Sets the maximum force of the pivot equations
    pub fn set_max_force(&mut self, max_force: f32) {
        self.max_force = max_force.abs();
        self.equations[X].set_max_force(self.max_force);
        self.equations[Y].set_max_force(self.max_force);
    }

    /// Enables the motor
    pub fn enable_motor(&mut self) {
        self.equations[MOTOR].enabled = true;
    }

    /// Disables the motor
    pub fn disable_motor(&mut self) {
        self.equations[MOTOR].enabled = false;
    }

    /// Returns whether the motor is enabled
    pub fn is_motor_enabled(&self) -> bool {
        self.equations[MOTOR].enabled
    }

    /// Gets the target relative angular velocity `w_b - w_a`
    pub fn get_motor_speed(&self) -> f32 {
        -self.equations[MOTOR].relative_velocity
    }

    /// Sets the target relative angular velocity `w_b - w_a`
    pub fn set_motor_speed(&mut self, speed: f32) {
        self.equations[MOTOR].relative_velocity = -speed;
    }

    /// Gets the maximum torque of the motor
    pub fn get_motor_max_force(&self) -> f32 {
        self.equations[MOTOR].max_force
    }

    /// Sets the maximum torque of the motor
    pub fn set_motor_max_force(&mut self, max_force: f32) {
        self.equations[MOTOR].set_max_force(max_force.abs());
    }

    /// Sets both angle limits
    pub fn set_limits(&mut self, lower: f32, upper: f32) {
        self.lower_limit = Some(lower);
        self.upper_limit = Some(upper);
    }

    /// Sets or clears the lower angle limit
    pub fn set_lower_limit(&mut self, lower: Option<f32>) {
        self.lower_limit = lower;
    }

    /// Sets or clears the upper angle limit
    pub fn set_upper_limit(&mut self, upper: Option<f32>) {
        self.upper_limit = upper;
    }

    /// Returns the lower angle limit
    pub fn get_lower_limit(&self) -> Option<f32> {
        self.lower_limit
    }

    /// Returns the upper angle limit
    pub fn get_upper_limit(&self) -> Option<f32> {
        self.upper_limit
    }

    /// Relative angle `angle_b - angle_a` at the last update
    pub fn get_relative_angle(&self) -> f32 {
        self.relative_angle
    }
}

impl Constraint for PointToPointConstraint {
    fn constraint_type(&self) -> &'static str {
        "PointToPointConstraint"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    fn update(&mut self, body_a: &RigidBody, body_b: &RigidBody) {
        let relative_angle = body_b.angle - body_a.angle;
        self.relative_angle = relative_angle;

        match self.upper_limit {
            Some(limit) if relative_angle > limit => {
                self.equations[UPPER].kind = EquationKind::RotationalLock { angle: limit };
                self.equations[UPPER].enabled = true;
            }
            _ => self.equations[UPPER].enabled = false,
        }
        match self.lower_limit {
            Some(limit) if relative_angle < limit => {
                self.equations[LOWER].kind = EquationKind::RotationalLock { angle: limit };
                self.equations[LOWER].enabled = true;
            }
            _ => self.equations[LOWER].enabled = false,
        }

        let world_pivot_a = self.pivot_a.rotate(body_a.angle);
        let world_pivot_b = self.pivot_b.rotate(body_b.angle);
        let g = body_b.position + world_pivot_b - body_a.position - world_pivot_a;

        for (index, axis) in [(X, Vector2::unit_x()), (Y, Vector2::unit_y())] {
            let eq = &mut self.equations[index];
            eq.g = [
                -axis.x,
                -axis.y,
                -world_pivot_a.cross(&axis),
                axis.x,
                axis.y,
                world_pivot_b.cross(&axis),
            ];
            eq.kind = EquationKind::Generic { position_error: g.dot(&axis) };
        }
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
