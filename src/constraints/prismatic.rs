use crate::constraints::Constraint;
use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::equations::{ContactData, Equation, EquationKind};
use crate::math::Vector2;
use std::any::Any;
use std::f32::consts::FRAC_PI_2;

const TRANSLATION: usize = 0;
const ROTATION: usize = 1;
const MOTOR: usize = 2;
const UPPER: usize = 3;
const LOWER: usize = 4;

/// A slider joint: body B may only translate along an axis fixed in body A.
///
/// The relative rotation is locked unless `disable_rotational_lock` is set.
/// Limits bound the anchor separation along the axis, and a motor can drive it.
#[derive(Debug, Clone)]
pub struct PrismaticConstraint {
    /// The bodies involved in the constraint
    bodies: [BodyHandle; 2],

    /// The slide axis in body A's local frame
    local_axis_a: Vector2,

    /// The anchor point on the first body (in local space)
    local_anchor_a: Vector2,

    /// The anchor point on the second body (in local space)
    local_anchor_b: Vector2,

    /// Maximum force of the translation and rotation equations
    max_force: f32,

    /// Leaves the relative rotation free
    disable_rotational_lock: bool,

    /// The lower limit of the anchor separation along the axis
    lower_limit: Option<f32>,

    /// The upper limit of the anchor separation along the axis
    upper_limit: Option<f32>,

    /// Anchor separation along the axis at the last update
    position: f32,

    /// Equations: translation, rotation lock, motor, upper limit, lower limit
    equations: Vec<Equation>,
}

impl PrismaticConstraint {
    /// Creates a slider along body A's local x axis with anchors at the body origins
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        let max_force = f32::MAX;

        let mut motor = Equation::new(body_a, body_b, -max_force, max_force);
        motor.enabled = false;

        let mut upper = Equation::contact(body_a, body_b, ContactData::new(Vector2::zero(), Vector2::zero(), Vector2::unit_x()));
        upper.max_force = max_force;
        upper.enabled = false;

        let lower = upper;

        Self {
            bodies: [body_a, body_b],
            local_axis_a: Vector2::unit_x(),
            local_anchor_a: Vector2::zero(),
            local_anchor_b: Vector2::zero(),
            max_force,
            disable_rotational_lock: false,
            lower_limit: None,
            upper_limit: None,
            position: 0.0,
            equations: vec![
                Equation::new(body_a, body_b, -max_force, max_force),
                Equation::rotational_lock(body_a, body_b, 0.0),
                motor,
                upper,
                lower,
            ],
        }
    }

    /// Sets the local slide axis of body A, builder style
    pub fn with_local_axis(mut self, local_axis_a: Vector2) -> Self {
        let axis = local_axis_a.normalize();
        if !axis.is_zero() {
            self.local_axis_a = axis;
        }
        self
    }

    /// Sets the local anchors, builder style
    pub fn with_local_anchors(mut self, local_anchor_a: Vector2, local_anchor_b: Vector2) -> Self {
        self.local_anchor_a = local_anchor_a;
        self.local_anchor_b = local_anchor_b;
        self
    }

    /// Sets the maximum force, builder style
    pub fn with_max_force(mut self, max_force: f32) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Frees the relative rotation, builder style
    pub fn without_rotational_lock(mut self) -> Self {
        self.set_rotational_lock(false);
        self
    }

    /// Gets the local slide axis of body A
    pub fn get_local_axis_a(&self) -> Vector2 {
        self.local_axis_a
    }

    /// Gets the local anchor on the first body
    pub fn get_local_anchor_a(&self) -> Vector2 {
        self.local_anchor_a
    }

    /// Gets the local anchor on the second body
    pub fn get_local_anchor_b(&self) -> Vector2 {
        self.local_anchor_b
    }

    /// Gets the maximum force
    pub fn get_max_force(&self) -> f32 {
        self.max_force
    }

    /// Sets the maximum force of the translation and rotation equations
    pub fn set_max_force(&mut self, max_force: f32) {
        self.max_force = max_force.abs();
        self.equations[TRANSLATION].set_max_force(self.max_force);
        self.equations[ROTATION].set_max_force(self.max_force);
        self.equations[UPPER].max_force = self.max_force;
        self.equations[LOWER].max_force = self.max_force;
    }

    /// Returns whether the relative rotation is locked
    pub fn has_rotational_lock(&self) -> bool {
        !self.disable_rotational_lock
    }

    /// Locks or frees the relative rotation
    pub fn set_rotational_lock(&mut self, locked: bool) {
        self.disable_rotational_lock = !locked;
        self.equations[ROTATION].enabled = locked;
    }

    /// Sets both translation limits
    pub fn set_limits(&mut self, lower: f32, upper: f32) {
        self.lower_limit = Some(lower);
        self.upper_limit = Some(upper);
    }

    /// Sets or clears the lower translation limit
    pub fn set_lower_limit(&mut self, lower: Option<f32>) {
        self.lower_limit = lower;
    }

    /// Sets or clears the upper translation limit
    pub fn set_upper_limit(&mut self, upper: Option<f32>) {
        self.upper_limit = upper;
    }

    /// Returns the lower translation limit
    pub fn get_lower_limit(&self) -> Option<f32> {
        self.lower_limit
    }

    /// Returns the upper translation limit
    pub fn get_upper_limit(&self) -> Option<f32> {
        self.upper_limit
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

    /// Gets the target sliding speed of anchor B relative to anchor A
    pub fn get_motor_speed(&self) -> f32 {
        -self.equations[MOTOR].relative_velocity
    }

    /// Sets the target sliding speed of anchor B relative to anchor A
    pub fn set_motor_speed(&mut self, speed: f32) {
        self.equations[MOTOR].relative_velocity = -speed;
    }

    /// Anchor separation along the axis at the last update
    pub fn get_position(&self) -> f32 {
        self.position
    }
}

impl Constraint for PrismaticConstraint {
    fn constraint_type(&self) -> &'static str {
        "PrismaticConstraint"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    fn update(&mut self, body_a: &RigidBody, body_b: &RigidBody) {
        let ri = self.local_anchor_a.rotate(body_a.angle);
        let rj = self.local_anchor_b.rotate(body_b.angle);
        let world_anchor_a = body_a.position + ri;
        let world_anchor_b = body_b.position + rj;
        let axis = self.local_axis_a.rotate(body_a.angle);

        // Perpendicular offset of the anchors must stay zero
        let gg = world_anchor_b - world_anchor_a;
        let t = self.local_axis_a.rotate(body_a.angle + FRAC_PI_2);
        let translation = &mut self.equations[TRANSLATION];
        translation.g = [-t.x, -t.y, -ri.cross(&t) + t.cross(&gg), t.x, t.y, rj.cross(&t)];
        translation.kind = EquationKind::Generic { position_error: gg.dot(&t) };

        self.equations[ROTATION].enabled = !self.disable_rotational_lock;

        let motor = &mut self.equations[MOTOR];
        motor.g = [-axis.x, -axis.y, -ri.cross(&axis), axis.x, axis.y, rj.cross(&axis)];

        let position = world_anchor_b.dot(&axis) - world_anchor_a.dot(&axis);
        self.position = position;

        match self.upper_limit {
            Some(limit) if position > limit => {
                let data = ContactData::new(ri + axis * limit, rj, -axis);
                let upper = &mut self.equations[UPPER];
                upper.kind = EquationKind::Contact(data);
                upper.update_jacobian();
                upper.enabled = true;
            }
            _ => self.equations[UPPER].enabled = false,
        }
        match self.lower_limit {
            Some(limit) if position < limit => {
                let data = ContactData::new(ri, rj - axis * limit, axis);
                let lower = &mut self.equations[LOWER];
                lower.kind = EquationKind::Contact(data);
                lower.update_jacobian();
                lower.enabled = true;
            }
            _ => self.equations[LOWER].enabled = false,
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
