use crate::constraints::Constraint;
use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::equations::{Equation, EquationKind};
use crate::math::Vector2;
use std::any::Any;

/// A distance constraint maintains a fixed distance between two points on different bodies
#[derive(Debug, Clone)]
pub struct DistanceConstraint {
    /// The bodies involved in the constraint
    bodies: [BodyHandle; 2],

    /// The anchor point on the first body (in local space)
    local_anchor_a: Vector2,

    /// The anchor point on the second body (in local space)
    local_anchor_b: Vector2,

    /// The desired distance between the anchor points
    distance: f32,

    /// Maximum force the constraint may apply
    max_force: f32,

    equations: Vec<Equation>,
}

impl DistanceConstraint {
    /// Creates a new distance constraint between the body origins
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, distance: f32) -> Self {
        let max_force = f32::MAX;
        Self {
            bodies: [body_a, body_b],
            local_anchor_a: Vector2::zero(),
            local_anchor_b: Vector2::zero(),
            distance: distance.max(0.0),
            max_force,
            equations: vec![Equation::new(body_a, body_b, -max_force, max_force)],
        }
    }

    /// Creates a constraint that keeps the current distance between the body origins
    pub fn from_bodies(handle_a: BodyHandle, body_a: &RigidBody, handle_b: BodyHandle, body_b: &RigidBody) -> Self {
        Self::new(handle_a, handle_b, body_a.position.distance(&body_b.position))
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

    /// Gets the desired distance
    pub fn get_distance(&self) -> f32 {
        self.distance
    }

    /// Sets the desired distance
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(0.0);
    }

    /// Gets the maximum force
    pub fn get_max_force(&self) -> f32 {
        self.max_force
    }

    /// Sets the maximum force
    pub fn set_max_force(&mut self, max_force: f32) {
        self.max_force = max_force.abs();
        self.equations[0].set_max_force(self.max_force);
    }

    /// Gets the local anchor on the first body
    pub fn get_local_anchor_a(&self) -> Vector2 {
        self.local_anchor_a
    }

    /// Gets the local anchor on the second body
    pub fn get_local_anchor_b(&self) -> Vector2 {
        self.local_anchor_b
    }

    /// Returns the force applied during the last step
    pub fn get_multiplier(&self) -> f32 {
        self.equations[0].multiplier
    }
}

impl Constraint for DistanceConstraint {
    fn constraint_type(&self) -> &'static str {
        "DistanceConstraint"
    }

    fn get_bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    fn update(&mut self, body_a: &RigidBody, body_b: &RigidBody) {
        let ri = self.local_anchor_a.rotate(body_a.angle);
        let rj = self.local_anchor_b.rotate(body_b.angle);
        let r = body_b.position + rj - body_a.position - ri;
        let length = r.length();
        let n = r.normalize();

        let eq = &mut self.equations[0];
        if n.is_zero() {
            eq.g = [0.0; 6];
            eq.kind = EquationKind::Generic { position_error: 0.0 };
            return;
        }

        eq.g = [-n.x, -n.y, -ri.cross(&n), n.x, n.y, rj.cross(&n)];
        eq.kind = EquationKind::Generic { position_error: length - self.distance };
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
