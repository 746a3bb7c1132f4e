use crate::forces::ForceGenerator;
use crate::core::{BodyHandle, BodyStorage};
use crate::bodies::RigidBody;
use crate::math::Vector2;
use crate::Result;

use serde::{Serialize, Deserialize};

/// A damped Hookean spring between anchor points on two bodies.
///
/// The force along the anchor axis is `-k (len - rest_length) - d (u · axis)`
/// where `u` is the relative velocity of the anchor points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    /// The first body connected by the spring
    body_a: BodyHandle,

    /// The second body connected by the spring
    body_b: BodyHandle,

    /// The attachment point on the first body (in local space)
    local_anchor_a: Vector2,

    /// The attachment point on the second body (in local space)
    local_anchor_b: Vector2,

    /// The spring rest length
    rest_length: f32,

    /// The spring stiffness coefficient
    stiffness: f32,

    /// The spring damping coefficient
    damping: f32,

    /// The bodies affected by this spring (cached for quick lookup)
    #[serde(skip)]
    affected_bodies: Vec<BodyHandle>,
}

impl Spring {
    /// Creates a spring with rest length 1, stiffness 100 and damping 1
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a: Vector2::zero(),
            local_anchor_b: Vector2::zero(),
            rest_length: 1.0,
            stiffness: 100.0,
            damping: 1.0,
            affected_bodies: vec![body_a, body_b],
        }
    }

    /// Sets the rest length, builder style
    pub fn with_rest_length(mut self, rest_length: f32) -> Self {
        self.set_rest_length(rest_length);
        self
    }

    /// Sets the stiffness, builder style
    pub fn with_stiffness(mut self, stiffness: f32) -> Self {
        self.set_stiffness(stiffness);
        self
    }

    /// Sets the damping, builder style
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.set_damping(damping);
        self
    }

    /// Sets both local anchors, builder style
    pub fn with_local_anchors(mut self, local_anchor_a: Vector2, local_anchor_b: Vector2) -> Self {
        self.local_anchor_a = local_anchor_a;
        self.local_anchor_b = local_anchor_b;
        self
    }

    /// Returns the first body
    pub fn get_body_a(&self) -> BodyHandle {
        self.body_a
    }

    /// Returns the second body
    pub fn get_body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// Gets the spring rest length
    pub fn get_rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Sets the spring rest length
    pub fn set_rest_length(&mut self, rest_length: f32) {
        self.rest_length = rest_length.max(0.0);
    }

    /// Gets the spring stiffness coefficient
    pub fn get_stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Sets the spring stiffness coefficient
    pub fn set_stiffness(&mut self, stiffness: f32) {
        self.stiffness = stiffness.max(0.0);
    }

    /// Gets the spring damping coefficient
    pub fn get_damping(&self) -> f32 {
        self.damping
    }

    /// Sets the spring damping coefficient
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.max(0.0);
    }

    /// Gets the local anchor on body A
    pub fn get_local_anchor_a(&self) -> Vector2 {
        self.local_anchor_a
    }

    /// Gets the local anchor on body B
    pub fn get_local_anchor_b(&self) -> Vector2 {
        self.local_anchor_b
    }

    /// Sets the anchor on body A from a world point
    pub fn set_world_anchor_a(&mut self, world_point: Vector2, body_a: &RigidBody) {
        self.local_anchor_a = body_a.to_local_frame(world_point);
    }

    /// Sets the anchor on body B from a world point
    pub fn set_world_anchor_b(&mut self, world_point: Vector2, body_b: &RigidBody) {
        self.local_anchor_b = body_b.to_local_frame(world_point);
    }

    /// Computes the force the spring exerts on body B (body A receives the opposite)
    pub fn compute_force(&self, body_a: &RigidBody, body_b: &RigidBody) -> Vector2 {
        let world_anchor_a = body_a.to_world_frame(self.local_anchor_a);
        let world_anchor_b = body_b.to_world_frame(self.local_anchor_b);
        let ri = world_anchor_a - body_a.position;
        let rj = world_anchor_b - body_b.position;

        let r = world_anchor_b - world_anchor_a;
        let length = r.length();
        let r_unit = r.normalize();

        // Relative velocity of the anchor points
        let u = body_b.velocity + Vector2::cross_zv(body_b.angular_velocity, &rj)
            - body_a.velocity - Vector2::cross_zv(body_a.angular_velocity, &ri);

        r_unit * (-self.stiffness * (length - self.rest_length) - self.damping * u.dot(&r_unit))
    }

    /// Returns the world positions of both anchors
    pub fn get_world_anchors(&self, bodies: &BodyStorage<RigidBody>) -> Result<(Vector2, Vector2)> {
        let a = bodies.get_body(self.body_a)?;
        let b = bodies.get_body(self.body_b)?;
        Ok((a.to_world_frame(self.local_anchor_a), b.to_world_frame(self.local_anchor_b)))
    }

    pub(crate) fn refresh_affected_bodies(&mut self) {
        self.affected_bodies = vec![self.body_a, self.body_b];
    }
}

impl ForceGenerator for Spring {
    fn generator_type(&self) -> &'static str {
        "Spring"
    }

    fn apply_forces(&self, bodies: &mut BodyStorage<RigidBody>) -> Result<()> {
        let (body_a, body_b) = bodies.get_pair_mut(self.body_a, self.body_b)?;
        let force = self.compute_force(body_a, body_b);

        let ri = body_a.to_world_frame(self.local_anchor_a) - body_a.position;
        let rj = body_b.to_world_frame(self.local_anchor_b) - body_b.position;

        body_a.force -= force;
        body_b.force += force;
        body_a.angular_force -= ri.cross(&force);
        body_b.angular_force += rj.cross(&force);

        Ok(())
    }

    fn get_affected_bodies(&self) -> &[BodyHandle] {
        &self.affected_bodies
    }
}
