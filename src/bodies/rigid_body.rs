use crate::bodies::MotionState;
use crate::core::BodyHandle;
use crate::error::PhysicsError;
use crate::math::{Aabb, Vector2};
use crate::shapes::Shape;
use crate::Result;

/// Type alias for a handle to a rigid body
pub type RigidBodyHandle = BodyHandle;

/// A shape attached to a body at a fixed local offset and angle
#[derive(Debug, Clone)]
pub struct BodyShape {
    /// The attached shape
    pub shape: Shape,

    /// Offset of the shape origin in body-local space
    pub offset: Vector2,

    /// Rotation of the shape relative to the body
    pub angle: f32,
}

/// A rigid body for physics simulation
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// Handle assigned by the world when the body is added
    pub(crate) id: Option<BodyHandle>,

    /// The body's position in world space
    pub(crate) position: Vector2,

    /// The body's rotation in radians
    pub(crate) angle: f32,

    /// The body's linear velocity
    pub(crate) velocity: Vector2,

    /// The body's angular velocity
    pub(crate) angular_velocity: f32,

    /// Force accumulator, cleared after every step
    pub(crate) force: Vector2,

    /// Torque accumulator, cleared after every step
    pub(crate) angular_force: f32,

    /// The body's mass
    pub(crate) mass: f32,

    /// Inverse of the body's mass (zero for static and kinematic bodies)
    pub(crate) inv_mass: f32,

    /// Moment of inertia about the body origin
    pub(crate) inertia: f32,

    /// Inverse moment of inertia
    pub(crate) inv_inertia: f32,

    /// Solver scratch: accumulated linear velocity correction
    pub(crate) vlambda: Vector2,

    /// Solver scratch: accumulated angular velocity correction
    pub(crate) wlambda: f32,

    /// Attached shapes
    pub(crate) shapes: Vec<BodyShape>,

    /// Radius around `position` containing every attached shape
    pub(crate) bounding_radius: f32,

    /// The body's motion state
    pub(crate) motion_state: MotionState,

    /// Linear damping, velocity is scaled by `(1 - damping)^dt` every step
    pub(crate) damping: f32,

    /// Angular damping
    pub(crate) angular_damping: f32,

    /// Locks the rotation of the body
    pub(crate) fixed_rotation: bool,
}

impl RigidBody {
    /// Creates a new body. A mass of zero makes the body static.
    pub fn new(mass: f32, position: Vector2) -> Result<Self> {
        check_mass(mass)?;
        let motion_state = if mass > 0.0 { MotionState::Dynamic } else { MotionState::Static };
        Ok(Self::with_state(mass, position, motion_state))
    }

    /// Creates a new dynamic body
    pub fn new_dynamic(mass: f32, position: Vector2) -> Result<Self> {
        check_mass(mass)?;
        Ok(Self::with_state(mass, position, MotionState::Dynamic))
    }

    /// Creates a new static body
    pub fn new_static(position: Vector2) -> Self {
        Self::with_state(0.0, position, MotionState::Static)
    }

    /// Creates a new kinematic body
    pub fn new_kinematic(position: Vector2) -> Self {
        Self::with_state(0.0, position, MotionState::Kinematic)
    }

    fn with_state(mass: f32, position: Vector2, motion_state: MotionState) -> Self {
        let mut body = Self {
            id: None,
            position,
            angle: 0.0,
            velocity: Vector2::zero(),
            angular_velocity: 0.0,
            force: Vector2::zero(),
            angular_force: 0.0,
            mass,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            vlambda: Vector2::zero(),
            wlambda: 0.0,
            shapes: Vec::new(),
            bounding_radius: 0.0,
            motion_state,
            damping: 0.1,
            angular_damping: 0.1,
            fixed_rotation: false,
        };
        body.update_mass_properties();
        body
    }

    /// Attaches a shape and returns the body, builder style
    pub fn with_shape(mut self, shape: Shape, offset: Vector2, angle: f32) -> Self {
        self.add_shape(shape, offset, angle);
        self
    }

    /// Sets the angle, builder style
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Sets the velocity, builder style
    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets both damping coefficients, builder style
    pub fn with_damping(mut self, damping: f32, angular_damping: f32) -> Self {
        self.set_damping(damping);
        self.set_angular_damping(angular_damping);
        self
    }

    /// Attaches a shape at a local offset and angle, then recomputes mass properties
    pub fn add_shape(&mut self, shape: Shape, offset: Vector2, angle: f32) {
        self.shapes.push(BodyShape { shape, offset, angle });
        self.update_mass_properties();
        self.update_bounding_radius();
    }

    /// Detaches the shape with the given id. Returns the shape if it was attached.
    pub fn remove_shape(&mut self, shape_id: u32) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.shape.get_id() == shape_id)?;
        let removed = self.shapes.remove(index);
        self.update_mass_properties();
        self.update_bounding_radius();
        Some(removed.shape)
    }

    /// Recomputes inverse mass and inertia from the attached shapes.
    ///
    /// The mass is split evenly between shapes and every shape inertia is moved
    /// to the body origin with the parallel-axis theorem.
    pub fn update_mass_properties(&mut self) {
        let count = self.shapes.len();
        let shape_mass = if count > 0 { self.mass / count as f32 } else { 0.0 };

        self.inertia = self.shapes
            .iter()
            .map(|s| s.shape.compute_moment_of_inertia(shape_mass) + shape_mass * s.offset.length_squared())
            .sum();

        if self.motion_state.is_dynamic() && self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            self.inv_inertia = if self.inertia > 0.0 && !self.fixed_rotation { 1.0 / self.inertia } else { 0.0 };
        } else {
            self.inv_mass = 0.0;
            self.inv_inertia = 0.0;
        }
    }

    /// Recomputes the bounding radius from the attached shapes
    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = self.shapes
            .iter()
            .map(|s| s.offset.length() + s.shape.get_bounding_radius())
            .fold(0.0, f32::max);
    }

    /// Returns the handle assigned by the world, if the body was added to one
    pub fn get_id(&self) -> Option<BodyHandle> {
        self.id
    }

    /// Returns the body's position
    pub fn get_position(&self) -> Vector2 {
        self.position
    }

    /// Sets the body's position
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    /// Returns the body's angle
    pub fn get_angle(&self) -> f32 {
        self.angle
    }

    /// Sets the body's angle
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Returns the body's linear velocity
    pub fn get_velocity(&self) -> Vector2 {
        self.velocity
    }

    /// Sets the body's linear velocity
    pub fn set_velocity(&mut self, velocity: Vector2) {
        self.velocity = velocity;
    }

    /// Returns the body's angular velocity
    pub fn get_angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Sets the body's angular velocity
    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    /// Returns the accumulated force
    pub fn get_force(&self) -> Vector2 {
        self.force
    }

    /// Returns the accumulated torque
    pub fn get_angular_force(&self) -> f32 {
        self.angular_force
    }

    /// Returns the body's mass
    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    /// Sets the body's mass and recomputes the derived properties
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        check_mass(mass)?;
        self.mass = mass;
        self.update_mass_properties();
        Ok(())
    }

    /// Returns the body's inverse mass
    pub fn get_inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Returns the body's moment of inertia
    pub fn get_inertia(&self) -> f32 {
        self.inertia
    }

    /// Returns the body's inverse moment of inertia
    pub fn get_inverse_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Returns the body's motion state
    pub fn get_motion_state(&self) -> MotionState {
        self.motion_state
    }

    /// Sets the motion state and updates mass properties accordingly
    pub fn set_motion_state(&mut self, motion_state: MotionState) {
        self.motion_state = motion_state;
        if motion_state.is_static() {
            self.velocity = Vector2::zero();
            self.angular_velocity = 0.0;
        }
        self.update_mass_properties();
    }

    /// Returns the body's linear damping
    pub fn get_damping(&self) -> f32 {
        self.damping
    }

    /// Sets the body's linear damping, clamped to `[0, 1]`
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    /// Returns the body's angular damping
    pub fn get_angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Sets the body's angular damping, clamped to `[0, 1]`
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping.clamp(0.0, 1.0);
    }

    /// Returns whether rotation is locked
    pub fn is_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Locks or unlocks the rotation of the body
    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.fixed_rotation = fixed;
        self.update_mass_properties();
    }

    /// Returns the attached shapes
    pub fn get_shapes(&self) -> &[BodyShape] {
        &self.shapes
    }

    /// Returns the bounding radius
    pub fn get_bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Returns the bounding box around the bounding circle
    pub fn get_aabb(&self) -> Aabb {
        Aabb::from_circle(self.position, self.bounding_radius)
    }

    /// Returns the world position and angle of an attached shape
    pub fn get_shape_transform(&self, index: usize) -> Option<(Vector2, f32)> {
        self.shapes.get(index).map(|s| {
            (s.offset.to_global_frame(&self.position, self.angle), self.angle + s.angle)
        })
    }

    /// Returns true for dynamic bodies
    pub fn is_dynamic(&self) -> bool {
        self.motion_state.is_dynamic()
    }

    /// Returns true for static bodies
    pub fn is_static(&self) -> bool {
        self.motion_state.is_static()
    }

    /// Returns true for kinematic bodies
    pub fn is_kinematic(&self) -> bool {
        self.motion_state == MotionState::Kinematic
    }

    /// Adds a force at the centre of mass
    pub fn apply_force(&mut self, force: Vector2) {
        self.force += force;
    }

    /// Adds a force at a world point, producing torque about the centre of mass
    pub fn apply_force_at_point(&mut self, force: Vector2, world_point: Vector2) {
        self.force += force;
        self.angular_force += (world_point - self.position).cross(&force);
    }

    /// Adds a torque
    pub fn apply_torque(&mut self, torque: f32) {
        self.angular_force += torque;
    }

    /// Clears the force and torque accumulators
    pub fn set_zero_force(&mut self) {
        self.force = Vector2::zero();
        self.angular_force = 0.0;
    }

    /// Transforms a body-local point into world space
    pub fn to_world_frame(&self, local_point: Vector2) -> Vector2 {
        local_point.to_global_frame(&self.position, self.angle)
    }

    /// Transforms a world point into body-local space
    pub fn to_local_frame(&self, world_point: Vector2) -> Vector2 {
        world_point.to_local_frame(&self.position, self.angle)
    }

    /// Velocity of a world point attached to the body
    pub fn get_velocity_at_point(&self, world_point: Vector2) -> Vector2 {
        self.velocity + Vector2::cross_zv(self.angular_velocity, &(world_point - self.position))
    }

    /// Clears the solver velocity accumulators
    pub fn reset_constraint_velocity(&mut self) {
        self.vlambda = Vector2::zero();
        self.wlambda = 0.0;
    }

    /// Adds the solver velocity accumulators into the real velocity
    pub fn add_constraint_velocity(&mut self) {
        self.velocity += self.vlambda;
        self.angular_velocity += self.wlambda;
    }

    /// Scales the velocities by `(1 - damping)^dt`
    pub fn apply_damping(&mut self, dt: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity *= (1.0 - self.damping).powf(dt);
        self.angular_velocity *= (1.0 - self.angular_damping).powf(dt);
    }
}

fn check_mass(mass: f32) -> Result<()> {
    if !mass.is_finite() || mass < 0.0 {
        return Err(PhysicsError::InvalidParameter(format!("mass must be finite and non-negative, got {}", mass)));
    }
    Ok(())
}
