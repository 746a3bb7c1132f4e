use std::collections::HashMap;

use crate::bodies::{MotionState, RigidBody};
use crate::core::{BodyHandle, BodyStorage, Storage};
use crate::math::Vector2;

/// Snapshot of the body state the constraint solver reads and writes.
///
/// The solver never touches `RigidBody` directly: it works on these copies so
/// that independent islands can be solved on separate threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverBody {
    pub handle: BodyHandle,
    pub position: Vector2,
    pub angle: f32,
    pub velocity: Vector2,
    pub angular_velocity: f32,
    pub force: Vector2,
    pub angular_force: f32,
    pub inv_mass: f32,
    pub inv_inertia: f32,
    pub vlambda: Vector2,
    pub wlambda: f32,
    pub motion_state: MotionState,
}

impl SolverBody {
    /// Captures the solver-relevant state of a body
    pub fn from_body(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            position: body.position,
            angle: body.angle,
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
            force: body.force,
            angular_force: body.angular_force,
            inv_mass: body.inv_mass,
            inv_inertia: body.inv_inertia,
            vlambda: body.vlambda,
            wlambda: body.wlambda,
            motion_state: body.motion_state,
        }
    }

    /// Copies the solved velocities back into the body
    pub fn write_back(&self, body: &mut RigidBody) {
        body.velocity = self.velocity;
        body.angular_velocity = self.angular_velocity;
        body.vlambda = self.vlambda;
        body.wlambda = self.wlambda;
    }

    /// Clears the velocity accumulators
    #[inline]
    pub fn reset_constraint_velocity(&mut self) {
        self.vlambda = Vector2::zero();
        self.wlambda = 0.0;
    }

    /// Adds the velocity accumulators into the velocity
    #[inline]
    pub fn add_constraint_velocity(&mut self) {
        self.velocity += self.vlambda;
        self.angular_velocity += self.wlambda;
    }
}

/// An ordered set of solver bodies addressable by handle
#[derive(Debug, Clone, Default)]
pub struct SolverBodySet {
    bodies: Vec<SolverBody>,
    index: HashMap<BodyHandle, usize>,
}

impl SolverBodySet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots every body of a storage, in storage order
    pub fn from_storage(storage: &BodyStorage<RigidBody>) -> Self {
        let mut set = Self::new();
        for (handle, body) in storage.iter() {
            set.push(SolverBody::from_body(handle, body));
        }
        set
    }

    /// Appends a body. A handle already present is ignored.
    pub fn push(&mut self, body: SolverBody) {
        if self.index.contains_key(&body.handle) {
            return;
        }
        self.index.insert(body.handle, self.bodies.len());
        self.bodies.push(body);
    }

    /// Returns the position of a handle in the set
    #[inline]
    pub fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.index.get(&handle).copied()
    }

    /// Returns the body stored under a handle
    pub fn get(&self, handle: BodyHandle) -> Option<&SolverBody> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    /// Returns the bodies in insertion order
    pub fn as_slice(&self) -> &[SolverBody] {
        &self.bodies
    }

    /// Returns the bodies in insertion order, mutably
    pub fn as_mut_slice(&mut self) -> &mut [SolverBody] {
        &mut self.bodies
    }

    /// Returns the number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Writes solved velocities back into a body storage. Static bodies are skipped.
    pub fn write_back(&self, storage: &mut BodyStorage<RigidBody>) {
        for solver_body in &self.bodies {
            if solver_body.motion_state.is_static() {
                continue;
            }
            if let Some(body) = storage.get_mut(solver_body.handle) {
                solver_body.write_back(body);
            }
        }
    }
}
