use crate::core::{
    BodyHandle, ConstraintHandle, SpringHandle, SimulationConfig, EventQueue, WorldEvent,
    CommandBuffer, EventListener, BodyStorage, ConstraintStorage, SpringStorage,
};
use crate::core::events::Command;
use crate::core::storage::Storage;
use crate::bodies::{RigidBody, Material, ContactMaterial};
use crate::collision::{BroadPhase, NaiveBroadPhase, NarrowPhase, ShapeContext};
use crate::constraints::Constraint;
use crate::equations::{SolverBodySet, DEFAULT_RELAXATION, DEFAULT_STIFFNESS};
use crate::error::PhysicsError;
use crate::forces::{ForceGenerator, Spring};
use crate::integration::{Integrator, SymplecticEulerIntegrator};
use crate::math::Vector2;
use crate::shapes::Shape;
use crate::solver::{GsSolver, IslandSolver, Solver};
use crate::Result;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Optional overrides used when building a world
#[derive(Default)]
pub struct WorldOptions {
    /// Solver to use instead of the default Gauss-Seidel solver
    pub solver: Option<Box<dyn Solver>>,

    /// Gravity to use instead of the configured default
    pub gravity: Option<Vector2>,

    /// Broad-phase to use instead of the naive one
    pub broadphase: Option<Box<dyn BroadPhase>>,
}

/// Where an equation handed to the solver came from
#[derive(Debug, Clone, Copy)]
enum EquationSource {
    Contact(usize),
    Friction(usize),
    Constraint(ConstraintHandle, usize),
}

/// Surface parameters resolved for one pair of shapes
struct SurfaceParams {
    friction: f32,
    restitution: f32,
    stiffness: f32,
    relaxation: f32,
    friction_stiffness: f32,
    friction_relaxation: f32,
    surface_velocity: f32,
}

impl SurfaceParams {
    fn resolve(materials: &[ContactMaterial], a: &Shape, b: &Shape, default_friction: f32) -> Self {
        let matched = match (a.material, b.material) {
            (Some(ma), Some(mb)) => materials.iter().find(|cm| cm.matches(ma, mb)),
            _ => None,
        };
        match matched {
            Some(cm) => Self {
                friction: cm.friction,
                restitution: cm.restitution,
                stiffness: cm.stiffness,
                relaxation: cm.relaxation,
                friction_stiffness: cm.friction_stiffness,
                friction_relaxation: cm.friction_relaxation,
                surface_velocity: cm.surface_velocity,
            },
            None => Self {
                friction: default_friction,
                restitution: 0.0,
                stiffness: DEFAULT_STIFFNESS,
                relaxation: DEFAULT_RELAXATION,
                friction_stiffness: DEFAULT_STIFFNESS,
                friction_relaxation: DEFAULT_RELAXATION,
                surface_velocity: 0.0,
            },
        }
    }
}

/// The main physics world that owns every body, spring and constraint and advances the simulation
pub struct PhysicsWorld {
    /// All rigid bodies in the world, in insertion order
    pub(crate) bodies: BodyStorage<RigidBody>,

    /// All springs in the world
    pub(crate) springs: SpringStorage<Spring>,

    /// All constraints in the world
    pub(crate) constraints: ConstraintStorage<Box<dyn Constraint>>,

    /// Contact materials, searched in insertion order
    pub(crate) contact_materials: Vec<ContactMaterial>,

    pub(crate) solver: Box<dyn Solver>,

    pub(crate) broadphase: Box<dyn BroadPhase>,

    pub(crate) narrowphase: NarrowPhase,

    integrator: Box<dyn Integrator>,

    /// Configuration for the simulation
    pub(crate) config: SimulationConfig,

    /// Queue of world events, drained by the caller
    events: EventQueue,

    /// Callbacks invoked for every event
    listeners: Vec<EventListener>,

    /// Changes requested by listeners, applied after the step
    pending: CommandBuffer,

    /// The total elapsed simulation time
    pub(crate) time: f32,

    /// The time step of the last call to `step`
    last_time_step: f32,

    /// Wall-clock duration of the last step, when profiling
    last_step_duration: Option<Duration>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            springs: SpringStorage::new(),
            constraints: ConstraintStorage::new(),
            contact_materials: Vec::new(),
            solver: Box::new(GsSolver::new()),
            broadphase: Box::new(NaiveBroadPhase::new()),
            narrowphase: NarrowPhase::new(),
            integrator: Box::new(SymplecticEulerIntegrator::new()),
            config,
            events: EventQueue::new(),
            listeners: Vec::new(),
            pending: CommandBuffer::new(),
            time: 0.0,
            last_time_step: 1.0 / 60.0,
            last_step_duration: None,
        }
    }

    /// Creates a new physics world, replacing the defaults named in `options`
    pub fn with_options(options: WorldOptions) -> Self {
        let mut world = Self::new();
        if let Some(solver) = options.solver {
            world.solver = solver;
        }
        if let Some(gravity) = options.gravity {
            world.config.gravity = gravity;
        }
        if let Some(broadphase) = options.broadphase {
            world.broadphase = broadphase;
        }
        world
    }

    /// Adds a body to the world and returns its handle
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = self.bodies.add(body);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.id = Some(handle);
        }
        self.broadphase.on_body_added(handle);
        debug!(body = %handle, "added body");
        self.emit(WorldEvent::AddBody { body: handle });
        handle
    }

    /// Removes a body from the world.
    ///
    /// Springs and constraints attached to the body are removed with it.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        if !self.bodies.contains(handle) {
            return Err(PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)));
        }

        let constraints: Vec<ConstraintHandle> = self
            .constraints
            .iter()
            .filter(|(_, c)| c.involves_body(handle))
            .map(|(h, _)| h)
            .collect();
        for constraint in constraints {
            self.constraints.remove(constraint);
        }

        let springs: Vec<SpringHandle> = self
            .springs
            .iter()
            .filter(|(_, s)| s.affects_body(handle))
            .map(|(h, _)| h)
            .collect();
        for spring in springs {
            self.springs.remove(spring);
        }

        self.broadphase.on_body_removed(handle);
        let mut body = self
            .bodies
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))?;
        body.id = None;

        debug!(body = %handle, "removed body");
        self.emit(WorldEvent::RemoveBody { body: handle });
        Ok(body)
    }

    /// Adds a constraint between two bodies already in the world
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<ConstraintHandle> {
        for &body in constraint.get_bodies() {
            if !self.bodies.contains(body) {
                return Err(PhysicsError::ResourceNotFound(format!(
                    "{} refers to missing body {:?}",
                    constraint.constraint_type(),
                    body
                )));
            }
        }
        debug!(kind = constraint.constraint_type(), "added constraint");
        Ok(self.constraints.add(constraint))
    }

    /// Removes a constraint from the world
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Box<dyn Constraint>> {
        self.constraints
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Constraint with handle {:?} not found", handle)))
    }

    /// Adds a spring between two bodies already in the world
    pub fn add_spring(&mut self, mut spring: Spring) -> Result<SpringHandle> {
        for body in [spring.get_body_a(), spring.get_body_b()] {
            if !self.bodies.contains(body) {
                return Err(PhysicsError::ResourceNotFound(format!("Spring refers to missing body {:?}", body)));
            }
        }
        spring.refresh_affected_bodies();
        let handle = self.springs.add(spring);
        debug!(spring = handle.id(), "added spring");
        self.emit(WorldEvent::AddSpring { spring: handle });
        Ok(handle)
    }

    /// Removes a spring from the world
    pub fn remove_spring(&mut self, handle: SpringHandle) -> Result<Spring> {
        self.springs
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Spring with handle {:?} not found", handle)))
    }

    /// Adds a contact material. Earlier materials win when several match a pair.
    pub fn add_contact_material(&mut self, contact_material: ContactMaterial) {
        self.contact_materials.push(contact_material);
    }

    /// Removes the contact material with the given id
    pub fn remove_contact_material(&mut self, id: u32) -> Option<ContactMaterial> {
        let index = self.contact_materials.iter().position(|cm| cm.id == id)?;
        Some(self.contact_materials.remove(index))
    }

    /// Finds the contact material defined between two materials, in either order
    pub fn get_contact_material(&self, a: Material, b: Material) -> Option<&ContactMaterial> {
        self.contact_materials.iter().find(|cm| cm.matches(a, b))
    }

    /// Returns the contact materials in insertion order
    pub fn get_contact_materials(&self) -> &[ContactMaterial] {
        &self.contact_materials
    }

    /// Registers a callback invoked synchronously for every event.
    ///
    /// Changes queued on the command buffer are applied after the current step returns.
    pub fn add_event_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&WorldEvent, &mut CommandBuffer) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Advances the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) -> Result<()> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!("time step must be positive and finite, got {}", dt)));
        }

        let started = self.config.profile.then(Instant::now);
        let result = self.internal_step(dt);
        self.last_step_duration = started.map(|t| t.elapsed());
        if let Some(duration) = self.last_step_duration {
            trace!(?duration, bodies = self.bodies.len(), "step profiled");
        }
        if result.is_err() {
            // Forces gathered before the failure must not leak into the next step
            for body in self.bodies.as_mut_slice() {
                body.set_zero_force();
            }
        }
        self.flush_commands();
        result
    }

    fn internal_step(&mut self, dt: f32) -> Result<()> {
        self.last_time_step = dt;
        let gravity = self.config.gravity;
        let gravity_length = gravity.length();

        for body in self.bodies.as_mut_slice() {
            if body.is_dynamic() {
                body.force += gravity * body.mass;
            }
        }

        if self.config.apply_spring_forces {
            for spring in self.springs.as_slice() {
                spring.apply_forces(&mut self.bodies)?;
            }
        }

        if self.config.apply_damping {
            for body in self.bodies.as_mut_slice() {
                body.apply_damping(dt);
            }
        }

        let pairs = self.broadphase.get_collision_pairs(&self.bodies)?;

        self.narrowphase.impact_matching = self.config.impact_matching;
        self.narrowphase.reset();
        for pair in pairs.chunks_exact(2) {
            let (handle_a, handle_b) = (pair[0], pair[1]);
            let (Some(body_a), Some(body_b)) = (self.bodies.get(handle_a), self.bodies.get(handle_b)) else {
                continue;
            };

            let inv_mass_sum = body_a.inv_mass + body_b.inv_mass;
            let reduced_mass = if inv_mass_sum > 0.0 { 1.0 / inv_mass_sum } else { 0.0 };

            for i in 0..body_a.shapes.len() {
                let Some(a) = ShapeContext::from_body(handle_a, body_a, i) else {
                    continue;
                };
                for j in 0..body_b.shapes.len() {
                    let Some(b) = ShapeContext::from_body(handle_b, body_b, j) else {
                        continue;
                    };

                    let params = SurfaceParams::resolve(&self.contact_materials, a.shape, b.shape, self.config.default_friction);
                    let np = &mut self.narrowphase;
                    np.enable_friction = params.friction > 0.0;
                    np.friction_coefficient = params.friction;
                    np.slip_force = params.friction * gravity_length * reduced_mass;
                    np.restitution = params.restitution;
                    np.surface_velocity = params.surface_velocity;
                    np.contact_stiffness = params.stiffness;
                    np.contact_relaxation = params.relaxation;
                    np.friction_stiffness = params.friction_stiffness;
                    np.friction_relaxation = params.friction_relaxation;
                    np.collide(&a, &b, false);
                }
            }
        }

        // Contacts first, then frictions, then constraint equations
        let mut sources = Vec::new();
        for (k, eq) in self.narrowphase.contact_equations.iter().enumerate() {
            self.solver.add_equation(*eq);
            sources.push(EquationSource::Contact(k));
        }
        for (k, eq) in self.narrowphase.friction_equations.iter().enumerate() {
            self.solver.add_equation(*eq);
            sources.push(EquationSource::Friction(k));
        }
        for (handle, constraint) in self.constraints.iter_mut() {
            let (handle_a, handle_b) = match constraint.get_bodies() {
                [a, b, ..] => (*a, *b),
                _ => continue,
            };
            let (Some(body_a), Some(body_b)) = (self.bodies.get(handle_a), self.bodies.get(handle_b)) else {
                continue;
            };
            constraint.update(body_a, body_b);
            for (k, eq) in constraint.equations().iter().enumerate() {
                if eq.enabled {
                    self.solver.add_equation(*eq);
                    sources.push(EquationSource::Constraint(handle, k));
                }
            }
        }

        trace!(
            pairs = pairs.len() / 2,
            contacts = self.narrowphase.contact_equations.len(),
            equations = sources.len(),
            "step equations gathered"
        );

        if self.config.solve_constraints && !sources.is_empty() {
            let mut solver_bodies = SolverBodySet::from_storage(&self.bodies);
            self.solver.solve(dt, &mut solver_bodies);
            solver_bodies.write_back(&mut self.bodies);
        }

        let solved = self.solver.remove_all_equations();
        for (eq, source) in solved.iter().zip(&sources) {
            match *source {
                EquationSource::Contact(k) => {
                    if let Some(target) = self.narrowphase.contact_equations.get_mut(k) {
                        *target = *eq;
                    }
                }
                EquationSource::Friction(k) => {
                    if let Some(target) = self.narrowphase.friction_equations.get_mut(k) {
                        *target = *eq;
                    }
                }
                EquationSource::Constraint(handle, k) => {
                    if let Some(target) = self.constraints.get_mut(handle).and_then(|c| c.equations_mut().get_mut(k)) {
                        *target = *eq;
                    }
                }
            }
        }

        for body in self.bodies.as_mut_slice() {
            self.integrator.integrate(body, dt);
        }

        for body in self.bodies.as_mut_slice() {
            body.set_zero_force();
        }

        if self.config.emit_impact_event {
            let mut seen = HashSet::new();
            let impacts: Vec<WorldEvent> = self
                .narrowphase
                .contact_equations
                .iter()
                .filter_map(|eq| {
                    let data = eq.contact_data()?;
                    if !data.first_impact || !seen.insert((eq.body_a, eq.body_b, data.shape_a, data.shape_b)) {
                        return None;
                    }
                    Some(WorldEvent::Impact {
                        body_a: eq.body_a,
                        body_b: eq.body_b,
                        shape_a: data.shape_a,
                        shape_b: data.shape_b,
                    })
                })
                .collect();
            for impact in impacts {
                self.emit(impact);
            }
        }

        self.time += dt;
        self.emit(WorldEvent::PostStep { time: self.time });
        Ok(())
    }

    /// Applies the changes queued by listeners so far.
    ///
    /// Called automatically at the end of every step. Commands queued while
    /// flushing wait for the next flush.
    pub fn flush_commands(&mut self) {
        for command in self.pending.take() {
            let outcome = match command {
                Command::AddBody(body) => {
                    self.add_body(*body);
                    Ok(())
                }
                Command::RemoveBody(handle) => self.remove_body(handle).map(|_| ()),
                Command::AddSpring(spring) => self.add_spring(spring).map(|_| ()),
                Command::RemoveSpring(handle) => self.remove_spring(handle).map(|_| ()),
                Command::AddConstraint(constraint) => self.add_constraint(constraint).map(|_| ()),
                Command::RemoveConstraint(handle) => self.remove_constraint(handle).map(|_| ()),
            };
            if let Err(err) = outcome {
                warn!(error = %err, "dropped queued world change");
            }
        }
    }

    fn emit(&mut self, event: WorldEvent) {
        for listener in &mut self.listeners {
            listener(&event, &mut self.pending);
        }
        self.events.push(event);
    }

    /// Returns the bodies among `candidates` whose shapes contain `point`.
    ///
    /// Particles and lines have no area, so they are hit within `precision`.
    pub fn hit_test(&self, point: Vector2, candidates: &[BodyHandle], precision: f32) -> Vec<BodyHandle> {
        crate::core::hit_test::hit_test(&self.bodies, point, candidates, precision)
    }

    /// Removes every body, spring, constraint and contact material and resets the clock
    pub fn clear(&mut self) {
        for handle in self.bodies.handles() {
            self.broadphase.on_body_removed(handle);
        }
        self.bodies.clear();
        self.springs.clear();
        self.constraints.clear();
        self.contact_materials.clear();
        self.solver.remove_all_equations();
        self.narrowphase = NarrowPhase::new();
        self.events.clear();
        self.time = 0.0;
    }

    /// Creates an independent copy of the world.
    ///
    /// Listeners and queued events are not copied.
    pub fn clone_world(&self) -> PhysicsWorld {
        let mut constraints = ConstraintStorage::new();
        for (handle, constraint) in self.constraints.iter() {
            // Handles come from a storage of the same kind, so they are free
            let _ = constraints.insert_with_handle(handle, constraint.clone_constraint());
        }

        PhysicsWorld {
            bodies: self.bodies.clone(),
            springs: self.springs.clone(),
            constraints,
            contact_materials: self.contact_materials.clone(),
            solver: self.solver.clone_solver(),
            broadphase: self.broadphase.clone_box(),
            narrowphase: self.narrowphase.clone(),
            integrator: Box::new(SymplecticEulerIntegrator::new()),
            config: self.config.clone(),
            events: EventQueue::new(),
            listeners: Vec::new(),
            pending: CommandBuffer::new(),
            time: self.time,
            last_time_step: self.last_time_step,
            last_step_duration: self.last_step_duration,
        }
    }

    /// Gets a body by handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable body by handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_body_mut(handle)
    }

    /// Looks a body up by its numeric id
    pub fn get_body_by_id(&self, id: u32) -> Option<&RigidBody> {
        self.bodies.get(BodyHandle(id))
    }

    /// Returns the body storage
    pub fn get_bodies(&self) -> &BodyStorage<RigidBody> {
        &self.bodies
    }

    /// Gets a constraint by handle
    pub fn get_constraint(&self, handle: ConstraintHandle) -> Result<&dyn Constraint> {
        self.constraints.get_constraint(handle).map(|c| c.as_ref())
    }

    /// Gets a mutable constraint by handle
    pub fn get_constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut Box<dyn Constraint>> {
        self.constraints.get_constraint_mut(handle)
    }

    /// Gets a spring by handle
    pub fn get_spring(&self, handle: SpringHandle) -> Option<&Spring> {
        self.springs.get(handle)
    }

    /// Gets a mutable spring by handle
    pub fn get_spring_mut(&mut self, handle: SpringHandle) -> Option<&mut Spring> {
        self.springs.get_mut(handle)
    }

    /// Returns the simulation configuration
    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn get_gravity(&self) -> Vector2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.config.gravity = gravity;
    }

    /// Returns the solver
    pub fn get_solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    /// Replaces the solver
    pub fn set_solver(&mut self, solver: Box<dyn Solver>) {
        self.solver = solver;
    }

    /// Returns the broad-phase
    pub fn get_broadphase(&self) -> &dyn BroadPhase {
        self.broadphase.as_ref()
    }

    /// Replaces the broad-phase and registers every existing body with it
    pub fn set_broadphase(&mut self, mut broadphase: Box<dyn BroadPhase>) {
        for handle in self.bodies.handles() {
            broadphase.on_body_added(handle);
        }
        self.broadphase = broadphase;
    }

    /// Returns the narrow-phase, holding the contacts of the last step
    pub fn get_narrowphase(&self) -> &NarrowPhase {
        &self.narrowphase
    }

    /// Number of islands found by the last solve, if the solver splits into islands
    pub fn num_islands(&self) -> Option<usize> {
        self.solver
            .as_any()
            .downcast_ref::<IslandSolver>()
            .map(|s| s.num_islands())
    }

    /// Returns the event queue
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns a mutable reference to the event queue
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Returns the total elapsed simulation time
    pub fn get_time(&self) -> f32 {
        self.time
    }

    /// Returns the time step of the last call to `step`
    pub fn get_last_time_step(&self) -> f32 {
        self.last_time_step
    }

    /// Wall-clock duration of the last step, `None` unless `profile` was set
    pub fn get_last_step_duration(&self) -> Option<Duration> {
        self.last_step_duration
    }

    /// Returns the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the number of constraints in the world
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Returns the number of springs in the world
    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }
}
