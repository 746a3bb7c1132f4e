use std::collections::HashSet;

use crate::bodies::RigidBody;
use crate::collision::collision_filter::groups_collide;
use crate::collision::contact_generator::{ContactPoint, ContactRoutine};
use crate::core::{BodyHandle, ImpactMatching};
use crate::equations::{ContactData, Equation, FrictionData, DEFAULT_RELAXATION, DEFAULT_STIFFNESS};
use crate::math::Vector2;
use crate::shapes::{Shape, ShapeType};

/// A shape placed in the world, together with the body that owns it
#[derive(Debug, Clone, Copy)]
pub struct ShapeContext<'a> {
    /// Handle of the owning body
    pub body: BodyHandle,

    /// Position of the owning body's centre
    pub body_position: Vector2,

    /// The shape
    pub shape: &'a Shape,

    /// World position of the shape origin
    pub position: Vector2,

    /// World angle of the shape
    pub angle: f32,
}

impl<'a> ShapeContext<'a> {
    /// Places the `index`-th shape of a body in the world
    pub fn from_body(handle: BodyHandle, body: &'a RigidBody, index: usize) -> Option<Self> {
        let (position, angle) = body.get_shape_transform(index)?;
        Some(Self {
            body: handle,
            body_position: body.position,
            shape: &body.shapes[index].shape,
            position,
            angle,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct DispatchEntry {
    routine: ContactRoutine,
    swap: bool,
}

/// Every unordered shape pair, listed once in the argument order of its routine
const ROUTINES: [(ShapeType, ShapeType, ContactRoutine); 28] = [
    (ShapeType::Circle, ShapeType::Circle, ContactRoutine::CircleCircle),
    (ShapeType::Circle, ShapeType::Particle, ContactRoutine::CircleParticle),
    (ShapeType::Circle, ShapeType::Plane, ContactRoutine::CirclePlane),
    (ShapeType::Circle, ShapeType::Convex, ContactRoutine::CircleConvex),
    (ShapeType::Circle, ShapeType::Line, ContactRoutine::CircleLine),
    (ShapeType::Circle, ShapeType::Rectangle, ContactRoutine::CircleConvex),
    (ShapeType::Circle, ShapeType::Capsule, ContactRoutine::CircleCapsule),
    (ShapeType::Particle, ShapeType::Particle, ContactRoutine::NoContact),
    (ShapeType::Particle, ShapeType::Plane, ContactRoutine::ParticlePlane),
    (ShapeType::Particle, ShapeType::Convex, ContactRoutine::ParticleConvex),
    (ShapeType::Particle, ShapeType::Line, ContactRoutine::NoContact),
    (ShapeType::Particle, ShapeType::Rectangle, ContactRoutine::ParticleConvex),
    (ShapeType::Particle, ShapeType::Capsule, ContactRoutine::ParticleCapsule),
    (ShapeType::Plane, ShapeType::Plane, ContactRoutine::NoContact),
    (ShapeType::Plane, ShapeType::Convex, ContactRoutine::PlaneConvex),
    (ShapeType::Plane, ShapeType::Line, ContactRoutine::PlaneLine),
    (ShapeType::Plane, ShapeType::Rectangle, ContactRoutine::PlaneConvex),
    (ShapeType::Plane, ShapeType::Capsule, ContactRoutine::PlaneCapsule),
    (ShapeType::Convex, ShapeType::Convex, ContactRoutine::ConvexConvex),
    (ShapeType::Convex, ShapeType::Line, ContactRoutine::ConvexLine),
    (ShapeType::Convex, ShapeType::Rectangle, ContactRoutine::ConvexConvex),
    (ShapeType::Convex, ShapeType::Capsule, ContactRoutine::ConvexCapsule),
    (ShapeType::Line, ShapeType::Line, ContactRoutine::LineLine),
    (ShapeType::Rectangle, ShapeType::Line, ContactRoutine::ConvexLine),
    (ShapeType::Line, ShapeType::Capsule, ContactRoutine::LineCapsule),
    (ShapeType::Rectangle, ShapeType::Rectangle, ContactRoutine::ConvexConvex),
    (ShapeType::Rectangle, ShapeType::Capsule, ContactRoutine::ConvexCapsule),
    (ShapeType::Capsule, ShapeType::Capsule, ContactRoutine::CapsuleCapsule),
];

const fn build_dispatch() -> [[DispatchEntry; ShapeType::COUNT]; ShapeType::COUNT] {
    let mut table = [[DispatchEntry { routine: ContactRoutine::NoContact, swap: false }; ShapeType::COUNT]; ShapeType::COUNT];
    let mut k = 0;
    while k < ROUTINES.len() {
        let (first, second, routine) = ROUTINES[k];
        let (i, j) = (first.index(), second.index());
        table[i][j] = DispatchEntry { routine, swap: false };
        if i != j {
            table[j][i] = DispatchEntry { routine, swap: true };
        }
        k += 1;
    }
    table
}

static DISPATCH: [[DispatchEntry; ShapeType::COUNT]; ShapeType::COUNT] = build_dispatch();

/// Identity of a contact across steps, used to detect first impacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContactKey {
    body_a: BodyHandle,
    body_b: BodyHandle,
    shape_a: u32,
    shape_b: u32,
}

impl ContactKey {
    fn new(matching: ImpactMatching, body_a: BodyHandle, body_b: BodyHandle, shape_a: u32, shape_b: u32) -> Self {
        let (shape_a, shape_b) = match matching {
            ImpactMatching::BodyPair => (0, 0),
            ImpactMatching::ShapePair => (shape_a, shape_b),
        };
        if body_a <= body_b {
            Self { body_a, body_b, shape_a, shape_b }
        } else {
            Self { body_a: body_b, body_b: body_a, shape_a: shape_b, shape_b: shape_a }
        }
    }
}

/// Turns overlapping shape pairs into contact and friction equations.
///
/// The per-pair settings (`friction_coefficient`, `slip_force`, `restitution`
/// and the stiffness values) are set by the world before each pair is collided.
#[derive(Debug, Clone)]
pub struct NarrowPhase {
    /// Contact equations generated since the last reset
    pub contact_equations: Vec<Equation>,

    /// Friction equations generated since the last reset
    pub friction_equations: Vec<Equation>,

    /// Whether to create friction equations
    pub enable_friction: bool,

    /// Maximum friction force
    pub slip_force: f32,

    /// Friction coefficient recorded on new friction equations
    pub friction_coefficient: f32,

    /// Tangential surface speed, as on a conveyor belt
    pub surface_velocity: f32,

    /// Restitution of new contact equations
    pub restitution: f32,

    pub contact_stiffness: f32,
    pub contact_relaxation: f32,
    pub friction_stiffness: f32,
    pub friction_relaxation: f32,

    /// How contacts are matched against the previous step
    pub impact_matching: ImpactMatching,

    collided_last_step: HashSet<ContactKey>,
}

impl NarrowPhase {
    /// Creates a narrow-phase with friction enabled
    pub fn new() -> Self {
        Self {
            contact_equations: Vec::new(),
            friction_equations: Vec::new(),
            enable_friction: true,
            slip_force: 10.0,
            friction_coefficient: 0.3,
            surface_velocity: 0.0,
            restitution: 0.0,
            contact_stiffness: DEFAULT_STIFFNESS,
            contact_relaxation: DEFAULT_RELAXATION,
            friction_stiffness: DEFAULT_STIFFNESS,
            friction_relaxation: DEFAULT_RELAXATION,
            impact_matching: ImpactMatching::default(),
            collided_last_step: HashSet::new(),
        }
    }

    /// Remembers which pairs touched in the step that just ended and clears the equations
    pub fn reset(&mut self) {
        let matching = self.impact_matching;
        self.collided_last_step = self
            .contact_equations
            .iter()
            .filter_map(|eq| {
                eq.contact_data()
                    .map(|c| ContactKey::new(matching, eq.body_a, eq.body_b, c.shape_a, c.shape_b))
            })
            .collect();
        self.contact_equations.clear();
        self.friction_equations.clear();
    }

    /// Whether the given bodies (and shapes, under shape matching) touched in the previous step
    pub fn collided_last_step(&self, body_a: BodyHandle, body_b: BodyHandle, shape_a: u32, shape_b: u32) -> bool {
        self.collided_last_step
            .contains(&ContactKey::new(self.impact_matching, body_a, body_b, shape_a, shape_b))
    }

    /// Computes the contacts between two placed shapes, ignoring collision groups
    pub fn generate_contacts(a: &ShapeContext, b: &ShapeContext) -> Vec<ContactPoint> {
        let entry = DISPATCH[a.shape.shape_type().index()][b.shape.shape_type().index()];
        let mut contacts = Vec::new();

        if entry.swap {
            entry.routine.run(b, a, &mut contacts);
            for contact in &mut contacts {
                *contact = contact.flipped();
            }
        } else {
            entry.routine.run(a, b, &mut contacts);
        }

        contacts
    }

    /// Collides two placed shapes and returns the number of contacts found.
    ///
    /// Pairs rejected by their collision groups produce nothing. With
    /// `just_test` no equations are created.
    pub fn collide(&mut self, a: &ShapeContext, b: &ShapeContext, just_test: bool) -> usize {
        if !groups_collide(a.shape, b.shape) {
            return 0;
        }

        let contacts = Self::generate_contacts(a, b);
        if !just_test {
            for contact in &contacts {
                self.add_contact(a, b, contact);
            }
        }
        contacts.len()
    }

    fn add_contact(&mut self, a: &ShapeContext, b: &ShapeContext, contact: &ContactPoint) {
        let ri = contact.point_a - a.body_position;
        let rj = contact.point_b - b.body_position;
        let shape_a = a.shape.get_id();
        let shape_b = b.shape.get_id();

        let data = ContactData {
            ri,
            rj,
            ni: contact.normal,
            restitution: self.restitution,
            first_impact: !self.collided_last_step(a.body, b.body, shape_a, shape_b),
            shape_a,
            shape_b,
        };
        let mut equation = Equation::contact(a.body, b.body, data);
        equation.set_stiffness(self.contact_stiffness, self.contact_relaxation);
        self.contact_equations.push(equation);

        if self.enable_friction {
            // Normal rotated by -90 degrees
            let t = Vector2::new(contact.normal.y, -contact.normal.x);
            let data = FrictionData {
                ri,
                rj,
                t,
                friction_coefficient: self.friction_coefficient,
                shape_a,
                shape_b,
            };
            let mut equation = Equation::friction(a.body, b.body, data, self.slip_force);
            equation.set_stiffness(self.friction_stiffness, self.friction_relaxation);
            equation.relative_velocity = self.surface_velocity;
            self.friction_equations.push(equation);
        }
    }
}

impl Default for NarrowPhase {
    fn default() -> Self {
        Self::new()
    }
}
