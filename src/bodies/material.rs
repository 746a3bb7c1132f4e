use std::sync::atomic::{AtomicU32, Ordering};
use serde::{Serialize, Deserialize};

static NEXT_MATERIAL_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_CONTACT_MATERIAL_ID: AtomicU32 = AtomicU32::new(1);

/// An identity token attached to shapes.
///
/// A material carries no physical parameters; those live in the
/// `ContactMaterial` registered for a pair of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    /// Unique material id
    pub id: u32,
}

impl Material {
    /// Creates a new material with a fresh id
    pub fn new() -> Self {
        Self { id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed) }
    }

    /// Recreates a material with a known id
    pub fn with_id(id: u32) -> Self {
        NEXT_MATERIAL_ID.fetch_max(id + 1, Ordering::Relaxed);
        Self { id }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

/// Contact parameters used when shapes of two materials touch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterial {
    /// Unique contact material id
    pub id: u32,

    /// The first material
    pub material_a: Material,

    /// The second material
    pub material_b: Material,

    /// Friction coefficient
    pub friction: f32,

    /// Coefficient of restitution, applied on first impact only
    pub restitution: f32,

    /// Stiffness of the contact equations
    pub stiffness: f32,

    /// Relaxation (in steps) of the contact equations
    pub relaxation: f32,

    /// Stiffness of the friction equations
    pub friction_stiffness: f32,

    /// Relaxation (in steps) of the friction equations
    pub friction_relaxation: f32,

    /// Relative tangential velocity of the contact surfaces
    pub surface_velocity: f32,
}

impl ContactMaterial {
    /// Creates a contact material with default parameters
    pub fn new(material_a: Material, material_b: Material) -> Self {
        Self {
            id: NEXT_CONTACT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            material_a,
            material_b,
            friction: 0.3,
            restitution: 0.0,
            stiffness: 1.0e7,
            relaxation: 3.0,
            friction_stiffness: 1.0e7,
            friction_relaxation: 3.0,
            surface_velocity: 0.0,
        }
    }

    /// Sets the friction coefficient, builder style
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Sets the restitution, builder style
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.max(0.0);
        self
    }

    /// Sets the contact stiffness and relaxation, builder style
    pub fn with_stiffness(mut self, stiffness: f32, relaxation: f32) -> Self {
        self.stiffness = stiffness;
        self.relaxation = relaxation;
        self
    }

    /// Returns true if this contact material applies to the unordered material pair
    #[inline]
    pub fn matches(&self, a: Material, b: Material) -> bool {
        (self.material_a == a && self.material_b == b) || (self.material_a == b && self.material_b == a)
    }
}
