use crate::bodies::Material;
use crate::collision::{CollisionGroup, CollisionMask};
use crate::error::PhysicsError;
use crate::math::Vector2;
use crate::shapes::ConvexData;
use crate::Result;

use std::f32::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_SHAPE_ID: AtomicU32 = AtomicU32::new(1);

/// The seven shape variants, in narrow-phase dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Circle,
    Particle,
    Plane,
    Convex,
    Line,
    Rectangle,
    Capsule,
}

impl ShapeType {
    /// Number of shape variants
    pub const COUNT: usize = 7;

    /// All shape variants ordered by their dispatch index
    pub const ALL: [ShapeType; Self::COUNT] = [
        ShapeType::Circle,
        ShapeType::Particle,
        ShapeType::Plane,
        ShapeType::Convex,
        ShapeType::Line,
        ShapeType::Rectangle,
        ShapeType::Capsule,
    ];

    /// Row/column of this variant in dispatch tables
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the type name of the shape
    pub const fn name(self) -> &'static str {
        match self {
            ShapeType::Circle => "Circle",
            ShapeType::Particle => "Particle",
            ShapeType::Plane => "Plane",
            ShapeType::Convex => "Convex",
            ShapeType::Line => "Line",
            ShapeType::Rectangle => "Rectangle",
            ShapeType::Capsule => "Capsule",
        }
    }
}

/// Geometry of a shape in body-local space
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Disc of the given radius
    Circle { radius: f32 },

    /// Zero-size point
    Particle,

    /// Infinite plane through the origin with local normal `+y`; solid below
    Plane,

    /// Convex polygon
    Convex(ConvexData),

    /// Segment from `(-length/2, 0)` to `(length/2, 0)`
    Line { length: f32 },

    /// Axis-aligned box, stored as a polygon so it shares the polygon routines
    Rectangle { width: f32, height: f32, polygon: ConvexData },

    /// Segment along the local x axis swept by a radius
    Capsule { length: f32, radius: f32 },
}

/// A collision shape attached to a rigid body.
///
/// Derived values (`bounding_radius`, `area`) are cached at construction and
/// refreshed by `set_convex_vertices`.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Process-wide unique identifier
    id: u32,

    /// The shape geometry
    kind: ShapeKind,

    /// Radius of the smallest origin-centred circle containing the shape
    bounding_radius: f32,

    /// Surface area of the shape
    area: f32,

    /// The groups this shape belongs to
    pub collision_group: CollisionGroup,

    /// The groups this shape collides with
    pub collision_mask: CollisionMask,

    /// Optional material used to look up a contact material
    pub material: Option<Material>,
}

impl Shape {
    fn from_kind(kind: ShapeKind) -> Self {
        let mut shape = Self {
            id: NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            bounding_radius: 0.0,
            area: 0.0,
            collision_group: CollisionGroup::DEFAULT,
            collision_mask: CollisionMask::ALL,
            material: None,
        };
        shape.update_bounding_radius();
        shape.update_area();
        shape
    }

    /// Creates a circle
    pub fn circle(radius: f32) -> Result<Self> {
        check_dimension("circle radius", radius)?;
        Ok(Self::from_kind(ShapeKind::Circle { radius }))
    }

    /// Creates a particle
    pub fn particle() -> Self {
        Self::from_kind(ShapeKind::Particle)
    }

    /// Creates an infinite plane
    pub fn plane() -> Self {
        Self::from_kind(ShapeKind::Plane)
    }

    /// Creates a line segment centred on the origin
    pub fn line(length: f32) -> Result<Self> {
        check_dimension("line length", length)?;
        Ok(Self::from_kind(ShapeKind::Line { length }))
    }

    /// Creates a rectangle centred on the origin
    pub fn rectangle(width: f32, height: f32) -> Result<Self> {
        check_dimension("rectangle width", width)?;
        check_dimension("rectangle height", height)?;
        let polygon = ConvexData::rectangle(width, height)?;
        Ok(Self::from_kind(ShapeKind::Rectangle { width, height, polygon }))
    }

    /// Creates a convex polygon from its vertices (either winding)
    pub fn convex(vertices: Vec<Vector2>) -> Result<Self> {
        let polygon = ConvexData::new(vertices)?;
        Ok(Self::from_kind(ShapeKind::Convex(polygon)))
    }

    /// Creates a capsule
    pub fn capsule(length: f32, radius: f32) -> Result<Self> {
        check_dimension("capsule length", length)?;
        check_dimension("capsule radius", radius)?;
        Ok(Self::from_kind(ShapeKind::Capsule { length, radius }))
    }

    /// Sets the collision group, builder style
    pub fn with_collision_group(mut self, group: CollisionGroup) -> Self {
        self.collision_group = group;
        self
    }

    /// Sets the collision mask, builder style
    pub fn with_collision_mask(mut self, mask: CollisionMask) -> Self {
        self.collision_mask = mask;
        self
    }

    /// Sets the material, builder style
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Returns the unique id of the shape
    pub fn get_id(&self) -> u32 {
        self.id
    }

    /// Returns the shape geometry
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Returns the variant tag
    pub fn shape_type(&self) -> ShapeType {
        match self.kind {
            ShapeKind::Circle { .. } => ShapeType::Circle,
            ShapeKind::Particle => ShapeType::Particle,
            ShapeKind::Plane => ShapeType::Plane,
            ShapeKind::Convex(_) => ShapeType::Convex,
            ShapeKind::Line { .. } => ShapeType::Line,
            ShapeKind::Rectangle { .. } => ShapeType::Rectangle,
            ShapeKind::Capsule { .. } => ShapeType::Capsule,
        }
    }

    /// Returns the cached bounding radius
    pub fn get_bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Returns the cached area
    pub fn get_area(&self) -> f32 {
        self.area
    }

    /// Returns the polygon data of rectangles and convex shapes
    pub fn polygon(&self) -> Option<&ConvexData> {
        match &self.kind {
            ShapeKind::Convex(polygon) | ShapeKind::Rectangle { polygon, .. } => Some(polygon),
            _ => None,
        }
    }

    /// Returns the local centre of mass of the shape
    pub fn get_center_of_mass(&self) -> Vector2 {
        match &self.kind {
            ShapeKind::Convex(polygon) => polygon.get_center_of_mass(),
            _ => Vector2::zero(),
        }
    }

    /// Computes the moment of inertia about the shape origin for the given mass
    pub fn compute_moment_of_inertia(&self, mass: f32) -> f32 {
        match &self.kind {
            ShapeKind::Circle { radius } => mass * radius * radius / 2.0,
            ShapeKind::Particle | ShapeKind::Plane => 0.0,
            ShapeKind::Line { length } => mass * length * length / 12.0,
            ShapeKind::Rectangle { width, height, .. } => mass * (width * width + height * height) / 12.0,
            ShapeKind::Convex(polygon) => polygon.moment_of_inertia(mass),
            ShapeKind::Capsule { length, radius } => {
                let w = length + radius;
                let h = radius * 2.0;
                mass * (h * h + w * w) / 12.0
            }
        }
    }

    /// Recomputes the bounding radius from the current geometry
    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = match &self.kind {
            ShapeKind::Circle { radius } => *radius,
            ShapeKind::Particle => 0.0,
            ShapeKind::Plane => f32::INFINITY,
            ShapeKind::Line { length } => length / 2.0,
            ShapeKind::Rectangle { width, height, .. } => (width * width + height * height).sqrt() / 2.0,
            ShapeKind::Convex(polygon) => polygon.get_bounding_radius(),
            ShapeKind::Capsule { length, radius } => length / 2.0 + radius,
        };
    }

    /// Recomputes the area from the current geometry
    pub fn update_area(&mut self) {
        self.area = match &self.kind {
            ShapeKind::Circle { radius } => PI * radius * radius,
            ShapeKind::Particle | ShapeKind::Plane | ShapeKind::Line { .. } => 0.0,
            ShapeKind::Rectangle { width, height, .. } => width * height,
            ShapeKind::Convex(polygon) => polygon.get_area(),
            ShapeKind::Capsule { length, radius } => 2.0 * radius * length + PI * radius * radius,
        };
    }

    /// Replaces the vertices of a convex shape and refreshes every derived value.
    ///
    /// The shape is left untouched when the new vertices are invalid.
    pub fn set_convex_vertices(&mut self, vertices: Vec<Vector2>) -> Result<()> {
        match &mut self.kind {
            ShapeKind::Convex(polygon) => {
                *polygon = ConvexData::new(vertices)?;
            }
            _ => {
                return Err(PhysicsError::InvalidParameter(
                    format!("cannot set vertices on a {} shape", self.shape_type().name())
                ));
            }
        }
        self.update_bounding_radius();
        self.update_area();
        Ok(())
    }
}

fn check_dimension(what: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PhysicsError::InvalidGeometry(format!("{} must be finite and non-negative, got {}", what, value)));
    }
    Ok(())
}
