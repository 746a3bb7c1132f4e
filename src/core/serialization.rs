//! JSON documents for saving and restoring a whole world.
//!
//! The layout uses camelCase keys and two-element arrays for vectors. Bodies
//! are referenced by their index in the `bodies` array.

use crate::core::{BodyHandle, PhysicsWorld};
use crate::core::storage::{BodyStorage, ConstraintStorage, SpringStorage, Storage};
use crate::bodies::{ContactMaterial, Material, MotionState, RigidBody};
use crate::collision::{
    BroadPhase, CollisionGroup, GridBroadPhase, NaiveBroadPhase, NarrowPhase, QuadTreeBroadPhase, SapBroadPhase,
};
use crate::constraints::{Constraint, DistanceConstraint, LockConstraint, PointToPointConstraint, PrismaticConstraint};
use crate::error::PhysicsError;
use crate::forces::Spring;
use crate::math::{Aabb, Vector2};
use crate::shapes::{Shape, ShapeKind};
use crate::solver::{GsSolver, IslandSolver, Solver};
use crate::Result;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Version tag written by `to_json`
pub const CURRENT_VERSION: &str = "0.4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldDocument {
    p2: String,
    gravity: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    solver: Option<SolverDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    broadphase: Option<BroadphaseDocument>,
    bodies: Vec<BodyDocument>,
    #[serde(default)]
    springs: Vec<SpringDocument>,
    #[serde(default)]
    constraints: Vec<ConstraintDocument>,
    #[serde(default)]
    contact_materials: Vec<ContactMaterialDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
enum SolverDocument {
    #[serde(rename = "GSSolver")]
    GaussSeidel { iterations: usize, tolerance: f32 },
    #[serde(rename = "IslandSolver")]
    Island { iterations: usize, tolerance: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
enum BroadphaseDocument {
    #[serde(rename = "NaiveBroadphase")]
    Naive,
    #[serde(rename = "SAPBroadphase", rename_all = "camelCase")]
    SweepAndPrune { axis_index: usize },
    #[serde(rename = "GridBroadphase")]
    Grid { xmin: f32, xmax: f32, ymin: f32, ymax: f32, nx: usize, ny: usize },
    #[serde(rename = "QuadTreeBroadphase", rename_all = "camelCase")]
    QuadTree { min: [f32; 2], max: [f32; 2], max_depth: usize, max_children: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BodyDocument {
    id: u32,
    mass: f32,
    #[serde(default)]
    motion_state: MotionState,
    angle: f32,
    position: [f32; 2],
    velocity: [f32; 2],
    angular_velocity: f32,
    #[serde(default)]
    force: [f32; 2],
    #[serde(default = "default_damping")]
    damping: f32,
    #[serde(default = "default_damping")]
    angular_damping: f32,
    #[serde(default)]
    fixed_rotation: bool,
    shapes: Vec<ShapeDocument>,
}

fn default_damping() -> f32 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeometryDocument {
    Circle { radius: f32 },
    Particle,
    Plane,
    Line { length: f32 },
    Rectangle { width: f32, height: f32 },
    Convex { verts: Vec<[f32; 2]> },
    Capsule { length: f32, radius: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShapeDocument {
    #[serde(flatten)]
    geometry: GeometryDocument,
    offset: [f32; 2],
    angle: f32,
    collision_group: u32,
    collision_mask: u32,
    #[serde(default)]
    material: Option<MaterialDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct MaterialDocument {
    id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpringDocument {
    body_a: usize,
    body_b: usize,
    stiffness: f32,
    damping: f32,
    rest_length: f32,
    local_anchor_a: [f32; 2],
    local_anchor_b: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ConstraintDocument {
    #[serde(rename_all = "camelCase")]
    DistanceConstraint {
        body_a: usize,
        body_b: usize,
        distance: f32,
        max_force: f32,
        #[serde(default)]
        local_anchor_a: [f32; 2],
        #[serde(default)]
        local_anchor_b: [f32; 2],
    },
    #[serde(rename_all = "camelCase")]
    PointToPointConstraint {
        body_a: usize,
        body_b: usize,
        pivot_a: [f32; 2],
        pivot_b: [f32; 2],
        max_force: f32,
        #[serde(default)]
        motor_speed: Option<f32>,
        #[serde(default)]
        motor_max_force: Option<f32>,
        #[serde(default)]
        lower_limit: Option<f32>,
        #[serde(default)]
        upper_limit: Option<f32>,
    },
    #[serde(rename_all = "camelCase")]
    PrismaticConstraint {
        body_a: usize,
        body_b: usize,
        local_axis_a: [f32; 2],
        local_anchor_a: [f32; 2],
        local_anchor_b: [f32; 2],
        max_force: f32,
        #[serde(default = "default_rotational_lock")]
        rotational_lock: bool,
        #[serde(default)]
        motor_speed: Option<f32>,
        #[serde(default)]
        lower_limit: Option<f32>,
        #[serde(default)]
        upper_limit: Option<f32>,
    },
    #[serde(rename_all = "camelCase")]
    LockConstraint {
        body_a: usize,
        body_b: usize,
        local_offset_b: [f32; 2],
        local_angle_b: f32,
        max_force: f32,
    },
}

fn default_rotational_lock() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactMaterialDocument {
    id: u32,
    material_a: u32,
    material_b: u32,
    friction: f32,
    restitution: f32,
    stiffness: f32,
    relaxation: f32,
    friction_stiffness: f32,
    friction_relaxation: f32,
    #[serde(default)]
    surface_velocity: f32,
}

fn v2a(v: Vector2) -> [f32; 2] {
    [v.x, v.y]
}

fn a2v(a: [f32; 2]) -> Vector2 {
    Vector2::new(a[0], a[1])
}

/// Everything `from_json` builds before it touches the world
struct RestoredWorld {
    gravity: Vector2,
    solver: Option<Box<dyn Solver>>,
    broadphase: Option<Box<dyn BroadPhase>>,
    bodies: BodyStorage<RigidBody>,
    springs: SpringStorage<Spring>,
    constraints: ConstraintStorage<Box<dyn Constraint>>,
    contact_materials: Vec<ContactMaterial>,
}

/// Upgrades a serialized world to the current version.
///
/// Version `"0.3"` documents get prismatic constraints rebuilt with an x axis
/// and anchors at the body origins. Unknown versions are rejected.
pub fn upgrade_json(json: &Value) -> Result<Value> {
    let mut json = json.clone();
    loop {
        let version = json
            .get("p2")
            .and_then(Value::as_str)
            .ok_or_else(|| PhysicsError::SerializationVersion("missing version tag".to_string()))?
            .to_string();

        match version.as_str() {
            CURRENT_VERSION => return Ok(json),
            "0.3" => {
                if let Some(constraints) = json.get_mut("constraints").and_then(Value::as_array_mut) {
                    for constraint in constraints.iter_mut() {
                        let Some(object) = constraint.as_object_mut() else {
                            continue;
                        };
                        if object.get("type").and_then(Value::as_str) != Some("PrismaticConstraint") {
                            continue;
                        }
                        object.remove("localAxisB");
                        object.insert("localAxisA".to_string(), serde_json::json!([1.0, 0.0]));
                        object.insert("localAnchorA".to_string(), serde_json::json!([0.0, 0.0]));
                        object.insert("localAnchorB".to_string(), serde_json::json!([0.0, 0.0]));
                    }
                }
                json["p2"] = Value::String("0.4".to_string());
                debug!("upgraded world document from 0.3 to 0.4");
            }
            other => return Err(PhysicsError::SerializationVersion(other.to_string())),
        }
    }
}

impl PhysicsWorld {
    /// Serializes the world into a JSON value
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_document()?)?)
    }

    /// Serializes the world into a JSON string
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document()?)?)
    }

    /// Replaces the world contents with a serialized world.
    ///
    /// The whole document is validated first; on error the world is left untouched.
    pub fn from_json(&mut self, json: &Value) -> Result<()> {
        let json = upgrade_json(json)?;
        let document: WorldDocument = serde_json::from_value(json)?;
        let restored = restore(&document)?;

        for handle in self.bodies.handles() {
            self.broadphase.on_body_removed(handle);
        }
        self.solver.remove_all_equations();
        self.narrowphase = NarrowPhase::new();

        self.config.gravity = restored.gravity;
        if let Some(solver) = restored.solver {
            self.solver = solver;
        }
        self.bodies = restored.bodies;
        self.springs = restored.springs;
        self.constraints = restored.constraints;
        self.contact_materials = restored.contact_materials;
        self.time = 0.0;

        let broadphase = restored.broadphase.unwrap_or_else(|| self.broadphase.clone_box());
        self.set_broadphase(broadphase);

        debug!(bodies = self.bodies.len(), "loaded world from json");
        Ok(())
    }

    /// Replaces the world contents with a world serialized as a JSON string
    pub fn from_json_str(&mut self, json: &str) -> Result<()> {
        let value: Value = serde_json::from_str(json)?;
        self.from_json(&value)
    }

    fn to_document(&self) -> Result<WorldDocument> {
        let body_index = |handle: BodyHandle| {
            self.bodies
                .index_of(handle)
                .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
        };

        let mut bodies = Vec::with_capacity(self.bodies.len());
        for (handle, body) in self.bodies.iter() {
            bodies.push(body_document(handle, body));
        }

        let mut springs = Vec::with_capacity(self.springs.len());
        for spring in self.springs.as_slice() {
            springs.push(SpringDocument {
                body_a: body_index(spring.get_body_a())?,
                body_b: body_index(spring.get_body_b())?,
                stiffness: spring.get_stiffness(),
                damping: spring.get_damping(),
                rest_length: spring.get_rest_length(),
                local_anchor_a: v2a(spring.get_local_anchor_a()),
                local_anchor_b: v2a(spring.get_local_anchor_b()),
            });
        }

        let mut constraints = Vec::with_capacity(self.constraints.len());
        for constraint in self.constraints.as_slice() {
            let (handle_a, handle_b) = match constraint.get_bodies() {
                [a, b, ..] => (*a, *b),
                _ => continue,
            };
            let (body_a, body_b) = (body_index(handle_a)?, body_index(handle_b)?);
            let any = constraint.as_any();

            let document = if let Some(c) = any.downcast_ref::<DistanceConstraint>() {
                ConstraintDocument::DistanceConstraint {
                    body_a,
                    body_b,
                    distance: c.get_distance(),
                    max_force: c.get_max_force(),
                    local_anchor_a: v2a(c.get_local_anchor_a()),
                    local_anchor_b: v2a(c.get_local_anchor_b()),
                }
            } else if let Some(c) = any.downcast_ref::<PointToPointConstraint>() {
                ConstraintDocument::PointToPointConstraint {
                    body_a,
                    body_b,
                    pivot_a: v2a(c.get_pivot_a()),
                    pivot_b: v2a(c.get_pivot_b()),
                    max_force: c.get_max_force(),
                    motor_speed: c.is_motor_enabled().then(|| c.get_motor_speed()),
                    motor_max_force: c.is_motor_enabled().then(|| c.get_motor_max_force()),
                    lower_limit: c.get_lower_limit(),
                    upper_limit: c.get_upper_limit(),
                }
            } else if let Some(c) = any.downcast_ref::<PrismaticConstraint>() {
                ConstraintDocument::PrismaticConstraint {
                    body_a,
                    body_b,
                    local_axis_a: v2a(c.get_local_axis_a()),
                    local_anchor_a: v2a(c.get_local_anchor_a()),
                    local_anchor_b: v2a(c.get_local_anchor_b()),
                    max_force: c.get_max_force(),
                    rotational_lock: c.has_rotational_lock(),
                    motor_speed: c.is_motor_enabled().then(|| c.get_motor_speed()),
                    lower_limit: c.get_lower_limit(),
                    upper_limit: c.get_upper_limit(),
                }
            } else if let Some(c) = any.downcast_ref::<LockConstraint>() {
                ConstraintDocument::LockConstraint {
                    body_a,
                    body_b,
                    local_offset_b: v2a(c.get_local_offset_b()),
                    local_angle_b: c.get_local_angle_b(),
                    max_force: c.get_max_force(),
                }
            } else {
                warn!(kind = constraint.constraint_type(), "skipping constraint that cannot be serialized");
                continue;
            };
            constraints.push(document);
        }

        let contact_materials = self
            .contact_materials
            .iter()
            .map(|cm| ContactMaterialDocument {
                id: cm.id,
                material_a: cm.material_a.id,
                material_b: cm.material_b.id,
                friction: cm.friction,
                restitution: cm.restitution,
                stiffness: cm.stiffness,
                relaxation: cm.relaxation,
                friction_stiffness: cm.friction_stiffness,
                friction_relaxation: cm.friction_relaxation,
                surface_velocity: cm.surface_velocity,
            })
            .collect();

        Ok(WorldDocument {
            p2: CURRENT_VERSION.to_string(),
            gravity: v2a(self.config.gravity),
            solver: solver_document(self.solver.as_ref()),
            broadphase: broadphase_document(self.broadphase.as_ref()),
            bodies,
            springs,
            constraints,
            contact_materials,
        })
    }
}

fn body_document(handle: BodyHandle, body: &RigidBody) -> BodyDocument {
    let shapes = body
        .shapes
        .iter()
        .map(|attached| {
            let geometry = match attached.shape.kind() {
                ShapeKind::Circle { radius } => GeometryDocument::Circle { radius: *radius },
                ShapeKind::Particle => GeometryDocument::Particle,
                ShapeKind::Plane => GeometryDocument::Plane,
                ShapeKind::Line { length } => GeometryDocument::Line { length: *length },
                ShapeKind::Rectangle { width, height, .. } => GeometryDocument::Rectangle { width: *width, height: *height },
                ShapeKind::Convex(polygon) => GeometryDocument::Convex {
                    verts: polygon.get_vertices().iter().map(|v| v2a(*v)).collect(),
                },
                ShapeKind::Capsule { length, radius } => GeometryDocument::Capsule { length: *length, radius: *radius },
            };
            ShapeDocument {
                geometry,
                offset: v2a(attached.offset),
                angle: attached.angle,
                collision_group: attached.shape.collision_group.bits(),
                collision_mask: attached.shape.collision_mask.bits(),
                material: attached.shape.material.map(|m| MaterialDocument { id: m.id }),
            }
        })
        .collect();

    BodyDocument {
        id: handle.id(),
        mass: body.mass,
        motion_state: body.motion_state,
        angle: body.angle,
        position: v2a(body.position),
        velocity: v2a(body.velocity),
        angular_velocity: body.angular_velocity,
        force: v2a(body.force),
        damping: body.damping,
        angular_damping: body.angular_damping,
        fixed_rotation: body.fixed_rotation,
        shapes,
    }
}

fn solver_document(solver: &dyn Solver) -> Option<SolverDocument> {
    if let Some(gs) = solver.as_any().downcast_ref::<GsSolver>() {
        return Some(SolverDocument::GaussSeidel { iterations: gs.iterations, tolerance: gs.tolerance });
    }
    if let Some(island) = solver.as_any().downcast_ref::<IslandSolver>() {
        if let Some(gs) = island.get_subsolver().as_any().downcast_ref::<GsSolver>() {
            return Some(SolverDocument::Island { iterations: gs.iterations, tolerance: gs.tolerance });
        }
    }
    warn!(solver = solver.name(), "solver settings not serialized");
    None
}

fn broadphase_document(broadphase: &dyn BroadPhase) -> Option<BroadphaseDocument> {
    let any = broadphase.as_any();
    if any.is::<NaiveBroadPhase>() {
        Some(BroadphaseDocument::Naive)
    } else if let Some(sap) = any.downcast_ref::<SapBroadPhase>() {
        Some(BroadphaseDocument::SweepAndPrune { axis_index: sap.axis_index })
    } else if let Some(grid) = any.downcast_ref::<GridBroadPhase>() {
        Some(BroadphaseDocument::Grid {
            xmin: grid.xmin,
            xmax: grid.xmax,
            ymin: grid.ymin,
            ymax: grid.ymax,
            nx: grid.nx,
            ny: grid.ny,
        })
    } else if let Some(tree) = any.downcast_ref::<QuadTreeBroadPhase>() {
        Some(BroadphaseDocument::QuadTree {
            min: v2a(tree.bounds.min),
            max: v2a(tree.bounds.max),
            max_depth: tree.max_depth,
            max_children: tree.max_children,
        })
    } else {
        warn!(broadphase = broadphase.name(), "broad-phase settings not serialized");
        None
    }
}

fn restore(document: &WorldDocument) -> Result<RestoredWorld> {
    let mut bodies = BodyStorage::new();
    let mut handles = Vec::with_capacity(document.bodies.len());
    for jb in &document.bodies {
        let body = restore_body(jb)?;
        let handle = BodyHandle(jb.id);
        bodies
            .insert_with_handle(handle, body)
            .map_err(|_| PhysicsError::Serialization(format!("duplicate body id {}", jb.id)))?;
        if let Some(body) = bodies.get_mut(handle) {
            body.id = Some(handle);
        }
        handles.push(handle);
    }

    let body_at = |index: usize| {
        handles
            .get(index)
            .copied()
            .ok_or_else(|| PhysicsError::Serialization(format!("body index {} out of range", index)))
    };

    let mut springs = SpringStorage::new();
    for js in &document.springs {
        let mut spring = Spring::new(body_at(js.body_a)?, body_at(js.body_b)?)
            .with_stiffness(js.stiffness)
            .with_damping(js.damping)
            .with_rest_length(js.rest_length)
            .with_local_anchors(a2v(js.local_anchor_a), a2v(js.local_anchor_b));
        spring.refresh_affected_bodies();
        springs.add(spring);
    }

    let mut constraints: ConstraintStorage<Box<dyn Constraint>> = ConstraintStorage::new();
    for jc in &document.constraints {
        let constraint: Box<dyn Constraint> = match jc {
            ConstraintDocument::DistanceConstraint { body_a, body_b, distance, max_force, local_anchor_a, local_anchor_b } => Box::new(
                DistanceConstraint::new(body_at(*body_a)?, body_at(*body_b)?, *distance)
                    .with_local_anchors(a2v(*local_anchor_a), a2v(*local_anchor_b))
                    .with_max_force(*max_force),
            ),
            ConstraintDocument::PointToPointConstraint {
                body_a,
                body_b,
                pivot_a,
                pivot_b,
                max_force,
                motor_speed,
                motor_max_force,
                lower_limit,
                upper_limit,
            } => {
                let mut c = PointToPointConstraint::new(body_at(*body_a)?, a2v(*pivot_a), body_at(*body_b)?, a2v(*pivot_b))
                    .with_max_force(*max_force);
                if let Some(speed) = motor_speed {
                    c.enable_motor();
                    c.set_motor_speed(*speed);
                }
                if let Some(force) = motor_max_force {
                    c.set_motor_max_force(*force);
                }
                c.set_lower_limit(*lower_limit);
                c.set_upper_limit(*upper_limit);
                Box::new(c)
            }
            ConstraintDocument::PrismaticConstraint {
                body_a,
                body_b,
                local_axis_a,
                local_anchor_a,
                local_anchor_b,
                max_force,
                rotational_lock,
                motor_speed,
                lower_limit,
                upper_limit,
            } => {
                let mut c = PrismaticConstraint::new(body_at(*body_a)?, body_at(*body_b)?)
                    .with_local_axis(a2v(*local_axis_a))
                    .with_local_anchors(a2v(*local_anchor_a), a2v(*local_anchor_b))
                    .with_max_force(*max_force);
                c.set_rotational_lock(*rotational_lock);
                if let Some(speed) = motor_speed {
                    c.enable_motor();
                    c.set_motor_speed(*speed);
                }
                c.set_lower_limit(*lower_limit);
                c.set_upper_limit(*upper_limit);
                Box::new(c)
            }
            ConstraintDocument::LockConstraint { body_a, body_b, local_offset_b, local_angle_b, max_force } => Box::new(
                LockConstraint::new(body_at(*body_a)?, body_at(*body_b)?, a2v(*local_offset_b), *local_angle_b)
                    .with_max_force(*max_force),
            ),
        };
        constraints.add(constraint);
    }

    let contact_materials = document
        .contact_materials
        .iter()
        .map(|jm| {
            let mut cm = ContactMaterial::new(Material::with_id(jm.material_a), Material::with_id(jm.material_b));
            cm.id = jm.id;
            cm.friction = jm.friction;
            cm.restitution = jm.restitution;
            cm.stiffness = jm.stiffness;
            cm.relaxation = jm.relaxation;
            cm.friction_stiffness = jm.friction_stiffness;
            cm.friction_relaxation = jm.friction_relaxation;
            cm.surface_velocity = jm.surface_velocity;
            cm
        })
        .collect();

    let solver: Option<Box<dyn Solver>> = document.solver.as_ref().map(|js| match *js {
        SolverDocument::GaussSeidel { iterations, tolerance } => {
            Box::new(GsSolver::with_iterations(iterations, tolerance)) as Box<dyn Solver>
        }
        SolverDocument::Island { iterations, tolerance } => {
            Box::new(IslandSolver::new(Box::new(GsSolver::with_iterations(iterations, tolerance)))) as Box<dyn Solver>
        }
    });

    let broadphase: Option<Box<dyn BroadPhase>> = match document.broadphase {
        None => None,
        Some(BroadphaseDocument::Naive) => Some(Box::new(NaiveBroadPhase::new())),
        Some(BroadphaseDocument::SweepAndPrune { axis_index }) => Some(Box::new(SapBroadPhase::new().with_axis(axis_index))),
        Some(BroadphaseDocument::Grid { xmin, xmax, ymin, ymax, nx, ny }) => {
            Some(Box::new(GridBroadPhase::new(xmin, xmax, ymin, ymax, nx, ny)?))
        }
        Some(BroadphaseDocument::QuadTree { min, max, max_depth, max_children }) => Some(Box::new(
            QuadTreeBroadPhase::new(Aabb::new(a2v(min), a2v(max))).with_limits(max_depth, max_children),
        )),
    };

    Ok(RestoredWorld {
        gravity: a2v(document.gravity),
        solver,
        broadphase,
        bodies,
        springs,
        constraints,
        contact_materials,
    })
}

fn restore_body(jb: &BodyDocument) -> Result<RigidBody> {
    let position = a2v(jb.position);
    let mut body = match jb.motion_state {
        MotionState::Dynamic => RigidBody::new_dynamic(jb.mass, position)?,
        MotionState::Static => RigidBody::new_static(position),
        MotionState::Kinematic => RigidBody::new_kinematic(position),
    };
    body.set_mass(jb.mass)?;

    for js in &jb.shapes {
        let mut shape = match &js.geometry {
            GeometryDocument::Circle { radius } => Shape::circle(*radius)?,
            GeometryDocument::Particle => Shape::particle(),
            GeometryDocument::Plane => Shape::plane(),
            GeometryDocument::Line { length } => Shape::line(*length)?,
            GeometryDocument::Rectangle { width, height } => Shape::rectangle(*width, *height)?,
            GeometryDocument::Convex { verts } => Shape::convex(verts.iter().map(|v| a2v(*v)).collect())?,
            GeometryDocument::Capsule { length, radius } => Shape::capsule(*length, *radius)?,
        };
        shape.collision_group = CollisionGroup::from_bits_retain(js.collision_group);
        shape.collision_mask = CollisionGroup::from_bits_retain(js.collision_mask);
        shape.material = js.material.map(|m| Material::with_id(m.id));
        body.add_shape(shape, a2v(js.offset), js.angle);
    }

    body.angle = jb.angle;
    body.velocity = a2v(jb.velocity);
    body.angular_velocity = jb.angular_velocity;
    body.force = a2v(jb.force);
    body.damping = jb.damping;
    body.angular_damping = jb.angular_damping;
    body.set_fixed_rotation(jb.fixed_rotation);
    Ok(body)
}
