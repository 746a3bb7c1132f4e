use phys2d_engine::{
    PhysicsWorld, SimulationConfig, WorldOptions, RigidBody, Material, ContactMaterial, Shape,
    DistanceConstraint, LockConstraint, PointToPointConstraint, PrismaticConstraint, Spring, WorldEvent,
    GsSolver, IslandSolver, Vector2, BodyHandle,
};
use phys2d_engine::core::{WorldEventType, ImpactMatching, Storage};
use phys2d_engine::error::PhysicsError;
use approx::assert_relative_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

const DT: f32 = 1.0 / 60.0;

fn zero_gravity() -> SimulationConfig {
    SimulationConfig {
        gravity: Vector2::zero(),
        ..SimulationConfig::default()
    }
}

fn ground() -> RigidBody {
    RigidBody::new_static(Vector2::zero()).with_shape(Shape::plane(), Vector2::zero(), 0.0)
}

fn ball(position: Vector2, radius: f32) -> RigidBody {
    RigidBody::new_dynamic(1.0, position)
        .unwrap()
        .with_shape(Shape::circle(radius).unwrap(), Vector2::zero(), 0.0)
}

fn run(world: &mut PhysicsWorld, steps: usize) {
    for _ in 0..steps {
        world.step(DT).unwrap();
    }
}

#[test]
fn test_free_fall() {
    let mut world = PhysicsWorld::new();
    let handle = world.add_body(ball(Vector2::new(0.0, 100.0), 0.5).with_damping(0.0, 0.0));

    // Semi-implicit Euler: v_n = n g dt, y_n = y0 + g dt² n(n+1)/2
    let steps = 60;
    run(&mut world, steps);

    let g = world.get_gravity().y;
    let body = world.get_body(handle).unwrap();
    let n = steps as f32;
    assert_relative_eq!(body.get_velocity().y, g * DT * n, epsilon = 1e-3);
    assert_relative_eq!(body.get_position().y, 100.0 + g * DT * DT * n * (n + 1.0) / 2.0, epsilon = 1e-2);
    assert_relative_eq!(world.get_time(), 1.0, epsilon = 1e-4);
}

#[test]
fn test_elastic_head_on_swap() {
    let mut world = PhysicsWorld::with_config(zero_gravity());

    // Frictionless, perfectly elastic surface
    let material = Material::new();
    world.add_contact_material(
        ContactMaterial::new(material, material)
            .with_restitution(1.0)
            .with_friction(0.0),
    );

    let make = |x: f32, vx: f32| {
        RigidBody::new_dynamic(1.0, Vector2::new(x, 0.0))
            .unwrap()
            .with_shape(Shape::circle(0.5).unwrap().with_material(material), Vector2::zero(), 0.0)
            .with_velocity(Vector2::new(vx, 0.0))
            .with_damping(0.0, 0.0)
    };
    let a = world.add_body(make(-0.52, 1.0));
    let b = world.add_body(make(0.52, -1.0));

    run(&mut world, 10);

    let va = world.get_body(a).unwrap().get_velocity();
    let vb = world.get_body(b).unwrap().get_velocity();
    assert_relative_eq!(va.x, -1.0, epsilon = 1e-2);
    assert_relative_eq!(vb.x, 1.0, epsilon = 1e-2);
    assert_relative_eq!(va.y, 0.0, epsilon = 1e-4);

    // One impact for the single collision
    assert_eq!(world.events().get_events_of_type(WorldEventType::Impact).len(), 1);
}

#[test]
fn test_resting_circle_on_plane() {
    let mut world = PhysicsWorld::new();
    world.add_body(ground());
    let handle = world.add_body(ball(Vector2::new(0.0, 1.0), 0.5));

    run(&mut world, 180);

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_position().y, 0.5, epsilon = 0.05);
    assert!(body.get_velocity().length() < 0.1);
    assert!(body.get_position().x.abs() < 1e-3);
}

#[test]
fn test_static_bodies_never_move() {
    let mut world = PhysicsWorld::new();
    let floor = world.add_body(ground());
    let platform = world.add_body(
        RigidBody::new_static(Vector2::new(3.0, 1.0))
            .with_shape(Shape::rectangle(2.0, 0.2).unwrap(), Vector2::zero(), 0.0),
    );

    for i in 0..5 {
        world.add_body(
            RigidBody::new_dynamic(1.0, Vector2::new(i as f32 * 0.8, 2.0 + i as f32))
                .unwrap()
                .with_shape(Shape::rectangle(0.5, 0.5).unwrap(), Vector2::zero(), 0.0),
        );
    }

    run(&mut world, 120);

    let floor = world.get_body(floor).unwrap();
    assert_eq!(floor.get_position(), Vector2::zero());
    assert_eq!(floor.get_angle(), 0.0);
    assert_eq!(floor.get_velocity(), Vector2::zero());

    let platform = world.get_body(platform).unwrap();
    assert_eq!(platform.get_position(), Vector2::new(3.0, 1.0));
    assert_eq!(platform.get_angular_velocity(), 0.0);
}

#[test]
fn test_kinematic_body_ignores_gravity() {
    let mut world = PhysicsWorld::new();
    let handle = world.add_body(RigidBody::new_kinematic(Vector2::zero()).with_velocity(Vector2::new(2.0, 0.0)));

    run(&mut world, 60);

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_position().x, 2.0, epsilon = 1e-3);
    assert_eq!(body.get_position().y, 0.0);
}

#[test]
fn test_contact_multipliers_are_non_negative() {
    let mut world = PhysicsWorld::new();
    world.add_body(ground());
    for i in 0..4 {
        world.add_body(ball(Vector2::new(i as f32 * 0.3, 0.45 + i as f32 * 0.9), 0.5));
    }

    for _ in 0..120 {
        world.step(DT).unwrap();
        for eq in &world.get_narrowphase().contact_equations {
            assert!(eq.multiplier >= 0.0, "negative contact multiplier {}", eq.multiplier);
        }
    }
    assert!(!world.get_narrowphase().contact_equations.is_empty());
}

#[test]
fn test_distance_constraint_holds() {
    let mut world = PhysicsWorld::new();
    let anchor = world.add_body(RigidBody::new_static(Vector2::zero()));
    let bob = world.add_body(ball(Vector2::new(1.0, 0.0), 0.1));

    let constraint = {
        let a = world.get_body(anchor).unwrap();
        let b = world.get_body(bob).unwrap();
        DistanceConstraint::from_bodies(anchor, a, bob, b)
    };
    assert_relative_eq!(constraint.get_distance(), 1.0);
    world.add_constraint(Box::new(constraint)).unwrap();

    for step in 1..=120 {
        world.step(DT).unwrap();
        let position = world.get_body(bob).unwrap().get_position();
        assert_relative_eq!(position.length(), 1.0, epsilon = 0.05);

        // Close to a quarter period the pendulum hangs low
        if step == 30 {
            assert!(position.y < -0.5, "pendulum did not swing down: {:?}", position);
        }
    }
}

#[test]
fn test_motor_spins_body() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let base = world.add_body(RigidBody::new_static(Vector2::zero()));
    let wheel = world.add_body(ball(Vector2::zero(), 0.5));

    let mut joint = PointToPointConstraint::new(base, Vector2::zero(), wheel, Vector2::zero());
    joint.enable_motor();
    joint.set_motor_speed(2.0);
    assert!(joint.is_motor_enabled());
    world.add_constraint(Box::new(joint)).unwrap();

    run(&mut world, 60);

    let body = world.get_body(wheel).unwrap();
    assert_relative_eq!(body.get_angular_velocity(), 2.0, epsilon = 0.05);
    assert!(body.get_position().length() < 1e-3);
}

#[test]
fn test_revolute_limits_hold_angle() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let base = world.add_body(RigidBody::new_static(Vector2::zero()));
    let wheel = world.add_body(ball(Vector2::zero(), 0.5).with_damping(0.0, 0.0));
    world.get_body_mut(wheel).unwrap().set_angular_velocity(5.0);

    let mut joint = PointToPointConstraint::new(base, Vector2::zero(), wheel, Vector2::zero());
    joint.set_limits(-0.5, 0.5);
    world.add_constraint(Box::new(joint)).unwrap();

    run(&mut world, 60);

    let angle = world.get_body(wheel).unwrap().get_angle();
    assert!(angle < 0.6, "angle {} exceeded the upper limit", angle);
}

#[test]
fn test_prismatic_keeps_body_on_axis() {
    let mut world = PhysicsWorld::new();
    let rail = world.add_body(RigidBody::new_static(Vector2::zero()));
    let slider = world.add_body(
        ball(Vector2::new(1.0, 0.0), 0.2)
            .with_velocity(Vector2::new(1.0, 0.0))
            .with_damping(0.0, 0.0),
    );

    let joint = PrismaticConstraint::new(rail, slider);
    assert!(joint.has_rotational_lock());
    world.add_constraint(Box::new(joint)).unwrap();

    for _ in 0..60 {
        world.step(DT).unwrap();
        let body = world.get_body(slider).unwrap();
        assert!(body.get_position().y.abs() < 0.01, "slider left the axis: {:?}", body.get_position());
        assert!(body.get_angle().abs() < 0.01);
    }

    // Sliding along the axis is free
    let x = world.get_body(slider).unwrap().get_position().x;
    assert_relative_eq!(x, 2.0, epsilon = 0.05);
}

#[test]
fn test_prismatic_upper_limit() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let rail = world.add_body(RigidBody::new_static(Vector2::zero()));
    let slider = world.add_body(
        ball(Vector2::new(0.0, 0.0), 0.2)
            .with_velocity(Vector2::new(2.0, 0.0))
            .with_damping(0.0, 0.0),
    );

    let mut joint = PrismaticConstraint::new(rail, slider);
    joint.set_limits(-1.0, 1.0);
    world.add_constraint(Box::new(joint)).unwrap();

    run(&mut world, 120);

    let x = world.get_body(slider).unwrap().get_position().x;
    assert!(x < 1.1, "slider passed the limit: {}", x);
}

#[test]
fn test_spring_pulls_bodies_together() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(ball(Vector2::new(0.0, 0.0), 0.1));
    let b = world.add_body(ball(Vector2::new(3.0, 0.0), 0.1));

    let spring = Spring::new(a, b).with_rest_length(1.0).with_stiffness(10.0).with_damping(0.0);

    // The force on B points back toward A with magnitude k (len - rest)
    let force = spring.compute_force(world.get_body(a).unwrap(), world.get_body(b).unwrap());
    assert_relative_eq!(force.x, -20.0, epsilon = 1e-4);
    assert_relative_eq!(force.y, 0.0, epsilon = 1e-6);

    let handle = world.add_spring(spring).unwrap();
    world.step(DT).unwrap();

    assert!(world.get_body(a).unwrap().get_velocity().x > 0.0);
    assert!(world.get_body(b).unwrap().get_velocity().x < 0.0);

    // Without spring forces nothing moves
    world.remove_spring(handle).unwrap();
    let before = world.get_body(b).unwrap().get_velocity();
    world.get_config_mut().apply_damping = false;
    world.step(DT).unwrap();
    assert_eq!(world.get_body(b).unwrap().get_velocity(), before);
}

#[test]
fn test_island_solver_matches_monolithic() {
    let build = |solver: Option<Box<dyn phys2d_engine::Solver>>| {
        let mut world = PhysicsWorld::with_options(WorldOptions { solver, ..WorldOptions::default() });
        world.add_body(ground());
        for stack in 0..2 {
            let x = stack as f32 * 10.0 - 5.0;
            for level in 0..3 {
                world.add_body(ball(Vector2::new(x, 0.45 + level as f32 * 0.95), 0.5));
            }
        }
        world
    };

    let mut monolithic = build(None);
    let mut islands = build(Some(Box::new(IslandSolver::new(Box::new(GsSolver::new())))));

    for _ in 0..60 {
        monolithic.step(DT).unwrap();
        islands.step(DT).unwrap();
    }

    // Two stacks on a shared static ground are independent islands
    assert_eq!(islands.num_islands(), Some(2));
    assert_eq!(monolithic.num_islands(), None);

    for (handle, body) in monolithic.get_bodies().iter() {
        let other = islands.get_body(handle).unwrap();
        assert_relative_eq!(body.get_position().x, other.get_position().x, epsilon = 1e-4);
        assert_relative_eq!(body.get_position().y, other.get_position().y, epsilon = 1e-4);
        assert_relative_eq!(body.get_velocity().y, other.get_velocity().y, epsilon = 1e-3);
    }
}

#[test]
fn test_island_solver_matches_monolithic_with_cycles() {
    let build = |solver: Option<Box<dyn phys2d_engine::Solver>>| {
        let mut world = PhysicsWorld::with_options(WorldOptions { solver, ..WorldOptions::default() });
        let anchor = world.add_body(RigidBody::new_static(Vector2::new(0.0, 5.0)));

        // A triangle of rods hung from the anchor closes a loop in the constraint graph
        let corners = [Vector2::new(0.0, 3.0), Vector2::new(-1.0, 1.5), Vector2::new(1.2, 1.4)];
        let handles: Vec<BodyHandle> = corners.iter().map(|&p| world.add_body(ball(p, 0.2))).collect();
        world.add_constraint(Box::new(DistanceConstraint::new(anchor, handles[0], 2.0))).unwrap();
        for i in 0..3 {
            let (a, b) = (handles[i], handles[(i + 1) % 3]);
            let distance = corners[i].distance(&corners[(i + 1) % 3]);
            world.add_constraint(Box::new(DistanceConstraint::new(a, b, distance))).unwrap();
        }

        // An unrelated pair
        let a = world.add_body(ball(Vector2::new(20.0, 4.0), 0.3).with_velocity(Vector2::new(1.0, 0.0)));
        let b = world.add_body(ball(Vector2::new(22.0, 4.0), 0.3));
        world.add_constraint(Box::new(DistanceConstraint::new(a, b, 2.0))).unwrap();
        world
    };

    let mut monolithic = build(None);
    let mut islands = build(Some(Box::new(IslandSolver::new(Box::new(GsSolver::new())))));

    for _ in 0..120 {
        monolithic.step(DT).unwrap();
        islands.step(DT).unwrap();
    }

    assert_eq!(islands.num_islands(), Some(2));

    for (handle, body) in monolithic.get_bodies().iter() {
        let other = islands.get_body(handle).unwrap();
        assert_relative_eq!(body.get_position().x, other.get_position().x, epsilon = 1e-4);
        assert_relative_eq!(body.get_position().y, other.get_position().y, epsilon = 1e-4);
        assert_relative_eq!(body.get_angle(), other.get_angle(), epsilon = 1e-4);
    }
}

#[test]
fn test_lock_constraint_keeps_relative_pose() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(ball(Vector2::zero(), 0.5).with_angle(0.3));
    let b = world.add_body(ball(Vector2::new(2.0, 0.5), 0.5).with_angle(-0.4));

    let lock = LockConstraint::from_bodies(a, world.get_body(a).unwrap(), b, world.get_body(b).unwrap());
    let offset = lock.get_local_offset_b();
    assert_relative_eq!(lock.get_local_angle_b(), -0.7, epsilon = 1e-6);
    world.add_constraint(Box::new(lock)).unwrap();

    // Spin and push one body, the other has to follow
    {
        let body = world.get_body_mut(a).unwrap();
        body.set_velocity(Vector2::new(1.0, -0.5));
        body.set_angular_velocity(2.0);
    }
    run(&mut world, 120);

    let (ba, bb) = (world.get_body(a).unwrap(), world.get_body(b).unwrap());
    assert!((ba.get_angle() - 0.3).abs() > 0.1);
    let local = bb.get_position().to_local_frame(&ba.get_position(), ba.get_angle());
    assert!(local.distance(&offset) < 0.02, "offset drifted to {}", local);
    assert_relative_eq!(bb.get_angle() - ba.get_angle(), -0.7, epsilon = 0.02);

    // The lock survives serialization
    let json = world.to_json().unwrap();
    assert_eq!(json["constraints"][0]["type"], "LockConstraint");
    let mut restored = PhysicsWorld::new();
    restored.from_json(&json).unwrap();
    assert_eq!(restored.to_json().unwrap(), json);
}

fn populated_world() -> PhysicsWorld {
    let mut world = PhysicsWorld::with_options(WorldOptions {
        gravity: Some(Vector2::new(0.0, -10.0)),
        ..WorldOptions::default()
    });

    let material = Material::new();
    world.add_contact_material(ContactMaterial::new(material, material).with_friction(0.5).with_restitution(0.2));

    let floor = world.add_body(ground());
    let a = world.add_body(
        RigidBody::new_dynamic(2.0, Vector2::new(0.0, 2.0))
            .unwrap()
            .with_shape(Shape::circle(0.5).unwrap().with_material(material), Vector2::new(0.1, 0.0), 0.0)
            .with_shape(Shape::capsule(1.0, 0.2).unwrap(), Vector2::zero(), 0.3),
    );
    let b = world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::new(2.0, 3.0))
            .unwrap()
            .with_shape(
                Shape::convex(vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)]).unwrap(),
                Vector2::zero(),
                0.0,
            )
            .with_shape(Shape::line(1.0).unwrap(), Vector2::new(0.0, -0.5), 0.0)
            .with_velocity(Vector2::new(0.5, 0.0)),
    );
    let c = world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::new(-2.0, 3.0))
            .unwrap()
            .with_shape(Shape::rectangle(1.0, 0.5).unwrap(), Vector2::zero(), 0.0)
            .with_shape(Shape::particle(), Vector2::new(0.0, 0.5), 0.0),
    );

    world.add_spring(Spring::new(a, b).with_rest_length(2.0).with_stiffness(50.0)).unwrap();
    world.add_constraint(Box::new(DistanceConstraint::new(a, c, 2.5).with_max_force(100.0))).unwrap();

    let mut revolute = PointToPointConstraint::new(floor, Vector2::new(0.0, 3.0), c, Vector2::zero());
    revolute.enable_motor();
    revolute.set_motor_speed(1.5);
    revolute.set_lower_limit(Some(-0.25));
    world.add_constraint(Box::new(revolute)).unwrap();

    let mut prismatic = PrismaticConstraint::new(floor, b).with_local_anchors(Vector2::new(0.0, 1.0), Vector2::zero());
    prismatic.set_upper_limit(Some(4.0));
    world.add_constraint(Box::new(prismatic)).unwrap();

    world
}

#[test]
fn test_json_round_trip() {
    let mut world = populated_world();
    run(&mut world, 5);

    let json = world.to_json().unwrap();
    assert_eq!(json["p2"], "0.4");
    assert_eq!(json["bodies"].as_array().unwrap().len(), 4);
    assert_eq!(json["constraints"][1]["type"], "PointToPointConstraint");

    let mut restored = PhysicsWorld::new();
    restored.from_json(&json).unwrap();
    assert_eq!(restored.body_count(), 4);
    assert_eq!(restored.spring_count(), 1);
    assert_eq!(restored.constraint_count(), 3);
    assert_eq!(restored.get_gravity(), Vector2::new(0.0, -10.0));

    // Serializing again reproduces the same document
    assert_eq!(restored.to_json().unwrap(), json);

    // Both worlds evolve identically from here
    run(&mut world, 10);
    run(&mut restored, 10);
    for (handle, body) in world.get_bodies().iter() {
        let other = restored.get_body(handle).unwrap();
        assert_relative_eq!(body.get_position().x, other.get_position().x, epsilon = 1e-4);
        assert_relative_eq!(body.get_position().y, other.get_position().y, epsilon = 1e-4);
    }
}

#[test]
fn test_json_string_round_trip() {
    let world = populated_world();
    let text = world.to_json_string().unwrap();

    let mut restored = PhysicsWorld::new();
    restored.from_json_str(&text).unwrap();
    assert_eq!(restored.to_json_string().unwrap(), text);
}

#[test]
fn test_version_error_leaves_world_untouched() {
    let mut world = populated_world();
    let before = world.to_json().unwrap();

    let mut document = before.clone();
    document["p2"] = json!("0.1");
    let result = world.from_json(&document);
    assert_eq!(result, Err(PhysicsError::SerializationVersion("0.1".to_string())));

    // A structurally broken document is rejected too
    let mut broken = before.clone();
    broken["springs"][0]["bodyA"] = json!(42);
    assert!(matches!(world.from_json(&broken), Err(PhysicsError::Serialization(_))));

    assert_eq!(world.to_json().unwrap(), before);
    assert_eq!(world.body_count(), 4);
}

#[test]
fn test_upgrade_old_document() {
    let document = json!({
        "p2": "0.3",
        "gravity": [0.0, -9.78],
        "bodies": [
            { "id": 1, "mass": 0.0, "motionState": "Static", "angle": 0.0, "position": [0.0, 0.0],
              "velocity": [0.0, 0.0], "angularVelocity": 0.0, "shapes": [] },
            { "id": 2, "mass": 1.0, "angle": 0.0, "position": [1.0, 0.0],
              "velocity": [0.0, 0.0], "angularVelocity": 0.0, "force": [0.0, 0.0],
              "shapes": [{ "type": "Circle", "radius": 0.5, "offset": [0.0, 0.0], "angle": 0.0,
                           "collisionGroup": 1, "collisionMask": 4294967295u32 }] }
        ],
        "constraints": [
            { "type": "PrismaticConstraint", "bodyA": 0, "bodyB": 1, "localAxisA": [0.0, 1.0],
              "localAxisB": [0.0, 1.0], "maxForce": 1000.0 }
        ]
    });

    let mut world = PhysicsWorld::new();
    world.from_json(&document).unwrap();
    assert_eq!(world.constraint_count(), 1);

    let json = world.to_json().unwrap();
    assert_eq!(json["constraints"][0]["localAxisA"], json!([1.0, 0.0]));
    assert!(world.get_body_by_id(2).is_some());
    assert!(world.get_body_by_id(3).is_none());
}

#[test]
fn test_clear_and_clone() {
    let mut world = populated_world();
    let copy = world.clone_world();
    world.clear();

    assert_eq!(world.body_count(), 0);
    assert_eq!(world.constraint_count(), 0);
    assert_eq!(world.spring_count(), 0);
    assert!(world.get_contact_materials().is_empty());

    assert_eq!(copy.body_count(), 4);
    assert_eq!(copy.constraint_count(), 3);
}

#[test]
fn test_contact_material_lookup() {
    let mut world = PhysicsWorld::new();
    let ice = Material::new();
    let steel = Material::new();
    let cm = ContactMaterial::new(ice, steel).with_friction(0.05);
    let id = cm.id;
    world.add_contact_material(cm);

    assert_eq!(world.get_contact_material(steel, ice).map(|cm| cm.id), Some(id));
    assert!(world.get_contact_material(ice, ice).is_none());
    assert!(world.remove_contact_material(id).is_some());
    assert!(world.get_contact_material(ice, steel).is_none());
}

#[test]
fn test_hit_test() {
    let mut world = PhysicsWorld::new();
    let disc = world.add_body(ball(Vector2::zero(), 1.0));
    let block = world.add_body(
        RigidBody::new_static(Vector2::new(5.0, 0.0)).with_shape(Shape::rectangle(2.0, 2.0).unwrap(), Vector2::zero(), 0.0),
    );
    let rod = world.add_body(
        RigidBody::new_static(Vector2::new(0.0, 5.0)).with_shape(Shape::line(2.0).unwrap(), Vector2::zero(), 0.0),
    );
    let all = [disc, block, rod];

    assert_eq!(world.hit_test(Vector2::new(0.5, 0.0), &all, 0.1), vec![disc]);
    assert_eq!(world.hit_test(Vector2::new(5.5, 0.5), &all, 0.1), vec![block]);
    assert_eq!(world.hit_test(Vector2::new(0.5, 5.05), &all, 0.1), vec![rod]);
    assert!(world.hit_test(Vector2::new(10.0, 10.0), &all, 0.1).is_empty());

    // Only the listed candidates are considered
    assert!(world.hit_test(Vector2::new(0.5, 0.0), &[block], 0.1).is_empty());
}

#[test]
fn test_remove_body_event_and_cleanup() {
    let mut world = PhysicsWorld::new();
    let a = world.add_body(ball(Vector2::zero(), 0.5));
    let b = world.add_body(ball(Vector2::new(2.0, 0.0), 0.5));
    world.add_constraint(Box::new(DistanceConstraint::new(a, b, 2.0))).unwrap();

    world.events_mut().clear();
    world.remove_body(b).unwrap();

    assert_eq!(world.constraint_count(), 0);
    let events = world.events_mut().drain();
    assert_eq!(events, vec![WorldEvent::RemoveBody { body: b }]);

    // Constraints to missing bodies are refused
    let result = world.add_constraint(Box::new(DistanceConstraint::new(a, b, 1.0)));
    assert!(matches!(result, Err(PhysicsError::ResourceNotFound(_))));
}

#[test]
fn test_listener_removes_body_after_impact() {
    let mut world = PhysicsWorld::new();
    let floor = world.add_body(ground());
    let falling = world.add_body(ball(Vector2::new(0.0, 0.6), 0.5));

    let impacts = Arc::new(Mutex::new(Vec::<(BodyHandle, BodyHandle)>::new()));
    let seen = impacts.clone();
    world.add_event_listener(move |event, commands| {
        if let WorldEvent::Impact { body_a, body_b, .. } = *event {
            seen.lock().unwrap().push((body_a, body_b));
            commands.remove_body(falling);
        }
    });

    run(&mut world, 30);

    let impacts = impacts.lock().unwrap();
    assert_eq!(impacts.len(), 1);
    let (a, b) = impacts[0];
    assert!((a == floor && b == falling) || (a == falling && b == floor));

    // The removal waited for the step to finish, then happened once
    assert!(world.get_body(falling).is_err());
    assert_eq!(world.body_count(), 1);
    assert_eq!(world.events().get_events_of_type(WorldEventType::RemoveBody).len(), 1);
}

#[test]
fn test_impact_matching_by_body_pair() {
    let mut config = SimulationConfig::default();
    config.impact_matching = ImpactMatching::BodyPair;
    let mut world = PhysicsWorld::with_config(config);
    world.add_body(ground());

    // Two shapes touch the ground in the same step
    world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::new(0.0, 0.45))
            .unwrap()
            .with_shape(Shape::circle(0.5).unwrap(), Vector2::new(-1.0, 0.0), 0.0)
            .with_shape(Shape::circle(0.5).unwrap(), Vector2::new(1.0, 0.0), 0.0),
    );

    world.step(DT).unwrap();
    assert_eq!(world.events().get_events_of_type(WorldEventType::Impact).len(), 2);

    world.events_mut().clear();
    world.step(DT).unwrap();
    assert!(world.events().get_events_of_type(WorldEventType::Impact).is_empty());
}

#[test]
fn test_disabled_solver_lets_bodies_sink() {
    let mut config = SimulationConfig::default();
    config.solve_constraints = false;
    let mut world = PhysicsWorld::with_config(config);
    world.add_body(ground());
    let handle = world.add_body(ball(Vector2::new(0.0, 0.5), 0.5));

    run(&mut world, 30);
    assert!(world.get_body(handle).unwrap().get_position().y < 0.0);
}

#[test]
fn test_unit_circle_settles_on_plane() {
    let mut world = PhysicsWorld::with_options(WorldOptions {
        gravity: Some(Vector2::new(0.0, -10.0)),
        ..Default::default()
    });
    world.add_body(ground());
    let handle = world.add_body(ball(Vector2::new(0.0, 1.0), 1.0));

    for _ in 0..120 {
        world.step(DT).unwrap();
        let y = world.get_body(handle).unwrap().get_position().y;
        assert!(y >= 1.0 - 1e-3, "circle sank to {}", y);
        assert!(y <= 1.0 + 1e-2, "circle bounced to {}", y);
    }

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_position().y, 1.0, epsilon = 1e-3);
    assert_relative_eq!(body.get_velocity().y, 0.0, epsilon = 1e-2);
}

#[test]
fn test_spinning_pair_keeps_distance() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::zero())
            .unwrap()
            .with_velocity(Vector2::new(0.0, -2.0))
            .with_damping(0.0, 0.0),
    );
    let b = world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::new(5.0, 0.0))
            .unwrap()
            .with_velocity(Vector2::new(0.0, 2.0))
            .with_damping(0.0, 0.0),
    );
    world.add_constraint(Box::new(DistanceConstraint::new(a, b, 5.0))).unwrap();

    for _ in 0..300 {
        world.step(DT).unwrap();
        let pa = world.get_body(a).unwrap().get_position();
        let pb = world.get_body(b).unwrap().get_position();
        assert_relative_eq!(pa.distance(&pb), 5.0, epsilon = 0.05);
    }

    // Equal masses pulled by equal and opposite impulses keep zero total momentum
    let total = world.get_body(a).unwrap().get_velocity() + world.get_body(b).unwrap().get_velocity();
    assert!(total.length() < 1e-3, "momentum drifted to {:?}", total);
}

#[test]
fn test_profiling_records_step_duration() {
    let mut world = PhysicsWorld::new();
    world.add_body(ground());
    world.add_body(ball(Vector2::new(0.0, 1.0), 0.5));

    world.step(DT).unwrap();
    assert_eq!(world.get_last_step_duration(), None);

    world.get_config_mut().profile = true;
    world.step(DT).unwrap();
    assert!(world.get_last_step_duration().is_some());

    world.get_config_mut().profile = false;
    world.step(DT).unwrap();
    assert_eq!(world.get_last_step_duration(), None);
}
