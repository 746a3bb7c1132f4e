use phys2d_engine::collision::{
    BroadPhase, CollisionGroup, ContactPoint, GridBroadPhase, NaiveBroadPhase, NarrowPhase, QuadTreeBroadPhase,
    SapBroadPhase, ShapeContext,
};
use phys2d_engine::core::{BodyHandle, BodyStorage, Storage};
use phys2d_engine::error::PhysicsError;
use phys2d_engine::math::{Aabb, Vector2};
use phys2d_engine::{PhysicsWorld, RigidBody, Shape, WorldOptions};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_circles(count: usize, seed: u64) -> BodyStorage<RigidBody> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bodies = BodyStorage::new();

    for _ in 0..count {
        let position = Vector2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));
        let radius = rng.gen_range(0.2..2.0);
        let body = RigidBody::new_dynamic(1.0, position)
            .unwrap()
            .with_shape(Shape::circle(radius).unwrap(), Vector2::zero(), 0.0);
        bodies.add(body);
    }

    bodies
}

/// Collects the flat pair list as sorted, normalized pairs
fn pair_set(flat: &[BodyHandle]) -> Vec<(BodyHandle, BodyHandle)> {
    assert_eq!(flat.len() % 2, 0);
    let mut pairs: Vec<_> = flat
        .chunks(2)
        .map(|p| if p[0] <= p[1] { (p[0], p[1]) } else { (p[1], p[0]) })
        .collect();
    pairs.sort();
    pairs
}

fn shape_context(handle: BodyHandle, body: &RigidBody) -> ShapeContext<'_> {
    ShapeContext::from_body(handle, body, 0).unwrap()
}

/// Contacts between the first shapes of two bodies, normals out of `a`
fn contacts_between(a: RigidBody, b: RigidBody) -> Vec<ContactPoint> {
    let mut bodies = BodyStorage::new();
    let ha = bodies.add(a);
    let hb = bodies.add(b);
    NarrowPhase::generate_contacts(
        &shape_context(ha, bodies.get(ha).unwrap()),
        &shape_context(hb, bodies.get(hb).unwrap()),
    )
}

#[test]
fn test_naive_broadphase_finds_every_overlap() {
    let bodies = random_circles(60, 7);
    let mut naive = NaiveBroadPhase::new();
    let pairs = pair_set(&naive.get_collision_pairs(&bodies).unwrap());

    // No duplicates and no self pairs
    let mut unique = pairs.clone();
    unique.dedup();
    assert_eq!(unique.len(), pairs.len());
    assert!(pairs.iter().all(|(a, b)| a != b));

    let handles = bodies.handles();
    for (i, &a) in handles.iter().enumerate() {
        for &b in &handles[i + 1..] {
            let (ba, bb) = (bodies.get(a).unwrap(), bodies.get(b).unwrap());
            let r = ba.get_bounding_radius() + bb.get_bounding_radius();
            if ba.get_position().distance(&bb.get_position()) < r {
                let key = if a <= b { (a, b) } else { (b, a) };
                assert!(pairs.contains(&key), "missing overlapping pair {:?}", key);
            }
        }
    }
}

fn random_mixed_shapes(count: usize, seed: u64) -> BodyStorage<RigidBody> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bodies = BodyStorage::new();

    for _ in 0..count {
        let shape = match rng.gen_range(0..5) {
            0 => Shape::circle(rng.gen_range(0.3..1.5)).unwrap(),
            1 => Shape::rectangle(rng.gen_range(0.5..3.0), rng.gen_range(0.5..3.0)).unwrap(),
            2 => Shape::capsule(rng.gen_range(0.5..2.5), rng.gen_range(0.2..0.6)).unwrap(),
            3 => Shape::convex(vec![
                Vector2::new(-1.0, -0.5),
                Vector2::new(1.2, -0.4),
                Vector2::new(0.6, 0.9),
                Vector2::new(-0.7, 0.6),
            ])
            .unwrap(),
            _ => Shape::line(rng.gen_range(0.5..3.0)).unwrap(),
        };
        let position = Vector2::new(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0));
        let offset = Vector2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
        let body = RigidBody::new_dynamic(1.0, position)
            .unwrap()
            .with_angle(rng.gen_range(-3.0..3.0))
            .with_shape(shape, offset, rng.gen_range(-3.0..3.0));
        bodies.add(body);
    }

    // A tilted floor crossing the lower part of the scene
    bodies.add(
        RigidBody::new_static(Vector2::new(0.0, -8.0))
            .with_angle(0.2)
            .with_shape(Shape::plane(), Vector2::new(0.0, 0.3), 0.1),
    );

    bodies
}

#[test]
fn test_broadphases_cover_exact_contacts_on_mixed_shapes() {
    let bodies = random_mixed_shapes(60, 11);
    let expected = pair_set(&NaiveBroadPhase::new().get_collision_pairs(&bodies).unwrap());

    // Every pair the narrow phase actually touches must be reported
    let handles = bodies.handles();
    let mut touching = 0;
    for (i, &a) in handles.iter().enumerate() {
        for &b in &handles[i + 1..] {
            let (ba, bb) = (bodies.get(a).unwrap(), bodies.get(b).unwrap());
            if ba.is_static() && bb.is_static() {
                continue;
            }
            let contacts = NarrowPhase::generate_contacts(&shape_context(a, ba), &shape_context(b, bb));
            if !contacts.is_empty() {
                touching += 1;
                let key = if a <= b { (a, b) } else { (b, a) };
                assert!(expected.contains(&key), "touching pair {:?} missed by the naive broadphase", key);
            }
        }
    }
    assert!(touching > 0);

    let mut sap = SapBroadPhase::new();
    for handle in bodies.handles() {
        sap.on_body_added(handle);
    }
    assert_eq!(pair_set(&sap.get_collision_pairs(&bodies).unwrap()), expected);

    let bounds = Aabb::new(Vector2::new(-15.0, -15.0), Vector2::new(15.0, 15.0));
    let mut quadtree = QuadTreeBroadPhase::new(bounds).with_limits(5, 2);
    assert_eq!(pair_set(&quadtree.get_collision_pairs(&bodies).unwrap()), expected);
}

#[test]
fn test_broadphases_agree_with_naive() {
    let bodies = random_circles(80, 42);
    let expected = pair_set(&NaiveBroadPhase::new().get_collision_pairs(&bodies).unwrap());
    assert!(!expected.is_empty());

    for axis in 0..2 {
        let mut sap = SapBroadPhase::new().with_axis(axis);
        for handle in bodies.handles() {
            sap.on_body_added(handle);
        }
        let pairs = pair_set(&sap.get_collision_pairs(&bodies).unwrap());
        assert_eq!(pairs, expected, "sweep and prune along axis {}", axis);
        assert_eq!(sap.get_axis_list().len(), bodies.len());
    }

    let bounds = Aabb::new(Vector2::new(-25.0, -25.0), Vector2::new(25.0, 25.0));
    let mut quadtree = QuadTreeBroadPhase::new(bounds).with_limits(5, 2);
    assert_eq!(pair_set(&quadtree.get_collision_pairs(&bodies).unwrap()), expected);

    // A tree smaller than the scene keeps outsiders at the root
    let mut small = QuadTreeBroadPhase::new(Aabb::new(Vector2::new(-5.0, -5.0), Vector2::new(5.0, 5.0)));
    assert_eq!(pair_set(&small.get_collision_pairs(&bodies).unwrap()), expected);

    let mut grid = GridBroadPhase::new(-22.0, 22.0, -22.0, 22.0, 8, 8).unwrap();
    assert_eq!(pair_set(&grid.get_collision_pairs(&bodies).unwrap()), expected);
}

#[test]
fn test_sap_forgets_removed_bodies() {
    let mut bodies = random_circles(10, 3);
    let mut sap = SapBroadPhase::new();
    for handle in bodies.handles() {
        sap.on_body_added(handle);
    }

    let removed = bodies.handles()[0];
    bodies.remove(removed);
    sap.on_body_removed(removed);

    let pairs = sap.get_collision_pairs(&bodies).unwrap();
    assert!(!pairs.contains(&removed));
    assert_eq!(sap.get_axis_list().len(), 9);
}

#[test]
fn test_static_pairs_are_skipped() {
    let mut bodies = BodyStorage::new();
    let circle = || Shape::circle(1.0).unwrap();
    bodies.add(RigidBody::new_static(Vector2::zero()).with_shape(circle(), Vector2::zero(), 0.0));
    bodies.add(RigidBody::new_static(Vector2::new(0.5, 0.0)).with_shape(circle(), Vector2::zero(), 0.0));
    bodies.add(RigidBody::new_kinematic(Vector2::new(1.0, 0.0)).with_shape(circle(), Vector2::zero(), 0.0));

    let pairs = NaiveBroadPhase::new().get_collision_pairs(&bodies).unwrap();
    assert!(pairs.is_empty());

    bodies.add(RigidBody::new_dynamic(1.0, Vector2::new(0.2, 0.0)).unwrap().with_shape(circle(), Vector2::zero(), 0.0));
    let pairs = NaiveBroadPhase::new().get_collision_pairs(&bodies).unwrap();
    assert_eq!(pairs.len() / 2, 3);
}

#[test]
fn test_grid_bin_index() {
    let grid = GridBroadPhase::new(0.0, 10.0, 0.0, 10.0, 2, 5).unwrap();
    assert_eq!(grid.num_bins(), 10);

    // Column-major: column * ny + row
    assert_eq!(grid.bin_index(7.0, 3.0), 6);
    assert_eq!(grid.bin_index(0.0, 0.0), 0);
    assert_eq!(grid.bin_index(2.0, 9.9), 4);

    // Points outside the grid are clamped to the border bins
    assert_eq!(grid.bin_index(-5.0, -5.0), 0);
    assert_eq!(grid.bin_index(100.0, 100.0), 9);
    assert_eq!(grid.bin_index(10.0, 10.0), 9);
}

#[test]
fn test_grid_rejects_invalid_parameters() {
    assert!(matches!(
        GridBroadPhase::new(0.0, 10.0, 0.0, 10.0, 0, 4),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert!(matches!(
        GridBroadPhase::new(5.0, 5.0, 0.0, 10.0, 4, 4),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert!(matches!(
        GridBroadPhase::new(0.0, 10.0, f32::NAN, 10.0, 4, 4),
        Err(PhysicsError::InvalidParameter(_))
    ));
}

#[test]
fn test_grid_rejects_unsupported_shapes() {
    let grid = GridBroadPhase::new(-10.0, 10.0, -10.0, 10.0, 4, 4).unwrap();
    let mut world = PhysicsWorld::with_options(WorldOptions {
        broadphase: Some(Box::new(grid)),
        ..Default::default()
    });

    world.add_body(RigidBody::new_static(Vector2::zero()).with_shape(Shape::plane(), Vector2::zero(), 0.0));
    world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::new(0.0, 2.0))
            .unwrap()
            .with_shape(Shape::circle(0.5).unwrap(), Vector2::zero(), 0.0),
    );
    assert!(world.step(1.0 / 60.0).is_ok());

    world.add_body(
        RigidBody::new_dynamic(1.0, Vector2::new(3.0, 2.0))
            .unwrap()
            .with_shape(Shape::rectangle(1.0, 1.0).unwrap(), Vector2::zero(), 0.0),
    );
    assert_eq!(
        world.step(1.0 / 60.0),
        Err(PhysicsError::UnsupportedShape { context: "GridBroadPhase", shape: "Rectangle" })
    );
}

#[test]
fn test_convex_geometry() {
    let triangle = Shape::convex(vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
    ])
    .unwrap();
    let centroid = triangle.get_center_of_mass();
    assert_relative_eq!(centroid.x, 1.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(centroid.y, 1.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(triangle.get_area(), 0.5, epsilon = 1e-6);

    let square = Shape::convex(vec![
        Vector2::new(-1.0, -1.0),
        Vector2::new(1.0, -1.0),
        Vector2::new(1.0, 1.0),
        Vector2::new(-1.0, 1.0),
    ])
    .unwrap();
    let rectangle = Shape::rectangle(2.0, 2.0).unwrap();
    assert_relative_eq!(square.compute_moment_of_inertia(1.0), 2.0 / 3.0, epsilon = 1e-5);
    assert_relative_eq!(rectangle.compute_moment_of_inertia(1.0), 2.0 / 3.0, epsilon = 1e-5);
    assert_relative_eq!(square.get_bounding_radius(), 2.0f32.sqrt(), epsilon = 1e-6);
}

#[test]
fn test_convex_accepts_clockwise_winding() {
    let shape = Shape::convex(vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(1.0, 0.0),
    ])
    .unwrap();
    let polygon = shape.polygon().unwrap();
    assert!(phys2d_engine::shapes::signed_area(polygon.get_vertices()) > 0.0);

    // Every outward normal points away from the centroid
    let centroid = polygon.get_center_of_mass();
    for (vertex, normal) in polygon.get_vertices().iter().zip(polygon.get_normals()) {
        assert!((*vertex - centroid).dot(normal) > 0.0);
    }
}

#[test]
fn test_invalid_geometry() {
    let invalid = |result: Result<Shape, PhysicsError>| matches!(result, Err(PhysicsError::InvalidGeometry(_)));

    assert!(invalid(Shape::convex(vec![])));
    assert!(invalid(Shape::convex(vec![Vector2::zero(), Vector2::new(1.0, 0.0)])));
    assert!(invalid(Shape::convex(vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 1.0),
        Vector2::new(2.0, 2.0),
    ])));
    assert!(invalid(Shape::circle(-1.0)));
    assert!(invalid(Shape::circle(f32::NAN)));
    assert!(invalid(Shape::rectangle(-1.0, 1.0)));
    assert!(invalid(Shape::capsule(1.0, f32::INFINITY)));
    assert!(invalid(Shape::line(-0.5)));

    // A failed update leaves the shape as it was
    let mut triangle = Shape::convex(vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
    ])
    .unwrap();
    assert!(triangle.set_convex_vertices(vec![Vector2::zero()]).is_err());
    assert_relative_eq!(triangle.get_area(), 0.5, epsilon = 1e-6);
}

#[test]
fn test_circle_circle_contact() {
    let a = RigidBody::new_dynamic(1.0, Vector2::zero())
        .unwrap()
        .with_shape(Shape::circle(1.0).unwrap(), Vector2::zero(), 0.0);
    let b = RigidBody::new_dynamic(1.0, Vector2::new(1.5, 0.0))
        .unwrap()
        .with_shape(Shape::circle(1.0).unwrap(), Vector2::zero(), 0.0);

    let contacts = contacts_between(a.clone(), b.clone());
    assert_eq!(contacts.len(), 1);
    assert_relative_eq!(contacts[0].normal.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(contacts[0].normal.y, 0.0, epsilon = 1e-6);
    assert_relative_eq!(contacts[0].depth(), 0.5, epsilon = 1e-5);

    // Swapped order flips the normal
    let contacts = contacts_between(b.clone(), a.clone());
    assert_relative_eq!(contacts[0].normal.x, -1.0, epsilon = 1e-6);
}

#[test]
fn test_box_box_contact_normal() {
    let a = RigidBody::new_static(Vector2::zero())
        .with_shape(Shape::rectangle(2.0, 2.0).unwrap(), Vector2::zero(), 0.0);
    let b = RigidBody::new_dynamic(1.0, Vector2::new(0.1, 1.9))
        .unwrap()
        .with_shape(Shape::rectangle(2.0, 2.0).unwrap(), Vector2::zero(), 0.0);

    let contacts = contacts_between(a.clone(), b.clone());
    assert!(!contacts.is_empty());
    for contact in &contacts {
        assert!(contact.normal.y > 0.99, "unexpected normal {:?}", contact.normal);
        assert!(contact.depth() > 0.0);
    }
}

#[test]
fn test_capsule_resting_on_plane() {
    let ground = RigidBody::new_static(Vector2::zero()).with_shape(Shape::plane(), Vector2::zero(), 0.0);
    let capsule = RigidBody::new_dynamic(1.0, Vector2::new(0.0, 0.4))
        .unwrap()
        .with_shape(Shape::capsule(2.0, 0.5).unwrap(), Vector2::zero(), 0.0);

    let contacts = contacts_between(ground.clone(), capsule.clone());
    assert_eq!(contacts.len(), 2);
    for contact in &contacts {
        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(contact.depth(), 0.1, epsilon = 1e-5);
    }
}

#[test]
fn test_separated_shapes_produce_nothing() {
    let a = RigidBody::new_dynamic(1.0, Vector2::zero())
        .unwrap()
        .with_shape(Shape::rectangle(1.0, 1.0).unwrap(), Vector2::zero(), 0.0);
    let b = RigidBody::new_dynamic(1.0, Vector2::new(3.0, 0.0))
        .unwrap()
        .with_shape(Shape::capsule(1.0, 0.2).unwrap(), Vector2::zero(), 0.0);

    let contacts = contacts_between(a.clone(), b.clone());
    assert!(contacts.is_empty());
}

#[test]
fn test_collision_groups_filter_contacts() {
    let mut bodies = BodyStorage::new();
    let player = Shape::circle(1.0)
        .unwrap()
        .with_collision_group(CollisionGroup::CHARACTER)
        .with_collision_mask(CollisionGroup::STATIC);
    let debris = Shape::circle(1.0).unwrap().with_collision_group(CollisionGroup::DEBRIS);
    let wall = Shape::circle(1.0).unwrap().with_collision_group(CollisionGroup::STATIC);

    let a = bodies.add(RigidBody::new_dynamic(1.0, Vector2::zero()).unwrap().with_shape(player, Vector2::zero(), 0.0));
    let b = bodies.add(RigidBody::new_dynamic(1.0, Vector2::new(1.0, 0.0)).unwrap().with_shape(debris, Vector2::zero(), 0.0));
    let c = bodies.add(RigidBody::new_dynamic(1.0, Vector2::new(-1.0, 0.0)).unwrap().with_shape(wall, Vector2::zero(), 0.0));

    let mut narrowphase = NarrowPhase::new();
    let ctx = |h| shape_context(h, bodies.get(h).unwrap());

    // The player's mask excludes debris
    assert_eq!(narrowphase.collide(&ctx(a), &ctx(b), false), 0);
    assert!(narrowphase.contact_equations.is_empty());

    assert_eq!(narrowphase.collide(&ctx(a), &ctx(c), false), 1);
    assert_eq!(narrowphase.contact_equations.len(), 1);
    assert_eq!(narrowphase.friction_equations.len(), 1);

    // Debris and wall use the default mask
    assert_eq!(narrowphase.collide(&ctx(b), &ctx(c), true), 1);
    assert_eq!(narrowphase.contact_equations.len(), 1);
}

#[test]
fn test_first_impact_tracking() {
    let mut bodies = BodyStorage::new();
    let a = bodies.add(RigidBody::new_dynamic(1.0, Vector2::zero()).unwrap().with_shape(Shape::circle(1.0).unwrap(), Vector2::zero(), 0.0));
    let b = bodies.add(RigidBody::new_dynamic(1.0, Vector2::new(1.5, 0.0)).unwrap().with_shape(Shape::circle(1.0).unwrap(), Vector2::zero(), 0.0));
    let ctx = |h| shape_context(h, bodies.get(h).unwrap());

    let mut narrowphase = NarrowPhase::new();
    narrowphase.collide(&ctx(a), &ctx(b), false);
    let first = narrowphase.contact_equations[0].contact_data().unwrap();
    assert!(first.first_impact);

    // Still touching in the next step, in either order
    narrowphase.reset();
    assert!(narrowphase.contact_equations.is_empty());
    narrowphase.collide(&ctx(b), &ctx(a), false);
    let second = narrowphase.contact_equations[0].contact_data().unwrap();
    assert!(!second.first_impact);

    // A step without contact forgets the pair
    narrowphase.reset();
    narrowphase.reset();
    narrowphase.collide(&ctx(a), &ctx(b), false);
    assert!(narrowphase.contact_equations[0].contact_data().unwrap().first_impact);
}
