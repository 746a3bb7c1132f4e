//! Benchmarks for stepping worlds of falling circles.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phys2d_engine::collision::{BroadPhase, NaiveBroadPhase, SapBroadPhase};
use phys2d_engine::{GsSolver, IslandSolver, PhysicsWorld, RigidBody, Shape, Vector2, WorldOptions};

const DT: f32 = 1.0 / 60.0;

fn circle_pile(count: usize, broadphase: Box<dyn BroadPhase>) -> PhysicsWorld {
    let mut world = PhysicsWorld::with_options(WorldOptions {
        broadphase: Some(broadphase),
        ..Default::default()
    });

    world.add_body(RigidBody::new_static(Vector2::zero()).with_shape(Shape::plane(), Vector2::zero(), 0.0));

    // Circles in a loose grid above the ground
    for i in 0..count {
        let position = Vector2::new((i % 20) as f32 * 1.1 - 11.0, (i / 20) as f32 * 1.1 + 1.0);
        let body = RigidBody::new_dynamic(1.0, position)
            .expect("valid mass")
            .with_shape(Shape::circle(0.5).expect("valid radius"), Vector2::zero(), 0.0);
        world.add_body(body);
    }

    world
}

fn bench_world_step(c: &mut Criterion) {
    c.bench_function("step_100_circles_naive", |b| {
        let mut world = circle_pile(100, Box::new(NaiveBroadPhase::new()));
        b.iter(|| {
            world.step(DT).expect("step");
            black_box(&world);
        })
    });

    c.bench_function("step_100_circles_sap", |b| {
        let mut world = circle_pile(100, Box::new(SapBroadPhase::new()));
        b.iter(|| {
            world.step(DT).expect("step");
            black_box(&world);
        })
    });

    c.bench_function("step_400_circles_sap", |b| {
        let mut world = circle_pile(400, Box::new(SapBroadPhase::new()));
        b.iter(|| {
            world.step(DT).expect("step");
            black_box(&world);
        })
    });
}

fn bench_solvers(c: &mut Criterion) {
    c.bench_function("settled_pile_gs_solver", |b| {
        let mut world = circle_pile(200, Box::new(SapBroadPhase::new()));
        for _ in 0..120 {
            world.step(DT).expect("step");
        }
        b.iter(|| {
            world.step(DT).expect("step");
            black_box(&world);
        })
    });

    c.bench_function("settled_pile_island_solver", |b| {
        let mut world = circle_pile(200, Box::new(SapBroadPhase::new()));
        world.set_solver(Box::new(IslandSolver::new(Box::new(GsSolver::new()))));
        for _ in 0..120 {
            world.step(DT).expect("step");
        }
        b.iter(|| {
            world.step(DT).expect("step");
            black_box(&world);
        })
    });
}

criterion_group!(benches, bench_world_step, bench_solvers);
criterion_main!(benches);
