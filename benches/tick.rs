use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use grimwood::game::render::{build_frame, AllLoaded};
use grimwood::{tick, ActionState, World};

fn running_world() -> World {
    let mut world = World::with_defaults(12345).expect("default world builds");
    world.start();
    world
}

fn busy_actions(t: u32) -> ActionState {
    let mut actions = ActionState::new();
    actions.set(ActionState::MOVE_RIGHT, true);
    actions.set(ActionState::MELEE, t % 30 == 0);
    actions.set(ActionState::SHOOT, t % 40 == 20);
    actions
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simulation");

    group.bench_function("single tick (idle)", |b| {
        let mut world = running_world();
        b.iter(|| black_box(tick(&mut world, ActionState::new())));
    });

    group.bench_function("600 ticks (scripted combat)", |b| {
        b.iter_batched(
            running_world,
            |mut world| {
                for t in 0..600 {
                    tick(&mut world, busy_actions(t));
                }
                black_box(world.compute_hash())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("state hash", |b| {
        let world = running_world();
        b.iter(|| black_box(world.compute_hash()));
    });

    group.bench_function("render frame", |b| {
        let mut world = running_world();
        for t in 0..120 {
            tick(&mut world, busy_actions(t));
        }
        b.iter(|| black_box(build_frame(&world, 0.5, &AllLoaded)));
    });

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
