use criterion::{criterion_group, criterion_main, Criterion};
use ember_core::serialization::Writer;
use ember_data::ecs::{Component, Traits, With, World};
use ember_data::pod_serializable;
use ember_data::scene::{Scene, SceneSettings};
use std::hint::black_box;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct Position(u32);
impl Component for Position {}

#[derive(Debug, Clone, Copy, Default)]
struct RenderTag;
impl Component for RenderTag {}

#[derive(Debug, Clone, Copy, Default)]
struct Shared(u32);
impl Component for Shared {}

pod_serializable!(Position);

fn bench_queries(c: &mut Criterion) {
    let mut world = World::new();
    world.register::<Position>("Position").unwrap();
    world.register::<RenderTag>("RenderTag").unwrap();
    world
        .register::<Shared>("Shared")
        .unwrap()
        .with(Traits::INHERITABLE);

    let base = world.spawn();
    world.set(base, Shared(7)).unwrap();

    // Setup 10,000 entities
    for i in 0..10_000 {
        let entity = world.spawn();
        world.set(entity, Position(i)).unwrap();
        if i % 2 == 0 {
            world.add::<RenderTag>(entity).unwrap();
        }
        if i % 4 == 0 {
            world.is_a(entity, base).unwrap();
        }
    }

    let mut group = c.benchmark_group("ECS Queries");

    let tagged = world.query::<(&Position, With<RenderTag>)>().unwrap();
    group.bench_function("Owned + tag", |b| {
        b.iter(|| {
            let mut count = 0;
            for (_, (position, ())) in tagged.iter(&mut world) {
                count += position.0;
            }
            black_box(count);
        });
    });

    let inherited = world.query::<(&Position, &Shared)>().unwrap();
    group.bench_function("Inherited through IsA", |b| {
        b.iter(|| {
            let mut count = 0;
            for (_, (position, shared)) in inherited.iter(&mut world) {
                count += position.0 + shared.0;
            }
            black_box(count);
        });
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut scene = Scene::new(SceneSettings { threads: 1 }).unwrap();
    scene
        .register_component::<Position>("Position")
        .unwrap()
        .serializable();

    let root = scene.create_entity();
    for i in 0..1_000 {
        let entity = scene.create_entity();
        let world = scene.world_mut();
        world.set(entity, Position(i)).unwrap();
        world.child_of(entity, root).unwrap();
    }

    c.bench_function("Save hierarchy (1k children)", |b| {
        b.iter(|| {
            let mut writer = Writer::with_capacity(16 * 1024);
            scene.save_entity_hierarchy(root, &mut writer).unwrap();
            black_box(writer.len());
        });
    });
}

criterion_group!(benches, bench_queries, bench_serialization);
criterion_main!(benches);
