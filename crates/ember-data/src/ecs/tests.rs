// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::component::builtin::{CHILD_OF, IS_A, PREFAB, WILDCARD};
use super::*;
use std::cell::RefCell;
use std::rc::Rc;

// --- DUMMY COMPONENTS FOR TESTING ---

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Position(f32, f32);
impl Component for Position {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Velocity(f32, f32);
impl Component for Velocity {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Mesh(u32);
impl Component for Mesh {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Frozen;
impl Component for Frozen {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Gravity(f32);
impl Component for Gravity {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Likes(u8);
impl Component for Likes {}

fn world() -> World {
    let mut world = World::new();
    world.register::<Position>("Position").unwrap();
    world.register::<Velocity>("Velocity").unwrap();
    world
        .register::<Mesh>("Mesh")
        .unwrap()
        .with(Traits::INHERITABLE);
    world
        .register::<Frozen>("Frozen")
        .unwrap()
        .with(Traits::TOGGLEABLE);
    world
        .register::<Gravity>("Gravity")
        .unwrap()
        .with(Traits::SINGLETON);
    world.register::<Likes>("Likes").unwrap();
    world
}

// --- TESTS ---

#[test]
fn test_registration_uses_component_range() {
    let world = world();
    let id = world.id_of::<Position>().unwrap();

    assert!(id.is_component_id());
    assert!(id.raw() >= builtin::FIRST_USER_ID);
    assert_eq!(world.lookup("Position"), Some(id));
    assert_eq!(world.name(id), Some("Position"));
}

#[test]
fn test_registering_twice_returns_same_id() {
    let mut world = world();
    let first = world.id_of::<Velocity>().unwrap();
    let second = world.register::<Velocity>("Velocity").unwrap().id();
    assert_eq!(first, second);
}

#[test]
fn test_spawned_entities_are_runtime_ids() {
    let mut world = world();
    let a = world.spawn();
    let b = world.spawn();

    assert!(a.is_runtime_id());
    assert!(b.is_runtime_id());
    assert_ne!(a, b);
    assert_eq!(world.spawn_at(a), Err(EcsError::AlreadyAlive(a)));
}

#[test]
fn test_set_get_and_remove() {
    // --- 1. SETUP ---
    let mut world = world();
    let entity = world.spawn();

    // --- 2. ACTION ---
    world.set(entity, Position(1.0, 2.0)).unwrap();
    world.add::<Velocity>(entity).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(world.get::<Position>(entity), Some(&Position(1.0, 2.0)));
    assert_eq!(
        world.get::<Velocity>(entity),
        Some(&Velocity::default()),
        "add should store a default value"
    );

    if let Some(position) = world.get_mut::<Position>(entity) {
        position.0 = 5.0;
    }
    assert_eq!(world.get::<Position>(entity), Some(&Position(5.0, 2.0)));

    world.remove::<Position>(entity).unwrap();
    assert!(!world.has::<Position>(entity));
    assert_eq!(world.get::<Position>(entity), None);
}

#[test]
fn test_ids_keep_insertion_order() {
    let mut world = world();
    let entity = world.spawn();
    world.add::<Velocity>(entity).unwrap();
    world.add::<Position>(entity).unwrap();

    let velocity = world.id_of::<Velocity>().unwrap();
    let position = world.id_of::<Position>().unwrap();
    assert_eq!(world.ids(entity), &[velocity, position]);
}

#[test]
fn test_unregistered_component_is_an_error() {
    #[derive(Debug, Clone, Copy, Default)]
    struct Unknown;
    impl Component for Unknown {}

    let mut world = world();
    let entity = world.spawn();
    assert!(matches!(
        world.set(entity, Unknown),
        Err(EcsError::Unregistered(_))
    ));
}

#[test]
fn test_operations_on_dead_entity_fail() {
    let mut world = world();
    let entity = world.spawn();
    world.destroy(entity).unwrap();

    assert!(!world.is_alive(entity));
    assert_eq!(
        world.set(entity, Position::default()),
        Err(EcsError::NotAlive(entity))
    );
    assert_eq!(world.destroy(entity), Err(EcsError::NotAlive(entity)));
}

#[test]
fn test_pairs_with_data_and_tags() {
    let mut world = world();
    let alice = world.spawn();
    let bob = world.spawn();
    let likes = world.id_of::<Likes>().unwrap();

    world.set_pair(alice, bob, Likes(7)).unwrap();

    assert!(world.has_pair(alice, likes, bob));
    assert_eq!(world.get_pair::<Likes>(alice, bob), Some(&Likes(7)));
    assert_eq!(world.target(alice, likes), Some(bob));
    assert!(world.owns_id(alice, Entity::pair(likes, WILDCARD)));

    // Associative relations never carry data.
    assert_eq!(
        world.set_pair(alice, bob, IsA),
        Err(EcsError::PairIsTag(IS_A))
    );

    world.remove_pair(alice, likes, WILDCARD).unwrap();
    assert!(!world.has_pair(alice, likes, bob));
}

#[test]
fn test_destroying_a_target_strips_pairs() {
    let mut world = world();
    let alice = world.spawn();
    let bob = world.spawn();
    let likes = world.id_of::<Likes>().unwrap();
    world.add_pair(alice, likes, bob).unwrap();

    world.destroy(bob).unwrap();

    assert!(world.ids(alice).is_empty());
}

#[test]
fn test_inheritance_shares_and_copies() {
    // --- 1. SETUP ---
    let mut world = world();
    let base = world.spawn();
    world.add::<Prefab>(base).unwrap();
    world.set(base, Mesh(3)).unwrap();
    world.set(base, Position(1.0, 1.0)).unwrap();

    // --- 2. ACTION ---
    let instance = world.spawn();
    world.is_a(instance, base).unwrap();

    // --- 3. ASSERTIONS ---
    // Inheritable: read through the base, not owned.
    assert_eq!(world.get::<Mesh>(instance), Some(&Mesh(3)));
    assert!(!world.owns_id(instance, world.id_of::<Mesh>().unwrap()));
    assert!(world.get_mut::<Mesh>(instance).is_none());

    // Not inheritable: copied so the instance can override it.
    assert_eq!(world.get::<Position>(instance), Some(&Position(1.0, 1.0)));
    if let Some(position) = world.get_mut::<Position>(instance) {
        position.0 = 9.0;
    }
    assert_eq!(world.get::<Position>(base), Some(&Position(1.0, 1.0)));

    // Structural ids are not copied.
    assert!(!world.has_id(instance, PREFAB));
    assert_eq!(world.bases(instance), vec![base]);
}

#[test]
fn test_inheritance_rejects_cycles_and_final() {
    let mut world = world();
    let a = world.spawn();
    let b = world.spawn();
    world.is_a(b, a).unwrap();

    assert_eq!(world.is_a(a, b), Err(EcsError::Cycle(a)));
    assert_eq!(world.is_a(a, a), Err(EcsError::Cycle(a)));

    let position = world.id_of::<Position>().unwrap();
    world.add_traits(position, Traits::FINAL).unwrap();
    assert_eq!(world.is_a(a, position), Err(EcsError::Final(position)));
}

#[test]
fn test_toggling() {
    let mut world = world();
    let entity = world.spawn();
    world.add::<Frozen>(entity).unwrap();
    world.add::<Position>(entity).unwrap();

    world.disable::<Frozen>(entity).unwrap();
    assert!(world.has::<Frozen>(entity), "disabled components stay present");
    assert!(!world.is_enabled::<Frozen>(entity));

    let query = world.query::<(Entity, &Frozen)>().unwrap();
    assert_eq!(query.count(&world), 0);

    world.enable::<Frozen>(entity).unwrap();
    assert_eq!(query.count(&world), 1);

    let position = world.id_of::<Position>().unwrap();
    assert_eq!(
        world.disable::<Position>(entity),
        Err(EcsError::NotToggleable(position))
    );
}

#[test]
fn test_singletons_live_on_their_component() {
    let mut world = world();
    world.set_singleton(Gravity(9.8)).unwrap();
    assert_eq!(world.singleton::<Gravity>(), Some(&Gravity(9.8)));

    if let Some(gravity) = world.singleton_mut::<Gravity>() {
        gravity.0 = 1.6;
    }
    assert_eq!(world.singleton::<Gravity>(), Some(&Gravity(1.6)));

    let entity = world.spawn();
    let gravity = world.id_of::<Gravity>().unwrap();
    assert_eq!(
        world.set(entity, Gravity(0.0)),
        Err(EcsError::Singleton(gravity))
    );
}

#[test]
fn test_names_are_scoped_by_parent() {
    let mut world = world();
    let parent = world.spawn();
    let first = world.spawn();
    let second = world.spawn();
    world.set_name(parent, "Level").unwrap();
    world.child_of(first, parent).unwrap();
    world.child_of(second, parent).unwrap();

    world.set_name(first, "Door").unwrap();
    assert_eq!(
        world.set_name(second, "Door"),
        Err(EcsError::NameTaken("Door".into()))
    );

    // The same name is free at the root.
    let root = world.spawn();
    world.set_name(root, "Door").unwrap();

    assert_eq!(world.path(first).as_deref(), Some("Level::Door"));
    assert_eq!(world.lookup("Level::Door"), Some(first));
    assert_eq!(world.lookup("Door"), Some(root));
    assert_eq!(world.lookup("Level::Missing"), None);
    assert!(matches!(
        world.set_name(root, "a::b"),
        Err(EcsError::InvalidName(_))
    ));

    world.set_display_name(first, "Front door").unwrap();
    assert_eq!(world.display_name(first), "Front door");
    assert_eq!(world.display_name(second), "");
}

#[test]
fn test_hierarchy_is_exclusive_and_ordered() {
    let mut world = world();
    let a = world.spawn();
    let b = world.spawn();
    let child = world.spawn();
    let other = world.spawn();

    world.child_of(child, a).unwrap();
    world.child_of(other, a).unwrap();
    world.child_of(child, b).unwrap();

    assert_eq!(world.parent(child), Some(b));
    assert_eq!(world.children(a), &[other]);
    assert_eq!(world.children(b), &[child]);
    assert!(!world.has_pair(child, CHILD_OF, a));
    assert!(world.has_pair(child, CHILD_OF, b));

    assert_eq!(world.child_of(b, child), Err(EcsError::Cycle(b)));
}

#[test]
fn test_destroy_removes_subtree() {
    let mut world = world();
    let root = world.spawn();
    let child = world.spawn();
    let grandchild = world.spawn();
    world.child_of(child, root).unwrap();
    world.child_of(grandchild, child).unwrap();
    world.set_name(child, "Child").unwrap();

    world.destroy(root).unwrap();

    assert!(!world.is_alive(root));
    assert!(!world.is_alive(child));
    assert!(!world.is_alive(grandchild));
    assert_eq!(world.lookup("Child"), None);
}

#[test]
fn test_queries_skip_prefabs_and_disabled() {
    let mut world = world();
    let plain = world.spawn();
    let prefab = world.spawn();
    let disabled = world.spawn();
    for entity in [plain, prefab, disabled] {
        world.add::<Position>(entity).unwrap();
    }
    world.add::<Prefab>(prefab).unwrap();
    world.add::<Disabled>(disabled).unwrap();

    let query = world.query::<(Entity, &Position)>().unwrap();
    assert_eq!(query.entities(&world), vec![plain]);

    let prefabs = world.query::<(&Position, With<Prefab>)>().unwrap();
    assert_eq!(prefabs.entities(&world), vec![prefab]);
}

#[test]
fn test_query_iter_mutates_matching_entities() {
    // --- 1. SETUP ---
    let mut world = world();
    let moving = world.spawn();
    world.set(moving, Position(0.0, 0.0)).unwrap();
    world.set(moving, Velocity(1.0, 2.0)).unwrap();

    let frozen = world.spawn();
    world.set(frozen, Position(5.0, 5.0)).unwrap();
    world.set(frozen, Velocity(1.0, 1.0)).unwrap();
    world.add::<Frozen>(frozen).unwrap();

    let query = world
        .query::<(&mut Position, &Velocity, Without<Frozen>)>()
        .unwrap();

    // --- 2. ACTION ---
    for (_, (position, velocity, ())) in query.iter(&mut world) {
        position.0 += velocity.0;
        position.1 += velocity.1;
    }

    // --- 3. ASSERTIONS ---
    assert_eq!(world.get::<Position>(moving), Some(&Position(1.0, 2.0)));
    assert_eq!(world.get::<Position>(frozen), Some(&Position(5.0, 5.0)));
    assert_eq!(query.first(&world), Some(moving));
}

#[test]
fn test_query_reads_inherited_components() {
    let mut world = world();
    let base = world.spawn();
    world.set(base, Mesh(4)).unwrap();
    let instance = world.spawn();
    world.is_a(instance, base).unwrap();

    let query = world.query::<(Entity, &Mesh)>().unwrap();
    let meshes: Vec<(Entity, u32)> = query
        .iter(&mut world)
        .map(|(_, (entity, mesh))| (entity, mesh.0))
        .collect();
    assert_eq!(meshes, vec![(base, 4), (instance, 4)]);
}

#[test]
fn test_conflicting_query_is_rejected() {
    let world = world();
    let position = world.id_of::<Position>().unwrap();
    assert!(matches!(
        world.query::<(&mut Position, &Position)>(),
        Err(EcsError::ConflictingAccess(id)) if id == position
    ));
    assert!(matches!(
        world.query::<(&mut Position, &mut Position)>(),
        Err(EcsError::ConflictingAccess(_))
    ));
}

#[test]
fn test_observers_fire_for_lifecycle_events() {
    let mut world = world();
    let position = world.id_of::<Position>().unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    for event in [Event::OnAdd, Event::OnSet, Event::OnRemove] {
        let log = Rc::clone(&log);
        world.observe(event, &[position], move |world, entity| {
            let value = world.get::<Position>(entity).copied();
            log.borrow_mut().push((event, value));
        });
    }

    let entity = world.spawn();
    world.set(entity, Position(1.0, 0.0)).unwrap();
    world.set(entity, Position(2.0, 0.0)).unwrap();
    world.destroy(entity).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            (Event::OnAdd, Some(Position(1.0, 0.0))),
            (Event::OnSet, Some(Position(1.0, 0.0))),
            (Event::OnSet, Some(Position(2.0, 0.0))),
            (Event::OnRemove, Some(Position(2.0, 0.0))),
        ]
    );
}

#[test]
fn test_observer_requires_every_id() {
    let mut world = world();
    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let observer = world
        .observer::<(&Position, &Velocity), _>(Event::OnAdd, move |_, _| {
            *counter.borrow_mut() += 1;
        })
        .unwrap();

    let entity = world.spawn();
    world.add::<Position>(entity).unwrap();
    assert_eq!(*count.borrow(), 0);
    world.add::<Velocity>(entity).unwrap();
    assert_eq!(*count.borrow(), 1);

    world.remove_observer(observer);
    let other = world.spawn();
    world.add::<Position>(other).unwrap();
    world.add::<Velocity>(other).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn test_deferred_commands_apply_in_order() {
    let mut world = world();
    let entity = world.spawn();

    world.defer_begin();
    world.set(entity, Position(1.0, 1.0)).unwrap();
    world.defer_begin();
    world.remove::<Position>(entity).unwrap();
    world.set(entity, Position(2.0, 2.0)).unwrap();
    world.defer_end();
    assert!(
        !world.has::<Position>(entity),
        "nothing applies before the outermost defer_end"
    );
    world.defer_end();

    assert_eq!(world.get::<Position>(entity), Some(&Position(2.0, 2.0)));
    assert!(!world.is_deferred());
}

#[test]
fn test_systems_run_in_order_with_deferred_changes() {
    let mut world = world();
    let entity = world.spawn();
    world.set(entity, Position(0.0, 0.0)).unwrap();
    world.set(entity, Velocity(2.0, 0.0)).unwrap();

    world
        .system::<(&mut Position, &Velocity), _>("Move", |world, query, delta| {
            for (_, (position, velocity)) in query.iter(world) {
                position.0 += velocity.0 * delta;
            }
        })
        .unwrap();
    world
        .system::<(Entity, &Position), _>("Freeze", |world, query, _| {
            for entity in query.entities(world) {
                world.add::<Frozen>(entity).unwrap();
                assert!(!world.has::<Frozen>(entity), "structural changes are deferred");
            }
        })
        .unwrap();

    world.progress(0.5);

    assert_eq!(world.get::<Position>(entity), Some(&Position(1.0, 0.0)));
    assert!(world.has::<Frozen>(entity));
}

#[test]
fn test_sparse_components_keep_their_address() {
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Body(u64);
    impl Component for Body {}

    let mut world = world();
    world.register::<Body>("Body").unwrap().with(Traits::SPARSE);
    let first = world.spawn();
    world.set(first, Body(1)).unwrap();
    let address = world.get::<Body>(first).map(|body| body as *const Body);

    for index in 0..64 {
        let entity = world.spawn();
        world.set(entity, Body(index)).unwrap();
    }

    assert_eq!(world.get::<Body>(first).map(|body| body as *const Body), address);
}
