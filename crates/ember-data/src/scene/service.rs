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

use super::components::{ArchetypeIds, Transient};
use super::error::SceneError;
use super::settings::SceneSettings;
use crate::ecs::{
    builtin::PREFAB, Component, ComponentRegistration, Entity, Event, ObserverId, Query,
    SystemId, Traits, World, WorldQuery, ARCHETYPE_BASE,
};

/// Owns the ECS world and manages entity lifecycle on top of it.
///
/// Regular entities get ids from the world's runtime range. Archetypes are
/// prefab entities whose ids come from the [`ArchetypeIds`] allocator and are
/// returned to it when the prefab goes away.
pub struct Scene {
    world: World,
    settings: SceneSettings,
    transient: Entity,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("world", &self.world)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Scene {
    /// Creates a scene with its built-in components and the archetype id
    /// reclamation observer.
    pub fn new(settings: SceneSettings) -> Result<Self, SceneError> {
        let mut world = World::new();
        let transient = world.register::<Transient>("Transient")?.id();
        world
            .register::<ArchetypeIds>("ArchetypeIds")?
            .with(Traits::SINGLETON);
        world.set_singleton(ArchetypeIds::default())?;

        world.observe(Event::OnRemove, &[PREFAB], |world, entity| {
            if !entity.is_archetype_id() {
                return;
            }
            let offset = (entity.raw() - ARCHETYPE_BASE) as u32;
            if let Some(ids) = world.singleton_mut::<ArchetypeIds>() {
                ids.0.free(offset);
                log::trace!("Archetype id {offset} returned to the pool");
            }
        });

        log::info!(
            "Scene created with {} worker thread(s)",
            settings.resolved_threads()
        );
        Ok(Self {
            world,
            settings,
            transient,
        })
    }

    /// The underlying world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the underlying world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The settings the scene was created with.
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// The id of the [`Transient`] tag.
    pub fn transient(&self) -> Entity {
        self.transient
    }

    /// Registers a component type under `name`.
    pub fn register_component<T: Component + Default + Clone>(
        &mut self,
        name: &str,
    ) -> Result<ComponentRegistration<'_, T>, SceneError> {
        Ok(self.world.register::<T>(name)?)
    }

    /// Creates a regular entity in the runtime range.
    pub fn create_entity(&mut self) -> Entity {
        self.world.spawn()
    }

    /// Creates a prefab entity with a recycled id in the archetype range.
    pub fn create_archetype(&mut self) -> Result<Entity, SceneError> {
        loop {
            let offset = self
                .world
                .singleton_mut::<ArchetypeIds>()
                .and_then(|ids| ids.0.allocate())
                .ok_or(SceneError::ArchetypesExhausted)?;
            let id = Entity::from_raw(ARCHETYPE_BASE + u64::from(offset));
            // Ids of prefabs that lost their tag are still alive; skip them.
            if self.world.is_alive(id) {
                log::warn!("Archetype id {id} is still in use, skipping");
                continue;
            }
            self.world.spawn_at(id)?;
            self.world.add_id(id, PREFAB)?;
            return Ok(id);
        }
    }

    /// Claims a specific archetype id, creating the prefab entity.
    pub(crate) fn claim_archetype(&mut self, offset: u64) -> Result<Entity, SceneError> {
        if offset == 0 || offset >= u64::from(crate::ecs::ARCHETYPE_CAPACITY) {
            return Err(SceneError::InvalidArchetype(offset));
        }
        let id = Entity::from_raw(ARCHETYPE_BASE + offset);
        if !self.world.is_alive(id) {
            if let Some(ids) = self.world.singleton_mut::<ArchetypeIds>() {
                ids.0.reserve(offset as u32);
            }
            self.world.spawn_at(id)?;
        }
        self.world.add_id(id, PREFAB)?;
        Ok(id)
    }

    /// Resolves a raw id to a live entity.
    pub fn get_entity(&self, id: u64) -> Option<Entity> {
        let entity = Entity::from_raw(id);
        self.world.is_alive(entity).then_some(entity)
    }

    /// Resolves a `::`-separated name path.
    pub fn lookup(&self, path: &str) -> Option<Entity> {
        self.world.lookup(path)
    }

    /// Destroys an entity and its subtree.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), SceneError> {
        Ok(self.world.destroy(entity)?)
    }

    /// Returns `true` if the entity is tagged [`Transient`].
    pub fn is_transient(&self, entity: Entity) -> bool {
        self.world.has_id(entity, self.transient)
    }

    /// Builds a query over `Q`.
    pub fn create_query<Q: WorldQuery>(&self) -> Result<Query<Q>, SceneError> {
        Ok(self.world.query::<Q>()?)
    }

    /// Observes `event` on entities matching `Q`.
    pub fn create_observer<Q, F>(&mut self, event: Event, callback: F) -> Result<ObserverId, SceneError>
    where
        Q: WorldQuery,
        F: FnMut(&mut World, Entity) + 'static,
    {
        Ok(self.world.observer::<Q, F>(event, callback)?)
    }

    /// Registers a system run by [`Scene::tick`].
    pub fn create_system<Q, F>(&mut self, name: &str, callback: F) -> Result<SystemId, SceneError>
    where
        Q: WorldQuery + 'static,
        F: FnMut(&mut World, &Query<Q>, f32) + 'static,
    {
        Ok(self.world.system::<Q, F>(name, callback)?)
    }

    /// Runs `callback` inside a deferred bracket. Structural changes it makes
    /// are applied together when it returns.
    pub fn schedule<R>(&mut self, callback: impl FnOnce(&mut World) -> R) -> R {
        self.world.defer_begin();
        let result = callback(&mut self.world);
        self.world.defer_end();
        result
    }

    /// Advances every system by `delta` seconds.
    pub fn tick(&mut self, delta: f32) {
        self.world.progress(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Prefab, ENTITY_BASE};

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Speed(f32);
    impl Component for Speed {}

    #[test]
    fn test_entity_and_archetype_ranges_do_not_overlap() {
        let mut scene = Scene::new(SceneSettings::default()).unwrap();
        for _ in 0..32 {
            let archetype = scene.create_archetype().unwrap();
            let entity = scene.create_entity();

            assert!(archetype.is_archetype_id());
            assert!((ARCHETYPE_BASE..ENTITY_BASE).contains(&archetype.raw()));
            assert!(entity.raw() >= ENTITY_BASE);
            assert!(scene.world().has::<Prefab>(archetype));
        }
    }

    #[test]
    fn test_destroyed_archetype_ids_are_recycled() {
        let mut scene = Scene::new(SceneSettings::default()).unwrap();
        let first = scene.create_archetype().unwrap();
        let available = scene
            .world()
            .singleton::<ArchetypeIds>()
            .map(|ids| ids.0.available())
            .unwrap();

        scene.destroy_entity(first).unwrap();
        let after = scene
            .world()
            .singleton::<ArchetypeIds>()
            .map(|ids| ids.0.available())
            .unwrap();
        assert_eq!(after, available + 1);

        let second = scene.create_archetype().unwrap();
        assert_eq!(first, second, "the freed id is handed out again");
    }

    #[test]
    fn test_get_entity_and_lookup() {
        let mut scene = Scene::new(SceneSettings::default()).unwrap();
        let entity = scene.create_entity();
        scene.world_mut().set_name(entity, "Camera").unwrap();

        assert_eq!(scene.get_entity(entity.raw()), Some(entity));
        assert_eq!(scene.get_entity(entity.raw() + 1000), None);
        assert_eq!(scene.lookup("Camera"), Some(entity));
    }

    #[test]
    fn test_schedule_defers_structural_changes() {
        let mut scene = Scene::new(SceneSettings::default()).unwrap();
        scene.register_component::<Speed>("Speed").unwrap();
        let entity = scene.create_entity();

        let seen = scene.schedule(|world| {
            world.set(entity, Speed(3.0)).unwrap();
            world.has::<Speed>(entity)
        });

        assert!(!seen);
        assert_eq!(scene.world().get::<Speed>(entity), Some(&Speed(3.0)));
    }

    #[test]
    fn test_systems_run_on_tick() {
        let mut scene = Scene::new(SceneSettings::default()).unwrap();
        scene.register_component::<Speed>("Speed").unwrap();
        let entity = scene.create_entity();
        scene.world_mut().set(entity, Speed(1.0)).unwrap();
        scene
            .create_system::<&mut Speed, _>("Accelerate", |world, query, delta| {
                for (_, speed) in query.iter(world) {
                    speed.0 += delta;
                }
            })
            .unwrap();

        scene.tick(0.25);
        scene.tick(0.25);

        assert_eq!(scene.world().get::<Speed>(entity), Some(&Speed(1.5)));
    }
}
