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

use super::error::SceneError;
use super::service::Scene;
use crate::ecs::{
    builtin::{CHILD_OF, DISABLED, IS_A, PREFAB},
    Entity, Factory, World, ARCHETYPE_BASE,
};
use ember_core::serialization::{Reader, Writer};

/// Terminates component lists and child lists.
pub const LIST_END: u32 = u32::MAX;

/// Entries of a component list resolved against the world.
struct Entry {
    relation: String,
    component: String,
    payload: Vec<u8>,
}

impl Scene {
    // --- Archetypes ---

    /// Writes every archetype, bases before the archetypes deriving from
    /// them.
    ///
    /// Layout: `count`, then per archetype `offset`, `name`, `base offset`
    /// (`0` for none) and its component list.
    pub fn save_archetypes(&self, writer: &mut Writer) -> Result<(), SceneError> {
        let world = self.world();
        let archetypes = archetype_order(world);
        writer.write_int(archetypes.len());
        for archetype in archetypes {
            writer.write_int(archetype.raw() - ARCHETYPE_BASE);
            writer.write_string8(world.name(archetype).unwrap_or(""));
            writer.write_int(archetype_offset(world, archetype));
            self.write_components(archetype, writer);
        }
        Ok(())
    }

    /// Reads an archetype block, recreating each archetype at its saved id.
    pub fn load_archetypes(&mut self, reader: &mut Reader<'_>) -> Result<Vec<Entity>, SceneError> {
        self.ensure_immediate()?;
        let count = reader.read_int::<usize>()?;
        let mut loaded = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = reader.read_int::<u64>()?;
            let archetype = self.claim_archetype(offset)?;
            let name = reader.read_string8()?;
            self.apply_name(archetype, name);

            let base = reader.read_int::<u64>()?;
            if base != 0 {
                self.apply_base(archetype, base)?;
            }
            self.read_components(archetype, reader)?;
            loaded.push(archetype);
        }
        log::debug!("Loaded {} archetype(s)", loaded.len());
        Ok(loaded)
    }

    // --- Entities ---

    /// Writes one entity block: `name`, `display name`, `archetype offset`
    /// (`0` for none) and its component list.
    pub fn save_entity(&self, entity: Entity, writer: &mut Writer) -> Result<(), SceneError> {
        let world = self.world();
        if !world.is_alive(entity) {
            return Err(crate::ecs::EcsError::NotAlive(entity).into());
        }
        writer.write_string8(world.name(entity).unwrap_or(""));
        writer.write_string8(world.display_name(entity));
        writer.write_int(archetype_offset(world, entity));
        self.write_components(entity, writer);
        Ok(())
    }

    /// Reads one entity block into a new entity.
    ///
    /// A block that fails to decode leaves no entity behind.
    pub fn load_entity(&mut self, reader: &mut Reader<'_>) -> Result<Entity, SceneError> {
        self.ensure_immediate()?;
        self.read_entity(reader, None)
    }

    /// Writes the entity followed by its non-transient descendants.
    ///
    /// Returns `false` without writing anything when the entity itself is
    /// transient.
    pub fn save_entity_hierarchy(&self, entity: Entity, writer: &mut Writer) -> Result<bool, SceneError> {
        if self.is_transient(entity) {
            return Ok(false);
        }
        self.save_entity(entity, writer)?;
        for &child in self.world().children(entity) {
            self.save_entity_hierarchy(child, writer)?;
        }
        writer.write(LIST_END);
        Ok(true)
    }

    /// Reads an entity and, recursively, its children.
    ///
    /// On error the partially loaded subtree is destroyed.
    pub fn load_entity_hierarchy(&mut self, reader: &mut Reader<'_>) -> Result<Entity, SceneError> {
        self.ensure_immediate()?;
        self.read_hierarchy(reader, None)
    }

    /// Component payloads need their storage to exist immediately.
    fn ensure_immediate(&self) -> Result<(), SceneError> {
        if self.world().is_deferred() {
            return Err(SceneError::Deferred);
        }
        Ok(())
    }

    fn read_hierarchy(&mut self, reader: &mut Reader<'_>, parent: Option<Entity>) -> Result<Entity, SceneError> {
        let entity = self.read_entity(reader, parent)?;
        let children = self.read_children(entity, reader);
        self.discard_on_error(entity, children)
    }

    fn read_children(&mut self, entity: Entity, reader: &mut Reader<'_>) -> Result<(), SceneError> {
        while reader.peek::<u32>()? != LIST_END {
            self.read_hierarchy(reader, Some(entity))?;
        }
        reader.skip(4)?;
        Ok(())
    }

    fn read_entity(&mut self, reader: &mut Reader<'_>, parent: Option<Entity>) -> Result<Entity, SceneError> {
        let entity = self.create_entity();
        let filled = self.fill_entity(entity, reader, parent);
        self.discard_on_error(entity, filled)
    }

    /// Destroys `entity` and its subtree when `result` is an error.
    fn discard_on_error(&mut self, entity: Entity, result: Result<(), SceneError>) -> Result<Entity, SceneError> {
        let Err(error) = result else {
            return Ok(entity);
        };
        if let Err(destroy) = self.world_mut().destroy(entity) {
            log::warn!("Could not discard partially loaded {entity}: {destroy}");
        }
        Err(error)
    }

    fn fill_entity(&mut self, entity: Entity, reader: &mut Reader<'_>, parent: Option<Entity>) -> Result<(), SceneError> {
        // Names are scoped, so the parent must be known first.
        if let Some(parent) = parent {
            self.world_mut().child_of(entity, parent)?;
        }
        let name = reader.read_string8()?;
        self.apply_name(entity, name);
        let display = reader.read_string8()?;
        self.world_mut().set_display_name(entity, display)?;

        let archetype = reader.read_int::<u64>()?;
        if archetype != 0 {
            self.apply_base(entity, archetype)?;
        }
        self.read_components(entity, reader)
    }

    fn apply_name(&mut self, entity: Entity, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Err(error) = self.world_mut().set_name(entity, name) {
            log::warn!("Loaded entity {entity} stays unnamed: {error}");
        }
    }

    fn apply_base(&mut self, entity: Entity, offset: u64) -> Result<(), SceneError> {
        let base = Entity::from_raw(ARCHETYPE_BASE + offset);
        if !self.world().is_alive(base) || !base.is_archetype_id() {
            return Err(SceneError::NotAnArchetype(base));
        }
        self.world_mut().is_a(entity, base)?;
        Ok(())
    }

    // --- Component lists ---

    fn write_components(&self, entity: Entity, writer: &mut Writer) {
        for entry in self.entries(entity) {
            writer.write_string8(&entry.relation);
            writer.write_string8(&entry.component);
            writer.write_block(&entry.payload);
        }
        writer.write(LIST_END);
    }

    /// The saveable ids of `entity` in the order they were added.
    fn entries(&self, entity: Entity) -> Vec<Entry> {
        let world = self.world();
        let mut entries = Vec::new();
        for &id in world.ids(entity) {
            if self.is_structural(id) {
                continue;
            }
            let (relation, component) = match (id.relation(), id.target()) {
                (Some(relation), Some(target)) => (world.path(relation), world.path(target)),
                _ => (Some(String::new()), world.path(id)),
            };
            let (Some(relation), Some(component)) = (relation, component) else {
                log::debug!("Skipping unnamed id {id} on {entity}");
                continue;
            };

            let mut payload = Writer::new();
            if !world.is_tag(id) {
                let encode = factory(world, id).and_then(|factory| factory.encode);
                match (encode, world.get_erased(entity, id)) {
                    (Some(encode), Some(value)) => encode(value, &mut payload),
                    _ => {
                        log::debug!("Skipping `{component}` on {entity}: no factory");
                        continue;
                    }
                }
            }
            entries.push(Entry {
                relation,
                component,
                payload: payload.into_inner(),
            });
        }
        entries
    }

    fn is_structural(&self, id: Entity) -> bool {
        id == PREFAB
            || id == DISABLED
            || id == self.transient()
            || matches!(id.relation(), Some(IS_A) | Some(CHILD_OF))
    }

    fn read_components(&mut self, entity: Entity, reader: &mut Reader<'_>) -> Result<(), SceneError> {
        while reader.peek::<u32>()? != LIST_END {
            let relation = reader.read_string8()?;
            let component = reader.read_string8()?;
            let payload = reader.read_block()?;

            let world = self.world();
            let id = if relation.is_empty() {
                world.lookup(component)
            } else {
                world
                    .lookup(relation)
                    .zip(world.lookup(component))
                    .map(|(relation, target)| Entity::pair(relation, target))
            };
            let Some(id) = id else {
                log::warn!("Unknown component `{relation}` `{component}`, skipping");
                continue;
            };
            if self.is_structural(id) {
                log::warn!("Ignoring structural id {id} in a component list");
                continue;
            }

            if payload.is_empty() {
                self.world_mut().add_id(entity, id)?;
                continue;
            }
            let Some(decode) = factory(self.world(), id).and_then(|factory| factory.decode) else {
                log::warn!("Component `{component}` has no factory, skipping");
                continue;
            };
            let world = self.world_mut();
            world.add_id(entity, id)?;
            if let Some(value) = world.get_erased_mut(entity, id) {
                decode(value, &mut Reader::new(payload))?;
            }
            world.modified(entity, id);
        }
        reader.skip(4)?;
        Ok(())
    }
}

/// The serialization hooks of the component that stores `id`'s data.
fn factory(world: &World, id: Entity) -> Option<Factory> {
    let component = id.relation().unwrap_or(id);
    world
        .get::<Factory>(component)
        .copied()
        .filter(Factory::is_complete)
}

/// Offset of the entity's archetype, `0` when it has none.
fn archetype_offset(world: &World, entity: Entity) -> u64 {
    world
        .bases(entity)
        .into_iter()
        .find(|base| base.is_archetype_id())
        .map_or(0, |base| base.raw() - ARCHETYPE_BASE)
}

/// Archetypes sorted so every base precedes the archetypes deriving from it.
fn archetype_order(world: &World) -> Vec<Entity> {
    let mut pending: Vec<Entity> = world
        .entities()
        .filter(|entity| entity.is_archetype_id() && world.owns_id(*entity, PREFAB))
        .collect();
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|&archetype| {
            let ready = world
                .bases(archetype)
                .iter()
                .all(|base| !base.is_archetype_id() || ordered.contains(base));
            if ready {
                ordered.push(archetype);
            }
            !ready
        });
        if pending.len() == before {
            // Bases that are not saved as archetypes cannot be waited on.
            ordered.append(&mut pending);
        }
    }
    ordered
}
