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

use super::component::{
    builtin::{self, CHILD_OF, DISABLED, IS_A, PREFAB, WILDCARD},
    ChildOf, Component, ComponentInfo, Disabled, IsA, Prefab, Traits, Wildcard,
};
use super::entity::{Entity, COMPONENT_LIMIT, ENTITY_BASE};
use super::error::EcsError;
use super::factory::Factory;
use super::observer::{Event, ObserverEntry, ObserverId};
use super::query::{Query, WorldQuery};
use super::storage::{new_column, Column, ErasedColumn};
use super::system::{SystemEntry, SystemId};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

type DeferredCommand = Box<dyn FnOnce(&mut World) -> Result<(), EcsError>>;

/// Per-entity bookkeeping.
#[derive(Debug, Default, Clone)]
pub(crate) struct Record {
    /// Ids in the order they were added.
    pub ids: Vec<Entity>,
    pub disabled: Vec<Entity>,
    pub name: Option<String>,
    pub display_name: String,
    pub parent: Option<Entity>,
    pub children: Vec<Entity>,
}

/// The central container for entities, components, observers and systems.
pub struct World {
    pub(crate) records: BTreeMap<Entity, Record>,
    pub(crate) components: HashMap<Entity, ComponentInfo>,
    types: HashMap<TypeId, Entity>,
    columns: HashMap<Entity, Box<dyn ErasedColumn>>,
    /// `(scope, name)` to entity. Root entities use [`Entity::NULL`] as scope.
    names: HashMap<(Entity, String), Entity>,
    next_component: u64,
    next_entity: u64,
    pub(crate) observers: Vec<ObserverEntry>,
    pub(crate) systems: Vec<SystemEntry>,
    defer_depth: u32,
    commands: Vec<DeferredCommand>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.records.len())
            .field("components", &self.components.len())
            .field("observers", &self.observers.len())
            .field("systems", &self.systems.len())
            .finish()
    }
}

impl World {
    /// Creates a world with the built-in components registered.
    pub fn new() -> Self {
        let mut world = Self {
            records: BTreeMap::new(),
            components: HashMap::new(),
            types: HashMap::new(),
            columns: HashMap::new(),
            names: HashMap::new(),
            next_component: builtin::FIRST_USER_ID,
            next_entity: ENTITY_BASE,
            observers: Vec::new(),
            systems: Vec::new(),
            defer_depth: 0,
            commands: Vec::new(),
        };
        world.install::<Prefab>(PREFAB, "Prefab", Traits::empty());
        world.install::<IsA>(IS_A, "IsA", Traits::ASSOCIATIVE);
        world.install::<ChildOf>(CHILD_OF, "ChildOf", Traits::ASSOCIATIVE);
        world.install::<Disabled>(DISABLED, "Disabled", Traits::empty());
        world.install::<Factory>(builtin::FACTORY, "Factory", Traits::empty());
        world.install::<Wildcard>(WILDCARD, "Wildcard", Traits::empty());
        world
    }

    fn install<T: Component + Default + Clone>(&mut self, id: Entity, name: &str, traits: Traits) {
        self.records.insert(
            id,
            Record {
                name: Some(name.to_owned()),
                ..Record::default()
            },
        );
        self.names.insert((Entity::NULL, name.to_owned()), id);
        self.types.insert(TypeId::of::<T>(), id);
        self.components.insert(
            id,
            ComponentInfo {
                type_name: std::any::type_name::<T>(),
                type_id: TypeId::of::<T>(),
                traits,
                size: std::mem::size_of::<T>(),
                new_column: new_column::<T>,
            },
        );
    }

    // --- Components ---

    /// Registers `T` under `name` and returns a builder to refine it.
    ///
    /// Registering the same type again returns the existing id.
    pub(crate) fn register_component<T: Component + Default + Clone>(
        &mut self,
        name: &str,
    ) -> Result<Entity, EcsError> {
        if let Some(&id) = self.types.get(&TypeId::of::<T>()) {
            return Ok(id);
        }
        validate_name(name)?;
        if self.names.contains_key(&(Entity::NULL, name.to_owned())) {
            return Err(EcsError::NameTaken(name.to_owned()));
        }
        let raw = (self.next_component..COMPONENT_LIMIT)
            .find(|raw| !self.records.contains_key(&Entity::from_raw(*raw)))
            .ok_or(EcsError::ComponentsExhausted)?;
        self.next_component = raw + 1;

        let id = Entity::from_raw(raw);
        self.install::<T>(id, name, Traits::empty());
        log::debug!("Registered component `{name}` as {id}");
        Ok(id)
    }

    /// The id `T` was registered under.
    pub fn id_of<T: Component>(&self) -> Result<Entity, EcsError> {
        self.component_id::<T>()
            .ok_or(EcsError::Unregistered(std::any::type_name::<T>()))
    }

    /// The id `T` was registered under, if any.
    pub fn component_id<T: Component>(&self) -> Option<Entity> {
        self.types.get(&TypeId::of::<T>()).copied()
    }

    /// Returns `true` if `id` names a registered component.
    pub fn is_component(&self, id: Entity) -> bool {
        self.components.contains_key(&id)
    }

    /// The traits of a component, or of the relation of a pair.
    pub fn traits(&self, id: Entity) -> Traits {
        self.info(id).map(|info| info.traits).unwrap_or(Traits::empty())
    }

    /// Adds traits to a registered component.
    pub fn add_traits(&mut self, component: Entity, traits: Traits) -> Result<(), EcsError> {
        let info = self
            .components
            .get_mut(&component)
            .ok_or(EcsError::TypeMismatch(component))?;
        info.traits |= traits;
        Ok(())
    }

    /// Returns `true` if `id` never carries a value worth storing: plain
    /// entities, associative pairs and zero-sized components.
    pub fn is_tag(&self, id: Entity) -> bool {
        self.data_info(id).map_or(true, |info| info.size == 0)
    }

    fn info(&self, id: Entity) -> Option<&ComponentInfo> {
        self.components.get(&id.relation().unwrap_or(id))
    }

    /// Info of the component that stores data for `id`, if it carries any.
    fn data_info(&self, id: Entity) -> Option<&ComponentInfo> {
        let info = self.info(id)?;
        if id.is_pair() && info.traits.contains(Traits::ASSOCIATIVE) {
            return None;
        }
        Some(info)
    }

    fn column<T: Component>(&self, id: Entity) -> Option<&Column<T>> {
        self.columns.get(&id)?.as_any().downcast_ref::<Column<T>>()
    }

    fn column_mut<T: Component>(&mut self, id: Entity) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&id)?
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    fn ensure_column(&mut self, id: Entity) -> Option<&mut Box<dyn ErasedColumn>> {
        let info = self.data_info(id)?;
        let make = info.new_column;
        let sparse = info.traits.contains(Traits::SPARSE);
        Some(self.columns.entry(id).or_insert_with(|| make(sparse)))
    }

    // --- Entities ---

    /// Creates an entity with the next free runtime id.
    pub fn spawn(&mut self) -> Entity {
        loop {
            let entity = Entity::from_raw(self.next_entity);
            self.next_entity += 1;
            if !self.records.contains_key(&entity) {
                self.records.insert(entity, Record::default());
                return entity;
            }
        }
    }

    /// Creates an entity at a chosen id.
    pub fn spawn_at(&mut self, entity: Entity) -> Result<Entity, EcsError> {
        if entity.is_null() || entity.is_pair() {
            return Err(EcsError::InvalidId(entity));
        }
        if self.records.contains_key(&entity) {
            return Err(EcsError::AlreadyAlive(entity));
        }
        self.records.insert(entity, Record::default());
        Ok(entity)
    }

    /// Returns `true` if the entity exists.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Number of live entities, components included.
    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    /// All live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records.keys().copied()
    }

    /// Ids on the entity, in the order they were added.
    pub fn ids(&self, entity: Entity) -> &[Entity] {
        self.records
            .get(&entity)
            .map(|record| record.ids.as_slice())
            .unwrap_or(&[])
    }

    fn record(&self, entity: Entity) -> Result<&Record, EcsError> {
        self.records.get(&entity).ok_or(EcsError::NotAlive(entity))
    }

    fn record_mut(&mut self, entity: Entity) -> Result<&mut Record, EcsError> {
        self.records.get_mut(&entity).ok_or(EcsError::NotAlive(entity))
    }

    fn check_id(&self, id: Entity) -> Result<(), EcsError> {
        match (id.relation(), id.target()) {
            (Some(_), Some(WILDCARD)) => return Err(EcsError::InvalidId(id)),
            (Some(relation), Some(target)) => {
                self.record(relation)?;
                self.record(target)?;
            }
            _ if id.is_null() => return Err(EcsError::InvalidId(id)),
            _ => {
                self.record(id)?;
            }
        }
        Ok(())
    }

    /// Destroys an entity, its children, and every pair that targets it.
    ///
    /// Components are removed in reverse order of addition and each removal
    /// fires its `OnRemove` observers.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        if self.is_deferred() {
            self.defer(move |world| world.destroy(entity));
            return Ok(());
        }
        let record = self.record(entity)?;
        let children = record.children.clone();
        for child in children {
            if self.is_alive(child) {
                self.destroy(child)?;
            }
        }

        if let Some(record) = self.records.get_mut(&entity) {
            if let Some(name) = record.name.take() {
                let scope = record.parent.unwrap_or(Entity::NULL);
                self.names.remove(&(scope, name));
            }
        }
        let ids: Vec<Entity> = self.ids(entity).iter().rev().copied().collect();
        for id in ids {
            self.detach(entity, id);
            if let (Some(CHILD_OF), Some(parent)) = (id.relation(), id.target()) {
                if let Some(record) = self.records.get_mut(&parent) {
                    record.children.retain(|child| *child != entity);
                }
            }
        }
        // Observers may have destroyed it already.
        if !self.is_alive(entity) {
            return Ok(());
        }

        let references: Vec<(Entity, Entity)> = self
            .records
            .iter()
            .flat_map(|(&other, record)| {
                record
                    .ids
                    .iter()
                    .filter(|id| {
                        **id == entity
                            || id.target() == Some(entity)
                            || id.relation() == Some(entity)
                    })
                    .map(move |&id| (other, id))
            })
            .collect();
        for (other, id) in references {
            self.detach(other, id);
        }

        self.records.remove(&entity);
        self.columns.remove(&entity);
        if let Some(info) = self.components.remove(&entity) {
            self.types.remove(&info.type_id);
        }
        Ok(())
    }

    // --- Ids ---

    /// Adds a component, tag or pair by id.
    ///
    /// Typed ids receive a default value. Adding `(ChildOf, p)` reparents
    /// the entity and adding `(IsA, b)` instantiates `b`.
    pub fn add_id(&mut self, entity: Entity, id: Entity) -> Result<(), EcsError> {
        if self.is_deferred() {
            self.defer(move |world| world.add_id(entity, id));
            return Ok(());
        }
        self.record(entity)?;
        self.check_id(id)?;
        if self.owns_id(entity, id) {
            return Ok(());
        }
        self.check_singleton(entity, id)?;
        match (id.relation(), id.target()) {
            (Some(CHILD_OF), Some(parent)) => self.set_parent(entity, Some(parent)),
            (Some(IS_A), Some(base)) => self.is_a(entity, base),
            _ => {
                self.attach(entity, id);
                Ok(())
            }
        }
    }

    /// Adds `T` with its default value.
    pub fn add<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        let id = self.id_of::<T>()?;
        self.add_id(entity, id)
    }

    /// Adds the pair `(relation, target)`.
    pub fn add_pair(&mut self, entity: Entity, relation: Entity, target: Entity) -> Result<(), EcsError> {
        self.add_id(entity, Entity::pair(relation, target))
    }

    fn attach(&mut self, entity: Entity, id: Entity) {
        if let Some(column) = self.ensure_column(id) {
            column.insert_default(entity);
        }
        if let Some(record) = self.records.get_mut(&entity) {
            record.ids.push(id);
        }
        self.emit(Event::OnAdd, entity, id);
    }

    fn detach(&mut self, entity: Entity, id: Entity) {
        if !self.owns_id(entity, id) {
            return;
        }
        self.emit(Event::OnRemove, entity, id);
        if let Some(column) = self.columns.get_mut(&id) {
            column.remove(entity);
        }
        if let Some(record) = self.records.get_mut(&entity) {
            record.ids.retain(|owned| *owned != id);
            record.disabled.retain(|owned| *owned != id);
        }
    }

    fn check_singleton(&self, entity: Entity, id: Entity) -> Result<(), EcsError> {
        if !id.is_pair() && entity != id && self.traits(id).contains(Traits::SINGLETON) {
            return Err(EcsError::Singleton(id));
        }
        Ok(())
    }

    /// Sets the value of `T`, adding it if needed.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), EcsError> {
        let id = self.id_of::<T>()?;
        self.set_id(entity, id, value)
    }

    /// Sets the value of the pair `(T, target)`.
    pub fn set_pair<T: Component>(&mut self, entity: Entity, target: Entity, value: T) -> Result<(), EcsError> {
        let relation = self.id_of::<T>()?;
        if self.traits(relation).contains(Traits::ASSOCIATIVE) {
            return Err(EcsError::PairIsTag(relation));
        }
        self.set_id(entity, Entity::pair(relation, target), value)
    }

    fn set_id<T: Component>(&mut self, entity: Entity, id: Entity, value: T) -> Result<(), EcsError> {
        if self.is_deferred() {
            self.defer(move |world| world.set_id(entity, id, value));
            return Ok(());
        }
        self.record(entity)?;
        self.check_id(id)?;
        self.check_singleton(entity, id)?;
        let added = !self.owns_id(entity, id);

        let column = self
            .ensure_column(id)
            .and_then(|column| column.as_any_mut().downcast_mut::<Column<T>>())
            .ok_or(EcsError::TypeMismatch(id))?;
        column.insert(entity, value);

        if added {
            self.record_mut(entity)?.ids.push(id);
            self.emit(Event::OnAdd, entity, id);
        }
        self.emit(Event::OnSet, entity, id);
        Ok(())
    }

    /// Reads `T`, following `IsA` for inheritable components.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let id = self.component_id::<T>()?;
        let owner = self.owner_of(entity, id)?;
        self.column::<T>(id)?.get(owner)
    }

    /// Mutable access to an owned `T`. Inherited values are not returned.
    ///
    /// Call [`World::modified`] afterwards to fire `OnSet`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let id = self.component_id::<T>()?;
        self.column_mut::<T>(id)?.get_mut(entity)
    }

    /// Reads the value of the pair `(T, target)`.
    pub fn get_pair<T: Component>(&self, entity: Entity, target: Entity) -> Option<&T> {
        let id = Entity::pair(self.component_id::<T>()?, target);
        let owner = self.owner_of(entity, id)?;
        self.column::<T>(id)?.get(owner)
    }

    /// Type-erased read of any id that carries data.
    pub fn get_erased(&self, entity: Entity, id: Entity) -> Option<&dyn Any> {
        let owner = self.owner_of(entity, id)?;
        self.columns.get(&id)?.value(owner)
    }

    /// Type-erased write of an owned id that carries data.
    pub fn get_erased_mut(&mut self, entity: Entity, id: Entity) -> Option<&mut dyn Any> {
        self.columns.get_mut(&id)?.value_mut(entity)
    }

    /// Returns `true` if `id` stores a value for the entity itself.
    pub fn has_data(&self, entity: Entity, id: Entity) -> bool {
        self.columns.get(&id).is_some_and(|column| column.contains(entity))
    }

    /// The entity that provides the value of `id` for `entity`.
    pub(crate) fn owner_of(&self, entity: Entity, id: Entity) -> Option<Entity> {
        if self.has_data(entity, id) {
            return Some(entity);
        }
        if !self.traits(id).contains(Traits::INHERITABLE) {
            return None;
        }
        self.bases(entity)
            .into_iter()
            .find_map(|base| self.owner_of(base, id))
    }

    /// Fires `OnSet` for a value changed through [`World::get_mut`].
    pub fn modified(&mut self, entity: Entity, id: Entity) {
        if self.owns_id(entity, id) {
            self.emit(Event::OnSet, entity, id);
        }
    }

    /// Returns `true` if the entity owns `id` or inherits it.
    pub fn has_id(&self, entity: Entity, id: Entity) -> bool {
        if self.owns_id(entity, id) {
            return true;
        }
        self.traits(id).contains(Traits::INHERITABLE)
            && self.bases(entity).into_iter().any(|base| self.has_id(base, id))
    }

    /// Returns `true` if `id` is on the entity itself. A `(relation,
    /// Wildcard)` pair matches any target.
    pub fn owns_id(&self, entity: Entity, id: Entity) -> bool {
        self.records
            .get(&entity)
            .is_some_and(|record| record.ids.iter().any(|owned| id_matches(id, *owned)))
    }

    /// Returns `true` if the entity has `T`, owned or inherited.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.component_id::<T>()
            .is_some_and(|id| self.has_id(entity, id))
    }

    /// Returns `true` if the entity has the pair `(relation, target)`.
    pub fn has_pair(&self, entity: Entity, relation: Entity, target: Entity) -> bool {
        self.has_id(entity, Entity::pair(relation, target))
    }

    /// Removes an id. Removing `(ChildOf, p)` detaches the entity and
    /// removing `(relation, Wildcard)` drops every pair of that relation.
    pub fn remove_id(&mut self, entity: Entity, id: Entity) -> Result<(), EcsError> {
        if self.is_deferred() {
            self.defer(move |world| world.remove_id(entity, id));
            return Ok(());
        }
        self.record(entity)?;
        if id.target() == Some(WILDCARD) {
            let matching: Vec<Entity> = self
                .ids(entity)
                .iter()
                .copied()
                .filter(|owned| id_matches(id, *owned))
                .collect();
            for owned in matching {
                self.remove_id(entity, owned)?;
            }
            return Ok(());
        }
        if !self.owns_id(entity, id) {
            return Ok(());
        }
        if id.relation() == Some(CHILD_OF) {
            return self.set_parent(entity, None);
        }
        self.detach(entity, id);
        Ok(())
    }

    /// Removes `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        let id = self.id_of::<T>()?;
        self.remove_id(entity, id)
    }

    /// Removes the pair `(relation, target)`.
    pub fn remove_pair(&mut self, entity: Entity, relation: Entity, target: Entity) -> Result<(), EcsError> {
        self.remove_id(entity, Entity::pair(relation, target))
    }

    /// First target of `relation` on the entity.
    pub fn target(&self, entity: Entity, relation: Entity) -> Option<Entity> {
        self.ids(entity)
            .iter()
            .find(|id| id.relation() == Some(relation))
            .and_then(|id| id.target())
    }

    // --- Inheritance ---

    /// Direct `IsA` bases of the entity.
    pub fn bases(&self, entity: Entity) -> Vec<Entity> {
        self.ids(entity)
            .iter()
            .filter(|id| id.relation() == Some(IS_A))
            .filter_map(|id| id.target())
            .collect()
    }

    fn inherits_from(&self, entity: Entity, base: Entity) -> bool {
        self.bases(entity)
            .into_iter()
            .any(|direct| direct == base || self.inherits_from(direct, base))
    }

    /// Makes `entity` an instance of `base`.
    ///
    /// Inheritable components are shared through the base. Every other id on
    /// the base chain is copied onto the instance, except the structural ones
    /// (`Prefab`, `Disabled`, `IsA` and `ChildOf` pairs).
    pub fn is_a(&mut self, entity: Entity, base: Entity) -> Result<(), EcsError> {
        if self.is_deferred() {
            self.defer(move |world| world.is_a(entity, base));
            return Ok(());
        }
        self.record(entity)?;
        self.record(base)?;
        if entity == base || self.inherits_from(base, entity) {
            return Err(EcsError::Cycle(entity));
        }
        if self.traits(base).contains(Traits::FINAL) {
            return Err(EcsError::Final(base));
        }
        let pair = Entity::pair(IS_A, base);
        if self.owns_id(entity, pair) {
            return Ok(());
        }
        self.attach(entity, pair);

        for (owner, id) in self.instantiable(base) {
            if self.owns_id(entity, id) {
                continue;
            }
            let copied = match self.ensure_column(id) {
                Some(column) => column.copy_value(owner, entity),
                None => false,
            };
            self.record_mut(entity)?.ids.push(id);
            self.emit(Event::OnAdd, entity, id);
            if copied {
                self.emit(Event::OnSet, entity, id);
            }
        }
        Ok(())
    }

    /// Ids copied onto instances of `base`, closest base first.
    fn instantiable(&self, base: Entity) -> Vec<(Entity, Entity)> {
        let mut found: Vec<(Entity, Entity)> = Vec::new();
        let mut pending = vec![base];
        while let Some(current) = pending.pop() {
            for &id in self.ids(current) {
                let structural = id == PREFAB
                    || id == DISABLED
                    || matches!(id.relation(), Some(IS_A) | Some(CHILD_OF));
                if structural
                    || self.traits(id).contains(Traits::INHERITABLE)
                    || found.iter().any(|(_, seen)| *seen == id)
                {
                    continue;
                }
                found.push((current, id));
            }
            pending.extend(self.bases(current).into_iter().rev());
        }
        found
    }

    // --- Toggling ---

    /// Enables or disables an owned, toggleable id.
    pub fn enable_id(&mut self, entity: Entity, id: Entity, enabled: bool) -> Result<(), EcsError> {
        if !self.traits(id).contains(Traits::TOGGLEABLE) {
            return Err(EcsError::NotToggleable(id));
        }
        if !self.owns_id(entity, id) {
            return Ok(());
        }
        let record = self.record_mut(entity)?;
        record.disabled.retain(|disabled| *disabled != id);
        if !enabled {
            record.disabled.push(id);
        }
        Ok(())
    }

    /// Enables `T` on the entity.
    pub fn enable<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        let id = self.id_of::<T>()?;
        self.enable_id(entity, id, true)
    }

    /// Disables `T` on the entity.
    pub fn disable<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        let id = self.id_of::<T>()?;
        self.enable_id(entity, id, false)
    }

    /// Returns `true` if the entity has `id` and it is not disabled.
    pub fn is_enabled_id(&self, entity: Entity, id: Entity) -> bool {
        let owner = self.owner_of(entity, id).unwrap_or(entity);
        self.has_id(entity, id)
            && self
                .records
                .get(&owner)
                .is_some_and(|record| !record.disabled.contains(&id))
    }

    /// Returns `true` if the entity has `T` enabled.
    pub fn is_enabled<T: Component>(&self, entity: Entity) -> bool {
        self.component_id::<T>()
            .is_some_and(|id| self.is_enabled_id(entity, id))
    }

    // --- Singletons ---

    /// Sets `T` on its own component entity.
    pub fn set_singleton<T: Component>(&mut self, value: T) -> Result<(), EcsError> {
        let id = self.id_of::<T>()?;
        self.set_id(id, id, value)
    }

    /// Reads the singleton `T`.
    pub fn singleton<T: Component>(&self) -> Option<&T> {
        let id = self.component_id::<T>()?;
        self.get::<T>(id)
    }

    /// Mutable access to the singleton `T`.
    pub fn singleton_mut<T: Component>(&mut self) -> Option<&mut T> {
        let id = self.component_id::<T>()?;
        self.get_mut::<T>(id)
    }

    // --- Names ---

    /// Names the entity. Names are unique among siblings.
    pub fn set_name(&mut self, entity: Entity, name: &str) -> Result<(), EcsError> {
        validate_name(name)?;
        let record = self.record(entity)?;
        let scope = record.parent.unwrap_or(Entity::NULL);
        let previous = record.name.clone();
        match self.names.get(&(scope, name.to_owned())) {
            Some(&owner) if owner == entity => return Ok(()),
            Some(_) => return Err(EcsError::NameTaken(name.to_owned())),
            None => {}
        }
        if let Some(previous) = previous {
            self.names.remove(&(scope, previous));
        }
        self.names.insert((scope, name.to_owned()), entity);
        self.record_mut(entity)?.name = Some(name.to_owned());
        Ok(())
    }

    /// Removes the entity's name.
    pub fn clear_name(&mut self, entity: Entity) -> Result<(), EcsError> {
        let record = self.record_mut(entity)?;
        let scope = record.parent.unwrap_or(Entity::NULL);
        if let Some(name) = record.name.take() {
            self.names.remove(&(scope, name));
        }
        Ok(())
    }

    /// The entity's name, unique within its parent.
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.records.get(&entity)?.name.as_deref()
    }

    /// The `::`-separated names from the root down to the entity.
    ///
    /// Returns `None` when the entity or one of its ancestors is unnamed.
    pub fn path(&self, entity: Entity) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(entity);
        while let Some(node) = current {
            let record = self.records.get(&node)?;
            segments.push(record.name.as_deref()?);
            current = record.parent;
        }
        segments.reverse();
        Some(segments.join("::"))
    }

    /// Resolves a `::`-separated path from the root.
    pub fn lookup(&self, path: &str) -> Option<Entity> {
        path.split("::").try_fold(Entity::NULL, |scope, segment| {
            self.names.get(&(scope, segment.to_owned())).copied()
        })
    }

    /// Resolves a single name among the children of `scope`.
    pub fn lookup_child(&self, scope: Option<Entity>, name: &str) -> Option<Entity> {
        self.names
            .get(&(scope.unwrap_or(Entity::NULL), name.to_owned()))
            .copied()
    }

    /// Sets the free-form display name.
    pub fn set_display_name(&mut self, entity: Entity, name: &str) -> Result<(), EcsError> {
        self.record_mut(entity)?.display_name = name.to_owned();
        Ok(())
    }

    /// The free-form display name, empty when unset.
    pub fn display_name(&self, entity: Entity) -> &str {
        self.records
            .get(&entity)
            .map(|record| record.display_name.as_str())
            .unwrap_or("")
    }

    // --- Hierarchy ---

    /// Makes `parent` the only parent of `entity`.
    pub fn child_of(&mut self, entity: Entity, parent: Entity) -> Result<(), EcsError> {
        if self.is_deferred() {
            self.defer(move |world| world.set_parent(entity, Some(parent)));
            return Ok(());
        }
        self.set_parent(entity, Some(parent))
    }

    /// Moves the entity under `parent`, or to the root when `None`.
    pub fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) -> Result<(), EcsError> {
        let record = self.record(entity)?;
        let previous = record.parent;
        let name = record.name.clone();
        if previous == parent {
            return Ok(());
        }
        if let Some(parent) = parent {
            self.record(parent)?;
            let mut ancestor = Some(parent);
            while let Some(node) = ancestor {
                if node == entity {
                    return Err(EcsError::Cycle(entity));
                }
                ancestor = self.parent(node);
            }
        }

        if let Some(name) = name {
            let key = (parent.unwrap_or(Entity::NULL), name.clone());
            if self.names.contains_key(&key) {
                return Err(EcsError::NameTaken(name));
            }
            self.names.remove(&(previous.unwrap_or(Entity::NULL), name));
            self.names.insert(key, entity);
        }

        if let Some(previous) = previous {
            self.detach(entity, Entity::pair(CHILD_OF, previous));
            if let Some(record) = self.records.get_mut(&previous) {
                record.children.retain(|child| *child != entity);
            }
        }
        self.record_mut(entity)?.parent = parent;
        if let Some(parent) = parent {
            self.record_mut(parent)?.children.push(entity);
            self.attach(entity, Entity::pair(CHILD_OF, parent));
        }
        Ok(())
    }

    /// The entity's parent.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.records.get(&entity)?.parent
    }

    /// The entity's children in the order they were attached.
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.records
            .get(&entity)
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    // --- Queries, observers and systems ---

    /// Builds a query over `Q`.
    pub fn query<Q: WorldQuery>(&self) -> Result<Query<Q>, EcsError> {
        Query::new(self)
    }

    /// Calls `callback` when `event` fires for an entity that has all `ids`.
    pub fn observe<F>(&mut self, event: Event, ids: &[Entity], callback: F) -> ObserverId
    where
        F: FnMut(&mut World, Entity) + 'static,
    {
        let id = ObserverId(self.observers.len());
        self.observers.push(ObserverEntry {
            event,
            ids: ids.to_vec(),
            callback: Some(Box::new(callback)),
        });
        id
    }

    /// Calls `callback` when `event` fires for an entity matching the terms
    /// of `Q`.
    pub fn observer<Q: WorldQuery, F>(&mut self, event: Event, callback: F) -> Result<ObserverId, EcsError>
    where
        F: FnMut(&mut World, Entity) + 'static,
    {
        let query = self.query::<Q>()?;
        Ok(self.observe(event, &query.terms().ids(), callback))
    }

    /// Unregisters an observer.
    pub fn remove_observer(&mut self, observer: ObserverId) {
        if let Some(entry) = self.observers.get_mut(observer.0) {
            entry.ids.clear();
            entry.callback = None;
        }
    }

    pub(crate) fn emit(&mut self, event: Event, entity: Entity, id: Entity) {
        for index in 0..self.observers.len() {
            let entry = &self.observers[index];
            let fires = entry.event == event
                && entry.callback.is_some()
                && entry.ids.iter().any(|watched| id_matches(*watched, id))
                && entry
                    .ids
                    .iter()
                    .all(|other| id_matches(*other, id) || self.has_id(entity, *other));
            if !fires {
                continue;
            }
            // Taken out while running so the callback can borrow the world.
            let mut callback = self.observers[index].callback.take();
            if let Some(callback) = callback.as_mut() {
                callback(self, entity);
            }
            self.observers[index].callback = callback;
        }
    }

    /// Registers a system that runs `callback` with a query over `Q` on every
    /// [`World::progress`].
    pub fn system<Q, F>(&mut self, name: &str, mut callback: F) -> Result<SystemId, EcsError>
    where
        Q: WorldQuery + 'static,
        F: FnMut(&mut World, &Query<Q>, f32) + 'static,
    {
        let query = self.query::<Q>()?;
        let id = SystemId(self.systems.len());
        self.systems.push(SystemEntry {
            name: name.to_owned(),
            run: Some(Box::new(move |world: &mut World, delta: f32| {
                callback(world, &query, delta)
            })),
        });
        Ok(id)
    }

    /// Runs every system once, in registration order, inside a deferred
    /// bracket.
    pub fn progress(&mut self, delta: f32) {
        self.defer_begin();
        for index in 0..self.systems.len() {
            let mut run = self.systems[index].run.take();
            if let Some(run) = run.as_mut() {
                log::trace!("Running system `{}`", self.systems[index].name);
                run(self, delta);
            }
            self.systems[index].run = run;
        }
        self.defer_end();
    }

    // --- Deferral ---

    /// Queues structural changes until the matching [`World::defer_end`].
    pub fn defer_begin(&mut self) {
        self.defer_depth += 1;
    }

    /// Closes a deferred bracket and applies queued changes when it was the
    /// outermost one.
    pub fn defer_end(&mut self) {
        if self.defer_depth == 0 {
            return;
        }
        self.defer_depth -= 1;
        if self.defer_depth == 0 {
            self.flush();
        }
    }

    /// Returns `true` inside a deferred bracket.
    pub fn is_deferred(&self) -> bool {
        self.defer_depth > 0
    }

    fn defer(&mut self, command: impl FnOnce(&mut World) -> Result<(), EcsError> + 'static) {
        self.commands.push(Box::new(command));
    }

    fn flush(&mut self) {
        while !self.commands.is_empty() {
            let commands = std::mem::take(&mut self.commands);
            for command in commands {
                if let Err(error) = command(self) {
                    log::warn!("Deferred command failed: {error}");
                }
            }
        }
    }
}

fn id_matches(pattern: Entity, id: Entity) -> bool {
    pattern == id
        || (pattern.target() == Some(WILDCARD)
            && id.is_pair()
            && pattern.relation() == id.relation())
}

fn validate_name(name: &str) -> Result<(), EcsError> {
    if name.is_empty() || name.contains("::") {
        return Err(EcsError::InvalidName(name.to_owned()));
    }
    Ok(())
}
