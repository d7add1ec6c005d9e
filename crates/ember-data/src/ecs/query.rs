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
    builtin::{DISABLED, PREFAB},
    Component,
};
use super::entity::Entity;
use super::error::EcsError;
use super::world::World;
use std::marker::PhantomData;

/// The component ids a query reads, writes, requires and excludes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    /// Components fetched by shared reference.
    pub reads: Vec<Entity>,
    /// Components fetched by mutable reference.
    pub writes: Vec<Entity>,
    /// Ids that must be present but are not fetched.
    pub with: Vec<Entity>,
    /// Ids that must be absent.
    pub without: Vec<Entity>,
}

impl QueryTerms {
    /// Every id the query requires.
    pub fn ids(&self) -> Vec<Entity> {
        self.reads
            .iter()
            .chain(&self.writes)
            .chain(&self.with)
            .copied()
            .collect()
    }

    fn mentions(&self, id: Entity) -> bool {
        self.ids().contains(&id) || self.without.contains(&id)
    }

    /// Returns `true` if `entity` satisfies every term.
    ///
    /// Prefabs and disabled entities only match when a term names them.
    pub fn matches(&self, world: &World, entity: Entity) -> bool {
        let Some(record) = world.records.get(&entity) else {
            return false;
        };
        if !self.mentions(PREFAB) && record.ids.contains(&PREFAB) {
            return false;
        }
        if !self.mentions(DISABLED) && record.ids.contains(&DISABLED) {
            return false;
        }
        self.reads
            .iter()
            .all(|&id| world.owner_of(entity, id).is_some() && world.is_enabled_id(entity, id))
            && self
                .writes
                .iter()
                .all(|&id| world.has_data(entity, id) && world.is_enabled_id(entity, id))
            && self
                .with
                .iter()
                .all(|&id| world.is_enabled_id(entity, id))
            && !self.without.iter().any(|&id| world.has_id(entity, id))
    }
}

/// A type that can be fetched for one entity.
pub trait WorldQuery {
    /// The value produced for each matching entity.
    type Item<'a>;

    /// Appends the ids this query touches.
    fn terms(world: &World, terms: &mut QueryTerms) -> Result<(), EcsError>;

    /// Fetches the item for `entity`.
    ///
    /// # Safety
    /// `world` must be valid for `'a`, and the caller must guarantee that no
    /// other reference to the fetched values is alive. [`Query`] checks that
    /// a query never fetches the same component mutably twice.
    unsafe fn fetch<'a>(world: *mut World, entity: Entity) -> Option<Self::Item<'a>>;
}

impl<T: Component> WorldQuery for &T {
    type Item<'a> = &'a T;

    fn terms(world: &World, terms: &mut QueryTerms) -> Result<(), EcsError> {
        terms.reads.push(world.id_of::<T>()?);
        Ok(())
    }

    unsafe fn fetch<'a>(world: *mut World, entity: Entity) -> Option<Self::Item<'a>> {
        let world = &*world;
        world.get::<T>(entity)
    }
}

impl<T: Component> WorldQuery for &mut T {
    type Item<'a> = &'a mut T;

    fn terms(world: &World, terms: &mut QueryTerms) -> Result<(), EcsError> {
        terms.writes.push(world.id_of::<T>()?);
        Ok(())
    }

    unsafe fn fetch<'a>(world: *mut World, entity: Entity) -> Option<Self::Item<'a>> {
        let world = &mut *world;
        world.get_mut::<T>(entity)
    }
}

impl WorldQuery for Entity {
    type Item<'a> = Entity;

    fn terms(_world: &World, _terms: &mut QueryTerms) -> Result<(), EcsError> {
        Ok(())
    }

    unsafe fn fetch<'a>(_world: *mut World, entity: Entity) -> Option<Self::Item<'a>> {
        Some(entity)
    }
}

/// Requires `T` without fetching it.
pub struct With<T>(PhantomData<T>);

impl<T: Component> WorldQuery for With<T> {
    type Item<'a> = ();

    fn terms(world: &World, terms: &mut QueryTerms) -> Result<(), EcsError> {
        terms.with.push(world.id_of::<T>()?);
        Ok(())
    }

    unsafe fn fetch<'a>(_world: *mut World, _entity: Entity) -> Option<Self::Item<'a>> {
        Some(())
    }
}

/// Excludes entities that have `T`.
pub struct Without<T>(PhantomData<T>);

impl<T: Component> WorldQuery for Without<T> {
    type Item<'a> = ();

    fn terms(world: &World, terms: &mut QueryTerms) -> Result<(), EcsError> {
        terms.without.push(world.id_of::<T>()?);
        Ok(())
    }

    unsafe fn fetch<'a>(_world: *mut World, _entity: Entity) -> Option<Self::Item<'a>> {
        Some(())
    }
}

macro_rules! impl_query_tuple {
    ($($Q:ident),*) => {
        impl<$($Q: WorldQuery),*> WorldQuery for ($($Q,)*) {
            type Item<'a> = ($($Q::Item<'a>,)*);

            fn terms(world: &World, terms: &mut QueryTerms) -> Result<(), EcsError> {
                $($Q::terms(world, terms)?;)*
                Ok(())
            }

            unsafe fn fetch<'a>(world: *mut World, entity: Entity) -> Option<Self::Item<'a>> {
                Some(($($Q::fetch(world, entity)?,)*))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);
impl_query_tuple!(A, B, C, D, E, F);
impl_query_tuple!(A, B, C, D, E, F, G);
impl_query_tuple!(A, B, C, D, E, F, G, H);

/// A validated set of terms that can be evaluated against a world.
///
/// Queries hold no entity cache: every iteration sees the current state.
pub struct Query<Q: WorldQuery> {
    terms: QueryTerms,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: WorldQuery> std::fmt::Debug for Query<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query").field("terms", &self.terms).finish()
    }
}

impl<Q: WorldQuery> Query<Q> {
    pub(crate) fn new(world: &World) -> Result<Self, EcsError> {
        let mut terms = QueryTerms::default();
        Q::terms(world, &mut terms)?;
        for (index, id) in terms.writes.iter().enumerate() {
            if terms.writes[..index].contains(id) || terms.reads.contains(id) {
                return Err(EcsError::ConflictingAccess(*id));
            }
        }
        Ok(Self {
            terms,
            _marker: PhantomData,
        })
    }

    /// The resolved terms.
    pub fn terms(&self) -> &QueryTerms {
        &self.terms
    }

    /// Matching entities in id order.
    pub fn entities(&self, world: &World) -> Vec<Entity> {
        world
            .entities()
            .filter(|entity| self.terms.matches(world, *entity))
            .collect()
    }

    /// Number of matching entities.
    pub fn count(&self, world: &World) -> usize {
        world
            .entities()
            .filter(|entity| self.terms.matches(world, *entity))
            .count()
    }

    /// The first matching entity.
    pub fn first(&self, world: &World) -> Option<Entity> {
        world
            .entities()
            .find(|entity| self.terms.matches(world, *entity))
    }

    /// Iterates matching entities with their fetched items.
    pub fn iter<'w>(&self, world: &'w mut World) -> QueryIter<'w, Q> {
        let entities = self.entities(world);
        QueryIter {
            world: world as *mut World,
            entities: entities.into_iter(),
            _marker: PhantomData,
        }
    }

    /// Calls `f` for each matching entity.
    pub fn each<'w, F>(&self, world: &'w mut World, mut f: F)
    where
        F: FnMut(Entity, Q::Item<'w>),
    {
        for (entity, item) in self.iter(world) {
            f(entity, item);
        }
    }
}

/// Iterator returned by [`Query::iter`].
pub struct QueryIter<'w, Q: WorldQuery> {
    world: *mut World,
    entities: std::vec::IntoIter<Entity>,
    _marker: PhantomData<(&'w mut World, fn() -> Q)>,
}

impl<'w, Q: WorldQuery> Iterator for QueryIter<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        for entity in self.entities.by_ref() {
            // SAFETY: the iterator holds the world's unique borrow for 'w,
            // each entity is visited once, and `Query::new` rejects
            // aliasing mutable terms.
            if let Some(item) = unsafe { Q::fetch(self.world, entity) } {
                return Some((entity, item));
            }
        }
        None
    }
}
