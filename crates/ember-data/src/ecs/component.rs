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

use super::entity::Entity;
use super::storage::ErasedColumn;
use bitflags::bitflags;
use std::any::TypeId;

/// A marker trait for types that can be attached to entities.
pub trait Component: 'static {}

bitflags! {
    /// Behaviors a component can opt into at registration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Traits: u16 {
        /// Instances read the component through their `IsA` base instead of
        /// receiving a copy.
        const INHERITABLE = 1 << 0;
        /// The component can be disabled per entity without removing it.
        const TOGGLEABLE = 1 << 1;
        /// Values live in stable, individually boxed storage.
        const SPARSE = 1 << 2;
        /// Pairs using the component as relation never carry data.
        const ASSOCIATIVE = 1 << 3;
        /// The component may only be set on its own component entity.
        const SINGLETON = 1 << 4;
        /// The component entity cannot be used as an `IsA` base.
        const FINAL = 1 << 5;
    }
}

/// Tags an entity as an archetype. Prefabs are skipped by queries unless a
/// query asks for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prefab;
impl Component for Prefab {}

/// Relation from an instance to the archetype it inherits from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsA;
impl Component for IsA {}

/// Relation from a child to its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildOf;
impl Component for ChildOf {}

/// Excludes an entity from queries that do not ask for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disabled;
impl Component for Disabled {}

/// Matches any target when used as the target of a pair in lookups,
/// observers and removals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wildcard;
impl Component for Wildcard {}

/// Fixed ids of the built-in components.
pub mod builtin {
    use super::Entity;

    /// [`Prefab`](super::Prefab).
    pub const PREFAB: Entity = Entity::from_raw(1);
    /// [`IsA`](super::IsA).
    pub const IS_A: Entity = Entity::from_raw(2);
    /// [`ChildOf`](super::ChildOf).
    pub const CHILD_OF: Entity = Entity::from_raw(3);
    /// [`Disabled`](super::Disabled).
    pub const DISABLED: Entity = Entity::from_raw(4);
    /// [`Factory`](crate::ecs::Factory).
    pub const FACTORY: Entity = Entity::from_raw(5);
    /// [`Wildcard`](super::Wildcard).
    pub const WILDCARD: Entity = Entity::from_raw(6);
    /// First id handed to user components.
    pub const FIRST_USER_ID: u64 = 16;
}

#[derive(Clone)]
pub(crate) struct ComponentInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub traits: Traits,
    /// `size_of::<T>()`; zero-sized components behave as tags.
    pub size: usize,
    pub new_column: fn(bool) -> Box<dyn ErasedColumn>,
}

impl std::fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("type_name", &self.type_name)
            .field("traits", &self.traits)
            .finish()
    }
}
