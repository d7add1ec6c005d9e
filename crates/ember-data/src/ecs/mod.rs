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

//! A sparse-set ECS with relationships, inheritance and component traits.
//!
//! Identifiers are partitioned into three disjoint ranges: components live in
//! `[0, 1023]`, archetypes (prefabs) in `[1024, 65534]` and runtime entities
//! from `65535` upwards. A pair packs a relation and a target into one id.

mod component;
mod entity;
mod error;
mod factory;
mod observer;
mod query;
mod registry;
mod storage;
mod system;
mod world;

pub use component::{
    builtin, ChildOf, Component, Disabled, IsA, Prefab, Traits, Wildcard,
};
pub use entity::{
    Entity, ARCHETYPE_BASE, ARCHETYPE_CAPACITY, COMPONENT_LIMIT, ENTITY_BASE,
};
pub use error::EcsError;
pub use factory::{Factory, Serializable};
pub use observer::{Event, ObserverId};
pub use query::{Query, QueryIter, QueryTerms, With, Without, WorldQuery};
pub use registry::ComponentRegistration;
pub use system::SystemId;
pub use world::World;

#[cfg(test)]
mod tests;
