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
use thiserror::Error;

/// Errors raised by [`World`](super::World) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity was never created or has been destroyed.
    #[error("entity {0} is not alive")]
    NotAlive(Entity),
    /// An entity already exists at the requested id.
    #[error("entity {0} is already alive")]
    AlreadyAlive(Entity),
    /// The id cannot name an entity (null or pair).
    #[error("{0} is not a valid entity id")]
    InvalidId(Entity),
    /// The Rust type was never registered.
    #[error("component `{0}` is not registered")]
    Unregistered(&'static str),
    /// The component id range is full.
    #[error("no component id left")]
    ComponentsExhausted,
    /// The id does not name a component with data of the requested type.
    #[error("{0} does not store values of the requested type")]
    TypeMismatch(Entity),
    /// Names must be non-empty and must not contain the `::` separator.
    #[error("`{0}` is not a valid name")]
    InvalidName(String),
    /// A sibling already uses the name.
    #[error("the name `{0}` is already taken in this scope")]
    NameTaken(String),
    /// Toggling a component that did not opt in.
    #[error("component {0} is not toggleable")]
    NotToggleable(Entity),
    /// Setting a singleton component on another entity.
    #[error("component {0} is a singleton and lives on its own entity")]
    Singleton(Entity),
    /// Inheriting from a final entity.
    #[error("{0} is final and cannot be inherited from")]
    Final(Entity),
    /// Setting data on a pair whose relation is associative.
    #[error("pairs with relation {0} cannot carry data")]
    PairIsTag(Entity),
    /// The operation would create an `IsA` or `ChildOf` cycle.
    #[error("{0} cannot be its own ancestor")]
    Cycle(Entity),
    /// A query writes the same component twice, or reads what it writes.
    #[error("query accesses component {0} mutably more than once")]
    ConflictingAccess(Entity),
}
