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

use crate::ecs::{EcsError, Entity};
use ember_core::DecodeError;
use thiserror::Error;

/// Errors raised by the scene service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// An ECS operation failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),
    /// The stream is truncated or malformed.
    #[error("malformed scene stream: {0}")]
    Decode(#[from] DecodeError),
    /// Every archetype id is in use.
    #[error("no archetype id left")]
    ArchetypesExhausted,
    /// The stream names an archetype id outside the archetype range.
    #[error("archetype offset {0} is out of range")]
    InvalidArchetype(u64),
    /// The entity does not exist or is not an archetype.
    #[error("{0} is not an archetype")]
    NotAnArchetype(Entity),
    /// Loading was attempted while the world defers structural changes.
    #[error("scenes cannot be loaded while the world is deferred")]
    Deferred,
}
