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
use super::world::World;

/// Lifecycle events observers can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// An id was added to an entity.
    OnAdd,
    /// An id is about to be removed. The value is still readable.
    OnRemove,
    /// A value was assigned.
    OnSet,
}

/// Handle returned when registering an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) usize);

pub(crate) type ObserverFn = Box<dyn FnMut(&mut World, Entity)>;

pub(crate) struct ObserverEntry {
    pub event: Event,
    /// Fires when one of these ids changes and the entity has all of them.
    pub ids: Vec<Entity>,
    /// `None` while the callback runs, or after removal.
    pub callback: Option<ObserverFn>,
}
