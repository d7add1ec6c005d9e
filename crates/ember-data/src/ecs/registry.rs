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

use super::component::{Component, Traits};
use super::entity::Entity;
use super::error::EcsError;
use super::factory::{Factory, Serializable};
use super::world::World;
use std::marker::PhantomData;

/// A builder returned by [`World::register`] to refine a component.
pub struct ComponentRegistration<'w, T: Component> {
    world: &'w mut World,
    id: Entity,
    _marker: PhantomData<fn() -> T>,
}

impl<'w, T: Component> ComponentRegistration<'w, T> {
    /// The component's id.
    pub fn id(&self) -> Entity {
        self.id
    }

    /// Adds traits to the component.
    pub fn with(self, traits: Traits) -> Self {
        if let Err(error) = self.world.add_traits(self.id, traits) {
            log::warn!("Cannot add traits to {}: {error}", self.id);
        }
        self
    }

    /// Attaches the serialization hooks of `T` so scenes save and load it.
    pub fn serializable(self) -> Self
    where
        T: Serializable,
    {
        if let Err(error) = self.world.set(self.id, Factory::of::<T>()) {
            log::warn!("Cannot attach a factory to {}: {error}", self.id);
        }
        self
    }
}

impl World {
    /// Registers `T` as a component named `name`.
    ///
    /// ## Arguments
    /// * `name` - The name of the component entity, used by scene files to
    ///   refer to the type. Must be unique among root entities.
    pub fn register<T: Component + Default + Clone>(
        &mut self,
        name: &str,
    ) -> Result<ComponentRegistration<'_, T>, EcsError> {
        let id = self.register_component::<T>(name)?;
        Ok(ComponentRegistration {
            world: self,
            id,
            _marker: PhantomData,
        })
    }
}
