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

//! The scene service: entity lifecycle on top of the ECS and the binary
//! protocol used to save and load archetypes, entities and hierarchies.

mod components;
mod error;
mod serializer;
mod service;
mod settings;

pub use components::{ArchetypeIds, Transient};
pub use error::SceneError;
pub use serializer::LIST_END;
pub use service::Scene;
pub use settings::SceneSettings;
