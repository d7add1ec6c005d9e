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

use crate::ecs::{Component, ARCHETYPE_CAPACITY};
use ember_core::HandleAllocator;

/// Marks runtime-only entities. They and their subtrees are never saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transient;
impl Component for Transient {}

/// Singleton allocator for archetype ids.
///
/// Holds offsets into the archetype range; an archetype's id is
/// `ARCHETYPE_BASE + offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchetypeIds(pub HandleAllocator);
impl Component for ArchetypeIds {}

impl Default for ArchetypeIds {
    fn default() -> Self {
        Self(HandleAllocator::new(ARCHETYPE_CAPACITY))
    }
}
