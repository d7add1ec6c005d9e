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

//! Opaque resource handles and the fixed-capacity tables that resolve them.

use crate::graphic::error::GraphicError;
use std::fmt;

/// Capacity of the buffer table.
pub const MAX_BUFFERS: usize = 4096;
/// Capacity of the texture table.
pub const MAX_TEXTURES: usize = 4096;
/// Capacity of the pass table.
pub const MAX_PASSES: usize = 256;
/// Capacity of the pipeline table.
pub const MAX_PIPELINES: usize = 1024;
/// Highest multisample count a driver reports.
pub const MAX_SAMPLES: u32 = 16;
/// Vertex-fetch slots per submission.
pub const MAX_VERTEX_STREAMS: usize = 8;
/// Texture slots per shader stage.
pub const MAX_TEXTURE_SLOTS: usize = 8;
/// Sampler slots per shader stage.
pub const MAX_SAMPLER_SLOTS: usize = 8;
/// Uniform buffer slots per shader stage.
pub const MAX_UNIFORM_SLOTS: usize = 4;
/// Color attachments per pass.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// An opaque handle naming a GPU resource inside a driver table.
///
/// `Object::NONE` (zero) never names a resource. Inside a
/// [`Submission`](super::Submission) it binds a null resource, and as a pass
/// argument it addresses the display pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Object(pub u32);

impl Object {
    /// The reserved "none" handle.
    pub const NONE: Object = Object(0);

    /// Returns `true` for the reserved zero handle.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The handle as a table index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The resource tables a handle can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Vertex, index and uniform buffers.
    Buffer,
    /// Textures and render targets.
    Texture,
    /// Render-target configurations.
    Pass,
    /// Compiled pipeline state.
    Pipeline,
}

impl ResourceKind {
    /// Default table capacity for this kind.
    pub fn capacity(self) -> usize {
        match self {
            ResourceKind::Buffer => MAX_BUFFERS,
            ResourceKind::Texture => MAX_TEXTURES,
            ResourceKind::Pass => MAX_PASSES,
            ResourceKind::Pipeline => MAX_PIPELINES,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Pass => "pass",
            ResourceKind::Pipeline => "pipeline",
        })
    }
}

/// A fixed-capacity slot table indexed by [`Object`] handles.
///
/// Slot zero is permanently empty. Every access is bounds and occupancy
/// checked, so a stale or foreign handle is reported instead of aliasing
/// another resource.
#[derive(Debug)]
pub struct ResourceTable<T> {
    kind: ResourceKind,
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> ResourceTable<T> {
    /// Creates a table sized for `kind`.
    pub fn new(kind: ResourceKind) -> Self {
        Self::with_capacity(kind, kind.capacity())
    }

    /// Creates a table with an explicit number of slots (slot zero included).
    pub fn with_capacity(kind: ResourceKind, capacity: usize) -> Self {
        Self {
            kind,
            slots: (0..capacity).map(|_| None).collect(),
            live: 0,
        }
    }

    /// The resource kind stored in this table.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Number of slots, slot zero included.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no resource is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn invalid(&self, id: Object) -> GraphicError {
        GraphicError::InvalidHandle {
            kind: self.kind,
            id,
        }
    }

    /// Stores `value` at `id`.
    pub fn insert(&mut self, id: Object, value: T) -> Result<(), GraphicError> {
        if id.is_none() || id.index() >= self.slots.len() {
            return Err(self.invalid(id));
        }
        let kind = self.kind;
        let slot = &mut self.slots[id.index()];
        if slot.is_some() {
            return Err(GraphicError::HandleInUse { kind, id });
        }
        *slot = Some(value);
        self.live += 1;
        Ok(())
    }

    /// Borrows the resource at `id`.
    pub fn get(&self, id: Object) -> Result<&T, GraphicError> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| self.invalid(id))
    }

    /// Mutably borrows the resource at `id`.
    pub fn get_mut(&mut self, id: Object) -> Result<&mut T, GraphicError> {
        let kind = self.kind;
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphicError::InvalidHandle { kind, id })
    }

    /// Resolves a handle used as a binding: `Object::NONE` yields `Ok(None)`
    /// (a null binding) while any other unknown handle is an error.
    pub fn binding(&self, id: Object) -> Result<Option<&T>, GraphicError> {
        if id.is_none() {
            return Ok(None);
        }
        self.get(id).map(Some)
    }

    /// Removes and returns the resource at `id`, leaving the slot empty.
    pub fn remove(&mut self, id: Object) -> Result<T, GraphicError> {
        let kind = self.kind;
        let value = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphicError::InvalidHandle { kind, id })?;
        self.live -= 1;
        Ok(value)
    }

    /// Returns `true` if `id` names a live resource.
    pub fn contains(&self, id: Object) -> bool {
        self.get(id).is_ok()
    }

    /// Iterates live resources with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (Object, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (Object(index as u32), value)))
    }

    /// Drops every live resource.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_zero_is_never_occupied() {
        let mut table = ResourceTable::with_capacity(ResourceKind::Buffer, 4);
        assert!(matches!(
            table.insert(Object::NONE, 1u32),
            Err(GraphicError::InvalidHandle { .. })
        ));
        assert!(table.get(Object::NONE).is_err());
        assert!(matches!(table.binding(Object::NONE), Ok(None)));
    }

    #[test]
    fn test_out_of_range_and_stale_handles_are_reported() {
        let mut table = ResourceTable::with_capacity(ResourceKind::Texture, 4);
        table.insert(Object(1), "a").unwrap();
        assert_eq!(
            table.get(Object(9)).unwrap_err(),
            GraphicError::InvalidHandle {
                kind: ResourceKind::Texture,
                id: Object(9)
            }
        );

        assert_eq!(table.remove(Object(1)).unwrap(), "a");
        assert!(table.get(Object(1)).is_err());
        assert!(table.binding(Object(1)).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_double_create_is_rejected() {
        let mut table = ResourceTable::with_capacity(ResourceKind::Pass, 4);
        table.insert(Object(2), 0u8).unwrap();
        assert_eq!(
            table.insert(Object(2), 1u8).unwrap_err(),
            GraphicError::HandleInUse {
                kind: ResourceKind::Pass,
                id: Object(2)
            }
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![Object(2)]);
    }
}
