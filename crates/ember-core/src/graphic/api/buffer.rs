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

//! Buffer descriptors and alignment rules.

/// The binding a buffer is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex data.
    Vertex,
    /// Index data.
    Index,
    /// Shader constants.
    Uniform,
}

/// Uniform buffers are sized in multiples of this many bytes.
pub const UNIFORM_ALIGNMENT: u32 = 256;

/// Granularity of constant-buffer bindings (one shader constant).
pub const CONSTANT_SIZE: u32 = 16;

/// Rounds `value` up to the next multiple of `alignment` (a power of two).
#[inline]
pub const fn align_up(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}

/// Describes a buffer to create.
///
/// A buffer created with `data` is immutable and rejects later updates.
/// Without data it is zero-initialized and updated with
/// [`update_buffer`](crate::graphic::Driver::update_buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor<'a> {
    /// What the buffer is bound as.
    pub usage: BufferUsage,
    /// Requested size in bytes.
    pub size: u32,
    /// Optional initial contents.
    pub data: Option<&'a [u8]>,
}

impl<'a> BufferDescriptor<'a> {
    /// Size the backend actually allocates: uniform buffers are rounded up to
    /// [`UNIFORM_ALIGNMENT`], other buffers are sized exactly.
    pub fn allocation_size(&self) -> u32 {
        match self.usage {
            BufferUsage::Uniform => align_up(self.size, UNIFORM_ALIGNMENT),
            BufferUsage::Vertex | BufferUsage::Index => self.size,
        }
    }

    /// Returns `true` when the buffer is created with contents and becomes immutable.
    pub fn is_immutable(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_buffers_round_to_256_bytes() {
        let uniform = BufferDescriptor {
            usage: BufferUsage::Uniform,
            size: 100,
            data: None,
        };
        assert_eq!(uniform.allocation_size(), 256);

        let exact = BufferDescriptor {
            usage: BufferUsage::Uniform,
            size: 512,
            data: None,
        };
        assert_eq!(exact.allocation_size(), 512);

        let vertex = BufferDescriptor {
            usage: BufferUsage::Vertex,
            size: 100,
            data: None,
        };
        assert_eq!(vertex.allocation_size(), 100);
    }
}
