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

//! The per-draw submission record.

use super::{
    align_up, IndexFormat, Object, Rect, SamplerDescriptor, ShaderStage, CONSTANT_SIZE,
    MAX_SAMPLER_SLOTS, MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS, MAX_VERTEX_STREAMS,
};

/// A buffer bound as a vertex or index stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Stream {
    /// The bound buffer, `Object::NONE` to unbind.
    pub buffer: Object,
    /// Byte offset of the first element.
    pub offset: u32,
    /// Byte stride between elements. For index streams it selects the index format.
    pub stride: u32,
}

impl Stream {
    /// Index format selected by the stride of an index stream.
    pub fn index_format(&self) -> Option<IndexFormat> {
        IndexFormat::from_stride(self.stride)
    }
}

/// The range of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Primitive {
    /// Vertices (or indices) drawn.
    pub count: u32,
    /// First vertex (or first index).
    pub offset: u32,
    /// Value added to each index before fetching vertices; indexed draws only.
    pub base: i32,
    /// Instances drawn; zero selects a non-instanced draw.
    pub instances: u32,
}

/// A window of a uniform buffer bound to one constant-buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uniform {
    /// The bound buffer, `Object::NONE` to unbind.
    pub buffer: Object,
    /// Byte offset of the window.
    pub offset: u32,
    /// Byte length of the window.
    pub length: u32,
}

impl Uniform {
    /// The window expressed in whole shader constants, rounded to
    /// [`CONSTANT_SIZE`] granularity.
    pub fn constants(&self) -> ConstantRange {
        ConstantRange {
            buffer: self.buffer,
            first: self.offset / CONSTANT_SIZE,
            count: align_up(self.length, CONSTANT_SIZE) / CONSTANT_SIZE,
        }
    }
}

/// A uniform window in shader-constant units, as handed to backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstantRange {
    /// The bound buffer.
    pub buffer: Object,
    /// First constant.
    pub first: u32,
    /// Number of constants.
    pub count: u32,
}

/// Resources bound to one shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Stage {
    /// Texture slots.
    pub textures: [Object; MAX_TEXTURE_SLOTS],
    /// Sampler slots, `None` for a null sampler.
    pub samplers: [Option<SamplerDescriptor>; MAX_SAMPLER_SLOTS],
    /// Uniform buffer slots.
    pub uniforms: [Uniform; MAX_UNIFORM_SLOTS],
}

impl Stage {
    /// The uniform slots in constant units.
    pub fn constants(&self) -> [ConstantRange; MAX_UNIFORM_SLOTS] {
        self.uniforms.map(|uniform| uniform.constants())
    }
}

/// One draw call's worth of state.
///
/// The default value is the all-zero sentinel a state tracker diffs the first
/// submission of a pass against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Submission {
    /// Vertex-fetch slots.
    pub vertices: [Stream; MAX_VERTEX_STREAMS],
    /// Index stream; an unbound buffer selects a non-indexed draw.
    pub indices: Stream,
    /// Draw range.
    pub primitive: Primitive,
    /// Pipeline handle.
    pub pipeline: Object,
    /// Per-stage bindings, indexed by [`ShaderStage::index`].
    pub stages: [Stage; 2],
    /// Scissor rectangle.
    pub scissor: Rect,
    /// Stencil reference value.
    pub stencil: u32,
}

impl Submission {
    /// Bindings of `stage`.
    pub fn stage(&self, stage: ShaderStage) -> &Stage {
        &self.stages[stage.index()]
    }

    /// Mutable bindings of `stage`.
    pub fn stage_mut(&mut self, stage: ShaderStage) -> &mut Stage {
        &mut self.stages[stage.index()]
    }

    /// Returns `true` if the draw reads an index buffer.
    pub fn is_indexed(&self) -> bool {
        !self.indices.buffer.is_none()
    }

    /// Returns `true` if the draw is instanced.
    pub fn is_instanced(&self) -> bool {
        self.primitive.instances > 0
    }

    /// Every non-null buffer handle referenced by the submission.
    pub fn buffers(&self) -> impl Iterator<Item = Object> + '_ {
        self.vertices
            .iter()
            .map(|stream| stream.buffer)
            .chain(std::iter::once(self.indices.buffer))
            .chain(
                self.stages
                    .iter()
                    .flat_map(|stage| stage.uniforms.iter().map(|uniform| uniform.buffer)),
            )
            .filter(|id| !id.is_none())
    }

    /// Every non-null texture handle referenced by the submission.
    pub fn textures(&self) -> impl Iterator<Item = Object> + '_ {
        self.stages
            .iter()
            .flat_map(|stage| stage.textures.iter().copied())
            .filter(|id| !id.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_windows_round_to_whole_constants() {
        let uniform = Uniform {
            buffer: Object(3),
            offset: 256,
            length: 20,
        };
        assert_eq!(
            uniform.constants(),
            ConstantRange {
                buffer: Object(3),
                first: 16,
                count: 2
            }
        );
    }

    #[test]
    fn test_sentinel_is_all_zero() {
        let sentinel = Submission::default();
        assert!(!sentinel.is_indexed());
        assert!(!sentinel.is_instanced());
        assert!(sentinel.pipeline.is_none());
        assert_eq!(sentinel.buffers().count(), 0);
        assert!(sentinel.stage(ShaderStage::Pixel).samplers.iter().all(Option::is_none));
    }
}
