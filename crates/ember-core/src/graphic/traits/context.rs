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

use crate::graphic::api::*;
use crate::graphic::cache::StateKey;
use crate::graphic::error::GraphicError;

/// The interned state objects a pipeline binds.
///
/// The default value is the null pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineBinding {
    /// Vertex shader.
    pub vertex_shader: Option<StateKey>,
    /// Pixel shader.
    pub pixel_shader: Option<StateKey>,
    /// Geometry shader.
    pub geometry_shader: Option<StateKey>,
    /// Blend state.
    pub blend: Option<StateKey>,
    /// Depth-stencil state.
    pub depth_stencil: Option<StateKey>,
    /// Rasterizer state.
    pub rasterizer: Option<StateKey>,
    /// Input layout.
    pub input_layout: Option<StateKey>,
    /// Primitive topology.
    pub topology: Option<PrimitiveTopology>,
}

/// The immediate-mode binding surface a [`StateTracker`] drives.
///
/// Each method maps to one backend call. Handles equal to `Object::NONE` bind
/// null resources. Other unknown handles are reported as
/// [`GraphicError::InvalidHandle`].
///
/// [`StateTracker`]: crate::graphic::StateTracker
pub trait CommandContext {
    /// Resolves the interned states of a pipeline. `Object::NONE` resolves to
    /// the null pipeline.
    fn pipeline(&self, id: Object) -> Result<PipelineBinding, GraphicError>;

    /// Checks every handle `submission` references before anything is bound.
    ///
    /// The default only resolves the pipeline. Backends holding resource
    /// tables also check buffers and textures.
    fn validate(&self, submission: &Submission) -> Result<(), GraphicError> {
        self.pipeline(submission.pipeline).map(|_| ())
    }

    /// Binds `streams` to vertex slots `first..first + streams.len()`.
    fn set_vertex_buffers(&mut self, first: u32, streams: &[Stream]) -> Result<(), GraphicError>;

    /// Binds the index stream.
    fn set_index_buffer(&mut self, stream: &Stream) -> Result<(), GraphicError>;

    /// Sets the scissor rectangle.
    fn set_scissor(&mut self, rect: &Rect) -> Result<(), GraphicError>;

    /// Binds a vertex shader.
    fn set_vertex_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError>;

    /// Binds a pixel shader.
    fn set_pixel_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError>;

    /// Binds a geometry shader.
    fn set_geometry_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError>;

    /// Binds a blend state.
    fn set_blend_state(&mut self, state: Option<StateKey>) -> Result<(), GraphicError>;

    /// Binds a depth-stencil state together with the stencil reference.
    fn set_depth_stencil_state(
        &mut self,
        state: Option<StateKey>,
        reference: u32,
    ) -> Result<(), GraphicError>;

    /// Binds a rasterizer state.
    fn set_rasterizer_state(&mut self, state: Option<StateKey>) -> Result<(), GraphicError>;

    /// Binds an input layout.
    fn set_input_layout(&mut self, layout: Option<StateKey>) -> Result<(), GraphicError>;

    /// Sets the primitive topology.
    fn set_primitive_topology(
        &mut self,
        topology: Option<PrimitiveTopology>,
    ) -> Result<(), GraphicError>;

    /// Binds samplers to `stage` slots starting at `first`.
    fn set_samplers(
        &mut self,
        stage: ShaderStage,
        first: u32,
        samplers: &[Option<SamplerDescriptor>],
    ) -> Result<(), GraphicError>;

    /// Binds textures to `stage` slots starting at `first`.
    fn set_textures(
        &mut self,
        stage: ShaderStage,
        first: u32,
        textures: &[Object],
    ) -> Result<(), GraphicError>;

    /// Binds uniform windows to `stage` slots starting at `first`.
    fn set_uniforms(
        &mut self,
        stage: ShaderStage,
        first: u32,
        ranges: &[ConstantRange],
    ) -> Result<(), GraphicError>;

    /// Non-indexed, non-instanced draw.
    fn draw(&mut self, count: u32, first_vertex: u32) -> Result<(), GraphicError>;

    /// Non-indexed, instanced draw.
    fn draw_instanced(
        &mut self,
        count: u32,
        instances: u32,
        first_vertex: u32,
    ) -> Result<(), GraphicError>;

    /// Indexed, non-instanced draw.
    fn draw_indexed(
        &mut self,
        count: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> Result<(), GraphicError>;

    /// Indexed, instanced draw.
    fn draw_indexed_instanced(
        &mut self,
        count: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> Result<(), GraphicError>;
}
