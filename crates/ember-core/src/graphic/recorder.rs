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

//! A [`CommandContext`] that records calls instead of executing them.
//!
//! Used by the headless backend and by tests asserting exactly which state a
//! submission stream rebinds.

use crate::graphic::api::*;
use crate::graphic::cache::StateKey;
use crate::graphic::error::GraphicError;
use crate::graphic::traits::{CommandContext, PipelineBinding};
use std::collections::HashMap;

/// One recorded context call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Command {
    VertexBuffers {
        first: u32,
        streams: Vec<Stream>,
    },
    IndexBuffer(Stream),
    Scissor(Rect),
    VertexShader(Option<StateKey>),
    PixelShader(Option<StateKey>),
    GeometryShader(Option<StateKey>),
    BlendState(Option<StateKey>),
    DepthStencilState {
        state: Option<StateKey>,
        reference: u32,
    },
    RasterizerState(Option<StateKey>),
    InputLayout(Option<StateKey>),
    Topology(Option<PrimitiveTopology>),
    Samplers {
        stage: ShaderStage,
        first: u32,
        samplers: Vec<Option<SamplerDescriptor>>,
    },
    Textures {
        stage: ShaderStage,
        first: u32,
        textures: Vec<Object>,
    },
    Uniforms {
        stage: ShaderStage,
        first: u32,
        ranges: Vec<ConstantRange>,
    },
    Draw {
        count: u32,
        first_vertex: u32,
    },
    DrawInstanced {
        count: u32,
        instances: u32,
        first_vertex: u32,
    },
    DrawIndexed {
        count: u32,
        first_index: u32,
        base_vertex: i32,
    },
    DrawIndexedInstanced {
        count: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
    },
}

impl Command {
    /// Returns `true` for the four draw variants.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Command::Draw { .. }
                | Command::DrawInstanced { .. }
                | Command::DrawIndexed { .. }
                | Command::DrawIndexedInstanced { .. }
        )
    }
}

/// Records every call it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    pipelines: HashMap<Object, PipelineBinding>,
    commands: Vec<Command>,
}

impl Recorder {
    /// Creates an empty recorder with no known pipelines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `id` resolve to `binding`.
    pub fn bind_pipeline(&mut self, id: Object, binding: PipelineBinding) {
        self.pipelines.insert(id, binding);
    }

    /// Forgets pipeline `id`.
    pub fn unbind_pipeline(&mut self, id: Object) {
        self.pipelines.remove(&id);
    }

    /// Calls recorded since the last [`take`](Self::take).
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains the recorded calls.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    fn record(&mut self, command: Command) -> Result<(), GraphicError> {
        self.commands.push(command);
        Ok(())
    }
}

impl CommandContext for Recorder {
    fn pipeline(&self, id: Object) -> Result<PipelineBinding, GraphicError> {
        if id.is_none() {
            return Ok(PipelineBinding::default());
        }
        self.pipelines
            .get(&id)
            .copied()
            .ok_or(GraphicError::InvalidHandle {
                kind: ResourceKind::Pipeline,
                id,
            })
    }

    fn set_vertex_buffers(&mut self, first: u32, streams: &[Stream]) -> Result<(), GraphicError> {
        self.record(Command::VertexBuffers {
            first,
            streams: streams.to_vec(),
        })
    }

    fn set_index_buffer(&mut self, stream: &Stream) -> Result<(), GraphicError> {
        self.record(Command::IndexBuffer(*stream))
    }

    fn set_scissor(&mut self, rect: &Rect) -> Result<(), GraphicError> {
        self.record(Command::Scissor(*rect))
    }

    fn set_vertex_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError> {
        self.record(Command::VertexShader(shader))
    }

    fn set_pixel_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError> {
        self.record(Command::PixelShader(shader))
    }

    fn set_geometry_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError> {
        self.record(Command::GeometryShader(shader))
    }

    fn set_blend_state(&mut self, state: Option<StateKey>) -> Result<(), GraphicError> {
        self.record(Command::BlendState(state))
    }

    fn set_depth_stencil_state(
        &mut self,
        state: Option<StateKey>,
        reference: u32,
    ) -> Result<(), GraphicError> {
        self.record(Command::DepthStencilState { state, reference })
    }

    fn set_rasterizer_state(&mut self, state: Option<StateKey>) -> Result<(), GraphicError> {
        self.record(Command::RasterizerState(state))
    }

    fn set_input_layout(&mut self, layout: Option<StateKey>) -> Result<(), GraphicError> {
        self.record(Command::InputLayout(layout))
    }

    fn set_primitive_topology(
        &mut self,
        topology: Option<PrimitiveTopology>,
    ) -> Result<(), GraphicError> {
        self.record(Command::Topology(topology))
    }

    fn set_samplers(
        &mut self,
        stage: ShaderStage,
        first: u32,
        samplers: &[Option<SamplerDescriptor>],
    ) -> Result<(), GraphicError> {
        self.record(Command::Samplers {
            stage,
            first,
            samplers: samplers.to_vec(),
        })
    }

    fn set_textures(
        &mut self,
        stage: ShaderStage,
        first: u32,
        textures: &[Object],
    ) -> Result<(), GraphicError> {
        self.record(Command::Textures {
            stage,
            first,
            textures: textures.to_vec(),
        })
    }

    fn set_uniforms(
        &mut self,
        stage: ShaderStage,
        first: u32,
        ranges: &[ConstantRange],
    ) -> Result<(), GraphicError> {
        self.record(Command::Uniforms {
            stage,
            first,
            ranges: ranges.to_vec(),
        })
    }

    fn draw(&mut self, count: u32, first_vertex: u32) -> Result<(), GraphicError> {
        self.record(Command::Draw {
            count,
            first_vertex,
        })
    }

    fn draw_instanced(
        &mut self,
        count: u32,
        instances: u32,
        first_vertex: u32,
    ) -> Result<(), GraphicError> {
        self.record(Command::DrawInstanced {
            count,
            instances,
            first_vertex,
        })
    }

    fn draw_indexed(
        &mut self,
        count: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> Result<(), GraphicError> {
        self.record(Command::DrawIndexed {
            count,
            first_index,
            base_vertex,
        })
    }

    fn draw_indexed_instanced(
        &mut self,
        count: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> Result<(), GraphicError> {
        self.record(Command::DrawIndexedInstanced {
            count,
            instances,
            first_index,
            base_vertex,
        })
    }
}
