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

//! The [`CommandContext`] over the immediate device context.

use super::com::Com;
use super::conversions::IntoD3D11;
use super::resources::{D3D11Buffer, D3D11Texture};
use super::states::D3D11States;
use crate::graphic::states::PipelineStates;
use ember_core::graphic::{
    align_up, CommandContext, ConstantRange, GraphicError, Object, PipelineBinding, PrimitiveTopology,
    Rect, ResourceKind, ResourceTable, SamplerDescriptor, ShaderStage, StateKey, Stream, Submission,
};
use std::ptr;
use winapi::shared::dxgiformat::DXGI_FORMAT_UNKNOWN;
use winapi::shared::windef::RECT;
use winapi::um::d3d11::*;
use winapi::um::d3d11_1::ID3D11DeviceContext1;
use winapi::um::d3dcommon::D3D_PRIMITIVE_TOPOLOGY_UNDEFINED;

/// Everything a submit needs, borrowed from the driver for its duration.
pub struct D3D11Context<'a> {
    pub context: &'a Com<ID3D11DeviceContext1>,
    pub factory: &'a mut D3D11States,
    pub states: &'a mut PipelineStates<D3D11States>,
    pub pipelines: &'a ResourceTable<PipelineBinding>,
    pub buffers: &'a ResourceTable<D3D11Buffer>,
    pub textures: &'a ResourceTable<D3D11Texture>,
}

fn missing(what: &str, key: StateKey) -> GraphicError {
    GraphicError::InvalidDescriptor(format!("{what} {key} is not interned"))
}

impl D3D11Context<'_> {
    fn buffer(&self, id: Object) -> Result<*mut ID3D11Buffer, GraphicError> {
        Ok(self
            .buffers
            .binding(id)?
            .map_or(ptr::null_mut(), |buffer| buffer.buffer.as_ptr()))
    }

    fn lookup<'s, T: winapi::Interface>(
        key: Option<StateKey>,
        what: &str,
        get: impl Fn(StateKey) -> Option<&'s Com<T>>,
    ) -> Result<*mut T, GraphicError> {
        match key {
            Some(key) => get(key).map(Com::as_ptr).ok_or_else(|| missing(what, key)),
            None => Ok(ptr::null_mut()),
        }
    }
}

impl CommandContext for D3D11Context<'_> {
    fn pipeline(&self, id: Object) -> Result<PipelineBinding, GraphicError> {
        if id.is_none() {
            return Ok(PipelineBinding::default());
        }
        self.pipelines.get(id).copied()
    }

    fn validate(&self, submission: &Submission) -> Result<(), GraphicError> {
        for id in submission.buffers() {
            self.buffers.get(id)?;
        }
        for id in submission.textures() {
            self.textures.get(id)?;
        }
        self.pipeline(submission.pipeline).map(|_| ())
    }

    fn set_vertex_buffers(&mut self, first: u32, streams: &[Stream]) -> Result<(), GraphicError> {
        let buffers = streams
            .iter()
            .map(|stream| self.buffer(stream.buffer))
            .collect::<Result<Vec<_>, _>>()?;
        let strides: Vec<u32> = streams.iter().map(|stream| stream.stride).collect();
        let offsets: Vec<u32> = streams.iter().map(|stream| stream.offset).collect();
        unsafe {
            self.context.IASetVertexBuffers(
                first,
                streams.len() as u32,
                buffers.as_ptr(),
                strides.as_ptr(),
                offsets.as_ptr(),
            )
        };
        Ok(())
    }

    fn set_index_buffer(&mut self, stream: &Stream) -> Result<(), GraphicError> {
        let buffer = self.buffer(stream.buffer)?;
        let format = stream
            .index_format()
            .map_or(DXGI_FORMAT_UNKNOWN, IntoD3D11::into_d3d11);
        unsafe { self.context.IASetIndexBuffer(buffer, format, stream.offset) };
        Ok(())
    }

    fn set_scissor(&mut self, rect: &Rect) -> Result<(), GraphicError> {
        let rect = RECT {
            left: rect.x,
            top: rect.y,
            right: rect.right(),
            bottom: rect.bottom(),
        };
        unsafe { self.context.RSSetScissorRects(1, &rect) };
        Ok(())
    }

    fn set_vertex_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError> {
        let shader = Self::lookup(shader, "vertex shader", |key| self.states.vertex_shader(key))?;
        unsafe { self.context.VSSetShader(shader, ptr::null(), 0) };
        Ok(())
    }

    fn set_pixel_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError> {
        let shader = Self::lookup(shader, "pixel shader", |key| self.states.pixel_shader(key))?;
        unsafe { self.context.PSSetShader(shader, ptr::null(), 0) };
        Ok(())
    }

    fn set_geometry_shader(&mut self, shader: Option<StateKey>) -> Result<(), GraphicError> {
        let shader = Self::lookup(shader, "geometry shader", |key| self.states.geometry_shader(key))?;
        unsafe { self.context.GSSetShader(shader, ptr::null(), 0) };
        Ok(())
    }

    fn set_blend_state(&mut self, state: Option<StateKey>) -> Result<(), GraphicError> {
        let state = Self::lookup(state, "blend state", |key| self.states.blend(key))?;
        unsafe { self.context.OMSetBlendState(state, &[1.0; 4], u32::MAX) };
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: Option<StateKey>,
        reference: u32,
    ) -> Result<(), GraphicError> {
        let state = Self::lookup(state, "depth-stencil state", |key| self.states.depth_stencil(key))?;
        unsafe { self.context.OMSetDepthStencilState(state, reference) };
        Ok(())
    }

    fn set_rasterizer_state(&mut self, state: Option<StateKey>) -> Result<(), GraphicError> {
        let state = Self::lookup(state, "rasterizer state", |key| self.states.rasterizer(key))?;
        unsafe { self.context.RSSetState(state) };
        Ok(())
    }

    fn set_input_layout(&mut self, layout: Option<StateKey>) -> Result<(), GraphicError> {
        let layout = Self::lookup(layout, "input layout", |key| self.states.input_layout(key))?;
        unsafe { self.context.IASetInputLayout(layout) };
        Ok(())
    }

    fn set_primitive_topology(
        &mut self,
        topology: Option<PrimitiveTopology>,
    ) -> Result<(), GraphicError> {
        let topology = topology.map_or(D3D_PRIMITIVE_TOPOLOGY_UNDEFINED, IntoD3D11::into_d3d11);
        unsafe { self.context.IASetPrimitiveTopology(topology) };
        Ok(())
    }

    fn set_samplers(
        &mut self,
        stage: ShaderStage,
        first: u32,
        samplers: &[Option<SamplerDescriptor>],
    ) -> Result<(), GraphicError> {
        let mut raw = Vec::with_capacity(samplers.len());
        for sampler in samplers {
            raw.push(match sampler {
                Some(descriptor) => self.states.sampler(&mut *self.factory, descriptor)?.as_ptr(),
                None => ptr::null_mut(),
            });
        }
        let count = raw.len() as u32;
        unsafe {
            match stage {
                ShaderStage::Vertex => self.context.VSSetSamplers(first, count, raw.as_ptr()),
                ShaderStage::Pixel => self.context.PSSetSamplers(first, count, raw.as_ptr()),
            }
        }
        Ok(())
    }

    fn set_textures(
        &mut self,
        stage: ShaderStage,
        first: u32,
        textures: &[Object],
    ) -> Result<(), GraphicError> {
        let mut views = Vec::with_capacity(textures.len());
        for &id in textures {
            let view = match self.textures.binding(id)? {
                Some(texture) => match &texture.view {
                    Some(view) => view.as_ptr(),
                    None => {
                        return Err(GraphicError::InvalidHandle {
                            kind: ResourceKind::Texture,
                            id,
                        })
                    }
                },
                None => ptr::null_mut(),
            };
            views.push(view);
        }
        let count = views.len() as u32;
        unsafe {
            match stage {
                ShaderStage::Vertex => self.context.VSSetShaderResources(first, count, views.as_ptr()),
                ShaderStage::Pixel => self.context.PSSetShaderResources(first, count, views.as_ptr()),
            }
        }
        Ok(())
    }

    fn set_uniforms(
        &mut self,
        stage: ShaderStage,
        first: u32,
        ranges: &[ConstantRange],
    ) -> Result<(), GraphicError> {
        let buffers = ranges
            .iter()
            .map(|range| self.buffer(range.buffer))
            .collect::<Result<Vec<_>, _>>()?;
        let firsts: Vec<u32> = ranges.iter().map(|range| range.first).collect();
        // Windows are counted in blocks of 16 constants.
        let counts: Vec<u32> = ranges
            .iter()
            .map(|range| align_up(range.count, 16).max(16))
            .collect();
        let count = ranges.len() as u32;
        unsafe {
            match stage {
                ShaderStage::Vertex => self.context.VSSetConstantBuffers1(
                    first,
                    count,
                    buffers.as_ptr(),
                    firsts.as_ptr(),
                    counts.as_ptr(),
                ),
                ShaderStage::Pixel => self.context.PSSetConstantBuffers1(
                    first,
                    count,
                    buffers.as_ptr(),
                    firsts.as_ptr(),
                    counts.as_ptr(),
                ),
            }
        }
        Ok(())
    }

    fn draw(&mut self, count: u32, first_vertex: u32) -> Result<(), GraphicError> {
        unsafe { self.context.Draw(count, first_vertex) };
        Ok(())
    }

    fn draw_instanced(
        &mut self,
        count: u32,
        instances: u32,
        first_vertex: u32,
    ) -> Result<(), GraphicError> {
        unsafe { self.context.DrawInstanced(count, instances, first_vertex, 0) };
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        count: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> Result<(), GraphicError> {
        unsafe { self.context.DrawIndexed(count, first_index, base_vertex) };
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        count: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> Result<(), GraphicError> {
        unsafe {
            self.context
                .DrawIndexedInstanced(count, instances, first_index, base_vertex, 0)
        };
        Ok(())
    }
}
