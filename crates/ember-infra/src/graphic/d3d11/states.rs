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

use super::com::Com;
use super::conversions::{sampler_filter, IntoD3D11};
use super::error::create;
use crate::graphic::states::StateFactory;
use ember_core::graphic::{
    BlendState, DepthStencilState, GraphicError, InputLayoutKey, RasterizerState,
    SamplerDescriptor, StencilFace,
};
use std::ffi::CString;
use std::mem;
use std::ptr;
use winapi::shared::minwindef::BOOL;
use winapi::um::d3d11::*;

/// Creates Direct3D 11 state objects on one device.
#[derive(Debug, Clone)]
pub struct D3D11States {
    device: Com<ID3D11Device>,
}

impl D3D11States {
    pub fn new(device: Com<ID3D11Device>) -> Self {
        Self { device }
    }
}

fn stencil_face(face: &StencilFace) -> D3D11_DEPTH_STENCILOP_DESC {
    D3D11_DEPTH_STENCILOP_DESC {
        StencilFailOp: face.fail.into_d3d11(),
        StencilDepthFailOp: face.depth_fail.into_d3d11(),
        StencilPassOp: face.pass.into_d3d11(),
        StencilFunc: face.compare.into_d3d11(),
    }
}

impl StateFactory for D3D11States {
    type VertexShader = Com<ID3D11VertexShader>;
    type PixelShader = Com<ID3D11PixelShader>;
    type GeometryShader = Com<ID3D11GeometryShader>;
    type Blend = Com<ID3D11BlendState>;
    type DepthStencil = Com<ID3D11DepthStencilState>;
    type Rasterizer = Com<ID3D11RasterizerState>;
    type InputLayout = Com<ID3D11InputLayout>;
    type Sampler = Com<ID3D11SamplerState>;

    fn vertex_shader(&mut self, bytecode: &[u8]) -> Result<Self::VertexShader, GraphicError> {
        create("CreateVertexShader", |out| unsafe {
            self.device
                .CreateVertexShader(bytecode.as_ptr().cast(), bytecode.len(), ptr::null_mut(), out)
        })
    }

    fn pixel_shader(&mut self, bytecode: &[u8]) -> Result<Self::PixelShader, GraphicError> {
        create("CreatePixelShader", |out| unsafe {
            self.device
                .CreatePixelShader(bytecode.as_ptr().cast(), bytecode.len(), ptr::null_mut(), out)
        })
    }

    fn geometry_shader(&mut self, bytecode: &[u8]) -> Result<Self::GeometryShader, GraphicError> {
        create("CreateGeometryShader", |out| unsafe {
            self.device
                .CreateGeometryShader(bytecode.as_ptr().cast(), bytecode.len(), ptr::null_mut(), out)
        })
    }

    fn blend(&mut self, state: &BlendState) -> Result<Self::Blend, GraphicError> {
        let target = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: !state.is_replace() as BOOL,
            SrcBlend: state.color.src_factor.into_d3d11(),
            DestBlend: state.color.dst_factor.into_d3d11(),
            BlendOp: state.color.operation.into_d3d11(),
            SrcBlendAlpha: state.alpha.src_factor.into_d3d11(),
            DestBlendAlpha: state.alpha.dst_factor.into_d3d11(),
            BlendOpAlpha: state.alpha.operation.into_d3d11(),
            RenderTargetWriteMask: state.write_mask.into_d3d11(),
        };
        let desc = D3D11_BLEND_DESC {
            AlphaToCoverageEnable: 0,
            IndependentBlendEnable: 0,
            RenderTarget: [target; 8],
        };
        create("CreateBlendState", |out| unsafe { self.device.CreateBlendState(&desc, out) })
    }

    fn depth_stencil(&mut self, state: &DepthStencilState) -> Result<Self::DepthStencil, GraphicError> {
        let desc = D3D11_DEPTH_STENCIL_DESC {
            DepthEnable: state.depth.enabled as BOOL,
            DepthWriteMask: if state.depth.write {
                D3D11_DEPTH_WRITE_MASK_ALL
            } else {
                D3D11_DEPTH_WRITE_MASK_ZERO
            },
            DepthFunc: state.depth.compare.into_d3d11(),
            StencilEnable: state.stencil.enabled as BOOL,
            StencilReadMask: state.stencil.read_mask,
            StencilWriteMask: state.stencil.write_mask,
            FrontFace: stencil_face(&state.stencil.front),
            BackFace: stencil_face(&state.stencil.back),
        };
        create("CreateDepthStencilState", |out| unsafe {
            self.device.CreateDepthStencilState(&desc, out)
        })
    }

    fn rasterizer(&mut self, state: &RasterizerState) -> Result<Self::Rasterizer, GraphicError> {
        let desc = D3D11_RASTERIZER_DESC {
            FillMode: state.fill.into_d3d11(),
            CullMode: state.cull.into_d3d11(),
            FrontCounterClockwise: state.front_counter_clockwise as BOOL,
            DepthBias: state.depth_bias,
            DepthBiasClamp: 0.0,
            SlopeScaledDepthBias: 0.0,
            DepthClipEnable: state.depth_clip as BOOL,
            ScissorEnable: state.scissor as BOOL,
            MultisampleEnable: state.multisample as BOOL,
            AntialiasedLineEnable: 0,
        };
        create("CreateRasterizerState", |out| unsafe {
            self.device.CreateRasterizerState(&desc, out)
        })
    }

    fn input_layout(&mut self, key: &InputLayoutKey) -> Result<Self::InputLayout, GraphicError> {
        let semantics = key
            .attributes
            .iter()
            .map(|attribute| CString::new(attribute.semantic.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| GraphicError::InvalidDescriptor("semantic contains a NUL byte".into()))?;
        let elements: Vec<D3D11_INPUT_ELEMENT_DESC> = key
            .attributes
            .iter()
            .zip(&semantics)
            .map(|(attribute, semantic)| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: semantic.as_ptr(),
                SemanticIndex: attribute.index,
                Format: attribute.format.into_d3d11(),
                InputSlot: attribute.stream,
                AlignedByteOffset: attribute.offset,
                InputSlotClass: if attribute.per_instance {
                    D3D11_INPUT_PER_INSTANCE_DATA
                } else {
                    D3D11_INPUT_PER_VERTEX_DATA
                },
                InstanceDataStepRate: attribute.per_instance as u32,
            })
            .collect();
        create("CreateInputLayout", |out| unsafe {
            self.device.CreateInputLayout(
                elements.as_ptr(),
                elements.len() as u32,
                key.vertex_shader.as_ptr().cast(),
                key.vertex_shader.len(),
                out,
            )
        })
    }

    fn sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<Self::Sampler, GraphicError> {
        let mut desc: D3D11_SAMPLER_DESC = unsafe { mem::zeroed() };
        desc.Filter = sampler_filter(descriptor);
        desc.AddressU = descriptor.address_u.into_d3d11();
        desc.AddressV = descriptor.address_v.into_d3d11();
        desc.AddressW = descriptor.address_w.into_d3d11();
        desc.MaxAnisotropy = u32::from(descriptor.max_anisotropy.clamp(1, 16));
        desc.ComparisonFunc = descriptor
            .compare
            .map_or(D3D11_COMPARISON_NEVER, IntoD3D11::into_d3d11);
        desc.BorderColor = descriptor.border.into_d3d11();
        desc.MaxLOD = f32::MAX;
        create("CreateSamplerState", |out| unsafe {
            self.device.CreateSamplerState(&desc, out)
        })
    }
}
