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

use ember_core::graphic::{
    AddressMode, BlendFactor, BlendOperation, BorderColor, ColorWrites, CompareFunction, CullMode,
    FillMode, Filter, IndexFormat, PrimitiveTopology, SamplerDescriptor, StencilOperation,
    TextureFormat, VertexFormat,
};
use winapi::shared::dxgiformat::*;
use winapi::um::d3d11::*;
use winapi::um::d3dcommon::*;

/// A local extension trait converting engine types into Direct3D 11 values.
/// Most D3D11 enums are plain integer aliases, so the target type is named
/// explicitly at the call site: `IntoD3D11::<D3D11_BLEND>::into_d3d11(x)`
/// or through a typed binding.
pub trait IntoD3D11<T> {
    /// Converts self into the Direct3D 11 value.
    fn into_d3d11(self) -> T;
}

// --- Formats ---

impl IntoD3D11<DXGI_FORMAT> for TextureFormat {
    fn into_d3d11(self) -> DXGI_FORMAT {
        match self {
            TextureFormat::R8Unorm => DXGI_FORMAT_R8_UNORM,
            TextureFormat::Rg8Unorm => DXGI_FORMAT_R8G8_UNORM,
            TextureFormat::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
            TextureFormat::Rgba8UnormSrgb => DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
            TextureFormat::Bgra8Unorm => DXGI_FORMAT_B8G8R8A8_UNORM,
            TextureFormat::Bgra8UnormSrgb => DXGI_FORMAT_B8G8R8A8_UNORM_SRGB,
            TextureFormat::R16Float => DXGI_FORMAT_R16_FLOAT,
            TextureFormat::Rgba16Float => DXGI_FORMAT_R16G16B16A16_FLOAT,
            TextureFormat::R32Float => DXGI_FORMAT_R32_FLOAT,
            TextureFormat::Rgba32Float => DXGI_FORMAT_R32G32B32A32_FLOAT,
            TextureFormat::Depth16Unorm => DXGI_FORMAT_D16_UNORM,
            TextureFormat::Depth24UnormStencil8 => DXGI_FORMAT_D24_UNORM_S8_UINT,
            TextureFormat::Depth32Float => DXGI_FORMAT_D32_FLOAT,
        }
    }
}

/// Storage format of a texture resource. Sampled depth textures need a
/// typeless resource so both a depth view and a shader view can be made.
pub fn resource_format(format: TextureFormat, sampled: bool) -> DXGI_FORMAT {
    match (format, sampled) {
        (TextureFormat::Depth16Unorm, true) => DXGI_FORMAT_R16_TYPELESS,
        (TextureFormat::Depth24UnormStencil8, true) => DXGI_FORMAT_R24G8_TYPELESS,
        (TextureFormat::Depth32Float, true) => DXGI_FORMAT_R32_TYPELESS,
        (format, _) => format.into_d3d11(),
    }
}

/// Format of the shader resource view over a texture.
pub fn shader_view_format(format: TextureFormat) -> DXGI_FORMAT {
    match format {
        TextureFormat::Depth16Unorm => DXGI_FORMAT_R16_UNORM,
        TextureFormat::Depth24UnormStencil8 => DXGI_FORMAT_R24_UNORM_X8_TYPELESS,
        TextureFormat::Depth32Float => DXGI_FORMAT_R32_FLOAT,
        format => format.into_d3d11(),
    }
}

impl IntoD3D11<DXGI_FORMAT> for VertexFormat {
    fn into_d3d11(self) -> DXGI_FORMAT {
        match self {
            VertexFormat::Float32 => DXGI_FORMAT_R32_FLOAT,
            VertexFormat::Float32x2 => DXGI_FORMAT_R32G32_FLOAT,
            VertexFormat::Float32x3 => DXGI_FORMAT_R32G32B32_FLOAT,
            VertexFormat::Float32x4 => DXGI_FORMAT_R32G32B32A32_FLOAT,
            VertexFormat::Uint32 => DXGI_FORMAT_R32_UINT,
            VertexFormat::Uint8x4 => DXGI_FORMAT_R8G8B8A8_UINT,
            VertexFormat::Unorm8x4 => DXGI_FORMAT_R8G8B8A8_UNORM,
            VertexFormat::Float16x2 => DXGI_FORMAT_R16G16_FLOAT,
            VertexFormat::Float16x4 => DXGI_FORMAT_R16G16B16A16_FLOAT,
        }
    }
}

impl IntoD3D11<DXGI_FORMAT> for IndexFormat {
    fn into_d3d11(self) -> DXGI_FORMAT {
        match self {
            IndexFormat::Uint8 => DXGI_FORMAT_R8_UINT,
            IndexFormat::Uint16 => DXGI_FORMAT_R16_UINT,
            IndexFormat::Uint32 => DXGI_FORMAT_R32_UINT,
        }
    }
}

// --- Fixed-function state ---

impl IntoD3D11<D3D11_COMPARISON_FUNC> for CompareFunction {
    fn into_d3d11(self) -> D3D11_COMPARISON_FUNC {
        match self {
            CompareFunction::Never => D3D11_COMPARISON_NEVER,
            CompareFunction::Less => D3D11_COMPARISON_LESS,
            CompareFunction::Equal => D3D11_COMPARISON_EQUAL,
            CompareFunction::LessEqual => D3D11_COMPARISON_LESS_EQUAL,
            CompareFunction::Greater => D3D11_COMPARISON_GREATER,
            CompareFunction::NotEqual => D3D11_COMPARISON_NOT_EQUAL,
            CompareFunction::GreaterEqual => D3D11_COMPARISON_GREATER_EQUAL,
            CompareFunction::Always => D3D11_COMPARISON_ALWAYS,
        }
    }
}

impl IntoD3D11<D3D11_BLEND> for BlendFactor {
    fn into_d3d11(self) -> D3D11_BLEND {
        match self {
            BlendFactor::Zero => D3D11_BLEND_ZERO,
            BlendFactor::One => D3D11_BLEND_ONE,
            BlendFactor::SrcColor => D3D11_BLEND_SRC_COLOR,
            BlendFactor::OneMinusSrcColor => D3D11_BLEND_INV_SRC_COLOR,
            BlendFactor::SrcAlpha => D3D11_BLEND_SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => D3D11_BLEND_INV_SRC_ALPHA,
            BlendFactor::DstColor => D3D11_BLEND_DEST_COLOR,
            BlendFactor::OneMinusDstColor => D3D11_BLEND_INV_DEST_COLOR,
            BlendFactor::DstAlpha => D3D11_BLEND_DEST_ALPHA,
            BlendFactor::OneMinusDstAlpha => D3D11_BLEND_INV_DEST_ALPHA,
            BlendFactor::SrcAlphaSaturated => D3D11_BLEND_SRC_ALPHA_SAT,
        }
    }
}

impl IntoD3D11<D3D11_BLEND_OP> for BlendOperation {
    fn into_d3d11(self) -> D3D11_BLEND_OP {
        match self {
            BlendOperation::Add => D3D11_BLEND_OP_ADD,
            BlendOperation::Subtract => D3D11_BLEND_OP_SUBTRACT,
            BlendOperation::ReverseSubtract => D3D11_BLEND_OP_REV_SUBTRACT,
            BlendOperation::Min => D3D11_BLEND_OP_MIN,
            BlendOperation::Max => D3D11_BLEND_OP_MAX,
        }
    }
}

impl IntoD3D11<u8> for ColorWrites {
    fn into_d3d11(self) -> u8 {
        // Same bit layout as D3D11_COLOR_WRITE_ENABLE.
        self.bits()
    }
}

impl IntoD3D11<D3D11_STENCIL_OP> for StencilOperation {
    fn into_d3d11(self) -> D3D11_STENCIL_OP {
        match self {
            StencilOperation::Keep => D3D11_STENCIL_OP_KEEP,
            StencilOperation::Zero => D3D11_STENCIL_OP_ZERO,
            StencilOperation::Replace => D3D11_STENCIL_OP_REPLACE,
            StencilOperation::IncrementClamp => D3D11_STENCIL_OP_INCR_SAT,
            StencilOperation::DecrementClamp => D3D11_STENCIL_OP_DECR_SAT,
            StencilOperation::Invert => D3D11_STENCIL_OP_INVERT,
            StencilOperation::IncrementWrap => D3D11_STENCIL_OP_INCR,
            StencilOperation::DecrementWrap => D3D11_STENCIL_OP_DECR,
        }
    }
}

impl IntoD3D11<D3D11_FILL_MODE> for FillMode {
    fn into_d3d11(self) -> D3D11_FILL_MODE {
        match self {
            FillMode::Solid => D3D11_FILL_SOLID,
            FillMode::Wireframe => D3D11_FILL_WIREFRAME,
        }
    }
}

impl IntoD3D11<D3D11_CULL_MODE> for CullMode {
    fn into_d3d11(self) -> D3D11_CULL_MODE {
        match self {
            CullMode::None => D3D11_CULL_NONE,
            CullMode::Front => D3D11_CULL_FRONT,
            CullMode::Back => D3D11_CULL_BACK,
        }
    }
}

impl IntoD3D11<D3D_PRIMITIVE_TOPOLOGY> for PrimitiveTopology {
    fn into_d3d11(self) -> D3D_PRIMITIVE_TOPOLOGY {
        match self {
            PrimitiveTopology::PointList => D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
            PrimitiveTopology::LineList => D3D_PRIMITIVE_TOPOLOGY_LINELIST,
            PrimitiveTopology::LineStrip => D3D_PRIMITIVE_TOPOLOGY_LINESTRIP,
            PrimitiveTopology::TriangleList => D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
            PrimitiveTopology::TriangleStrip => D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
        }
    }
}

// --- Samplers ---

impl IntoD3D11<D3D11_TEXTURE_ADDRESS_MODE> for AddressMode {
    fn into_d3d11(self) -> D3D11_TEXTURE_ADDRESS_MODE {
        match self {
            AddressMode::Wrap => D3D11_TEXTURE_ADDRESS_WRAP,
            AddressMode::Mirror => D3D11_TEXTURE_ADDRESS_MIRROR,
            AddressMode::Clamp => D3D11_TEXTURE_ADDRESS_CLAMP,
            AddressMode::Border => D3D11_TEXTURE_ADDRESS_BORDER,
        }
    }
}

impl IntoD3D11<[f32; 4]> for BorderColor {
    fn into_d3d11(self) -> [f32; 4] {
        match self {
            BorderColor::TransparentBlack => [0.0, 0.0, 0.0, 0.0],
            BorderColor::OpaqueBlack => [0.0, 0.0, 0.0, 1.0],
            BorderColor::OpaqueWhite => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Encodes the filter bits the way `D3D11_ENCODE_BASIC_FILTER` does.
pub fn sampler_filter(descriptor: &SamplerDescriptor) -> D3D11_FILTER {
    let bit = |filter: Filter| match filter {
        Filter::Point => 0,
        Filter::Linear => 1,
    };
    let reduction = if descriptor.compare.is_some() { 0x80 } else { 0 };
    if descriptor.is_anisotropic() {
        return D3D11_FILTER_ANISOTROPIC | reduction;
    }
    (bit(descriptor.min_filter) << 4)
        | (bit(descriptor.mag_filter) << 2)
        | bit(descriptor.mip_filter)
        | reduction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_encoding_matches_named_filters() {
        assert_eq!(
            sampler_filter(&SamplerDescriptor::POINT_CLAMP),
            D3D11_FILTER_MIN_MAG_MIP_POINT
        );
        assert_eq!(
            sampler_filter(&SamplerDescriptor::LINEAR_WRAP),
            D3D11_FILTER_MIN_MAG_MIP_LINEAR
        );

        let shadow = SamplerDescriptor {
            compare: Some(CompareFunction::LessEqual),
            ..SamplerDescriptor::LINEAR_WRAP
        };
        assert_eq!(
            sampler_filter(&shadow),
            D3D11_FILTER_COMPARISON_MIN_MAG_MIP_LINEAR
        );
    }

    #[test]
    fn test_sampled_depth_uses_typeless_storage() {
        assert_eq!(
            resource_format(TextureFormat::Depth24UnormStencil8, true),
            DXGI_FORMAT_R24G8_TYPELESS
        );
        assert_eq!(
            resource_format(TextureFormat::Depth24UnormStencil8, false),
            DXGI_FORMAT_D24_UNORM_S8_UINT
        );
    }
}
