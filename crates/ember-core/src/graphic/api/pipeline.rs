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

//! Pipeline descriptors: shaders, vertex layout and fixed-function state.
//!
//! Every sub-state is a plain value type so backends can intern it; two
//! pipelines that share a blend state end up sharing one backend object.

use super::CompareFunction;
use bitflags::bitflags;

/// The primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Independent points.
    PointList,
    /// Independent line segments.
    LineList,
    /// Connected line segments.
    LineStrip,
    /// Independent triangles.
    #[default]
    TriangleList,
    /// Connected triangles.
    TriangleStrip,
}

/// Formats a vertex attribute can be fetched as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// One 32-bit unsigned integer.
    Uint32,
    /// Four 8-bit unsigned integers.
    Uint8x4,
    /// Four 8-bit normalized values.
    Unorm8x4,
    /// Two 16-bit floats.
    Float16x2,
    /// Four 16-bit floats.
    Float16x4,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub fn size(self) -> u32 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 => 4,
            VertexFormat::Uint8x4 | VertexFormat::Unorm8x4 | VertexFormat::Float16x2 => 4,
            VertexFormat::Float32x2 | VertexFormat::Float16x4 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// One element of the vertex input layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader semantic name, e.g. `POSITION`.
    pub semantic: String,
    /// Semantic index.
    pub index: u32,
    /// Fetch format.
    pub format: VertexFormat,
    /// Vertex stream the attribute is read from.
    pub stream: u32,
    /// Byte offset inside a stream element.
    pub offset: u32,
    /// Advance once per instance instead of once per vertex.
    pub per_instance: bool,
}

/// Blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturated,
}

/// Blend equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// One blend equation: `src * src_factor (op) dst * dst_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Factor applied to the shader output.
    pub src_factor: BlendFactor,
    /// Factor applied to the stored value.
    pub dst_factor: BlendFactor,
    /// How both terms combine.
    pub operation: BlendOperation,
}

impl BlendComponent {
    /// `One * src (+|-) Zero * dst`, which writes the source unchanged.
    pub fn is_replace(&self) -> bool {
        self.src_factor == BlendFactor::One
            && self.dst_factor == BlendFactor::Zero
            && matches!(self.operation, BlendOperation::Add | BlendOperation::Subtract)
    }

    /// `src * 1 + dst * 0`: the shader output replaces the target.
    pub const REPLACE: BlendComponent = BlendComponent {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };

    /// Standard non-premultiplied alpha blending.
    pub const ALPHA: BlendComponent = BlendComponent {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };
}

bitflags! {
    /// Channels a pipeline writes to its color targets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        /// Red.
        const RED = 1 << 0;
        /// Green.
        const GREEN = 1 << 1;
        /// Blue.
        const BLUE = 1 << 2;
        /// Alpha.
        const ALPHA = 1 << 3;
        /// All channels.
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

/// Color blending for every target of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Equation for RGB.
    pub color: BlendComponent,
    /// Equation for alpha.
    pub alpha: BlendComponent,
    /// Written channels.
    pub write_mask: ColorWrites,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            color: BlendComponent::REPLACE,
            alpha: BlendComponent::REPLACE,
            write_mask: ColorWrites::ALL,
        }
    }
}

impl BlendState {
    /// Returns `true` when blending would have no effect, letting backends
    /// disable it outright.
    pub fn is_replace(&self) -> bool {
        self.color.is_replace() && self.alpha.is_replace()
    }
}

/// Depth test and write configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthState {
    /// Enables the depth test.
    pub enabled: bool,
    /// Enables depth writes.
    pub write: bool,
    /// Depth comparison.
    pub compare: CompareFunction,
}

/// Stencil buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Stencil behavior for one triangle facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFace {
    /// Applied when the stencil test fails.
    pub fail: StencilOperation,
    /// Applied when stencil passes and depth fails.
    pub depth_fail: StencilOperation,
    /// Applied when both tests pass.
    pub pass: StencilOperation,
    /// Stencil comparison against the reference value.
    pub compare: CompareFunction,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Keep,
            compare: CompareFunction::Always,
        }
    }
}

/// Stencil test configuration. The reference value is not part of it: it
/// travels with each submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// Enables the stencil test.
    pub enabled: bool,
    /// Mask applied when reading.
    pub read_mask: u8,
    /// Mask applied when writing.
    pub write_mask: u8,
    /// Front-facing behavior.
    pub front: StencilFace,
    /// Back-facing behavior.
    pub back: StencilFace,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            enabled: false,
            read_mask: 0xFF,
            write_mask: 0xFF,
            front: StencilFace::default(),
            back: StencilFace::default(),
        }
    }
}

/// Depth and stencil state, interned together by backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthStencilState {
    /// Depth half.
    pub depth: DepthState,
    /// Stencil half.
    pub stencil: StencilState,
}

/// Polygon fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

/// Faces culled before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Rasterizer state.
///
/// Depth bias is integer-only so the state stays hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    /// Fill mode.
    pub fill: FillMode,
    /// Culling.
    pub cull: CullMode,
    /// Treat counter-clockwise triangles as front facing.
    pub front_counter_clockwise: bool,
    /// Constant depth bias.
    pub depth_bias: i32,
    /// Clip against the near and far planes.
    pub depth_clip: bool,
    /// Honor the submission's scissor rectangle.
    pub scissor: bool,
    /// Enable multisample rasterization.
    pub multisample: bool,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            fill: FillMode::Solid,
            cull: CullMode::Back,
            front_counter_clockwise: false,
            depth_bias: 0,
            depth_clip: true,
            scissor: true,
            multisample: false,
        }
    }
}

/// Everything needed to compile a pipeline.
///
/// Shaders are precompiled backend bytecode. Shader compilation is outside
/// the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PipelineDescriptor {
    /// Vertex shader bytecode.
    pub vertex_shader: Vec<u8>,
    /// Pixel shader bytecode.
    pub pixel_shader: Vec<u8>,
    /// Optional geometry shader bytecode.
    pub geometry_shader: Option<Vec<u8>>,
    /// Vertex input layout.
    pub attributes: Vec<VertexAttribute>,
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
    /// Color blending.
    pub blend: BlendState,
    /// Depth and stencil testing.
    pub depth_stencil: DepthStencilState,
    /// Rasterization.
    pub rasterizer: RasterizerState,
}

/// The key backends intern input layouts under: the attributes plus the
/// vertex shader whose signature they are validated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputLayoutKey {
    /// Vertex input layout.
    pub attributes: Vec<VertexAttribute>,
    /// Vertex shader bytecode.
    pub vertex_shader: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blend_is_replace() {
        assert!(BlendState::default().is_replace());
        let alpha = BlendState {
            color: BlendComponent::ALPHA,
            ..Default::default()
        };
        assert!(!alpha.is_replace());

        let subtract = BlendComponent {
            operation: BlendOperation::Subtract,
            ..BlendComponent::REPLACE
        };
        assert!(BlendState {
            color: subtract,
            alpha: subtract,
            ..Default::default()
        }
        .is_replace());
    }
}
