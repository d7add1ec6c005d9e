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

//! Texture descriptors, regions and formats.

/// Pixel formats understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// One 8-bit normalized channel.
    R8Unorm,
    /// Two 8-bit normalized channels.
    Rg8Unorm,
    /// Four 8-bit normalized channels.
    #[default]
    Rgba8Unorm,
    /// Four 8-bit normalized channels in sRGB space.
    Rgba8UnormSrgb,
    /// Four 8-bit normalized channels in BGRA order.
    Bgra8Unorm,
    /// Four 8-bit normalized channels in BGRA order, sRGB space.
    Bgra8UnormSrgb,
    /// One 16-bit float channel.
    R16Float,
    /// Four 16-bit float channels.
    Rgba16Float,
    /// One 32-bit float channel.
    R32Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// 16-bit normalized depth.
    Depth16Unorm,
    /// 24-bit depth with 8-bit stencil.
    Depth24UnormStencil8,
    /// 32-bit float depth.
    Depth32Float,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rg8Unorm | TextureFormat::R16Float | TextureFormat::Depth16Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb
            | TextureFormat::R32Float
            | TextureFormat::Depth24UnormStencil8
            | TextureFormat::Depth32Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }

    /// Returns `true` for depth and depth-stencil formats.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth24UnormStencil8
                | TextureFormat::Depth32Float
        )
    }

    /// Returns `true` if the format carries a stencil channel.
    pub fn has_stencil(self) -> bool {
        self == TextureFormat::Depth24UnormStencil8
    }
}

/// How a texture may be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureLayout {
    /// Sampled by shaders only.
    #[default]
    Source,
    /// Rendered to only.
    Destination,
    /// Both rendered to and sampled.
    Dual,
}

impl TextureLayout {
    /// Returns `true` if shaders may sample the texture.
    pub fn is_sampled(self) -> bool {
        matches!(self, TextureLayout::Source | TextureLayout::Dual)
    }

    /// Returns `true` if passes may render to the texture.
    pub fn is_target(self) -> bool {
        matches!(self, TextureLayout::Destination | TextureLayout::Dual)
    }
}

/// Describes a 2D texture (or 2D array) to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor<'a> {
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed bindings.
    pub layout: TextureLayout,
    /// Width of level zero.
    pub width: u32,
    /// Height of level zero.
    pub height: u32,
    /// Array layers.
    pub layers: u32,
    /// Mip levels.
    pub levels: u32,
    /// Samples per texel; above one the texture can only be a render target.
    pub samples: u32,
    /// Optional tightly packed contents for level zero of every layer.
    pub data: Option<&'a [u8]>,
}

impl Default for TextureDescriptor<'_> {
    fn default() -> Self {
        Self {
            format: TextureFormat::default(),
            layout: TextureLayout::default(),
            width: 1,
            height: 1,
            layers: 1,
            levels: 1,
            samples: 1,
            data: None,
        }
    }
}

impl TextureDescriptor<'_> {
    /// Strips the initial data, keeping the shape.
    pub fn info(&self) -> TextureInfo {
        TextureInfo {
            format: self.format,
            layout: self.layout,
            width: self.width,
            height: self.height,
            layers: self.layers,
            levels: self.levels,
            samples: self.samples,
        }
    }
}

/// The shape of an existing texture, as returned by `query_texture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureInfo {
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed bindings.
    pub layout: TextureLayout,
    /// Width of level zero.
    pub width: u32,
    /// Height of level zero.
    pub height: u32,
    /// Array layers.
    pub layers: u32,
    /// Mip levels.
    pub levels: u32,
    /// Samples per texel.
    pub samples: u32,
}

impl TextureInfo {
    /// Width and height of mip `level`.
    pub fn level_extent(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    /// Byte size of one layer of mip `level`, all samples included.
    pub fn level_size(&self, level: u32) -> usize {
        let (width, height) = self.level_extent(level);
        width as usize
            * height as usize
            * self.format.bytes_per_pixel() as usize
            * self.samples.max(1) as usize
    }

    /// Validates that `region` lies inside the texture.
    pub fn contains(&self, region: &TextureRegion) -> bool {
        if region.origin.level >= self.levels || region.origin.layer >= self.layers {
            return false;
        }
        let (width, height) = self.level_extent(region.origin.level);
        region.origin.x.checked_add(region.width).is_some_and(|x| x <= width)
            && region.origin.y.checked_add(region.height).is_some_and(|y| y <= height)
    }
}

/// A texel position inside one mip level of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureOrigin {
    /// Column of the first texel.
    pub x: u32,
    /// Row of the first texel.
    pub y: u32,
    /// Array layer.
    pub layer: u32,
    /// Mip level.
    pub level: u32,
}

/// A rectangle of texels inside one mip level of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureRegion {
    /// Top-left corner, layer and level.
    pub origin: TextureOrigin,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl TextureRegion {
    /// The whole of level zero, layer zero, for a texture of the given size.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            origin: TextureOrigin::default(),
            width,
            height,
        }
    }

    /// Tightly packed size of the region in bytes.
    pub fn byte_size(&self, format: TextureFormat) -> usize {
        self.width as usize * self.height as usize * format.bytes_per_pixel() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_containment_respects_mip_extent() {
        let info = TextureDescriptor {
            width: 64,
            height: 32,
            levels: 3,
            ..Default::default()
        }
        .info();

        assert!(info.contains(&TextureRegion::full(64, 32)));
        let level_two = TextureRegion {
            origin: TextureOrigin {
                level: 2,
                ..Default::default()
            },
            width: 16,
            height: 8,
        };
        assert!(info.contains(&level_two));
        assert!(!info.contains(&TextureRegion { width: 17, ..level_two }));
        assert!(!info.contains(&TextureRegion {
            origin: TextureOrigin {
                level: 3,
                ..Default::default()
            },
            width: 1,
            height: 1,
        }));
    }

    #[test]
    fn test_depth_formats_are_classified() {
        assert!(TextureFormat::Depth24UnormStencil8.is_depth());
        assert!(TextureFormat::Depth24UnormStencil8.has_stencil());
        assert!(!TextureFormat::Depth32Float.has_stencil());
        assert!(!TextureFormat::Bgra8Unorm.is_depth());
    }
}
