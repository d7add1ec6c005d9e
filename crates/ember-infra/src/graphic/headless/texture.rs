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

//! CPU-side texture storage.
//!
//! Subresources are stored level-fastest (`layer * levels + level`), rows
//! tightly packed. Multisampled subresources keep the samples of one pixel
//! next to each other.

use ember_core::graphic::{
    GraphicError, TextureDescriptor, TextureFormat, TextureInfo, TextureOrigin, TextureRegion,
};
use glam::Vec4;
use half::f16;

#[derive(Debug, Clone)]
pub struct CpuTexture {
    info: TextureInfo,
    subresources: Vec<Vec<u8>>,
}

impl CpuTexture {
    /// Allocates a zeroed texture. `info.samples` must already be a supported
    /// count.
    pub fn new(info: TextureInfo) -> Self {
        let subresources = (0..info.layers)
            .flat_map(|_| (0..info.levels).map(|level| vec![0; info.level_size(level)]))
            .collect();
        Self { info, subresources }
    }

    /// Validates `descriptor` and allocates the texture, filling it from the
    /// descriptor's initial data if any.
    pub fn from_descriptor(
        descriptor: &TextureDescriptor<'_>,
        samples: u32,
    ) -> Result<Self, GraphicError> {
        let mut info = descriptor.info();
        info.samples = samples;
        validate(&info)?;

        let mut texture = Self::new(info);
        if let Some(data) = descriptor.data {
            if info.samples > 1 {
                return Err(GraphicError::InvalidDescriptor(
                    "multisampled textures cannot carry initial data".into(),
                ));
            }
            let expected: usize = texture.subresources.iter().map(Vec::len).sum();
            if data.len() != expected {
                return Err(GraphicError::InvalidDescriptor(format!(
                    "initial data is {} bytes, texture needs {expected}",
                    data.len()
                )));
            }
            let mut rest = data;
            for subresource in &mut texture.subresources {
                let (head, tail) = rest.split_at(subresource.len());
                subresource.copy_from_slice(head);
                rest = tail;
            }
        }
        Ok(texture)
    }

    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn index(&self, level: u32, layer: u32) -> usize {
        (layer * self.info.levels + level) as usize
    }

    /// Raw bytes of one subresource.
    pub fn subresource(&self, level: u32, layer: u32) -> &[u8] {
        &self.subresources[self.index(level, layer)]
    }

    fn check(&self, region: &TextureRegion) -> Result<(), GraphicError> {
        if self.info.contains(region) {
            Ok(())
        } else {
            Err(GraphicError::InvalidDescriptor(format!(
                "region {region:?} is outside the texture"
            )))
        }
    }

    /// Row pitch of `level`, samples included.
    fn pitch(&self, level: u32) -> usize {
        let (width, _) = self.info.level_extent(level);
        width as usize * self.texel_size()
    }

    fn texel_size(&self) -> usize {
        self.info.format.bytes_per_pixel() as usize * self.info.samples.max(1) as usize
    }

    /// Writes tightly packed pixels into `region`.
    pub fn write(&mut self, region: &TextureRegion, data: &[u8]) -> Result<(), GraphicError> {
        self.check(region)?;
        if self.info.samples > 1 {
            return Err(GraphicError::Unsupported("uploading to a multisampled texture"));
        }
        let row = region.width as usize * self.texel_size();
        if data.len() != row * region.height as usize {
            return Err(GraphicError::InvalidDescriptor(format!(
                "expected {} bytes, got {}",
                row * region.height as usize,
                data.len()
            )));
        }
        let pitch = self.pitch(region.origin.level);
        let texel = self.texel_size();
        let index = self.index(region.origin.level, region.origin.layer);
        let target = &mut self.subresources[index];
        for (y, source) in data.chunks_exact(row.max(1)).enumerate() {
            let start = (region.origin.y as usize + y) * pitch + region.origin.x as usize * texel;
            target[start..start + row].copy_from_slice(source);
        }
        Ok(())
    }

    /// Reads `region` as tightly packed pixels. Multisampled textures yield
    /// their first sample.
    pub fn read(&self, region: &TextureRegion) -> Result<Vec<u8>, GraphicError> {
        self.check(region)?;
        let pixel = self.info.format.bytes_per_pixel() as usize;
        let texel = self.texel_size();
        let pitch = self.pitch(region.origin.level);
        let source = self.subresource(region.origin.level, region.origin.layer);

        let mut pixels = Vec::with_capacity(region.byte_size(self.info.format));
        for y in 0..region.height as usize {
            let row = (region.origin.y as usize + y) * pitch;
            for x in 0..region.width as usize {
                let start = row + (region.origin.x as usize + x) * texel;
                pixels.extend_from_slice(&source[start..start + pixel]);
            }
        }
        Ok(pixels)
    }

    /// Copies `region` of `source` to `origin` in this texture.
    pub fn copy_from(
        &mut self,
        source: &CpuTexture,
        region: &TextureRegion,
        origin: TextureOrigin,
    ) -> Result<(), GraphicError> {
        if source.info.format.bytes_per_pixel() != self.info.format.bytes_per_pixel() {
            return Err(GraphicError::InvalidDescriptor(format!(
                "cannot copy {:?} into {:?}",
                source.info.format, self.info.format
            )));
        }
        if source.info.samples > 1 || self.info.samples > 1 {
            return Err(GraphicError::Unsupported("copying multisampled textures"));
        }
        let pixels = source.read(region)?;
        let target = TextureRegion {
            origin,
            width: region.width,
            height: region.height,
        };
        self.write(&target, &pixels)
    }

    /// Sets every sample of one subresource to `value`.
    pub fn fill(&mut self, level: u32, layer: u32, value: &[u8]) {
        let index = self.index(level, layer);
        for texel in self.subresources[index].chunks_exact_mut(value.len().max(1)) {
            texel.copy_from_slice(value);
        }
    }

    /// Clears the depth and/or stencil part of one subresource, keeping the
    /// part that is not cleared.
    pub fn fill_depth_stencil(&mut self, level: u32, layer: u32, depth: Option<f32>, stencil: Option<u8>) {
        let format = self.info.format;
        let index = self.index(level, layer);
        let texels = self.subresources[index].chunks_exact_mut(format.bytes_per_pixel() as usize);
        for texel in texels {
            match format {
                TextureFormat::Depth16Unorm => {
                    if let Some(depth) = depth {
                        texel.copy_from_slice(&unorm16(depth).to_le_bytes());
                    }
                }
                TextureFormat::Depth32Float => {
                    if let Some(depth) = depth {
                        texel.copy_from_slice(&depth.to_le_bytes());
                    }
                }
                TextureFormat::Depth24UnormStencil8 => {
                    let mut bits = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
                    if let Some(depth) = depth {
                        bits = (bits & 0xFF00_0000) | unorm24(depth);
                    }
                    if let Some(stencil) = stencil {
                        bits = (bits & 0x00FF_FFFF) | (u32::from(stencil) << 24);
                    }
                    texel.copy_from_slice(&bits.to_le_bytes());
                }
                _ => {}
            }
        }
    }

    /// Writes the first sample of every pixel of this multisampled surface
    /// into one subresource of `target`.
    pub fn resolve_into(&self, target: &mut CpuTexture, level: u32, layer: u32) -> Result<(), GraphicError> {
        let (width, height) = target.info.level_extent(level);
        if (self.info.width, self.info.height) != (width, height)
            || self.info.format.bytes_per_pixel() != target.info.format.bytes_per_pixel()
        {
            return Err(GraphicError::InvalidDescriptor(
                "resolve source and target do not match".into(),
            ));
        }
        let pixels = self.read(&TextureRegion::full(width, height))?;
        target.write(
            &TextureRegion {
                origin: TextureOrigin {
                    x: 0,
                    y: 0,
                    layer,
                    level,
                },
                width,
                height,
            },
            &pixels,
        )
    }
}

fn validate(info: &TextureInfo) -> Result<(), GraphicError> {
    if info.width == 0 || info.height == 0 || info.layers == 0 || info.levels == 0 {
        return Err(GraphicError::InvalidDescriptor(format!(
            "texture extent {}x{} with {} layers and {} levels",
            info.width, info.height, info.layers, info.levels
        )));
    }
    let max_levels = 32 - info.width.max(info.height).leading_zeros();
    if info.levels > max_levels {
        return Err(GraphicError::InvalidDescriptor(format!(
            "{} levels requested, at most {max_levels} fit",
            info.levels
        )));
    }
    if info.samples > 1 && info.levels > 1 {
        return Err(GraphicError::InvalidDescriptor(
            "multisampled textures have a single level".into(),
        ));
    }
    Ok(())
}

/// Encodes a clear color in `format`. Returns `None` for depth formats.
pub fn encode_color(format: TextureFormat, color: Vec4) -> Option<Vec<u8>> {
    let [r, g, b, a] = color.to_array();
    let bytes = match format {
        TextureFormat::R8Unorm => vec![unorm8(r)],
        TextureFormat::Rg8Unorm => vec![unorm8(r), unorm8(g)],
        TextureFormat::Rgba8Unorm => vec![unorm8(r), unorm8(g), unorm8(b), unorm8(a)],
        TextureFormat::Rgba8UnormSrgb => vec![
            unorm8(to_srgb(r)),
            unorm8(to_srgb(g)),
            unorm8(to_srgb(b)),
            unorm8(a),
        ],
        TextureFormat::Bgra8Unorm => vec![unorm8(b), unorm8(g), unorm8(r), unorm8(a)],
        TextureFormat::Bgra8UnormSrgb => vec![
            unorm8(to_srgb(b)),
            unorm8(to_srgb(g)),
            unorm8(to_srgb(r)),
            unorm8(a),
        ],
        TextureFormat::R16Float => f16::from_f32(r).to_le_bytes().to_vec(),
        TextureFormat::Rgba16Float => [r, g, b, a]
            .iter()
            .flat_map(|channel| f16::from_f32(*channel).to_le_bytes())
            .collect(),
        TextureFormat::R32Float => r.to_le_bytes().to_vec(),
        TextureFormat::Rgba32Float => bytemuck::cast_slice(&[r, g, b, a]).to_vec(),
        TextureFormat::Depth16Unorm
        | TextureFormat::Depth24UnormStencil8
        | TextureFormat::Depth32Float => return None,
    };
    Some(bytes)
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn unorm16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * 65535.0).round() as u16
}

fn unorm24(value: f32) -> u32 {
    (value.clamp(0.0, 1.0) * 16_777_215.0).round() as u32
}

fn to_srgb(linear: f32) -> f32 {
    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::graphic::TextureLayout;

    fn info(format: TextureFormat, width: u32, height: u32, samples: u32) -> TextureInfo {
        TextureInfo {
            format,
            layout: TextureLayout::Dual,
            width,
            height,
            layers: 1,
            levels: 1,
            samples,
        }
    }

    #[test]
    fn test_half_float_encoding() {
        assert_eq!(
            encode_color(TextureFormat::R16Float, Vec4::new(1.0, 0.0, 0.0, 0.0)),
            Some(0x3C00u16.to_le_bytes().to_vec())
        );
        // Out of range saturates to infinity.
        assert_eq!(
            encode_color(TextureFormat::R16Float, Vec4::new(1.0e6, 0.0, 0.0, 0.0)),
            Some(0x7C00u16.to_le_bytes().to_vec())
        );
        let bytes = encode_color(TextureFormat::Rgba16Float, Vec4::new(0.5, -2.0, 0.0, 1.0));
        let expected: Vec<u8> = [0x3800u16, 0xC000, 0x0000, 0x3C00]
            .iter()
            .flat_map(|bits| bits.to_le_bytes())
            .collect();
        assert_eq!(bytes, Some(expected));
    }

    #[test]
    fn test_color_encoding_follows_channel_order() {
        let color = Vec4::new(1.0, 0.0, 0.5, 1.0);
        assert_eq!(
            encode_color(TextureFormat::Rgba8Unorm, color),
            Some(vec![255, 0, 128, 255])
        );
        assert_eq!(
            encode_color(TextureFormat::Bgra8Unorm, color),
            Some(vec![128, 0, 255, 255])
        );
        assert_eq!(encode_color(TextureFormat::Depth32Float, color), None);
    }

    #[test]
    fn test_write_then_read_sub_region() {
        let mut texture = CpuTexture::new(info(TextureFormat::R8Unorm, 4, 4, 1));
        let region = TextureRegion {
            origin: TextureOrigin {
                x: 1,
                y: 2,
                ..Default::default()
            },
            width: 2,
            height: 2,
        };
        texture.write(&region, &[1, 2, 3, 4]).unwrap();

        assert_eq!(texture.read(&region).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(
            texture.subresource(0, 0),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0]
        );
        assert!(texture.write(&TextureRegion::full(5, 1), &[0; 5]).is_err());
    }

    #[test]
    fn test_depth_stencil_clear_keeps_untouched_part() {
        let mut texture = CpuTexture::new(info(TextureFormat::Depth24UnormStencil8, 1, 1, 1));
        texture.fill_depth_stencil(0, 0, Some(1.0), Some(7));
        texture.fill_depth_stencil(0, 0, None, Some(3));

        let bits = u32::from_le_bytes(texture.subresource(0, 0).try_into().unwrap());
        assert_eq!(bits & 0x00FF_FFFF, 0x00FF_FFFF);
        assert_eq!(bits >> 24, 3);
    }

    #[test]
    fn test_resolve_copies_first_sample() {
        let mut surface = CpuTexture::new(info(TextureFormat::R8Unorm, 2, 1, 4));
        surface.fill(0, 0, &[9]);
        surface.subresources[0][4] = 5;
        let mut target = CpuTexture::new(info(TextureFormat::R8Unorm, 2, 1, 1));

        surface.resolve_into(&mut target, 0, 0).unwrap();

        assert_eq!(target.subresource(0, 0), &[9, 5]);
    }

    #[test]
    fn test_level_count_is_bounded_by_extent() {
        let mut too_deep = info(TextureFormat::R8Unorm, 4, 4, 1);
        too_deep.levels = 4;
        assert!(validate(&too_deep).is_err());
        too_deep.levels = 3;
        assert!(validate(&too_deep).is_ok());
    }
}
