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

//! GPU resources and the views created over them.

use super::com::Com;
use super::conversions::{resource_format, shader_view_format, IntoD3D11};
use super::device::{Device, DISPLAY_FORMAT};
use super::error::create;
use ember_core::graphic::{
    Attachment, BufferDescriptor, BufferUsage, GraphicError, PassDescriptor, SampleTable,
    TextureDescriptor, TextureFormat, TextureInfo,
};
use std::mem;
use std::ptr;
use winapi::shared::dxgi1_2::IDXGISwapChain1;
use winapi::shared::dxgitype::DXGI_SAMPLE_DESC;
use winapi::um::d3d11::*;
use winapi::um::d3dcommon::*;
use winapi::Interface;

#[derive(Debug)]
pub struct D3D11Buffer {
    pub buffer: Com<ID3D11Buffer>,
    pub usage: BufferUsage,
    pub immutable: bool,
    pub size: u32,
}

impl D3D11Buffer {
    pub fn new(device: &Device, descriptor: &BufferDescriptor<'_>) -> Result<Self, GraphicError> {
        if descriptor.size == 0 {
            return Err(GraphicError::InvalidDescriptor("zero-sized buffer".into()));
        }
        let size = descriptor.allocation_size();
        let desc = D3D11_BUFFER_DESC {
            ByteWidth: size,
            Usage: if descriptor.is_immutable() {
                D3D11_USAGE_IMMUTABLE
            } else {
                D3D11_USAGE_DEFAULT
            },
            BindFlags: match descriptor.usage {
                BufferUsage::Vertex => D3D11_BIND_VERTEX_BUFFER,
                BufferUsage::Index => D3D11_BIND_INDEX_BUFFER,
                BufferUsage::Uniform => D3D11_BIND_CONSTANT_BUFFER,
            },
            CPUAccessFlags: 0,
            MiscFlags: 0,
            StructureByteStride: 0,
        };

        // Immutable buffers need every byte up front.
        let padded = descriptor.data.map(|data| {
            let mut padded = vec![0u8; size as usize];
            let length = data.len().min(padded.len());
            padded[..length].copy_from_slice(&data[..length]);
            padded
        });
        let initial = padded.as_ref().map(|data| D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr().cast(),
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });
        let buffer = create("CreateBuffer", |out| unsafe {
            device.device.CreateBuffer(
                &desc,
                initial.as_ref().map_or(ptr::null(), |data| data as *const _),
                out,
            )
        })?;
        Ok(Self {
            buffer,
            usage: descriptor.usage,
            immutable: descriptor.is_immutable(),
            size,
        })
    }
}

#[derive(Debug)]
pub struct D3D11Texture {
    pub texture: Com<ID3D11Texture2D>,
    pub view: Option<Com<ID3D11ShaderResourceView>>,
    pub info: TextureInfo,
}

impl D3D11Texture {
    pub fn new(
        device: &Device,
        descriptor: &TextureDescriptor<'_>,
        samples: &SampleTable,
    ) -> Result<Self, GraphicError> {
        let sample = samples.get(descriptor.samples);
        let mut info = descriptor.info();
        info.samples = sample.count;
        if info.width == 0 || info.height == 0 || info.layers == 0 || info.levels == 0 {
            return Err(GraphicError::InvalidDescriptor(format!(
                "texture extent {}x{} with {} layers and {} levels",
                info.width, info.height, info.layers, info.levels
            )));
        }

        let sampled = info.layout.is_sampled();
        let mut bind = 0;
        if sampled {
            bind |= D3D11_BIND_SHADER_RESOURCE;
        }
        if info.layout.is_target() {
            bind |= if info.format.is_depth() {
                D3D11_BIND_DEPTH_STENCIL
            } else {
                D3D11_BIND_RENDER_TARGET
            };
        }
        let desc = D3D11_TEXTURE2D_DESC {
            Width: info.width,
            Height: info.height,
            MipLevels: info.levels,
            ArraySize: info.layers,
            Format: resource_format(info.format, sampled),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: sample.count,
                Quality: sample.quality,
            },
            Usage: if descriptor.data.is_some() && !info.layout.is_target() {
                D3D11_USAGE_IMMUTABLE
            } else {
                D3D11_USAGE_DEFAULT
            },
            BindFlags: bind,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };

        let initial = match descriptor.data {
            Some(data) => Some(subresource_data(&info, data)?),
            None => None,
        };
        let texture = create("CreateTexture2D", |out| unsafe {
            device.device.CreateTexture2D(
                &desc,
                initial.as_ref().map_or(ptr::null(), |data| data.as_ptr()),
                out,
            )
        })?;
        let view = if sampled {
            Some(shader_view(device, &texture, &info)?)
        } else {
            None
        };
        Ok(Self {
            texture,
            view,
            info,
        })
    }

    pub fn resource(&self) -> *mut ID3D11Resource {
        self.texture.as_ptr().cast()
    }
}

/// Splits tightly packed initial data into per-subresource descriptors.
fn subresource_data(info: &TextureInfo, data: &[u8]) -> Result<Vec<D3D11_SUBRESOURCE_DATA>, GraphicError> {
    if info.samples > 1 {
        return Err(GraphicError::InvalidDescriptor(
            "multisampled textures cannot carry initial data".into(),
        ));
    }
    let bpp = info.format.bytes_per_pixel() as usize;
    let mut offset = 0;
    let mut subresources = Vec::with_capacity((info.layers * info.levels) as usize);
    for _ in 0..info.layers {
        for level in 0..info.levels {
            let (width, _) = info.level_extent(level);
            let size = info.level_size(level);
            if offset + size > data.len() {
                return Err(GraphicError::InvalidDescriptor(format!(
                    "initial data is {} bytes, more is needed",
                    data.len()
                )));
            }
            subresources.push(D3D11_SUBRESOURCE_DATA {
                pSysMem: data[offset..].as_ptr().cast(),
                SysMemPitch: (width as usize * bpp) as u32,
                SysMemSlicePitch: size as u32,
            });
            offset += size;
        }
    }
    Ok(subresources)
}

fn shader_view(
    device: &Device,
    texture: &Com<ID3D11Texture2D>,
    info: &TextureInfo,
) -> Result<Com<ID3D11ShaderResourceView>, GraphicError> {
    let mut desc: D3D11_SHADER_RESOURCE_VIEW_DESC = unsafe { mem::zeroed() };
    desc.Format = shader_view_format(info.format);
    unsafe {
        if info.samples > 1 {
            desc.ViewDimension = D3D11_SRV_DIMENSION_TEXTURE2DMS;
        } else if info.layers > 1 {
            desc.ViewDimension = D3D11_SRV_DIMENSION_TEXTURE2DARRAY;
            *desc.u.Texture2DArray_mut() = D3D11_TEX2D_ARRAY_SRV {
                MostDetailedMip: 0,
                MipLevels: info.levels,
                FirstArraySlice: 0,
                ArraySize: info.layers,
            };
        } else {
            desc.ViewDimension = D3D11_SRV_DIMENSION_TEXTURE2D;
            *desc.u.Texture2D_mut() = D3D11_TEX2D_SRV {
                MostDetailedMip: 0,
                MipLevels: info.levels,
            };
        }
    }
    create("CreateShaderResourceView", |out| unsafe {
        device
            .device
            .CreateShaderResourceView(texture.as_ptr().cast(), &desc, out)
    })
}

/// Creates a render-target view of one subresource, or of a whole
/// multisampled surface.
pub fn render_target_view(
    device: &Device,
    texture: &Com<ID3D11Texture2D>,
    format: TextureFormat,
    attachment: Option<&Attachment>,
) -> Result<Com<ID3D11RenderTargetView>, GraphicError> {
    let mut desc: D3D11_RENDER_TARGET_VIEW_DESC = unsafe { mem::zeroed() };
    desc.Format = format.into_d3d11();
    match attachment {
        Some(attachment) => unsafe {
            desc.ViewDimension = D3D11_RTV_DIMENSION_TEXTURE2DARRAY;
            *desc.u.Texture2DArray_mut() = D3D11_TEX2D_ARRAY_RTV {
                MipSlice: attachment.level,
                FirstArraySlice: attachment.layer,
                ArraySize: 1,
            };
        },
        None => desc.ViewDimension = D3D11_RTV_DIMENSION_TEXTURE2DMS,
    }
    create("CreateRenderTargetView", |out| unsafe {
        device
            .device
            .CreateRenderTargetView(texture.as_ptr().cast(), &desc, out)
    })
}

/// Depth counterpart of [`render_target_view`].
pub fn depth_stencil_view(
    device: &Device,
    texture: &Com<ID3D11Texture2D>,
    format: TextureFormat,
    attachment: Option<&Attachment>,
) -> Result<Com<ID3D11DepthStencilView>, GraphicError> {
    let mut desc: D3D11_DEPTH_STENCIL_VIEW_DESC = unsafe { mem::zeroed() };
    desc.Format = format.into_d3d11();
    match attachment {
        Some(attachment) => unsafe {
            desc.ViewDimension = D3D11_DSV_DIMENSION_TEXTURE2DARRAY;
            *desc.u.Texture2DArray_mut() = D3D11_TEX2D_ARRAY_DSV {
                MipSlice: attachment.level,
                FirstArraySlice: attachment.layer,
                ArraySize: 1,
            };
        },
        None => desc.ViewDimension = D3D11_DSV_DIMENSION_TEXTURE2DMS,
    }
    create("CreateDepthStencilView", |out| unsafe {
        device
            .device
            .CreateDepthStencilView(texture.as_ptr().cast(), &desc, out)
    })
}

/// A render-target-only texture, used for multisampled surfaces and the
/// window-less display.
pub fn surface(
    device: &Device,
    format: TextureFormat,
    width: u32,
    height: u32,
    samples: &SampleTable,
    count: u32,
) -> Result<Com<ID3D11Texture2D>, GraphicError> {
    let sample = samples.get(count);
    let desc = D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: 1,
        ArraySize: 1,
        Format: format.into_d3d11(),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: sample.count,
            Quality: sample.quality,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: if format.is_depth() {
            D3D11_BIND_DEPTH_STENCIL
        } else {
            D3D11_BIND_RENDER_TARGET
        },
        CPUAccessFlags: 0,
        MiscFlags: 0,
    };
    create("CreateTexture2D", |out| unsafe {
        device.device.CreateTexture2D(&desc, ptr::null(), out)
    })
}

/// One color target of a pass.
#[derive(Debug)]
pub struct ColorTarget {
    pub view: Com<ID3D11RenderTargetView>,
    /// The implicit multisampled surface the view points at, if any.
    pub surface: Option<Com<ID3D11Texture2D>>,
}

#[derive(Debug)]
pub struct D3D11Pass {
    pub descriptor: PassDescriptor,
    pub colors: Vec<ColorTarget>,
    pub depth: Option<Com<ID3D11DepthStencilView>>,
}

impl D3D11Pass {
    /// Builds the views of `descriptor`. `texture` resolves attachments.
    pub fn new<'t>(
        device: &Device,
        descriptor: &PassDescriptor,
        samples: &SampleTable,
        texture: impl Fn(&Attachment) -> Result<&'t D3D11Texture, GraphicError>,
    ) -> Result<Self, GraphicError> {
        let count = samples.get(descriptor.samples).count;
        let mut colors = Vec::with_capacity(descriptor.colors.len());
        for attachment in &descriptor.colors {
            let target = texture(attachment)?;
            check_target(target, attachment, false)?;
            let color = if count > 1 {
                let (width, height) = target.info.level_extent(attachment.level);
                let surface = surface(device, target.info.format, width, height, samples, count)?;
                ColorTarget {
                    view: render_target_view(device, &surface, target.info.format, None)?,
                    surface: Some(surface),
                }
            } else {
                ColorTarget {
                    view: render_target_view(device, &target.texture, target.info.format, Some(attachment))?,
                    surface: None,
                }
            };
            colors.push(color);
        }

        let depth = match &descriptor.depth {
            Some(attachment) => {
                let target = texture(attachment)?;
                check_target(target, attachment, true)?;
                Some(if count > 1 {
                    let (width, height) = target.info.level_extent(attachment.level);
                    let surface = surface(device, target.info.format, width, height, samples, count)?;
                    depth_stencil_view(device, &surface, target.info.format, None)?
                } else {
                    depth_stencil_view(device, &target.texture, target.info.format, Some(attachment))?
                })
            }
            None => None,
        };

        let mut descriptor = descriptor.clone();
        descriptor.samples = count;
        Ok(Self {
            descriptor,
            colors,
            depth,
        })
    }
}

fn check_target(texture: &D3D11Texture, attachment: &Attachment, depth: bool) -> Result<(), GraphicError> {
    let info = &texture.info;
    if !info.layout.is_target() || info.format.is_depth() != depth {
        return Err(GraphicError::InvalidDescriptor(format!(
            "texture {} ({:?}, {:?}) cannot be attached here",
            attachment.texture, info.format, info.layout
        )));
    }
    if attachment.level >= info.levels || attachment.layer >= info.layers {
        return Err(GraphicError::InvalidDescriptor(format!(
            "texture {} has no level {} layer {}",
            attachment.texture, attachment.level, attachment.layer
        )));
    }
    Ok(())
}

/// Targets of the display pass.
#[derive(Debug)]
pub struct DisplayTargets {
    pub width: u32,
    pub height: u32,
    /// The swapchain back buffer or an offscreen texture.
    pub color: Com<ID3D11Texture2D>,
    pub target: ColorTarget,
    pub depth: Com<ID3D11DepthStencilView>,
}

impl DisplayTargets {
    pub fn new(
        device: &Device,
        swapchain: Option<&Com<IDXGISwapChain1>>,
        width: u32,
        height: u32,
        samples: &SampleTable,
        count: u32,
    ) -> Result<Self, GraphicError> {
        let color = match swapchain {
            Some(swapchain) => create("IDXGISwapChain::GetBuffer", |out: &mut *mut ID3D11Texture2D| unsafe {
                swapchain.GetBuffer(0, &ID3D11Texture2D::uuidof(), (out as *mut *mut ID3D11Texture2D).cast())
            })?,
            None => surface(device, TextureFormat::Bgra8Unorm, width, height, samples, 1)?,
        };
        debug_assert_eq!(TextureFormat::Bgra8Unorm.into_d3d11(), DISPLAY_FORMAT);

        let target = if count > 1 {
            let surface = surface(device, TextureFormat::Bgra8Unorm, width, height, samples, count)?;
            ColorTarget {
                view: render_target_view(device, &surface, TextureFormat::Bgra8Unorm, None)?,
                surface: Some(surface),
            }
        } else {
            ColorTarget {
                view: render_target_view(
                    device,
                    &color,
                    TextureFormat::Bgra8Unorm,
                    Some(&Attachment::default()),
                )?,
                surface: None,
            }
        };
        let depth_surface = surface(
            device,
            TextureFormat::Depth24UnormStencil8,
            width,
            height,
            samples,
            count,
        )?;
        let depth = depth_stencil_view(
            device,
            &depth_surface,
            TextureFormat::Depth24UnormStencil8,
            (count <= 1).then_some(&Attachment::default()),
        )?;
        Ok(Self {
            width,
            height,
            color,
            target,
            depth,
        })
    }
}

/// Layout of a texture readback copy.
pub fn staging_desc(info: &TextureInfo, width: u32, height: u32) -> D3D11_TEXTURE2D_DESC {
    D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: 1,
        ArraySize: 1,
        Format: resource_format(info.format, info.layout.is_sampled()),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_STAGING,
        BindFlags: 0,
        CPUAccessFlags: D3D11_CPU_ACCESS_READ,
        MiscFlags: 0,
    }
}
