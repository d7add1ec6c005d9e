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

use super::com::{raw_or_null, Com};
use super::context::D3D11Context;
use super::conversions::IntoD3D11;
use super::device::{swapchain_flags, Device};
use super::error::{check, create};
use super::loader::Library;
use super::resources::{staging_desc, D3D11Buffer, D3D11Pass, D3D11Texture, DisplayTargets};
use super::states::D3D11States;
use crate::graphic::states::PipelineStates;
use ember_core::graphic::{
    BufferDescriptor, Capabilities, ClearFlags, Driver, GraphicError,
    GraphicsBackend, Object, PassDescriptor, PipelineBinding, PipelineDescriptor, Rect,
    ResourceKind, ResourceTable, StateTracker, Submission, SubmitStats, TextureDescriptor,
    TextureFormat, TextureInfo, TextureOrigin, TextureRegion,
};
use glam::Vec4;
use raw_window_handle::RawWindowHandle;
use std::mem;
use std::ptr;
use winapi::shared::dxgi::DXGI_PRESENT_ALLOW_TEARING;
use winapi::shared::dxgi1_2::IDXGISwapChain1;
use winapi::shared::dxgiformat::DXGI_FORMAT_UNKNOWN;
use winapi::shared::windef::HWND;
use winapi::um::d3d11::*;

/// Everything that only exists once a device is up.
#[derive(Debug)]
struct Backend {
    device: Device,
    factory: D3D11States,
    swapchain: Option<Com<IDXGISwapChain1>>,
    display: Option<DisplayTargets>,
}

/// The Direct3D 11 [`Driver`].
///
/// The D3D11 and DXGI entry points are loaded at `initialize`. The device
/// prefers hardware across feature levels 11_1 down to 9_1 and falls back to
/// WARP. Without a window the display is an offscreen texture.
#[derive(Debug)]
pub struct D3D11Driver {
    capabilities: Capabilities,
    buffers: ResourceTable<D3D11Buffer>,
    textures: ResourceTable<D3D11Texture>,
    passes: ResourceTable<D3D11Pass>,
    pipelines: ResourceTable<PipelineBinding>,
    states: PipelineStates<D3D11States>,
    tracker: StateTracker,
    backend: Option<Backend>,
    // Dropped last: every object above lives in these libraries.
    library: Option<Library>,
}

impl Default for D3D11Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl D3D11Driver {
    /// Creates an uninitialized driver.
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities {
                backend: GraphicsBackend::D3D11,
                ..Capabilities::default()
            },
            buffers: ResourceTable::new(ResourceKind::Buffer),
            textures: ResourceTable::new(ResourceKind::Texture),
            passes: ResourceTable::new(ResourceKind::Pass),
            pipelines: ResourceTable::new(ResourceKind::Pipeline),
            states: PipelineStates::new(),
            tracker: StateTracker::new(),
            backend: None,
            library: None,
        }
    }

    fn backend(&self) -> Result<&Backend, GraphicError> {
        self.backend.as_ref().ok_or(GraphicError::NotInitialized)
    }

    fn display(&self) -> Result<&DisplayTargets, GraphicError> {
        self.backend()?.display.as_ref().ok_or(GraphicError::NotInitialized)
    }

    fn subresource(info: &TextureInfo, level: u32, layer: u32) -> u32 {
        level + layer * info.levels
    }

    fn region_box(region: &TextureRegion) -> D3D11_BOX {
        D3D11_BOX {
            left: region.origin.x,
            top: region.origin.y,
            front: 0,
            right: region.origin.x + region.width,
            bottom: region.origin.y + region.height,
            back: 1,
        }
    }

    fn check_region(info: &TextureInfo, region: &TextureRegion) -> Result<(), GraphicError> {
        if info.contains(region) {
            Ok(())
        } else {
            Err(GraphicError::InvalidDescriptor(format!(
                "region {region:?} is outside the texture"
            )))
        }
    }

    fn release_resources(&mut self) {
        let pipelines: Vec<PipelineBinding> = self.pipelines.iter().map(|(_, binding)| *binding).collect();
        for binding in &pipelines {
            self.states.release(binding);
        }
        self.pipelines.clear();
        self.passes.clear();
        self.textures.clear();
        self.buffers.clear();
        self.states.clear();
    }
}

impl Drop for D3D11Driver {
    fn drop(&mut self) {
        self.release_resources();
        self.backend = None;
    }
}

impl Driver for D3D11Driver {
    fn initialize(
        &mut self,
        window: Option<RawWindowHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicError> {
        if self.backend.is_some() {
            log::warn!("D3D11 driver initialized twice, recreating the device");
            self.release_resources();
            self.backend = None;
        }

        // --- 1. Load the system libraries ---
        let library = Library::load()?;

        // --- 2. Create the device ---
        let device = Device::open(&library)?;
        let tearing = device.supports_tearing();
        let sample_table = device.sample_table();
        self.capabilities = Capabilities {
            backend: GraphicsBackend::D3D11,
            shader_model: device.shader_model(),
            tearing,
            adapters: device.adapters(),
            sample_table,
            samples: 1,
        };

        // --- 3. Create the display ---
        let swapchain = match window {
            Some(RawWindowHandle::Win32(handle)) => Some(device.swapchain(
                handle.hwnd.get() as HWND,
                width.max(1),
                height.max(1),
                tearing,
            )?),
            Some(other) => {
                log::error!("Unsupported window handle {other:?}");
                return Err(GraphicError::Unsupported("non-Win32 window handles"));
            }
            None => None,
        };
        let display = DisplayTargets::new(
            &device,
            swapchain.as_ref(),
            width.max(1),
            height.max(1),
            &self.capabilities.sample_table,
            1,
        )?;

        log::info!(
            "D3D11 driver ready: {} adapter(s), shader model {}.{}, tearing {tearing}{}",
            self.capabilities.adapters.len(),
            self.capabilities.shader_model.major,
            self.capabilities.shader_model.minor,
            if device.software { ", software rasterizer" } else { "" }
        );

        self.backend = Some(Backend {
            factory: D3D11States::new(device.device.clone()),
            device,
            swapchain,
            display: Some(display),
        });
        self.library = Some(library);
        Ok(())
    }

    fn reset(&mut self, width: u32, height: u32, samples: u32) -> Result<(), GraphicError> {
        let samples = self.capabilities.sample_table.get(samples).count;
        let tearing = self.capabilities.tearing;
        let table = self.capabilities.sample_table;
        let backend = self.backend.as_mut().ok_or(GraphicError::NotInitialized)?;

        // The swapchain cannot resize while its buffers are referenced.
        backend.display = None;
        unsafe {
            backend.device.context.ClearState();
            backend.device.context.Flush();
        }
        if let Some(swapchain) = &backend.swapchain {
            check("IDXGISwapChain::ResizeBuffers", unsafe {
                swapchain.ResizeBuffers(0, width.max(1), height.max(1), DXGI_FORMAT_UNKNOWN, swapchain_flags(tearing))
            })?;
        }
        backend.display = Some(DisplayTargets::new(
            &backend.device,
            backend.swapchain.as_ref(),
            width.max(1),
            height.max(1),
            &table,
            samples,
        )?);
        self.capabilities.samples = samples;
        log::debug!("Display reset to {width}x{height} with {samples} samples");
        Ok(())
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_buffer(&mut self, id: Object, descriptor: &BufferDescriptor<'_>) -> Result<(), GraphicError> {
        let buffer = D3D11Buffer::new(&self.backend()?.device, descriptor)?;
        self.buffers.insert(id, buffer)
    }

    fn update_buffer(&mut self, id: Object, offset: u32, data: &[u8]) -> Result<(), GraphicError> {
        let backend = self.backend.as_ref().ok_or(GraphicError::NotInitialized)?;
        let buffer = self.buffers.get(id)?;
        if buffer.immutable {
            return Err(GraphicError::InvalidDescriptor(format!(
                "{:?} buffer {id} was created with initial data and is immutable",
                buffer.usage
            )));
        }
        let end = offset as usize + data.len();
        if end > buffer.size as usize {
            return Err(GraphicError::InvalidDescriptor(format!(
                "update of {offset}..{end} overruns buffer {id} ({} bytes)",
                buffer.size
            )));
        }
        let region = D3D11_BOX {
            left: offset,
            top: 0,
            front: 0,
            right: end as u32,
            bottom: 1,
            back: 1,
        };
        let whole = offset == 0 && end == buffer.size as usize;
        let target = if whole { ptr::null() } else { &region as *const D3D11_BOX };
        unsafe {
            backend.device.context.UpdateSubresource(
                buffer.buffer.as_ptr().cast(),
                0,
                target,
                data.as_ptr().cast(),
                0,
                0,
            )
        };
        Ok(())
    }

    fn delete_buffer(&mut self, id: Object) -> Result<(), GraphicError> {
        self.buffers.remove(id)?;
        log::debug!("Destroyed buffer {id}");
        Ok(())
    }

    fn create_pass(&mut self, id: Object, descriptor: &PassDescriptor) -> Result<(), GraphicError> {
        let backend = self.backend.as_ref().ok_or(GraphicError::NotInitialized)?;
        let textures = &self.textures;
        let pass = D3D11Pass::new(
            &backend.device,
            descriptor,
            &self.capabilities.sample_table,
            |attachment| textures.get(attachment.texture),
        )?;
        self.passes.insert(id, pass)
    }

    fn delete_pass(&mut self, id: Object) -> Result<(), GraphicError> {
        self.passes.remove(id)?;
        log::debug!("Destroyed pass {id}");
        Ok(())
    }

    fn create_pipeline(&mut self, id: Object, descriptor: &PipelineDescriptor) -> Result<(), GraphicError> {
        if self.pipelines.contains(id) {
            return Err(GraphicError::HandleInUse {
                kind: ResourceKind::Pipeline,
                id,
            });
        }
        let backend = self.backend.as_mut().ok_or(GraphicError::NotInitialized)?;
        let binding = self.states.create(&mut backend.factory, descriptor)?;
        if let Err(error) = self.pipelines.insert(id, binding) {
            self.states.release(&binding);
            return Err(error);
        }
        log::debug!("Created pipeline {id}: {binding:?}");
        Ok(())
    }

    fn delete_pipeline(&mut self, id: Object) -> Result<(), GraphicError> {
        let binding = self.pipelines.remove(id)?;
        self.states.release(&binding);
        Ok(())
    }

    fn create_texture(&mut self, id: Object, descriptor: &TextureDescriptor<'_>) -> Result<(), GraphicError> {
        let texture = D3D11Texture::new(
            &self.backend()?.device,
            descriptor,
            &self.capabilities.sample_table,
        )?;
        self.textures.insert(id, texture)
    }

    fn update_texture(&mut self, id: Object, region: &TextureRegion, data: &[u8]) -> Result<(), GraphicError> {
        let backend = self.backend.as_ref().ok_or(GraphicError::NotInitialized)?;
        let texture = self.textures.get(id)?;
        Self::check_region(&texture.info, region)?;
        if data.len() != region.byte_size(texture.info.format) {
            return Err(GraphicError::InvalidDescriptor(format!(
                "expected {} bytes, got {}",
                region.byte_size(texture.info.format),
                data.len()
            )));
        }
        let target = Self::region_box(region);
        let pitch = region.width * texture.info.format.bytes_per_pixel();
        unsafe {
            backend.device.context.UpdateSubresource(
                texture.resource(),
                Self::subresource(&texture.info, region.origin.level, region.origin.layer),
                &target,
                data.as_ptr().cast(),
                pitch,
                0,
            )
        };
        Ok(())
    }

    fn copy_texture(
        &mut self,
        source: Object,
        region: &TextureRegion,
        destination: Object,
        origin: TextureOrigin,
    ) -> Result<(), GraphicError> {
        let backend = self.backend.as_ref().ok_or(GraphicError::NotInitialized)?;
        let from = self.textures.get(source)?;
        let to = self.textures.get(destination)?;
        Self::check_region(&from.info, region)?;
        Self::check_region(
            &to.info,
            &TextureRegion {
                origin,
                width: region.width,
                height: region.height,
            },
        )?;
        let target = Self::region_box(region);
        unsafe {
            backend.device.context.CopySubresourceRegion(
                to.resource(),
                Self::subresource(&to.info, origin.level, origin.layer),
                origin.x,
                origin.y,
                0,
                from.resource(),
                Self::subresource(&from.info, region.origin.level, region.origin.layer),
                &target,
            )
        };
        Ok(())
    }

    fn read_texture(&mut self, id: Object, region: &TextureRegion) -> Result<Vec<u8>, GraphicError> {
        let backend = self.backend.as_ref().ok_or(GraphicError::NotInitialized)?;
        let texture = self.textures.get(id)?;
        Self::check_region(&texture.info, region)?;
        if texture.info.samples > 1 {
            return Err(GraphicError::Unsupported("reading back a multisampled texture"));
        }

        // Blocking: copy into a staging texture and map it.
        let desc = staging_desc(&texture.info, region.width, region.height);
        let staging: Com<ID3D11Texture2D> = create("CreateTexture2D", |out| unsafe {
            backend.device.device.CreateTexture2D(&desc, ptr::null(), out)
        })?;
        let source = Self::region_box(region);
        let context = &backend.device.context;
        unsafe {
            context.CopySubresourceRegion(
                staging.as_ptr().cast(),
                0,
                0,
                0,
                0,
                texture.resource(),
                Self::subresource(&texture.info, region.origin.level, region.origin.layer),
                &source,
            )
        };

        let mut mapped: D3D11_MAPPED_SUBRESOURCE = unsafe { mem::zeroed() };
        check("ID3D11DeviceContext::Map", unsafe {
            context.Map(staging.as_ptr().cast(), 0, D3D11_MAP_READ, 0, &mut mapped)
        })?;
        let row = (region.width * texture.info.format.bytes_per_pixel()) as usize;
        let mut pixels = Vec::with_capacity(row * region.height as usize);
        for y in 0..region.height as usize {
            let line = unsafe {
                std::slice::from_raw_parts(
                    (mapped.pData as *const u8).add(y * mapped.RowPitch as usize),
                    row,
                )
            };
            pixels.extend_from_slice(line);
        }
        unsafe { context.Unmap(staging.as_ptr().cast(), 0) };
        Ok(pixels)
    }

    fn query_texture(&self, id: Object) -> Result<TextureInfo, GraphicError> {
        Ok(self.textures.get(id)?.info)
    }

    fn delete_texture(&mut self, id: Object) -> Result<(), GraphicError> {
        self.textures.remove(id)?;
        log::debug!("Destroyed texture {id}");
        Ok(())
    }

    fn begin(
        &mut self,
        pass: Object,
        viewport: Rect,
        clear: ClearFlags,
        tint: Vec4,
        depth: f32,
        stencil: u8,
    ) -> Result<(), GraphicError> {
        let backend = self.backend()?;
        let (colors, depth_view) = if pass.is_none() {
            let display = self.display()?;
            (vec![display.target.view.as_ptr()], Some(&display.depth))
        } else {
            let target = self.passes.get(pass)?;
            (
                target.colors.iter().map(|color| color.view.as_ptr()).collect(),
                target.depth.as_ref(),
            )
        };

        let context = &backend.device.context;
        let port = D3D11_VIEWPORT {
            TopLeftX: viewport.x as f32,
            TopLeftY: viewport.y as f32,
            Width: viewport.width as f32,
            Height: viewport.height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        unsafe {
            context.ClearState();
            context.OMSetRenderTargets(colors.len() as u32, colors.as_ptr(), raw_or_null(depth_view));
            context.RSSetViewports(1, &port);
            if clear.contains(ClearFlags::COLOR) {
                let color = tint.to_array();
                for &view in &colors {
                    context.ClearRenderTargetView(view, &color);
                }
            }
            let mut flags = 0;
            if clear.contains(ClearFlags::DEPTH) {
                flags |= D3D11_CLEAR_DEPTH;
            }
            if clear.contains(ClearFlags::STENCIL) {
                flags |= D3D11_CLEAR_STENCIL;
            }
            if let (Some(view), true) = (depth_view, flags != 0) {
                context.ClearDepthStencilView(view.as_ptr(), flags, depth, stencil);
            }
        }
        self.tracker.reset();
        Ok(())
    }

    fn submit(&mut self, submissions: &[Submission]) -> Result<SubmitStats, GraphicError> {
        let backend = self.backend.as_mut().ok_or(GraphicError::NotInitialized)?;
        let mut context = D3D11Context {
            context: &backend.device.context,
            factory: &mut backend.factory,
            states: &mut self.states,
            pipelines: &self.pipelines,
            buffers: &self.buffers,
            textures: &self.textures,
        };
        self.tracker.submit(&mut context, submissions)
    }

    fn commit(&mut self, pass: Object, vsync: bool) -> Result<(), GraphicError> {
        let backend = self.backend()?;
        let context = &backend.device.context;

        if !pass.is_none() {
            let target = self.passes.get(pass)?;
            for (color, attachment) in target.colors.iter().zip(&target.descriptor.colors) {
                let Some(surface) = &color.surface else {
                    continue;
                };
                let texture = self.textures.get(attachment.texture)?;
                let format = texture.info.format.into_d3d11();
                unsafe {
                    context.ResolveSubresource(
                        texture.resource(),
                        Self::subresource(&texture.info, attachment.level, attachment.layer),
                        surface.as_ptr().cast(),
                        0,
                        format,
                    )
                };
            }
            return Ok(());
        }

        let display = self.display()?;
        if let Some(surface) = &display.target.surface {
            unsafe {
                context.ResolveSubresource(
                    display.color.as_ptr().cast(),
                    0,
                    surface.as_ptr().cast(),
                    0,
                    TextureFormat::Bgra8Unorm.into_d3d11(),
                )
            };
        }
        if let Some(swapchain) = &backend.swapchain {
            let (interval, flags) = if vsync {
                (1, 0)
            } else if self.capabilities.tearing {
                (0, DXGI_PRESENT_ALLOW_TEARING)
            } else {
                (0, 0)
            };
            check("IDXGISwapChain::Present", unsafe { swapchain.Present(interval, flags) })?;
        }
        Ok(())
    }
}
