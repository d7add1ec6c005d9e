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

//! The graphics service: a driver plus the handle bookkeeping around it.

use crate::graphic::api::*;
use crate::graphic::error::GraphicError;
use crate::graphic::submit::SubmitStats;
use crate::graphic::traits::Driver;
use crate::utils::handle_allocator::HandleAllocator;
use glam::Vec4;
use raw_window_handle::RawWindowHandle;

/// Owns a [`Driver`] and allocates the handles its resources live at.
#[derive(Debug)]
pub struct GraphicService {
    driver: Box<dyn Driver>,
    buffers: HandleAllocator,
    textures: HandleAllocator,
    passes: HandleAllocator,
    pipelines: HandleAllocator,
}

impl GraphicService {
    /// Wraps `driver`. Call [`initialize`](Self::initialize) before use.
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            buffers: HandleAllocator::new(MAX_BUFFERS as u32),
            textures: HandleAllocator::new(MAX_TEXTURES as u32),
            passes: HandleAllocator::new(MAX_PASSES as u32),
            pipelines: HandleAllocator::new(MAX_PIPELINES as u32),
        }
    }

    /// Initializes the underlying driver.
    pub fn initialize(
        &mut self,
        window: Option<RawWindowHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicError> {
        self.driver.initialize(window, width, height)?;
        let capabilities = self.driver.capabilities();
        log::info!(
            "Graphics initialized: {:?}, shader model {}.{}, tearing {}",
            capabilities.backend,
            capabilities.shader_model.major,
            capabilities.shader_model.minor,
            capabilities.tearing
        );
        Ok(())
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// The wrapped driver, mutably.
    pub fn driver_mut(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }

    /// The driver's capability report.
    pub fn capabilities(&self) -> &Capabilities {
        self.driver.capabilities()
    }

    /// Resizes the display pass.
    pub fn reset(&mut self, width: u32, height: u32, samples: u32) -> Result<(), GraphicError> {
        self.driver
            .reset(width, height, samples)
            .map_err(|error| logged("reset", error))
    }

    /// Allocates a handle and creates a buffer there.
    pub fn create_buffer(&mut self, descriptor: &BufferDescriptor<'_>) -> Result<Object, GraphicError> {
        let driver = &mut self.driver;
        allocate(&mut self.buffers, ResourceKind::Buffer, |id| {
            driver.create_buffer(id, descriptor)
        })
    }

    /// Uploads into a buffer.
    pub fn update_buffer(&mut self, id: Object, offset: u32, data: &[u8]) -> Result<(), GraphicError> {
        self.driver.update_buffer(id, offset, data)
    }

    /// Destroys a buffer and recycles its handle.
    pub fn delete_buffer(&mut self, id: Object) -> Result<(), GraphicError> {
        self.driver.delete_buffer(id)?;
        self.buffers.free(id.0);
        Ok(())
    }

    /// Allocates a handle and creates a texture there.
    pub fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor<'_>,
    ) -> Result<Object, GraphicError> {
        let driver = &mut self.driver;
        allocate(&mut self.textures, ResourceKind::Texture, |id| {
            driver.create_texture(id, descriptor)
        })
    }

    /// Uploads texels into a texture region.
    pub fn update_texture(
        &mut self,
        id: Object,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), GraphicError> {
        self.driver.update_texture(id, region, data)
    }

    /// Copies between textures.
    pub fn copy_texture(
        &mut self,
        source: Object,
        region: &TextureRegion,
        destination: Object,
        origin: TextureOrigin,
    ) -> Result<(), GraphicError> {
        self.driver.copy_texture(source, region, destination, origin)
    }

    /// Reads texels back to the CPU.
    pub fn read_texture(&mut self, id: Object, region: &TextureRegion) -> Result<Vec<u8>, GraphicError> {
        self.driver.read_texture(id, region)
    }

    /// Describes a texture.
    pub fn query_texture(&self, id: Object) -> Result<TextureInfo, GraphicError> {
        self.driver.query_texture(id)
    }

    /// Destroys a texture and recycles its handle.
    pub fn delete_texture(&mut self, id: Object) -> Result<(), GraphicError> {
        self.driver.delete_texture(id)?;
        self.textures.free(id.0);
        Ok(())
    }

    /// Allocates a handle and creates a pass there.
    pub fn create_pass(&mut self, descriptor: &PassDescriptor) -> Result<Object, GraphicError> {
        let driver = &mut self.driver;
        allocate(&mut self.passes, ResourceKind::Pass, |id| {
            driver.create_pass(id, descriptor)
        })
    }

    /// Destroys a pass and recycles its handle.
    pub fn delete_pass(&mut self, id: Object) -> Result<(), GraphicError> {
        self.driver.delete_pass(id)?;
        self.passes.free(id.0);
        Ok(())
    }

    /// Allocates a handle and compiles a pipeline there.
    pub fn create_pipeline(&mut self, descriptor: &PipelineDescriptor) -> Result<Object, GraphicError> {
        let driver = &mut self.driver;
        allocate(&mut self.pipelines, ResourceKind::Pipeline, |id| {
            driver.create_pipeline(id, descriptor)
        })
    }

    /// Destroys a pipeline and recycles its handle.
    pub fn delete_pipeline(&mut self, id: Object) -> Result<(), GraphicError> {
        self.driver.delete_pipeline(id)?;
        self.pipelines.free(id.0);
        Ok(())
    }

    /// Starts a pass.
    pub fn begin(
        &mut self,
        pass: Object,
        viewport: Rect,
        clear: ClearFlags,
        tint: Vec4,
        depth: f32,
        stencil: u8,
    ) -> Result<(), GraphicError> {
        self.driver
            .begin(pass, viewport, clear, tint, depth, stencil)
            .map_err(|error| logged("begin", error))
    }

    /// Submits draws to the current pass.
    pub fn submit(&mut self, submissions: &[Submission]) -> Result<SubmitStats, GraphicError> {
        self.driver
            .submit(submissions)
            .map_err(|error| logged("submit", error))
    }

    /// Finishes a pass, presenting if it is the display pass.
    pub fn commit(&mut self, pass: Object, vsync: bool) -> Result<(), GraphicError> {
        self.driver
            .commit(pass, vsync)
            .map_err(|error| logged("commit", error))
    }
}

fn logged(call: &str, error: GraphicError) -> GraphicError {
    log::error!("Graphics {call} failed: {error}");
    error
}

fn allocate(
    allocator: &mut HandleAllocator,
    kind: ResourceKind,
    create: impl FnOnce(Object) -> Result<(), GraphicError>,
) -> Result<Object, GraphicError> {
    let id = allocator.allocate().ok_or_else(|| {
        log::warn!("{kind} table exhausted");
        GraphicError::Exhausted { kind }
    })?;
    if let Err(error) = create(Object(id)) {
        allocator.free(id);
        return Err(error);
    }
    Ok(Object(id))
}
