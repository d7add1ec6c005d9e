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

use super::texture::{encode_color, CpuTexture};
use crate::graphic::states::{PipelineStates, StateFactory};
use ember_core::graphic::{
    AdapterInfo, Attachment, BlendState, BufferDescriptor, BufferUsage, Capabilities, ClearFlags, Command,
    DepthStencilState, Driver, GraphicError, GraphicsBackend, InputLayoutKey, Object,
    PassDescriptor, PipelineBinding, PipelineDescriptor, RasterizerState, Rect, Recorder,
    ResourceKind, ResourceTable, SampleTable, SamplerDescriptor, ShaderModel, StateTracker,
    Submission, SubmitStats, TextureDescriptor, TextureFormat, TextureInfo, TextureLayout,
    TextureOrigin, TextureRegion, MAX_VERTEX_STREAMS,
};
use glam::Vec4;
use raw_window_handle::RawWindowHandle;

/// Sample counts the headless rasterizer accepts.
const SUPPORTED_SAMPLES: [u32; 4] = [1, 2, 4, 8];

/// Builds state "objects" as validated copies of their descriptors.
#[derive(Debug, Default)]
pub struct HeadlessStates;

/// Pipeline state caches of the headless driver.
pub type HeadlessPipelineStates = PipelineStates<HeadlessStates>;

impl StateFactory for HeadlessStates {
    type VertexShader = usize;
    type PixelShader = usize;
    type GeometryShader = usize;
    type Blend = BlendState;
    type DepthStencil = DepthStencilState;
    type Rasterizer = RasterizerState;
    type InputLayout = InputLayoutKey;
    type Sampler = SamplerDescriptor;

    fn vertex_shader(&mut self, bytecode: &[u8]) -> Result<usize, GraphicError> {
        Ok(bytecode.len())
    }

    fn pixel_shader(&mut self, bytecode: &[u8]) -> Result<usize, GraphicError> {
        Ok(bytecode.len())
    }

    fn geometry_shader(&mut self, bytecode: &[u8]) -> Result<usize, GraphicError> {
        Ok(bytecode.len())
    }

    fn blend(&mut self, state: &BlendState) -> Result<BlendState, GraphicError> {
        Ok(*state)
    }

    fn depth_stencil(&mut self, state: &DepthStencilState) -> Result<DepthStencilState, GraphicError> {
        Ok(*state)
    }

    fn rasterizer(&mut self, state: &RasterizerState) -> Result<RasterizerState, GraphicError> {
        Ok(*state)
    }

    fn input_layout(&mut self, key: &InputLayoutKey) -> Result<InputLayoutKey, GraphicError> {
        for attribute in &key.attributes {
            if attribute.semantic.is_empty() {
                return Err(GraphicError::InvalidDescriptor(
                    "vertex attribute without a semantic".into(),
                ));
            }
            if attribute.stream as usize >= MAX_VERTEX_STREAMS {
                return Err(GraphicError::InvalidDescriptor(format!(
                    "vertex attribute {} reads stream {}",
                    attribute.semantic, attribute.stream
                )));
            }
        }
        Ok(key.clone())
    }

    fn sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<SamplerDescriptor, GraphicError> {
        Ok(*descriptor)
    }
}

#[derive(Debug)]
struct CpuBuffer {
    usage: BufferUsage,
    immutable: bool,
    data: Vec<u8>,
}

/// Render targets of a pass. Multisampled passes render into implicit
/// surfaces that are resolved into the attachments on commit.
#[derive(Debug)]
struct CpuPass {
    descriptor: PassDescriptor,
    colors: Vec<CpuTexture>,
    depth: Option<CpuTexture>,
}

#[derive(Debug)]
struct Display {
    color: CpuTexture,
    depth: CpuTexture,
    multisampled: Option<(CpuTexture, CpuTexture)>,
}

impl Display {
    fn new(width: u32, height: u32, samples: u32) -> Self {
        let surface = |format, samples| {
            CpuTexture::new(TextureInfo {
                format,
                layout: TextureLayout::Destination,
                width,
                height,
                layers: 1,
                levels: 1,
                samples,
            })
        };
        Self {
            color: surface(TextureFormat::Bgra8Unorm, 1),
            depth: surface(TextureFormat::Depth24UnormStencil8, 1),
            multisampled: (samples > 1).then(|| {
                (
                    surface(TextureFormat::Bgra8Unorm, samples),
                    surface(TextureFormat::Depth24UnormStencil8, samples),
                )
            }),
        }
    }

    fn targets(&mut self) -> (&mut CpuTexture, &mut CpuTexture) {
        match &mut self.multisampled {
            Some((color, depth)) => (color, depth),
            None => (&mut self.color, &mut self.depth),
        }
    }
}

/// The CPU-side [`Driver`].
#[derive(Debug)]
pub struct HeadlessDriver {
    capabilities: Capabilities,
    display: Option<Display>,
    buffers: ResourceTable<CpuBuffer>,
    textures: ResourceTable<CpuTexture>,
    passes: ResourceTable<CpuPass>,
    pipelines: ResourceTable<PipelineBinding>,
    factory: HeadlessStates,
    states: HeadlessPipelineStates,
    tracker: StateTracker,
    recorder: Recorder,
    active: Option<Object>,
    viewport: Rect,
    pass_stats: SubmitStats,
    frame_stats: SubmitStats,
    last_frame: SubmitStats,
    frames: u64,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDriver {
    /// Creates an uninitialized driver.
    pub fn new() -> Self {
        let sample_table = SampleTable::build(8, |count| u32::from(SUPPORTED_SAMPLES.contains(&count)));
        Self {
            capabilities: Capabilities {
                backend: GraphicsBackend::Headless,
                shader_model: ShaderModel::new(5, 0),
                tearing: false,
                adapters: vec![AdapterInfo {
                    name: "Headless".to_owned(),
                    software: true,
                    ..AdapterInfo::default()
                }],
                sample_table,
                samples: 1,
            },
            display: None,
            buffers: ResourceTable::new(ResourceKind::Buffer),
            textures: ResourceTable::new(ResourceKind::Texture),
            passes: ResourceTable::new(ResourceKind::Pass),
            pipelines: ResourceTable::new(ResourceKind::Pipeline),
            factory: HeadlessStates,
            states: PipelineStates::new(),
            tracker: StateTracker::new(),
            recorder: Recorder::new(),
            active: None,
            viewport: Rect::default(),
            pass_stats: SubmitStats::default(),
            frame_stats: SubmitStats::default(),
            last_frame: SubmitStats::default(),
            frames: 0,
        }
    }

    fn ensure_initialized(&self) -> Result<(), GraphicError> {
        if self.display.is_some() {
            Ok(())
        } else {
            Err(GraphicError::NotInitialized)
        }
    }

    fn display_mut(&mut self) -> Result<&mut Display, GraphicError> {
        self.display.as_mut().ok_or(GraphicError::NotInitialized)
    }

    /// Commands recorded since the current pass began.
    pub fn commands(&self) -> &[Command] {
        self.recorder.commands()
    }

    /// Takes the commands recorded so far.
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.recorder.take()
    }

    /// Counters of the current pass.
    pub fn pass_stats(&self) -> SubmitStats {
        self.pass_stats
    }

    /// Counters of the last presented frame.
    pub fn frame_stats(&self) -> SubmitStats {
        self.last_frame
    }

    /// Number of frames presented to the display.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The viewport of the current pass.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Interned pipeline state.
    pub fn states(&self) -> &HeadlessPipelineStates {
        &self.states
    }

    /// The contents of a buffer.
    pub fn buffer_data(&self, id: Object) -> Result<&[u8], GraphicError> {
        Ok(&self.buffers.get(id)?.data)
    }

    /// Reads back the presented display image (BGRA8).
    pub fn read_display(&self, region: &TextureRegion) -> Result<Vec<u8>, GraphicError> {
        let display = self.display.as_ref().ok_or(GraphicError::NotInitialized)?;
        display.color.read(region)
    }

    fn supported_samples(&self, requested: u32) -> u32 {
        self.capabilities.sample_table.get(requested).count
    }

    fn clear_pass(
        &mut self,
        pass: Object,
        clear: ClearFlags,
        tint: Vec4,
        depth: f32,
        stencil: u8,
    ) -> Result<(), GraphicError> {
        let depth = clear.contains(ClearFlags::DEPTH).then_some(depth);
        let stencil = clear.contains(ClearFlags::STENCIL).then_some(stencil);
        let clear_color = clear.contains(ClearFlags::COLOR);

        if pass.is_none() {
            let (color, depth_surface) = self.display_mut()?.targets();
            if clear_color {
                if let Some(value) = encode_color(color.info().format, tint) {
                    color.fill(0, 0, &value);
                }
            }
            depth_surface.fill_depth_stencil(0, 0, depth, stencil);
            return Ok(());
        }

        let target = self.passes.get_mut(pass)?;
        let multisampled = target.descriptor.is_multisampled();
        for (index, attachment) in target.descriptor.colors.iter().enumerate() {
            let (surface, level, layer) = if multisampled {
                (&mut target.colors[index], 0, 0)
            } else {
                (self.textures.get_mut(attachment.texture)?, attachment.level, attachment.layer)
            };
            if clear_color {
                if let Some(value) = encode_color(surface.info().format, tint) {
                    surface.fill(level, layer, &value);
                }
            }
        }
        if let Some(attachment) = target.descriptor.depth {
            let (surface, level, layer) = match target.depth.as_mut() {
                Some(surface) => (surface, 0, 0),
                None => (self.textures.get_mut(attachment.texture)?, attachment.level, attachment.layer),
            };
            surface.fill_depth_stencil(level, layer, depth, stencil);
        }
        Ok(())
    }

    fn resolve_pass(&mut self, pass: Object) -> Result<(), GraphicError> {
        if pass.is_none() {
            let display = self.display_mut()?;
            if let Some((color, _)) = &display.multisampled {
                color.resolve_into(&mut display.color, 0, 0)?;
            }
            return Ok(());
        }

        let target = self.passes.get(pass)?;
        for (surface, attachment) in target.colors.iter().zip(&target.descriptor.colors) {
            let texture = self.textures.get_mut(attachment.texture)?;
            surface.resolve_into(texture, attachment.level, attachment.layer)?;
        }
        Ok(())
    }

    fn validate_submission(&self, submission: &Submission) -> Result<(), GraphicError> {
        for id in submission.buffers() {
            self.buffers.get(id)?;
        }
        for id in submission.textures() {
            self.textures.get(id)?;
        }
        self.pipelines.binding(submission.pipeline)?;
        Ok(())
    }

    fn attachment_surface(
        &self,
        attachment: &Attachment,
        samples: u32,
        depth: bool,
    ) -> Result<Option<CpuTexture>, GraphicError> {
        let texture = self.textures.get(attachment.texture)?;
        let info = texture.info();
        if !info.layout.is_target() {
            return Err(GraphicError::InvalidDescriptor(format!(
                "texture {} is not a render target",
                attachment.texture
            )));
        }
        if info.format.is_depth() != depth {
            return Err(GraphicError::InvalidDescriptor(format!(
                "texture {} has format {:?}",
                attachment.texture, info.format
            )));
        }
        if attachment.level >= info.levels || attachment.layer >= info.layers {
            return Err(GraphicError::InvalidDescriptor(format!(
                "texture {} has no level {} layer {}",
                attachment.texture, attachment.level, attachment.layer
            )));
        }
        if samples <= 1 {
            return Ok(None);
        }
        let (width, height) = info.level_extent(attachment.level);
        Ok(Some(CpuTexture::new(TextureInfo {
            format: info.format,
            layout: TextureLayout::Destination,
            width,
            height,
            layers: 1,
            levels: 1,
            samples,
        })))
    }
}

impl Driver for HeadlessDriver {
    fn initialize(
        &mut self,
        window: Option<RawWindowHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicError> {
        if window.is_some() {
            log::debug!("Headless driver ignores the window handle");
        }
        self.display = Some(Display::new(width.max(1), height.max(1), 1));
        log::info!("Headless driver initialized ({width}x{height})");
        Ok(())
    }

    fn reset(&mut self, width: u32, height: u32, samples: u32) -> Result<(), GraphicError> {
        self.ensure_initialized()?;
        let samples = self.supported_samples(samples);
        self.capabilities.samples = samples;
        self.display = Some(Display::new(width.max(1), height.max(1), samples));
        self.active = None;
        log::debug!("Display reset to {width}x{height} with {samples} samples");
        Ok(())
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_buffer(&mut self, id: Object, descriptor: &BufferDescriptor<'_>) -> Result<(), GraphicError> {
        self.ensure_initialized()?;
        if descriptor.size == 0 {
            return Err(GraphicError::InvalidDescriptor("zero-sized buffer".into()));
        }
        let mut data = vec![0; descriptor.allocation_size() as usize];
        if let Some(initial) = descriptor.data {
            if initial.len() > data.len() {
                return Err(GraphicError::InvalidDescriptor(format!(
                    "{} bytes of initial data for a {} byte buffer",
                    initial.len(),
                    descriptor.size
                )));
            }
            data[..initial.len()].copy_from_slice(initial);
        }
        self.buffers.insert(
            id,
            CpuBuffer {
                usage: descriptor.usage,
                immutable: descriptor.is_immutable(),
                data,
            },
        )
    }

    fn update_buffer(&mut self, id: Object, offset: u32, data: &[u8]) -> Result<(), GraphicError> {
        let buffer = self.buffers.get_mut(id)?;
        if buffer.immutable {
            return Err(GraphicError::InvalidDescriptor(format!(
                "{:?} buffer {id} was created with initial data and is immutable",
                buffer.usage
            )));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.data.len() {
            return Err(GraphicError::InvalidDescriptor(format!(
                "update of {start}..{end} overruns buffer {id} ({} bytes)",
                buffer.data.len()
            )));
        }
        buffer.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn delete_buffer(&mut self, id: Object) -> Result<(), GraphicError> {
        self.buffers.remove(id).map(drop)
    }

    fn create_pass(&mut self, id: Object, descriptor: &PassDescriptor) -> Result<(), GraphicError> {
        self.ensure_initialized()?;
        let samples = self.supported_samples(descriptor.samples);
        let mut colors = Vec::with_capacity(descriptor.colors.len());
        for attachment in &descriptor.colors {
            if let Some(surface) = self.attachment_surface(attachment, samples, false)? {
                colors.push(surface);
            }
        }
        let depth = match &descriptor.depth {
            Some(attachment) => self.attachment_surface(attachment, samples, true)?,
            None => None,
        };
        let mut descriptor = descriptor.clone();
        descriptor.samples = samples;
        self.passes.insert(
            id,
            CpuPass {
                descriptor,
                colors,
                depth,
            },
        )
    }

    fn delete_pass(&mut self, id: Object) -> Result<(), GraphicError> {
        if self.active == Some(id) {
            self.active = None;
        }
        self.passes.remove(id).map(drop)
    }

    fn create_pipeline(&mut self, id: Object, descriptor: &PipelineDescriptor) -> Result<(), GraphicError> {
        self.ensure_initialized()?;
        if self.pipelines.contains(id) {
            return Err(GraphicError::HandleInUse {
                kind: ResourceKind::Pipeline,
                id,
            });
        }
        let binding = self.states.create(&mut self.factory, descriptor)?;
        if let Err(error) = self.pipelines.insert(id, binding) {
            self.states.release(&binding);
            return Err(error);
        }
        self.recorder.bind_pipeline(id, binding);
        log::debug!("Created pipeline {id}: {binding:?}");
        Ok(())
    }

    fn delete_pipeline(&mut self, id: Object) -> Result<(), GraphicError> {
        let binding = self.pipelines.remove(id)?;
        self.states.release(&binding);
        self.recorder.unbind_pipeline(id);
        Ok(())
    }

    fn create_texture(&mut self, id: Object, descriptor: &TextureDescriptor<'_>) -> Result<(), GraphicError> {
        self.ensure_initialized()?;
        let samples = self.supported_samples(descriptor.samples);
        let texture = CpuTexture::from_descriptor(descriptor, samples)?;
        self.textures.insert(id, texture)?;
        log::debug!(
            "Created texture {id}: {}x{} {:?}",
            descriptor.width,
            descriptor.height,
            descriptor.format
        );
        Ok(())
    }

    fn update_texture(&mut self, id: Object, region: &TextureRegion, data: &[u8]) -> Result<(), GraphicError> {
        self.textures.get_mut(id)?.write(region, data)
    }

    fn copy_texture(
        &mut self,
        source: Object,
        region: &TextureRegion,
        destination: Object,
        origin: TextureOrigin,
    ) -> Result<(), GraphicError> {
        if source == destination {
            let texture = self.textures.get_mut(source)?;
            let snapshot = texture.clone();
            return texture.copy_from(&snapshot, region, origin);
        }
        let snapshot = self.textures.get(source)?.clone();
        self.textures.get_mut(destination)?.copy_from(&snapshot, region, origin)
    }

    fn read_texture(&mut self, id: Object, region: &TextureRegion) -> Result<Vec<u8>, GraphicError> {
        self.textures.get(id)?.read(region)
    }

    fn query_texture(&self, id: Object) -> Result<TextureInfo, GraphicError> {
        Ok(*self.textures.get(id)?.info())
    }

    fn delete_texture(&mut self, id: Object) -> Result<(), GraphicError> {
        self.textures.remove(id).map(drop)
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
        self.ensure_initialized()?;
        self.clear_pass(pass, clear, tint, depth, stencil)?;
        self.tracker.reset();
        self.recorder.take();
        self.active = Some(pass);
        self.viewport = viewport;
        self.pass_stats = SubmitStats::default();
        log::trace!("Begin pass {pass} with viewport {viewport:?}");
        Ok(())
    }

    fn submit(&mut self, submissions: &[Submission]) -> Result<SubmitStats, GraphicError> {
        if self.active.is_none() {
            return Err(GraphicError::InvalidDescriptor(
                "submit outside of a begun pass".into(),
            ));
        }
        for submission in submissions {
            self.validate_submission(submission)?;
        }
        let stats = self.tracker.submit(&mut self.recorder, submissions)?;
        self.pass_stats += stats;
        self.frame_stats += stats;
        Ok(stats)
    }

    fn commit(&mut self, pass: Object, vsync: bool) -> Result<(), GraphicError> {
        self.ensure_initialized()?;
        self.resolve_pass(pass)?;
        if self.active == Some(pass) {
            self.active = None;
        }
        if pass.is_none() {
            self.frames += 1;
            self.last_frame = std::mem::take(&mut self.frame_stats);
            log::trace!(
                "Presented frame {} (vsync {vsync}): {} draws, {} state changes",
                self.frames,
                self.last_frame.draws,
                self.last_frame.state_changes
            );
        }
        Ok(())
    }
}
