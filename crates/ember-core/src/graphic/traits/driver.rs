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

use crate::graphic::api::*;
use crate::graphic::error::GraphicError;
use crate::graphic::submit::SubmitStats;
use glam::Vec4;
use raw_window_handle::RawWindowHandle;
use std::fmt::Debug;

/// A graphics backend.
///
/// The driver exclusively owns every backend resource. Callers name resources
/// through [`Object`] handles they allocate themselves (usually through
/// [`GraphicService`](crate::graphic::GraphicService)) and pass to the
/// `create_*` calls. Every fallible call reports failure as a [`GraphicError`].
pub trait Driver: Debug {
    /// Creates the device and, when `window` is given, the swapchain backing
    /// the display pass.
    /// ## Arguments
    /// * `window` - The native window to present to, if any.
    /// * `width` - Initial display width.
    /// * `height` - Initial display height.
    /// ## Errors
    /// * `GraphicError::DeviceUnavailable` - If no device could be created.
    fn initialize(
        &mut self,
        window: Option<RawWindowHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicError>;

    /// Resizes the display pass and changes its sample count.
    fn reset(&mut self, width: u32, height: u32, samples: u32) -> Result<(), GraphicError>;

    /// The capability report filled by `initialize`.
    fn capabilities(&self) -> &Capabilities;

    /// Creates a buffer in slot `id`.
    /// ## Arguments
    /// * `id` - The slot to fill; must be free.
    /// * `descriptor` - Usage, size and optional initial contents.
    fn create_buffer(&mut self, id: Object, descriptor: &BufferDescriptor<'_>)
        -> Result<(), GraphicError>;

    /// Uploads `data` at `offset` into a mutable buffer.
    fn update_buffer(&mut self, id: Object, offset: u32, data: &[u8]) -> Result<(), GraphicError>;

    /// Destroys a buffer, leaving its slot empty.
    fn delete_buffer(&mut self, id: Object) -> Result<(), GraphicError>;

    /// Creates a pass in slot `id` from existing textures.
    fn create_pass(&mut self, id: Object, descriptor: &PassDescriptor) -> Result<(), GraphicError>;

    /// Destroys a pass.
    fn delete_pass(&mut self, id: Object) -> Result<(), GraphicError>;

    /// Compiles a pipeline into slot `id`.
    fn create_pipeline(
        &mut self,
        id: Object,
        descriptor: &PipelineDescriptor,
    ) -> Result<(), GraphicError>;

    /// Destroys a pipeline and releases its interned states.
    fn delete_pipeline(&mut self, id: Object) -> Result<(), GraphicError>;

    /// Creates a texture in slot `id`.
    fn create_texture(
        &mut self,
        id: Object,
        descriptor: &TextureDescriptor<'_>,
    ) -> Result<(), GraphicError>;

    /// Uploads tightly packed texels into `region`.
    fn update_texture(
        &mut self,
        id: Object,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), GraphicError>;

    /// Copies `region` of `source` to `destination` at `origin`.
    fn copy_texture(
        &mut self,
        source: Object,
        region: &TextureRegion,
        destination: Object,
        origin: TextureOrigin,
    ) -> Result<(), GraphicError>;

    /// Reads `region` back to the CPU as tightly packed texels.
    ///
    /// This synchronizes with the GPU and stalls until prior work touching the
    /// texture retires.
    fn read_texture(&mut self, id: Object, region: &TextureRegion) -> Result<Vec<u8>, GraphicError>;

    /// Describes an existing texture.
    fn query_texture(&self, id: Object) -> Result<TextureInfo, GraphicError>;

    /// Destroys a texture.
    fn delete_texture(&mut self, id: Object) -> Result<(), GraphicError>;

    /// Starts rendering into `pass` (`Object::NONE` for the display pass).
    /// ## Arguments
    /// * `viewport` - The viewport rectangle.
    /// * `clear` - Which attachments to clear.
    /// * `tint` - Clear color.
    /// * `depth` - Depth clear value.
    /// * `stencil` - Stencil clear value.
    fn begin(
        &mut self,
        pass: Object,
        viewport: Rect,
        clear: ClearFlags,
        tint: Vec4,
        depth: f32,
        stencil: u8,
    ) -> Result<(), GraphicError>;

    /// Issues `submissions` in order, rebinding only the state that differs
    /// from the previous submission of the current pass.
    fn submit(&mut self, submissions: &[Submission]) -> Result<SubmitStats, GraphicError>;

    /// Finishes `pass`: resolves multisampled targets and, for the display
    /// pass, presents.
    fn commit(&mut self, pass: Object, vsync: bool) -> Result<(), GraphicError>;
}
