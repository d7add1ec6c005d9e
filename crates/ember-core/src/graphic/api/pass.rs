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

//! Render-pass descriptors.

use super::Object;
use bitflags::bitflags;

/// A texture mip level (and layer) used as a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attachment {
    /// The target texture.
    pub texture: Object,
    /// Mip level rendered to.
    pub level: u32,
    /// Array layer rendered to.
    pub layer: u32,
}

impl Attachment {
    /// Level zero, layer zero of `texture`.
    pub fn new(texture: Object) -> Self {
        Self {
            texture,
            level: 0,
            layer: 0,
        }
    }
}

/// A render-target configuration.
///
/// When `samples` is above one the pass renders into implicit multisample
/// surfaces owned by the driver, and the color attachments act as resolve
/// targets, resolved at `commit`. The depth attachment must then be a
/// multisample texture with the same sample count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PassDescriptor {
    /// Color targets, at most [`MAX_COLOR_ATTACHMENTS`](super::MAX_COLOR_ATTACHMENTS).
    pub colors: Vec<Attachment>,
    /// Optional depth-stencil target.
    pub depth: Option<Attachment>,
    /// Samples per pixel.
    pub samples: u32,
}

impl PassDescriptor {
    /// Returns `true` if the pass renders multisampled and resolves at commit.
    pub fn is_multisampled(&self) -> bool {
        self.samples > 1
    }
}

bitflags! {
    /// Attachments cleared by `begin`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Clear every color attachment to the tint.
        const COLOR = 1 << 0;
        /// Clear depth to the given value.
        const DEPTH = 1 << 1;
        /// Clear stencil to the given value.
        const STENCIL = 1 << 2;
        /// Clear everything.
        const ALL = Self::COLOR.bits() | Self::DEPTH.bits() | Self::STENCIL.bits();
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// An integer rectangle used for viewports and scissors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Rect {
    /// A rectangle anchored at the origin.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}
