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

//! The public-facing SDK of the Ember engine.
//!
//! A [`Kernel`] owns the graphics service and the scene, and drives an
//! [`Application`] through a fixed frame loop.

#![warn(missing_docs)]

pub mod config;
pub mod kernel;
pub mod logging;

pub use config::EngineConfig;
pub use kernel::{Application, Control, Kernel};

pub use ember_core;
pub use ember_data;
pub use ember_infra;

/// The types most applications need.
pub mod prelude {
    pub use crate::{Application, Control, EngineConfig, Kernel};
    pub use ember_core::graphic::{
        Attachment, BlendState, BufferDescriptor, BufferUsage, ClearFlags, DepthStencilState,
        GraphicService, GraphicSettings, GraphicsBackend, Object, PassDescriptor,
        PipelineDescriptor, Primitive, PrimitiveTopology, RasterizerState, Rect, ShaderStage,
        Stream, Submission, TextureDescriptor, TextureFormat, TextureLayout, TextureRegion,
        VertexAttribute, VertexFormat,
    };
    pub use ember_core::serialization::{Reader, Writer};
    pub use ember_data::ecs::{Component, Entity, World};
    pub use ember_data::scene::{Scene, SceneSettings};
}
