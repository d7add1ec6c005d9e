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

//! Defines the error type of the graphics subsystem.

use crate::graphic::api::{Object, ResourceKind};
use thiserror::Error;

/// An error raised by a [`Driver`](crate::graphic::Driver) or the graphics service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicError {
    /// The handle is zero, out of range or names an empty slot.
    #[error("invalid {kind} handle {id}")]
    InvalidHandle {
        /// The table that was addressed.
        kind: ResourceKind,
        /// The offending handle.
        id: Object,
    },
    /// A create call targeted a slot that already holds a resource.
    #[error("{kind} handle {id} is already in use")]
    HandleInUse {
        /// The table that was addressed.
        kind: ResourceKind,
        /// The occupied handle.
        id: Object,
    },
    /// No handle is left for this resource kind.
    #[error("no free {kind} handle left")]
    Exhausted {
        /// The exhausted table.
        kind: ResourceKind,
    },
    /// A backend call reported failure.
    #[error("{call} failed: {message}")]
    Backend {
        /// Name of the failing call.
        call: &'static str,
        /// The OS-formatted failure message.
        message: String,
    },
    /// A descriptor was rejected before reaching the backend.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    /// The driver was used before a successful `initialize`.
    #[error("the driver is not initialized")]
    NotInitialized,
    /// Neither a hardware nor a software device could be created.
    #[error("no usable graphics device: {0}")]
    DeviceUnavailable(String),
    /// The operation is not supported on this backend.
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}
