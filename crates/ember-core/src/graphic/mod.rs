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

//! The graphics abstraction layer.
//!
//! A [`Driver`](traits::Driver) owns every backend resource and addresses it
//! through [`Object`](api::Object) handles. Per-frame work arrives as a slice
//! of [`Submission`](api::Submission) values which the
//! [`StateTracker`](submit::StateTracker) diffs against each other so only the
//! state that actually changed reaches the backend.

pub mod api;
pub mod cache;
pub mod error;
pub mod recorder;
pub mod service;
pub mod submit;
pub mod traits;

pub use api::*;
pub use cache::{StateCache, StateKey};
pub use error::GraphicError;
pub use recorder::{Command, Recorder};
pub use service::GraphicService;
pub use submit::{StateTracker, SubmitStats};
pub use traits::{CommandContext, Driver, PipelineBinding};
