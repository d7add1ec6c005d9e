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

//! A driver that keeps every resource in CPU memory.
//!
//! Useful wherever no GPU is at hand: tests, tools and CI. It follows the
//! same contract as the hardware backends, interns pipeline state the same
//! way and drives the shared [`StateTracker`] against an internal
//! [`Recorder`], so the issued command stream can be inspected afterwards.

mod driver;
mod texture;

pub use driver::{HeadlessDriver, HeadlessPipelineStates, HeadlessStates};
