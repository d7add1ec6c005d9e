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

//! Backend-agnostic graphics types: handles, descriptors and submissions.

pub mod buffer;
pub mod capabilities;
pub mod enums;
pub mod object;
pub mod pass;
pub mod pipeline;
pub mod sampler;
pub mod settings;
pub mod submission;
pub mod texture;

pub use self::buffer::*;
pub use self::capabilities::*;
pub use self::enums::*;
pub use self::object::*;
pub use self::pass::*;
pub use self::pipeline::*;
pub use self::sampler::*;
pub use self::settings::*;
pub use self::submission::*;
pub use self::texture::*;
