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

//! The Direct3D 11 backend.

mod com;
mod context;
mod conversions;
mod device;
mod driver;
mod error;
mod loader;
mod resources;
mod states;

pub use conversions::IntoD3D11;
pub use driver::D3D11Driver;
pub use states::D3D11States;
