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

//! Sampler state descriptors.

use super::CompareFunction;

/// Texel filtering applied for minification, magnification or between mips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Nearest texel.
    Point,
    /// Linear interpolation.
    #[default]
    Linear,
}

/// How coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Tile the texture.
    #[default]
    Wrap,
    /// Tile, flipping every other repetition.
    Mirror,
    /// Clamp to the edge texel.
    Clamp,
    /// Use the border color.
    Border,
}

/// Border colors available to [`AddressMode::Border`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderColor {
    /// (0, 0, 0, 0)
    #[default]
    TransparentBlack,
    /// (0, 0, 0, 1)
    OpaqueBlack,
    /// (1, 1, 1, 1)
    OpaqueWhite,
}

/// A sampler, described by value. Equal descriptors share one backend object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDescriptor {
    /// Minification filter.
    pub min_filter: Filter,
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Filter between mip levels.
    pub mip_filter: Filter,
    /// Addressing along U.
    pub address_u: AddressMode,
    /// Addressing along V.
    pub address_v: AddressMode,
    /// Addressing along W.
    pub address_w: AddressMode,
    /// Anisotropy clamp; values above one enable anisotropic filtering.
    pub max_anisotropy: u8,
    /// Turns the sampler into a comparison sampler.
    pub compare: Option<CompareFunction>,
    /// Border color for [`AddressMode::Border`].
    pub border: BorderColor,
}

impl SamplerDescriptor {
    /// Point sampling with clamped addressing.
    pub const POINT_CLAMP: SamplerDescriptor = SamplerDescriptor {
        min_filter: Filter::Point,
        mag_filter: Filter::Point,
        mip_filter: Filter::Point,
        address_u: AddressMode::Clamp,
        address_v: AddressMode::Clamp,
        address_w: AddressMode::Clamp,
        max_anisotropy: 1,
        compare: None,
        border: BorderColor::TransparentBlack,
    };

    /// Trilinear sampling with wrapped addressing.
    pub const LINEAR_WRAP: SamplerDescriptor = SamplerDescriptor {
        min_filter: Filter::Linear,
        mag_filter: Filter::Linear,
        mip_filter: Filter::Linear,
        address_u: AddressMode::Wrap,
        address_v: AddressMode::Wrap,
        address_w: AddressMode::Wrap,
        max_anisotropy: 1,
        compare: None,
        border: BorderColor::TransparentBlack,
    };

    /// Returns `true` if anisotropic filtering is requested.
    pub fn is_anisotropic(&self) -> bool {
        self.max_anisotropy > 1
    }
}
