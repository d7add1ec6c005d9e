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

//! Backend capability reports.

use super::{GraphicsBackend, MAX_SAMPLES};

/// The highest shader model a device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ShaderModel {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl ShaderModel {
    /// Builds a shader model version.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

/// A display mode supported by an adapter output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayMode {
    /// Horizontal resolution.
    pub width: u32,
    /// Vertical resolution.
    pub height: u32,
    /// Refresh rate numerator.
    pub refresh_numerator: u32,
    /// Refresh rate denominator.
    pub refresh_denominator: u32,
}

/// Description of one graphics adapter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdapterInfo {
    /// Human-readable adapter name.
    pub name: String,
    /// PCI vendor id.
    pub vendor: u32,
    /// PCI device id.
    pub device: u32,
    /// Dedicated video memory in bytes.
    pub dedicated_memory: u64,
    /// Software rasterizer flag.
    pub software: bool,
    /// Display modes of the adapter's outputs, deduplicated.
    pub displays: Vec<DisplayMode>,
}

/// A backend-specific multisample descriptor for one sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleQuality {
    /// Samples per pixel actually used.
    pub count: u32,
    /// Backend quality level.
    pub quality: u32,
}

/// Maps every sample count in `[1, MAX_SAMPLES]` to a valid descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleTable {
    entries: [SampleQuality; MAX_SAMPLES as usize],
}

impl Default for SampleTable {
    fn default() -> Self {
        Self::build(1, |_| 0)
    }
}

impl SampleTable {
    /// Builds the table by probing counts up to `max`.
    ///
    /// `quality_levels(count)` reports the number of quality levels the device
    /// supports for `count` samples. A count that reports zero levels, or lies
    /// above `max`, reuses the entry of the nearest lower count, so every
    /// lookup resolves to a usable descriptor.
    pub fn build(max: u32, mut quality_levels: impl FnMut(u32) -> u32) -> Self {
        let mut entries = [SampleQuality {
            count: 1,
            quality: 0,
        }; MAX_SAMPLES as usize];
        for count in 2..=MAX_SAMPLES {
            let index = count as usize - 1;
            let levels = if count <= max { quality_levels(count) } else { 0 };
            entries[index] = if levels > 0 {
                SampleQuality {
                    count,
                    quality: levels - 1,
                }
            } else {
                entries[index - 1]
            };
        }
        Self { entries }
    }

    /// The descriptor for `samples`, clamped to `[1, MAX_SAMPLES]`.
    pub fn get(&self, samples: u32) -> SampleQuality {
        let index = samples.clamp(1, MAX_SAMPLES) as usize - 1;
        self.entries[index]
    }

    /// Sample counts the device natively supports.
    pub fn supported(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(index, entry)| entry.count as usize == index + 1)
            .map(|(_, entry)| entry.count)
    }
}

/// Read-only description of what the active backend supports.
///
/// Filled once by `initialize`; only `samples` changes afterwards, on `reset`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The backend that produced the report.
    pub backend: GraphicsBackend,
    /// Highest shader model.
    pub shader_model: ShaderModel,
    /// Variable-refresh (tearing) presentation support.
    pub tearing: bool,
    /// Enumerated adapters, the active one first.
    pub adapters: Vec<AdapterInfo>,
    /// Multisample table of the display format.
    pub sample_table: SampleTable,
    /// Current sample count of the display pass.
    pub samples: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_count_resolves_to_a_descriptor() {
        // Only 4 and 8 samples are natively supported.
        let table = SampleTable::build(MAX_SAMPLES, |count| match count {
            4 => 3,
            8 => 1,
            _ => 0,
        });

        for samples in 1..=MAX_SAMPLES {
            let entry = table.get(samples);
            assert!(entry.count >= 1 && entry.count <= samples);
        }
        assert_eq!(table.get(2), SampleQuality { count: 1, quality: 0 });
        assert_eq!(table.get(4), SampleQuality { count: 4, quality: 2 });
        assert_eq!(table.get(6), SampleQuality { count: 4, quality: 2 });
        assert_eq!(table.get(16), SampleQuality { count: 8, quality: 0 });
        assert_eq!(table.supported().collect::<Vec<_>>(), vec![1, 4, 8]);
    }

    #[test]
    fn test_counts_above_max_are_not_probed() {
        let mut probed = Vec::new();
        let table = SampleTable::build(4, |count| {
            probed.push(count);
            1
        });
        assert_eq!(probed, vec![2, 3, 4]);
        assert_eq!(table.get(16).count, 4);
        assert_eq!(table.get(0).count, 1);
    }
}
