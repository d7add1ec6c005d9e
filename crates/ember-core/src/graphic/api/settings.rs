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

//! Graphics configuration.

use super::GraphicsBackend;
use serde::{Deserialize, Serialize};

/// Settings the graphics service is initialized with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicSettings {
    /// Requested backend; `None` picks the best one available.
    pub backend: Option<GraphicsBackend>,
    /// Initial width of the display pass.
    pub width: u32,
    /// Initial height of the display pass.
    pub height: u32,
    /// Samples per pixel of the display pass.
    pub samples: u32,
    /// Wait for vertical blank on present.
    pub vsync: bool,
}

impl Default for GraphicSettings {
    fn default() -> Self {
        Self {
            backend: None,
            width: 1280,
            height: 720,
            samples: 1,
            vsync: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_partial_ron() {
        let settings: GraphicSettings =
            ron::from_str("(backend: Some(Headless), samples: 4)").unwrap();
        assert_eq!(settings.backend, Some(GraphicsBackend::Headless));
        assert_eq!(settings.samples, 4);
        assert_eq!(settings.width, 1280);
        assert!(settings.vsync);
    }
}
