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

//! Engine configuration loaded from RON.

use anyhow::{Context, Result};
use ember_core::graphic::GraphicSettings;
use ember_data::scene::SceneSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a [`Kernel`](crate::Kernel) is configured with.
///
/// Every field is optional in the source text; missing ones keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Graphics service settings.
    pub graphic: GraphicSettings,
    /// Scene service settings.
    pub scene: SceneSettings,
    /// Frames to run before stopping. `0` runs until the application exits.
    pub frames: u64,
}

impl EngineConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).context("Failed to parse the engine configuration")
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_ron_str(&source)?;
        log::info!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Serializes the configuration to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).context("Failed to serialize the engine configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::graphic::GraphicsBackend;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_ron_str(
            "(graphic: (backend: Some(Headless), width: 320), frames: 4)",
        )
        .unwrap();

        assert_eq!(config.graphic.backend, Some(GraphicsBackend::Headless));
        assert_eq!(config.graphic.width, 320);
        assert_eq!(config.graphic.height, 720);
        assert_eq!(config.scene, SceneSettings::default());
        assert_eq!(config.frames, 4);
    }

    #[test]
    fn test_pretty_text_parses_back() {
        let mut config = EngineConfig::default();
        config.graphic.samples = 4;
        config.scene.threads = 2;

        let text = config.to_ron_string().unwrap();

        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(EngineConfig::from_ron_str("(frames: \"many\")").is_err());
        assert!(EngineConfig::load("does/not/exist.ron").is_err());
    }
}
