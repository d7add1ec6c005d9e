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

use serde::{Deserialize, Serialize};

/// Scene service options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Worker threads available to systems. `0` uses one per logical core.
    pub threads: usize,
}

impl SceneSettings {
    /// The worker count with `0` resolved to the number of logical cores.
    pub fn resolved_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threads_resolves_to_the_core_count() {
        let settings = SceneSettings::default();
        assert!(settings.resolved_threads() >= 1);
        assert_eq!(SceneSettings { threads: 3 }.resolved_threads(), 3);
    }

    #[test]
    fn test_parses_from_ron() {
        let settings: SceneSettings = ron::from_str("(threads: 2)").unwrap();
        assert_eq!(settings.threads, 2);
        let settings: SceneSettings = ron::from_str("()").unwrap();
        assert_eq!(settings, SceneSettings::default());
    }
}
