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

use super::headless::HeadlessDriver;
use ember_core::graphic::{Driver, GraphicsBackend};

/// Picks the driver for `preference`.
///
/// Direct3D 11 is used on Windows when it is requested (or nothing is) and
/// a window exists to present to. Every other combination gets the
/// headless driver.
///
/// ## Arguments
/// * `preference` - The configured backend, `None` to let the platform decide.
/// * `has_window` - Whether the caller will pass a window to `initialize`.
pub fn create_driver(preference: Option<GraphicsBackend>, has_window: bool) -> Box<dyn Driver> {
    let wants_d3d11 = matches!(preference, None | Some(GraphicsBackend::D3D11));
    if wants_d3d11 && has_window {
        #[cfg(windows)]
        {
            log::info!("Selected the Direct3D 11 backend");
            return Box::new(super::d3d11::D3D11Driver::new());
        }
        #[cfg(not(windows))]
        {
            if preference.is_some() {
                log::warn!("Direct3D 11 is only available on Windows, falling back to headless");
            }
        }
    } else if preference == Some(GraphicsBackend::D3D11) {
        log::warn!("Direct3D 11 needs a window, falling back to headless");
    }
    log::info!("Selected the headless backend");
    Box::new(HeadlessDriver::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_when_requested_or_windowless() {
        let requested = create_driver(Some(GraphicsBackend::Headless), true);
        assert_eq!(requested.capabilities().backend, GraphicsBackend::Headless);

        let windowless = create_driver(Some(GraphicsBackend::D3D11), false);
        assert_eq!(windowless.capabilities().backend, GraphicsBackend::Headless);

        let automatic = create_driver(None, false);
        assert_eq!(automatic.capabilities().backend, GraphicsBackend::Headless);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_d3d11_falls_back_off_windows() {
        let driver = create_driver(Some(GraphicsBackend::D3D11), true);
        assert_eq!(driver.capabilities().backend, GraphicsBackend::Headless);
    }
}
