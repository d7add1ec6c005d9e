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

//! Device creation, adapter enumeration and capability probing.

use super::com::Com;
use super::error::{check, create, describe};
use super::loader::Library;
use ember_core::graphic::{
    AdapterInfo, DisplayMode, GraphicError, SampleTable, ShaderModel, MAX_SAMPLES,
};
use std::ffi::c_void;
use std::mem;
use std::ptr;
use winapi::shared::dxgi::*;
use winapi::shared::dxgi1_2::*;
use winapi::shared::dxgi1_5::*;
use winapi::shared::dxgiformat::*;
use winapi::shared::dxgitype::*;
use winapi::shared::minwindef::BOOL;
use winapi::shared::windef::HWND;
use winapi::shared::winerror::{DXGI_ERROR_NOT_FOUND, E_INVALIDARG};
use winapi::um::d3d11::*;
use winapi::um::d3d11_1::ID3D11DeviceContext1;
use winapi::um::d3dcommon::*;
use winapi::um::unknwnbase::IUnknown;
use winapi::Interface;

/// Feature levels tried in order.
const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 7] = [
    D3D_FEATURE_LEVEL_11_1,
    D3D_FEATURE_LEVEL_11_0,
    D3D_FEATURE_LEVEL_10_1,
    D3D_FEATURE_LEVEL_10_0,
    D3D_FEATURE_LEVEL_9_3,
    D3D_FEATURE_LEVEL_9_2,
    D3D_FEATURE_LEVEL_9_1,
];

/// Format the display is created in.
pub const DISPLAY_FORMAT: DXGI_FORMAT = DXGI_FORMAT_B8G8R8A8_UNORM;

/// A created device with its immediate context.
#[derive(Debug)]
pub struct Device {
    pub device: Com<ID3D11Device>,
    pub context: Com<ID3D11DeviceContext1>,
    pub factory: Com<IDXGIFactory1>,
    pub feature_level: D3D_FEATURE_LEVEL,
    pub software: bool,
}

impl Device {
    /// Creates a hardware device, falling back to WARP.
    pub fn open(library: &Library) -> Result<Self, GraphicError> {
        let factory: Com<IDXGIFactory1> = create("CreateDXGIFactory1", |out| unsafe {
            (library.create_factory)(&IDXGIFactory1::uuidof(), (out as *mut *mut IDXGIFactory1).cast())
        })?;

        let (device, context, feature_level, software) =
            match create_device(library, D3D_DRIVER_TYPE_HARDWARE) {
                Ok((device, context, level)) => {
                    log::info!("Created hardware D3D11 device at {}", level_name(level));
                    (device, context, level, false)
                }
                Err(hardware) => {
                    log::warn!("Hardware D3D11 device unavailable ({hardware}), trying WARP");
                    let (device, context, level) = create_device(library, D3D_DRIVER_TYPE_WARP)
                        .map_err(|warp| GraphicError::DeviceUnavailable(warp.to_string()))?;
                    log::info!("Created WARP D3D11 device at {}", level_name(level));
                    (device, context, level, true)
                }
            };

        let context = context.cast::<ID3D11DeviceContext1>().map_err(|hr| {
            GraphicError::DeviceUnavailable(format!(
                "ID3D11DeviceContext1 unavailable: {}",
                describe(hr)
            ))
        })?;

        Ok(Self {
            device,
            context,
            factory,
            feature_level,
            software,
        })
    }

    /// Shader model implied by the feature level.
    pub fn shader_model(&self) -> ShaderModel {
        match self.feature_level {
            D3D_FEATURE_LEVEL_11_1 | D3D_FEATURE_LEVEL_11_0 => ShaderModel::new(5, 0),
            D3D_FEATURE_LEVEL_10_1 => ShaderModel::new(4, 1),
            D3D_FEATURE_LEVEL_10_0 => ShaderModel::new(4, 0),
            _ => ShaderModel::new(2, 0),
        }
    }

    /// Whether presenting without vsync may tear.
    pub fn supports_tearing(&self) -> bool {
        let Ok(factory) = self.factory.cast::<IDXGIFactory5>() else {
            return false;
        };
        let mut allowed: BOOL = 0;
        let hr = unsafe {
            factory.CheckFeatureSupport(
                DXGI_FEATURE_PRESENT_ALLOW_TEARING,
                (&mut allowed as *mut BOOL).cast::<c_void>(),
                mem::size_of::<BOOL>() as u32,
            )
        };
        check("IDXGIFactory5::CheckFeatureSupport", hr).is_ok() && allowed != 0
    }

    /// Probes multisample support for the display format.
    pub fn sample_table(&self) -> SampleTable {
        SampleTable::build(MAX_SAMPLES, |count| {
            let mut levels = 0;
            let hr = unsafe {
                self.device
                    .CheckMultisampleQualityLevels(DISPLAY_FORMAT, count, &mut levels)
            };
            // A failed query counts as unsupported.
            match check("ID3D11Device::CheckMultisampleQualityLevels", hr) {
                Ok(()) => levels,
                Err(_) => 0,
            }
        })
    }

    /// Lists every adapter with its display modes.
    pub fn adapters(&self) -> Vec<AdapterInfo> {
        let mut adapters = Vec::new();
        for index in 0.. {
            let mut raw = ptr::null_mut();
            let hr = unsafe { self.factory.EnumAdapters1(index, &mut raw) };
            if hr == DXGI_ERROR_NOT_FOUND {
                break;
            }
            let Some(adapter) = (unsafe { Com::from_raw(raw) }) else {
                break;
            };
            if check("IDXGIFactory1::EnumAdapters1", hr).is_err() {
                break;
            }
            let mut desc: DXGI_ADAPTER_DESC1 = unsafe { mem::zeroed() };
            if check("IDXGIAdapter1::GetDesc1", unsafe { adapter.GetDesc1(&mut desc) }).is_err() {
                continue;
            }
            let length = desc.Description.iter().position(|&c| c == 0).unwrap_or(desc.Description.len());
            let info = AdapterInfo {
                name: String::from_utf16_lossy(&desc.Description[..length]),
                vendor: desc.VendorId,
                device: desc.DeviceId,
                dedicated_memory: desc.DedicatedVideoMemory as u64,
                software: desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE != 0,
                displays: display_modes(&adapter),
            };
            log::debug!(
                "Adapter {index}: {} ({} display modes)",
                info.name,
                info.displays.len()
            );
            adapters.push(info);
        }
        adapters
    }

    /// Creates a flip-model swapchain for `hwnd`.
    pub fn swapchain(
        &self,
        hwnd: HWND,
        width: u32,
        height: u32,
        tearing: bool,
    ) -> Result<Com<IDXGISwapChain1>, GraphicError> {
        let factory = self.factory.cast::<IDXGIFactory2>().map_err(|hr| {
            GraphicError::DeviceUnavailable(format!("IDXGIFactory2 unavailable: {}", describe(hr)))
        })?;
        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width,
            Height: height,
            Format: DISPLAY_FORMAT,
            Stereo: 0,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 2,
            Scaling: DXGI_SCALING_STRETCH,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            AlphaMode: DXGI_ALPHA_MODE_UNSPECIFIED,
            Flags: swapchain_flags(tearing),
        };
        let swapchain = create("CreateSwapChainForHwnd", |out| unsafe {
            factory.CreateSwapChainForHwnd(
                self.device.as_ptr() as *mut IUnknown,
                hwnd,
                &desc,
                ptr::null(),
                ptr::null_mut(),
                out,
            )
        })?;
        check("MakeWindowAssociation", unsafe {
            self.factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER)
        })?;
        Ok(swapchain)
    }
}

/// Swapchain creation flags.
pub fn swapchain_flags(tearing: bool) -> u32 {
    if tearing {
        DXGI_SWAP_CHAIN_FLAG_ALLOW_TEARING
    } else {
        0
    }
}

type Created = (Com<ID3D11Device>, Com<ID3D11DeviceContext>, D3D_FEATURE_LEVEL);

fn create_device(library: &Library, driver: D3D_DRIVER_TYPE) -> Result<Created, GraphicError> {
    let attempt = |levels: &[D3D_FEATURE_LEVEL]| {
        let mut device = ptr::null_mut();
        let mut context = ptr::null_mut();
        let mut level = 0;
        let hr = unsafe {
            (library.create_device)(
                ptr::null_mut(),
                driver,
                ptr::null_mut(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                levels.as_ptr(),
                levels.len() as u32,
                D3D11_SDK_VERSION,
                &mut device,
                &mut level,
                &mut context,
            )
        };
        (hr, device, context, level)
    };

    let (mut hr, mut device, mut context, mut level) = attempt(&FEATURE_LEVELS);
    // Runtimes without 11.1 reject the whole list.
    if hr == E_INVALIDARG {
        (hr, device, context, level) = attempt(&FEATURE_LEVELS[1..]);
    }
    check("D3D11CreateDevice", hr)?;
    let device = unsafe { Com::from_raw(device) };
    let context = unsafe { Com::from_raw(context) };
    match (device, context) {
        (Some(device), Some(context)) => Ok((device, context, level)),
        _ => Err(GraphicError::DeviceUnavailable(
            "D3D11CreateDevice returned no device".into(),
        )),
    }
}

fn display_modes(adapter: &Com<IDXGIAdapter1>) -> Vec<DisplayMode> {
    let mut modes = Vec::new();
    for index in 0.. {
        let mut raw = ptr::null_mut();
        let hr = unsafe { adapter.EnumOutputs(index, &mut raw) };
        let Some(output) = (unsafe { Com::<IDXGIOutput>::from_raw(raw) }) else {
            break;
        };
        if check("IDXGIAdapter1::EnumOutputs", hr).is_err() {
            break;
        }
        let mut count = 0;
        let hr = unsafe { output.GetDisplayModeList(DISPLAY_FORMAT, 0, &mut count, ptr::null_mut()) };
        if check("IDXGIOutput::GetDisplayModeList", hr).is_err() || count == 0 {
            continue;
        }
        let mut descs: Vec<DXGI_MODE_DESC> = vec![unsafe { mem::zeroed() }; count as usize];
        let hr = unsafe { output.GetDisplayModeList(DISPLAY_FORMAT, 0, &mut count, descs.as_mut_ptr()) };
        if check("IDXGIOutput::GetDisplayModeList", hr).is_err() {
            continue;
        }
        modes.extend(descs.iter().take(count as usize).map(|desc| DisplayMode {
            width: desc.Width,
            height: desc.Height,
            refresh_numerator: desc.RefreshRate.Numerator,
            refresh_denominator: desc.RefreshRate.Denominator,
        }));
    }
    modes
}

fn level_name(level: D3D_FEATURE_LEVEL) -> &'static str {
    match level {
        D3D_FEATURE_LEVEL_11_1 => "feature level 11_1",
        D3D_FEATURE_LEVEL_11_0 => "feature level 11_0",
        D3D_FEATURE_LEVEL_10_1 => "feature level 10_1",
        D3D_FEATURE_LEVEL_10_0 => "feature level 10_0",
        D3D_FEATURE_LEVEL_9_3 => "feature level 9_3",
        D3D_FEATURE_LEVEL_9_2 => "feature level 9_2",
        _ => "feature level 9_1",
    }
}
