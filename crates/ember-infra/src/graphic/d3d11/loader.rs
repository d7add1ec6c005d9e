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

//! Runtime loading of the Direct3D 11 and DXGI entry points.

use ember_core::graphic::GraphicError;
use std::ffi::c_void;
use std::mem;
use winapi::shared::dxgi::IDXGIAdapter;
use winapi::shared::guiddef::REFIID;
use winapi::shared::minwindef::{HMODULE, UINT};
use winapi::shared::winerror::HRESULT;
use winapi::um::d3d11::{ID3D11Device, ID3D11DeviceContext};
use winapi::um::d3dcommon::{D3D_DRIVER_TYPE, D3D_FEATURE_LEVEL};
use winapi::um::libloaderapi::{FreeLibrary, GetProcAddress, LoadLibraryA};

pub type CreateDeviceFn = unsafe extern "system" fn(
    adapter: *mut IDXGIAdapter,
    driver_type: D3D_DRIVER_TYPE,
    software: HMODULE,
    flags: UINT,
    feature_levels: *const D3D_FEATURE_LEVEL,
    feature_level_count: UINT,
    sdk_version: UINT,
    device: *mut *mut ID3D11Device,
    feature_level: *mut D3D_FEATURE_LEVEL,
    context: *mut *mut ID3D11DeviceContext,
) -> HRESULT;

pub type CreateFactoryFn = unsafe extern "system" fn(riid: REFIID, factory: *mut *mut c_void) -> HRESULT;

/// The loaded system libraries. Unloaded on drop, after every object
/// created through them.
#[derive(Debug)]
pub struct Library {
    d3d11: HMODULE,
    dxgi: HMODULE,
    pub create_device: CreateDeviceFn,
    pub create_factory: CreateFactoryFn,
}

fn module(name: &'static [u8]) -> Result<HMODULE, GraphicError> {
    let module = unsafe { LoadLibraryA(name.as_ptr().cast()) };
    if module.is_null() {
        let name = String::from_utf8_lossy(&name[..name.len() - 1]).into_owned();
        return Err(GraphicError::DeviceUnavailable(format!("cannot load {name}")));
    }
    Ok(module)
}

fn symbol(module: HMODULE, name: &'static [u8]) -> Result<*mut c_void, GraphicError> {
    let address = unsafe { GetProcAddress(module, name.as_ptr().cast()) };
    if address.is_null() {
        let name = String::from_utf8_lossy(&name[..name.len() - 1]).into_owned();
        return Err(GraphicError::DeviceUnavailable(format!("missing entry point {name}")));
    }
    Ok(address.cast())
}

impl Library {
    pub fn load() -> Result<Self, GraphicError> {
        let d3d11 = module(b"d3d11.dll\0")?;
        let dxgi = match module(b"dxgi.dll\0") {
            Ok(dxgi) => dxgi,
            Err(error) => {
                unsafe { FreeLibrary(d3d11) };
                return Err(error);
            }
        };
        let library = |create_device, create_factory| Self {
            d3d11,
            dxgi,
            create_device,
            create_factory,
        };
        let resolved = symbol(d3d11, b"D3D11CreateDevice\0")
            .and_then(|device| Ok((device, symbol(dxgi, b"CreateDXGIFactory1\0")?)));
        match resolved {
            Ok((device, factory)) => unsafe {
                Ok(library(
                    mem::transmute::<*mut c_void, CreateDeviceFn>(device),
                    mem::transmute::<*mut c_void, CreateFactoryFn>(factory),
                ))
            },
            Err(error) => {
                unsafe {
                    FreeLibrary(dxgi);
                    FreeLibrary(d3d11);
                }
                Err(error)
            }
        }
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.dxgi);
            FreeLibrary(self.d3d11);
        }
    }
}
