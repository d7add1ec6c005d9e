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

//! HRESULT checking.

use super::com::Com;
use ember_core::graphic::GraphicError;
use std::ptr;
use winapi::shared::winerror::{HRESULT, SUCCEEDED};
use winapi::um::winbase::{
    FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
};
use winapi::Interface;

/// The system description of `hr`.
pub fn describe(hr: HRESULT) -> String {
    let mut buffer = [0u16; 512];
    let length = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            ptr::null(),
            hr as u32,
            0,
            buffer.as_mut_ptr(),
            buffer.len() as u32,
            ptr::null_mut(),
        )
    };
    if length == 0 {
        return format!("HRESULT 0x{:08X}", hr as u32);
    }
    String::from_utf16_lossy(&buffer[..length as usize])
        .trim_end()
        .to_owned()
}

/// Turns a failed `hr` into a logged [`GraphicError::Backend`].
pub fn check(call: &'static str, hr: HRESULT) -> Result<(), GraphicError> {
    if SUCCEEDED(hr) {
        return Ok(());
    }
    let message = describe(hr);
    log::error!("{call} failed: {message}");
    Err(GraphicError::Backend { call, message })
}

/// Runs a creation call writing its object through an out pointer.
pub fn create<T: Interface>(
    call: &'static str,
    create: impl FnOnce(&mut *mut T) -> HRESULT,
) -> Result<Com<T>, GraphicError> {
    let mut raw = ptr::null_mut();
    check(call, create(&mut raw))?;
    unsafe { Com::from_raw(raw) }.ok_or_else(|| GraphicError::Backend {
        call,
        message: "returned a null object".to_owned(),
    })
}
