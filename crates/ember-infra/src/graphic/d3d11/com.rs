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

//! Owned COM references.

use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use winapi::shared::winerror::{E_POINTER, HRESULT, SUCCEEDED};
use winapi::um::unknwnbase::IUnknown;
use winapi::Interface;

/// One reference to a COM object, released on drop.
pub struct Com<T: Interface>(NonNull<T>);

impl<T: Interface> Com<T> {
    /// Takes ownership of one reference held by `raw`.
    ///
    /// # Safety
    /// `raw` must be null or point to a live object of interface `T` whose
    /// reference the caller gives up.
    pub unsafe fn from_raw(raw: *mut T) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_ptr(&self) -> *mut T {
        self.0.as_ptr()
    }

    fn unknown(&self) -> &IUnknown {
        // Every COM interface starts with the IUnknown vtable.
        unsafe { &*(self.as_ptr() as *const IUnknown) }
    }

    /// Queries the object for interface `U`.
    pub fn cast<U: Interface>(&self) -> Result<Com<U>, HRESULT> {
        let mut raw = ptr::null_mut();
        let hr = unsafe { self.unknown().QueryInterface(&U::uuidof(), &mut raw) };
        if !SUCCEEDED(hr) {
            return Err(hr);
        }
        unsafe { Com::from_raw(raw as *mut U) }.ok_or(E_POINTER)
    }
}

impl<T: Interface> Clone for Com<T> {
    fn clone(&self) -> Self {
        unsafe { self.unknown().AddRef() };
        Self(self.0)
    }
}

impl<T: Interface> Drop for Com<T> {
    fn drop(&mut self) {
        unsafe { self.unknown().Release() };
    }
}

impl<T: Interface> Deref for Com<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { self.0.as_ref() }
    }
}

impl<T: Interface> PartialEq for Com<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Interface> fmt::Debug for Com<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Com({:p})", self.0)
    }
}

/// Raw pointer of an optional object, null for `None`.
pub fn raw_or_null<T: Interface>(object: Option<&Com<T>>) -> *mut T {
    object.map_or(ptr::null_mut(), Com::as_ptr)
}
