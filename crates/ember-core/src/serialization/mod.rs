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

//! A compact binary codec: LEB128 varints, native-layout POD values and
//! length-prefixed strings and blocks.
//!
//! Fixed-width values are written in native layout and endianness, so a
//! stream is only portable between machines that agree on both.

mod error;
mod reader;
mod writer;

pub use error::DecodeError;
pub use reader::Reader;
pub use writer::Writer;

/// Unsigned integers that can be encoded as LEB128 varints.
pub trait VarInt: Copy {
    /// Widens the value for encoding.
    fn to_u64(self) -> u64;
    /// Narrows a decoded value, or `None` if it does not fit.
    fn from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_varint {
    ($($ty:ty),*) => {
        $(
            impl VarInt for $ty {
                #[inline]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_u64(value: u64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_varint!(u8, u16, u32, u64, usize);

/// Number of bytes `value` occupies once varint-encoded.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}
