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

use thiserror::Error;

/// Errors raised while decoding a binary stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The stream ended before the requested value.
    #[error("unexpected end of stream at offset {offset}: needed {needed} bytes, {available} left")]
    UnexpectedEof {
        /// Cursor position when the read was attempted.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the stream.
        available: usize,
    },
    /// A varint did not fit the requested integer type.
    #[error("varint at offset {offset} overflows the target integer")]
    VarintOverflow {
        /// Position of the varint's first byte.
        offset: usize,
    },
    /// A string field was not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Position of the string's first byte.
        offset: usize,
    },
}
