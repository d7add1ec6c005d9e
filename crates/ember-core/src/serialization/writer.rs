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

use super::VarInt;

/// Appends encoded values to a growable byte buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Writes `value` as a LEB128 varint: 7 data bits per byte, high bit set
    /// on every byte but the last.
    pub fn write_int<T: VarInt>(&mut self, value: T) {
        let mut value = value.to_u64();
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.push(byte);
                return;
            }
            self.buffer.push(byte | 0x80);
        }
    }

    /// Writes the raw memory of a POD value.
    pub fn write<T: bytemuck::Pod>(&mut self, value: T) {
        self.buffer.extend_from_slice(bytemuck::bytes_of(&value));
    }

    /// Writes raw bytes with no framing.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a varint length followed by the string's bytes.
    pub fn write_string8(&mut self, value: &str) {
        self.write_block(value.as_bytes());
    }

    /// Writes a varint length followed by an opaque byte span.
    pub fn write_block(&mut self, block: &[u8]) {
        self.write_int(block.len());
        self.write_bytes(block);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The encoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
