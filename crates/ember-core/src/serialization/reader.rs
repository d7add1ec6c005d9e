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

use super::{DecodeError, VarInt};

/// A cursor decoding values from a borrowed byte slice.
///
/// Every read checks the remaining length and reports truncation as
/// [`DecodeError::UnexpectedEof`], so a corrupt stream fails loudly instead
/// of producing zeroed values.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Starts reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes left to read.
    pub fn available(&self) -> usize {
        self.data.len() - self.position
    }

    /// Current cursor offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Advances the cursor by `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.take(count).map(|_| ())
    }

    /// Reads a LEB128 varint into `T`.
    pub fn read_int<T: VarInt>(&mut self) -> Result<T, DecodeError> {
        let start = self.position;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let [byte] = self.take_array::<1>()?;
            let bits = (byte & 0x7F) as u64;
            if shift >= 64 || (shift == 63 && bits > 1) {
                return Err(DecodeError::VarintOverflow { offset: start });
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        T::from_u64(value).ok_or(DecodeError::VarintOverflow { offset: start })
    }

    /// Reads a POD value from its raw memory representation.
    pub fn read<T: bytemuck::Pod>(&mut self) -> Result<T, DecodeError> {
        let bytes = self.take(std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Decodes a POD value without moving the cursor.
    pub fn peek<T: bytemuck::Pod>(&self) -> Result<T, DecodeError> {
        let size = std::mem::size_of::<T>();
        if self.available() < size {
            return Err(self.eof(size));
        }
        Ok(bytemuck::pod_read_unaligned(
            &self.data[self.position..self.position + size],
        ))
    }

    /// Reads `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        self.take(count)
    }

    /// Reads a varint-length-prefixed UTF-8 string.
    pub fn read_string8(&mut self) -> Result<&'a str, DecodeError> {
        let offset = self.position;
        let bytes = self.read_block()?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    /// Reads a varint-length-prefixed byte span.
    pub fn read_block(&mut self) -> Result<&'a [u8], DecodeError> {
        let length = self.read_int::<usize>()?;
        self.take(length)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if self.available() < count {
            return Err(self.eof(count));
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    fn eof(&self, needed: usize) -> DecodeError {
        DecodeError::UnexpectedEof {
            offset: self.position,
            needed,
            available: self.available(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::Writer;

    #[test]
    fn test_reads_back_mixed_stream() {
        let mut writer = Writer::new();
        writer.write_string8("Hero");
        writer.write(42u16);
        writer.write_block(&[1, 2, 3]);
        writer.write_int(70_000u32);

        let mut reader = Reader::new(writer.as_slice());
        assert_eq!(reader.read_string8().unwrap(), "Hero");
        assert_eq!(reader.read::<u16>().unwrap(), 42);
        assert_eq!(reader.read_block().unwrap(), &[1, 2, 3]);
        assert_eq!(reader.read_int::<u32>().unwrap(), 70_000);
        assert_eq!(reader.available(), 0);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut writer = Writer::new();
        writer.write(u32::MAX);
        let mut reader = Reader::new(writer.as_slice());
        assert_eq!(reader.peek::<u32>().unwrap(), u32::MAX);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read::<u32>().unwrap(), u32::MAX);
    }

    #[test]
    fn test_reading_past_end_is_an_error() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read::<u32>(),
            Err(DecodeError::UnexpectedEof {
                offset: 0,
                needed: 4,
                available: 2
            })
        );
        // The failed read leaves the cursor untouched.
        assert_eq!(reader.read::<u16>().unwrap(), u16::from_ne_bytes([1, 2]));
        assert!(reader.peek::<u32>().is_err());
    }

    #[test]
    fn test_truncated_block_and_varint_fail() {
        let mut reader = Reader::new(&[0x05, b'a', b'b']);
        assert!(matches!(
            reader.read_block(),
            Err(DecodeError::UnexpectedEof { needed: 5, .. })
        ));

        let mut reader = Reader::new(&[0x80, 0x80]);
        assert!(reader.read_int::<u32>().is_err());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut reader = Reader::new(&[0x02, 0xC3, 0x28]);
        assert_eq!(
            reader.read_string8(),
            Err(DecodeError::InvalidUtf8 { offset: 0 })
        );
    }

    #[test]
    fn test_overlong_varint_overflows() {
        let bytes = [0xFF; 11];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_int::<u64>(),
            Err(DecodeError::VarintOverflow { offset: 0 })
        ));
    }
}
