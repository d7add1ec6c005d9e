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

use super::component::Component;
use ember_core::serialization::{DecodeError, Reader, Writer};
use std::any::Any;
use std::fmt;

/// A component value that can be written to and read back from a scene file.
///
/// `deserialize` updates `self` in place, so fields missing from the stream
/// keep their current value.
pub trait Serializable {
    /// Appends the value to `writer`.
    fn serialize(&self, writer: &mut Writer);

    /// Reads the value back from `reader`.
    ///
    /// ## Arguments
    /// * `reader` - A reader positioned at the start of the value, bounded to
    ///   the bytes the value was written with.
    fn deserialize(&mut self, reader: &mut Reader<'_>) -> Result<(), DecodeError>;
}

/// Implements [`Serializable`] for `Pod` types as their raw bytes.
#[macro_export]
macro_rules! pod_serializable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::ecs::Serializable for $ty {
                fn serialize(&self, writer: &mut $crate::ember_core::serialization::Writer) {
                    writer.write(*self);
                }

                fn deserialize(
                    &mut self,
                    reader: &mut $crate::ember_core::serialization::Reader<'_>,
                ) -> Result<(), $crate::ember_core::serialization::DecodeError> {
                    *self = reader.read()?;
                    Ok(())
                }
            }
        )*
    };
}

/// Encodes a type-erased component value.
pub type EncodeFn = fn(&dyn Any, &mut Writer);
/// Decodes into a type-erased component value.
pub type DecodeFn = fn(&mut dyn Any, &mut Reader<'_>) -> Result<(), DecodeError>;

/// Serialization hooks attached to a component entity.
///
/// A component is saved and loaded only when its entity carries a `Factory`
/// with both hooks present.
#[derive(Clone, Copy, Default)]
pub struct Factory {
    /// Writes a value of the component.
    pub encode: Option<EncodeFn>,
    /// Reads a value of the component.
    pub decode: Option<DecodeFn>,
}

impl Component for Factory {}

impl Factory {
    /// Builds the hooks for `T`.
    pub fn of<T: Component + Serializable>() -> Self {
        Self {
            encode: Some(encode_erased::<T>),
            decode: Some(decode_erased::<T>),
        }
    }

    /// Returns `true` when both hooks are present.
    pub fn is_complete(&self) -> bool {
        self.encode.is_some() && self.decode.is_some()
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("encode", &self.encode.is_some())
            .field("decode", &self.decode.is_some())
            .finish()
    }
}

fn encode_erased<T: Serializable + 'static>(value: &dyn Any, writer: &mut Writer) {
    if let Some(value) = value.downcast_ref::<T>() {
        value.serialize(writer);
    }
}

fn decode_erased<T: Serializable + 'static>(
    value: &mut dyn Any,
    reader: &mut Reader<'_>,
) -> Result<(), DecodeError> {
    match value.downcast_mut::<T>() {
        Some(value) => value.deserialize(reader),
        None => Ok(()),
    }
}
