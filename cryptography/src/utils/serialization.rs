// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Challenge and transport serialization.
//!
//! Defines the variable-length serialization traits used to build
//! Fiat-Shamir challenge transcripts and compact wire encodings.
//!
//! * NOTE: It is the responsibility of the implementor to ensure consistency
//!   across builds. Changes to implementations can break challenge and data
//!   transfer functionality entirely. **In particular, serialization
//!   inconsistencies can cause otherwise valid proofs to fail.**
//!
//! Group elements and scalars additionally implement `serde` traits over
//! their canonical byte encodings (hex strings in human-readable formats),
//! which is what store records and persisted handler state use.

use crate::utils::error::Error;

/// Types that serialize to a variable-length byte sequence.
pub trait VSerializable {
    /// Serialize this value into bytes.
    fn ser(&self) -> Vec<u8>;
}

/// Types that deserialize from a variable-length byte sequence.
pub trait VDeserializable: Sized {
    /// Deserialize a value from the given bytes.
    ///
    /// # Errors
    ///
    /// - `DeserializationError` if the bytes do not encode a valid value
    fn deser(buffer: &[u8]) -> Result<Self, Error>;
}

impl<T: VSerializable> VSerializable for [T] {
    fn ser(&self) -> Vec<u8> {
        let mut out = (self.len() as u32).to_be_bytes().to_vec();
        for item in self {
            let bytes = item.ser();
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(&bytes);
        }
        out
    }
}

impl<T: VSerializable> VSerializable for Vec<T> {
    fn ser(&self) -> Vec<u8> {
        self.as_slice().ser()
    }
}

impl<T: VDeserializable> VDeserializable for Vec<T> {
    fn deser(buffer: &[u8]) -> Result<Self, Error> {
        let count = read_u32(buffer, 0)? as usize;
        let mut pos = 4;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let len = read_u32(buffer, pos)? as usize;
            pos += 4;
            let slice = get_slice(buffer, pos..pos + len)?;
            out.push(T::deser(slice)?);
            pos += len;
        }
        Ok(out)
    }
}

impl VSerializable for u32 {
    fn ser(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }
}

impl VDeserializable for u32 {
    fn deser(buffer: &[u8]) -> Result<Self, Error> {
        read_u32(buffer, 0)
    }
}

fn read_u32(buffer: &[u8], pos: usize) -> Result<u32, Error> {
    let slice = get_slice(buffer, pos..pos + 4)?;
    let bytes: [u8; 4] = slice
        .try_into()
        .map_err(|_| Error::DeserializationError("length prefix truncated".to_string()))?;
    Ok(u32::from_be_bytes(bytes))
}

/// Helper to get a slice from a buffer, returning an error if the range is out of bounds
///
/// If we were to instead use raw slice indexing (e.g., `&buffer[start..end]`) it would panic
/// if the range is out of bounds. This function returns a proper error instead.
pub(crate) fn get_slice(buffer: &[u8], range: std::ops::Range<usize>) -> Result<&[u8], Error> {
    buffer.get(range).ok_or_else(|| {
        Error::DeserializationError("input bytes too short to contain length prefix".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, RistrettoCtx as Ctx};

    #[test]
    fn test_vec_roundtrip() {
        let elements = vec![
            Ctx::random_element(),
            Ctx::random_element(),
            Ctx::random_element(),
        ];
        let bytes = elements.ser();
        let back = Vec::<<Ctx as Context>::Element>::deser(&bytes).unwrap();
        assert_eq!(elements, back);
    }

    #[test]
    fn test_nested_vec_roundtrip() {
        let scalars = vec![
            vec![Ctx::random_scalar(), Ctx::random_scalar()],
            vec![Ctx::random_scalar()],
        ];
        let bytes = scalars.ser();
        let back = Vec::<Vec<<Ctx as Context>::Scalar>>::deser(&bytes).unwrap();
        assert_eq!(scalars, back);
    }

    #[test]
    fn test_truncated_input_fails() {
        let elements = vec![Ctx::random_element()];
        let bytes = elements.ser();
        let result = Vec::<<Ctx as Context>::Element>::deser(&bytes[..bytes.len() - 1]);
        assert!(result.is_err());
    }
}
