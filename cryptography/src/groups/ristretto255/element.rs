// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! GroupElement implementation for the Ristretto255 group

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::Identity;
use sha3::digest::typenum::U64;
use sha3::digest::Digest;

use crate::groups::ristretto255::scalar::RistrettoScalar;
use crate::traits::groups::GroupElement;
use crate::utils::error::Error as CryptographyError;
use crate::utils::rng;
use crate::utils::serialization::{VDeserializable, VSerializable};

/**
 * A [`GroupElement`] implementation for the [Ristretto](https://docs.rs/curve25519-dalek/latest/curve25519_dalek/ristretto/index.html) group.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RistrettoElement(pub RistrettoPoint);

impl RistrettoElement {
    /// Construct a `RistrettoElement` from a raw dalek point.
    pub fn new(point: RistrettoPoint) -> Self {
        RistrettoElement(point)
    }

    /// Create a new `RistrettoElement` from a hash.
    ///
    /// See [`RistrettoPoint::from_hash`](https://docs.rs/curve25519-dalek/latest/curve25519_dalek/ristretto/struct.RistrettoPoint.html#method.from_hash) for details.
    pub fn from_hash<D: Digest<OutputSize = U64> + Default>(hasher: D) -> Self {
        RistrettoElement(RistrettoPoint::from_hash::<D>(hasher))
    }

    /// Returns a uniformly random element.
    pub fn random<R: rng::CRng>(rng: &mut R) -> Self {
        RistrettoElement(RistrettoPoint::random(rng))
    }
}

impl GroupElement for RistrettoElement {
    type Scalar = RistrettoScalar;

    #[inline]
    fn one() -> Self {
        RistrettoElement(RistrettoPoint::identity())
    }

    #[inline]
    fn mul(&self, other: &Self) -> Self {
        // curve arithmetic
        #[allow(clippy::arithmetic_side_effects)]
        RistrettoElement(self.0 + other.0)
    }

    #[inline]
    fn inv(&self) -> Self {
        // curve arithmetic
        #[allow(clippy::arithmetic_side_effects)]
        RistrettoElement(-self.0)
    }

    #[inline]
    fn exp(&self, scalar: &Self::Scalar) -> Self {
        // curve arithmetic
        #[allow(clippy::arithmetic_side_effects)]
        RistrettoElement(self.0 * scalar.0)
    }
}

impl VSerializable for RistrettoElement {
    fn ser(&self) -> Vec<u8> {
        self.0.compress().to_bytes().to_vec()
    }
}

impl VDeserializable for RistrettoElement {
    fn deser(buffer: &[u8]) -> Result<Self, CryptographyError> {
        let bytes: [u8; 32] = buffer.try_into().map_err(|_| {
            CryptographyError::DeserializationError(
                "expected 32 bytes for a Ristretto element".to_string(),
            )
        })?;
        CompressedRistretto(bytes)
            .decompress()
            .map(RistrettoElement)
            .ok_or_else(|| {
                CryptographyError::DeserializationError(
                    "bytes do not encode a Ristretto point".to_string(),
                )
            })
    }
}

impl serde::Serialize for RistrettoElement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.ser()))
    }
}

impl<'de> serde::Deserialize<'de> for RistrettoElement {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = <String as serde::Deserialize>::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(serde::de::Error::custom)?;
        RistrettoElement::deser(&bytes).map_err(serde::de::Error::custom)
    }
}
