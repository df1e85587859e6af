// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! CryptographicGroup implementation for the Ristretto group

use crate::traits::groups::CryptographicGroup;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;

use crate::groups::ristretto255::element::RistrettoElement;
use crate::groups::ristretto255::scalar::RistrettoScalar;

use crate::utils::error::Error;
use crate::utils::hash;
use crate::utils::hash::Hasher;
use crate::utils::rng;

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::{constants as dalek_constants, RistrettoPoint};
use sha3::Digest;

use rayon::prelude::*;

/// Ristretto implementation of [`CryptographicGroup`]
#[derive(Debug, Clone)]
pub struct Ristretto255Group;

impl CryptographicGroup for Ristretto255Group {
    type Element = RistrettoElement;
    type Scalar = RistrettoScalar;
    type Hasher = hash::Hasher512;

    /// Ristretto points carry 29 message bytes plus one explicit length byte.
    const CHUNK_BYTES: usize = CHUNK_BYTES;

    #[inline]
    fn generator() -> Self::Element {
        RistrettoElement::new(dalek_constants::RISTRETTO_BASEPOINT_POINT)
    }

    #[inline]
    fn g_exp(scalar: &Self::Scalar) -> Self::Element {
        RistrettoElement::new(RistrettoPoint::mul_base(&scalar.0))
    }

    /// # Errors
    ///
    /// Infallible
    fn hash_to_scalar(input_slices: &[&[u8]], ds_tags: &[&[u8]]) -> Result<Self::Scalar, Error> {
        let mut hasher = Self::Hasher::hasher();
        hash::update_hasher(&mut hasher, input_slices, ds_tags);

        let ret = RistrettoScalar::from_hash::<Self::Hasher>(hasher);

        Ok(ret)
    }

    /// # Errors
    ///
    /// Infallible
    fn hash_to_element(input_slices: &[&[u8]], ds_tags: &[&[u8]]) -> Result<Self::Element, Error> {
        let mut hasher = Self::Hasher::hasher();
        hash::update_hasher(&mut hasher, input_slices, ds_tags);

        let ret = RistrettoElement::from_hash::<Self::Hasher>(hasher);

        Ok(ret)
    }

    #[inline]
    fn random_element<R: rng::CRng>(rng: &mut R) -> Self::Element {
        Self::Element::random(rng)
    }

    #[inline]
    fn random_scalar<R: rng::CRng>(rng: &mut R) -> Self::Scalar {
        Self::Scalar::random(rng)
    }

    /// Embed up to 29 message bytes into a Ristretto element.
    ///
    /// Candidate layout of the 32 compressed bytes: byte 0 and byte 31 are
    /// search bytes, byte 1 holds the message length and bytes 2..=30 the
    /// message itself. The search iterates candidates until one decompresses
    /// to a valid point; decompression enforces canonical encodings, so
    /// compressing the point returns exactly the candidate bytes.
    ///
    /// # Errors
    ///
    /// - `ChunkTooLong` if the input exceeds 29 bytes
    /// - `EncodingError` if a point was not found for the input, with negligible probability
    fn encode_chunk(input: &[u8]) -> Result<RistrettoElement, Error> {
        if input.len() > CHUNK_BYTES {
            return Err(Error::ChunkTooLong(input.len(), CHUNK_BYTES));
        }

        let mut bytes = [0u8; 32];
        bytes[1] = input.len() as u8;
        bytes[2..2 + input.len()].copy_from_slice(input);

        // see https://github.com/dalek-cryptography/curve25519-dalek/issues/322
        // byte 0 must stay even and byte 31 below 64 for a canonical field element
        for j in 0..64u8 {
            bytes[31] = j;
            for i in 0..128u8 {
                // cannot overflow, 127 * 2 < u8::MAX
                #[allow(clippy::arithmetic_side_effects)]
                let low = 2 * i;
                bytes[0] = low;
                if let Some(point) = CompressedRistretto(bytes).decompress() {
                    return Ok(RistrettoElement(point));
                }
            }
        }
        Err(Error::EncodingError(
            "failed to embed chunk into a Ristretto point".to_string(),
        ))
    }

    /// Recover the bytes embedded in an element by [`Self::encode_chunk`].
    ///
    /// # Errors
    ///
    /// - `EncodingError` if the embedded length byte is out of range
    fn decode_chunk(element: &RistrettoElement) -> Result<Vec<u8>, Error> {
        let compressed = element.0.compress();
        let bytes = compressed.as_bytes();

        let len = bytes[1] as usize;
        if len > CHUNK_BYTES {
            return Err(Error::EncodingError(
                "embedded length byte out of range".to_string(),
            ));
        }

        Ok(bytes[2..2 + len].to_vec())
    }

    /// # Errors
    ///
    /// Infallible
    fn ind_generators(count: usize, label: &[u8]) -> Result<Vec<Self::Element>, Error> {
        let mut hasher = Self::Hasher::hasher();
        hasher.update(label);
        hasher.update(b"independent_generators_ristretto");

        let ret: Vec<RistrettoElement> = (0..count)
            .into_par_iter()
            .map(|i| {
                let mut hasher = hasher.clone();
                hasher.update(i.to_be_bytes());
                let point = RistrettoPoint::from_hash(hasher);
                RistrettoElement(point)
            })
            .collect();

        Ok(ret)
    }
}

impl Ristretto255Group {
    /// Encode a `Scalar` into two `Element`s.
    ///
    /// # Errors
    ///
    /// - `EncodingError` if a point was not found for the input, with negligible probability
    pub fn encode_scalar(scalar: &RistrettoScalar) -> Result<[RistrettoElement; 2], Error> {
        let bytes = scalar.0.to_bytes();

        let first = Self::encode_chunk(&bytes[..CHUNK_BYTES])?;
        let second = Self::encode_chunk(&bytes[CHUNK_BYTES..])?;

        Ok([first, second])
    }

    /// Decode a `Scalar` from two `Element`s.
    ///
    /// # Errors
    ///
    /// - `ScalarDecodeError` if the bytes could not be parsed into a Ristretto scalar
    pub fn decode_scalar(elements: &[RistrettoElement; 2]) -> Result<RistrettoScalar, Error> {
        let mut bytes = Self::decode_chunk(&elements[0])?;
        bytes.extend(Self::decode_chunk(&elements[1])?);

        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::ScalarDecodeError("decoded chunks do not form 32 scalar bytes".to_string())
        })?;

        let opt: Option<RistrettoScalar> =
            curve25519_dalek::scalar::Scalar::from_canonical_bytes(bytes)
                .map(RistrettoScalar)
                .into();

        opt.ok_or(Error::ScalarDecodeError(
            "failed to parse Ristretto scalar bytes".to_string(),
        ))
    }
}

/// Chunk size for embedding: 29 message bytes per point, with one further
/// payload byte carrying the explicit message length.
const CHUNK_BYTES: usize = 29;
