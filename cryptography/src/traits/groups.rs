// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Traits for group arithmetic, group elements and scalars.
//!
//! Notation is multiplicative throughout: `mul` is the group operation,
//! `exp` is scalar application and `one` the identity, regardless of how
//! the underlying curve library writes them.

use crate::utils::error::Error;
use crate::utils::rng::CRng;

/// A scalar of the prime-order field associated with a cryptographic group.
pub trait GroupScalar:
    Clone + std::fmt::Debug + PartialEq + Send + Sync + Sized + 'static
{
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Returns the multiplicative identity.
    fn one() -> Self;

    /// Returns a uniformly random scalar.
    fn random<R: CRng>(rng: &mut R) -> Self;

    /// Field addition.
    fn add(&self, other: &Self) -> Self;

    /// Field subtraction.
    fn sub(&self, other: &Self) -> Self;

    /// Field multiplication.
    fn mul(&self, other: &Self) -> Self;

    /// Additive inverse.
    fn neg(&self) -> Self;

    /// Multiplicative inverse, `None` for zero.
    fn inv(&self) -> Option<Self>;

    /// Equality check.
    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

/// An element of a prime-order cryptographic group.
pub trait GroupElement:
    Clone + std::fmt::Debug + PartialEq + Send + Sync + Sized + 'static
{
    /// The associated scalar type.
    type Scalar: GroupScalar;

    /// Returns the group identity.
    fn one() -> Self;

    /// The group operation.
    fn mul(&self, other: &Self) -> Self;

    /// The group inverse.
    fn inv(&self) -> Self;

    /// Scalar application (exponentiation in multiplicative notation).
    fn exp(&self, scalar: &Self::Scalar) -> Self;

    /// Equality check.
    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

/// A prime-order group together with its hashing and encoding functionality.
pub trait CryptographicGroup: 'static {
    /// The group element type.
    type Element: GroupElement<Scalar = Self::Scalar>;

    /// The group scalar type.
    type Scalar: GroupScalar;

    /// The hashing function used for challenges and element derivation.
    type Hasher: crate::utils::hash::Hasher;

    /// Number of message bytes that [`Self::encode_chunk`] can embed in one element.
    const CHUNK_BYTES: usize;

    /// Returns the default group generator.
    fn generator() -> Self::Element;

    /// Exponentiation of the default generator.
    fn g_exp(scalar: &Self::Scalar) -> Self::Element;

    /// Derive a scalar from domain-separated input slices.
    ///
    /// # Errors
    ///
    /// Implementation specific; infallible for Ristretto255.
    fn hash_to_scalar(input_slices: &[&[u8]], ds_tags: &[&[u8]]) -> Result<Self::Scalar, Error>;

    /// Derive a group element from domain-separated input slices.
    ///
    /// # Errors
    ///
    /// Implementation specific; infallible for Ristretto255.
    fn hash_to_element(input_slices: &[&[u8]], ds_tags: &[&[u8]]) -> Result<Self::Element, Error>;

    /// Returns a uniformly random group element.
    fn random_element<R: CRng>(rng: &mut R) -> Self::Element;

    /// Returns a uniformly random scalar.
    fn random_scalar<R: CRng>(rng: &mut R) -> Self::Scalar;

    /// Embed up to [`Self::CHUNK_BYTES`] message bytes into a group element.
    ///
    /// The embedding is invertible: [`Self::decode_chunk`] recovers exactly
    /// the embedded bytes.
    ///
    /// # Errors
    ///
    /// - `ChunkTooLong` if the input exceeds the embedding capacity
    /// - `EncodingError` if no curve point is found, with negligible probability
    fn encode_chunk(bytes: &[u8]) -> Result<Self::Element, Error>;

    /// Recover the bytes embedded in a group element by [`Self::encode_chunk`].
    ///
    /// # Errors
    ///
    /// - `EncodingError` if the element does not carry a valid embedding
    fn decode_chunk(element: &Self::Element) -> Result<Vec<u8>, Error>;

    /// Derive `count` generators with unknown relative discrete logarithms.
    ///
    /// # Errors
    ///
    /// Implementation specific; infallible for Ristretto255.
    fn ind_generators(count: usize, label: &[u8]) -> Result<Vec<Self::Element>, Error>;
}
