// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Error type for this library

use thiserror::Error;

/**
 * Error type for the cryptography crate.
 *
 * This error type is used to represent all possible errors that can occur
 * within the cryptography crate.
 */
#[derive(Error, Debug)]
pub enum Error {
    /// Deserialization error for [`crate::utils::serialization`] functionality
    #[error("{0}")]
    DeserializationError(String),

    /// Occurs when [embedding][`crate::traits::groups::CryptographicGroup::encode_chunk`]
    /// bytes into the curve fails
    #[error("{0}")]
    EncodingError(String),

    /// Occurs when a byte chunk exceeds the embedding capacity of a group element
    #[error("chunk of {0} bytes exceeds the {1} byte embedding capacity")]
    ChunkTooLong(usize, usize),

    /// Occurs when Joint-Feldman DKG [share verification][`crate::dkgd::dealer::VerifiableShare`] fails.
    #[error("{0}")]
    ShareVerificationFailed(String),

    /// Occurs when [decryption proofs][`crate::dkgd::recipient::DecryptionFactor`] fail to verify.
    #[error("{0}")]
    DecryptProofFailed(String),

    /// Occurs when a permutation is applied to a slice of mismatched length
    #[error("mismatched permutation length")]
    MismatchedPermutationLength,

    /// Occurs when shuffling zero ciphertexts
    #[error("empty shuffle")]
    EmptyShuffle,

    /// Occurs when there is a length mismatch in shuffle data
    #[error("mismatched shuffle length")]
    MismatchedShuffleLength,

    /// Occurs when a scalar cannot be decoded from an element pair
    #[error("{0}")]
    ScalarDecodeError(String),

    /// Occurs when dealing shares with an invalid threshold or roster size
    #[error("invalid threshold {threshold} for {participants} participants")]
    InvalidThreshold {
        /// requested threshold
        threshold: usize,
        /// roster size
        participants: usize,
    },
}
