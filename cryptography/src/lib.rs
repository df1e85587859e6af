// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Cryptographic core for the e-voting workspace.
//!
//! Provides the Ristretto255 group with byte-chunk embedding, ElGamal
//! encryption, zero-knowledge proofs (Schnorr, discrete-log equality,
//! verifiable shuffle) and joint-Feldman distributed key generation with
//! threshold decryption.

/// Defines implementation choices for key cryptographic functionalities.
pub mod context;
pub mod cryptosystem;
pub mod dkgd;
pub mod groups;
/// Abstractions for curve arithmetic, groups, elements and scalars.
pub mod traits;
/// Utilities such as random number generation, hashing, signatures and serialization.
pub mod utils;
pub mod zkp;
