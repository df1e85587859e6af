// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Distributed key generation and decryption
//!
//! * NOTE: this API does not represent private shares as encrypted values.
//!   In the messaging layer, private shares should be encrypted with the recipient's
//!   public key.
//!
//! This module models distributed key generation and decryption with
//! two main abstractions:
//!
//! - [`dealer::Dealer`][`crate::dkgd::dealer::Dealer`]
//!
//!   A participant in the protocol fulfilling the role of dealer. A dealer
//!   generates secret information and distributes shares of it privately to every
//!   participant, including itself (acting as a recipient). The distribution takes
//!   the form of pairwise shares of type [`VerifiableShare`][`crate::dkgd::dealer::VerifiableShare`].
//!
//! - [`recipient::Recipient`][`crate::dkgd::recipient::Recipient`]
//!
//!   A participant in the protocol fulfilling the role of share recipient.
//!   A recipient collects shares from every participant, including itself
//!   (acting as a dealer), and verifies them. Each recipient can then construct
//!
//!   1) The joint public key from public share information
//!   2) Their private share of the joint secret, from pairwise shares
//!      received privately
//!
//!   Recipients can compute partial decryptions of ciphertexts producing
//!   instances of type [`DecryptionFactor`][`crate::dkgd::recipient::DecryptionFactor`],
//!   that contain decryption factors and corresponding [proofs][`crate::zkp::dlogeq`] of correctness.
//!
//! # Distributed key generation
//!
//! Comprises the steps where dealers generate secrets and distribute them,
//! and recipients receive shares, verify them, and construct the joint public
//! key and their secret shares.
//!
//! # Distributed decryption
//!
//! Comprises the steps where recipients compute partial decryptions of
//! some input ciphertexts, collect all such partial decryptions, verify them
//! and combine them to produce the decrypted plaintexts.
//!
//! # Resharing
//!
//! A dealer holding a share of an existing joint secret can re-deal it with
//! [`dealer::Dealer::reshare`]; recipients combine the re-dealt shares with
//! [`recipient::combine_reshares`] into fresh shares of the *same* joint
//! secret, allowing a committee to refresh or hand over its shares without
//! ever reconstructing the secret.

/// Distributed key generation functionality.
pub mod dealer;

/// Distributed key generation and decryption functionality.
pub mod recipient;

#[cfg(test)]
mod tests;
