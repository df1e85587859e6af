// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Election lifecycle for the e-voting workspace.
//!
//! Builds the per-election state machine on top of the [`cryptography`]
//! crate: typed election records persisted in an ordering store, the
//! distributed key generation handler run by every committee node, the
//! verifiable shuffle chain and the pubshare-based threshold decryption
//! that releases only the plaintext tally.

pub mod decrypt;
pub mod dkg;
pub mod elections;
pub mod error;
pub mod forms;
pub mod shuffle;
pub mod store;


pub use error::Error;

/// The cryptographic context used throughout the protocol.
///
/// Process-wide and immutable after init; functions receive group values
/// typed by this context rather than reaching for ambient state.
pub type Ctx = cryptography::context::RistrettoCtx;

/// Group element type of [`Ctx`].
pub type Element = <Ctx as cryptography::context::Context>::Element;

/// Group scalar type of [`Ctx`].
pub type Scalar = <Ctx as cryptography::context::Context>::Scalar;
