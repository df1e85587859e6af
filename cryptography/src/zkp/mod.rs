// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Zero knowledge proofs.

pub mod dlogeq;
pub mod schnorr;
pub mod shuffle;
