// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Group implementations.

pub mod ristretto255;

pub use ristretto255::Ristretto255Group;
