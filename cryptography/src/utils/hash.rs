// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Hashing utilities and [context][`crate::context::Context`] dependency.

use sha3::digest::typenum::U64;
use sha3::Digest;
use sha3::Sha3_512;

/**
 * Hashing [context][`crate::context::Context`] dependency.
 *
 * The 64-byte output requirement allows deriving group scalars and
 * elements from a hash with negligible bias.
 */
pub trait Hasher: Digest<OutputSize = U64> + Clone {
    /// Returns a hasher instance.
    fn hasher() -> Self;
}

/// Sha3-512 instantiation of the [`Hasher`] dependency.
pub type Hasher512 = Sha3_512;

impl Hasher for Sha3_512 {
    fn hasher() -> Self {
        Sha3_512::new()
    }
}

/// Feed length-prefixed, domain-separated input slices into the given hasher.
///
/// Each input slice is paired with its domain separation tag; both are
/// length prefixed so that adjacent inputs cannot be confused regardless
/// of their contents.
pub fn update_hasher<H: Hasher>(hasher: &mut H, input_slices: &[&[u8]], ds_tags: &[&[u8]]) {
    for (i, input) in input_slices.iter().enumerate() {
        let tag: &[u8] = ds_tags.get(i).copied().unwrap_or(b"");
        Digest::update(hasher, (tag.len() as u64).to_be_bytes());
        Digest::update(hasher, tag);
        Digest::update(hasher, (input.len() as u64).to_be_bytes());
        Digest::update(hasher, input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_hasher_domain_separation() {
        let mut h1 = Hasher512::hasher();
        update_hasher(&mut h1, &[b"ab", b"c"], &[b"t1", b"t2"]);

        // moving a byte across the slice boundary must change the digest
        let mut h2 = Hasher512::hasher();
        update_hasher(&mut h2, &[b"a", b"bc"], &[b"t1", b"t2"]);

        assert_ne!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_update_hasher_deterministic() {
        let mut h1 = Hasher512::hasher();
        update_hasher(&mut h1, &[b"input"], &[b"tag"]);
        let mut h2 = Hasher512::hasher();
        update_hasher(&mut h2, &[b"input"], &[b"tag"]);

        assert_eq!(h1.finalize(), h2.finalize());
    }
}
