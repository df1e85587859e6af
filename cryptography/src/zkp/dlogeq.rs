// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Proof of equality of discrete logarithms.

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::traits::groups::CryptographicGroup;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;
use crate::utils::error::Error;
use crate::utils::serialization::VSerializable;

/**
 * Proof of equality of discrete logarithms.
 *
 * Given public values `y_0`, `g_0`, `y_1`, `g_1`, and a secret
 * `secret_x` proves equality of logarithms such that `y_0 = g_0^secret_x`
 * and `y_1 = g_1^secret_x`. This is what ties a partial decryption
 * `D = K^secret_x` to a public verification key `vk = g^secret_x`, both in
 * [pubshare units][`crate::dkgd::recipient::DecryptionFactor`] and in the
 * convenience threshold decryption path.
 *
 * # Examples
 * ```
 * use cryptography::context::Context;
 * use cryptography::context::RistrettoCtx as RCtx;
 * use cryptography::traits::groups::GroupElement;
 * use cryptography::zkp::dlogeq::DlogEqProof;
 *
 * let g = RCtx::generator();
 * let g_1 = RCtx::random_element();
 * let secret_x = RCtx::random_scalar();
 * let public_y_0 = g.exp(&secret_x);
 * let public_y_1 = g_1.exp(&secret_x);
 *
 * // Set to some relevant context value
 * let proof_context = &[];
 * let proof = DlogEqProof::<RCtx>::prove(&secret_x, &g, &public_y_0, &g_1, &public_y_1, proof_context).unwrap();
 *
 * let ok = proof.verify(&g, &public_y_0, &g_1, &public_y_1, proof_context).unwrap();
 * assert!(ok);
 * ```
 *
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct DlogEqProof<C: Context> {
    /// Commitment over the first base
    pub big_a_0: C::Element,
    /// Commitment over the second base
    pub big_a_1: C::Element,
    /// Challenge response
    pub k: C::Scalar,
}

impl<C: Context> DlogEqProof<C> {
    /// Construct a discrete log equality proof from the given values.
    pub fn new(big_a_0: C::Element, big_a_1: C::Element, k: C::Scalar) -> Self {
        DlogEqProof {
            big_a_0,
            big_a_1,
            k,
        }
    }

    /// Prove equality of discrete logarithms such that `y0 = g0^secret_x`
    /// and `y1 = g1^secret_x`.
    ///
    /// # Parameters
    ///
    /// - `secret_x`: The secret scalar
    /// - `g0`: The first group element base, public
    /// - `y0`: The first group element `y0` = `g0^secret_x`, public
    /// - `g1`: The second group element base, public
    /// - `y1`: The second group element `y1` = `g1^secret_x`, public
    /// - `proof_context`: proof context label (ZKP CONTEXT)
    ///
    /// # Errors
    ///
    /// - `HashToElementError` if challenge generation returns error
    ///
    /// Returns a [`DlogEqProof`] instance.
    pub fn prove(
        secret_x: &C::Scalar,
        g0: &C::Element,
        y0: &C::Element,
        g1: &C::Element,
        y1: &C::Element,
        proof_context: &[u8],
    ) -> Result<DlogEqProof<C>, Error> {
        let a = C::random_scalar();
        let big_a_0 = g0.exp(&a);
        let big_a_1 = g1.exp(&a);

        let (input, dsts) =
            Self::challenge_input(g0, g1, y0, y1, &big_a_0, &big_a_1, proof_context);
        let input: Vec<&[u8]> = input.iter().map(Vec::as_slice).collect();
        let v = C::G::hash_to_scalar(&input, &dsts)?;

        let vx = v.mul(secret_x);
        let k = a.add(&vx);
        Ok(Self::new(big_a_0, big_a_1, k))
    }

    /// Verify this proof of equality of discrete logarithms.
    ///
    /// # Parameters
    ///
    /// - `g0`: The first group element base
    /// - `y0`: The first group element value
    /// - `g1`: The second group element base
    /// - `y1`: The second group element value
    /// - `proof_context`: proof context label (ZKP CONTEXT)
    ///
    /// # Errors
    ///
    /// - `HashToElementError` if challenge generation returns error
    ///
    /// Returns `true` if the proof is valid, `false` otherwise.
    pub fn verify(
        &self,
        g0: &C::Element,
        y0: &C::Element,
        g1: &C::Element,
        y1: &C::Element,
        proof_context: &[u8],
    ) -> Result<bool, Error> {
        let k = &self.k;

        let (input, dsts) =
            Self::challenge_input(g0, g1, y0, y1, &self.big_a_0, &self.big_a_1, proof_context);
        let input: Vec<&[u8]> = input.iter().map(Vec::as_slice).collect();
        let v = C::G::hash_to_scalar(&input, &dsts)?;

        let y0_v = y0.exp(&v);
        let y0_v_big_a_0 = y0_v.mul(&self.big_a_0);
        let g0_k = g0.exp(k);
        let check1 = y0_v_big_a_0.equals(&g0_k);

        let y1_v = y1.exp(&v);
        let y1_v_big_a_1 = y1_v.mul(&self.big_a_1);
        let g1_k = g1.exp(k);
        let check2 = y1_v_big_a_1.equals(&g1_k);

        Ok(check1 && check2)
    }

    /// Domain separation tags for the challenge input
    const DS_TAGS: [&'static [u8]; 7] = [
        b"g0",
        b"g1",
        b"y0",
        b"y1",
        b"big_a_0",
        b"big_a_1",
        b"dlogeq_proof_context",
    ];

    /// Compute the challenge input for the discrete logarithm equality proof.
    ///
    /// Returns byte arrays for input values and domain separation tags.
    /// These values will be passed to the hash function to compute
    /// the challenge.
    fn challenge_input(
        g0: &C::Element,
        g1: &C::Element,
        y0: &C::Element,
        y1: &C::Element,
        big_a_0: &C::Element,
        big_a_1: &C::Element,
        proof_context: &[u8],
    ) -> ([Vec<u8>; 7], [&'static [u8]; 7]) {
        let a = [
            g0.ser(),
            g1.ser(),
            y0.ser(),
            y1.ser(),
            big_a_0.ser(),
            big_a_1.ser(),
            proof_context.to_vec(),
        ];

        (a, Self::DS_TAGS)
    }
}
