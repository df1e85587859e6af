// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Verifiable re-encryption mix with a Terelius-Wikstrom style proof of shuffle

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::cryptosystem::elgamal::{self, Ciphertext};
use crate::traits::groups::CryptographicGroup;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;
use crate::utils::error::Error;
use crate::utils::hash;
use crate::utils::rng::{SeededXof, PROOF_SEED_BYTES};
use crate::utils::serialization::VSerializable;

use rand::Rng;
use sha3::Digest;

use rayon::prelude::*;

/// A ballot row: one ciphertext per chunk, all rows of a shuffle sharing the
/// same width.
pub type CiphertextRow<C> = Vec<Ciphertext<C>>;

/**
 * Shuffler for the proof of shuffle.
 *
 * Given rows of ciphertexts `w = w_1, w_2 .. w_n` encrypted under public
 * key `pk`, the function [`shuffle`][`Self::shuffle`]:
 *
 * - Re-encrypts and permutes the rows producing a list `w' = w'_1, w'_2 .. w'_n`
 * - Computes a corresponding proof of shuffle `P`
 *
 * Conversely, given rows `w`, `w'` encrypted under public key `pk`, and a
 * proof of shuffle `P`, the function [`verify`][`Self::verify`] verifies `P`.
 *
 * Each row holds one ciphertext per message chunk; a single proof binds the
 * permutation and every per-chunk re-encryption exponent, so the verified
 * output rows are a permutation of re-encryptions of the input rows as whole
 * ballots.
 *
 * The computation and verification of a shuffle proof requires `N` independent
 * generators of the group, that prover and verifier must derive
 * independently from some common data. For convenience, these `h_generators`
 * and the public key `pk` are passed to the `Shuffler` constructor.
 *
 * The prover's internal commitment scalars are drawn from a reproducible
 * stream keyed by the leading [`PROOF_SEED_BYTES`] of a caller-supplied
 * seed, so auditors holding the seed can re-derive them. Permutation and
 * re-encryption randomness never touch that stream.
 *
 * # Examples
 * ```
 * use cryptography::context::Context;
 * use cryptography::context::RistrettoCtx as RCtx;
 * use cryptography::groups::Ristretto255Group;
 * use cryptography::cryptosystem::elgamal::KeyPair;
 * use cryptography::traits::groups::CryptographicGroup;
 * use cryptography::zkp::shuffle::Shuffler;
 *
 * let keypair: KeyPair<RCtx> = KeyPair::generate();
 *
 * // three ballots of two chunks each
 * let ciphertexts: Vec<_> = (0..3)
 *     .map(|_| {
 *         (0..2)
 *             .map(|_| keypair.pkey.encrypt_point(&RCtx::random_element()))
 *             .collect::<Vec<_>>()
 *     })
 *     .collect();
 *
 * let generators = Ristretto255Group::ind_generators(3, b"example").unwrap();
 *
 * let shuffler = Shuffler::<RCtx>::new(generators, keypair.pkey);
 * let (shuffled, proof) = shuffler.shuffle(&ciphertexts, b"seed bytes", b"ctx").unwrap();
 *
 * let ok = shuffler.verify(&ciphertexts, &shuffled, &proof, b"ctx").unwrap();
 *
 * assert!(ok);
 * ```
 */
pub struct Shuffler<C: Context> {
    /// List of independent generators matching the size of the input ciphertexts
    h_generators: Vec<C::Element>,
    /// Public key under which the input ciphertexts are encrypted
    pk: elgamal::PublicKey<C>,
}

impl<C: Context> Shuffler<C> {
    /// Construct a Shuffler with the given values.
    pub fn new(h_generators: Vec<C::Element>, pk: elgamal::PublicKey<C>) -> Self {
        Self { h_generators, pk }
    }

    /// Shuffle the input rows and compute a corresponding proof.
    ///
    /// The input rows are re-encrypted with random (private) exponents, and
    /// permuted with a random (private) permutation. A corresponding proof of
    /// shuffle is computed, its internal commitments drawn from the stream
    /// seeded by `seed`.
    ///
    /// # Parameters
    ///
    /// - `ciphertexts`: The input rows to be shuffled
    /// - `seed`: Seed for the reproducible commitment stream; only its
    ///   leading [`PROOF_SEED_BYTES`] are used
    /// - `context`: proof context label (ZKP CONTEXT)
    ///
    /// # Errors
    ///
    /// - `EmptyShuffle` if the input rows are zero length or zero width
    /// - `MismatchedShuffleLength` if there is a length mismatch between rows and generators,
    ///   or between the rows themselves
    ///
    /// Returns the shuffled rows and the proof of shuffle.
    #[allow(clippy::many_single_char_names)]
    #[allow(clippy::similar_names)]
    #[allow(clippy::too_many_lines)]
    pub fn shuffle(
        &self,
        ciphertexts: &[CiphertextRow<C>],
        seed: &[u8],
        context: &[u8],
    ) -> Result<(Vec<CiphertextRow<C>>, ShuffleProof<C>), Error> {
        let width = self.check_dimensions(ciphertexts)?;

        let big_n = ciphertexts.len();
        let mut crng = Self::proof_rng(seed)?;
        let permutation = Permutation::generate::<C>(big_n);
        let permutation_data =
            self.apply_permutation(&permutation, ciphertexts, width, &mut crng)?;
        let permuted_ciphertexts = permutation_data.permuted_ciphertexts;
        let commitment_exponents = permutation_data.commitment_exponents;
        let encryption_exponents = permutation_data.encryption_exponents;
        let pedersen_commitments = permutation_data.pedersen_commitments;

        let g = C::generator();

        ///////////////// Step 1 /////////////////

        // Challenge e
        let e_n = self.challenge_e_n(ciphertexts, &permuted_ciphertexts, context)?;
        // the calculation of A and F is moved to the verifier

        ///////////////// Step 2 /////////////////

        // a) Bridging commitments
        let e_prime_n: Vec<C::Scalar> = permutation
            .apply_inverse(&e_n)?
            .into_iter()
            .cloned()
            .collect();
        let b_n: Vec<C::Scalar> = (0..big_n).map(|_| C::Scalar::random(&mut crng)).collect();
        // h_1 is at index 0
        let mut big_b_previous = self.h_generators[0].clone();
        let mut big_b_n = Vec::with_capacity(big_n);
        let g_b_n: Vec<C::Element> = b_n.par_iter().map(|b| g.exp(b)).collect();
        for (i, g_b) in g_b_n.iter().enumerate() {
            let big_b_factor = big_b_previous.exp(&e_prime_n[i]);
            let big_b_i = g_b.mul(&big_b_factor);
            big_b_n.push(big_b_i.clone());
            big_b_previous = big_b_i;
        }

        // b) Proof commitments
        let alpha = C::Scalar::random(&mut crng);
        let beta_n: Vec<C::Scalar> = (0..big_n).map(|_| C::Scalar::random(&mut crng)).collect();
        let epsilon_n: Vec<C::Scalar> = (0..big_n).map(|_| C::Scalar::random(&mut crng)).collect();
        let gamma = C::Scalar::random(&mut crng);
        let delta = C::Scalar::random(&mut crng);
        let phi: Vec<C::Scalar> = (0..width).map(|_| C::Scalar::random(&mut crng)).collect();

        // A'
        let h_n_epsilon_n_fold = self
            .h_generators
            .par_iter()
            .zip(epsilon_n.par_iter())
            .map(|(h, e)| h.exp(e))
            .reduce(C::Element::one, |acc, next| acc.mul(&next));
        let big_a_prime = g.exp(&alpha).mul(&h_n_epsilon_n_fold);

        // B'
        // We need to start this calculation at big_b_0, which is = h_1;
        // the last value B_N is not used here, it appears later in big_d
        let big_b_shifted: Vec<&C::Element> = std::iter::once(&self.h_generators[0])
            .chain(big_b_n[0..big_n - 1].iter())
            .collect();
        let big_b_prime_n: Vec<C::Element> = big_b_shifted
            .par_iter()
            .zip(epsilon_n.par_iter())
            .zip(beta_n.par_iter())
            .map(|((big_b, e), beta)| {
                let g_beta = g.exp(beta);
                let big_b_epsilon = big_b.exp(e);

                g_beta.mul(&big_b_epsilon)
            })
            .collect();

        // F'
        let w_prime_n_epsilon_n_fold = permuted_ciphertexts
            .par_iter()
            .zip(epsilon_n.par_iter())
            .map(|(w, e)| row_exp::<C>(w, e))
            .reduce(
                || row_identity::<C>(width),
                |acc, next| row_mul::<C>(&acc, &next),
            );
        let neg_phi: Vec<C::Scalar> = phi.iter().map(GroupScalar::neg).collect();
        let big_f_prime = row_re_encrypt::<C>(&w_prime_n_epsilon_n_fold, &neg_phi, &self.pk.y);

        // C'
        let big_c_prime = g.exp(&gamma);

        // D'
        let big_d_prime = g.exp(&delta);

        let commitments = ShuffleCommitments {
            big_b_n,
            big_a_prime,
            big_b_prime_n,
            big_c_prime,
            big_d_prime,
            big_f_prime,
            u_n: pedersen_commitments,
        };

        ///////////////// Step 3 /////////////////

        // Challenge v
        let (input, dsts) = self.challenge_input_v(&commitments, context);
        let input: Vec<&[u8]> = input.iter().map(Vec::as_slice).collect();
        let v = C::G::hash_to_scalar(&input, &dsts)?;

        ///////////////// Step 4 /////////////////

        // a
        let a = commitment_exponents
            .iter()
            .zip(e_prime_n.iter())
            .map(|(r, e)| r.mul(e))
            .fold(C::Scalar::zero(), |acc, next| acc.add(&next));

        // c
        let c = commitment_exponents
            .iter()
            .fold(C::Scalar::zero(), |acc, next| acc.add(next));

        // f
        let mut f = vec![C::Scalar::zero(); width];
        for (s, e) in encryption_exponents.iter().zip(e_n.iter()) {
            for (acc, s_j) in f.iter_mut().zip(s.iter()) {
                *acc = acc.add(&s_j.mul(e));
            }
        }

        // d_n
        // sets d_1 = b_1 and computes d_i = b_i + e'_i * d_{i-1}
        let mut d_n = vec![b_n[0].clone()];
        for (i, b) in b_n.iter().enumerate().skip(1) {
            // cannot underflow, skip(1) starts at 1
            #[allow(clippy::arithmetic_side_effects)]
            let e_prime_d = e_prime_n[i].mul(&d_n[i - 1]);
            d_n.push(b.add(&e_prime_d));
        }
        // d
        // cannot underflow, d_n.len() > 0
        #[allow(clippy::arithmetic_side_effects)]
        let d = &d_n[d_n.len() - 1];

        // k_a
        let k_a = v.mul(&a).add(&alpha);

        // k_b
        let k_b_n: Vec<C::Scalar> = b_n
            .iter()
            .zip(beta_n.iter())
            .map(|(b, beta)| v.mul(b).add(beta))
            .collect();

        // k_e_n
        let k_e_n: Vec<C::Scalar> = e_prime_n
            .iter()
            .zip(epsilon_n.iter())
            .map(|(e, epsilon)| v.mul(e).add(epsilon))
            .collect();

        // k_c
        let k_c = v.mul(&c).add(&gamma);

        // k_d
        let k_d = v.mul(d).add(&delta);

        // k_f
        let k_f: Vec<C::Scalar> = f
            .iter()
            .zip(phi.iter())
            .map(|(f_j, phi_j)| v.mul(f_j).add(phi_j))
            .collect();

        let responses = Responses {
            k_a,
            k_b_n,
            k_c,
            k_d,
            k_e_n,
            k_f,
        };
        let proof = ShuffleProof {
            commitments,
            responses,
        };

        Ok((permuted_ciphertexts, proof))
    }

    /// Verify the given proof of shuffle with respect to the original and shuffled rows.
    ///
    /// # Parameters
    ///
    /// - `ciphertexts`: The original rows
    /// - `permuted_ciphertexts`: The shuffled rows
    /// - `proof`: The proof of shuffle
    /// - `context`: proof context label (ZKP CONTEXT)
    ///
    /// # Errors
    ///
    /// - `EmptyShuffle` if the input rows are zero length or zero width
    /// - `MismatchedShuffleLength` if there is a length mismatch between rows,
    ///   generators or proof commitments
    ///
    /// Returns `true` if the proof is valid, `false` otherwise.
    #[allow(clippy::similar_names)]
    #[allow(clippy::too_many_lines)]
    pub fn verify(
        &self,
        ciphertexts: &[CiphertextRow<C>],
        permuted_ciphertexts: &[CiphertextRow<C>],
        proof: &ShuffleProof<C>,
        context: &[u8],
    ) -> Result<bool, Error> {
        let width = self.check_dimensions(ciphertexts)?;

        if ciphertexts.len() != permuted_ciphertexts.len() {
            return Err(Error::MismatchedShuffleLength);
        }
        if permuted_ciphertexts.iter().any(|row| row.len() != width) {
            return Err(Error::MismatchedShuffleLength);
        }
        if proof.commitments.big_b_n.len() != ciphertexts.len() {
            return Err(Error::MismatchedShuffleLength);
        }
        if proof.commitments.big_b_prime_n.len() != ciphertexts.len() {
            return Err(Error::MismatchedShuffleLength);
        }
        if proof.commitments.u_n.len() != ciphertexts.len() {
            return Err(Error::MismatchedShuffleLength);
        }
        if proof.responses.k_b_n.len() != ciphertexts.len()
            || proof.responses.k_e_n.len() != ciphertexts.len()
            || proof.responses.k_f.len() != width
            || proof.commitments.big_f_prime.len() != width
        {
            return Err(Error::MismatchedShuffleLength);
        }

        let commitments = &proof.commitments;
        let responses = &proof.responses;
        let g = C::generator();

        let e_n = self.challenge_e_n(ciphertexts, permuted_ciphertexts, context)?;
        let (input, dsts) = self.challenge_input_v(commitments, context);
        let input: Vec<&[u8]> = input.iter().map(Vec::as_slice).collect();
        let v = C::G::hash_to_scalar(&input, &dsts)?;

        ///////////////// Step 5 /////////////////

        // A
        let big_a = e_n
            .par_iter()
            .zip(commitments.u_n.par_iter())
            .map(|(e, u)| u.exp(e))
            .reduce(C::Element::one, |acc, next| acc.mul(&next));

        // F
        let big_f = e_n
            .par_iter()
            .zip(ciphertexts.par_iter())
            .map(|(e, w)| row_exp::<C>(w, e))
            .reduce(
                || row_identity::<C>(width),
                |acc, next| row_mul::<C>(&acc, &next),
            );

        // C
        let u_n_fold = commitments
            .u_n
            .iter()
            .fold(C::Element::one(), |acc, next| acc.mul(next));
        let h_n_fold = self
            .h_generators
            .iter()
            .fold(C::Element::one(), |acc, next| acc.mul(next));
        let big_c = u_n_fold.mul(&h_n_fold.inv());

        // D
        let e_n_fold = e_n
            .iter()
            .fold(C::Scalar::one(), |acc, next| acc.mul(next));
        let h1_e_n_fold = self.h_generators[0].exp(&e_n_fold);
        // this is B_N
        // cannot underflow, ciphertexts.len() > 0
        #[allow(clippy::arithmetic_side_effects)]
        let big_b_last = &commitments.big_b_n[commitments.big_b_n.len() - 1];
        let big_d = big_b_last.mul(&h1_e_n_fold.inv());

        // B_0
        let big_b_0 = &self.h_generators[0];

        ////// Verification 1 //////

        let h_n_k_e_n_fold = self
            .h_generators
            .par_iter()
            .zip(responses.k_e_n.par_iter())
            .map(|(h, k)| h.exp(k))
            .reduce(C::Element::one, |acc, next| acc.mul(&next));
        let g_k_a = g.exp(&responses.k_a);
        let lhs_1 = big_a.exp(&v).mul(&commitments.big_a_prime);
        let rhs_1 = g_k_a.mul(&h_n_k_e_n_fold);

        ////// Verification 2 //////

        // We need to start this calculation at big_b_0, which is = h_1;
        // the last value B_N is not used here, it was used above in big_d
        let big_b_n = &commitments.big_b_n;
        // cannot underflow, ciphertexts.len() > 0
        #[allow(clippy::arithmetic_side_effects)]
        let big_b_shifted: Vec<&C::Element> = std::iter::once(big_b_0)
            .chain(big_b_n[0..big_b_n.len() - 1].iter())
            .collect();

        let rhs_2: Vec<C::Element> = big_b_shifted
            .par_iter()
            .zip(responses.k_e_n.par_iter())
            .zip(responses.k_b_n.par_iter())
            .map(|((b, k_e), k_b)| {
                let b_k_e = b.exp(k_e);
                let g_k_b = g.exp(k_b);

                g_k_b.mul(&b_k_e)
            })
            .collect();

        let lhs_2: Vec<C::Element> = big_b_n
            .par_iter()
            .zip(commitments.big_b_prime_n.par_iter())
            .map(|(big_b, big_b_prime)| big_b.exp(&v).mul(big_b_prime))
            .collect();

        ////// Verification 3 //////

        let lhs_3 = big_c.exp(&v).mul(&commitments.big_c_prime);
        let rhs_3 = g.exp(&responses.k_c);

        ////// Verification 4 //////

        let lhs_4 = big_d.exp(&v).mul(&commitments.big_d_prime);
        let rhs_4 = g.exp(&responses.k_d);

        ////// Verification 5 //////

        let big_f_v = row_exp::<C>(&big_f, &v);
        let lhs_5 = row_mul::<C>(&big_f_v, &commitments.big_f_prime);

        let w_prime_n_k_e_n_fold = permuted_ciphertexts
            .par_iter()
            .zip(responses.k_e_n.par_iter())
            .map(|(w, k)| row_exp::<C>(w, k))
            .reduce(
                || row_identity::<C>(width),
                |acc, next| row_mul::<C>(&acc, &next),
            );

        let neg_k_f: Vec<C::Scalar> = responses.k_f.iter().map(GroupScalar::neg).collect();
        let rhs_5 = row_re_encrypt::<C>(&w_prime_n_k_e_n_fold, &neg_k_f, &self.pk.y);

        let ret =
            lhs_1 == rhs_1 && lhs_2 == rhs_2 && lhs_3 == rhs_3 && lhs_4 == rhs_4 && lhs_5 == rhs_5;

        Ok(ret)
    }

    /// Check input dimensions, returning the shared row width.
    fn check_dimensions(&self, ciphertexts: &[CiphertextRow<C>]) -> Result<usize, Error> {
        if ciphertexts.is_empty() {
            return Err(Error::EmptyShuffle);
        }
        if ciphertexts.len() != self.h_generators.len() {
            return Err(Error::MismatchedShuffleLength);
        }
        let width = ciphertexts[0].len();
        if width == 0 {
            return Err(Error::EmptyShuffle);
        }
        if ciphertexts.iter().any(|row| row.len() != width) {
            return Err(Error::MismatchedShuffleLength);
        }
        Ok(width)
    }

    /// Build the reproducible commitment stream from the leading seed bytes.
    fn proof_rng(seed: &[u8]) -> Result<SeededXof, Error> {
        let truncated = &seed[..seed.len().min(PROOF_SEED_BYTES)];
        let base = C::G::hash_to_scalar(&[truncated], &[b"shuffle_proof_seed"])?;

        Ok(SeededXof::keyed(&base.ser()))
    }

    /// Re-encrypt and permute the input rows with the given permutation.
    ///
    /// Commitment exponents come from the reproducible stream; re-encryption
    /// exponents are always drawn from the context rng.
    ///
    /// Returns the [`PermutationData`] applied to the input rows.
    fn apply_permutation(
        &self,
        permutation: &Permutation,
        ciphertexts: &[CiphertextRow<C>],
        width: usize,
        crng: &mut SeededXof,
    ) -> Result<PermutationData<C>, Error> {
        let g = C::generator();
        let big_n = ciphertexts.len();

        let r_n: Vec<C::Scalar> = (0..big_n).map(|_| C::Scalar::random(crng)).collect();

        let mut rng = C::get_rng();
        let s_n: Vec<Vec<C::Scalar>> = (0..big_n)
            .map(|_| (0..width).map(|_| C::Scalar::random(&mut rng)).collect())
            .collect();

        let r_permuted = permutation.apply(&r_n)?;
        let h_permuted = permutation.apply(&self.h_generators)?;
        let w_permuted = permutation.apply_inverse(ciphertexts)?;
        let s_permuted = permutation.apply_inverse(&s_n)?;

        let u_n: Vec<C::Element> = r_permuted
            .into_par_iter()
            .zip(h_permuted.into_par_iter())
            .map(|(r, h)| g.exp(r).mul(h))
            .collect();

        let w_prime_n: Vec<CiphertextRow<C>> = w_permuted
            .into_par_iter()
            .zip(s_permuted.into_par_iter())
            .map(|(c, s)| row_re_encrypt::<C>(c, s, &self.pk.y))
            .collect();

        Ok(PermutationData {
            commitment_exponents: r_n,
            encryption_exponents: s_n,
            pedersen_commitments: u_n,
            permuted_ciphertexts: w_prime_n,
        })
    }

    /// Domain separation tags for the e-challenge input
    const DS_TAGS_CHALLENGE_E: [&'static [u8]; 4] = [
        b"pk",
        b"w_n",
        b"w_prime_n",
        b"shuffle_proof_challenge_e_context",
    ];

    /// Compute the e-challenge for the proof of shuffle.
    ///
    /// The transcript covers the public key, the input and output rows and
    /// the context label; per-row scalars are then derived from the
    /// transcript digest and the row index.
    fn challenge_e_n(
        &self,
        w_n: &[CiphertextRow<C>],
        w_prime_n: &[CiphertextRow<C>],
        context: &[u8],
    ) -> Result<Vec<C::Scalar>, Error> {
        let a = [
            self.pk.y.ser(),
            w_n.ser(),
            w_prime_n.ser(),
            context.to_vec(),
        ];
        let input: Vec<&[u8]> = a.iter().map(Vec::as_slice).collect();

        let mut hasher = C::get_hasher();
        hash::update_hasher(&mut hasher, &input, &Self::DS_TAGS_CHALLENGE_E);
        let bytes = hasher.finalize();

        let mut ret = Vec::with_capacity(w_n.len());
        for i in 0..w_n.len() {
            let counter = i.to_be_bytes();
            let inputs: &[&[u8]] = &[bytes.as_slice(), &counter];
            let ds_tags: &[&[u8]] = &[b"prefix", b"shuffle_proof_challenge_e_counter"];
            let scalar = C::G::hash_to_scalar(inputs, ds_tags)?;
            ret.push(scalar);
        }

        Ok(ret)
    }

    /// Domain separation tags for the v-challenge input
    const DS_TAGS_CHALLENGE_V: [&'static [u8]; 8] = [
        b"pk",
        b"big_b_n",
        b"big_a_prime",
        b"big_b_prime_n",
        b"big_c_prime",
        b"big_d_prime",
        b"big_f_prime_n",
        b"shuffle_challenge_input_v_context",
    ];

    /// Compute the v-challenge input for the proof of shuffle.
    ///
    /// Returns byte arrays for input values and domain separation tags.
    /// These values will be passed to the hash function to compute
    /// the challenge.
    fn challenge_input_v(
        &self,
        commitments: &ShuffleCommitments<C>,
        context: &[u8],
    ) -> ([Vec<u8>; 8], [&'static [u8]; 8]) {
        let a = [
            self.pk.y.ser(),
            commitments.big_b_n.ser(),
            commitments.big_a_prime.ser(),
            commitments.big_b_prime_n.ser(),
            commitments.big_c_prime.ser(),
            commitments.big_d_prime.ser(),
            commitments.big_f_prime.ser(),
            context.to_vec(),
        ];
        (a, Self::DS_TAGS_CHALLENGE_V)
    }
}

/// The identity row of the given width.
fn row_identity<C: Context>(width: usize) -> CiphertextRow<C> {
    (0..width)
        .map(|_| Ciphertext::new(C::Element::one(), C::Element::one()))
        .collect()
}

/// Component-wise product of two rows.
fn row_mul<C: Context>(a: &[Ciphertext<C>], b: &[Ciphertext<C>]) -> CiphertextRow<C> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| Ciphertext::new(x.u.mul(&y.u), x.v.mul(&y.v)))
        .collect()
}

/// Raise every component of a row to the given scalar.
fn row_exp<C: Context>(row: &[Ciphertext<C>], scalar: &C::Scalar) -> CiphertextRow<C> {
    row.iter()
        .map(|ct| Ciphertext::new(ct.u.exp(scalar), ct.v.exp(scalar)))
        .collect()
}

/// Re-encrypt a row with one exponent per chunk column.
fn row_re_encrypt<C: Context>(
    row: &[Ciphertext<C>],
    rs: &[C::Scalar],
    pk: &C::Element,
) -> CiphertextRow<C> {
    row.iter()
        .zip(rs.iter())
        .map(|(ct, r)| ct.re_encrypt(r, pk))
        .collect()
}

/// Convenience structure to hold re-encryption and permutation data
struct PermutationData<C: Context> {
    /// Commitment exponents, private
    commitment_exponents: Vec<C::Scalar>,
    /// Re-encryption exponents, private
    encryption_exponents: Vec<Vec<C::Scalar>>,
    /// Pedersen commitments, public
    pedersen_commitments: Vec<C::Element>,
    /// Permuted rows, public
    permuted_ciphertexts: Vec<CiphertextRow<C>>,
}

/**
 * Proof of shuffle.
 *
 * Given rows `w = w_1, w_2 .. w_n` and `w' = w'_1, w'_2 .. w'_n`
 * encrypted under public key `pk` proves that `w'` is a permutation of
 * re-encryptions of `w`. Equivalently, the list of plaintexts corresponding
 * to `w'` is a permutation of the plaintexts corresponding to `w`.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct ShuffleProof<C: Context> {
    /// Proof shuffle commitments
    pub commitments: ShuffleCommitments<C>,
    /// Challenge responses
    pub responses: Responses<C>,
}

/// Commitments for the shuffle proof
///
/// Includes bridging commitments, proof commitments and
/// pedersen commitments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct ShuffleCommitments<C: Context> {
    /// Bridging commitments
    pub(crate) big_b_n: Vec<C::Element>,

    /// Proof commitment `big_a_prime`
    pub(crate) big_a_prime: C::Element,

    /// Proof commitment `big_b_prime_n`
    pub(crate) big_b_prime_n: Vec<C::Element>,

    /// Proof commitment `big_c_prime`
    pub(crate) big_c_prime: C::Element,

    /// Proof commitment `big_d_prime`
    pub(crate) big_d_prime: C::Element,

    /// Proof commitment `big_f_prime`
    pub(crate) big_f_prime: CiphertextRow<C>,

    /// Pedersen commitments
    pub(crate) u_n: Vec<C::Element>,
}

/**
 * Responses to the challenge in the shuffle proof
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct Responses<C: Context> {
    /// Response `k_a`
    pub(crate) k_a: C::Scalar,

    /// Responses `k_b_n`
    pub(crate) k_b_n: Vec<C::Scalar>,

    /// Response `k_c`
    pub(crate) k_c: C::Scalar,

    /// Response `k_d`
    pub(crate) k_d: C::Scalar,

    /// Responses `k_e_n`
    pub(crate) k_e_n: Vec<C::Scalar>,

    /// Responses `k_f`, one per chunk column
    pub(crate) k_f: Vec<C::Scalar>,
}

/**
 * A permutation and its inverse in vector form
 *
 * The vector values corresponds to values in [one-line
 * notation](https://en.wikipedia.org/wiki/Permutation#One-line_notation).
 *
 * # Examples
 * ```
 * use cryptography::context::RistrettoCtx;
 * use cryptography::zkp::shuffle::Permutation;
 *
 * let data = vec!['A', 'B', 'C', 'D', 'E'];
 * let perm_data = Permutation::generate::<RistrettoCtx>(data.len());
 *
 * let permuted_refs = perm_data.apply(&data).unwrap();
 * let permuted: Vec<char> = permuted_refs.into_iter().copied().collect();
 *
 * let inversed_refs = perm_data.apply_inverse(&permuted).unwrap();
 * let inversed: Vec<char> = inversed_refs.into_iter().copied().collect();
 *
 * assert_eq!(data, inversed);
 * ```
 */
pub struct Permutation {
    /// The permutation vector.
    pub permutation: Vec<usize>,

    /// The inverse permutation vector.
    pub inverse: Vec<usize>,
}

impl Permutation {
    /// Generate a random permutation and its inverse.
    ///
    /// The permutation is picked uniformly from the set of all possible
    /// permutations using the Fisher-Yates algorithm over the context rng.
    ///
    /// Returns a new `Permutation` instance containing the generated permutation and its inverse.
    #[must_use]
    pub fn generate<C: Context>(size: usize) -> Self {
        let mut rng = C::get_rng();

        let mut permutation: Vec<usize> = (0..size).collect();
        Self::shuffle::<C>(&mut permutation, &mut rng);

        let mut inverse = vec![0usize; size];

        for (i, v) in permutation.iter().enumerate() {
            inverse[*v] = i;
        }

        Self {
            permutation,
            inverse,
        }
    }

    /// Shuffle the given integers in place using the Fisher-Yates algorithm.
    fn shuffle<C: Context>(data: &mut [usize], rng: &mut C::Rng) {
        for i in (1..data.len()).rev() {
            let j = rng.gen_range(0..=i);
            data.swap(i, j);
        }
    }

    /// The length of the permutation and inverse permutation
    #[must_use]
    pub fn len(&self) -> usize {
        // does not matter which field we choose, they are of equal size
        self.permutation.len()
    }

    /// Check if this is the empty permutation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Apply the permutation to the given slice.
    ///
    /// # Errors
    ///
    /// - `MismatchedPermutationLength` if the target slice length does not match the permutation length
    ///
    /// Returns a new vector with the permuted elements.
    pub fn apply<'a, T>(&self, target: &'a [T]) -> Result<Vec<&'a T>, Error> {
        let size = self.permutation.len();

        if target.len() != size {
            return Err(Error::MismatchedPermutationLength);
        }

        let mut permuted = vec![];
        permuted.resize_with(size, || {
            // Safe due to the above check ensuring target is not empty if size > 0
            &target[0]
        });

        // The element at original index `i` (target[i]) moves to the position `self.permutation[i]`.
        for (i, v_ref) in target.iter().enumerate() {
            permuted[self.permutation[i]] = v_ref;
        }

        Ok(permuted)
    }

    /// Apply the inverse permutation to the given slice.
    ///
    /// # Errors
    ///
    /// - `MismatchedPermutationLength` if the target slice length does not match the permutation length
    ///
    /// Returns a new vector with the permuted elements.
    pub fn apply_inverse<'a, T>(&self, target: &'a [T]) -> Result<Vec<&'a T>, Error> {
        let size = self.inverse.len();

        if target.len() != size {
            return Err(Error::MismatchedPermutationLength);
        }

        let mut permuted = vec![];
        permuted.resize_with(size, || {
            // Safe due to the above check ensuring target is not empty if size > 0
            &target[0]
        });

        // The element at original index `i` (target[i]) moves to the position `self.inverse[i]`.
        for (i, v_ref) in target.iter().enumerate() {
            permuted[self.inverse[i]] = v_ref;
        }

        Ok(permuted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::context::RistrettoCtx as Ctx;
    use crate::cryptosystem::elgamal::KeyPair;

    fn random_rows(keypair: &KeyPair<Ctx>, count: usize, width: usize) -> Vec<CiphertextRow<Ctx>> {
        (0..count)
            .map(|_| {
                (0..width)
                    .map(|_| keypair.pkey.encrypt_point(&Ctx::random_element()))
                    .collect()
            })
            .collect()
    }

    fn shuffler(keypair: &KeyPair<Ctx>, count: usize) -> Shuffler<Ctx> {
        let generators = <Ctx as Context>::G::ind_generators(count, b"test").unwrap();
        Shuffler::new(generators, keypair.pkey.clone())
    }

    #[test]
    fn test_shuffle() {
        for width in 1..=4 {
            let count = 10;
            let keypair = KeyPair::<Ctx>::generate();
            let ciphertexts = random_rows(&keypair, count, width);
            let shuffler = shuffler(&keypair, count);

            let (pciphertexts, proof) = shuffler.shuffle(&ciphertexts, b"seed", b"ctx").unwrap();
            let ok = shuffler.verify(&ciphertexts, &pciphertexts, &proof, b"ctx");

            assert!(ok.unwrap());
        }
    }

    #[test]
    fn test_shuffle_preserves_plaintexts() {
        let count = 4;
        let keypair = KeyPair::<Ctx>::generate();

        let messages: Vec<_> = (0..count).map(|_| Ctx::random_element()).collect();
        let ciphertexts: Vec<CiphertextRow<Ctx>> = messages
            .iter()
            .map(|m| vec![keypair.pkey.encrypt_point(m)])
            .collect();
        let shuffler = shuffler(&keypair, count);

        let (pciphertexts, proof) = shuffler.shuffle(&ciphertexts, b"seed", b"ctx").unwrap();
        assert!(shuffler
            .verify(&ciphertexts, &pciphertexts, &proof, b"ctx")
            .unwrap());

        let mut decrypted: Vec<_> = pciphertexts
            .iter()
            .map(|row| keypair.decrypt(&row[0]).ser())
            .collect();
        let mut original: Vec<_> = messages.iter().map(VSerializable::ser).collect();
        decrypted.sort();
        original.sort();
        assert_eq!(decrypted, original);
    }

    #[test]
    fn test_shuffle_invalid() {
        let count = 10;
        let keypair = KeyPair::<Ctx>::generate();
        let ciphertexts = random_rows(&keypair, count, 2);
        let shuffler = shuffler(&keypair, count);

        let (pciphertexts, proof) = shuffler.shuffle(&ciphertexts, b"seed", b"ctx").unwrap();
        assert!(shuffler
            .verify(&ciphertexts, &pciphertexts, &proof, b"ctx")
            .unwrap());

        // unrelated input rows must not verify
        let unrelated = random_rows(&keypair, count, 2);
        let not_ok = shuffler.verify(&unrelated, &pciphertexts, &proof, b"ctx");
        assert!(!not_ok.unwrap());

        // mismatched lengths are an error
        let not_ok = shuffler.verify(&unrelated[1..], &pciphertexts, &proof, b"ctx");
        assert!(not_ok.is_err());
    }

    #[test]
    fn test_shuffle_label() {
        let count = 10;
        let keypair = KeyPair::<Ctx>::generate();
        let ciphertexts = random_rows(&keypair, count, 3);
        let shuffler = shuffler(&keypair, count);

        let (pciphertexts, proof) = shuffler.shuffle(&ciphertexts, b"seed", b"label 1").unwrap();
        let ok = shuffler.verify(&ciphertexts, &pciphertexts, &proof, b"label 2");

        assert!(!ok.unwrap());
    }

    #[test]
    fn test_shuffle_tampered_proof() {
        let count = 6;
        let keypair = KeyPair::<Ctx>::generate();
        let ciphertexts = random_rows(&keypair, count, 1);
        let shuffler = shuffler(&keypair, count);

        let (pciphertexts, proof) = shuffler.shuffle(&ciphertexts, b"seed", b"ctx").unwrap();

        let mut tampered = proof.clone();
        tampered.responses.k_a = tampered.responses.k_a.add(&<Ctx as Context>::Scalar::one());
        assert!(!shuffler
            .verify(&ciphertexts, &pciphertexts, &tampered, b"ctx")
            .unwrap());
    }

    #[test]
    fn test_shuffle_serialization() {
        let count = 5;
        let keypair = KeyPair::<Ctx>::generate();
        let ciphertexts = random_rows(&keypair, count, 2);
        let shuffler = shuffler(&keypair, count);

        let (pciphertexts, proof) = shuffler.shuffle(&ciphertexts, b"seed", b"ctx").unwrap();

        let blob = serde_json::to_vec(&proof).unwrap();
        let parsed: ShuffleProof<Ctx> = serde_json::from_slice(&blob).unwrap();

        assert_eq!(proof, parsed);
        assert!(shuffler
            .verify(&ciphertexts, &pciphertexts, &parsed, b"ctx")
            .unwrap());
    }

    #[test]
    fn test_permutation_generation_and_inverse() {
        let size = 10;
        let perm = Permutation::generate::<Ctx>(size);

        // Test that all numbers from 0 to size-1 are present exactly once in permutation
        let mut p_sorted = perm.permutation.clone();
        p_sorted.sort_unstable();
        let expected_p_sorted: Vec<usize> = (0..size).collect();
        assert_eq!(
            p_sorted, expected_p_sorted,
            "Permutation values are not unique or complete."
        );

        // Verify inverse property: perm[inverse[i]] == i
        for i in 0..size {
            assert_eq!(
                perm.permutation[perm.inverse[i]], i,
                "Inverse property failed at index {}",
                i
            );
        }

        // Verify inverse property: inverse[perm[i]] == i
        for i in 0..size {
            assert_eq!(
                perm.inverse[perm.permutation[i]], i,
                "Inverse property failed at index {}",
                i
            );
        }
    }

    #[test]
    fn test_empty_permutation() {
        let perm = Permutation::generate::<Ctx>(0);
        assert_eq!(perm.len(), 0);
        assert!(perm.is_empty());

        let empty_vec: Vec<i32> = vec![];
        let applied_empty = perm.apply(&empty_vec).unwrap();
        assert!(applied_empty.is_empty());
        let applied_inverse_empty = perm.apply_inverse(&empty_vec).unwrap();
        assert!(applied_inverse_empty.is_empty());
    }

    #[test]
    fn test_mismatched_length() {
        let perm = Permutation::generate::<Ctx>(5);
        let small_data = vec![1, 2, 3];
        let err = perm.apply(&small_data);
        assert!(err.is_err());
        let err = perm.apply_inverse(&small_data);
        assert!(err.is_err());
    }
}
