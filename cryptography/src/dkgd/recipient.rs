// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Joint-Feldman distributed key generation: recipient

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::cryptosystem::elgamal::{Ciphertext, PublicKey};
use crate::dkgd::dealer::VerifiableShare;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;
use crate::utils::Error;
use crate::zkp::dlogeq::DlogEqProof;

/// A 1-based participant position in the dealing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPosition(pub u32);

impl ParticipantPosition {
    /// Construct a position from a 0-based index.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        ParticipantPosition(index as u32 + 1)
    }
}

/**
 * A recipient in the Joint-Feldman distributed key generation (DKG) protocol.
 *
 * A recipient collects one [`VerifiableShare`] from every dealer, verifies
 * them, and aggregates them into its private share `(i, x_i)` of the joint
 * secret. The joint public key and each recipient's verification key are
 * computable from the public checking values alone.
 *
 * # Examples
 *
 * ```
 * use cryptography::context::{Context, RistrettoCtx as RCtx};
 * use cryptography::dkgd::dealer::{Dealer, VerifiableShare};
 * use cryptography::dkgd::recipient::{combine, DecryptionFactor, ParticipantPosition, Recipient};
 *
 * const T: usize = 2;
 * const P: usize = 3;
 *
 * // Simulates the DKG protocol
 * let dealers: Vec<Dealer<RCtx>> = (0..P).map(|_| Dealer::generate(T, P).unwrap()).collect();
 *
 * let recipients: Vec<(Recipient<RCtx>, _)> = (0..P)
 *     .map(|i| {
 *         let position = ParticipantPosition::from_index(i);
 *         let shares: Vec<VerifiableShare<RCtx>> = dealers
 *             .iter()
 *             .map(|d| d.get_verifiable_shares().for_recipient(&position))
 *             .collect();
 *         Recipient::from_shares(position, &shares).unwrap()
 *     })
 *     .collect();
 *
 * // Simulates distributed decryption
 * let pk = &recipients[0].1;
 * let message = RCtx::random_element();
 * let encrypted = vec![pk.encrypt_point(&message)];
 *
 * let verification_keys: Vec<_> = recipients
 *     .iter()
 *     .map(|(r, _)| r.verification_key().clone())
 *     .collect();
 *
 * // a threshold subset computes decryption factors
 * let dfactors: Vec<Vec<DecryptionFactor<RCtx>>> = recipients[0..T]
 *     .iter()
 *     .map(|(r, _)| r.decryption_factor(&encrypted, &[]).unwrap())
 *     .collect();
 *
 * let decrypted = combine(&encrypted, &dfactors, &verification_keys, &[]).unwrap();
 * assert_eq!(message, decrypted[0]);
 * ```
 */
#[derive(Debug, Clone)]
pub struct Recipient<C: Context> {
    /// This recipient's 1-based position.
    pub position: ParticipantPosition,
    /// The aggregated private share `x_i`.
    share: C::Scalar,
    /// The verification key `g^f(i)` for the joint polynomial `f`.
    verification_key: C::Element,
}

impl<C: Context> Recipient<C> {
    /// Verify and aggregate one [`VerifiableShare`] per dealer into a recipient.
    ///
    /// Verifies every share against its dealer's checking values, sums the
    /// share values into the private share `x_i = sum_d f_d(i)`, and computes
    /// the joint public key `H = prod_d cv_{d,0}`.
    ///
    /// # Errors
    ///
    /// - `ShareVerificationFailed` if any share does not match its checking values
    pub fn from_shares(
        position: ParticipantPosition,
        shares: &[VerifiableShare<C>],
    ) -> Result<(Recipient<C>, PublicKey<C>), Error> {
        let mut share = C::Scalar::zero();
        let mut verification_key = C::Element::one();
        let mut joint = C::Element::one();

        for verifiable in shares {
            verifiable.verify(&position)?;

            share = share.add(&verifiable.value);
            verification_key = verification_key.mul(&eval_in_exponent::<C>(
                &verifiable.checking_values,
                &position,
            ));
            joint = joint.mul(&verifiable.checking_values[0]);
        }

        let recipient = Recipient {
            position,
            share,
            verification_key,
        };

        Ok((recipient, PublicKey::new(joint)))
    }

    /// Reconstruct a recipient from a persisted private share.
    ///
    /// The verification key is recomputed as `g^x_i`; no checking values are
    /// available (or needed) after certification.
    pub fn from_private_share(position: ParticipantPosition, share: C::Scalar) -> Recipient<C> {
        let verification_key = C::generator().exp(&share);
        Recipient {
            position,
            share,
            verification_key,
        }
    }

    /// The aggregated private share `x_i`.
    pub fn private_share(&self) -> &C::Scalar {
        &self.share
    }

    /// The verification key `g^x_i` of this recipient.
    pub fn verification_key(&self) -> &C::Element {
        &self.verification_key
    }

    /// Compute the verification key of any position from all dealers' checking values.
    pub fn verification_key_at(
        position: &ParticipantPosition,
        all_checking_values: &[Vec<C::Element>],
    ) -> C::Element {
        all_checking_values
            .iter()
            .fold(C::Element::one(), |acc, cvs| {
                acc.mul(&eval_in_exponent::<C>(cvs, position))
            })
    }

    /// Compute the joint public key from all dealers' checking values.
    pub fn joint_public_key(all_checking_values: &[Vec<C::Element>]) -> PublicKey<C> {
        let y = all_checking_values
            .iter()
            .fold(C::Element::one(), |acc, cvs| acc.mul(&cvs[0]));
        PublicKey::new(y)
    }

    /// Compute this recipient's decryption factors for the given ciphertexts.
    ///
    /// For each ciphertext `(u, v)` the factor is `u^x_i` together with a
    /// [`DlogEqProof`] that its discrete log matches the recipient's
    /// verification key.
    ///
    /// # Errors
    ///
    /// - Propagates challenge generation errors
    pub fn decryption_factor(
        &self,
        ciphertexts: &[Ciphertext<C>],
        proof_context: &[u8],
    ) -> Result<Vec<DecryptionFactor<C>>, Error> {
        let g = C::generator();

        ciphertexts
            .iter()
            .map(|ct| {
                let value = ct.u.exp(&self.share);
                let proof = DlogEqProof::prove(
                    &self.share,
                    &g,
                    &self.verification_key,
                    &ct.u,
                    &value,
                    proof_context,
                )?;

                Ok(DecryptionFactor {
                    value,
                    proof,
                    source: self.position,
                })
            })
            .collect()
    }
}

/// Evaluate committed polynomial checking values at a position, in the exponent.
///
/// Computes `prod_j cv_j^(i^j) = g^f(i)`.
fn eval_in_exponent<C: Context>(
    checking_values: &[C::Element],
    position: &ParticipantPosition,
) -> C::Element {
    let x: C::Scalar = position.0.into();
    let mut power = C::Scalar::one();
    let mut acc = C::Element::one();
    for cv in checking_values {
        acc = acc.mul(&cv.exp(&power));
        power = power.mul(&x);
    }
    acc
}

/**
 * A partial decryption of one ciphertext by one recipient.
 *
 * Contains the decryption factor `u^x_i` and a [`DlogEqProof`] tying it to
 * the recipient's verification key.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct DecryptionFactor<C: Context> {
    /// The decryption factor `u^x_i`.
    pub value: C::Element,
    /// Proof that `log_g(vk_i) = log_u(value)`.
    pub proof: DlogEqProof<C>,
    /// The contributing recipient's position.
    pub source: ParticipantPosition,
}

/// Compute the Lagrange coefficient at zero for `position` over the `present` subset.
pub fn lagrange<C: Context>(
    position: &ParticipantPosition,
    present: &[ParticipantPosition],
) -> C::Scalar {
    let mut numerator = C::Scalar::one();
    let mut denominator = C::Scalar::one();
    let position_exp: C::Scalar = position.0.into();

    for p in present {
        if p.0 == position.0 {
            continue;
        }

        let present_exp: C::Scalar = p.0.into();
        let diff_exp = present_exp.sub(&position_exp);

        numerator = numerator.mul(&present_exp);
        denominator = denominator.mul(&diff_exp);
    }

    // denominator is a product of non-zero differences of distinct positions
    numerator.mul(&denominator.inv().expect("distinct positions"))
}

/// Combine decryption factors from a threshold subset into the plaintexts.
///
/// `contributions` holds, per contributing recipient, one
/// [`DecryptionFactor`] per ciphertext. `verification_keys` is indexed by
/// position (entry `i - 1` for position `i`). Every proof is verified; a
/// contributor with any invalid proof is rejected wholesale.
///
/// # Errors
///
/// - `DecryptProofFailed` if any decryption factor proof fails to verify
/// - `MismatchedShuffleLength` if a contribution does not cover every ciphertext
pub fn combine<C: Context>(
    ciphertexts: &[Ciphertext<C>],
    contributions: &[Vec<DecryptionFactor<C>>],
    verification_keys: &[C::Element],
    proof_context: &[u8],
) -> Result<Vec<C::Element>, Error> {
    if contributions
        .iter()
        .any(|c| c.len() != ciphertexts.len() || c.is_empty())
    {
        return Err(Error::MismatchedShuffleLength);
    }

    let g = C::generator();
    let present: Vec<ParticipantPosition> = contributions.iter().map(|c| c[0].source).collect();
    for (i, position) in present.iter().enumerate() {
        if present[..i].contains(position) {
            return Err(Error::DecryptProofFailed(format!(
                "duplicate contribution from position {}",
                position.0
            )));
        }
    }

    let mut divisors = vec![C::Element::one(); ciphertexts.len()];

    for contribution in contributions {
        let source = &contribution[0].source;
        let vk = verification_keys
            .get((source.0 - 1) as usize)
            .ok_or_else(|| {
                Error::DecryptProofFailed(format!("no verification key for position {}", source.0))
            })?;

        for (factor, ct) in contribution.iter().zip(ciphertexts.iter()) {
            let ok = factor
                .proof
                .verify(&g, vk, &ct.u, &factor.value, proof_context)?;
            if !ok {
                return Err(Error::DecryptProofFailed(format!(
                    "invalid decryption factor proof from position {}",
                    source.0
                )));
            }
        }

        let coefficient = lagrange::<C>(source, &present);
        for (divisor, factor) in divisors.iter_mut().zip(contribution.iter()) {
            *divisor = divisor.mul(&factor.value.exp(&coefficient));
        }
    }

    let plaintexts = ciphertexts
        .iter()
        .zip(divisors.iter())
        .map(|(ct, divisor)| ct.v.mul(&divisor.inv()))
        .collect();

    Ok(plaintexts)
}

/// Combine re-dealt shares into a fresh share of the same joint secret.
///
/// Each entry of `shares` pairs the dealing recipient's position in the
/// *previous* committee with the [`VerifiableShare`] it re-dealt to this
/// recipient. The new share is the Lagrange-weighted sum of the re-dealt
/// values; the reconstructed joint public key is returned so callers can
/// check it against the established one.
///
/// # Errors
///
/// - `ShareVerificationFailed` if any re-dealt share does not match its checking values
pub fn combine_reshares<C: Context>(
    position: ParticipantPosition,
    shares: &[(ParticipantPosition, VerifiableShare<C>)],
) -> Result<(Recipient<C>, PublicKey<C>), Error> {
    let dealers: Vec<ParticipantPosition> = shares.iter().map(|(p, _)| *p).collect();

    let mut share = C::Scalar::zero();
    let mut joint = C::Element::one();

    for (dealer, verifiable) in shares {
        verifiable.verify(&position)?;

        let coefficient = lagrange::<C>(dealer, &dealers);
        share = share.add(&verifiable.value.mul(&coefficient));
        // cv_0 commits to the dealer's previous share of the joint secret
        joint = joint.mul(&verifiable.checking_values[0].exp(&coefficient));
    }

    let recipient = Recipient::from_private_share(position, share);
    Ok((recipient, PublicKey::new(joint)))
}
