// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Joint-Feldman distributed key generation: dealer

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::dkgd::recipient::ParticipantPosition;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;
use crate::utils::Error;

/**
 * A dealer in the Joint-Feldman distributed key generation (DKG) protocol.
 *
 * * NOTE: this API does not represent private shares as encrypted values.
 *   In the messaging layer, private shares should be encrypted with the recipient's
 *   public key.
 *
 * In the Joint-Feldman DKG, the dealer generates a random polynomial `f` of degree
 * `t - 1` and distributes `n` shares of its secret, `f(0)`, to all participants,
 * including itself. The dealer also publishes `t` checking values that allow the
 * participants to verify their shares.
 *
 * In the Joint-Feldman DKG:
 *
 * - Only the recipients can compute their secret share of the joint public key with
 *   their `n` private shares.
 *
 * - Anyone can compute the joint public key from public data.
 *
 * - Anyone can compute the recipients' verification keys from public data.
 *
 * At least `t` of the `n` participants are needed to decrypt ciphertexts encrypted
 * with the joint public key.
 *
 * See also [Recipient][`crate::dkgd::recipient::Recipient`]
 *
 * # Examples
 *
 * ```
 * use cryptography::context::RistrettoCtx as RCtx;
 * use cryptography::dkgd::dealer::Dealer;
 *
 * // 2-of-3 sharing
 * let dealer: Dealer<RCtx> = Dealer::generate(2, 3).unwrap();
 * let shares = dealer.get_verifiable_shares();
 * assert_eq!(shares.shares.len(), 3);
 * assert_eq!(shares.checking_values.len(), 2);
 * ```
 */
#[derive(Clone)]
pub struct Dealer<C: Context> {
    /// The polynomial used by this dealer to share their secret.
    pub(crate) polynomial: Polynomial<C>,
    /// Number of participants receiving shares.
    participants: usize,
}

impl<C: Context> Dealer<C> {
    /// Construct a new [`Dealer`] by randomly generating a `threshold - 1` degree polynomial.
    ///
    /// At least `threshold` of the `participants` will be needed to decrypt
    /// ciphertexts encrypted with the joint public key.
    ///
    /// # Errors
    ///
    /// - `InvalidThreshold` unless `0 < threshold <= participants`
    pub fn generate(threshold: usize, participants: usize) -> Result<Self, Error> {
        Self::check(threshold, participants)?;

        let polynomial = Polynomial::<C>::generate(threshold);
        Ok(Self {
            polynomial,
            participants,
        })
    }

    /// Construct a [`Dealer`] that re-deals an existing share of a joint secret.
    ///
    /// The polynomial's constant term is the current share, so the re-dealt
    /// shares reconstruct the same joint secret once combined with the
    /// Lagrange weights of the dealing committee
    /// (see [`combine_reshares`][`crate::dkgd::recipient::combine_reshares`]).
    ///
    /// # Errors
    ///
    /// - `InvalidThreshold` unless `0 < threshold <= participants`
    pub fn reshare(
        current_share: C::Scalar,
        threshold: usize,
        participants: usize,
    ) -> Result<Self, Error> {
        Self::check(threshold, participants)?;

        let polynomial = Polynomial::<C>::generate_with_constant(current_share, threshold);
        Ok(Self {
            polynomial,
            participants,
        })
    }

    fn check(threshold: usize, participants: usize) -> Result<(), Error> {
        if threshold == 0 || participants == 0 || threshold > participants {
            return Err(Error::InvalidThreshold {
                threshold,
                participants,
            });
        }
        Ok(())
    }

    /// Compute the shares distributed by this dealer, and its checking values.
    ///
    /// Returns a [`DealerShares`] instance containing the shares and checking values.
    pub fn get_verifiable_shares(&self) -> DealerShares<C> {
        DealerShares::new(self.get_shares(), self.get_checking_values())
    }

    /// Compute the shares distributed by this dealer.
    ///
    /// Each share is computed as `f(i)` for `i = 1, ..., n`.
    /// Use [`Self::get_verifiable_shares`] to obtain the shares [along
    /// with][`DealerShares`] their checking values.
    pub(crate) fn get_shares(&self) -> Vec<C::Scalar> {
        (1..=self.participants)
            .map(|recipient| {
                let recipient: C::Scalar = (recipient as u32).into();
                self.polynomial.eval(&recipient)
            })
            .collect()
    }

    /// Compute the checking values for this dealer's polynomial.
    ///
    /// Each checking value is computed as `g^polynomial_coefficient`.
    /// Use [`Self::get_verifiable_shares`] to obtain the shares [along
    /// with][`DealerShares`] their checking values.
    pub(crate) fn get_checking_values(&self) -> Vec<C::Element> {
        let g = C::generator();
        self.polynomial.0.iter().map(|v| g.exp(v)).collect()
    }
}

/**
 * A polynomial of degree `t - 1` over the scalar field of the elliptic curve group, `C::G`.
 *
 * This polynomial is used by the dealer to generate shares and checking values
 * for the participants in the DKG protocol. The polynomial is defined by `t` coefficients
 * of type `C::Scalar`, as are its arguments `x` and values `f(x)`.
 */
#[derive(Clone)]
pub struct Polynomial<C: Context>(pub(crate) Vec<C::Scalar>);

impl<C: Context> Polynomial<C> {
    /// Generate a random polynomial with `threshold` coefficients.
    ///
    /// Returns a new [`Polynomial`] instance.
    #[must_use]
    pub fn generate(threshold: usize) -> Self {
        let coefficients: Vec<C::Scalar> = (0..threshold).map(|_| C::random_scalar()).collect();

        Self(coefficients)
    }

    /// Generate a random polynomial with the given constant term.
    ///
    /// Used for resharing, where `f(0)` must equal an existing share.
    #[must_use]
    pub fn generate_with_constant(constant: C::Scalar, threshold: usize) -> Self {
        let mut coefficients = vec![constant];
        coefficients.extend((1..threshold).map(|_| C::random_scalar()));

        Self(coefficients)
    }

    /// Evaluate the polynomial at a given point `x`.
    ///
    /// Returns the scalar `k`, where `k = f(x)`.
    pub fn eval(&self, x: &C::Scalar) -> C::Scalar {
        let mut sum: C::Scalar = self.0[0].clone();
        let mut power = C::Scalar::one();

        for v in self.0.iter().skip(1) {
            power = power.mul(x);
            sum = sum.add(&v.mul(&power));
        }

        sum
    }
}

/**
 * The set of verifiable shares produced by one dealer in the DKG protocol.
 *
 * A [`DealerShares`] contains one share for each of the `n` participants, together
 * with the dealer's `t` checking values. The set of *all* shares and checking
 * values for a protocol execution would be of type `Vec<DealerShares>`.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct DealerShares<C: Context> {
    /// The shares distributed to each participant, offset by -1.
    /// For example, the share for participant 1 is stored at index 0.
    pub shares: Vec<C::Scalar>,
    /// The checking values for the dealer's shares.
    pub checking_values: Vec<C::Element>,
}

impl<C: Context> DealerShares<C> {
    /// Construct a new [`DealerShares`] instance from the given values.
    ///
    /// The standard way to compute the shares distributed by a [`Dealer`] is
    /// through the [`Dealer::get_verifiable_shares`] method.
    pub(crate) fn new(shares: Vec<C::Scalar>, checking_values: Vec<C::Element>) -> Self {
        Self {
            shares,
            checking_values,
        }
    }

    /// Return the share for the requested recipient as specified by the given [`ParticipantPosition`].
    ///
    /// This method will select the share assigned to the required recipient from the set
    /// of all shares computed by the [`Dealer`].
    #[must_use]
    pub fn for_recipient(&self, recipient: &ParticipantPosition) -> VerifiableShare<C> {
        // ParticipantPosition values are 1-based
        let index = (recipient.0 - 1) as usize;
        VerifiableShare::new(self.shares[index].clone(), self.checking_values.clone())
    }
}

/**
 * One verifiable share distributed by one dealer to one recipient, in the DKG protocol.
 *
 * A [`VerifiableShare`] contains a secret scalar and the dealer's `t` checking values
 * necessary to verify the correctness of the share. The secret share of the joint public
 * key held by a recipient is the sum of the `n` secret scalars it receives from all
 * dealers (participants), including itself.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct VerifiableShare<C: Context> {
    /// the secret share as a raw scalar
    pub value: C::Scalar,
    /// the checking values for the dealer's shares
    pub checking_values: Vec<C::Element>,
}

impl<C: Context> VerifiableShare<C> {
    /// Construct a new [`VerifiableShare`] from the given values.
    ///
    /// The standard way to obtain verifiable shares for some recipient is through
    /// the [`Dealer::get_verifiable_shares`] method combined with the [`DealerShares::for_recipient`]
    /// method.
    pub fn new(value: C::Scalar, checking_values: Vec<C::Element>) -> Self {
        Self {
            value,
            checking_values,
        }
    }

    /// Verify this share against the dealer's checking values.
    ///
    /// Checks that `g^value = prod_j cv_j^(i^j)` for the recipient at
    /// position `i`, which holds exactly when `value = f(i)` for the
    /// committed polynomial `f`.
    ///
    /// # Errors
    ///
    /// - `ShareVerificationFailed` if the check fails
    pub fn verify(&self, position: &ParticipantPosition) -> Result<(), Error> {
        let g = C::generator();
        let lhs = g.exp(&self.value);

        let x: C::Scalar = position.0.into();
        let mut power = C::Scalar::one();
        let mut rhs = C::Element::one();
        for cv in &self.checking_values {
            rhs = rhs.mul(&cv.exp(&power));
            power = power.mul(&x);
        }

        if lhs.equals(&rhs) {
            Ok(())
        } else {
            Err(Error::ShareVerificationFailed(format!(
                "share for position {} does not match checking values",
                position.0
            )))
        }
    }
}
