// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Threshold decryption: per-node pubshare computation over the final
//! shuffle, all-or-nothing unit verification, and Lagrange recombination
//! into the plaintext tally.

use cryptography::context::Context;
use cryptography::dkgd::recipient::{combine, DecryptionFactor, ParticipantPosition, Recipient};
use cryptography::traits::groups::CryptographicGroup;

use crate::elections::{Election, Pubshare, PubsharesUnit};
use crate::error::Error;
use crate::{Ctx, Element, Scalar};

/// Domain separation label for pubshare DLEQ proofs of one election.
fn pubshare_context(election_id: &str) -> Vec<u8> {
    format!("{election_id}:pubshares").into_bytes()
}

/// Require a finalized shuffle chain, returning the final ballots.
fn final_ballots(election: &Election) -> Result<&[crate::elections::EncryptedBallot], Error> {
    if election.shuffle_instances.len() < election.shuffle_threshold {
        return Err(Error::WrongStatus(format!(
            "shuffle chain has {} of {} instances",
            election.shuffle_instances.len(),
            election.shuffle_threshold
        )));
    }
    Ok(election.last_ballots())
}

/// Compute one node's pubshares unit over the final shuffled ballots.
///
/// For every ballot `b` and chunk `c` the unit carries `D = x_i * K_{b,c}`
/// with a DLEQ proof tying it to the node's verification key.
///
/// # Errors
///
/// - `WrongStatus` if the shuffle chain is not finalized
/// - Propagates proof generation errors
pub fn compute_pubshares(
    election: &Election,
    index: u32,
    private_share: &Scalar,
    public_key: &Element,
) -> Result<PubsharesUnit, Error> {
    let ballots = final_ballots(election)?;
    let context = pubshare_context(&election.election_id);

    let recipient =
        Recipient::<Ctx>::from_private_share(ParticipantPosition(index + 1), private_share.clone());

    let pubshares = ballots
        .iter()
        .map(|ballot| {
            let factors = recipient.decryption_factor(ballot, &context)?;
            Ok(factors
                .into_iter()
                .map(|factor| Pubshare {
                    value: factor.value,
                    proof: factor.proof,
                })
                .collect())
        })
        .collect::<Result<Vec<Vec<Pubshare>>, Error>>()?;

    Ok(PubsharesUnit {
        pubshares,
        index,
        public_key: public_key.clone(),
    })
}

/// Verify a pubshares unit against the election's verification keys.
///
/// Rejection is atomic: one bad proof (or any dimension mismatch) rejects
/// the whole unit.
///
/// # Errors
///
/// - `InvalidPubshareProof` if any proof or dimension check fails
pub fn verify_pubshares_unit(election: &Election, unit: &PubsharesUnit) -> Result<(), Error> {
    let ballots = final_ballots(election)?;
    let context = pubshare_context(&election.election_id);

    let vk = election
        .verification_keys
        .get(unit.index as usize)
        .ok_or_else(|| {
            Error::InvalidPubshareProof(format!("no verification key for index {}", unit.index))
        })?;

    if unit.pubshares.len() != ballots.len() {
        return Err(Error::InvalidPubshareProof(format!(
            "unit covers {} ballots, election has {}",
            unit.pubshares.len(),
            ballots.len()
        )));
    }

    let g = Ctx::generator();
    for (row, ballot) in unit.pubshares.iter().zip(ballots.iter()) {
        if row.len() != ballot.len() {
            return Err(Error::InvalidPubshareProof(format!(
                "row covers {} chunks, ballot has {}",
                row.len(),
                ballot.len()
            )));
        }
        for (pubshare, ciphertext) in row.iter().zip(ballot.iter()) {
            let ok = pubshare
                .proof
                .verify(&g, vk, &ciphertext.u, &pubshare.value, &context)?;
            if !ok {
                return Err(Error::InvalidPubshareProof(format!(
                    "bad dleq proof in unit of index {}",
                    unit.index
                )));
            }
        }
    }

    Ok(())
}

/// Combine the registered pubshare units into the plaintext ballots.
///
/// Uses the first `t` registered units (their indices are unique by the
/// store's admission rule), Lagrange-recombines every chunk at zero, decodes
/// the plaintext points back to byte chunks, and concatenates them per
/// ballot; embedded chunk lengths strip the padding.
///
/// # Errors
///
/// - `InsufficientShares` if fewer than threshold units are registered
/// - `InvalidPubshareProof` if a unit fails verification
pub fn combine_shares(election: &Election) -> Result<Vec<Vec<u8>>, Error> {
    let threshold = election.shuffle_threshold;
    if election.pubshares_units.len() < threshold {
        return Err(Error::InsufficientShares {
            have: election.pubshares_units.len(),
            need: threshold,
        });
    }

    let ballots = final_ballots(election)?;
    let context = pubshare_context(&election.election_id);
    let units = &election.pubshares_units[..threshold];

    let mut plaintexts = Vec::with_capacity(ballots.len());
    for (b, ballot) in ballots.iter().enumerate() {
        let contributions: Vec<Vec<DecryptionFactor<Ctx>>> = units
            .iter()
            .map(|unit| {
                unit.pubshares[b]
                    .iter()
                    .map(|pubshare| DecryptionFactor {
                        value: pubshare.value.clone(),
                        proof: pubshare.proof.clone(),
                        source: ParticipantPosition(unit.index + 1),
                    })
                    .collect()
            })
            .collect();

        let points = combine(
            ballot,
            &contributions,
            &election.verification_keys,
            &context,
        )
        .map_err(|e| Error::InvalidPubshareProof(e.to_string()))?;

        let mut message = Vec::with_capacity(election.ballot_size);
        for point in &points {
            message.extend(<Ctx as Context>::G::decode_chunk(point)?);
        }
        plaintexts.push(message);
    }

    Ok(plaintexts)
}
