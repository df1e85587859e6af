// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! The shuffle chain engine: one re-encryption mix per committee node, in
//! roster order, each instance carrying a proof verified at the store
//! boundary.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ed25519_dalek::SigningKey;

use cryptography::context::Context;
use cryptography::cryptosystem::elgamal::PublicKey;
use cryptography::traits::groups::CryptographicGroup;
use cryptography::zkp::shuffle::{ShuffleProof, Shuffler};

use crate::elections::{Election, ShuffleInstance};
use crate::error::{retry_with_backoff, Error};
use crate::store::{Event, MemStore, Transaction};
use crate::{Ctx, Element};

/// Domain separation label binding a shuffle proof to its election and
/// chain position.
fn shuffle_context(election_id: &str, round: usize) -> Vec<u8> {
    format!("{election_id}:shuffle:{round}").into_bytes()
}

/// Build the shuffler for one election's current ballot count.
fn shuffler_for(election: &Election, count: usize) -> Result<Shuffler<Ctx>, Error> {
    let pubkey = election
        .pubkey
        .clone()
        .ok_or_else(|| Error::WrongStatus("election has no collective key".to_string()))?;
    let generators =
        <Ctx as Context>::G::ind_generators(count, election.election_id.as_bytes())?;

    Ok(Shuffler::new(generators, PublicKey::new(pubkey)))
}

/// Produce this node's shuffle instance over the election's current ballots.
///
/// Picks a uniform random permutation and fresh re-encryption scalars from
/// the system rng; only the proof's internal commitments come from the
/// stream seeded by `seed`, so auditors holding the seed can re-derive them.
///
/// # Errors
///
/// - `WrongStatus` if the election carries no collective key
/// - Propagates proof generation errors
pub fn make_shuffle_instance(
    election: &Election,
    shuffler_key: &Element,
    seed: &[u8],
) -> Result<ShuffleInstance, Error> {
    let ballots = election.last_ballots();
    let round = election.shuffle_instances.len();

    let shuffler = shuffler_for(election, ballots.len())?;
    let context = shuffle_context(&election.election_id, round);
    let (shuffled, proof) = shuffler.shuffle(ballots, seed, &context)?;

    let shuffle_proof = serde_json::to_vec(&proof)
        .map_err(|e| Error::InvalidShuffleProof(format!("cannot encode proof: {e}")))?;

    Ok(ShuffleInstance {
        shuffled_ballots: shuffled,
        shuffle_proof,
        shuffler_public_key: shuffler_key.clone(),
    })
}

/// Verify a shuffle instance against the election's current chain tip.
///
/// Recomputes the transcript for the next chain position and checks every
/// challenge equation; a failed proof is permanently rejected, never
/// retried.
///
/// # Errors
///
/// - `InvalidShuffleProof` if the proof blob does not parse or does not verify
pub fn verify_shuffle_instance(
    election: &Election,
    instance: &ShuffleInstance,
) -> Result<(), Error> {
    let ballots = election.last_ballots();
    let round = election.shuffle_instances.len();

    let proof: ShuffleProof<Ctx> = serde_json::from_slice(&instance.shuffle_proof)
        .map_err(|e| Error::InvalidShuffleProof(format!("cannot decode proof: {e}")))?;

    let shuffler = shuffler_for(election, ballots.len())?;
    let context = shuffle_context(&election.election_id, round);
    let ok = shuffler
        .verify(ballots, &instance.shuffled_ballots, &proof, &context)
        .map_err(|e| Error::InvalidShuffleProof(e.to_string()))?;

    if ok {
        Ok(())
    } else {
        Err(Error::InvalidShuffleProof(
            "proof does not verify against the chain tip".to_string(),
        ))
    }
}

/// Drive one node's slot of the shuffle chain.
///
/// The chain is strictly sequential: roster node `i` shuffles at chain
/// position `i`, waiting until the previous instance has been admitted. A
/// node that finds its slot already filled skips without error. Store
/// submission failures are retried with exponential backoff, bounded by
/// `deadline`; a rejected proof leaves the slot open for a fresh attempt by
/// the same shuffler.
///
/// Returns `true` if this call contributed an instance, `false` if the slot
/// was already filled.
///
/// # Errors
///
/// - `TransportFailure` if the previous slot does not commit before the deadline
/// - Any store rejection other than a transient failure
pub fn run_shuffle(
    store: &Arc<Mutex<MemStore>>,
    election_id: &str,
    shuffler_key: &Element,
    signer: &SigningKey,
    seed: &[u8],
    deadline: Instant,
) -> Result<bool, Error> {
    let position = {
        let guard = lock_store(store)?;
        let election = guard.get_election(election_id)?;
        election.roster_index(shuffler_key).ok_or_else(|| {
            Error::StoreFailure("node is not a member of the election roster".to_string())
        })?
    };

    loop {
        let election = {
            let guard = lock_store(store)?;
            guard.get_election(election_id)?
        };

        if election.has_shuffled(shuffler_key) {
            log::debug!("election {election_id}: slot already filled, skipping");
            return Ok(false);
        }

        let chain_len = election.shuffle_instances.len();
        if chain_len >= position {
            let instance = make_shuffle_instance(&election, shuffler_key, seed)?;

            let result = retry_with_backoff(deadline, || {
                let mut guard = lock_store(store)?;
                let nonce = guard.get_nonce(signer.verifying_key().as_bytes());
                let tx = Transaction::sign(
                    nonce,
                    signer,
                    Event::ShuffleBallots {
                        election_id: election_id.to_string(),
                        instance: instance.clone(),
                    },
                )?;
                guard.submit(tx)
            });

            match result {
                Ok(_) => {
                    log::info!("election {election_id}: contributed shuffle {}", chain_len);
                    return Ok(true);
                }
                Err(Error::InvalidShuffleProof(reason)) => {
                    let tip = lock_store(store)?
                        .get_election(election_id)?
                        .shuffle_instances
                        .len();
                    if tip == chain_len {
                        return Err(Error::InvalidShuffleProof(reason));
                    }
                    // a concurrent commit moved the chain tip; re-read and retry
                    continue;
                }
                Err(err) => {
                    // a concurrent submission by this node filled the slot
                    // between the pre-check and the commit; that is a skip
                    if lock_store(store)?
                        .get_election(election_id)?
                        .has_shuffled(shuffler_key)
                    {
                        log::debug!("election {election_id}: slot filled concurrently, skipping");
                        return Ok(false);
                    }
                    return Err(err);
                }
            }
        }

        if Instant::now() >= deadline {
            return Err(Error::TransportFailure(format!(
                "previous shuffle slot did not commit before the deadline (chain at {chain_len}, need {position})"
            )));
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Lock the shared store, surfacing poisoning as a store failure.
fn lock_store(store: &Arc<Mutex<MemStore>>) -> Result<std::sync::MutexGuard<'_, MemStore>, Error> {
    store
        .lock()
        .map_err(|_| Error::StoreFailure("store lock poisoned".to_string()))
}
