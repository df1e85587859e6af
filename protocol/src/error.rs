// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Error type for the protocol crate, and the retry policy for
//! collaborator failures.

use std::time::{Duration, Instant};

use thiserror::Error;

/**
 * Error type for the protocol crate.
 *
 * Cryptographic and state-machine errors are fatal to the current operation
 * and roll it back; [`Error::TransportFailure`] and [`Error::StoreFailure`]
 * are retried at operation boundaries via [`retry_with_backoff`]. Proof
 * verification failures are never retried.
 */
#[derive(Error, Debug)]
pub enum Error {
    /// DKG setup has not yet completed on this node.
    #[error("dkg not initialized, setup has not completed on this node")]
    NotInitialized,

    /// Repeat setup on the initiator.
    #[error("dkg setup already run on this node")]
    AlreadySetUp,

    /// Nodes disagree on the collective public key.
    #[error("nodes disagree on the collective public key")]
    PublicKeysMismatch,

    /// A VSS deal failed signature, decryption or share verification.
    #[error("invalid deal: {0}")]
    InvalidDeal(String),

    /// A VSS response failed verification, or a peer complained.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A shuffle proof failed to verify.
    #[error("invalid shuffle proof: {0}")]
    InvalidShuffleProof(String),

    /// A pubshare DLEQ proof failed to verify.
    #[error("invalid pubshare proof: {0}")]
    InvalidPubshareProof(String),

    /// No election with this ID exists in the store.
    #[error("election {0} not found")]
    ElectionNotFound(String),

    /// The operation is not allowed in the election's current status.
    #[error("wrong status: {0}")]
    WrongStatus(String),

    /// Fewer than threshold valid pubshare units are available.
    #[error("insufficient pubshare units: have {have}, need {need}")]
    InsufficientShares {
        /// valid units present
        have: usize,
        /// threshold required
        need: usize,
    },

    /// A user ID does not parse as a nonnegative integer.
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),

    /// A ballot does not match the election's chunk count or encoding.
    #[error("malformed ballot: {0}")]
    BallotMalformed(String),

    /// An election configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Underlying cryptography error (chunk embedding, share verification, proofs).
    #[error(transparent)]
    Crypto(#[from] cryptography::utils::Error),

    /// Underlying transport failure.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Underlying store failure.
    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl Error {
    /// Whether the error is a collaborator failure worth retrying.
    fn is_transient(&self) -> bool {
        matches!(self, Error::TransportFailure(_) | Error::StoreFailure(_))
    }
}

/// Initial sleep of the exponential backoff.
const BACKOFF_BASE: Duration = Duration::from_millis(50);

/// Retry a fallible operation on transport and store failures.
///
/// Sleeps exponentially between attempts, bounded by the overall deadline.
/// Any non-transient error fails immediately.
///
/// # Errors
///
/// Returns the last error once the deadline expires, or the first
/// non-transient error.
pub fn retry_with_backoff<T>(
    deadline: Instant,
    mut op: impl FnMut() -> Result<T, Error>,
) -> Result<T, Error> {
    let mut backoff = BACKOFF_BASE;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && Instant::now() + backoff < deadline => {
                log::debug!("retrying after transient failure: {err}");
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_gives_up_on_fatal_errors() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut attempts = 0;
        let result: Result<(), Error> = retry_with_backoff(deadline, || {
            attempts += 1;
            Err(Error::NotInitialized)
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_retry_recovers_from_transient_failures() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut attempts = 0;
        let result = retry_with_backoff(deadline, || {
            attempts += 1;
            if attempts < 3 {
                Err(Error::StoreFailure("busy".to_string()))
            } else {
                Ok(attempts)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_respects_deadline() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let result: Result<(), Error> =
            retry_with_backoff(deadline, || Err(Error::StoreFailure("busy".to_string())));
        assert!(result.is_err());
    }
}
