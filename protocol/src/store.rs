// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! The ordering store: signed transactions, per-identity nonces and the
//! election state machine applied at the store boundary.
//!
//! Transactions are the only mutators. Every guard of the lifecycle table
//! (status, ballot shape, proof validity, roster membership, thresholds,
//! admin rights) is enforced here; a violated guard rolls the transaction
//! back with a descriptive error and leaves the committed state untouched.

use std::collections::{BTreeMap, HashMap};

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use cryptography::traits::groups::GroupElement;

use crate::decrypt;
use crate::elections::{
    shuffle_threshold, Configuration, Election, EncryptedBallot, PublicBulletinBoard,
    PubsharesUnit, Roster, ShuffleInstance, Status,
};
use crate::error::Error;
use crate::forms::{parse_user_id, AdminForm};
use crate::shuffle;
use crate::Element;

/// Read access to committed state, keyed by raw record ID bytes.
pub trait Readable {
    /// Get the committed bytes for a key, if any.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` on collaborator failure
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;
}

/// An event appended to the store by a signed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Create an election in `Initial` status.
    CreateElection {
        /// The ballot configuration.
        configuration: Configuration,
        /// The admin creating the election.
        admin_id: String,
        /// The ordered committee.
        roster: Roster,
    },
    /// Publish the collective key and open the election for ballots.
    OpenElection {
        /// The election to open.
        election_id: String,
        /// The collective public key from the DKG.
        pubkey: Element,
        /// Roster-ordered share verification keys `g^x_i`.
        verification_keys: Vec<Element>,
    },
    /// Cast or replace a user's encrypted ballot.
    CastVote {
        /// The election voted in.
        election_id: String,
        /// The voting user.
        user_id: String,
        /// The encrypted ballot, padded to the election's chunk count.
        ballot: EncryptedBallot,
    },
    /// Stop accepting ballots.
    CloseElection {
        /// The election to close.
        election_id: String,
    },
    /// Append a shuffle instance to the chain.
    ShuffleBallots {
        /// The election being shuffled.
        election_id: String,
        /// The shuffle instance with its proof.
        instance: ShuffleInstance,
    },
    /// Register one node's pubshares over the final shuffle.
    RegisterPubshares {
        /// The election being decrypted.
        election_id: String,
        /// The pubshares unit with its proofs.
        unit: PubsharesUnit,
    },
    /// Combine the registered pubshares into the plaintext tally.
    CombineShares {
        /// The election to tally.
        election_id: String,
    },
    /// Cancel the election.
    CancelElection {
        /// The election to cancel.
        election_id: String,
        /// The user requesting cancellation; must be the admin.
        user_id: String,
    },
    /// Create the admin form.
    CreateForm {
        /// The initial admin user ID.
        admin_id: String,
    },
    /// Add an admin to a form.
    AddAdmin {
        /// The form to update.
        form_id: String,
        /// The user to add.
        user_id: String,
    },
    /// Remove an admin from a form.
    RemoveAdmin {
        /// The form to update.
        form_id: String,
        /// The user to remove.
        user_id: String,
    },
}

impl Event {
    /// The record this event addresses, `None` for creation events.
    fn target_id(&self) -> Option<&str> {
        match self {
            Event::CreateElection { .. } | Event::CreateForm { .. } => None,
            Event::OpenElection { election_id, .. }
            | Event::CastVote { election_id, .. }
            | Event::CloseElection { election_id }
            | Event::ShuffleBallots { election_id, .. }
            | Event::RegisterPubshares { election_id, .. }
            | Event::CombineShares { election_id }
            | Event::CancelElection { election_id, .. } => Some(election_id),
            Event::AddAdmin { form_id, .. } | Event::RemoveAdmin { form_id, .. } => Some(form_id),
        }
    }
}

/// A signed, nonce'd transaction carrying one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Per-identity monotonically increasing nonce.
    pub nonce: u64,
    /// The signer's ed25519 verifying key bytes.
    pub signer: Vec<u8>,
    /// The event payload.
    pub event: Event,
    /// Ed25519 signature over the canonical payload bytes.
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Sign an event under the given key and nonce.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if the payload cannot be serialized
    pub fn sign(nonce: u64, signer: &SigningKey, event: Event) -> Result<Transaction, Error> {
        let signer_bytes = signer.verifying_key().to_bytes().to_vec();
        let payload = Self::payload_bytes(nonce, &signer_bytes, &event)?;
        let signature = signer.sign(&payload).to_bytes().to_vec();

        Ok(Transaction {
            nonce,
            signer: signer_bytes,
            event,
            signature,
        })
    }

    /// Verify the transaction signature.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if the signer key or signature is malformed or does not verify
    pub fn verify(&self) -> Result<(), Error> {
        let key_bytes: [u8; 32] = self
            .signer
            .as_slice()
            .try_into()
            .map_err(|_| Error::StoreFailure("malformed signer key".to_string()))?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| Error::StoreFailure(format!("malformed signer key: {e}")))?;

        let sig_bytes: [u8; 64] = self
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| Error::StoreFailure("malformed signature".to_string()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        let payload = Self::payload_bytes(self.nonce, &self.signer, &self.event)?;
        key.verify(&payload, &signature)
            .map_err(|e| Error::StoreFailure(format!("bad transaction signature: {e}")))
    }

    /// The hex-encoded SHA256 transaction ID over payload and signature.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if the payload cannot be serialized
    pub fn id(&self) -> Result<String, Error> {
        let mut hasher = Sha256::new();
        hasher.update(Self::payload_bytes(self.nonce, &self.signer, &self.event)?);
        hasher.update(&self.signature);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Canonical signed bytes: nonce, signer and event in declaration order.
    fn payload_bytes(nonce: u64, signer: &[u8], event: &Event) -> Result<Vec<u8>, Error> {
        #[derive(Serialize)]
        struct Payload<'a> {
            nonce: u64,
            signer: String,
            event: &'a Event,
        }

        serde_json::to_vec(&Payload {
            nonce,
            signer: hex::encode(signer),
            event,
        })
        .map_err(|e| Error::StoreFailure(format!("cannot serialize payload: {e}")))
    }
}

/// A simple store that keeps committed records in an in-memory map.
///
/// Reads observe committed state only; `submit` is the single writer, which
/// makes reads linearizable when the store is shared behind a lock.
#[derive(Default)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    nonces: HashMap<String, u64>,
}

impl Readable for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.entries.get(key).cloned())
    }
}

impl MemStore {
    /// Next expected nonce for an identity.
    #[must_use]
    pub fn get_nonce(&self, signer: &[u8]) -> u64 {
        self.nonces.get(&hex::encode(signer)).copied().unwrap_or(0)
    }

    /// Get an election record.
    ///
    /// # Errors
    ///
    /// - `ElectionNotFound` if no election exists under the ID
    /// - `StoreFailure` if the committed bytes do not parse
    pub fn get_election(&self, id_hex: &str) -> Result<Election, Error> {
        let key = hex::decode(id_hex)
            .map_err(|_| Error::ElectionNotFound(id_hex.to_string()))?;
        let bytes = self
            .get(&key)?
            .ok_or_else(|| Error::ElectionNotFound(id_hex.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::StoreFailure(format!("cannot decode election: {e}")))
    }

    /// Get an admin form record.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if no form exists under the ID or it does not parse
    pub fn get_admin_form(&self, id_hex: &str) -> Result<AdminForm, Error> {
        let key = hex::decode(id_hex)
            .map_err(|_| Error::StoreFailure(format!("malformed form id {id_hex}")))?;
        let bytes = self
            .get(&key)?
            .ok_or_else(|| Error::StoreFailure(format!("form {id_hex} not found")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::StoreFailure(format!("cannot decode form: {e}")))
    }

    /// Submit a transaction: verify its signature and nonce, apply its event
    /// under the lifecycle guards, and commit.
    ///
    /// Returns the ID of the affected record.
    ///
    /// # Errors
    ///
    /// Any guard violation; the committed state is unchanged on error.
    pub fn submit(&mut self, tx: Transaction) -> Result<String, Error> {
        tx.verify()?;

        let signer_hex = hex::encode(&tx.signer);
        let expected = self.nonces.get(&signer_hex).copied().unwrap_or(0);
        if tx.nonce != expected {
            return Err(Error::StoreFailure(format!(
                "bad nonce for {signer_hex}: got {}, expected {expected}",
                tx.nonce
            )));
        }

        let id = match tx.event.target_id() {
            Some(target) => target.to_string(),
            None => tx.id()?,
        };
        self.apply(&id, &tx.event)?;

        self.nonces.insert(signer_hex, expected + 1);
        Ok(id)
    }

    /// Apply one event to the addressed record.
    fn apply(&mut self, id_hex: &str, event: &Event) -> Result<(), Error> {
        match event {
            Event::CreateElection {
                configuration,
                admin_id,
                roster,
            } => self.create_election(id_hex, configuration, admin_id, roster),
            Event::OpenElection {
                election_id,
                pubkey,
                verification_keys,
            } => self.open_election(election_id, pubkey, verification_keys),
            Event::CastVote {
                election_id,
                user_id,
                ballot,
            } => self.cast_vote(election_id, user_id, ballot),
            Event::CloseElection { election_id } => self.close_election(election_id),
            Event::ShuffleBallots {
                election_id,
                instance,
            } => self.shuffle_ballots(election_id, instance),
            Event::RegisterPubshares { election_id, unit } => {
                self.register_pubshares(election_id, unit)
            }
            Event::CombineShares { election_id } => self.combine_shares(election_id),
            Event::CancelElection {
                election_id,
                user_id,
            } => self.cancel_election(election_id, user_id),
            Event::CreateForm { admin_id } => self.create_form(id_hex, admin_id),
            Event::AddAdmin { form_id, user_id } => {
                self.with_form(form_id, |form| form.add_admin(user_id))
            }
            Event::RemoveAdmin { form_id, user_id } => {
                self.with_form(form_id, |form| form.remove_admin(user_id))
            }
        }
    }

    fn create_election(
        &mut self,
        id_hex: &str,
        configuration: &Configuration,
        admin_id: &str,
        roster: &Roster,
    ) -> Result<(), Error> {
        if !configuration.is_valid() {
            return Err(Error::InvalidConfiguration(
                "duplicate question id in scaffold".to_string(),
            ));
        }
        if roster.len() < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "roster of {} nodes is below the minimum of 2",
                roster.len()
            )));
        }
        parse_user_id(admin_id)?;

        let election = Election {
            configuration: configuration.clone(),
            election_id: id_hex.to_string(),
            admin_id: admin_id.to_string(),
            status: Status::Initial,
            pubkey: None,
            ballot_size: configuration.max_ballot_size(),
            verification_keys: vec![],
            public_bulletin_board: PublicBulletinBoard::default(),
            shuffle_instances: vec![],
            shuffle_threshold: shuffle_threshold(roster.len()),
            pubshares_units: vec![],
            decrypted_ballots: vec![],
            roster: roster.clone(),
        };

        log::info!("created election {id_hex} with {} nodes", roster.len());
        self.put_election(&election)
    }

    fn open_election(
        &mut self,
        election_id: &str,
        pubkey: &Element,
        verification_keys: &[Element],
    ) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        require_status(&election, Status::Initial)?;

        if pubkey == &Element::one() {
            return Err(Error::InvalidConfiguration(
                "collective public key is the identity".to_string(),
            ));
        }
        if verification_keys.len() != election.roster.len() {
            return Err(Error::InvalidConfiguration(format!(
                "{} verification keys for a roster of {}",
                verification_keys.len(),
                election.roster.len()
            )));
        }

        election.pubkey = Some(pubkey.clone());
        election.verification_keys = verification_keys.to_vec();
        election.status = Status::Open;

        log::info!("opened election {election_id}");
        self.put_election(&election)
    }

    fn cast_vote(
        &mut self,
        election_id: &str,
        user_id: &str,
        ballot: &EncryptedBallot,
    ) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        require_status(&election, Status::Open)?;
        parse_user_id(user_id)?;

        let expected = election.chunks_per_ballot();
        if ballot.len() != expected {
            return Err(Error::BallotMalformed(format!(
                "ballot has {} chunks, election requires {expected}",
                ballot.len()
            )));
        }

        election.public_bulletin_board.cast_vote(user_id, ballot.clone());
        self.put_election(&election)
    }

    fn close_election(&mut self, election_id: &str) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        require_status(&election, Status::Open)?;

        if election.public_bulletin_board.is_empty() {
            return Err(Error::WrongStatus(
                "cannot close an election with no cast ballots".to_string(),
            ));
        }

        election.status = Status::Closed;
        log::info!(
            "closed election {election_id} with {} ballots",
            election.public_bulletin_board.len()
        );
        self.put_election(&election)
    }

    fn shuffle_ballots(
        &mut self,
        election_id: &str,
        instance: &ShuffleInstance,
    ) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        if election.status != Status::Closed && election.status != Status::ShuffledBallots {
            return Err(Error::WrongStatus(format!(
                "cannot shuffle in status {}",
                election.status
            )));
        }

        let shuffler = &instance.shuffler_public_key;
        if election.roster_index(shuffler).is_none() {
            return Err(Error::WrongStatus(
                "shuffler is not a roster member".to_string(),
            ));
        }
        if election.has_shuffled(shuffler) {
            return Err(Error::WrongStatus(
                "node has already contributed a shuffle".to_string(),
            ));
        }

        shuffle::verify_shuffle_instance(&election, instance)?;

        election.shuffle_instances.push(instance.clone());
        if election.shuffle_instances.len() >= election.shuffle_threshold {
            election.status = Status::ShuffledBallots;
        }

        log::info!(
            "election {election_id}: shuffle {} of {} admitted",
            election.shuffle_instances.len(),
            election.shuffle_threshold
        );
        self.put_election(&election)
    }

    fn register_pubshares(
        &mut self,
        election_id: &str,
        unit: &PubsharesUnit,
    ) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        require_status(&election, Status::ShuffledBallots)?;

        // first committed unit for an index wins
        if election
            .pubshares_units
            .iter()
            .any(|existing| existing.index == unit.index)
        {
            return Err(Error::WrongStatus(format!(
                "pubshares for index {} already registered",
                unit.index
            )));
        }

        decrypt::verify_pubshares_unit(&election, unit)?;

        election.pubshares_units.push(unit.clone());
        log::info!(
            "election {election_id}: pubshares unit {} of {} registered",
            election.pubshares_units.len(),
            election.shuffle_threshold
        );
        self.put_election(&election)
    }

    fn combine_shares(&mut self, election_id: &str) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        require_status(&election, Status::ShuffledBallots)?;

        election.decrypted_ballots = decrypt::combine_shares(&election)?;
        election.status = Status::ResultAvailable;

        log::info!(
            "election {election_id}: result available, {} ballots decrypted",
            election.decrypted_ballots.len()
        );
        self.put_election(&election)
    }

    fn cancel_election(&mut self, election_id: &str, user_id: &str) -> Result<(), Error> {
        let mut election = self.get_election(election_id)?;
        if user_id != election.admin_id {
            return Err(Error::WrongStatus(format!(
                "user {user_id} is not the election admin"
            )));
        }
        if election.status == Status::Canceled {
            return Ok(());
        }

        election.status = Status::Canceled;
        log::info!("canceled election {election_id}");
        self.put_election(&election)
    }

    fn create_form(&mut self, id_hex: &str, admin_id: &str) -> Result<(), Error> {
        let mut form = AdminForm {
            form_id: id_hex.to_string(),
            admin_list: vec![],
        };
        form.add_admin(admin_id)?;
        self.put_form(&form)
    }

    fn with_form(
        &mut self,
        form_id: &str,
        op: impl FnOnce(&mut AdminForm) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut form = self.get_admin_form(form_id)?;
        op(&mut form)?;
        self.put_form(&form)
    }

    fn put_election(&mut self, election: &Election) -> Result<(), Error> {
        let key = hex::decode(&election.election_id)
            .map_err(|_| Error::StoreFailure("malformed election id".to_string()))?;
        let bytes = serde_json::to_vec(election)
            .map_err(|e| Error::StoreFailure(format!("cannot encode election: {e}")))?;
        self.entries.insert(key, bytes);
        Ok(())
    }

    fn put_form(&mut self, form: &AdminForm) -> Result<(), Error> {
        let key = hex::decode(&form.form_id)
            .map_err(|_| Error::StoreFailure("malformed form id".to_string()))?;
        let bytes = serde_json::to_vec(form)
            .map_err(|e| Error::StoreFailure(format!("cannot encode form: {e}")))?;
        self.entries.insert(key, bytes);
        Ok(())
    }
}

/// Require an exact status, reporting a [`Error::WrongStatus`] otherwise.
fn require_status(election: &Election, expected: Status) -> Result<(), Error> {
    if election.status == expected {
        Ok(())
    } else {
        Err(Error::WrongStatus(format!(
            "election {} is {}, expected {expected}",
            election.election_id, election.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elections::NodeInfo;
    use crate::Ctx;
    use cryptography::context::Context;

    fn roster(n: usize) -> Roster {
        (0..n)
            .map(|i| NodeInfo {
                address: format!("node{i}"),
                public_key: Ctx::generator()
                    .exp(&Ctx::random_scalar()),
            })
            .collect()
    }

    fn signer() -> SigningKey {
        Ctx::gen_signing_key()
    }

    fn submit(store: &mut MemStore, signer: &SigningKey, event: Event) -> Result<String, Error> {
        let nonce = store.get_nonce(signer.verifying_key().as_bytes());
        let tx = Transaction::sign(nonce, signer, event).unwrap();
        store.submit(tx)
    }

    fn create_election(store: &mut MemStore, signer: &SigningKey, n: usize) -> String {
        submit(
            store,
            signer,
            Event::CreateElection {
                configuration: Configuration {
                    main_title: "poll".to_string(),
                    scaffold: vec![],
                },
                admin_id: "123456".to_string(),
                roster: roster(n),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_get_election() {
        let mut store = MemStore::default();
        let signer = signer();

        let id = create_election(&mut store, &signer, 3);
        let election = store.get_election(&id).unwrap();

        assert_eq!(election.status, Status::Initial);
        assert_eq!(election.shuffle_threshold, 2);
        assert_eq!(election.admin_id, "123456");

        assert!(matches!(
            store.get_election("abcd"),
            Err(Error::ElectionNotFound(_))
        ));
    }

    #[test]
    fn test_nonce_must_increase() {
        let mut store = MemStore::default();
        let signer = signer();

        create_election(&mut store, &signer, 2);

        // replaying nonce 0 is rejected
        let tx = Transaction::sign(
            0,
            &signer,
            Event::CreateForm {
                admin_id: "1".to_string(),
            },
        )
        .unwrap();
        assert!(store.submit(tx).is_err());

        // nonce 1 is accepted
        let tx = Transaction::sign(
            1,
            &signer,
            Event::CreateForm {
                admin_id: "1".to_string(),
            },
        )
        .unwrap();
        assert!(store.submit(tx).is_ok());
    }

    #[test]
    fn test_tampered_transaction_rejected() {
        let signer = signer();
        let mut tx = Transaction::sign(
            0,
            &signer,
            Event::CreateForm {
                admin_id: "1".to_string(),
            },
        )
        .unwrap();
        tx.event = Event::CreateForm {
            admin_id: "2".to_string(),
        };

        let mut store = MemStore::default();
        assert!(store.submit(tx).is_err());
    }

    #[test]
    fn test_open_requires_initial_status() {
        let mut store = MemStore::default();
        let signer = signer();
        let id = create_election(&mut store, &signer, 2);

        let pubkey = Ctx::generator().exp(&Ctx::random_scalar());
        let vks = vec![pubkey.clone(), pubkey.clone()];

        // identity pubkey is rejected
        let result = submit(
            &mut store,
            &signer,
            Event::OpenElection {
                election_id: id.clone(),
                pubkey: Element::one(),
                verification_keys: vks.clone(),
            },
        );
        assert!(result.is_err());

        submit(
            &mut store,
            &signer,
            Event::OpenElection {
                election_id: id.clone(),
                pubkey: pubkey.clone(),
                verification_keys: vks.clone(),
            },
        )
        .unwrap();
        assert_eq!(store.get_election(&id).unwrap().status, Status::Open);

        // opening twice violates monotonicity
        let result = submit(
            &mut store,
            &signer,
            Event::OpenElection {
                election_id: id,
                pubkey,
                verification_keys: vks,
            },
        );
        assert!(matches!(result, Err(Error::WrongStatus(_))));
    }

    #[test]
    fn test_cast_vote_guards() {
        let mut store = MemStore::default();
        let signer = signer();
        let id = create_election(&mut store, &signer, 2);

        let keypair = cryptography::cryptosystem::elgamal::KeyPair::<Ctx>::generate();
        let ballot = vec![keypair.pkey.encrypt(b"vote").unwrap().0];

        // voting before the election opens is rejected
        let result = submit(
            &mut store,
            &signer,
            Event::CastVote {
                election_id: id.clone(),
                user_id: "100".to_string(),
                ballot: ballot.clone(),
            },
        );
        assert!(matches!(result, Err(Error::WrongStatus(_))));

        submit(
            &mut store,
            &signer,
            Event::OpenElection {
                election_id: id.clone(),
                pubkey: keypair.pkey.y.clone(),
                verification_keys: vec![keypair.pkey.y.clone(), keypair.pkey.y.clone()],
            },
        )
        .unwrap();

        // closing without a single ballot is rejected
        let result = submit(
            &mut store,
            &signer,
            Event::CloseElection {
                election_id: id.clone(),
            },
        );
        assert!(result.is_err());

        // wrong chunk count is rejected
        let result = submit(
            &mut store,
            &signer,
            Event::CastVote {
                election_id: id.clone(),
                user_id: "100".to_string(),
                ballot: vec![ballot[0].clone(), ballot[0].clone()],
            },
        );
        assert!(matches!(result, Err(Error::BallotMalformed(_))));

        // non-integer user IDs are rejected
        let result = submit(
            &mut store,
            &signer,
            Event::CastVote {
                election_id: id.clone(),
                user_id: "eve".to_string(),
                ballot: ballot.clone(),
            },
        );
        assert!(matches!(result, Err(Error::InvalidUserId(_))));

        submit(
            &mut store,
            &signer,
            Event::CastVote {
                election_id: id.clone(),
                user_id: "100".to_string(),
                ballot,
            },
        )
        .unwrap();

        submit(
            &mut store,
            &signer,
            Event::CloseElection {
                election_id: id.clone(),
            },
        )
        .unwrap();
        assert_eq!(store.get_election(&id).unwrap().status, Status::Closed);
    }

    #[test]
    fn test_cancel_is_admin_only_and_absorbing() {
        let mut store = MemStore::default();
        let signer = signer();
        let id = create_election(&mut store, &signer, 2);

        let result = submit(
            &mut store,
            &signer,
            Event::CancelElection {
                election_id: id.clone(),
                user_id: "999".to_string(),
            },
        );
        assert!(result.is_err());

        submit(
            &mut store,
            &signer,
            Event::CancelElection {
                election_id: id.clone(),
                user_id: "123456".to_string(),
            },
        )
        .unwrap();
        assert_eq!(store.get_election(&id).unwrap().status, Status::Canceled);

        // no event revives a canceled election
        let keypair = cryptography::cryptosystem::elgamal::KeyPair::<Ctx>::generate();
        let result = submit(
            &mut store,
            &signer,
            Event::OpenElection {
                election_id: id.clone(),
                pubkey: keypair.pkey.y.clone(),
                verification_keys: vec![keypair.pkey.y.clone(), keypair.pkey.y],
            },
        );
        assert!(matches!(result, Err(Error::WrongStatus(_))));
        assert_eq!(store.get_election(&id).unwrap().status, Status::Canceled);
    }

    #[test]
    fn test_admin_form_events() {
        let mut store = MemStore::default();
        let signer = signer();

        let form_id = submit(
            &mut store,
            &signer,
            Event::CreateForm {
                admin_id: "100".to_string(),
            },
        )
        .unwrap();

        submit(
            &mut store,
            &signer,
            Event::AddAdmin {
                form_id: form_id.clone(),
                user_id: "200".to_string(),
            },
        )
        .unwrap();

        let form = store.get_admin_form(&form_id).unwrap();
        assert_eq!(form.is_admin("200"), Some(1));

        submit(
            &mut store,
            &signer,
            Event::RemoveAdmin {
                form_id: form_id.clone(),
                user_id: "200".to_string(),
            },
        )
        .unwrap();
        let form = store.get_admin_form(&form_id).unwrap();
        assert_eq!(form.is_admin("200"), None);
    }
}
