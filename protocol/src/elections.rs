// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Election records: configuration scaffold, status lattice, bulletin board,
//! shuffle chain and pubshare units.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::Display;

use cryptography::cryptosystem::elgamal::Ciphertext;
use cryptography::traits::groups::CryptographicGroup;
use cryptography::zkp::dlogeq::DlogEqProof;

use crate::{Ctx, Element};

/// An encrypted ballot: one ElGamal pair per chunk, padded so that every
/// ballot of an election has the same length.
pub type EncryptedBallot = Vec<Ciphertext<Ctx>>;

/// The ordered committee of an election.
pub type Roster = Vec<NodeInfo>;

/// One committee node: its transport address and long-term group public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Transport address the node listens on.
    pub address: String,
    /// Long-term group public key identifying the node.
    pub public_key: Element,
}

/// The committee threshold for shuffles and pubshare units, `ceil(2n/3)`.
#[must_use]
pub fn shuffle_threshold(roster_len: usize) -> usize {
    (2 * roster_len + 2) / 3
}

/// Election lifecycle status.
///
/// Transitions are monotone along the discriminant order; `Canceled` is
/// absorbing. Discriminant 4 is reserved (a historical decrypting phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize, Display)]
pub enum Status {
    /// Created, collective key not yet published.
    Initial = 0,
    /// Accepting ballots under the collective key.
    Open = 1,
    /// No further ballots accepted.
    Closed = 2,
    /// The shuffle chain has reached the committee threshold.
    ShuffledBallots = 3,
    /// The plaintext tally has been combined and stored.
    ResultAvailable = 5,
    /// Aborted by the election admin; absorbing.
    Canceled = 6,
}

/// A select question: pick up to `max_n` of the listed choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    /// Unique question ID.
    pub id: String,
    /// Displayed title.
    pub title: String,
    /// Maximum number of selections.
    pub max_n: u32,
    /// The candidate choices.
    pub choices: Vec<String>,
}

impl Select {
    /// Worst-case byte length of the encoded answer, `select:<id>:0,1,..\n`.
    fn max_encoded_size(&self) -> usize {
        "select::\n".len() + self.id.len() + 2 * self.choices.len()
    }
}

/// A rank question: order up to `max_n` of the listed choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    /// Unique question ID.
    pub id: String,
    /// Displayed title.
    pub title: String,
    /// Maximum number of ranked choices.
    pub max_n: u32,
    /// The candidate choices.
    pub choices: Vec<String>,
}

impl Rank {
    /// Worst-case byte length of the encoded answer, `rank:<id>:1,0,..\n`.
    fn max_encoded_size(&self) -> usize {
        // each rank may take up to three bytes (two digits and a comma)
        "rank::\n".len() + self.id.len() + 3 * self.choices.len()
    }
}

/// A free-text question with a bounded answer length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Unique question ID.
    pub id: String,
    /// Displayed title.
    pub title: String,
    /// Maximum number of answers.
    pub max_n: u32,
    /// Maximum byte length of one answer before encoding.
    pub max_length: u32,
    /// The prompts answered.
    pub choices: Vec<String>,
}

impl Text {
    /// Worst-case byte length of the encoded answer, `text:<id>:<base64>,..\n`.
    fn max_encoded_size(&self) -> usize {
        let base64_len = (self.max_length as usize).div_ceil(3) * 4;
        "text::\n".len() + self.id.len() + self.max_n as usize * (base64_len + 1)
    }
}

/// A ballot subject grouping questions under a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Subject {
    /// Unique subject ID.
    pub id: String,
    /// Displayed title.
    pub title: String,
    /// Select questions of this subject.
    pub selects: Vec<Select>,
    /// Rank questions of this subject.
    pub ranks: Vec<Rank>,
    /// Text questions of this subject.
    pub texts: Vec<Text>,
}

impl Subject {
    /// Worst-case byte length of this subject's encoded answers.
    fn max_encoded_size(&self) -> usize {
        let selects: usize = self.selects.iter().map(Select::max_encoded_size).sum();
        let ranks: usize = self.ranks.iter().map(Rank::max_encoded_size).sum();
        let texts: usize = self.texts.iter().map(Text::max_encoded_size).sum();
        selects + ranks + texts
    }

    /// Record this subject's IDs, returning false on the first duplicate.
    fn collect_ids(&self, seen: &mut HashSet<String>) -> bool {
        if !seen.insert(self.id.clone()) {
            return false;
        }
        let question_ids = self
            .selects
            .iter()
            .map(|q| &q.id)
            .chain(self.ranks.iter().map(|q| &q.id))
            .chain(self.texts.iter().map(|q| &q.id));
        for id in question_ids {
            if !seen.insert(id.clone()) {
                return false;
            }
        }
        true
    }
}

/// The configuration of a new poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Displayed election title.
    pub main_title: String,
    /// The ballot scaffold.
    pub scaffold: Vec<Subject>,
}

impl Configuration {
    /// The maximum number of bytes required to store a ballot.
    ///
    /// Smaller ballots are padded up to this size so that all ballots cast
    /// have the same chunk count, which the shuffle requires.
    #[must_use]
    pub fn max_ballot_size(&self) -> usize {
        self.scaffold.iter().map(Subject::max_encoded_size).sum()
    }

    /// Returns true if and only if the whole configuration is coherent and
    /// valid: every subject and question ID is unique across the scaffold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let mut unique_ids = HashSet::new();
        self.scaffold
            .iter()
            .all(|subject| subject.collect_ids(&mut unique_ids))
    }
}

/// The public bulletin board: the latest encrypted ballot per user, in
/// first-cast order.
///
/// Casting again replaces the prior ballot (last write wins) while keeping
/// the user's original position, so committee operations iterate in a
/// deterministic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PublicBulletinBoard {
    user_ids: Vec<String>,
    ballots: Vec<EncryptedBallot>,
}

impl PublicBulletinBoard {
    /// Update a user's ballot or add a new user with its ballot.
    pub fn cast_vote(&mut self, user_id: &str, ballot: EncryptedBallot) {
        for (i, u) in self.user_ids.iter().enumerate() {
            if u == user_id {
                self.ballots[i] = ballot;
                return;
            }
        }

        self.user_ids.push(user_id.to_string());
        self.ballots.push(ballot);
    }

    /// Returns the ballot associated to a user, if any.
    #[must_use]
    pub fn get_ballot_from_user(&self, user_id: &str) -> Option<&EncryptedBallot> {
        self.user_ids
            .iter()
            .position(|u| u == user_id)
            .map(|i| &self.ballots[i])
    }

    /// Removes a user and its ballot if found.
    pub fn delete_user(&mut self, user_id: &str) -> bool {
        if let Some(i) = self.user_ids.iter().position(|u| u == user_id) {
            self.user_ids.remove(i);
            self.ballots.remove(i);
            true
        } else {
            false
        }
    }

    /// The ballots in first-cast order.
    #[must_use]
    pub fn ballots(&self) -> &[EncryptedBallot] {
        &self.ballots
    }

    /// The user IDs in first-cast order.
    #[must_use]
    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    /// Number of distinct users with a ballot on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    /// Whether no ballot has been cast.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

/// An instance of a shuffle: the shuffled ballots, the proof blob and the
/// identity of the shuffler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleInstance {
    /// The list of shuffled ballots for this round.
    pub shuffled_ballots: Vec<EncryptedBallot>,
    /// The serialized proof of shuffle for this round.
    pub shuffle_proof: Vec<u8>,
    /// The long-term key of the node who made the given shuffle.
    pub shuffler_public_key: Element,
}

/// One partial decryption: `x_i * K` with its correctness proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pubshare {
    /// The partial decryption point.
    pub value: Element,
    /// Proof that the point's discrete log matches the node's verification key.
    pub proof: DlogEqProof<Ctx>,
}

/// One node's partial decryptions over the final shuffled ballots,
/// row-per-ballot, column-per-chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubsharesUnit {
    /// One row of pubshares per ballot, one entry per chunk.
    pub pubshares: Vec<Vec<Pubshare>>,
    /// The contributing node's 0-based roster index.
    pub index: u32,
    /// The contributing node's long-term public key.
    pub public_key: Element,
}

/// Contains all information about a simple election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    /// The ballot configuration.
    pub configuration: Configuration,

    /// ElectionID is the hex-encoded SHA256 of the transaction ID that
    /// creates the election.
    pub election_id: String,

    /// The admin who created the election.
    pub admin_id: String,

    /// Lifecycle status.
    pub status: Status,

    /// The collective public key, set when the election opens.
    pub pubkey: Option<Element>,

    /// Total size of one ballot in bytes. It is used to pad smaller ballots
    /// such that all ballots cast have the same size.
    pub ballot_size: usize,

    /// Per-node share verification keys `g^x_i`, roster-ordered, published
    /// when the election opens. Pubshare proofs verify against these.
    pub verification_keys: Vec<Element>,

    /// The latest encrypted ballot per user.
    pub public_bulletin_board: PublicBulletinBoard,

    /// All the shuffles, along with their proof and identity of shuffler.
    pub shuffle_instances: Vec<ShuffleInstance>,

    /// Set from the roster when the election is created, so we don't have to
    /// compute it each time we need it.
    pub shuffle_threshold: usize,

    /// Pubshare units posted by committee nodes over the final shuffle.
    pub pubshares_units: Vec<PubsharesUnit>,

    /// The combined plaintext ballots, set when the result is available.
    pub decrypted_ballots: Vec<Vec<u8>>,

    /// The ordered committee, fixed when the election is created. The roster
    /// won't change during an election and is used for DKG, shuffling and
    /// decryption.
    pub roster: Roster,
}

impl Election {
    /// The per-election chunk count `L`: ciphertexts per ballot.
    #[must_use]
    pub fn chunks_per_ballot(&self) -> usize {
        self.ballot_size
            .div_ceil(<Ctx as cryptography::context::Context>::G::CHUNK_BYTES)
            .max(1)
    }

    /// The ballots the next shuffle (or the decryption) operates on: the
    /// last shuffle instance's output, or the bulletin board before any
    /// shuffle.
    #[must_use]
    pub fn last_ballots(&self) -> &[EncryptedBallot] {
        self.shuffle_instances
            .last()
            .map(|instance| instance.shuffled_ballots.as_slice())
            .unwrap_or_else(|| self.public_bulletin_board.ballots())
    }

    /// Roster position of the given node key.
    #[must_use]
    pub fn roster_index(&self, public_key: &Element) -> Option<usize> {
        self.roster
            .iter()
            .position(|node| &node.public_key == public_key)
    }

    /// Whether the given node key has already contributed a shuffle.
    #[must_use]
    pub fn has_shuffled(&self, public_key: &Element) -> bool {
        self.shuffle_instances
            .iter()
            .any(|instance| &instance.shuffler_public_key == public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptography::context::Context;
    use cryptography::cryptosystem::elgamal::KeyPair;

    fn select(id: &str) -> Select {
        Select {
            id: id.to_string(),
            title: format!("title {id}"),
            max_n: 1,
            choices: vec!["yes".to_string(), "no".to_string()],
        }
    }

    fn config(ids: &[&str]) -> Configuration {
        Configuration {
            main_title: "poll".to_string(),
            scaffold: vec![Subject {
                id: "s1".to_string(),
                title: "subject".to_string(),
                selects: ids.iter().map(|id| select(id)).collect(),
                ranks: vec![],
                texts: vec![],
            }],
        }
    }

    #[test]
    fn test_configuration_unique_ids() {
        assert!(config(&["q1", "q2"]).is_valid());
        assert!(!config(&["q1", "q1"]).is_valid());

        // subject IDs participate in uniqueness too
        assert!(!config(&["s1"]).is_valid());
    }

    #[test]
    fn test_configuration_ballot_size() {
        let cfg = config(&["q1"]);
        // "select::\n" + "q1" + two choices
        assert_eq!(cfg.max_ballot_size(), 9 + 2 + 4);
    }

    #[test]
    fn test_bulletin_board_last_write_wins() {
        let keypair = KeyPair::<Ctx>::generate();
        let ballot = |tag: &[u8]| -> EncryptedBallot {
            vec![keypair.pkey.encrypt(tag).unwrap().0]
        };

        let mut board = PublicBulletinBoard::default();
        board.cast_vote("100", ballot(b"first"));
        board.cast_vote("200", ballot(b"second"));
        let replacement = ballot(b"third");
        board.cast_vote("100", replacement.clone());

        // order preserved, ballot replaced
        assert_eq!(board.user_ids(), &["100".to_string(), "200".to_string()]);
        assert_eq!(board.get_ballot_from_user("100"), Some(&replacement));
        assert_eq!(board.len(), 2);

        assert!(board.delete_user("100"));
        assert!(!board.delete_user("100"));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_shuffle_threshold() {
        assert_eq!(shuffle_threshold(2), 2);
        assert_eq!(shuffle_threshold(3), 2);
        assert_eq!(shuffle_threshold(4), 3);
        assert_eq!(shuffle_threshold(5), 4);
        assert_eq!(shuffle_threshold(6), 4);
    }

    #[test]
    fn test_status_ordering() {
        assert!(Status::Initial < Status::Open);
        assert!(Status::Open < Status::Closed);
        assert!(Status::Closed < Status::ShuffledBallots);
        assert!(Status::ShuffledBallots < Status::ResultAvailable);
        assert!(Status::ResultAvailable < Status::Canceled);
    }
}
