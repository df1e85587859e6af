// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! The per-node DKG handler.
//!
//! Each node runs one event loop per election, draining a single queue of
//! network messages and local commands. Long-running protocol steps never
//! block the queue: the loop advances a session state machine as deals and
//! responses arrive. First-message dispatch separates the pre-setup and
//! post-setup states: `GetPeerPubKey` is always answered, `Start` begins a
//! key generation round (or, on a certified node, a resharing round), and
//! `Deal` or `DecryptRequest` before setup are rejected as uninitialized.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ed25519_dalek::SigningKey;

use cryptography::context::Context;
use cryptography::cryptosystem::elgamal::{Ciphertext, PublicKey};
use cryptography::dkgd::dealer::{Dealer, VerifiableShare};
use cryptography::dkgd::recipient::{combine_reshares, ParticipantPosition, Recipient};
use cryptography::traits::groups::GroupElement;
use cryptography::utils::hash;
use sha3::Digest;
use cryptography::utils::serialization::VSerializable;
use cryptography::zkp::schnorr::SchnorrProof;

use crate::decrypt;
use crate::dkg::messages::{
    Address, Deal, DealResponse, DecryptRequest, EncryptedDeal, GetPeerPubKeyResp, Message,
    Response, Start, StartDone,
};
use crate::dkg::transport::{Receiver, RecvError, Sender};
use crate::dkg::{ecies, DkgMap, HandlerData, PrivateShare, StartRes};
use crate::elections::{shuffle_threshold, Roster, Status};
use crate::error::{retry_with_backoff, Error};
use crate::store::{Event, MemStore, Transaction};
use crate::{Ctx, Element, Scalar};

/// The shared ordering store handle.
pub type SharedStore = Arc<Mutex<MemStore>>;

/// A node's long-term group keypair.
#[derive(Clone)]
pub struct NodeKeys {
    /// The private scalar.
    pub secret: Scalar,
    /// The public element `g^secret`.
    pub public: Element,
}

impl NodeKeys {
    /// Generate a fresh keypair.
    #[must_use]
    pub fn generate() -> Self {
        let secret = Ctx::random_scalar();
        let public = Ctx::generator().exp(&secret);
        NodeKeys { secret, public }
    }
}

/// Everything needed to run one node's handler for one election.
pub struct ActorConfig {
    /// The election this actor belongs to.
    pub election_id: String,
    /// This node's transport address.
    pub address: Address,
    /// This node's long-term group keypair.
    pub keys: NodeKeys,
    /// Signer for store transactions (the pubshares signer).
    pub signer: SigningKey,
    /// The election roster, in dealing order.
    pub roster: Roster,
    /// Transport sending half.
    pub sender: Box<dyn Sender>,
    /// Transport receiving half.
    pub receiver: Box<dyn Receiver>,
    /// The shared ordering store.
    pub store: SharedStore,
}

/// The DKG service: one actor per election, resumed from the "dkgmap"
/// bucket across restarts.
pub struct Pedersen {
    dkgmap: Arc<DkgMap>,
    actors: Mutex<HashMap<String, Arc<DkgActor>>>,
}

impl Pedersen {
    /// Create a service around the given persistence bucket.
    #[must_use]
    pub fn new(dkgmap: Arc<DkgMap>) -> Self {
        Pedersen {
            dkgmap,
            actors: Mutex::new(HashMap::new()),
        }
    }

    /// Start the node's event loop for an election.
    ///
    /// If the bucket holds certified state for this election the actor
    /// resumes from it and setup is not required again.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if persisted state cannot be loaded
    pub fn listen(&self, config: ActorConfig) -> Result<Arc<DkgActor>, Error> {
        let election_id = config.election_id.clone();
        let actor = Arc::new(DkgActor::spawn(config, Arc::clone(&self.dkgmap))?);

        self.actors
            .lock()
            .map_err(|_| Error::StoreFailure("actor map lock poisoned".to_string()))?
            .insert(election_id, Arc::clone(&actor));
        Ok(actor)
    }

    /// Retrieve the actor for an election.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if no actor listens for the election
    pub fn get_actor(&self, election_id: &str) -> Result<Arc<DkgActor>, Error> {
        self.actors
            .lock()
            .map_err(|_| Error::StoreFailure("actor map lock poisoned".to_string()))?
            .get(election_id)
            .cloned()
            .ok_or_else(|| {
                Error::StoreFailure(format!("no dkg actor listens for election {election_id}"))
            })
    }
}

/// Commands accepted by the event loop.
enum Command {
    Setup {
        deadline: Instant,
        reply: mpsc::Sender<Result<Element, Error>>,
    },
    Reshare {
        deadline: Instant,
        reply: mpsc::Sender<Result<Element, Error>>,
    },
    GetPublicKey {
        reply: mpsc::Sender<Result<Element, Error>>,
    },
    GetVerificationKeys {
        reply: mpsc::Sender<Result<Vec<Element>, Error>>,
    },
    Decrypt {
        deadline: Instant,
        reply: mpsc::Sender<Result<Vec<Vec<u8>>, Error>>,
    },
    Marshal {
        reply: mpsc::Sender<Result<Vec<u8>, Error>>,
    },
}

/// One queue event: a network message or a local command.
enum LoopEvent {
    Net(Address, Message),
    Cmd(Command),
}

/// The public handle of a node's DKG event loop.
pub struct DkgActor {
    election_id: String,
    events: mpsc::Sender<LoopEvent>,
}

/// Timeout for commands that complete without waiting on peers.
const LOCAL_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

impl DkgActor {
    fn spawn(config: ActorConfig, dkgmap: Arc<DkgMap>) -> Result<DkgActor, Error> {
        let election_id = config.election_id.clone();

        let data = match dkgmap.load(election_id.as_bytes())? {
            Some(persisted) => {
                log::info!(
                    "election {election_id}: resuming dkg state from the {} bucket",
                    super::DKG_MAP_BUCKET
                );
                persisted
            }
            None => HandlerData::new(config.keys.secret.clone(), config.keys.public.clone()),
        };

        let (events_tx, events_rx) = mpsc::channel::<LoopEvent>();

        // pump network messages into the single event queue
        let net_tx = events_tx.clone();
        let mut receiver = config.receiver;
        std::thread::spawn(move || loop {
            match receiver.recv(Duration::from_secs(3600)) {
                Ok((from, message)) => {
                    if net_tx.send(LoopEvent::Net(from, message)).is_err() {
                        break;
                    }
                }
                Err(RecvError::Timeout) => continue,
                Err(RecvError::Closed) => break,
            }
        });

        let handler = Handler {
            election_id: election_id.clone(),
            address: config.address,
            keys: config.keys,
            signer: config.signer,
            roster: config.roster,
            sender: config.sender,
            store: config.store,
            dkgmap,
            data,
            pending: None,
            session: None,
        };
        std::thread::spawn(move || handler.run(events_rx));

        Ok(DkgActor {
            election_id,
            events: events_tx,
        })
    }

    fn call<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<Result<T, Error>>) -> Command,
        timeout: Duration,
    ) -> Result<T, Error> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.events
            .send(LoopEvent::Cmd(make(reply_tx)))
            .map_err(|_| Error::TransportFailure("dkg event loop stopped".to_string()))?;
        reply_rx
            .recv_timeout(timeout + LOCAL_COMMAND_TIMEOUT)
            .map_err(|_| Error::TransportFailure("dkg command timed out".to_string()))?
    }

    /// Run the distributed key generation, as the designated initiator.
    ///
    /// Must be called exactly once, after `listen` on every roster node.
    /// Returns the collective public key.
    ///
    /// # Errors
    ///
    /// - `AlreadySetUp` on repeat invocation
    /// - `PublicKeysMismatch` if the nodes disagree on the key
    /// - `InvalidDeal` / `InvalidResponse` on VSS failures
    /// - `TransportFailure` if the round times out
    pub fn setup(&self, timeout: Duration) -> Result<Element, Error> {
        let deadline = Instant::now() + timeout;
        self.call(|reply| Command::Setup { deadline, reply }, timeout)
    }

    /// The collective public key.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before setup completes on this node
    pub fn get_public_key(&self) -> Result<Element, Error> {
        self.call(
            |reply| Command::GetPublicKey { reply },
            LOCAL_COMMAND_TIMEOUT,
        )
    }

    /// Roster-ordered share verification keys `g^x_i`, derivable by any
    /// certified node from the run's checking values.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before setup completes on this node
    pub fn get_verification_keys(&self) -> Result<Vec<Element>, Error> {
        self.call(
            |reply| Command::GetVerificationKeys { reply },
            LOCAL_COMMAND_TIMEOUT,
        )
    }

    /// Encrypt the leading chunk of `message` under the collective key.
    ///
    /// Returns the ciphertext and the un-encrypted remainder; callers
    /// iterate to chunk longer messages.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before setup completes on this node
    pub fn encrypt<'a>(&self, message: &'a [u8]) -> Result<(Ciphertext<Ctx>, &'a [u8]), Error> {
        let pubkey = self.get_public_key()?;
        Ok(PublicKey::<Ctx>::new(pubkey).encrypt(message)?)
    }

    /// Trigger a pubshare round for this actor's election and combine the
    /// registered units into the plaintext ballots.
    ///
    /// Every certified node (this one included) computes its pubshares over
    /// the final shuffle and submits them as store transactions; once a
    /// threshold of units is committed they are Lagrange-combined.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before setup completes on this node
    /// - `InsufficientShares` if the threshold is not reached in time
    pub fn decrypt(&self, timeout: Duration) -> Result<Vec<Vec<u8>>, Error> {
        let deadline = Instant::now() + timeout;
        self.call(|reply| Command::Decrypt { deadline, reply }, timeout)
    }

    /// Re-run the DKG against the roster, producing fresh shares that
    /// reconstruct the same collective key.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before setup completes on this node
    /// - `PublicKeysMismatch` if the resharing changes the collective key
    pub fn reshare(&self, timeout: Duration) -> Result<(), Error> {
        let deadline = Instant::now() + timeout;
        self.call(|reply| Command::Reshare { deadline, reply }, timeout)?;
        Ok(())
    }

    /// JSON-encode the persistent handler state.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if encoding fails
    pub fn marshal_json(&self) -> Result<Vec<u8>, Error> {
        self.call(|reply| Command::Marshal { reply }, LOCAL_COMMAND_TIMEOUT)
    }

    /// The election this actor serves.
    #[must_use]
    pub fn election_id(&self) -> &str {
        &self.election_id
    }
}

/// Initiator-side state while peer keys are being collected.
struct PendingSetup {
    collected: HashSet<Address>,
    resharing: bool,
    reply: mpsc::Sender<Result<Element, Error>>,
    deadline: Instant,
}

/// Initiator-side collection of peer certifications.
struct DoneCollector {
    done: HashMap<Address, Element>,
    reply: mpsc::Sender<Result<Element, Error>>,
}

/// One running DKG (or resharing) session.
struct Session {
    participants: Vec<Address>,
    pubkeys: Vec<Element>,
    session_id: Vec<u8>,
    my_index: usize,
    received: Vec<Option<VerifiableShare<Ctx>>>,
    approvals: HashSet<(u32, u32)>,
    resharing: bool,
    /// Where to report certification; `None` on the initiator itself.
    initiator_addr: Option<Address>,
    /// Present on the initiator.
    collector: Option<DoneCollector>,
    /// Collected checking values per dealer, for verification keys.
    checking_values: Vec<Option<Vec<Element>>>,
    deadline: Instant,
    /// Set once this node certified, while the initiator still collects.
    certified_key: Option<Element>,
}

/// The event-loop state of one node's DKG handler.
struct Handler {
    election_id: String,
    address: Address,
    keys: NodeKeys,
    signer: SigningKey,
    roster: Roster,
    sender: Box<dyn Sender>,
    store: SharedStore,
    dkgmap: Arc<DkgMap>,
    data: HandlerData,
    pending: Option<PendingSetup>,
    session: Option<Session>,
}

impl Handler {
    fn run(mut self, events: mpsc::Receiver<LoopEvent>) {
        loop {
            let timeout = self.next_deadline().map_or(Duration::from_secs(3600), |d| {
                d.saturating_duration_since(Instant::now())
            });

            match events.recv_timeout(timeout) {
                Ok(LoopEvent::Cmd(command)) => self.handle_command(command),
                Ok(LoopEvent::Net(from, message)) => self.handle_message(&from, message),
                Err(mpsc::RecvTimeoutError::Timeout) => self.expire_deadlines(),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        let pending = self.pending.as_ref().map(|p| p.deadline);
        let session = self.session.as_ref().map(|s| s.deadline);
        match (pending, session) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Abort expired rounds, discarding any partial deal state.
    fn expire_deadlines(&mut self) {
        let now = Instant::now();
        if self.pending.as_ref().is_some_and(|p| now >= p.deadline) {
            let pending = self.pending.take().expect("checked above");
            let _ = pending.reply.send(Err(Error::TransportFailure(
                "dkg setup timed out collecting peer keys".to_string(),
            )));
        }
        if self.session.as_ref().is_some_and(|s| now >= s.deadline) {
            self.fail_session(Error::TransportFailure(
                "dkg round timed out".to_string(),
            ));
        }
    }

    // --- commands ---

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Setup { deadline, reply } => {
                if self.data.start_res.is_some() || self.pending.is_some() || self.session.is_some()
                {
                    let _ = reply.send(Err(Error::AlreadySetUp));
                    return;
                }
                self.begin_setup(false, deadline, reply);
            }
            Command::Reshare { deadline, reply } => {
                if self.data.start_res.is_none() {
                    let _ = reply.send(Err(Error::NotInitialized));
                    return;
                }
                if self.pending.is_some() || self.session.is_some() {
                    let _ = reply.send(Err(Error::AlreadySetUp));
                    return;
                }
                self.begin_setup(true, deadline, reply);
            }
            Command::GetPublicKey { reply } => {
                let result = self
                    .data
                    .start_res
                    .as_ref()
                    .map(|res| res.dist_key.clone())
                    .ok_or(Error::NotInitialized);
                let _ = reply.send(result);
            }
            Command::GetVerificationKeys { reply } => {
                let _ = reply.send(self.verification_keys());
            }
            Command::Decrypt { deadline, reply } => {
                let _ = reply.send(self.run_decrypt(deadline));
            }
            Command::Marshal { reply } => {
                let _ = reply.send(self.data.marshal_json());
            }
        }
    }

    /// Start collecting peer keys as the initiator of a round.
    fn begin_setup(
        &mut self,
        resharing: bool,
        deadline: Instant,
        reply: mpsc::Sender<Result<Element, Error>>,
    ) {
        log::info!(
            "election {}: initiating {}",
            self.election_id,
            if resharing { "resharing" } else { "dkg setup" }
        );

        for node in &self.roster {
            if node.address != self.address {
                let _ = self.sender.send(
                    &node.address,
                    Message::GetPeerPubKey(crate::dkg::messages::GetPeerPubKey),
                );
            }
        }

        self.pending = Some(PendingSetup {
            collected: HashSet::new(),
            resharing,
            reply,
            deadline,
        });
    }

    /// Verification keys for every participant, recorded at certification.
    fn verification_keys(&self) -> Result<Vec<Element>, Error> {
        self.data
            .start_res
            .as_ref()
            .and_then(|res| res.verification_keys.clone())
            .ok_or(Error::NotInitialized)
    }

    // --- network messages ---

    fn handle_message(&mut self, from: &Address, message: Message) {
        match message {
            Message::GetPeerPubKey(_) => {
                let _ = self.sender.send(
                    from,
                    Message::GetPeerPubKeyResp(GetPeerPubKeyResp {
                        pubkey: self.keys.public.clone(),
                    }),
                );
            }
            Message::GetPeerPubKeyResp(resp) => self.handle_peer_pubkey(from, &resp),
            Message::Start(start) => self.handle_start(from, start),
            Message::Deal(deal) => {
                if self.session.is_some() {
                    self.handle_deal(&deal);
                } else if self.data.start_res.is_none() {
                    log::warn!(
                        "election {}: deal from {from} rejected: {}",
                        self.election_id,
                        Error::NotInitialized
                    );
                }
            }
            Message::Response(response) => {
                if self.session.is_some() {
                    self.handle_response(&response);
                }
            }
            Message::StartDone(done) => self.handle_start_done(from, &done),
            Message::DecryptRequest(request) => {
                if let Err(err) = self.serve_decrypt_request(&request) {
                    log::warn!(
                        "election {}: decrypt request from {from} failed: {err}",
                        self.election_id
                    );
                }
            }
        }
    }

    fn handle_peer_pubkey(&mut self, from: &Address, resp: &GetPeerPubKeyResp) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        let expected = self
            .roster
            .iter()
            .find(|node| &node.address == from)
            .map(|node| &node.public_key);
        match expected {
            Some(expected) if expected == &resp.pubkey => {
                pending.collected.insert(from.clone());
            }
            _ => {
                let pending = self.pending.take().expect("checked above");
                let _ = pending.reply.send(Err(Error::PublicKeysMismatch));
                return;
            }
        }

        let peers = self.roster.len() - 1;
        if self.pending.as_ref().expect("still pending").collected.len() == peers {
            let pending = self.pending.take().expect("still pending");
            self.broadcast_start(pending);
        }
    }

    /// All peers answered with matching keys: broadcast `Start` and join the
    /// round ourselves.
    fn broadcast_start(&mut self, pending: PendingSetup) {
        let start = Start {
            participants: self.roster.iter().map(|n| n.address.clone()).collect(),
            pubkeys: self.roster.iter().map(|n| n.public_key.clone()).collect(),
        };

        for node in &self.roster {
            if node.address != self.address {
                let _ = self
                    .sender
                    .send(&node.address, Message::Start(start.clone()));
            }
        }

        let collector = DoneCollector {
            done: HashMap::new(),
            reply: pending.reply,
        };
        if let Err(err) = self.start_session(
            start,
            pending.resharing,
            None,
            Some(collector),
            pending.deadline,
        ) {
            self.fail_session(err);
        }
    }

    fn handle_start(&mut self, from: &Address, start: Start) {
        if self.session.is_some() {
            log::warn!(
                "election {}: ignoring start from {from}, round already running",
                self.election_id
            );
            return;
        }

        // post-setup start means the committee is resharing
        let resharing = self.data.start_res.is_some();
        let deadline = Instant::now() + Duration::from_secs(60);
        if let Err(err) =
            self.start_session(start, resharing, Some(from.clone()), None, deadline)
        {
            log::error!("election {}: start from {from} failed: {err}", self.election_id);
            self.fail_session(err);
        }
    }

    /// Create the session, deal out shares and record our own.
    fn start_session(
        &mut self,
        start: Start,
        resharing: bool,
        initiator_addr: Option<Address>,
        collector: Option<DoneCollector>,
        deadline: Instant,
    ) -> Result<(), Error> {
        if start.participants.len() != start.pubkeys.len() {
            return Err(Error::InvalidDeal(format!(
                "there should be as many participants as pubkeys: {} != {}",
                start.participants.len(),
                start.pubkeys.len()
            )));
        }
        let n = start.participants.len();
        let my_index = start
            .participants
            .iter()
            .position(|addr| addr == &self.address)
            .ok_or_else(|| {
                Error::InvalidDeal("this node is not among the participants".to_string())
            })?;

        let threshold = shuffle_threshold(n);
        let dealer = if resharing {
            let share = self
                .data
                .priv_share
                .as_ref()
                .ok_or(Error::NotInitialized)?;
            Dealer::<Ctx>::reshare(share.value.clone(), threshold, n)?
        } else {
            Dealer::<Ctx>::generate(threshold, n)?
        };

        let session_id = session_id(&start, resharing);
        let shares = dealer.get_verifiable_shares();

        let mut session = Session {
            participants: start.participants,
            pubkeys: start.pubkeys,
            session_id,
            my_index,
            received: vec![None; n],
            approvals: HashSet::new(),
            resharing,
            initiator_addr,
            collector,
            checking_values: vec![None; n],
            deadline,
            certified_key: None,
        };

        // deal point-to-point, keeping our own share locally
        for (j, recipient_addr) in session.participants.iter().enumerate() {
            let share = shares.for_recipient(&ParticipantPosition::from_index(j));
            if j == my_index {
                session.received[my_index] = Some(share);
                session.checking_values[my_index] = Some(shares.checking_values.clone());
                continue;
            }

            let deal = self.build_deal(&session, &share, &session.pubkeys[j])?;
            let _ = self.sender.send(recipient_addr, Message::Deal(deal));
        }

        // approve our own deal and tell the others
        let own_response = self.build_response(&session, session.my_index as u32, true)?;
        session
            .approvals
            .insert((session.my_index as u32, session.my_index as u32));
        self.broadcast(&session, Message::Response(own_response));

        self.session = Some(session);
        self.try_certify();
        Ok(())
    }

    fn build_deal(
        &self,
        session: &Session,
        share: &VerifiableShare<Ctx>,
        recipient_key: &Element,
    ) -> Result<Deal, Error> {
        let payload = serde_json::to_vec(share)
            .map_err(|e| Error::InvalidDeal(format!("cannot encode share: {e}")))?;
        let (dh_key, nonce, cipher) = ecies::encrypt(recipient_key, &payload)?;

        let mut dh_context = dh_key.ser();
        dh_context.extend_from_slice(&session.session_id);
        let dh_signature = self.sign(&dh_context)?;

        let index = session.my_index as u32;
        let context = deal_context(&session.session_id, index, &nonce, &cipher);
        let signature = self.sign(&context)?;

        Ok(Deal {
            index,
            signature,
            encrypted: EncryptedDeal {
                dh_key,
                signature: dh_signature,
                nonce,
                cipher,
            },
        })
    }

    fn build_response(
        &self,
        session: &Session,
        dealer_index: u32,
        approved: bool,
    ) -> Result<Response, Error> {
        let responder = session.my_index as u32;
        let context =
            response_context(&session.session_id, dealer_index, responder, approved);
        let signature = self.sign(&context)?;

        Ok(Response {
            index: dealer_index,
            response: DealResponse {
                session_id: session.session_id.clone(),
                index: responder,
                approved,
                signature,
            },
        })
    }

    fn handle_deal(&mut self, deal: &Deal) {
        let result = self.process_deal(deal);
        match result {
            Ok(None) => {}
            Ok(Some(response)) => {
                let session = self.session.as_ref().expect("session checked by caller");
                self.broadcast(session, Message::Response(response));
                self.try_certify();
            }
            Err(err) => {
                // a malformed deal aborts the run; broadcast the complaint first
                if let Some(session) = self.session.as_ref() {
                    if let Ok(complaint) = self.build_response(session, deal.index, false) {
                        self.broadcast(session, Message::Response(complaint));
                    }
                }
                self.fail_session(err);
            }
        }
    }

    /// Verify, decrypt and record one deal; returns our approval, or `None`
    /// for a duplicate (the first deal won).
    fn process_deal(&mut self, deal: &Deal) -> Result<Option<Response>, Error> {
        let session = self.session.as_mut().expect("session checked by caller");

        let dealer_index = deal.index as usize;
        if dealer_index >= session.pubkeys.len() {
            return Err(Error::InvalidDeal(format!(
                "dealer index {dealer_index} out of range"
            )));
        }
        if session.received[dealer_index].is_some() {
            return Ok(None);
        }
        let dealer_key = session.pubkeys[dealer_index].clone();

        let context = deal_context(
            &session.session_id,
            deal.index,
            &deal.encrypted.nonce,
            &deal.encrypted.cipher,
        );
        verify_signature(&dealer_key, &context, &deal.signature)
            .map_err(|e| Error::InvalidDeal(format!("bad deal signature: {e}")))?;

        let mut dh_context = deal.encrypted.dh_key.ser();
        dh_context.extend_from_slice(&session.session_id);
        verify_signature(&dealer_key, &dh_context, &deal.encrypted.signature)
            .map_err(|e| Error::InvalidDeal(format!("bad ephemeral key signature: {e}")))?;

        let payload = ecies::decrypt(
            &self.keys.secret,
            &deal.encrypted.dh_key,
            &deal.encrypted.nonce,
            &deal.encrypted.cipher,
        )?;
        let share: VerifiableShare<Ctx> = serde_json::from_slice(&payload)
            .map_err(|e| Error::InvalidDeal(format!("cannot decode share: {e}")))?;

        share
            .verify(&ParticipantPosition::from_index(session.my_index))
            .map_err(|e| Error::InvalidDeal(e.to_string()))?;

        session.checking_values[dealer_index] = Some(share.checking_values.clone());
        session.received[dealer_index] = Some(share);
        session
            .approvals
            .insert((deal.index, session.my_index as u32));

        let response = self.build_response(
            self.session.as_ref().expect("session checked above"),
            deal.index,
            true,
        )?;
        Ok(Some(response))
    }

    fn handle_response(&mut self, response: &Response) {
        let session = self.session.as_mut().expect("session checked by caller");

        let responder = response.response.index as usize;
        if responder >= session.pubkeys.len() {
            return self.fail_session(Error::InvalidResponse(format!(
                "responder index {responder} out of range"
            )));
        }
        if response.response.session_id != session.session_id {
            log::warn!(
                "election {}: response for a different session dropped",
                self.election_id
            );
            return;
        }

        let context = response_context(
            &session.session_id,
            response.index,
            response.response.index,
            response.response.approved,
        );
        if verify_signature(
            &session.pubkeys[responder],
            &context,
            &response.response.signature,
        )
        .is_err()
        {
            return self.fail_session(Error::InvalidResponse(format!(
                "bad response signature from index {responder}"
            )));
        }

        if !response.response.approved {
            return self.fail_session(Error::InvalidResponse(format!(
                "index {responder} complained about deal {}",
                response.index
            )));
        }

        session
            .approvals
            .insert((response.index, response.response.index));
        self.try_certify();
    }

    /// Certify once every deal is held and every response is approved.
    fn try_certify(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.certified_key.is_some() {
            return;
        }

        let n = session.participants.len();
        let all_shares = session.received.iter().all(Option::is_some);
        let all_approved = session.approvals.len() == n * n;
        if !all_shares || !all_approved {
            return;
        }

        match self.certify() {
            Ok(()) => self.finish_if_done(),
            Err(err) => self.fail_session(err),
        }
    }

    /// Compute the share and collective key, and persist them.
    fn certify(&mut self) -> Result<(), Error> {
        let session = self.session.as_mut().expect("session checked by caller");
        let position = ParticipantPosition::from_index(session.my_index);

        let shares: Vec<VerifiableShare<Ctx>> = session
            .received
            .iter()
            .map(|s| s.clone().expect("all shares received"))
            .collect();

        let (recipient, joint) = if session.resharing {
            let paired: Vec<(ParticipantPosition, VerifiableShare<Ctx>)> = shares
                .into_iter()
                .enumerate()
                .map(|(d, share)| (ParticipantPosition::from_index(d), share))
                .collect();
            let (recipient, joint) = combine_reshares(position, &paired)?;

            let prior = &self
                .data
                .start_res
                .as_ref()
                .expect("resharing requires certified state")
                .dist_key;
            if &joint.y != prior {
                return Err(Error::PublicKeysMismatch);
            }
            (recipient, joint)
        } else {
            Recipient::from_shares(position, &shares).map_err(|e| Error::InvalidDeal(e.to_string()))?
        };

        // verification keys for every participant, from the public checking values
        let all_checking_values: Vec<Vec<Element>> = session
            .checking_values
            .iter()
            .map(|cv| cv.clone().expect("all deals processed"))
            .collect();
        let verification_keys = if session.resharing {
            reshare_verification_keys(session.participants.len(), &all_checking_values)
        } else {
            (0..session.participants.len())
                .map(|i| {
                    Recipient::<Ctx>::verification_key_at(
                        &ParticipantPosition::from_index(i),
                        &all_checking_values,
                    )
                })
                .collect()
        };

        self.data.priv_share = Some(PrivateShare {
            index: session.my_index as u32,
            value: recipient.private_share().clone(),
        });
        self.data.start_res = Some(StartRes {
            dist_key: joint.y.clone(),
            participants: session.participants.clone(),
            verification_keys: Some(verification_keys),
        });
        self.dkgmap
            .save(self.election_id.as_bytes(), &self.data)?;

        log::info!(
            "election {}: dkg certified at index {}",
            self.election_id,
            session.my_index
        );
        session.certified_key = Some(joint.y);
        Ok(())
    }

    /// After certification: report to the initiator, or collect peers' reports.
    fn finish_if_done(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(key) = session.certified_key.clone() else {
            return;
        };

        match (&session.initiator_addr, session.collector.as_ref()) {
            (Some(initiator), _) => {
                let _ = self
                    .sender
                    .send(initiator, Message::StartDone(StartDone { pubkey: key }));
                self.session = None;
            }
            (None, Some(collector)) => {
                if collector.done.len() == session.participants.len() - 1 {
                    let all_equal = collector.done.values().all(|peer| peer == &key);
                    let session = self.session.take().expect("checked above");
                    let collector = session.collector.expect("checked above");
                    let result = if all_equal {
                        Ok(key)
                    } else {
                        Err(Error::PublicKeysMismatch)
                    };
                    let _ = collector.reply.send(result);
                }
            }
            (None, None) => self.session = None,
        }
    }

    fn handle_start_done(&mut self, from: &Address, done: &StartDone) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(collector) = session.collector.as_mut() else {
            log::warn!(
                "election {}: unexpected start done from {from}",
                self.election_id
            );
            return;
        };

        collector.done.insert(from.clone(), done.pubkey.clone());
        self.finish_if_done();
    }

    /// Abort the running round, discarding partial state.
    fn fail_session(&mut self, err: Error) {
        log::error!("election {}: dkg round failed: {err}", self.election_id);
        if let Some(session) = self.session.take() {
            if let Some(collector) = session.collector {
                let _ = collector.reply.send(Err(err));
            }
        }
    }

    // --- pubshares ---

    /// Compute and submit this node's pubshares for the election.
    fn serve_decrypt_request(&mut self, request: &DecryptRequest) -> Result<(), Error> {
        if request.election_id != self.election_id {
            return Err(Error::ElectionNotFound(request.election_id.clone()));
        }
        let share = self
            .data
            .priv_share
            .as_ref()
            .ok_or(Error::NotInitialized)?
            .clone();

        let election = self
            .store
            .lock()
            .map_err(|_| Error::StoreFailure("store lock poisoned".to_string()))?
            .get_election(&self.election_id)?;

        if election.status != Status::ShuffledBallots {
            return Err(Error::WrongStatus(format!(
                "cannot compute pubshares in status {}",
                election.status
            )));
        }
        if election
            .pubshares_units
            .iter()
            .any(|unit| unit.index == share.index)
        {
            log::debug!(
                "election {}: pubshares for index {} already registered",
                self.election_id,
                share.index
            );
            return Ok(());
        }

        let unit =
            decrypt::compute_pubshares(&election, share.index, &share.value, &self.keys.public)?;

        let deadline = Instant::now() + Duration::from_secs(10);
        retry_with_backoff(deadline, || {
            let mut guard = self
                .store
                .lock()
                .map_err(|_| Error::StoreFailure("store lock poisoned".to_string()))?;
            let nonce = guard.get_nonce(self.signer.verifying_key().as_bytes());
            let tx = Transaction::sign(
                nonce,
                &self.signer,
                Event::RegisterPubshares {
                    election_id: self.election_id.clone(),
                    unit: unit.clone(),
                },
            )?;
            guard.submit(tx)
        })?;

        log::info!(
            "election {}: submitted pubshares for index {}",
            self.election_id,
            share.index
        );
        Ok(())
    }

    /// Trigger a pubshare round and combine the result.
    fn run_decrypt(&mut self, deadline: Instant) -> Result<Vec<Vec<u8>>, Error> {
        let start_res = self.data.start_res.clone().ok_or(Error::NotInitialized)?;

        let request = DecryptRequest {
            election_id: self.election_id.clone(),
        };
        for address in &start_res.participants {
            if address != &self.address {
                let _ = self
                    .sender
                    .send(address, Message::DecryptRequest(request.clone()));
            }
        }
        self.serve_decrypt_request(&request)?;

        // wait for a threshold of units to commit, then combine
        loop {
            let election = self
                .store
                .lock()
                .map_err(|_| Error::StoreFailure("store lock poisoned".to_string()))?
                .get_election(&self.election_id)?;

            if election.pubshares_units.len() >= election.shuffle_threshold {
                return decrypt::combine_shares(&election);
            }
            if Instant::now() >= deadline {
                return Err(Error::InsufficientShares {
                    have: election.pubshares_units.len(),
                    need: election.shuffle_threshold,
                });
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    // --- helpers ---

    fn broadcast(&self, session: &Session, message: Message) {
        for address in &session.participants {
            if address != &self.address {
                let _ = self.sender.send(address, message.clone());
            }
        }
    }

    fn sign(&self, context: &[u8]) -> Result<Vec<u8>, Error> {
        let proof = SchnorrProof::<Ctx>::prove(
            &Ctx::generator(),
            &self.keys.public,
            &self.keys.secret,
            context,
        )
        .map_err(|e| Error::InvalidDeal(format!("cannot sign: {e}")))?;
        serde_json::to_vec(&proof)
            .map_err(|e| Error::InvalidDeal(format!("cannot encode signature: {e}")))
    }
}

/// Derive the session ID binding participants, keys and round kind.
fn session_id(start: &Start, resharing: bool) -> Vec<u8> {
    let mut hasher = <Ctx as Context>::get_hasher();
    let kind: &[u8] = if resharing { b"reshare" } else { b"setup" };
    let participants = start.participants.join(",").into_bytes();
    let pubkeys = start.pubkeys.ser();
    hash::update_hasher(
        &mut hasher,
        &[kind, &participants, &pubkeys],
        &[b"round_kind", b"participants", b"pubkeys"],
    );
    hasher.finalize().to_vec()
}

/// Signature context for the outer deal signature.
fn deal_context(session_id: &[u8], dealer: u32, nonce: &[u8], cipher: &[u8]) -> Vec<u8> {
    let mut context = b"deal".to_vec();
    context.extend_from_slice(session_id);
    context.extend_from_slice(&dealer.to_be_bytes());
    context.extend_from_slice(nonce);
    context.extend_from_slice(cipher);
    context
}

/// Signature context for a deal response.
fn response_context(session_id: &[u8], dealer: u32, responder: u32, approved: bool) -> Vec<u8> {
    let mut context = b"response".to_vec();
    context.extend_from_slice(session_id);
    context.extend_from_slice(&dealer.to_be_bytes());
    context.extend_from_slice(&responder.to_be_bytes());
    context.push(u8::from(approved));
    context
}

/// Verify a serialized Schnorr signature of knowledge.
fn verify_signature(public_key: &Element, context: &[u8], signature: &[u8]) -> Result<(), Error> {
    let proof: SchnorrProof<Ctx> = serde_json::from_slice(signature)
        .map_err(|e| Error::InvalidDeal(format!("cannot decode signature: {e}")))?;
    let ok = proof
        .verify(&Ctx::generator(), public_key, context)
        .map_err(|e| Error::InvalidDeal(e.to_string()))?;
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidDeal("signature does not verify".to_string()))
    }
}

/// Verification keys after a resharing round.
///
/// The new joint polynomial is the Lagrange-weighted sum of the dealers'
/// polynomials, so each key is the weighted product of the per-dealer
/// evaluations in the exponent.
fn reshare_verification_keys(
    n: usize,
    all_checking_values: &[Vec<Element>],
) -> Vec<Element> {
    use cryptography::dkgd::recipient::lagrange;

    let dealers: Vec<ParticipantPosition> =
        (0..n).map(ParticipantPosition::from_index).collect();

    (0..n)
        .map(|i| {
            let position = ParticipantPosition::from_index(i);
            let mut acc = Element::one();
            for (d, checking_values) in all_checking_values.iter().enumerate() {
                let weight = lagrange::<Ctx>(&dealers[d], &dealers);
                let eval = eval_checking_values(checking_values, &position);
                acc = acc.mul(&eval.exp(&weight));
            }
            acc
        })
        .collect()
}

/// Evaluate committed checking values at a position, in the exponent.
fn eval_checking_values(checking_values: &[Element], position: &ParticipantPosition) -> Element {
    use cryptography::traits::groups::GroupScalar;

    let x: Scalar = position.0.into();
    let mut power = Scalar::one();
    let mut acc = Element::one();
    for cv in checking_values {
        acc = acc.mul(&cv.exp(&power));
        power = power.mul(&x);
    }
    acc
}
