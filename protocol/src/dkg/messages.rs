// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Wire messages exchanged by the DKG handlers.
//!
//! All individual message structs are unified under the [`Message`] enum for
//! type-safe handling; an external codec frames them on the wire.

use serde::{Deserialize, Serialize};

use crate::Element;

/// A peer address on the transport layer.
pub type Address = String;

/// Broadcast by the initiator to start a DKG (or resharing) round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Start {
    /// Participant addresses, in dealing order.
    pub participants: Vec<Address>,
    /// Participant long-term public keys, aligned with `participants`.
    pub pubkeys: Vec<Element>,
}

/// The encrypted payload of a deal: an ephemeral DH key, the AEAD nonce and
/// the ciphertext holding the recipient's verifiable share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedDeal {
    /// Ephemeral Diffie-Hellman public key.
    pub dh_key: Element,
    /// Dealer's proof of possession over the ephemeral key.
    pub signature: Vec<u8>,
    /// AEAD nonce.
    pub nonce: Vec<u8>,
    /// AEAD ciphertext of the serialized verifiable share.
    pub cipher: Vec<u8>,
}

/// A point-to-point deal from one dealer to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// The dealer's 0-based index in the dealing order.
    pub index: u32,
    /// Dealer signature over the encrypted payload and session.
    pub signature: Vec<u8>,
    /// The encrypted share payload.
    pub encrypted: EncryptedDeal,
}

/// A broadcast verdict of one responder on one deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealResponse {
    /// The session the verdict belongs to.
    pub session_id: Vec<u8>,
    /// The responder's 0-based index.
    pub index: u32,
    /// Whether the responder approves the deal.
    pub approved: bool,
    /// Responder signature over the verdict.
    pub signature: Vec<u8>,
}

/// A response wrapper naming the deal being judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The judged dealer's 0-based index.
    pub index: u32,
    /// The responder's verdict.
    pub response: DealResponse,
}

/// Sent to a certified node to request its pubshares for an election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Hex-encoded election ID.
    pub election_id: String,
}

/// Request for a peer's long-term public key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GetPeerPubKey;

/// Reply carrying a peer's long-term public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPeerPubKeyResp {
    /// The peer's long-term public key.
    pub pubkey: Element,
}

/// Sent to the initiator by a node whose DKG instance certified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartDone {
    /// The collective public key this node computed.
    pub pubkey: Element,
}

/// The tagged message union processed by the DKG handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Start a DKG or resharing round.
    Start(Start),
    /// A point-to-point encrypted deal.
    Deal(Deal),
    /// A broadcast deal verdict.
    Response(Response),
    /// A pubshares request for an election.
    DecryptRequest(DecryptRequest),
    /// A long-term key request.
    GetPeerPubKey(GetPeerPubKey),
    /// A long-term key reply.
    GetPeerPubKeyResp(GetPeerPubKeyResp),
    /// A certification announcement to the initiator.
    StartDone(StartDone),
}
