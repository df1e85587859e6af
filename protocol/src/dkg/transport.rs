// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! The gossip transport consumed by the DKG handlers.
//!
//! [`Sender`] and [`Receiver`] abstract the peer network: sends are
//! best-effort, receives carry the peer address. [`LocalRouter`] is an
//! in-process implementation backed by channels, used by the tests.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::dkg::messages::{Address, Message};
use crate::error::Error;

/// Best-effort message sending to named peers.
pub trait Sender: Send {
    /// Send a message to the peer at `to`. Best-effort: an unreachable peer
    /// is not an error.
    ///
    /// # Errors
    ///
    /// - `TransportFailure` on a local transport fault
    fn send(&self, to: &Address, message: Message) -> Result<(), Error>;
}

/// Outcome of a receive attempt.
#[derive(Debug)]
pub enum RecvError {
    /// Nothing arrived before the timeout.
    Timeout,
    /// The stream is closed; no further messages will arrive.
    Closed,
}

/// Blocking message reception with a timeout.
pub trait Receiver: Send {
    /// Wait up to `timeout` for the next message.
    ///
    /// # Errors
    ///
    /// - [`RecvError::Timeout`] if nothing arrived in time
    /// - [`RecvError::Closed`] if the stream is closed
    fn recv(&mut self, timeout: Duration) -> Result<(Address, Message), RecvError>;
}

type Inboxes = Arc<Mutex<HashMap<Address, mpsc::Sender<(Address, Message)>>>>;

/// An in-process router delivering messages between registered addresses.
#[derive(Default, Clone)]
pub struct LocalRouter {
    inboxes: Inboxes,
}

impl LocalRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address, returning its sender and receiver halves.
    ///
    /// # Panics
    ///
    /// Panics if the router lock is poisoned; test-only infrastructure.
    #[must_use]
    pub fn stream(&self, address: &str) -> (RouterSender, RouterReceiver) {
        let (tx, rx) = mpsc::channel();
        self.inboxes
            .lock()
            .expect("router lock")
            .insert(address.to_string(), tx);

        let sender = RouterSender {
            from: address.to_string(),
            inboxes: Arc::clone(&self.inboxes),
        };
        (sender, RouterReceiver { rx })
    }
}

/// The sending half of a [`LocalRouter`] registration.
#[derive(Clone)]
pub struct RouterSender {
    from: Address,
    inboxes: Inboxes,
}

impl Sender for RouterSender {
    fn send(&self, to: &Address, message: Message) -> Result<(), Error> {
        let guard = self
            .inboxes
            .lock()
            .map_err(|_| Error::TransportFailure("router lock poisoned".to_string()))?;

        match guard.get(to) {
            Some(tx) => {
                // a disconnected peer is best-effort territory, not an error
                if tx.send((self.from.clone(), message)).is_err() {
                    log::warn!("dropping message to disconnected peer {to}");
                }
            }
            None => log::warn!("dropping message to unknown peer {to}"),
        }
        Ok(())
    }
}

/// The receiving half of a [`LocalRouter`] registration.
pub struct RouterReceiver {
    rx: mpsc::Receiver<(Address, Message)>,
}

impl Receiver for RouterReceiver {
    fn recv(&mut self, timeout: Duration) -> Result<(Address, Message), RecvError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => RecvError::Timeout,
            RecvTimeoutError::Disconnected => RecvError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dkg::messages::GetPeerPubKey;

    #[test]
    fn test_router_delivers_with_sender_address() {
        let router = LocalRouter::new();
        let (alice, _alice_rx) = router.stream("alice");
        let (_bob, mut bob_rx) = router.stream("bob");

        alice
            .send(&"bob".to_string(), Message::GetPeerPubKey(GetPeerPubKey))
            .unwrap();

        let (from, message) = bob_rx.recv(Duration::from_millis(100)).unwrap();
        assert_eq!(from, "alice");
        assert!(matches!(message, Message::GetPeerPubKey(_)));
    }

    #[test]
    fn test_router_send_to_unknown_peer_is_best_effort() {
        let router = LocalRouter::new();
        let (alice, mut alice_rx) = router.stream("alice");

        // does not error, message is dropped
        alice
            .send(&"nobody".to_string(), Message::GetPeerPubKey(GetPeerPubKey))
            .unwrap();
        assert!(matches!(
            alice_rx.recv(Duration::from_millis(10)),
            Err(RecvError::Timeout)
        ));
    }
}
