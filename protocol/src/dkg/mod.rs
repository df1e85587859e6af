// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! The distributed key generation service.
//!
//! One [`handler::DkgActor`] runs per election and node: `listen` starts the
//! node's event loop, `setup` is invoked exactly once by one designated node
//! after every node listens, and the remaining primitives (`encrypt`,
//! `decrypt`, `reshare`, persistence) operate on the certified state.

pub mod ecies;
pub mod handler;
pub mod messages;
pub mod transport;

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::{Element, Scalar};

/// Name of the key-value bucket holding per-election handler state.
pub const DKG_MAP_BUCKET: &str = "dkgmap";

/// A node's private share of the joint secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateShare {
    /// 0-based roster index of the holder.
    pub index: u32,
    /// The share scalar `x_i`.
    pub value: Scalar,
}

/// The certified outcome of a DKG run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRes {
    /// The collective public key `H`.
    pub dist_key: Element,
    /// The participant addresses, in dealing order.
    pub participants: Vec<messages::Address>,
    /// Share verification keys `g^x_i` per participant, derived from the
    /// run's checking values. Absent in state persisted by older builds.
    #[serde(default)]
    pub verification_keys: Option<Vec<Element>>,
}

/// Everything a node persists per election so a restart resumes without
/// re-running setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerData {
    /// Long-term private group key.
    pub priv_key: Scalar,
    /// Long-term public group key.
    pub pub_key: Element,
    /// Private share, present once certified.
    pub priv_share: Option<PrivateShare>,
    /// Certified DKG outcome, present once certified.
    pub start_res: Option<StartRes>,
}

impl HandlerData {
    /// Fresh pre-setup state for a node keypair.
    #[must_use]
    pub fn new(priv_key: Scalar, pub_key: Element) -> Self {
        HandlerData {
            priv_key,
            pub_key,
            priv_share: None,
            start_res: None,
        }
    }

    /// Encode the persistent state as JSON.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if encoding fails
    pub fn marshal_json(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self)
            .map_err(|e| Error::StoreFailure(format!("cannot encode handler data: {e}")))
    }

    /// Decode persistent state from JSON.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` if decoding fails
    pub fn unmarshal_json(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::StoreFailure(format!("cannot decode handler data: {e}")))
    }
}

/// The "dkgmap" bucket: per-election handler state keyed by the raw
/// election ID bytes.
#[derive(Default)]
pub struct DkgMap {
    entries: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl DkgMap {
    /// Persist handler state for an election.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` on encoding or lock failure
    pub fn save(&self, election_id: &[u8], data: &HandlerData) -> Result<(), Error> {
        let bytes = data.marshal_json()?;
        self.entries
            .lock()
            .map_err(|_| Error::StoreFailure("dkgmap lock poisoned".to_string()))?
            .insert(election_id.to_vec(), bytes);
        Ok(())
    }

    /// Load handler state for an election, if any.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` on decoding or lock failure
    pub fn load(&self, election_id: &[u8]) -> Result<Option<HandlerData>, Error> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| Error::StoreFailure("dkgmap lock poisoned".to_string()))?;
        guard
            .get(election_id)
            .map(|bytes| HandlerData::unmarshal_json(bytes))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptography::context::Context;
    use cryptography::traits::groups::GroupElement;

    use crate::Ctx;

    fn sample_data() -> HandlerData {
        let priv_key = Ctx::random_scalar();
        let pub_key = Ctx::generator().exp(&priv_key);
        let mut data = HandlerData::new(priv_key, pub_key);
        data.priv_share = Some(PrivateShare {
            index: 2,
            value: Ctx::random_scalar(),
        });
        data.start_res = Some(StartRes {
            dist_key: Ctx::random_element(),
            participants: vec!["node0".to_string(), "node1".to_string()],
            verification_keys: Some(vec![Ctx::random_element(), Ctx::random_element()]),
        });
        data
    }

    #[test]
    fn test_handler_data_roundtrip() {
        let data = sample_data();
        let bytes = data.marshal_json().unwrap();
        let back = HandlerData::unmarshal_json(&bytes).unwrap();
        assert_eq!(data, back);
    }

    #[test]
    fn test_handler_data_pre_setup_roundtrip() {
        let priv_key = Ctx::random_scalar();
        let pub_key = Ctx::generator().exp(&priv_key);
        let data = HandlerData::new(priv_key, pub_key);

        let back = HandlerData::unmarshal_json(&data.marshal_json().unwrap()).unwrap();
        assert_eq!(data, back);
        assert!(back.priv_share.is_none());
        assert!(back.start_res.is_none());
    }

    #[test]
    fn test_dkgmap_save_load() {
        let map = DkgMap::default();
        let data = sample_data();

        assert!(map.load(b"election").unwrap().is_none());
        map.save(b"election", &data).unwrap();
        assert_eq!(map.load(b"election").unwrap(), Some(data));
    }
}
