// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Point-to-point encryption of DKG deals.
//!
//! An integrated encryption scheme over the protocol group: an ephemeral
//! Diffie-Hellman exchange against the recipient's long-term key, HKDF key
//! derivation, and AES-256-GCM for the payload. The ephemeral public key and
//! nonce travel with the ciphertext in the wire deal.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use cryptography::context::Context;
use cryptography::traits::groups::GroupElement;
use cryptography::utils::serialization::VSerializable;

use crate::error::Error;
use crate::{Ctx, Element, Scalar};

/// AES-GCM nonce length in bytes.
const NONCE_LENGTH: usize = 12;

/// HKDF info label separating deal keys from other derived keys.
const KEY_INFO: &[u8] = b"dkg_deal_key";

/// Derive the AEAD key from a shared group element.
fn derive_key(shared: &Element) -> Result<[u8; 32], Error> {
    let hk = Hkdf::<Sha256>::new(None, &shared.ser());
    let mut okm = [0u8; 32];
    hk.expand(KEY_INFO, &mut okm)
        .map_err(|e| Error::InvalidDeal(format!("key derivation failed: {e}")))?;
    Ok(okm)
}

/// Encrypt a message so that only the holder of `receiver_pub`'s secret can
/// read it.
///
/// Returns the ephemeral public key, the AEAD nonce and the ciphertext.
///
/// # Errors
///
/// - `InvalidDeal` if key derivation or encryption fails
pub fn encrypt(receiver_pub: &Element, msg: &[u8]) -> Result<(Element, Vec<u8>, Vec<u8>), Error> {
    let ephemeral = Ctx::random_scalar();
    let dh_key = Ctx::generator().exp(&ephemeral);
    let shared = receiver_pub.exp(&ephemeral);

    let key_bytes = derive_key(&shared)?;
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    Ctx::get_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(key)
        .encrypt(nonce, msg)
        .map_err(|e| Error::InvalidDeal(format!("encryption failed: {e}")))?;

    Ok((dh_key, nonce_bytes.to_vec(), cipher))
}

/// Decrypt a message encrypted with [`encrypt`] using the receiver's
/// long-term secret.
///
/// # Errors
///
/// - `InvalidDeal` if the nonce is malformed or authentication fails
pub fn decrypt(
    receiver_secret: &Scalar,
    dh_key: &Element,
    nonce: &[u8],
    cipher: &[u8],
) -> Result<Vec<u8>, Error> {
    if nonce.len() != NONCE_LENGTH {
        return Err(Error::InvalidDeal(format!(
            "nonce of {} bytes, expected {NONCE_LENGTH}",
            nonce.len()
        )));
    }

    let shared = dh_key.exp(receiver_secret);
    let key_bytes = derive_key(&shared)?;
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);

    Aes256Gcm::new(key)
        .decrypt(Nonce::from_slice(nonce), cipher)
        .map_err(|_| Error::InvalidDeal("deal decryption failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair() -> (Scalar, Element) {
        let secret = Ctx::random_scalar();
        let public = Ctx::generator().exp(&secret);
        (secret, public)
    }

    #[test]
    fn test_ecies_roundtrip() {
        let (secret, public) = keypair();

        let msg = b"a private share payload";
        let (dh_key, nonce, cipher) = encrypt(&public, msg).unwrap();
        let plain = decrypt(&secret, &dh_key, &nonce, &cipher).unwrap();

        assert_eq!(plain, msg);
    }

    #[test]
    fn test_ecies_wrong_key_fails() {
        let (_, public) = keypair();
        let (other_secret, _) = keypair();

        let (dh_key, nonce, cipher) = encrypt(&public, b"secret").unwrap();
        assert!(decrypt(&other_secret, &dh_key, &nonce, &cipher).is_err());
    }

    #[test]
    fn test_ecies_tampered_cipher_fails() {
        let (secret, public) = keypair();

        let (dh_key, nonce, mut cipher) = encrypt(&public, b"secret").unwrap();
        cipher[0] ^= 1;
        assert!(decrypt(&secret, &dh_key, &nonce, &cipher).is_err());
    }
}
