// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! ElGamal cryptosystem

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::traits::groups::CryptographicGroup;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;
use crate::utils::serialization::{VDeserializable, VSerializable};
use crate::utils::Error;

/**
 * An `ElGamal` key pair.
 *
 * This struct represents a key pair in the `ElGamal` encryption scheme,
 * including the secret scalar value and public group element.
 *
 * # Examples
 *
 * ```
 * use cryptography::cryptosystem::elgamal::KeyPair;
 * use cryptography::context::Context;
 * use cryptography::context::RistrettoCtx as RCtx;
 *
 * let keypair: KeyPair<RCtx> = KeyPair::generate();
 * let message = RCtx::random_element();
 * let ciphertext = keypair.pkey.encrypt_point(&message);
 *
 * let decrypted = keypair.decrypt(&ciphertext);
 *
 * assert_eq!(message, decrypted);
 * ```
 */
#[derive(Debug, PartialEq, Clone)]
pub struct KeyPair<C: Context> {
    /// the private key as a raw group scalar
    pub skey: C::Scalar,
    /// the public key
    pub pkey: PublicKey<C>,
}

impl<C: Context> KeyPair<C> {
    /// Construct a new key pair with the given secret and public values.
    ///
    /// Use this function to create a key pair from existing secret and public keys.
    /// Use [`KeyPair::generate`] to instead generate a fresh key pair.
    pub fn new(skey: C::Scalar, pkey: C::Element) -> KeyPair<C> {
        let pkey = PublicKey::new(pkey);
        KeyPair { skey, pkey }
    }

    /// Construct a new key pair, generating fresh key material.
    #[must_use]
    pub fn generate() -> Self {
        let skey = C::random_scalar();
        let pkey = C::generator().exp(&skey);
        let pkey = PublicKey::new(pkey);
        KeyPair { skey, pkey }
    }

    /// Decrypt the given ciphertext with this key pair.
    pub fn decrypt(&self, ciphertext: &Ciphertext<C>) -> C::Element {
        decrypt::<C>(&ciphertext.u, &ciphertext.v, &self.skey)
    }

    /// Decrypt the given ciphertext and recover the embedded byte chunk.
    ///
    /// # Errors
    ///
    /// - `EncodingError` if the decrypted point does not carry a valid embedding
    pub fn decrypt_chunk(&self, ciphertext: &Ciphertext<C>) -> Result<Vec<u8>, Error> {
        let point = self.decrypt(ciphertext);
        C::G::decode_chunk(&point)
    }
}

/**
 * An `ElGamal` public key.
 *
 * This struct represents a public key in the `ElGamal` encryption scheme.
 * It contains the group element 'y', which is used in the encryption
 * process.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct PublicKey<C: Context> {
    /// the public key as a raw group element
    pub y: C::Element,
}

impl<C: Context> PublicKey<C> {
    /// Construct a new public key with the given public value.
    pub fn new(y: C::Element) -> Self {
        Self { y }
    }

    /// Encrypt a point message with fresh randomness.
    pub fn encrypt_point(&self, message: &C::Element) -> Ciphertext<C> {
        let r = C::random_scalar();
        self.encrypt_point_with_r(message, &r)
    }

    /// Encrypt a point message with the given randomness.
    ///
    /// Computes the ciphertext as `(u, v) = (g^r, m * y^r)`.
    pub fn encrypt_point_with_r(&self, message: &C::Element, r: &C::Scalar) -> Ciphertext<C> {
        let u = C::G::g_exp(r);
        let v = message.mul(&self.y.exp(r));

        Ciphertext { u, v }
    }

    /// Encrypt the leading chunk of a byte message.
    ///
    /// Consumes up to [`CryptographicGroup::CHUNK_BYTES`] bytes of `message`
    /// and returns the ciphertext together with the un-encrypted tail.
    /// Callers iterate to chunk longer messages:
    ///
    /// ```
    /// use cryptography::cryptosystem::elgamal::KeyPair;
    /// use cryptography::context::RistrettoCtx as RCtx;
    ///
    /// let keypair: KeyPair<RCtx> = KeyPair::generate();
    /// let message = [7u8; 45];
    ///
    /// let (first, remainder) = keypair.pkey.encrypt(&message).unwrap();
    /// assert_eq!(remainder.len(), 16);
    /// let (second, remainder) = keypair.pkey.encrypt(remainder).unwrap();
    /// assert!(remainder.is_empty());
    ///
    /// let mut plaintext = keypair.decrypt_chunk(&first).unwrap();
    /// plaintext.extend(keypair.decrypt_chunk(&second).unwrap());
    /// assert_eq!(plaintext, message.to_vec());
    /// ```
    ///
    /// # Errors
    ///
    /// - `EncodingError` if embedding the chunk fails, with negligible probability
    pub fn encrypt<'a>(&self, message: &'a [u8]) -> Result<(Ciphertext<C>, &'a [u8]), Error> {
        let take = message.len().min(C::G::CHUNK_BYTES);
        let point = C::G::encode_chunk(&message[..take])?;

        Ok((self.encrypt_point(&point), &message[take..]))
    }
}

/**
 * Decrypt a ciphertext using the given secret key.
 *
 * Computes the plaintext as `m = v * (u^-x) = v / u^x`.
 * This function operates on raw elements. See also [`KeyPair::decrypt`] to
 * operate on [`Ciphertext`].
 */
#[inline]
pub fn decrypt<C: Context>(u: &C::Element, v: &C::Element, sk: &C::Scalar) -> C::Element {
    let u_pow_neg_x = u.exp(&sk.neg());

    v.mul(&u_pow_neg_x)
}

/**
 * An `ElGamal` ciphertext.
 *
 * This struct represents a ciphertext in the `ElGamal` encryption scheme
 * as a pair of group elements `(u, v)`, where `u = g^r` and `v = m * y^r`.
 *
 * # Examples
 *
 * ```
 * use cryptography::cryptosystem::elgamal::KeyPair;
 * use cryptography::context::Context;
 * use cryptography::context::RistrettoCtx as RCtx;
 *
 * let keypair: KeyPair<RCtx> = KeyPair::generate();
 * let message = RCtx::random_element();
 * let ciphertext = keypair.pkey.encrypt_point(&message);
 *
 * // re-encryption leaves the plaintext unchanged
 * let re_encrypted = ciphertext.re_encrypt(&RCtx::random_scalar(), &keypair.pkey.y);
 *
 * let decrypted = keypair.decrypt(&re_encrypted);
 *
 * assert_eq!(message, decrypted);
 * ```
 */
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct Ciphertext<C: Context> {
    /// The first element of the ciphertext, `g^r`.
    pub u: C::Element,
    /// The second element of the ciphertext, `m * y^r`.
    pub v: C::Element,
}

impl<C: Context> Ciphertext<C> {
    /// Construct a ciphertext with given values `u` and `v`.
    ///
    /// Use [`PublicKey::encrypt`] or [`PublicKey::encrypt_point`] to encrypt
    /// a ciphertext from a message.
    pub fn new(u: C::Element, v: C::Element) -> Self {
        Ciphertext { u, v }
    }

    /// Re-encrypt the ciphertext using a new randomness value `r_n` and a public key `pk`.
    #[must_use]
    pub fn re_encrypt(&self, r_n: &C::Scalar, pk: &C::Element) -> Self {
        let u = self.u.mul(&C::G::g_exp(r_n));
        let v = self.v.mul(&pk.exp(r_n));

        Self { u, v }
    }

    /// Re-encrypt the ciphertext with randomness drawn fresh from the context rng.
    ///
    /// Returns the re-encrypted ciphertext together with the randomness used.
    #[must_use]
    pub fn re_randomize(&self, pk: &C::Element) -> (Self, C::Scalar) {
        let r = C::random_scalar();
        (self.re_encrypt(&r, pk), r)
    }
}

impl<C: Context> VSerializable for Ciphertext<C> {
    fn ser(&self) -> Vec<u8> {
        let mut out = self.u.ser();
        out.extend(self.v.ser());
        out
    }
}

impl<C: Context> VDeserializable for Ciphertext<C> {
    fn deser(buffer: &[u8]) -> Result<Self, Error> {
        if buffer.len() % 2 != 0 {
            return Err(Error::DeserializationError(
                "odd ciphertext byte length".to_string(),
            ));
        }
        let half = buffer.len() / 2;
        let u = C::Element::deser(&buffer[..half])?;
        let v = C::Element::deser(&buffer[half..])?;
        Ok(Ciphertext { u, v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::context::RistrettoCtx as RCtx;
    use crate::cryptosystem::elgamal;

    #[test]
    fn test_elgamal_point_roundtrip() {
        let keypair = KeyPair::<RCtx>::generate();
        let message = RCtx::random_element();

        let ciphertext = keypair.pkey.encrypt_point(&message);
        let decrypted_message = keypair.decrypt(&ciphertext);
        assert_eq!(message, decrypted_message);

        // decrypt with standalone function
        let decrypted_message =
            elgamal::decrypt::<RCtx>(&ciphertext.u, &ciphertext.v, &keypair.skey);
        assert_eq!(message, decrypted_message);
    }

    #[test]
    fn test_elgamal_bytes_roundtrip() {
        let keypair = KeyPair::<RCtx>::generate();

        let message = b"a 21 byte message....";
        let (ciphertext, remainder) = keypair.pkey.encrypt(message).unwrap();
        assert!(remainder.is_empty());

        let decrypted = keypair.decrypt_chunk(&ciphertext).unwrap();
        assert_eq!(message.to_vec(), decrypted);
    }

    #[test]
    fn test_elgamal_chunked_message() {
        let keypair = KeyPair::<RCtx>::generate();

        // 45 bytes: one full chunk plus a 16 byte remainder
        let message: Vec<u8> = (0u8..45).collect();

        let (first, remainder) = keypair.pkey.encrypt(&message).unwrap();
        assert_eq!(remainder.len(), 16);

        let (second, remainder) = keypair.pkey.encrypt(remainder).unwrap();
        assert!(remainder.is_empty());

        let mut decrypted = keypair.decrypt_chunk(&first).unwrap();
        decrypted.extend(keypair.decrypt_chunk(&second).unwrap());
        assert_eq!(message, decrypted);
    }

    #[test]
    fn test_elgamal_re_encrypt() {
        let keypair = KeyPair::<RCtx>::generate();
        let message = RCtx::random_element();

        let ciphertext = keypair.pkey.encrypt_point(&message);
        let (re_encrypted, _r) = ciphertext.re_randomize(&keypair.pkey.y);

        assert_ne!(ciphertext, re_encrypted);
        assert_eq!(message, keypair.decrypt(&re_encrypted));
    }

    #[test]
    fn test_ciphertext_serde() {
        let keypair = KeyPair::<RCtx>::generate();
        let message = RCtx::random_element();
        let ciphertext = keypair.pkey.encrypt_point(&message);

        let json = serde_json::to_string(&ciphertext).unwrap();
        let back: Ciphertext<RCtx> = serde_json::from_str(&json).unwrap();
        assert_eq!(ciphertext, back);
    }
}
