// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Distributed key generation and decryption module tests

use crate::context::Context;
use crate::context::RistrettoCtx as Ctx;
use crate::cryptosystem::elgamal::PublicKey;
use crate::dkgd::dealer::{Dealer, VerifiableShare};
use crate::dkgd::recipient::{
    combine, combine_reshares, lagrange, DecryptionFactor, ParticipantPosition, Recipient,
};
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;

fn run_dkg(threshold: usize, participants: usize) -> (Vec<Recipient<Ctx>>, PublicKey<Ctx>) {
    let dealers: Vec<Dealer<Ctx>> = (0..participants)
        .map(|_| Dealer::generate(threshold, participants).unwrap())
        .collect();

    let mut recipients = Vec::with_capacity(participants);
    let mut joint_keys = Vec::with_capacity(participants);
    for i in 0..participants {
        let position = ParticipantPosition::from_index(i);
        let shares: Vec<VerifiableShare<Ctx>> = dealers
            .iter()
            .map(|d| d.get_verifiable_shares().for_recipient(&position))
            .collect();
        let (recipient, pk) = Recipient::from_shares(position, &shares).unwrap();
        recipients.push(recipient);
        joint_keys.push(pk);
    }

    // all computed joint public keys are equal
    assert!(joint_keys.windows(2).all(|w| w[0] == w[1]));

    // the public-data derivation agrees with the aggregated one
    let all_checking_values: Vec<_> = dealers.iter().map(|d| d.get_checking_values()).collect();
    let derived = Recipient::<Ctx>::joint_public_key(&all_checking_values);
    assert_eq!(derived, joint_keys[0]);

    for (i, recipient) in recipients.iter().enumerate() {
        let position = ParticipantPosition::from_index(i);
        let derived_vk = Recipient::<Ctx>::verification_key_at(&position, &all_checking_values);
        assert_eq!(&derived_vk, recipient.verification_key());
    }

    (recipients, joint_keys.pop().unwrap())
}

#[test]
fn test_joint_pkey() {
    run_dkg(2, 2);
    run_dkg(2, 3);
    run_dkg(3, 4);
}

#[test]
fn test_interpolated_shares_match_joint_key() {
    let (recipients, pk) = run_dkg(2, 3);

    // interpolating any threshold subset of shares at zero yields the joint secret
    for subset in [[0usize, 1], [0, 2], [1, 2]] {
        let present: Vec<ParticipantPosition> = subset
            .iter()
            .map(|i| recipients[*i].position)
            .collect();

        let mut secret = <Ctx as Context>::Scalar::zero();
        for i in subset {
            let coefficient = lagrange::<Ctx>(&recipients[i].position, &present);
            secret = secret.add(&recipients[i].private_share().mul(&coefficient));
        }

        assert_eq!(Ctx::generator().exp(&secret), pk.y);
    }
}

#[test]
fn test_dkgd_threshold_decryption() {
    for (threshold, participants) in [(2, 2), (2, 3), (3, 4)] {
        let (recipients, pk) = run_dkg(threshold, participants);

        let message = Ctx::random_element();
        let encrypted = vec![pk.encrypt_point(&message)];

        let verification_keys: Vec<_> = recipients
            .iter()
            .map(|r| r.verification_key().clone())
            .collect();

        // any threshold subset decrypts
        let dfactors: Vec<Vec<DecryptionFactor<Ctx>>> = recipients[participants - threshold..]
            .iter()
            .map(|r| r.decryption_factor(&encrypted, &[]).unwrap())
            .collect();

        let decrypted = combine(&encrypted, &dfactors, &verification_keys, &[]).unwrap();
        assert_eq!(message, decrypted[0]);
    }
}

#[test]
fn test_dkgd_bad_factor_rejected() {
    let (recipients, pk) = run_dkg(2, 3);

    let message = Ctx::random_element();
    let encrypted = vec![pk.encrypt_point(&message)];

    let verification_keys: Vec<_> = recipients
        .iter()
        .map(|r| r.verification_key().clone())
        .collect();

    let mut dfactors: Vec<Vec<DecryptionFactor<Ctx>>> = recipients[0..2]
        .iter()
        .map(|r| r.decryption_factor(&encrypted, &[]).unwrap())
        .collect();

    // corrupt one factor value; its proof no longer matches
    dfactors[0][0].value = Ctx::random_element();

    let result = combine(&encrypted, &dfactors, &verification_keys, &[]);
    assert!(result.is_err());
}

#[test]
fn test_dkgd_share_verification() {
    let dealer: Dealer<Ctx> = Dealer::generate(2, 3).unwrap();
    let shares = dealer.get_verifiable_shares();

    let position = ParticipantPosition(2);
    let share = shares.for_recipient(&position);
    assert!(share.verify(&position).is_ok());

    // a share presented for the wrong position fails
    assert!(share.verify(&ParticipantPosition(3)).is_err());

    // a tampered share value fails
    let tampered = VerifiableShare::<Ctx>::new(Ctx::random_scalar(), share.checking_values.clone());
    assert!(tampered.verify(&position).is_err());
}

#[test]
fn test_dkgd_invalid_threshold() {
    assert!(Dealer::<Ctx>::generate(0, 3).is_err());
    assert!(Dealer::<Ctx>::generate(4, 3).is_err());
    assert!(Dealer::<Ctx>::generate(1, 0).is_err());
}

#[test]
fn test_reshare_preserves_joint_key() {
    let threshold = 2;
    let participants = 3;
    let (recipients, pk) = run_dkg(threshold, participants);

    // every current member re-deals its share with a fresh polynomial
    let reshare_dealers: Vec<(ParticipantPosition, Dealer<Ctx>)> = recipients
        .iter()
        .map(|r| {
            let dealer =
                Dealer::reshare(r.private_share().clone(), threshold, participants).unwrap();
            (r.position, dealer)
        })
        .collect();

    let mut new_recipients = Vec::with_capacity(participants);
    for i in 0..participants {
        let position = ParticipantPosition::from_index(i);
        let shares: Vec<(ParticipantPosition, VerifiableShare<Ctx>)> = reshare_dealers
            .iter()
            .map(|(dealer_pos, d)| (*dealer_pos, d.get_verifiable_shares().for_recipient(&position)))
            .collect();

        let (recipient, new_pk) = combine_reshares(position, &shares).unwrap();
        // the joint public key is unchanged
        assert_eq!(new_pk.y, pk.y);
        new_recipients.push(recipient);
    }

    // the new shares decrypt under the old joint key
    let message = Ctx::random_element();
    let encrypted = vec![pk.encrypt_point(&message)];

    let verification_keys: Vec<_> = new_recipients
        .iter()
        .map(|r| r.verification_key().clone())
        .collect();

    let dfactors: Vec<Vec<DecryptionFactor<Ctx>>> = new_recipients[0..threshold]
        .iter()
        .map(|r| r.decryption_factor(&encrypted, &[]).unwrap())
        .collect();

    let decrypted = combine(&encrypted, &dfactors, &verification_keys, &[]).unwrap();
    assert_eq!(message, decrypted[0]);
}
