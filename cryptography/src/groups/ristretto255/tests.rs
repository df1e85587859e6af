// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Ristretto255 module tests

use super::*;
use crate::context::Context;
use crate::context::RistrettoCtx as Ctx;
use crate::traits::groups::CryptographicGroup;
use crate::traits::groups::GroupElement;
use crate::traits::groups::GroupScalar;
use crate::utils::serialization::{VDeserializable, VSerializable};

#[test]
fn test_ristretto_scalar_from_u32() {
    let one: RistrettoScalar = 1u32.into();
    assert_eq!(one, RistrettoScalar::one());
}

#[test]
fn test_ristretto_scalar_negation() {
    let s1 = Ctx::random_scalar();
    let s_neg = s1.neg();

    assert_eq!(
        s_neg.add(&s1),
        RistrettoScalar::zero(),
        "Negation property s + (-s) = 0 failed"
    );
}

#[test]
fn test_ristretto_scalar_inversion() {
    let s = Ctx::random_scalar();

    if s != RistrettoScalar::zero() {
        let s_inv = s.inv().unwrap();
        let product = s.mul(&s_inv);
        assert_eq!(
            product,
            RistrettoScalar::one(),
            "s * s_inv = 1 property failed"
        );
    }

    let zero = RistrettoScalar::zero();
    assert!(zero.inv().is_none(), "Inversion of zero must be None");
}

#[test]
fn test_ristretto_power_product() {
    let s1 = Ctx::random_scalar();
    let s2 = Ctx::random_scalar();
    let g = Ctx::generator();

    let e1 = g.exp(&s1);
    let e2 = g.exp(&s2);
    let e3_sum = e1.mul(&e2);

    let s_sum = s1.add(&s2);
    let e3_expected = g.exp(&s_sum);

    assert_eq!(
        e3_sum, e3_expected,
        "Element addition failed: e1+e2 != (s1+s2)*G"
    );
}

#[test]
fn test_ristretto_element_inv() {
    let s = Ctx::random_scalar();
    let g = Ctx::generator();
    let e = g.exp(&s);

    let e_neg = e.inv();
    let e_plus_e_neg = e.mul(&e_neg);

    assert_eq!(
        e_plus_e_neg,
        RistrettoElement::one(),
        "Element negation failed: e + (-e) != Id"
    );

    let s_neg = s.neg();
    let e_neg_expected = g.exp(&s_neg);
    assert_eq!(
        e_neg, e_neg_expected,
        "Element negation failed: (-s)*G != -(s*G)"
    );
}

#[test]
fn test_ristretto_element_identity_properties() {
    let s = Ctx::random_scalar();
    let g = Ctx::generator();
    let e = g.exp(&s);
    let id = RistrettoElement::one();

    assert_eq!(e.mul(&id), e, "e + Id != e");
    assert_eq!(id.mul(&e), e, "Id + e != e");

    let zero_scalar = RistrettoScalar::zero();
    assert_eq!(g.exp(&zero_scalar), id, "G^0 != Id");
}

#[test]
fn test_ristretto_scalar_element_mul_distributivity() {
    let s1 = Ctx::random_scalar();
    let s2 = Ctx::random_scalar();

    let e = Ctx::random_element();

    let sum_scalars = s1.add(&s2);
    let lhs = e.exp(&sum_scalars);

    let term1 = e.exp(&s1);
    let term2 = e.exp(&s2);
    let rhs = term1.mul(&term2);

    assert_eq!(lhs, rhs, "Distributivity e^(s1+s2) = e^s1 + e^s2 failed");
}

#[test]
fn test_ristretto_g_exp() {
    let s = Ctx::random_scalar();
    let g = Ctx::generator();

    let lhs = g.exp(&s);
    let rhs = Ristretto255Group::g_exp(&s);

    assert_eq!(lhs, rhs);
}

#[test]
fn test_ristretto_encode_decode_chunk() {
    use rand::Rng;

    let mut rng = Ctx::get_rng();
    let mut lhs = [0u8; 29];
    rng.fill(&mut lhs[..]);

    let element = Ristretto255Group::encode_chunk(&lhs).unwrap();
    let rhs = Ristretto255Group::decode_chunk(&element).unwrap();

    assert_eq!(lhs.to_vec(), rhs);
}

#[test]
fn test_ristretto_encode_decode_short_chunk() {
    // shorter inputs round-trip to their exact length
    let lhs = b"ballot".to_vec();

    let element = Ristretto255Group::encode_chunk(&lhs).unwrap();
    let rhs = Ristretto255Group::decode_chunk(&element).unwrap();

    assert_eq!(lhs, rhs);

    let empty = Ristretto255Group::encode_chunk(&[]).unwrap();
    assert!(Ristretto255Group::decode_chunk(&empty).unwrap().is_empty());
}

#[test]
fn test_ristretto_encode_chunk_too_long() {
    let data = [7u8; 30];
    let result = Ristretto255Group::encode_chunk(&data);
    assert!(result.is_err());
}

#[test]
fn test_ristretto_group_hash_to_scalar() {
    let input1 = b"some input data";
    let input2 = b"other input data";
    let ds_tag = b"ds tag";

    let s1 = Ristretto255Group::hash_to_scalar(&[input1], &[ds_tag]).unwrap();
    // Same input, same output
    let s2 = Ristretto255Group::hash_to_scalar(&[input1], &[ds_tag]).unwrap();
    // Different input, different output
    let s3 = Ristretto255Group::hash_to_scalar(&[input2], &[ds_tag]).unwrap();

    assert_eq!(s1, s2, "Hash to scalar not equal for equal input");
    assert_ne!(
        s1, s3,
        "Hash to scalar produces same output for different inputs"
    );
}

#[test]
fn test_ristretto_hash_to_element_different_tags() {
    let input = b"same input";
    let tag1 = b"tagA";
    let tag2 = b"tagB";

    let elem1 = Ristretto255Group::hash_to_element(&[input], &[tag1]).unwrap();
    let elem2 = Ristretto255Group::hash_to_element(&[input], &[tag2]).unwrap();

    assert_ne!(elem1, elem2);
}

#[test]
fn test_ristretto_element_serialization() {
    let s = Ctx::random_scalar();
    let g = Ctx::generator();
    let e_orig = g.exp(&s);

    let serialized_e = e_orig.ser();
    assert_eq!(serialized_e.len(), 32, "Serialized element length mismatch");

    let e_deserialized = RistrettoElement::deser(&serialized_e).unwrap();
    assert_eq!(
        e_orig, e_deserialized,
        "Original and deserialized elements do not match"
    );

    // Test identity
    let e_id = RistrettoElement::one();
    let ser_id = e_id.ser();
    let des_id = RistrettoElement::deser(&ser_id).unwrap();
    assert_eq!(e_id, des_id);

    // test wrong length
    let bytes = [0u8; 40];
    let result = RistrettoElement::deser(&bytes);
    assert!(result.is_err());

    // test bad data
    // this array of bytes does not correspond to a point
    let bytes = [1u8; 32];
    let result = RistrettoElement::deser(&bytes);
    assert!(result.is_err());
}

#[test]
fn test_ristretto_scalar_serialization() {
    let s_orig = Ctx::random_scalar();

    let serialized_s = s_orig.ser();
    assert_eq!(serialized_s.len(), 32, "Serialized scalar length mismatch");

    let s_deserialized = RistrettoScalar::deser(&serialized_s).unwrap();
    assert_eq!(
        s_orig, s_deserialized,
        "Original and deserialized scalars do not match"
    );

    // test wrong length
    let bytes = [0u8; 40];
    let result = RistrettoScalar::deser(&bytes);
    assert!(result.is_err());
}

#[test]
fn test_ristretto_scalar_encode() {
    let s = Ctx::random_scalar();
    let elements = Ristretto255Group::encode_scalar(&s).unwrap();

    let s_decoded = Ristretto255Group::decode_scalar(&elements).unwrap();
    assert_eq!(s, s_decoded, "Decoded scalar does not match original");
}

#[test]
fn test_ristretto_ind_generators() {
    let generators = Ristretto255Group::ind_generators(5, b"label").unwrap();
    assert_eq!(generators.len(), 5);

    // distinct among themselves and re-derivable
    for (i, g) in generators.iter().enumerate() {
        for other in generators.iter().skip(i + 1) {
            assert_ne!(g, other);
        }
    }

    let again = Ristretto255Group::ind_generators(5, b"label").unwrap();
    assert_eq!(generators, again);

    let other_label = Ristretto255Group::ind_generators(5, b"other").unwrap();
    assert_ne!(generators, other_label);
}
