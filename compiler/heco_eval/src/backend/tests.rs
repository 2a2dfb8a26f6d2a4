#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use heco_ir::{Operator, PrimitiveKind};

use super::*;
use crate::value::evaluate_binary;
use crate::EvalErrorKind;

fn factory() -> DummyCiphertextFactory {
    DummyCiphertextFactory::new(4)
}

fn encrypt(plain: impl Into<Cleartext>) -> Box<dyn Ciphertext> {
    factory().create_ciphertext(&plain.into()).unwrap()
}

fn decrypt(ciphertext: &dyn Ciphertext) -> Cleartext {
    factory().decrypt(ciphertext).unwrap()
}

#[test]
fn scalars_round_trip_as_scalars() {
    let ciphertext = encrypt(7_i64);
    assert_eq!(decrypt(ciphertext.as_ref()), Cleartext::from(7));
    let ciphertext = encrypt(true);
    assert_eq!(decrypt(ciphertext.as_ref()), Cleartext::from(true));
}

#[test]
fn vectors_are_zero_padded() {
    let ciphertext = encrypt(vec![1_i64, 2]);
    assert_eq!(decrypt(ciphertext.as_ref()), Cleartext::Int(vec![1, 2, 0, 0]));
}

#[test]
fn encoding_limits() {
    let err = factory()
        .create_ciphertext(&Cleartext::Int(vec![1, 2, 3, 4, 5]))
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Backend);
    assert_eq!(err.message, "a vector of 5 elements does not fit in 4 slots");

    let err = factory()
        .create_ciphertext(&Cleartext::String(vec!["x".into()]))
        .unwrap_err();
    assert_eq!(err.message, "cannot encrypt a string value");
    assert!(factory()
        .create_ciphertext(&Cleartext::empty(PrimitiveKind::Int))
        .is_err());
}

#[test]
fn rotation() {
    let mut ciphertext = encrypt(vec![1_i64, 2, 3, 4]);
    let rotated = ciphertext.rotate_rows(1).unwrap();
    assert_eq!(decrypt(rotated.as_ref()), Cleartext::Int(vec![2, 3, 4, 1]));
    // The source is untouched by the non-mutating form.
    assert_eq!(decrypt(ciphertext.as_ref()), Cleartext::Int(vec![1, 2, 3, 4]));

    ciphertext.rotate_rows_inplace(-1).unwrap();
    assert_eq!(decrypt(ciphertext.as_ref()), Cleartext::Int(vec![4, 1, 2, 3]));
}

#[test]
fn ciphertext_arithmetic() {
    let a = encrypt(vec![1_i64, 2, 3, 4]);
    let b = encrypt(10_i64);
    assert_eq!(decrypt(a.add(b.as_ref()).unwrap().as_ref()), Cleartext::Int(vec![11, 12, 13, 14]));
    assert_eq!(decrypt(b.subtract(a.as_ref()).unwrap().as_ref()), Cleartext::Int(vec![9, 8, 7, 6]));
    assert_eq!(decrypt(b.multiply(b.as_ref()).unwrap().as_ref()), Cleartext::from(100));
}

#[test]
fn plain_operands() {
    let mut a = encrypt(vec![1_i64, 2, 3, 4]);
    a.multiply_plain_inplace(&Cleartext::from(3)).unwrap();
    a.add_plain_inplace(&Cleartext::Int(vec![1, 1])).unwrap();
    a.subtract_plain_inplace(&Cleartext::from(1)).unwrap();
    assert_eq!(decrypt(a.as_ref()), Cleartext::Int(vec![3, 6, 8, 11]));
}

#[test]
fn mixed_kinds_promote_to_real() {
    let mut a = encrypt(2_i64);
    a.multiply_plain_inplace(&Cleartext::from(1.5)).unwrap();
    assert_eq!(decrypt(a.as_ref()), Cleartext::Double(vec![3.0]));
}

#[test]
fn slot_counts_must_agree() {
    let small = DummyCiphertextFactory::new(2).create_ciphertext(&Cleartext::from(1)).unwrap();
    let mut large = encrypt(1_i64);
    let err = large.add_inplace(small.as_ref()).unwrap_err();
    assert_eq!(err.message, "slot count mismatch: 4 vs 2");
}

#[test]
fn render_decrypts() {
    let factory = factory();
    let ciphertext = factory.create_ciphertext(&Cleartext::Int(vec![5, 6])).unwrap();
    assert_eq!(factory.render(ciphertext.as_ref()).unwrap(), "[5, 6, 0, 0]");
    assert_eq!(factory.slot_count(), 4);
    assert_eq!(DummyCiphertextFactory::default().slot_count(), 16);
}

// -- Property Tests --

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, ..ProptestConfig::default() })]

    #[test]
    fn agrees_with_cleartext_arithmetic(
        a in -10_000_i64..10_000,
        b in -10_000_i64..10_000,
        op in prop::sample::select(vec![Operator::Add, Operator::Sub, Operator::Mul]),
    ) {
        let factory = DummyCiphertextFactory::new(8);
        let mut left = factory.create_ciphertext(&Cleartext::from(a)).unwrap();
        let right = factory.create_ciphertext(&Cleartext::from(b)).unwrap();
        match op {
            Operator::Add => left.add_inplace(right.as_ref()).unwrap(),
            Operator::Sub => left.subtract_inplace(right.as_ref()).unwrap(),
            _ => left.multiply_inplace(right.as_ref()).unwrap(),
        }
        let expected = evaluate_binary(op, &Cleartext::from(a), &Cleartext::from(b)).unwrap();
        prop_assert_eq!(factory.decrypt(left.as_ref()).unwrap(), expected);
    }

    #[test]
    fn plain_operands_agree_with_cleartext(
        values in prop::collection::vec(-1_000_i64..1_000, 2..8),
        scalar in -1_000_i64..1_000,
    ) {
        let factory = DummyCiphertextFactory::new(values.len());
        let plain = Cleartext::Int(values);
        let mut ciphertext = factory.create_ciphertext(&plain).unwrap();
        ciphertext.multiply_plain_inplace(&Cleartext::from(scalar)).unwrap();
        let expected = evaluate_binary(Operator::Mul, &plain, &Cleartext::from(scalar)).unwrap();
        prop_assert_eq!(factory.decrypt(ciphertext.as_ref()).unwrap(), expected);
    }
}
