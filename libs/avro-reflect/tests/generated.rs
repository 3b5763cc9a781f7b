mod common;

use avro_reflect::{CodecError, CodecSelector, StrategyKind};
use prost_reflect::Value;

use common::*;

fn sample() -> Account {
    Account { id: 1001, username: "jdoe".to_owned(), email: Some("a@b.com".to_owned()) }
}

#[test]
fn test_generated_matches_dynamic_encoding() {
    let schema = schema(ACCOUNT_SCHEMA);

    let mut dynamic = new_message("bank.Account");
    set(&mut dynamic, "id", Value::I32(1001));
    set(&mut dynamic, "username", string("jdoe"));
    set(&mut dynamic, "email", string("a@b.com"));

    assert_eq!(encode(&schema, &sample()).unwrap(), encode(&schema, &dynamic).unwrap());
}

#[test]
fn test_generated_round_trip() {
    let schema = schema(ACCOUNT_SCHEMA);
    let bytes = encode(&schema, &sample()).unwrap();

    let mut decoded = Account::default();
    decode(&schema, &bytes, &mut decoded).unwrap();
    assert_eq!(decoded, sample());

    let absent = Account { email: None, ..sample() };
    let bytes = encode(&schema, &absent).unwrap();
    decode(&schema, &bytes, &mut decoded).unwrap();
    assert_eq!(decoded, absent);
}

#[test]
fn test_failed_decode_leaves_target_untouched() {
    let schema = schema(ACCOUNT_SCHEMA);
    let bytes = encode(&schema, &sample()).unwrap();

    let original = Account { id: 7, username: "keep".to_owned(), email: None };
    let mut target = original.clone();
    assert!(decode(&schema, &bytes[..bytes.len() - 1], &mut target).is_err());
    assert_eq!(target, original);
}

#[test]
fn test_decode_into_none_allocates() {
    let schema = schema(ACCOUNT_SCHEMA);
    let bytes = encode(&schema, &sample()).unwrap();

    let mut target: Option<Account> = None;
    decode(&schema, &bytes, &mut target).unwrap();
    assert_eq!(target, Some(sample()));
}

#[test]
fn test_encode_none_is_nil_message() {
    let schema = schema(ACCOUNT_SCHEMA);
    let err = encode(&schema, &None::<Account>).unwrap_err();
    assert!(matches!(err, CodecError::NilMessage));
}

#[test]
fn test_boxed_value() {
    let schema = schema(ACCOUNT_SCHEMA);
    let boxed = Box::new(sample());
    assert_eq!(encode(&schema, &boxed).unwrap(), encode(&schema, &sample()).unwrap());

    let selector = CodecSelector::default();
    let encoder = selector.encoder::<Box<Account>>(&schema).unwrap();
    assert_eq!(encoder.strategy(), StrategyKind::Message);
}
