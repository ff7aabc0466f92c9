//! Property-based tests for the record codec.
//!
//! These tests use proptest to verify invariants hold for all inputs:
//! - Every primitive kind round-trips exactly in both byte orders
//! - Encoded length always equals the schema size
//! - Strings decode to the bytes before the first zero
//! - Truncated input is always a short read

use std::sync::Arc;

use cstruct::{Endian, FieldType, Record, Schema, SchemaBuilder, Value};
use proptest::prelude::*;

fn endian_strategy() -> impl Strategy<Value = Endian> {
    prop_oneof![Just(Endian::Little), Just(Endian::Big)]
}

// Strategy for an integer type paired with a value of that type
fn integer_strategy() -> impl Strategy<Value = (FieldType, Value)> {
    prop_oneof![
        any::<i8>().prop_map(|v| (FieldType::Char, Value::I8(v))),
        any::<u8>().prop_map(|v| (FieldType::UnsignedChar, Value::U8(v))),
        any::<i16>().prop_map(|v| (FieldType::Short, Value::I16(v))),
        any::<u16>().prop_map(|v| (FieldType::UnsignedShort, Value::U16(v))),
        any::<i32>().prop_map(|v| (FieldType::Int, Value::I32(v))),
        any::<u32>().prop_map(|v| (FieldType::UnsignedInt, Value::U32(v))),
        any::<i64>().prop_map(|v| (FieldType::LongLong, Value::I64(v))),
        any::<u64>().prop_map(|v| (FieldType::UnsignedLongLong, Value::U64(v))),
    ]
}

// Strategy for any primitive except strings (NaN excluded so values compare equal)
fn primitive_strategy() -> impl Strategy<Value = (FieldType, Value)> {
    prop_oneof![
        integer_strategy(),
        any::<bool>().prop_map(|v| (FieldType::Bool, Value::Bool(v))),
        proptest::num::f32::NORMAL.prop_map(|v| (FieldType::Float, Value::F32(v))),
        proptest::num::f64::NORMAL.prop_map(|v| (FieldType::Double, Value::F64(v))),
    ]
}

fn single(ty: FieldType, count: usize) -> Arc<Schema> {
    Schema::builder("Single")
        .array("a", ty, count)
        .and_then(SchemaBuilder::build)
        .unwrap()
}

#[test]
fn prop_primitive_round_trip() {
    proptest!(|((ty, value) in primitive_strategy(), endian in endian_strategy())| {
        let schema = single(ty, 1);
        let mut record = Record::new(Arc::clone(&schema));
        record.set([value.clone()]).unwrap();

        let bytes = record.to_bytes(endian).unwrap();
        prop_assert_eq!(bytes.len(), ty.width(1));

        let decoded = Record::from_bytes(schema, &bytes, endian).unwrap();
        prop_assert_eq!(decoded.get("a"), Some(&value));
    });
}

#[test]
fn prop_array_round_trip() {
    proptest!(|(values in prop::collection::vec(any::<i32>(), 2..16), endian in endian_strategy())| {
        let schema = single(FieldType::Int, values.len());
        let value = Value::Array(values.iter().copied().map(Value::I32).collect());
        let mut record = Record::new(Arc::clone(&schema));
        record.set([value.clone()]).unwrap();

        let bytes = record.to_bytes(endian).unwrap();
        prop_assert_eq!(bytes.len(), 4 * values.len());

        let decoded = Record::from_bytes(schema, &bytes, endian).unwrap();
        prop_assert_eq!(decoded.get("a"), Some(&value));
    });
}

#[test]
fn prop_byte_orders_mirror_each_other() {
    proptest!(|(v in any::<u32>())| {
        let schema = single(FieldType::UnsignedInt, 1);
        let mut record = Record::new(schema);
        record.set([v]).unwrap();
        let mut little = record.to_bytes(Endian::Little).unwrap();
        let big = record.to_bytes(Endian::Big).unwrap();
        little.reverse();
        prop_assert_eq!(little, big);
    });
}

#[test]
fn prop_string_cut_at_first_zero() {
    proptest!(|(raw in prop::collection::vec(any::<u8>(), 1..32))| {
        let schema = single(FieldType::String, raw.len());
        let decoded = Record::from_bytes(schema, &raw, Endian::Little).unwrap();
        let expected = match raw.iter().position(|&b| b == 0) {
            Some(end) => raw[..end].to_vec(),
            None => raw.clone(),
        };
        prop_assert_eq!(decoded.get("a"), Some(&Value::Bytes(expected)));
    });
}

#[test]
fn prop_truncated_input_is_short_read() {
    proptest!(|(cut in 0usize..14)| {
        let point = single(FieldType::Short, 2);
        let schema = Schema::builder("Shape")
            .uint("id")
            .and_then(|b| b.record("points", point, 2))
            .and_then(|b| b.bool("closed"))
            .and_then(|b| b.uchar("kind"))
            .and_then(SchemaBuilder::build)
            .unwrap();
        prop_assert_eq!(schema.size(), 14);

        let bytes = vec![0x11u8; cut];
        let err = Record::from_bytes(schema, &bytes, Endian::Big).unwrap_err();
        prop_assert!(err.is_short_read());
    });
}
