//! Schema kind ↔ native value conversion for single values.
//!
//! | schema                         | native                                 |
//! |--------------------------------|----------------------------------------|
//! | int, date, time-millis         | int32, uint32 (truncating), enum number |
//! | long, time-micros, timestamps  | int64, uint64 (truncating)             |
//! | float / double                 | float / double, no promotion           |
//! | boolean                        | bool                                   |
//! | string, uuid                   | string, enum by symbol name            |
//! | enum                           | enum by symbol name, string            |
//! | bytes / fixed(n)               | bytes (exactly n for fixed)            |
//! | record                         | nested message                         |
//!
//! Unions met here (list items, map values, non-presence fields) go through
//! [`union::encode_branch`] / [`union::decode_branch`].

use apache_avro::schema::EnumSchema;
use apache_avro::Schema;
use avro_wire::{PrimitiveRead, PrimitiveWrite};

use crate::accessor::MessageAccessor;
use crate::schema::{is_int_encoded, is_long_encoded, kind_matches, kind_name, Context};
use crate::value::{NativeKind, Value};
use crate::{record, union, CodecError};

fn mismatch(field: String, schema: &Schema, native: NativeKind) -> CodecError {
    CodecError::Conversion { field, schema: kind_name(schema), native }
}

/// Writes one value of `field` under `schema`.
pub(crate) fn encode_scalar<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    value: Value<M>,
    schema: &Schema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let schema = ctx.resolve(schema)?;
    match (schema, value) {
        (Schema::Union(u), value) => union::encode_branch(ctx, msg, field, value, u, w),

        (s, Value::I32(v)) if is_int_encoded(s) => Ok(w.write_int(v)?),
        (s, Value::U32(v)) if is_int_encoded(s) => Ok(w.write_int(v as i32)?),
        (s, Value::EnumNumber(v)) if is_int_encoded(s) => Ok(w.write_int(v)?),
        (s, Value::I64(v)) if is_long_encoded(s) => Ok(w.write_long(v)?),
        (s, Value::U64(v)) if is_long_encoded(s) => Ok(w.write_long(v as i64)?),

        (Schema::Float, Value::F32(v)) => Ok(w.write_float(v)?),
        (Schema::Double, Value::F64(v)) => Ok(w.write_double(v)?),
        (Schema::Boolean, Value::Bool(v)) => Ok(w.write_bool(v)?),

        (Schema::String | Schema::Uuid, Value::String(v)) => Ok(w.write_string(&v)?),
        (Schema::String | Schema::Uuid, Value::EnumNumber(number)) => {
            let symbol = enum_symbol(msg, field, number)?;
            Ok(w.write_string(&symbol)?)
        }

        (Schema::Enum(e), Value::EnumNumber(number)) => {
            let symbol = enum_symbol(msg, field, number)?;
            Ok(w.write_int(symbol_index(msg, field, e, &symbol)?)?)
        }
        (Schema::Enum(e), Value::String(symbol)) => {
            Ok(w.write_int(symbol_index(msg, field, e, &symbol)?)?)
        }

        (Schema::Bytes, Value::Bytes(v)) => Ok(w.write_bytes(&v)?),
        (Schema::Fixed(fixed), Value::Bytes(v)) => {
            if v.len() != fixed.size {
                return Err(CodecError::FixedSize {
                    field: msg.field_name(field),
                    expected: fixed.size,
                    actual: v.len(),
                });
            }
            Ok(w.write_fixed(&v)?)
        }

        (Schema::Record(rs), Value::Message(nested)) => {
            record::encode_record(ctx.descend()?, rs, &nested, w)
        }

        (schema, value) => Err(mismatch(msg.field_name(field), schema, value.kind())),
    }
}

/// Reads one value for `field` under `schema`. The kind is checked before
/// anything is consumed.
pub(crate) fn decode_scalar<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    schema: &Schema,
    r: &mut dyn PrimitiveRead,
) -> Result<Value<M>, CodecError> {
    let schema = ctx.resolve(schema)?;
    if let Schema::Union(u) = schema {
        return union::decode_branch(ctx, msg, field, u, r);
    }

    let kind = msg.shape(field).kind;
    if !kind_matches(schema, kind) {
        return Err(mismatch(msg.field_name(field), schema, kind));
    }

    Ok(match schema {
        s if is_int_encoded(s) => {
            let v = r.read_int()?;
            match kind {
                NativeKind::Uint32 => Value::U32(v as u32),
                NativeKind::Enum => Value::EnumNumber(v),
                _ => Value::I32(v),
            }
        }
        s if is_long_encoded(s) => {
            let v = r.read_long()?;
            match kind {
                NativeKind::Uint64 => Value::U64(v as u64),
                _ => Value::I64(v),
            }
        }
        Schema::Float => Value::F32(r.read_float()?),
        Schema::Double => Value::F64(r.read_double()?),
        Schema::Boolean => Value::Bool(r.read_bool()?),
        Schema::String | Schema::Uuid => {
            let v = r.read_string()?;
            match kind {
                NativeKind::Enum => Value::EnumNumber(enum_number(msg, field, v)?),
                _ => Value::String(v),
            }
        }
        Schema::Enum(e) => {
            let index = r.read_int()?;
            let symbol = usize::try_from(index)
                .ok()
                .and_then(|i| e.symbols.get(i))
                .ok_or_else(|| CodecError::InvalidEnumIndex {
                    field: msg.field_name(field),
                    index,
                    symbols: e.symbols.len(),
                })?;
            match kind {
                NativeKind::Enum => Value::EnumNumber(enum_number(msg, field, symbol.clone())?),
                _ => Value::String(symbol.clone()),
            }
        }
        Schema::Bytes => Value::Bytes(r.read_bytes()?),
        Schema::Fixed(fixed) => Value::Bytes(r.read_fixed(fixed.size)?),
        Schema::Record(rs) => {
            let mut nested = msg.new_message(field)?;
            record::decode_record(ctx.descend()?, rs, &mut nested, r)?;
            Value::Message(nested)
        }
        other => return Err(mismatch(msg.field_name(field), other, kind)),
    })
}

fn enum_symbol<M: MessageAccessor>(
    msg: &M,
    field: &M::Field,
    number: i32,
) -> Result<String, CodecError> {
    msg.enum_name(field, number)
        .ok_or_else(|| CodecError::UnknownEnumNumber { field: msg.field_name(field), number })
}

fn enum_number<M: MessageAccessor>(
    msg: &M,
    field: &M::Field,
    symbol: String,
) -> Result<i32, CodecError> {
    msg.enum_number(field, &symbol)
        .ok_or_else(|| CodecError::UnknownEnumSymbol { field: msg.field_name(field), symbol })
}

fn symbol_index<M: MessageAccessor>(
    msg: &M,
    field: &M::Field,
    schema: &EnumSchema,
    symbol: &str,
) -> Result<i32, CodecError> {
    schema
        .symbols
        .iter()
        .position(|s| s == symbol)
        .map(|i| i as i32)
        .ok_or_else(|| CodecError::UnknownEnumSymbol {
            field: msg.field_name(field),
            symbol: symbol.to_owned(),
        })
}
