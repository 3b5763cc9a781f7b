//! Record traversal: fields in declared schema order, which is the wire order.

use apache_avro::schema::{RecordField, RecordSchema};
use apache_avro::Schema;
use avro_wire::{PrimitiveRead, PrimitiveWrite};

use crate::accessor::{Member, MessageAccessor};
use crate::convert::{decode_scalar, encode_scalar};
use crate::schema::{null_index, Context};
use crate::value::Cardinality;
use crate::{container, skip, union, CodecError};

/// Writes every schema field of `record` from `msg`, stopping at the first error.
pub(crate) fn encode_record<M: MessageAccessor>(
    ctx: Context<'_>,
    record: &RecordSchema,
    msg: &M,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    for field in &record.fields {
        match msg.lookup(&field.name) {
            Some(Member::Oneof(oneof)) => union::encode_oneof(ctx, msg, &oneof, &field.schema, w)?,
            Some(Member::Field(member)) => encode_member(ctx, msg, &member, &field.schema, w)?,
            None => encode_absent(ctx, msg, field, w)?,
        }
    }
    Ok(())
}

/// Reads every schema field of `record` into `msg`. Fields the message does
/// not have are skipped; present ones are overwritten.
pub(crate) fn decode_record<M: MessageAccessor>(
    ctx: Context<'_>,
    record: &RecordSchema,
    msg: &mut M,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    for field in &record.fields {
        match msg.lookup(&field.name) {
            Some(Member::Oneof(oneof)) => union::decode_oneof(ctx, msg, &oneof, &field.schema, r)?,
            Some(Member::Field(member)) => decode_member(ctx, msg, &member, &field.schema, r)?,
            None => {
                tracing::trace!(
                    field = %field.name,
                    message = %msg.type_name(),
                    "skipping field absent from target"
                );
                skip::skip(ctx, &field.schema, r)?;
            }
        }
    }
    Ok(())
}

fn encode_member<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    member: &M::Field,
    schema: &Schema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let schema = ctx.resolve(schema)?;
    match (msg.shape(member).cardinality, schema) {
        (Cardinality::Single, Schema::Union(u)) => union::encode_field(ctx, msg, member, u, w),
        (Cardinality::Single, schema) => {
            let value = msg.get(member)?;
            encode_scalar(ctx, msg, member, value, schema, w)
        }
        (_, Schema::Union(u)) => union::encode_collection(ctx, msg, member, u, w),
        (_, schema) => container::encode(ctx, msg, member, schema, w),
    }
}

fn decode_member<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &mut M,
    member: &M::Field,
    schema: &Schema,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    let schema = ctx.resolve(schema)?;
    match (msg.shape(member).cardinality, schema) {
        (Cardinality::Single, Schema::Union(u)) => union::decode_field(ctx, msg, member, u, r),
        (Cardinality::Single, schema) => {
            let value = decode_scalar(ctx, &*msg, member, schema, r)?;
            msg.set(member, value)
        }
        (_, Schema::Union(u)) => union::decode_collection(ctx, msg, member, u, r),
        (_, schema) => container::decode(ctx, msg, member, schema, r),
    }
}

/// A schema field with no counterpart on the message. Only a `null` default
/// on a union with a null branch can be written; anything else is an error.
fn encode_absent<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &RecordField,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let Some(default) = &field.default else {
        return Err(CodecError::MissingField {
            field: field.name.clone(),
            message: msg.type_name(),
        });
    };
    if default.is_null() {
        if let Schema::Union(u) = ctx.resolve(&field.schema)? {
            if let Some(index) = null_index(u) {
                return Ok(w.write_long(index as i64)?);
            }
        }
    }
    Err(CodecError::NonRepresentableField { field: field.name.clone(), message: msg.type_name() })
}
