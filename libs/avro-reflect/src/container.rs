//! Array and map block framing.
//!
//! Encoding writes at most one non-empty block, then the zero terminator.
//! Decoding accepts any number of blocks, including negative-count blocks
//! whose byte size prefix is read and ignored. Item counts are checked
//! against [`ItemBudget`] before any item is read.

use apache_avro::Schema;
use avro_wire::{PrimitiveRead, PrimitiveWrite, WireError};

use crate::accessor::MessageAccessor;
use crate::convert::{decode_scalar, encode_scalar};
use crate::schema::{is_zero_width, kind_name, Context};
use crate::value::Cardinality;
use crate::CodecError;

/// Writes a list field under an array schema or a map field under a map schema.
pub(crate) fn encode<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    schema: &Schema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let cardinality = msg.shape(field).cardinality;
    match (cardinality, ctx.resolve(schema)?) {
        (Cardinality::List, Schema::Array(array)) => {
            let len = msg.list_len(field);
            if len > 0 {
                w.write_long(len as i64)?;
                for index in 0..len {
                    let item = msg.list_get(field, index)?;
                    encode_scalar(ctx, msg, field, item, &array.items, w)?;
                }
            }
            Ok(w.write_long(0)?)
        }
        (Cardinality::Map, Schema::Map(map)) => {
            let entries = msg.map_entries(field)?;
            if !entries.is_empty() {
                w.write_long(entries.len() as i64)?;
                for (key, value) in entries {
                    w.write_string(&key)?;
                    encode_scalar(ctx, msg, field, value, &map.types, w)?;
                }
            }
            Ok(w.write_long(0)?)
        }
        (cardinality, other) => Err(mismatch(msg.field_name(field), cardinality, other)),
    }
}

/// Replaces the contents of a list or map field with the decoded items.
pub(crate) fn decode<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &mut M,
    field: &M::Field,
    schema: &Schema,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    let cardinality = msg.shape(field).cardinality;
    match (cardinality, ctx.resolve(schema)?) {
        (Cardinality::List, Schema::Array(array)) => {
            msg.list_clear(field);
            let budget = ItemBudget::new(ctx, is_zero_width(ctx, &array.items));
            read_blocks(r, budget, |r| {
                let item = decode_scalar(ctx, &*msg, field, &array.items, r)?;
                msg.list_push(field, item)
            })
        }
        (Cardinality::Map, Schema::Map(map)) => {
            msg.map_clear(field);
            read_blocks(r, ItemBudget::new(ctx, false), |r| {
                let key = r.read_string()?;
                let value = decode_scalar(ctx, &*msg, field, &map.types, r)?;
                msg.map_insert(field, key, value)
            })
        }
        (cardinality, other) => Err(mismatch(msg.field_name(field), cardinality, other)),
    }
}

fn mismatch(field: String, cardinality: Cardinality, schema: &Schema) -> CodecError {
    let expected = match cardinality {
        Cardinality::Map => "map",
        Cardinality::List => "array",
        Cardinality::Single => "non-container",
    };
    CodecError::SchemaMismatch { field, expected, actual: kind_name(schema) }
}

/// Item count of the next block; 0 ends the sequence.
///
/// A negative count is followed by the block's byte size, which is consumed
/// here and otherwise unused.
fn block_count(r: &mut dyn PrimitiveRead) -> Result<u64, CodecError> {
    let count = r.read_long()?;
    if count >= 0 {
        return Ok(count as u64);
    }
    r.read_long()?;
    count
        .checked_neg()
        .map(|n| n as u64)
        .ok_or(CodecError::InvalidBlockCount(count))
}

/// Item accounting for one array or map value.
///
/// The running total may not pass the context's item cap. Items that take
/// at least one byte on the wire are also limited by what the input still
/// holds, when the source knows that.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ItemBudget {
    total: u64,
    limit: usize,
    zero_width: bool,
}

impl ItemBudget {
    pub(crate) fn new(ctx: Context<'_>, zero_width: bool) -> Self {
        Self { total: 0, limit: ctx.max_items(), zero_width }
    }

    pub(crate) fn take(&mut self, count: u64, r: &dyn PrimitiveRead) -> Result<(), CodecError> {
        self.total = self.total.saturating_add(count);
        if self.total > self.limit as u64 {
            return Err(CodecError::TooManyItems { count: self.total, limit: self.limit });
        }
        if self.zero_width {
            return Ok(());
        }
        match r.remaining_bytes() {
            Some(remaining) if count > remaining as u64 => Err(WireError::EndOfInput {
                needed: usize::try_from(count).unwrap_or(usize::MAX),
                remaining,
            }
            .into()),
            _ => Ok(()),
        }
    }
}

/// Calls `item` once per element until the terminating zero block.
pub(crate) fn read_blocks(
    r: &mut dyn PrimitiveRead,
    mut budget: ItemBudget,
    mut item: impl FnMut(&mut dyn PrimitiveRead) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    loop {
        let count = block_count(r)?;
        if count == 0 {
            return Ok(());
        }
        budget.take(count, &*r)?;
        for _ in 0..count {
            item(r)?;
        }
    }
}
