use apache_avro::Schema;
use avro_wire::{PrimitiveRead, WireError};

use crate::container::ItemBudget;
use crate::schema::{is_zero_width, Context};
use crate::CodecError;

/// Advances `r` past one value of `schema` without interpreting it.
pub(crate) fn skip(
    ctx: Context<'_>,
    schema: &Schema,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    match schema {
        Schema::Null => Ok(()),
        Schema::Boolean => Ok(r.skip(1)?),
        Schema::Int
        | Schema::Long
        | Schema::Enum(_)
        | Schema::Date
        | Schema::TimeMillis
        | Schema::TimeMicros
        | Schema::TimestampMillis
        | Schema::TimestampMicros
        | Schema::TimestampNanos
        | Schema::LocalTimestampMillis
        | Schema::LocalTimestampMicros
        | Schema::LocalTimestampNanos => {
            r.read_long()?;
            Ok(())
        }
        Schema::Float => Ok(r.skip(4)?),
        Schema::Double => Ok(r.skip(8)?),
        Schema::Bytes | Schema::String | Schema::Uuid | Schema::BigDecimal => {
            let len = length(r)?;
            Ok(r.skip(len)?)
        }
        Schema::Fixed(fixed) => Ok(r.skip(fixed.size)?),
        Schema::Duration => Ok(r.skip(12)?),
        Schema::Decimal(decimal) => skip(ctx, &decimal.inner, r),
        Schema::Array(array) => {
            let budget = ItemBudget::new(ctx, is_zero_width(ctx, &array.items));
            skip_blocks(r, budget, |r| skip(ctx, &array.items, r))
        }
        Schema::Map(map) => skip_blocks(r, ItemBudget::new(ctx, false), |r| {
            let len = length(r)?;
            r.skip(len)?;
            skip(ctx, &map.types, r)
        }),
        Schema::Union(union) => {
            let index = r.read_long()?;
            let branch = usize::try_from(index)
                .ok()
                .and_then(|i| union.variants().get(i))
                .ok_or_else(|| CodecError::InvalidUnionIndex {
                    field: "<skipped>".to_owned(),
                    index,
                    branches: union.variants().len(),
                })?;
            skip(ctx.descend()?, branch, r)
        }
        Schema::Record(record) => {
            let ctx = ctx.descend()?;
            for field in &record.fields {
                skip(ctx, &field.schema, r)?;
            }
            Ok(())
        }
        Schema::Ref { .. } => skip(ctx, ctx.resolve(schema)?, r),
    }
}

fn length(r: &mut dyn PrimitiveRead) -> Result<usize, CodecError> {
    let len = r.read_long()?;
    Ok(usize::try_from(len).map_err(|_| WireError::NegativeLength(len))?)
}

/// Like [`read_blocks`](crate::container::read_blocks), but a block that
/// carries its byte size is jumped over in one step.
fn skip_blocks(
    r: &mut dyn PrimitiveRead,
    mut budget: ItemBudget,
    mut item: impl FnMut(&mut dyn PrimitiveRead) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    loop {
        let count = r.read_long()?;
        if count == 0 {
            return Ok(());
        }
        if count < 0 {
            let size = length(r)?;
            r.skip(size)?;
            continue;
        }
        budget.take(count as u64, &*r)?;
        for _ in 0..count {
            item(r)?;
        }
    }
}
