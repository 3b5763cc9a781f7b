//! Union resolution: discriminant index plus the selected branch.
//!
//! Three positions are handled:
//! - a singular field whose schema is a union (the nullable `[null, T]` case
//!   among them),
//! - a oneof group mapped to one union field,
//! - a union in value position (list item, map value), where null cannot be
//!   stored.
//!
//! The index is always the 0-based position in declared branch order.

use apache_avro::schema::UnionSchema;
use apache_avro::Schema;
use avro_wire::{PrimitiveRead, PrimitiveWrite};

use crate::accessor::MessageAccessor;
use crate::container;
use crate::convert::{decode_scalar, encode_scalar};
use crate::schema::{branch_matches, kind_matches, kind_name, null_index, nullable_shape, Context};
use crate::value::{Cardinality, Value};
use crate::CodecError;

// ═══════════════════════════════════════════════════════════════
//  Branch matching
// ═══════════════════════════════════════════════════════════════

/// How well a member fits a union branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Fit {
    None,
    /// Same kind only (a message against a record of another name and shape).
    Kind,
    /// Same kind, and for records the name or the field set matches too.
    Exact,
}

fn fit<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    branch: &Schema,
) -> Result<Fit, CodecError> {
    let branch = ctx.resolve(branch)?;
    let kind = msg.shape(field).kind;
    if matches!(branch, Schema::Null) || !branch_matches(branch, kind) {
        return Ok(Fit::None);
    }
    let Schema::Record(record) = branch else {
        return Ok(Fit::Exact);
    };
    if msg.message_name(field).as_deref() == Some(record.name.name.as_str())
        || record.fields.iter().all(|f| msg.nested_has_member(field, &f.name))
    {
        Ok(Fit::Exact)
    } else {
        Ok(Fit::Kind)
    }
}

/// First branch that fits `field` exactly, else the first that fits by kind.
fn select_branch<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    union: &UnionSchema,
) -> Result<Option<usize>, CodecError> {
    let mut fallback = None;
    for (index, branch) in union.variants().iter().enumerate() {
        match fit(ctx, msg, field, branch)? {
            Fit::Exact => return Ok(Some(index)),
            Fit::Kind if fallback.is_none() => fallback = Some(index),
            _ => {}
        }
    }
    Ok(fallback)
}

/// First oneof member that fits `branch` exactly, else the first by kind.
fn select_member<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    members: Vec<M::Field>,
    branch: &Schema,
) -> Result<Option<M::Field>, CodecError> {
    let mut fallback = None;
    for member in members {
        match fit(ctx, msg, &member, branch)? {
            Fit::Exact => return Ok(Some(member)),
            Fit::Kind if fallback.is_none() => fallback = Some(member),
            _ => {}
        }
    }
    Ok(fallback)
}

fn read_index<'u>(
    field: impl FnOnce() -> String,
    union: &'u UnionSchema,
    r: &mut dyn PrimitiveRead,
) -> Result<(usize, &'u Schema), CodecError> {
    let index = r.read_long()?;
    usize::try_from(index)
        .ok()
        .and_then(|i| union.variants().get(i).map(|branch| (i, branch)))
        .ok_or_else(|| CodecError::InvalidUnionIndex {
            field: field(),
            index,
            branches: union.variants().len(),
        })
}

fn is_null(ctx: Context<'_>, branch: &Schema) -> Result<bool, CodecError> {
    Ok(matches!(ctx.resolve(branch)?, Schema::Null))
}

// ═══════════════════════════════════════════════════════════════
//  Singular fields
// ═══════════════════════════════════════════════════════════════

/// Writes a singular field whose schema is a union.
///
/// An unset presence-capable field takes the null branch. Otherwise the value
/// goes to the non-null branch of a `[null, T]` union, or to the best fitting
/// branch of a wider one.
pub(crate) fn encode_field<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    union: &UnionSchema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let shape = msg.shape(field);
    if shape.presence && !msg.has(field) {
        if let Some(index) = null_index(union) {
            return Ok(w.write_long(index as i64)?);
        }
    }

    let index = match nullable_shape(union) {
        Some((_, value_index))
            if kind_matches(ctx.resolve(&union.variants()[value_index])?, shape.kind) =>
        {
            Some(value_index)
        }
        _ => select_branch(ctx, msg, field, union)?,
    };
    let index = index.ok_or_else(|| CodecError::NoMatchingBranch {
        field: msg.field_name(field),
        native: shape.kind,
    })?;

    w.write_long(index as i64)?;
    let value = msg.get(field)?;
    encode_scalar(ctx.descend()?, msg, field, value, &union.variants()[index], w)
}

/// Reads a singular union field; the null branch clears it.
pub(crate) fn decode_field<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &mut M,
    field: &M::Field,
    union: &UnionSchema,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    let (_, branch) = read_index(|| msg.field_name(field), union, r)?;
    if is_null(ctx, branch)? {
        msg.clear(field);
        return Ok(());
    }
    let value = decode_scalar(ctx.descend()?, &*msg, field, branch, r)?;
    msg.set(field, value)
}

// ═══════════════════════════════════════════════════════════════
//  Collections
// ═══════════════════════════════════════════════════════════════

/// Writes a list or map field whose schema is a union: the array (or map)
/// branch is always taken, an empty collection included.
pub(crate) fn encode_collection<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    union: &UnionSchema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let cardinality = msg.shape(field).cardinality;
    let mut found = None;
    for (index, branch) in union.variants().iter().enumerate() {
        let branch = ctx.resolve(branch)?;
        let fits = match cardinality {
            Cardinality::List => matches!(branch, Schema::Array(_)),
            Cardinality::Map => matches!(branch, Schema::Map(_)),
            Cardinality::Single => false,
        };
        if fits {
            found = Some((index, branch));
            break;
        }
    }
    let Some((index, branch)) = found else {
        return Err(CodecError::NoMatchingBranch {
            field: msg.field_name(field),
            native: msg.shape(field).kind,
        });
    };
    w.write_long(index as i64)?;
    container::encode(ctx.descend()?, msg, field, branch, w)
}

/// Reads a list or map field whose schema is a union; the null branch
/// empties the collection.
pub(crate) fn decode_collection<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &mut M,
    field: &M::Field,
    union: &UnionSchema,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    let (_, branch) = read_index(|| msg.field_name(field), union, r)?;
    if is_null(ctx, branch)? {
        match msg.shape(field).cardinality {
            Cardinality::Map => msg.map_clear(field),
            _ => msg.list_clear(field),
        }
        return Ok(());
    }
    container::decode(ctx.descend()?, msg, field, branch, r)
}

// ═══════════════════════════════════════════════════════════════
//  Value position
// ═══════════════════════════════════════════════════════════════

/// Writes a union-typed list item or map value.
pub(crate) fn encode_branch<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    value: Value<M>,
    union: &UnionSchema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let index = select_branch(ctx, msg, field, union)?.ok_or_else(|| {
        CodecError::NoMatchingBranch { field: msg.field_name(field), native: value.kind() }
    })?;
    w.write_long(index as i64)?;
    encode_scalar(ctx.descend()?, msg, field, value, &union.variants()[index], w)
}

/// Reads a union-typed list item or map value. There is nowhere to put a
/// null, so the null branch is an error.
pub(crate) fn decode_branch<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    field: &M::Field,
    union: &UnionSchema,
    r: &mut dyn PrimitiveRead,
) -> Result<Value<M>, CodecError> {
    let (_, branch) = read_index(|| msg.field_name(field), union, r)?;
    if is_null(ctx, branch)? {
        return Err(CodecError::NullNotRepresentable(msg.field_name(field)));
    }
    decode_scalar(ctx.descend()?, msg, field, branch, r)
}

// ═══════════════════════════════════════════════════════════════
//  Oneof groups
// ═══════════════════════════════════════════════════════════════

fn expect_union<'s>(
    ctx: Context<'s>,
    group: String,
    schema: &'s Schema,
) -> Result<&'s UnionSchema, CodecError> {
    match ctx.resolve(schema)? {
        Schema::Union(union) => Ok(union),
        other => Err(CodecError::SchemaMismatch {
            field: group,
            expected: "union",
            actual: kind_name(other),
        }),
    }
}

/// Writes the selected oneof member as the matching union branch, or the
/// null branch when nothing is selected.
pub(crate) fn encode_oneof<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &M,
    oneof: &M::Oneof,
    schema: &Schema,
    w: &mut dyn PrimitiveWrite,
) -> Result<(), CodecError> {
    let union = expect_union(ctx, msg.oneof_name(oneof), schema)?;
    let Some(member) = msg.which_oneof(oneof) else {
        return match null_index(union) {
            Some(index) => Ok(w.write_long(index as i64)?),
            None => Err(CodecError::OneofNotSet(msg.oneof_name(oneof))),
        };
    };

    let index = select_branch(ctx, msg, &member, union)?.ok_or_else(|| {
        CodecError::NoMatchingBranch {
            field: msg.field_name(&member),
            native: msg.shape(&member).kind,
        }
    })?;
    w.write_long(index as i64)?;
    let value = msg.get(&member)?;
    encode_scalar(ctx.descend()?, msg, &member, value, &union.variants()[index], w)
}

/// Reads a oneof group. The null branch clears every member; any other
/// branch sets the first member that fits it.
pub(crate) fn decode_oneof<M: MessageAccessor>(
    ctx: Context<'_>,
    msg: &mut M,
    oneof: &M::Oneof,
    schema: &Schema,
    r: &mut dyn PrimitiveRead,
) -> Result<(), CodecError> {
    let union = expect_union(ctx, msg.oneof_name(oneof), schema)?;
    let (_, branch) = read_index(|| msg.oneof_name(oneof), union, r)?;
    if is_null(ctx, branch)? {
        for member in msg.oneof_fields(oneof) {
            msg.clear(&member);
        }
        return Ok(());
    }

    let members = msg.oneof_fields(oneof);
    let member = select_member(ctx, &*msg, members, branch)?.ok_or_else(|| {
        CodecError::NoMatchingMember { oneof: msg.oneof_name(oneof), branch: kind_name(branch) }
    })?;
    let value = decode_scalar(ctx.descend()?, &*msg, &member, branch, r)?;
    if let Some(current) = msg.which_oneof(oneof) {
        if current != member {
            msg.clear(&current);
        }
    }
    msg.set(&member, value)
}
