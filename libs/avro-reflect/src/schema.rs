use std::collections::HashMap;

use apache_avro::schema::{SchemaKind, UnionSchema};
use apache_avro::Schema;
use avro_wire::DEFAULT_MAX_ALLOCATION_BYTES;

use crate::value::NativeKind;
use crate::CodecError;

// ═══════════════════════════════════════════════════════════════
//  Named types
// ═══════════════════════════════════════════════════════════════

/// Named types (records, enums, fixed) reachable from a root schema, keyed
/// by full name, so `Schema::Ref` nodes can be followed.
#[derive(Debug, Default)]
pub(crate) struct Names {
    types: HashMap<String, Schema>,
}

impl Names {
    pub(crate) fn collect(root: &Schema) -> Self {
        let mut names = Names::default();
        names.visit(root);
        names
    }

    fn visit(&mut self, schema: &Schema) {
        match schema {
            Schema::Record(record) => {
                let key = record.name.fullname(None);
                if self.types.contains_key(&key) {
                    return;
                }
                self.types.insert(key, schema.clone());
                for field in &record.fields {
                    self.visit(&field.schema);
                }
            }
            Schema::Enum(e) => {
                self.types.insert(e.name.fullname(None), schema.clone());
            }
            Schema::Fixed(f) => {
                self.types.insert(f.name.fullname(None), schema.clone());
            }
            Schema::Array(array) => self.visit(&array.items),
            Schema::Map(map) => self.visit(&map.types),
            Schema::Union(union) => {
                for variant in union.variants() {
                    self.visit(variant);
                }
            }
            Schema::Decimal(decimal) => self.visit(&decimal.inner),
            _ => {}
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.types.len()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Traversal context
// ═══════════════════════════════════════════════════════════════

/// Read-only state threaded through one encode/decode/skip call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    names: &'a Names,
    depth: usize,
    max_depth: usize,
    max_items: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn new(names: &'a Names, max_depth: usize) -> Self {
        Self { names, depth: 0, max_depth, max_items: DEFAULT_MAX_ALLOCATION_BYTES }
    }

    /// Caps the total item count of any one array or map.
    pub(crate) fn with_max_items(self, max_items: usize) -> Self {
        Self { max_items, ..self }
    }

    pub(crate) fn max_items(&self) -> usize {
        self.max_items
    }

    /// Follows `Schema::Ref` to the named definition.
    pub(crate) fn resolve<'b>(&self, schema: &'b Schema) -> Result<&'b Schema, CodecError>
    where
        'a: 'b,
    {
        match schema {
            Schema::Ref { name } => {
                let key = name.fullname(None);
                self.names.types.get(&key).ok_or(CodecError::UnresolvedRef(key))
            }
            other => Ok(other),
        }
    }

    /// Context for one level of record/union nesting.
    pub(crate) fn descend(self) -> Result<Self, CodecError> {
        if self.depth >= self.max_depth {
            return Err(CodecError::DepthExceeded(self.max_depth));
        }
        Ok(Self { depth: self.depth + 1, ..self })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════

pub(crate) fn kind_name(schema: &Schema) -> String {
    match schema {
        Schema::Record(record) => format!("record {}", record.name.name),
        Schema::Ref { name } => format!("ref {}", name.name),
        other => format!("{:?}", SchemaKind::from(other)).to_lowercase(),
    }
}

/// Index of the `null` branch, if the union has one.
pub(crate) fn null_index(union: &UnionSchema) -> Option<usize> {
    union.variants().iter().position(|v| matches!(v, Schema::Null))
}

/// `[null, T]` or `[T, null]`: returns `(null_index, value_index)`.
pub(crate) fn nullable_shape(union: &UnionSchema) -> Option<(usize, usize)> {
    match union.variants() {
        [Schema::Null, other] if !matches!(other, Schema::Null) => Some((0, 1)),
        [other, Schema::Null] if !matches!(other, Schema::Null) => Some((1, 0)),
        _ => None,
    }
}

/// Schemas written as an Avro `int`.
pub(crate) fn is_int_encoded(schema: &Schema) -> bool {
    matches!(schema, Schema::Int | Schema::Date | Schema::TimeMillis)
}

/// Schemas written as an Avro `long`.
pub(crate) fn is_long_encoded(schema: &Schema) -> bool {
    matches!(
        schema,
        Schema::Long
            | Schema::TimeMicros
            | Schema::TimestampMillis
            | Schema::TimestampMicros
            | Schema::TimestampNanos
            | Schema::LocalTimestampMillis
            | Schema::LocalTimestampMicros
            | Schema::LocalTimestampNanos
    )
}

/// Whether a value of native `kind` can be written under `schema` (already
/// resolved). Record branches only check the kind here; name and shape
/// matching for oneof members lives in the union resolver.
pub(crate) fn kind_matches(schema: &Schema, kind: NativeKind) -> bool {
    use NativeKind as K;
    match schema {
        s if is_int_encoded(s) => matches!(kind, K::Int32 | K::Uint32 | K::Enum),
        s if is_long_encoded(s) => matches!(kind, K::Int64 | K::Uint64),
        Schema::Float => kind == K::Float,
        Schema::Double => kind == K::Double,
        Schema::Boolean => kind == K::Bool,
        Schema::String | Schema::Uuid => matches!(kind, K::String | K::Enum),
        Schema::Enum(_) => matches!(kind, K::Enum | K::String),
        Schema::Bytes | Schema::Fixed(_) => kind == K::Bytes,
        Schema::Record(_) => kind == K::Message,
        _ => false,
    }
}

/// [`kind_matches`] narrowed for choosing among union branches. Enum
/// branches take enum members only and fixed branches take nothing, so a
/// string or bytes member always reaches its own branch when one exists.
pub(crate) fn branch_matches(schema: &Schema, kind: NativeKind) -> bool {
    match schema {
        Schema::Enum(_) => kind == NativeKind::Enum,
        Schema::Fixed(_) => false,
        other => kind_matches(other, kind),
    }
}

/// Whether a value of `schema` may encode to no bytes at all (null, records
/// of such fields, zero-size fixed).
pub(crate) fn is_zero_width(ctx: Context<'_>, schema: &Schema) -> bool {
    match ctx.resolve(schema) {
        Ok(Schema::Null) => true,
        Ok(Schema::Fixed(fixed)) => fixed.size == 0,
        Ok(Schema::Record(record)) => match ctx.descend() {
            Ok(inner) => record.fields.iter().all(|f| is_zero_width(inner, &f.schema)),
            Err(_) => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKED: &str = r#"{
        "type": "record",
        "name": "Node",
        "namespace": "test",
        "fields": [
            {"name": "value", "type": "int"},
            {"name": "next", "type": ["null", "Node"]},
            {"name": "tag", "type": {"type": "enum", "name": "Tag", "symbols": ["A", "B"]}},
            {"name": "digest", "type": {"type": "fixed", "name": "Digest", "size": 4}}
        ]
    }"#;

    #[test]
    fn test_collects_and_resolves_named_types() {
        let schema = Schema::parse_str(LINKED).unwrap();
        let names = Names::collect(&schema);
        assert_eq!(names.len(), 3);

        let Schema::Record(record) = &schema else { panic!("expected record") };
        let Schema::Union(next) = &record.fields[1].schema else { panic!("expected union") };
        let ctx = Context::new(&names, 8);
        let resolved = ctx.resolve(&next.variants()[1]).unwrap();
        assert!(matches!(resolved, Schema::Record(r) if r.name.name == "Node"));
    }

    #[test]
    fn test_depth_limit() {
        let names = Names::default();
        let ctx = Context::new(&names, 1);
        let nested = ctx.descend().unwrap();
        assert!(matches!(nested.descend(), Err(CodecError::DepthExceeded(1))));
    }

    #[test]
    fn test_nullable_shape() {
        let union = |json: &str| match Schema::parse_str(json).unwrap() {
            Schema::Union(u) => u,
            other => panic!("expected union, got {other:?}"),
        };
        assert_eq!(nullable_shape(&union(r#"["null", "string"]"#)), Some((0, 1)));
        assert_eq!(nullable_shape(&union(r#"["string", "null"]"#)), Some((1, 0)));
        assert_eq!(nullable_shape(&union(r#"["null", "string", "int"]"#)), None);
        assert_eq!(null_index(&union(r#"["string", "int", "null"]"#)), Some(2));
        assert_eq!(null_index(&union(r#"["string", "int"]"#)), None);
    }

    #[test]
    fn test_kind_matches_table() {
        assert!(kind_matches(&Schema::Int, NativeKind::Uint32));
        assert!(kind_matches(&Schema::Int, NativeKind::Enum));
        assert!(!kind_matches(&Schema::Int, NativeKind::Int64));
        assert!(kind_matches(&Schema::Long, NativeKind::Uint64));
        assert!(!kind_matches(&Schema::Float, NativeKind::Double));
        assert!(!kind_matches(&Schema::Double, NativeKind::Float));
        assert!(kind_matches(&Schema::String, NativeKind::Enum));
        assert!(!kind_matches(&Schema::Bytes, NativeKind::String));
    }

    #[test]
    fn test_branch_matches_is_narrower() {
        let json = r#"{"type": "enum", "name": "Kind", "symbols": ["A"]}"#;
        let kind = Schema::parse_str(json).unwrap();
        assert!(kind_matches(&kind, NativeKind::String));
        assert!(!branch_matches(&kind, NativeKind::String));
        assert!(branch_matches(&kind, NativeKind::Enum));

        let fixed = Schema::parse_str(r#"{"type": "fixed", "name": "F", "size": 2}"#).unwrap();
        assert!(!branch_matches(&fixed, NativeKind::Bytes));
        assert!(branch_matches(&Schema::Bytes, NativeKind::Bytes));
        assert!(branch_matches(&Schema::String, NativeKind::Enum));
    }

    #[test]
    fn test_zero_width() {
        let names = Names::default();
        let ctx = Context::new(&names, 8);
        let empty = Schema::parse_str(
            r#"{"type": "record", "name": "Unit", "fields": [{"name": "n", "type": "null"}]}"#,
        )
        .unwrap();
        assert!(is_zero_width(ctx, &Schema::Null));
        assert!(is_zero_width(ctx, &empty));
        assert!(!is_zero_width(ctx, &Schema::Boolean));
        assert!(!is_zero_width(ctx, &Schema::parse_str(LINKED).unwrap()));
    }
}
