use std::fmt;

/// Native kind of an accessor member, independent of the concrete runtime
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Bool,
    /// int32, sint32, sfixed32
    Int32,
    /// uint32, fixed32
    Uint32,
    /// int64, sint64, sfixed64
    Int64,
    /// uint64, fixed64
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Message,
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeKind::Bool => "bool",
            NativeKind::Int32 => "int32",
            NativeKind::Uint32 => "uint32",
            NativeKind::Int64 => "int64",
            NativeKind::Uint64 => "uint64",
            NativeKind::Float => "float",
            NativeKind::Double => "double",
            NativeKind::String => "string",
            NativeKind::Bytes => "bytes",
            NativeKind::Enum => "enum",
            NativeKind::Message => "message",
        };
        f.write_str(name)
    }
}

/// How many values a member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    List,
    /// String-keyed map; the member's kind describes the values.
    Map,
}

/// Static description of one accessor member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub kind: NativeKind,
    pub cardinality: Cardinality,
    /// Whether "unset" is distinguishable from the zero value.
    pub presence: bool,
}

/// A single value moving between the engine and an accessor.
///
/// `M` is the accessor's own message type, so nested records stay in their
/// native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<M> {
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    EnumNumber(i32),
    Message(M),
}

impl<M> Value<M> {
    pub fn kind(&self) -> NativeKind {
        match self {
            Value::Bool(_) => NativeKind::Bool,
            Value::I32(_) => NativeKind::Int32,
            Value::U32(_) => NativeKind::Uint32,
            Value::I64(_) => NativeKind::Int64,
            Value::U64(_) => NativeKind::Uint64,
            Value::F32(_) => NativeKind::Float,
            Value::F64(_) => NativeKind::Double,
            Value::String(_) => NativeKind::String,
            Value::Bytes(_) => NativeKind::Bytes,
            Value::EnumNumber(_) => NativeKind::Enum,
            Value::Message(_) => NativeKind::Message,
        }
    }
}
