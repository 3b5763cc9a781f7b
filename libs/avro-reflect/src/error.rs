use avro_wire::{BoxError, WireError};

use crate::value::NativeKind;

/// Category of a codec error. Lets callers decide what to do with a failed
/// record without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema and runtime value disagree on shape. Never retryable.
    Shape,
    /// A required field has no value and no usable default.
    MissingData,
    /// Returned by a user-supplied marshaler.
    Custom,
    /// The primitive stream failed (truncated input, full buffer, bad bytes).
    Stream,
    /// Schema files, descriptor sets, registry setup.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Shape => f.write_str("shape"),
            ErrorKind::MissingData => f.write_str("missing-data"),
            ErrorKind::Custom => f.write_str("custom"),
            ErrorKind::Stream => f.write_str("stream"),
            ErrorKind::Config => f.write_str("config"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("field '{field}': cannot convert {native} to avro {schema}")]
    Conversion { field: String, schema: String, native: NativeKind },

    #[error("field '{field}': expected {expected} schema, got {actual}")]
    SchemaMismatch { field: String, expected: &'static str, actual: String },

    #[error("field '{field}': invalid union index {index} ({branches} branches)")]
    InvalidUnionIndex { field: String, index: i64, branches: usize },

    #[error("field '{field}': no union branch matches {native}")]
    NoMatchingBranch { field: String, native: NativeKind },

    #[error("oneof '{oneof}': no member matches union branch {branch}")]
    NoMatchingMember { oneof: String, branch: String },

    #[error("oneof '{0}' is not set but union is not nullable")]
    OneofNotSet(String),

    #[error("field '{0}': null is not representable here")]
    NullNotRepresentable(String),

    #[error("field '{field}': unknown enum symbol '{symbol}'")]
    UnknownEnumSymbol { field: String, symbol: String },

    #[error("field '{field}': unknown enum number {number}")]
    UnknownEnumNumber { field: String, number: i32 },

    #[error("field '{field}': enum index {index} out of range ({symbols} symbols)")]
    InvalidEnumIndex { field: String, index: i32, symbols: usize },

    #[error("field '{field}': fixed size is {expected}, value has {actual} bytes")]
    FixedSize { field: String, expected: usize, actual: usize },

    #[error("field '{field}': map key must be a string")]
    NonStringMapKey { field: String },

    #[error("invalid block count {0}")]
    InvalidBlockCount(i64),

    #[error("{count} items exceed the limit of {limit}")]
    TooManyItems { count: u64, limit: usize },

    #[error("unresolved schema reference '{0}'")]
    UnresolvedRef(String),

    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("required field '{field}' not found in {message}")]
    MissingField { field: String, message: String },

    #[error("field '{field}' not found in {message} and its default is not representable")]
    NonRepresentableField { field: String, message: String },

    #[error("cannot encode nil message")]
    NilMessage,

    #[error("{0} does not expose a reflective message")]
    NotAMessage(&'static str),

    #[error("{0} does not implement custom marshaling")]
    NotAMarshaler(&'static str),

    #[error("no codec for {type_name} with {schema} schema")]
    NoCodec { type_name: &'static str, schema: String },

    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    #[error("unknown message type '{0}'")]
    UnknownMessage(String),

    #[error("accessor: {0}")]
    Accessor(String),

    #[error("transcode: {0}")]
    Transcode(#[from] prost::DecodeError),

    #[error(transparent)]
    Marshaler(BoxError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("schema: {0}")]
    Schema(#[from] apache_avro::Error),

    #[error("descriptor: {0}")]
    Descriptor(#[from] prost_reflect::DescriptorError),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::MissingField { .. } | CodecError::NonRepresentableField { .. } => {
                ErrorKind::MissingData
            }
            CodecError::Marshaler(_) => ErrorKind::Custom,
            CodecError::Wire(_) | CodecError::TooManyItems { .. } => ErrorKind::Stream,
            CodecError::Schema(_)
            | CodecError::Descriptor(_)
            | CodecError::Config(_)
            | CodecError::Io(_)
            | CodecError::UnknownSchema(_)
            | CodecError::UnknownMessage(_) => ErrorKind::Config,
            _ => ErrorKind::Shape,
        }
    }
}
