use crate::{PrimitiveRead, PrimitiveWrite};

/// Opaque error returned by user marshaling code.
///
/// [`WireError`](crate::WireError) converts into it, so `?` works on every
/// primitive call inside an implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Implemented by types that encode themselves as an Avro record.
///
/// The implementation owns the whole record body: it must write exactly the
/// bytes the declared record schema implies, in field order, including union
/// indexes and block framing for any nested arrays or maps.
pub trait RecordMarshaler {
    fn marshal_avro(&self, w: &mut dyn PrimitiveWrite) -> Result<(), BoxError>;
}

/// Implemented by types that decode themselves from an Avro record body.
pub trait RecordUnmarshaler {
    fn unmarshal_avro(&mut self, r: &mut dyn PrimitiveRead) -> Result<(), BoxError>;
}

/// Implemented by types that encode themselves as text, for `string` and
/// `bytes` schemas. The result is written length-prefixed and is not
/// checked for UTF-8.
pub trait TextMarshaler {
    fn marshal_text(&self) -> Result<Vec<u8>, BoxError>;
}

/// Implemented by types that decode themselves from the raw bytes of a
/// `string` or `bytes` value.
pub trait TextUnmarshaler {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError>;
}
