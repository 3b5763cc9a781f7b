//! Avro primitive I/O and the custom marshaling interface.
//!
//! This crate is all an external type needs in order to take over its own
//! Avro encoding: implement [`RecordMarshaler`] / [`RecordUnmarshaler`] against
//! [`PrimitiveWrite`] / [`PrimitiveRead`], or [`TextMarshaler`] /
//! [`TextUnmarshaler`] for a value carried as a string.

mod error;
mod marshal;
mod reader;
pub mod varint;
mod writer;

pub use error::WireError;
pub use marshal::{BoxError, RecordMarshaler, RecordUnmarshaler, TextMarshaler, TextUnmarshaler};
pub use reader::{PrimitiveRead, Reader, DEFAULT_MAX_ALLOCATION_BYTES};
pub use writer::{PrimitiveWrite, Writer};
