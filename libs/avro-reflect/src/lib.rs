//! Schema-driven Avro binary codec over reflective messages.
//!
//! An Avro record schema is walked field by field against a runtime value
//! seen through [`MessageAccessor`]; a type may instead take over its own
//! encoding through [`RecordMarshaler`] / [`RecordUnmarshaler`], or carry
//! itself as text through [`TextMarshaler`] / [`TextUnmarshaler`]. The
//! [`CodecSelector`] picks a strategy per (schema, type, direction) and
//! caches the binding.
//!
//! ```ignore
//! let registry = SchemaRegistry::from_config(&config)?;
//! let mut account = registry.new_message("bank.Account")?;
//! let bytes = registry.marshal("bank.Account", &account)?;
//! registry.unmarshal("bank.Account", &bytes, &mut account)?;
//! ```

mod accessor;
mod container;
mod convert;
mod dynamic;
mod error;
mod record;
mod registry;
mod schema;
mod selector;
mod skip;
pub mod subject;
mod union;
mod value;

pub use accessor::{Member, MessageAccessor};
pub use error::{CodecError, ErrorKind};
pub use registry::{Limits, RegistryConfig, SchemaRegistry};
pub use selector::{CodecSelector, Decoder, Encoder, StrategyKind};
pub use subject::{AvroSubject, Capabilities, MessageFn, MessageMutFn};
pub use value::{Cardinality, FieldShape, NativeKind, Value};

pub use avro_wire::{
    BoxError, PrimitiveRead, PrimitiveWrite, Reader, RecordMarshaler, RecordUnmarshaler,
    TextMarshaler, TextUnmarshaler, WireError, Writer,
};
