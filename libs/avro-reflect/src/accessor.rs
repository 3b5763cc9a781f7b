use crate::value::{FieldShape, Value};
use crate::CodecError;

/// What a schema field name resolves to on a message.
#[derive(Debug, Clone)]
pub enum Member<F, O> {
    /// An ordinary field.
    Field(F),
    /// A group of mutually exclusive fields, mapped to one union field.
    Oneof(O),
}

/// Reflective access to a structured message.
///
/// The engine never sees the concrete message type: every read and write of
/// a record goes through this trait, addressed by the handles it hands out.
/// An implementation is a thin adapter over one family of runtime values.
pub trait MessageAccessor: Sized {
    /// Handle to a field. Cheap to clone.
    type Field: Clone + PartialEq;
    /// Handle to a oneof group.
    type Oneof: Clone;

    /// Fully qualified type name, for error messages.
    fn type_name(&self) -> String;

    /// Resolves a schema field name. A oneof group with that name takes
    /// precedence over a field with that name.
    fn lookup(&self, name: &str) -> Option<Member<Self::Field, Self::Oneof>>;

    fn field_name(&self, field: &Self::Field) -> String;

    fn shape(&self, field: &Self::Field) -> FieldShape;

    fn has(&self, field: &Self::Field) -> bool;

    /// Reads a singular field (the default value when unset).
    fn get(&self, field: &Self::Field) -> Result<Value<Self>, CodecError>;

    fn set(&mut self, field: &Self::Field, value: Value<Self>) -> Result<(), CodecError>;

    fn clear(&mut self, field: &Self::Field);

    /// Fresh, empty message of the type held by `field` (or by its list
    /// items or map values).
    fn new_message(&self, field: &Self::Field) -> Result<Self, CodecError>;

    /// Short (unqualified) name of the message type held by `field`.
    fn message_name(&self, field: &Self::Field) -> Option<String>;

    /// Whether the message type held by `field` has a member that `name`
    /// would resolve to through [`lookup`](Self::lookup).
    fn nested_has_member(&self, field: &Self::Field, name: &str) -> bool;

    // ---- lists ----

    fn list_len(&self, field: &Self::Field) -> usize;

    fn list_get(&self, field: &Self::Field, index: usize) -> Result<Value<Self>, CodecError>;

    fn list_clear(&mut self, field: &Self::Field);

    fn list_push(&mut self, field: &Self::Field, value: Value<Self>) -> Result<(), CodecError>;

    // ---- maps ----

    /// All entries, ordered by key.
    fn map_entries(&self, field: &Self::Field) -> Result<Vec<(String, Value<Self>)>, CodecError>;

    fn map_clear(&mut self, field: &Self::Field);

    fn map_insert(
        &mut self,
        field: &Self::Field,
        key: String,
        value: Value<Self>,
    ) -> Result<(), CodecError>;

    // ---- oneofs ----

    fn oneof_name(&self, oneof: &Self::Oneof) -> String;

    /// The member currently set, if any.
    fn which_oneof(&self, oneof: &Self::Oneof) -> Option<Self::Field>;

    /// Members in declaration order.
    fn oneof_fields(&self, oneof: &Self::Oneof) -> Vec<Self::Field>;

    // ---- enums ----

    fn enum_name(&self, field: &Self::Field, number: i32) -> Option<String>;

    fn enum_number(&self, field: &Self::Field, name: &str) -> Option<i32>;
}
