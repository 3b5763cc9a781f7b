//! [`MessageAccessor`] over `prost_reflect::DynamicMessage`.

use prost_reflect::{
    DynamicMessage, FieldDescriptor, Kind, MapKey, OneofDescriptor, ReflectMessage,
    Value as ReflectValue,
};

use crate::accessor::{Member, MessageAccessor};
use crate::value::{Cardinality, FieldShape, NativeKind, Value};
use crate::CodecError;

impl MessageAccessor for DynamicMessage {
    type Field = FieldDescriptor;
    type Oneof = OneofDescriptor;

    fn type_name(&self) -> String {
        self.descriptor().full_name().to_owned()
    }

    fn lookup(&self, name: &str) -> Option<Member<FieldDescriptor, OneofDescriptor>> {
        let descriptor = self.descriptor();
        // Synthetic oneofs wrap proto3 `optional` fields; those stay plain fields.
        if let Some(oneof) = descriptor.oneofs().find(|o| !o.is_synthetic() && o.name() == name) {
            return Some(Member::Oneof(oneof));
        }
        descriptor.get_field_by_name(name).map(Member::Field)
    }

    fn field_name(&self, field: &FieldDescriptor) -> String {
        field.name().to_owned()
    }

    fn shape(&self, field: &FieldDescriptor) -> FieldShape {
        let cardinality = if field.is_map() {
            Cardinality::Map
        } else if field.is_list() {
            Cardinality::List
        } else {
            Cardinality::Single
        };
        FieldShape {
            kind: native_kind(&value_field(field).kind()),
            cardinality,
            presence: field.supports_presence(),
        }
    }

    fn has(&self, field: &FieldDescriptor) -> bool {
        self.has_field(field)
    }

    fn get(&self, field: &FieldDescriptor) -> Result<Value<Self>, CodecError> {
        from_reflect(field, &self.get_field(field))
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value<Self>) -> Result<(), CodecError> {
        self.try_set_field(field, into_reflect(value))
            .map_err(|e| CodecError::Accessor(format!("set {}: {e}", field.full_name())))
    }

    fn clear(&mut self, field: &FieldDescriptor) {
        self.clear_field(field);
    }

    fn new_message(&self, field: &FieldDescriptor) -> Result<Self, CodecError> {
        match value_field(field).kind() {
            Kind::Message(descriptor) => Ok(DynamicMessage::new(descriptor)),
            other => Err(CodecError::Accessor(format!(
                "field {} holds {other:?}, not a message",
                field.full_name()
            ))),
        }
    }

    fn message_name(&self, field: &FieldDescriptor) -> Option<String> {
        match value_field(field).kind() {
            Kind::Message(descriptor) => Some(descriptor.name().to_owned()),
            _ => None,
        }
    }

    fn nested_has_member(&self, field: &FieldDescriptor, name: &str) -> bool {
        match value_field(field).kind() {
            Kind::Message(descriptor) => {
                descriptor.get_field_by_name(name).is_some()
                    || descriptor.oneofs().any(|o| !o.is_synthetic() && o.name() == name)
            }
            _ => false,
        }
    }

    fn list_len(&self, field: &FieldDescriptor) -> usize {
        self.get_field(field).as_list().map_or(0, <[ReflectValue]>::len)
    }

    fn list_get(&self, field: &FieldDescriptor, index: usize) -> Result<Value<Self>, CodecError> {
        let value = self.get_field(field);
        let item = value
            .as_list()
            .and_then(|items| items.get(index))
            .ok_or_else(|| {
                CodecError::Accessor(format!("{}[{index}] out of range", field.full_name()))
            })?;
        from_reflect(field, item)
    }

    fn list_clear(&mut self, field: &FieldDescriptor) {
        if let Some(items) = self.get_field_mut(field).as_list_mut() {
            items.clear();
        }
    }

    fn list_push(&mut self, field: &FieldDescriptor, value: Value<Self>) -> Result<(), CodecError> {
        match self.get_field_mut(field).as_list_mut() {
            Some(items) => {
                items.push(into_reflect(value));
                Ok(())
            }
            None => Err(CodecError::Accessor(format!("{} is not a list", field.full_name()))),
        }
    }

    fn map_entries(&self, field: &FieldDescriptor) -> Result<Vec<(String, Value<Self>)>, CodecError> {
        let value = self.get_field(field);
        let Some(entries) = value.as_map() else {
            return Err(CodecError::Accessor(format!("{} is not a map", field.full_name())));
        };
        let mut out = Vec::with_capacity(entries.len());
        for (key, item) in entries {
            let MapKey::String(key) = key else {
                return Err(CodecError::NonStringMapKey { field: field.name().to_owned() });
            };
            out.push((key.clone(), from_reflect(field, item)?));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn map_clear(&mut self, field: &FieldDescriptor) {
        if let Some(entries) = self.get_field_mut(field).as_map_mut() {
            entries.clear();
        }
    }

    fn map_insert(
        &mut self,
        field: &FieldDescriptor,
        key: String,
        value: Value<Self>,
    ) -> Result<(), CodecError> {
        if !string_keyed(field) {
            return Err(CodecError::NonStringMapKey { field: field.name().to_owned() });
        }
        match self.get_field_mut(field).as_map_mut() {
            Some(entries) => {
                entries.insert(MapKey::String(key), into_reflect(value));
                Ok(())
            }
            None => Err(CodecError::Accessor(format!("{} is not a map", field.full_name()))),
        }
    }

    fn oneof_name(&self, oneof: &OneofDescriptor) -> String {
        oneof.name().to_owned()
    }

    fn which_oneof(&self, oneof: &OneofDescriptor) -> Option<FieldDescriptor> {
        oneof.fields().find(|field| self.has_field(field))
    }

    fn oneof_fields(&self, oneof: &OneofDescriptor) -> Vec<FieldDescriptor> {
        oneof.fields().collect()
    }

    fn enum_name(&self, field: &FieldDescriptor, number: i32) -> Option<String> {
        match value_field(field).kind() {
            Kind::Enum(descriptor) => descriptor.get_value(number).map(|v| v.name().to_owned()),
            _ => None,
        }
    }

    fn enum_number(&self, field: &FieldDescriptor, name: &str) -> Option<i32> {
        match value_field(field).kind() {
            Kind::Enum(descriptor) => descriptor.get_value_by_name(name).map(|v| v.number()),
            _ => None,
        }
    }
}

/// For map fields, the synthetic entry's value field; otherwise `field`.
fn value_field(field: &FieldDescriptor) -> FieldDescriptor {
    if field.is_map() {
        if let Kind::Message(entry) = field.kind() {
            return entry.map_entry_value_field();
        }
    }
    field.clone()
}

fn string_keyed(field: &FieldDescriptor) -> bool {
    match field.kind() {
        Kind::Message(entry) => matches!(entry.map_entry_key_field().kind(), Kind::String),
        _ => false,
    }
}

fn native_kind(kind: &Kind) -> NativeKind {
    match kind {
        Kind::Bool => NativeKind::Bool,
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => NativeKind::Int32,
        Kind::Uint32 | Kind::Fixed32 => NativeKind::Uint32,
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => NativeKind::Int64,
        Kind::Uint64 | Kind::Fixed64 => NativeKind::Uint64,
        Kind::Float => NativeKind::Float,
        Kind::Double => NativeKind::Double,
        Kind::String => NativeKind::String,
        Kind::Bytes => NativeKind::Bytes,
        Kind::Enum(_) => NativeKind::Enum,
        Kind::Message(_) => NativeKind::Message,
    }
}

fn from_reflect(
    field: &FieldDescriptor,
    value: &ReflectValue,
) -> Result<Value<DynamicMessage>, CodecError> {
    Ok(match value {
        ReflectValue::Bool(v) => Value::Bool(*v),
        ReflectValue::I32(v) => Value::I32(*v),
        ReflectValue::U32(v) => Value::U32(*v),
        ReflectValue::I64(v) => Value::I64(*v),
        ReflectValue::U64(v) => Value::U64(*v),
        ReflectValue::F32(v) => Value::F32(*v),
        ReflectValue::F64(v) => Value::F64(*v),
        ReflectValue::String(v) => Value::String(v.clone()),
        ReflectValue::Bytes(v) => Value::Bytes(v.to_vec()),
        ReflectValue::EnumNumber(v) => Value::EnumNumber(*v),
        ReflectValue::Message(v) => Value::Message(v.clone()),
        ReflectValue::List(_) | ReflectValue::Map(_) => {
            return Err(CodecError::Accessor(format!(
                "{} is a collection, expected a single value",
                field.full_name()
            )));
        }
    })
}

fn into_reflect(value: Value<DynamicMessage>) -> ReflectValue {
    match value {
        Value::Bool(v) => ReflectValue::Bool(v),
        Value::I32(v) => ReflectValue::I32(v),
        Value::U32(v) => ReflectValue::U32(v),
        Value::I64(v) => ReflectValue::I64(v),
        Value::U64(v) => ReflectValue::U64(v),
        Value::F32(v) => ReflectValue::F32(v),
        Value::F64(v) => ReflectValue::F64(v),
        Value::String(v) => ReflectValue::String(v),
        Value::Bytes(v) => ReflectValue::Bytes(v.into()),
        Value::EnumNumber(v) => ReflectValue::EnumNumber(v),
        Value::Message(v) => ReflectValue::Message(v),
    }
}
