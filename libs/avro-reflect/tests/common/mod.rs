#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use apache_avro::Schema;
use avro_reflect::{AvroSubject, CodecError, CodecSelector, Reader, Writer};
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, ReflectMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};

// ---- descriptor builders ----

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto { type_name: Some(type_name.to_owned()), ..field(name, number, ty) }
}

fn repeated(mut f: FieldDescriptorProto) -> FieldDescriptorProto {
    f.label = Some(Label::Repeated as i32);
    f
}

fn in_oneof(mut f: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    f.oneof_index = Some(index);
    f
}

/// proto3 `optional`: a member of its own synthetic oneof.
fn optional(f: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto { proto3_optional: Some(true), ..in_oneof(f, index) }
}

fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto { name: Some(name.to_owned()), ..Default::default() }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto { name: Some(name.to_owned()), field: fields, ..Default::default() }
}

fn map_entry(name: &str, value: FieldDescriptorProto) -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions { map_entry: Some(true), ..Default::default() }),
        ..message(name, vec![field("key", 1, Type::String), value])
    }
}

/// Descriptors for the `bank` test package:
///
/// ```proto
/// enum Status { UNKNOWN = 0; ACTIVE = 1; SUSPENDED = 2; }
///
/// message Account {
///   int32 id = 1;
///   string username = 2;
///   optional string email = 3;
/// }
///
/// message Address { string street = 1; string city = 2; }
///
/// message Person {
///   string name = 1;
///   int32 age = 2;
///   Address address = 3;
///   repeated string tags = 4;
///   map<string, int64> scores = 5;
///   Status status = 6;
///   repeated Address history = 7;
///   oneof contact { string phone = 8; Address mailing = 9; int64 pager = 10; }
///   uint32 visits = 11;
///   double rating = 12;
///   bytes avatar = 13;
///   float weight = 14;
///   bool active = 15;
///   map<string, Address> homes = 16;
///   optional int32 rank = 17;
/// }
///
/// message Lite { string name = 1; }
///
/// message Resident { string name = 1; int32 age = 2; string city = 3; }
///
/// message Signal {
///   oneof reading {
///     string label = 1;
///     int32 level = 2;
///     Status code = 3;
///     uint32 count = 4;
///     bytes blob = 5;
///   }
/// }
/// ```
pub fn file_set() -> FileDescriptorSet {
    let status = EnumDescriptorProto {
        name: Some("Status".to_owned()),
        value: ["UNKNOWN", "ACTIVE", "SUSPENDED"]
            .iter()
            .zip(0..)
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).to_owned()),
                number: Some(number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let account = DescriptorProto {
        oneof_decl: vec![oneof("_email")],
        ..message(
            "Account",
            vec![
                field("id", 1, Type::Int32),
                field("username", 2, Type::String),
                optional(field("email", 3, Type::String), 0),
            ],
        )
    };

    let address = message(
        "Address",
        vec![field("street", 1, Type::String), field("city", 2, Type::String)],
    );

    let person = DescriptorProto {
        oneof_decl: vec![oneof("contact"), oneof("_rank")],
        nested_type: vec![
            map_entry("ScoresEntry", field("value", 2, Type::Int64)),
            map_entry("HomesEntry", typed("value", 2, Type::Message, ".bank.Address")),
        ],
        ..message(
            "Person",
            vec![
                field("name", 1, Type::String),
                field("age", 2, Type::Int32),
                typed("address", 3, Type::Message, ".bank.Address"),
                repeated(field("tags", 4, Type::String)),
                repeated(typed("scores", 5, Type::Message, ".bank.Person.ScoresEntry")),
                typed("status", 6, Type::Enum, ".bank.Status"),
                repeated(typed("history", 7, Type::Message, ".bank.Address")),
                in_oneof(field("phone", 8, Type::String), 0),
                in_oneof(typed("mailing", 9, Type::Message, ".bank.Address"), 0),
                in_oneof(field("pager", 10, Type::Int64), 0),
                field("visits", 11, Type::Uint32),
                field("rating", 12, Type::Double),
                field("avatar", 13, Type::Bytes),
                field("weight", 14, Type::Float),
                field("active", 15, Type::Bool),
                repeated(typed("homes", 16, Type::Message, ".bank.Person.HomesEntry")),
                optional(field("rank", 17, Type::Int32), 1),
            ],
        )
    };

    let lite = message("Lite", vec![field("name", 1, Type::String)]);

    let resident = message(
        "Resident",
        vec![
            field("name", 1, Type::String),
            field("age", 2, Type::Int32),
            field("city", 3, Type::String),
        ],
    );

    let signal = DescriptorProto {
        oneof_decl: vec![oneof("reading")],
        ..message(
            "Signal",
            vec![
                in_oneof(field("label", 1, Type::String), 0),
                in_oneof(field("level", 2, Type::Int32), 0),
                in_oneof(typed("code", 3, Type::Enum, ".bank.Status"), 0),
                in_oneof(field("count", 4, Type::Uint32), 0),
                in_oneof(field("blob", 5, Type::Bytes), 0),
            ],
        )
    };

    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("bank.proto".to_owned()),
            package: Some("bank".to_owned()),
            syntax: Some("proto3".to_owned()),
            message_type: vec![account, address, person, lite, resident, signal],
            enum_type: vec![status],
            ..Default::default()
        }],
    }
}

pub static POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::from_file_descriptor_set(file_set()).expect("test descriptors are valid")
});

pub fn descriptor(name: &str) -> MessageDescriptor {
    POOL.get_message_by_name(name).unwrap_or_else(|| panic!("no message {name}"))
}

pub fn new_message(name: &str) -> DynamicMessage {
    DynamicMessage::new(descriptor(name))
}

pub fn schema(json: &str) -> Arc<Schema> {
    Arc::new(Schema::parse_str(json).expect("valid schema"))
}

pub fn encode<T: AvroSubject>(schema: &Arc<Schema>, value: &T) -> Result<Vec<u8>, CodecError> {
    let selector = CodecSelector::default();
    let encoder = selector.encoder::<T>(schema).expect("encoder bound");
    let mut w = Writer::with_vec();
    encoder.encode(value, &mut w)?;
    Ok(w.into_inner())
}

pub fn decode<T: AvroSubject>(
    schema: &Arc<Schema>,
    bytes: &[u8],
    target: &mut T,
) -> Result<(), CodecError> {
    let selector = CodecSelector::default();
    let decoder = selector.decoder::<T>(schema).expect("decoder bound");
    let mut r = Reader::new(bytes);
    decoder.decode(&mut r, target)?;
    assert_eq!(r.remaining(), 0, "decode left trailing bytes");
    Ok(())
}

/// Raw Avro bytes built with the primitive writer.
pub fn wire(build: impl FnOnce(&mut Writer<Vec<u8>>)) -> Vec<u8> {
    let mut w = Writer::with_vec();
    build(&mut w);
    w.into_inner()
}

pub fn set(msg: &mut DynamicMessage, name: &str, value: Value) {
    msg.set_field_by_name(name, value);
}

pub fn string(value: &str) -> Value {
    Value::String(value.to_owned())
}

pub fn address(street: &str, city: &str) -> DynamicMessage {
    let mut msg = new_message("bank.Address");
    set(&mut msg, "street", string(street));
    set(&mut msg, "city", string(city));
    msg
}

// ---- schemas ----

pub const ACCOUNT_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Account",
    "namespace": "bank",
    "fields": [
        {"name": "id", "type": "int"},
        {"name": "username", "type": "string"},
        {"name": "email", "type": ["null", "string"], "default": null}
    ]
}"#;

pub const PERSON_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Person",
    "namespace": "bank",
    "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int"},
        {"name": "address", "type": ["null", {
            "type": "record",
            "name": "Address",
            "fields": [
                {"name": "street", "type": "string"},
                {"name": "city", "type": "string"}
            ]
        }]},
        {"name": "tags", "type": {"type": "array", "items": "string"}},
        {"name": "scores", "type": {"type": "map", "values": "long"}},
        {"name": "status", "type": {"type": "enum", "name": "Status", "symbols": ["UNKNOWN", "ACTIVE", "SUSPENDED"]}},
        {"name": "history", "type": {"type": "array", "items": "Address"}},
        {"name": "contact", "type": ["null", "string", "Address", "long"]},
        {"name": "visits", "type": "int"},
        {"name": "rating", "type": "double"},
        {"name": "avatar", "type": "bytes"},
        {"name": "weight", "type": "float"},
        {"name": "active", "type": "boolean"},
        {"name": "homes", "type": {"type": "map", "values": "Address"}},
        {"name": "rank", "type": ["int", "null"]}
    ]
}"#;

pub const RESIDENT_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Resident",
    "namespace": "bank",
    "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int"},
        {"name": "city", "type": "string"}
    ]
}"#;

// ---- generated-style message ----

/// Hand-written equivalent of a prost-build generated type for `bank.Account`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Account {
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(string, optional, tag = "3")]
    pub email: Option<String>,
}

impl ReflectMessage for Account {
    fn descriptor(&self) -> MessageDescriptor {
        descriptor("bank.Account")
    }
}

avro_reflect::reflected_subject!(Account);
