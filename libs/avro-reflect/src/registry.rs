//! Schema registry: named schemas, protobuf descriptors and the codec cache
//! that belongs to them.

use std::collections::HashMap;
use std::sync::Arc;

use apache_avro::Schema;
use avro_wire::{Reader, Writer, DEFAULT_MAX_ALLOCATION_BYTES};
use prost_reflect::{DescriptorPool, DynamicMessage};
use serde::{Deserialize, Serialize};

use crate::schema::{kind_name, Context, Names};
use crate::selector::CodecSelector;
use crate::subject::AvroSubject;
use crate::CodecError;

// ---- Config ----

/// Resource bounds applied to every encode/decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum record/union nesting; bounds recursive schemas.
    pub max_depth: usize,
    /// Largest single string, bytes or fixed value a decode may allocate.
    /// Also caps the item total of one array or map.
    pub max_allocation_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 64, max_allocation_bytes: DEFAULT_MAX_ALLOCATION_BYTES }
    }
}

impl Limits {
    pub(crate) fn context<'a>(&self, names: &'a Names) -> Context<'a> {
        Context::new(names, self.max_depth).with_max_items(self.max_allocation_bytes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Avro schema files (.avsc), one named schema each.
    pub schema_paths: Vec<String>,
    /// FileDescriptorSet (.bin from `protoc --descriptor_set_out`).
    pub descriptor_path: Option<String>,
    pub limits: Limits,
}

impl RegistryConfig {
    /// Parses a JSON config. Empty input yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

// ---- Registry ----

#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
    pool: DescriptorPool,
    selector: CodecSelector,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl SchemaRegistry {
    pub fn new(limits: Limits) -> Self {
        Self {
            schemas: HashMap::new(),
            pool: DescriptorPool::new(),
            selector: CodecSelector::new(limits),
        }
    }

    /// Loads every schema file and the descriptor set named by `config`.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, CodecError> {
        let mut registry = Self::new(config.limits);

        if let Some(path) = &config.descriptor_path {
            let bytes = std::fs::read(path)?;
            registry.add_descriptors(&bytes)?;
        }
        for path in &config.schema_paths {
            let text = std::fs::read_to_string(path)?;
            registry.register_str(&text)?;
        }

        tracing::info!(
            schemas = registry.schemas.len(),
            messages = registry.pool.all_messages().count(),
            "schema registry loaded"
        );
        Ok(registry)
    }

    /// Adds the files of an encoded `FileDescriptorSet` to the pool.
    pub fn add_descriptors(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.pool.decode_file_descriptor_set(bytes)?;
        Ok(())
    }

    /// Parses a named schema and registers it under its full name,
    /// replacing any previous schema with that name. Bindings of a replaced
    /// schema are evicted from the codec cache.
    pub fn register_str(&mut self, text: &str) -> Result<Arc<Schema>, CodecError> {
        let schema = Schema::parse_str(text)?;
        let name = match schema.name() {
            Some(name) => name.fullname(None),
            None => {
                return Err(CodecError::SchemaMismatch {
                    field: "<root>".to_owned(),
                    expected: "named",
                    actual: kind_name(&schema),
                });
            }
        };
        let schema = Arc::new(schema);
        if let Some(previous) = self.schemas.insert(name, Arc::clone(&schema)) {
            self.selector.evict(&previous);
        }
        Ok(schema)
    }

    pub fn schema(&self, name: &str) -> Result<Arc<Schema>, CodecError> {
        self.schemas.get(name).cloned().ok_or_else(|| CodecError::UnknownSchema(name.to_owned()))
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn selector(&self) -> &CodecSelector {
        &self.selector
    }

    /// Empty message of a type from the descriptor pool.
    pub fn new_message(&self, full_name: &str) -> Result<DynamicMessage, CodecError> {
        self.pool
            .get_message_by_name(full_name)
            .map(DynamicMessage::new)
            .ok_or_else(|| CodecError::UnknownMessage(full_name.to_owned()))
    }

    /// Encodes `value` as one record of schema `name`.
    pub fn marshal<T: AvroSubject>(&self, name: &str, value: &T) -> Result<Vec<u8>, CodecError> {
        let schema = self.schema(name)?;
        let encoder = self.selector.encoder::<T>(&schema).ok_or_else(|| CodecError::NoCodec {
            type_name: std::any::type_name::<T>(),
            schema: name.to_owned(),
        })?;
        let mut w = Writer::with_vec();
        encoder.encode(value, &mut w)?;
        Ok(w.into_inner())
    }

    /// Decodes one record of schema `name` from the front of `bytes` into
    /// `target`.
    pub fn unmarshal<T: AvroSubject>(
        &self,
        name: &str,
        bytes: &[u8],
        target: &mut T,
    ) -> Result<(), CodecError> {
        let schema = self.schema(name)?;
        let decoder = self.selector.decoder::<T>(&schema).ok_or_else(|| CodecError::NoCodec {
            type_name: std::any::type_name::<T>(),
            schema: name.to_owned(),
        })?;
        let mut r = Reader::new(bytes).with_max_allocation(self.selector.limits().max_allocation_bytes);
        decoder.decode(&mut r, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RegistryConfig::from_json("").unwrap();
        assert!(config.schema_paths.is_empty());
        assert_eq!(config.limits.max_depth, 64);

        let config = RegistryConfig::from_json(r#"{"limits": {"max_depth": 8}}"#).unwrap();
        assert_eq!(config.limits.max_depth, 8);
        assert_eq!(config.limits.max_allocation_bytes, DEFAULT_MAX_ALLOCATION_BYTES);
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let err = RegistryConfig::from_json("{").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SchemaRegistry::default();
        registry
            .register_str(r#"{"type": "record", "name": "Ping", "namespace": "net", "fields": []}"#)
            .unwrap();
        assert!(registry.schema("net.Ping").is_ok());
        assert!(matches!(registry.schema("Ping"), Err(CodecError::UnknownSchema(_))));
        assert_eq!(registry.schema_names().collect::<Vec<_>>(), vec!["net.Ping"]);
    }

    #[test]
    fn test_unnamed_schema_rejected() {
        let mut registry = SchemaRegistry::default();
        assert!(registry.register_str(r#""string""#).is_err());
    }

    #[test]
    fn test_unknown_message() {
        let registry = SchemaRegistry::default();
        let err = registry.new_message("pkg.Missing").unwrap_err();
        assert!(matches!(err, CodecError::UnknownMessage(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
