//! Codec selection and the binding cache.
//!
//! Selection is per direction. For a record schema, a type that marshals
//! itself gets the custom strategy; otherwise a type exposing a message view
//! gets the reflective one. For a string or bytes schema, a type that
//! marshals itself as text gets the text strategy. Any other combination has
//! no codec here and the caller falls back to its own generic mapping.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use apache_avro::schema::RecordSchema;
use apache_avro::Schema;
use arc_swap::ArcSwap;
use avro_wire::{PrimitiveRead, PrimitiveWrite};

use crate::registry::Limits;
use crate::schema::{kind_name, Names};
use crate::subject::AvroSubject;
use crate::{record, CodecError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Encode,
    Decode,
}

/// Schema identity is the address of its `Arc`; bindings hold that `Arc`,
/// so an address cannot be reused while its entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    schema: usize,
    type_id: TypeId,
    direction: Direction,
}

impl CacheKey {
    fn new<T: 'static>(schema: &Arc<Schema>, direction: Direction) -> Self {
        Self { schema: Arc::as_ptr(schema) as usize, type_id: TypeId::of::<T>(), direction }
    }
}

/// Which strategy a codec was bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Custom,
    Text,
    Message,
}

#[derive(Debug)]
enum Strategy {
    Custom,
    Text,
    Message { names: Names, limits: Limits },
}

impl Strategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Custom => StrategyKind::Custom,
            Strategy::Text => StrategyKind::Text,
            Strategy::Message { .. } => StrategyKind::Message,
        }
    }
}

fn record_of(schema: &Schema) -> Result<&RecordSchema, CodecError> {
    match schema {
        Schema::Record(record) => Ok(record),
        other => Err(CodecError::SchemaMismatch {
            field: "<root>".to_owned(),
            expected: "record",
            actual: kind_name(other),
        }),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Bound codecs
// ═══════════════════════════════════════════════════════════════

/// Encoder bound to one schema and one type.
#[derive(Debug)]
pub struct Encoder<T> {
    schema: Arc<Schema>,
    strategy: Strategy,
    _type: PhantomData<fn(&T)>,
}

impl<T: AvroSubject> Encoder<T> {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Writes `value` as one record, or one string/bytes value under the
    /// text strategy. On error the output holds an unspecified prefix and
    /// should be discarded.
    pub fn encode(&self, value: &T, w: &mut dyn PrimitiveWrite) -> Result<(), CodecError> {
        match &self.strategy {
            Strategy::Custom => {
                if value.is_nil() {
                    return Ok(());
                }
                let marshaler =
                    value.as_marshaler().ok_or(CodecError::NotAMarshaler(type_name::<T>()))?;
                marshaler.marshal_avro(w).map_err(CodecError::Marshaler)
            }
            Strategy::Text => {
                if value.is_nil() {
                    return Ok(w.write_bytes(&[])?);
                }
                let marshaler = value
                    .as_text_marshaler()
                    .ok_or(CodecError::NotAMarshaler(type_name::<T>()))?;
                let text = marshaler.marshal_text().map_err(CodecError::Marshaler)?;
                Ok(w.write_bytes(&text)?)
            }
            Strategy::Message { names, limits } => {
                if value.is_nil() {
                    return Err(CodecError::NilMessage);
                }
                let record = record_of(&self.schema)?;
                let ctx = limits.context(names);
                value.with_message(&mut |msg| record::encode_record(ctx, record, msg, w))
            }
        }
    }
}

/// Decoder bound to one schema and one type.
#[derive(Debug)]
pub struct Decoder<T> {
    schema: Arc<Schema>,
    strategy: Strategy,
    _type: PhantomData<fn(&mut T)>,
}

impl<T: AvroSubject> Decoder<T> {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Reads one record (or one text value) into `target`.
    ///
    /// Fields present in the schema overwrite the target's; fields the
    /// target lacks are skipped. A failed decode may leave a
    /// `DynamicMessage` target partly populated.
    pub fn decode(&self, r: &mut dyn PrimitiveRead, target: &mut T) -> Result<(), CodecError> {
        match &self.strategy {
            Strategy::Custom => {
                let unmarshaler = target
                    .as_unmarshaler()
                    .ok_or(CodecError::NotAMarshaler(type_name::<T>()))?;
                unmarshaler.unmarshal_avro(r).map_err(CodecError::Marshaler)
            }
            Strategy::Text => {
                let unmarshaler = target
                    .as_text_unmarshaler()
                    .ok_or(CodecError::NotAMarshaler(type_name::<T>()))?;
                let text = r.read_bytes()?;
                unmarshaler.unmarshal_text(&text).map_err(CodecError::Marshaler)
            }
            Strategy::Message { names, limits } => {
                let record = record_of(&self.schema)?;
                let ctx = limits.context(names);
                target.with_message_mut(&mut |msg| record::decode_record(ctx, record, msg, r))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Selector
// ═══════════════════════════════════════════════════════════════

type Cache = HashMap<CacheKey, Arc<dyn Any + Send + Sync>>;

/// Binds schemas to types and memoizes the result.
///
/// Lookups never lock. A miss builds the binding without holding anything
/// and publishes it with a compare-and-swap; when two threads race on the
/// same key the first published binding wins and the other is dropped.
pub struct CodecSelector {
    limits: Limits,
    cache: ArcSwap<Cache>,
}

impl std::fmt::Debug for CodecSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecSelector")
            .field("limits", &self.limits)
            .field("cached", &self.cached())
            .finish()
    }
}

impl Default for CodecSelector {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl CodecSelector {
    pub fn new(limits: Limits) -> Self {
        Self { limits, cache: ArcSwap::from_pointee(HashMap::new()) }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Number of cached bindings.
    pub fn cached(&self) -> usize {
        self.cache.load().len()
    }

    /// Drops every binding made against `schema` and returns how many there
    /// were. The schema itself may still be bound again afterwards.
    pub fn evict(&self, schema: &Arc<Schema>) -> usize {
        let address = Arc::as_ptr(schema) as usize;
        let previous = self.cache.rcu(|current| {
            let mut next = Cache::clone(current);
            next.retain(|key, _| key.schema != address);
            next
        });
        let evicted = previous.keys().filter(|key| key.schema == address).count();
        if evicted > 0 {
            tracing::debug!(schema = %schema_name(schema), evicted, "codec bindings evicted");
        }
        evicted
    }

    /// Encoder for `T` under `schema`, or `None` if no strategy applies.
    pub fn encoder<T: AvroSubject>(&self, schema: &Arc<Schema>) -> Option<Arc<Encoder<T>>> {
        let key = CacheKey::new::<T>(schema, Direction::Encode);
        self.get_or_bind(key, || {
            let c = T::capabilities();
            let strategy = self.strategy(schema, c.marshal, c.text_marshal, c.message)?;
            Some(Encoder { schema: Arc::clone(schema), strategy, _type: PhantomData })
        })
    }

    /// Decoder for `T` under `schema`, or `None` if no strategy applies.
    pub fn decoder<T: AvroSubject>(&self, schema: &Arc<Schema>) -> Option<Arc<Decoder<T>>> {
        let key = CacheKey::new::<T>(schema, Direction::Decode);
        self.get_or_bind(key, || {
            let c = T::capabilities();
            let strategy = self.strategy(schema, c.unmarshal, c.text_unmarshal, c.message)?;
            Some(Decoder { schema: Arc::clone(schema), strategy, _type: PhantomData })
        })
    }

    fn strategy(
        &self,
        schema: &Schema,
        custom: bool,
        text: bool,
        message: bool,
    ) -> Option<Strategy> {
        match schema {
            Schema::String | Schema::Bytes if text => Some(Strategy::Text),
            Schema::Record(_) if custom => Some(Strategy::Custom),
            Schema::Record(_) if message => {
                Some(Strategy::Message { names: Names::collect(schema), limits: self.limits })
            }
            _ => None,
        }
    }

    fn get_or_bind<C, F>(&self, key: CacheKey, bind: F) -> Option<Arc<C>>
    where
        C: Any + Send + Sync + BoundCodec,
        F: FnOnce() -> Option<C>,
    {
        if let Some(hit) = self.cache.load().get(&key) {
            return Arc::clone(hit).downcast::<C>().ok();
        }

        let built = Arc::new(bind()?);
        tracing::debug!(
            schema = %built.schema_name(),
            type_name = type_name::<C>(),
            strategy = ?built.strategy_kind(),
            "codec bound"
        );

        let candidate: Arc<dyn Any + Send + Sync> = built.clone();
        self.cache.rcu(|current| {
            let mut next = Cache::clone(current);
            next.entry(key).or_insert_with(|| Arc::clone(&candidate));
            next
        });

        let winner = self.cache.load().get(&key).map(Arc::clone)?;
        if !Arc::ptr_eq(&winner, &candidate) {
            tracing::debug!(type_name = type_name::<C>(), "codec bind race lost, discarding");
        }
        winner.downcast::<C>().ok()
    }
}

/// Introspection shared by [`Encoder`] and [`Decoder`], for logging.
trait BoundCodec {
    fn schema_name(&self) -> String;
    fn strategy_kind(&self) -> StrategyKind;
}

fn schema_name(schema: &Schema) -> String {
    match schema {
        Schema::Record(record) => record.name.fullname(None),
        other => kind_name(other),
    }
}

impl<T> BoundCodec for Encoder<T> {
    fn schema_name(&self) -> String {
        schema_name(&self.schema)
    }

    fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }
}

impl<T> BoundCodec for Decoder<T> {
    fn schema_name(&self) -> String {
        schema_name(&self.schema)
    }

    fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }
}
