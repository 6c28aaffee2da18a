//! Uniform view over maps and records.
//!
//! [`Omni`] gives the engine one accessor contract for both kinds of
//! structured value. Anything else is wrapped as an opaque view with no
//! keys. A view never copies what it wraps: writes land in the shared
//! container and are visible through every other handle to it.

use crate::engine::{Mapper, MappingContext};
use crate::error::{MapperError, MapperResult};
use crate::meta::PropertyDescriptor;
use crate::types::ValueType;
use crate::value::{MapRef, RecordRef, Value};

/// Name-based view over a map, a record or an opaque value.
///
/// ```rust,ignore
/// let user = mapper.omni(Value::record(User::default()));
/// user.set("since", "1997")?;          // converted to the declared i32
/// assert_eq!(user.get("since")?, Some(Value::I32(1997)));
/// ```
#[derive(Debug, Clone)]
pub struct Omni<'m> {
    value: Value,
    mapper: &'m Mapper,
}

impl<'m> Omni<'m> {
    pub fn new(value: impl Into<Value>, mapper: &'m Mapper) -> Self {
        Self {
            value: value.into(),
            mapper,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self.value, Value::Map(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self.value, Value::Record(_))
    }

    /// Neither a map nor a record.
    pub fn is_opaque(&self) -> bool {
        !self.is_map() && !self.is_record()
    }

    /// Value under `name`.
    ///
    /// Maps look the key up. Records invoke the property's reader and fail
    /// with [`MapperError::PropertyAccessFailed`] when it has none.
    pub fn get(&self, name: &str) -> MapperResult<Option<Value>> {
        match &self.value {
            Value::Map(map) => Ok(map.get(name)),
            Value::Record(record) => record.read_property(name),
            _ => Ok(None),
        }
    }

    /// Stores `value` under `name` and reports whether anything was written.
    ///
    /// Maps always accept the value as is. Records convert it to the
    /// property's declared type first; undeclared or read-only properties
    /// are skipped and return `false`.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> MapperResult<bool> {
        self.set_in(name, value.into(), &mut MappingContext::new())
    }

    pub(crate) fn set_in(&self, name: &str, value: Value, ctx: &mut MappingContext) -> MapperResult<bool> {
        match &self.value {
            Value::Map(map) => {
                map.insert(name, value);
                Ok(true)
            }
            Value::Record(record) => {
                let Some(property) = record.record_type().property(name) else {
                    return Ok(false);
                };
                if !property.is_writable() {
                    return Ok(false);
                }
                let converted = self.mapper.convert_in(value, &property.value_type(), ctx)?;
                record.write_property(name, converted)
            }
            _ => Ok(false),
        }
    }

    /// Readable names: map keys in insertion order, or record properties in
    /// declaration order.
    pub fn keys(&self) -> Vec<String> {
        match &self.value {
            Value::Map(map) => map.keys(),
            Value::Record(record) => record.record_type().readable_names(),
            _ => Vec::new(),
        }
    }

    /// Names that [`Omni::set`] would write.
    pub fn writable_keys(&self) -> Vec<String> {
        match &self.value {
            Value::Map(map) => map.keys(),
            Value::Record(record) => record.record_type().writable_names(),
            _ => Vec::new(),
        }
    }

    /// Whether [`Omni::get`] can see `name`. Write-only record properties
    /// are not visible.
    pub fn contains_key(&self, name: &str) -> bool {
        match &self.value {
            Value::Map(map) => map.contains_key(name),
            Value::Record(record) => record
                .record_type()
                .property(name)
                .is_some_and(PropertyDescriptor::is_readable),
            _ => false,
        }
    }

    /// Declared type of a record property. Maps are untyped.
    pub fn property_type(&self, name: &str) -> Option<ValueType> {
        self.record()
            .and_then(|record| record.record_type().property(name))
            .map(|property| property.value_type())
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the wrapped value.
    pub fn unwrap(self) -> Value {
        self.value
    }

    fn record(&self) -> Option<&RecordRef> {
        self.value.as_record()
    }

    /// Copies every matching property of `source` into the wrapped value.
    pub fn set_all(&self, source: impl Into<Value>) -> MapperResult<&Self> {
        let source = Omni::new(source, self.mapper);
        self.copy_from(&source, &mut MappingContext::new())?;
        Ok(self)
    }

    /// Structural copy shared by [`Omni::set_all`] and the engine.
    ///
    /// Map targets take every source key unchanged. Record targets take
    /// their writable properties that the source also has, in declaration
    /// order, each converted to the declared type.
    pub(crate) fn copy_from(&self, source: &Omni<'_>, ctx: &mut MappingContext) -> MapperResult<()> {
        if source.is_opaque() || self.is_opaque() {
            return Err(MapperError::no_converter(
                source.value.type_name(),
                self.value.type_name(),
            ));
        }
        let names: Vec<String> = if self.is_map() {
            source.keys()
        } else {
            let available = source.keys();
            self.writable_keys()
                .into_iter()
                .filter(|name| available.contains(name))
                .collect()
        };
        for name in names {
            if let Some(value) = source.get(&name)? {
                self.set_in(&name, value, ctx)?;
            }
        }
        Ok(())
    }

    /// Converts the wrapped value to `target`.
    pub fn as_type(&self, target: &ValueType) -> MapperResult<Value> {
        self.mapper.convert(self.value.clone(), target)
    }

    /// The wrapped value as a map. Maps are returned as is.
    pub fn as_map(&self) -> MapperResult<Option<MapRef>> {
        self.mapper.as_map(self.value.clone())
    }

    /// Copies the wrapped value into `target` and returns `target`.
    pub fn copy_into(&self, target: impl Into<Value>) -> MapperResult<Value> {
        let target = Omni::new(target, self.mapper);
        target.copy_from(self, &mut MappingContext::new())?;
        Ok(target.unwrap())
    }

    /// Copies the wrapped value into whatever `supplier` creates.
    pub fn copy_into_new<V: Into<Value>>(&self, supplier: impl FnOnce() -> V) -> MapperResult<Value> {
        self.copy_into(supplier())
    }
}
