//! Conversion engine.
//!
//! [`Mapper::convert`] picks one of four strategies per call:
//!
//! | Decision     | When                                           | Result                      |
//! |--------------|------------------------------------------------|-----------------------------|
//! | `Absent`     | the value is `Null`                            | `Null`                      |
//! | `Identity`   | the target is the value's type or a supertype  | the same value              |
//! | `Scalar`     | the registry resolves a converter              | the converter's output      |
//! | `Structural` | otherwise                                      | a populated map/record/list |
//!
//! Structural conversion recurses through [`Omni`] views. The recursion
//! carries a [`MappingContext`] that bounds the depth and, unless disabled,
//! rejects re-entering a container that is already being mapped into the
//! same target type.

use std::collections::HashSet;
use std::fmt;

use crate::builder::MapperBuilder;
use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::omni::Omni;
use crate::registry::{Converter, ConverterRegistry};
use crate::typed::Typed;
use crate::types::ValueType;
use crate::value::{MapRef, Value};

// ============================================================================
// DECISION
// ============================================================================

/// Strategy chosen for one `(value, target)` pair. Never stored.
#[derive(Clone)]
pub enum ConversionDecision {
    /// The value already satisfies the target type.
    Identity,
    /// The value is `Null`.
    Absent,
    /// A registered or synthesized converter applies.
    Scalar(Converter),
    /// The target is instantiated and populated property by property.
    Structural,
}

impl ConversionDecision {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Absent => "absent",
            Self::Scalar(_) => "scalar",
            Self::Structural => "structural",
        }
    }
}

impl fmt::Debug for ConversionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Recursion state of one top-level conversion.
#[derive(Debug, Default)]
pub(crate) struct MappingContext {
    depth: usize,
    visiting: HashSet<(usize, ValueType)>,
}

impl MappingContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn enter(&mut self, value: &Value, target: &ValueType, config: &MapperConfig) -> MapperResult<()> {
        if self.depth >= config.max_depth {
            return Err(MapperError::DepthLimitExceeded {
                limit: config.max_depth,
            });
        }
        if config.detect_cycles
            && let Some(addr) = value.container_addr()
            && !self.visiting.insert((addr, target.clone()))
        {
            return Err(MapperError::CycleDetected {
                target_type: target.to_string(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self, value: &Value, target: &ValueType) {
        self.depth = self.depth.saturating_sub(1);
        if let Some(addr) = value.container_addr() {
            self.visiting.remove(&(addr, target.clone()));
        }
    }
}

// ============================================================================
// MAPPER
// ============================================================================

/// Converts values between types.
///
/// A mapper is immutable once built and can be shared freely between
/// threads.
///
/// ```rust,ignore
/// let mapper = Mapper::new();
/// let since: i32 = mapper.to("1997")?;
/// let user: User = mapper.to(value_map! { "username" => "johnd", "since" => "1997" })?;
/// let payload = mapper.as_map(user)?;
/// ```
#[derive(Clone)]
pub struct Mapper {
    registry: ConverterRegistry,
    config: MapperConfig,
}

impl Mapper {
    /// Mapper with the built-in converters and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        MapperBuilder::new().build()
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    pub(crate) fn from_parts(registry: ConverterRegistry, config: MapperConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Strategy [`Mapper::convert`] would use for `value` and `target`.
    pub fn decide(&self, value: &Value, target: &ValueType) -> ConversionDecision {
        if value.is_null() {
            return ConversionDecision::Absent;
        }
        let target = effective_target(target);
        let source = value.runtime_type();
        if target.is_assignable_from(&source) {
            ConversionDecision::Identity
        } else if let Some(converter) = self.registry.resolve(&source, &target) {
            ConversionDecision::Scalar(converter)
        } else {
            ConversionDecision::Structural
        }
    }

    /// Converts `value` to `target`.
    pub fn convert(&self, value: Value, target: &ValueType) -> MapperResult<Value> {
        self.convert_in(value, target, &mut MappingContext::new())
    }

    pub(crate) fn convert_in(
        &self,
        value: Value,
        target: &ValueType,
        ctx: &mut MappingContext,
    ) -> MapperResult<Value> {
        let target = effective_target(target);
        let decision = self.decide(&value, &target);
        tracing::trace!(
            source_type = %value.type_name(),
            target_type = %target,
            decision = decision.name(),
            "conversion decision"
        );
        match decision {
            ConversionDecision::Absent => Ok(Value::Null),
            ConversionDecision::Identity => Ok(value),
            ConversionDecision::Scalar(converter) => converter(value.clone())
                .map_err(|e| MapperError::conversion_failed(value.type_name(), &target, &value, &e)),
            ConversionDecision::Structural => {
                ctx.enter(&value, &target, &self.config)?;
                let result = self.populate(&value, &target, ctx);
                ctx.exit(&value, &target);
                result
            }
        }
    }

    fn populate(&self, value: &Value, target: &ValueType, ctx: &mut MappingContext) -> MapperResult<Value> {
        match target {
            ValueType::Map => {
                let source = Omni::new(value.clone(), self);
                let out = Omni::new(MapRef::new(), self);
                out.copy_from(&source, ctx)?;
                Ok(out.unwrap())
            }
            ValueType::Record(record_type) => {
                let source = Omni::new(value.clone(), self);
                if source.is_opaque() {
                    return Err(MapperError::no_converter(value.type_name(), target));
                }
                let out = Omni::new(record_type.instantiate()?, self);
                out.copy_from(&source, ctx)?;
                Ok(out.unwrap())
            }
            ValueType::ListOf(element) => {
                let Some(list) = value.as_list() else {
                    return Err(MapperError::no_converter(value.type_name(), target));
                };
                let items = list
                    .items()
                    .into_iter()
                    .map(|item| self.convert_in(item, element, ctx))
                    .collect::<MapperResult<Vec<_>>>()?;
                Ok(Value::from(items))
            }
            _ => Err(MapperError::no_converter(value.type_name(), target)),
        }
    }

    /// Converts `value` and extracts it as `T`.
    pub fn to<T: Typed>(&self, value: impl Into<Value>) -> MapperResult<T> {
        let converted = self.convert(value.into(), &T::value_type())?;
        T::from_value(converted)
    }

    /// [`Mapper::to`] as a closure, e.g. for `Iterator::map`.
    pub fn to_fn<T: Typed>(&self) -> impl Fn(Value) -> MapperResult<T> + '_ {
        move |value| self.to(value)
    }

    /// [`Mapper::convert`] to a fixed target, as a closure.
    pub fn as_fn(&self, target: ValueType) -> impl Fn(Value) -> MapperResult<Value> + '_ {
        move |value| self.convert(value, &target)
    }

    /// Converts `value` to a map. A map is returned as is; `Null` gives
    /// `None`.
    pub fn as_map(&self, value: impl Into<Value>) -> MapperResult<Option<MapRef>> {
        match self.convert(value.into(), &ValueType::Map)? {
            Value::Map(map) => Ok(Some(map)),
            Value::Null => Ok(None),
            other => Err(MapperError::type_mismatch(ValueType::Map, other.type_name())),
        }
    }

    /// Uniform view over `value`.
    pub fn omni(&self, value: impl Into<Value>) -> Omni<'_> {
        Omni::new(value, self)
    }

    /// Converts a JSON document to `T`.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_json<T: Typed>(&self, json: serde_json::Value) -> MapperResult<T> {
        self.to(Value::from(json))
    }

    /// Renders any typed value as JSON.
    pub fn to_json<T: Typed>(&self, value: T) -> serde_json::Value {
        value.into_value().to_json()
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// Abstract capabilities are replaced by their canonical implementation.
fn effective_target(target: &ValueType) -> ValueType {
    if target.is_abstract()
        && let Some(concrete) = target.canonical_impl()
    {
        return concrete;
    }
    target.clone()
}
