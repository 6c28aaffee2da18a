//! Mapper construction.

use crate::config::MapperConfig;
use crate::engine::Mapper;
use crate::error::ConvertError;
use crate::registry::{ConverterRegistry, ConverterTable, TypePair, converter};
use crate::typed::Typed;
use crate::types::ValueType;
use crate::value::Value;

/// Collects converter overrides and options, then freezes them into a
/// [`Mapper`].
///
/// ```rust,ignore
/// let mapper = Mapper::builder()
///     .register(ValueType::Text, ValueType::I64, |v| Ok(Value::I64(-1)))
///     .max_depth(16)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct MapperBuilder {
    overlay: ConverterTable,
    config: MapperConfig,
}

impl MapperBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for exactly `source -> target`, replacing any
    /// earlier registration of the same pair.
    ///
    /// The converter takes precedence over the built-ins for that pair and
    /// for requests that widen to it.
    pub fn register<F>(mut self, source: ValueType, target: ValueType, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        let pair = TypePair::new(source, target);
        tracing::debug!(%pair, "registered converter");
        self.overlay.insert(pair, converter(f));
        self
    }

    /// Registers a converter between two Rust types.
    pub fn register_typed<S, T, F>(self, f: F) -> Self
    where
        S: Typed + 'static,
        T: Typed + 'static,
        F: Fn(S) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        self.register(S::value_type(), T::value_type(), move |value| {
            let source = S::from_value(value).map_err(ConvertError::new)?;
            f(source).map(T::into_value)
        })
    }

    /// Replaces the whole configuration. `max_depth` is clamped to at
    /// least 1, as in [`MapperBuilder::max_depth`].
    pub fn config(mut self, config: MapperConfig) -> Self {
        if config.validate().is_err() {
            tracing::warn!(max_depth = config.max_depth, "max_depth below 1; clamping");
        }
        let max_depth = config.max_depth;
        self.config = config;
        self.max_depth(max_depth)
    }

    pub fn primitive_default_fallback(mut self, enabled: bool) -> Self {
        self.config.primitive_default_fallback = enabled;
        self
    }

    /// Clamped to at least 1.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth.max(1);
        self
    }

    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.config.detect_cycles = enabled;
        self
    }

    /// Freezes the registrations and shares the built-in table.
    pub fn build(self) -> Mapper {
        let registry = ConverterRegistry::new(self.overlay, self.config.primitive_default_fallback);
        Mapper::from_parts(registry, self.config)
    }
}
