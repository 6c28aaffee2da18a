//! Converter registry.
//!
//! A [`ConverterRegistry`] layers the caller's registrations (the overlay)
//! over the process-wide built-in table (the base). Both tables are frozen
//! when the owning [`Mapper`](crate::Mapper) is built, so resolution needs
//! no synchronization.
//!
//! Resolution order for `(source, target)`:
//!
//! 1. exact pair, overlay then base;
//! 2. widening (registered source and target are supertypes of the
//!    requested ones), overlay then base;
//! 3. enum targets: member named by the source's canonical text;
//! 4. primitive targets: their zero value, only when enabled;
//! 5. nothing.

pub mod builtin;
mod table;

use std::fmt;
use std::sync::Arc;

use crate::error::ConvertError;
use crate::types::{EnumType, ValueType};
use crate::value::Value;

pub use builtin::{builtin_table, parse_as};
pub use table::ConverterTable;

/// A scalar conversion function.
///
/// Converters are pure. They do not know their target type; the registry
/// keys them by [`TypePair`].
pub type Converter = Arc<dyn Fn(Value) -> Result<Value, ConvertError> + Send + Sync>;

/// Wraps a closure as a [`Converter`].
pub fn converter<F>(f: F) -> Converter
where
    F: Fn(Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
{
    Arc::new(f)
}

// ============================================================================
// TYPE PAIR
// ============================================================================

/// Registry key: an ordered `(source, target)` pair of types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: ValueType,
    pub target: ValueType,
}

impl TypePair {
    pub fn new(source: ValueType, target: ValueType) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Immutable base table plus immutable overlay.
#[derive(Clone)]
pub struct ConverterRegistry {
    base: Arc<ConverterTable>,
    overlay: Arc<ConverterTable>,
    primitive_default_fallback: bool,
}

impl ConverterRegistry {
    /// Registry over the shared built-in table.
    pub fn new(overlay: ConverterTable, primitive_default_fallback: bool) -> Self {
        Self::with_base(builtin::shared_base(), overlay, primitive_default_fallback)
    }

    pub fn with_base(
        base: Arc<ConverterTable>,
        overlay: ConverterTable,
        primitive_default_fallback: bool,
    ) -> Self {
        Self {
            base,
            overlay: Arc::new(overlay),
            primitive_default_fallback,
        }
    }

    pub fn base(&self) -> &ConverterTable {
        &self.base
    }

    pub fn overlay(&self) -> &ConverterTable {
        &self.overlay
    }

    /// Resolves a converter from `source` to `target`.
    pub fn resolve(&self, source: &ValueType, target: &ValueType) -> Option<Converter> {
        let pair = TypePair::new(source.clone(), target.clone());
        if let Some(found) = self.overlay.get(&pair).or_else(|| self.base.get(&pair)) {
            tracing::trace!(%pair, "exact converter");
            return Some(Arc::clone(found));
        }

        let widened = self
            .overlay
            .find_widening(source, target)
            .or_else(|| self.base.find_widening(source, target));
        if let Some((registered, found)) = widened {
            tracing::trace!(%pair, %registered, "widened converter");
            return Some(Arc::clone(found));
        }

        if let ValueType::Enum(enum_type) = target {
            tracing::trace!(%pair, "enum name converter");
            return Some(enum_by_name(enum_type));
        }

        if self.primitive_default_fallback
            && let Some(zero) = target.zero_value()
        {
            return Some(zero_default(target.clone(), zero));
        }

        None
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("base", &self.base.len())
            .field("overlay", &self.overlay)
            .field("primitive_default_fallback", &self.primitive_default_fallback)
            .finish()
    }
}

fn enum_by_name(enum_type: &EnumType) -> Converter {
    let enum_type = enum_type.clone();
    converter(move |value| {
        let text = value.to_string();
        enum_type
            .member(&text)
            .map(Value::Enum)
            .ok_or_else(|| ConvertError::new(format!("no member named '{text}' in {}", enum_type.name())))
    })
}

fn zero_default(target: ValueType, zero: Value) -> Converter {
    converter(move |value| {
        tracing::warn!(
            source_type = %value.type_name(),
            target_type = %target,
            "no converter resolved; substituting zero value"
        );
        Ok(zero.clone())
    })
}
