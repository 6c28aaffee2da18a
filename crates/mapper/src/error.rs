//! Mapper error types.
//!
//! [`MapperError`] is returned by every fallible engine operation.
//! [`ConvertError`] is the narrower failure a scalar converter reports; the
//! engine wraps it into [`MapperError::ConversionFailed`] together with the
//! source/target types and the offending value.

use std::fmt;

/// Result alias used throughout the crate.
pub type MapperResult<T> = Result<T, MapperError>;

// ============================================================================
// MAPPER ERROR
// ============================================================================

/// Errors produced while converting or mapping values.
///
/// All errors are synchronous and propagate straight to the caller of
/// [`Mapper::convert`](crate::Mapper::convert). A structural copy either
/// populates every intersected property or aborts with the first error.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapperError {
    /// No exact, widened, enum or primitive-default converter exists and the
    /// target cannot be populated structurally.
    #[error("no converter resolved from {source_type} to {target_type}")]
    NoConverterResolved {
        /// Runtime type of the source value.
        source_type: String,
        /// Requested target type.
        target_type: String,
    },

    /// A resolved converter rejected the value.
    #[error("cannot convert {value:?} from {source_type} to {target_type}: {reason}")]
    ConversionFailed {
        /// Runtime type of the source value.
        source_type: String,
        /// Requested target type.
        target_type: String,
        /// Canonical text of the offending value.
        value: String,
        /// Converter-supplied reason.
        reason: String,
    },

    /// The target record type has no zero-argument constructor.
    #[error("cannot instantiate {type_name}: no zero-argument constructor declared")]
    InstantiationFailed {
        /// Record type name.
        type_name: String,
    },

    /// A declared accessor could not be invoked.
    #[error("property access failed for {type_name}.{property}: {reason}")]
    PropertyAccessFailed {
        /// Record type name.
        type_name: String,
        /// Property name.
        property: String,
        /// What went wrong.
        reason: String,
    },

    /// A value could not be extracted as the requested Rust type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual runtime type.
        actual: String,
    },

    /// The same container was re-entered while mapping into the same type.
    #[error("cycle detected while mapping into {target_type}")]
    CycleDetected {
        /// Target type of the re-entered mapping.
        target_type: String,
    },

    /// Structural recursion went deeper than the configured limit.
    #[error("mapping depth limit of {limit} exceeded")]
    DepthLimitExceeded {
        /// Configured maximum depth.
        limit: usize,
    },

    /// A dotted path is used both as a leaf and as a branch.
    #[error("path conflict at '{path}': key is both a value and a nested map")]
    PathConflict {
        /// The conflicting path.
        path: String,
    },

    /// Mapper configuration is invalid.
    #[error("invalid mapper configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl MapperError {
    /// Creates a [`MapperError::NoConverterResolved`].
    pub fn no_converter(source_type: impl fmt::Display, target_type: impl fmt::Display) -> Self {
        Self::NoConverterResolved {
            source_type: source_type.to_string(),
            target_type: target_type.to_string(),
        }
    }

    /// Wraps a converter failure with its source/target context.
    pub fn conversion_failed(
        source_type: impl fmt::Display,
        target_type: impl fmt::Display,
        value: impl fmt::Display,
        error: &ConvertError,
    ) -> Self {
        Self::ConversionFailed {
            source_type: source_type.to_string(),
            target_type: target_type.to_string(),
            value: value.to_string(),
            reason: error.reason().to_owned(),
        }
    }

    /// Creates a [`MapperError::InstantiationFailed`].
    pub fn instantiation(type_name: impl Into<String>) -> Self {
        Self::InstantiationFailed {
            type_name: type_name.into(),
        }
    }

    /// Creates a [`MapperError::PropertyAccessFailed`].
    pub fn property_access(
        type_name: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PropertyAccessFailed {
            type_name: type_name.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`MapperError::TypeMismatch`].
    pub fn type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a [`MapperError::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoConverterResolved { .. } => "no_converter_resolved",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::InstantiationFailed { .. } => "instantiation_failed",
            Self::PropertyAccessFailed { .. } => "property_access_failed",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::CycleDetected { .. } => "cycle_detected",
            Self::DepthLimitExceeded { .. } => "depth_limit_exceeded",
            Self::PathConflict { .. } => "path_conflict",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}

// ============================================================================
// CONVERT ERROR
// ============================================================================

/// Failure reported by a scalar converter.
///
/// Converters only know *why* a value was rejected; the engine adds the
/// type context when it surfaces the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ConvertError {
    reason: String,
}

impl ConvertError {
    /// Creates a converter failure from anything printable, typically a
    /// parse error.
    pub fn new(reason: impl fmt::Display) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }

    /// The reason the converter gave.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
