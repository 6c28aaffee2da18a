//! Mapper configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

/// Default structural recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options fixed when a [`Mapper`](crate::Mapper) is built.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// When no converter resolves for a primitive target, return the
    /// target's zero value instead of failing.
    pub primitive_default_fallback: bool,

    /// Maximum nesting of structural conversions.
    pub max_depth: usize,

    /// Fail with [`MapperError::CycleDetected`] when a container is
    /// re-entered while it is already being mapped into the same type.
    pub detect_cycles: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            primitive_default_fallback: false,
            max_depth: DEFAULT_MAX_DEPTH,
            detect_cycles: true,
        }
    }
}

impl MapperConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> MapperResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MapperError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MapperResult<()> {
        if self.max_depth == 0 {
            return Err(MapperError::invalid_config("max_depth must be at least 1"));
        }
        Ok(())
    }
}
