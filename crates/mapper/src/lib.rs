#![forbid(unsafe_code)]

//! # Nebula Mapper
//!
//! Type-directed conversion between loosely typed values and Rust records.
//!
//! This crate provides:
//! - [`Mapper`] -- converts a [`Value`] to a target [`ValueType`], copying
//!   matching properties recursively for maps, records and lists
//! - [`Omni`] -- one name-based view over maps and records
//! - [`ConverterRegistry`] -- built-in scalar converters plus per-mapper
//!   overrides, with widening lookup
//! - [`Record`] / [`RecordBuilder`] -- explicit property metadata for Rust
//!   structs, cached per type
//! - [`paths`] -- dotted-key flatten/unflatten for nested maps
//!
//! ```rust,ignore
//! use nebula_mapper::prelude::*;
//!
//! #[derive(Clone, Default)]
//! struct User { username: String, since: Option<i32> }
//!
//! impl Record for User {
//!     fn describe(b: RecordBuilder<Self>) -> RecordBuilder<Self> {
//!         b.default_constructor()
//!             .field("username", |u| &u.username, |u| &mut u.username)
//!             .field("since", |u| &u.since, |u| &mut u.since)
//!     }
//! }
//! impl_typed_record!(User);
//!
//! let mapper = Mapper::new();
//! let user: User = mapper.to(value_map! {
//!     "username" => "johnd",
//!     "since" => "1997",
//!     "extra" => "ignored",
//! })?;
//! assert_eq!(user.since, Some(1997));
//! ```

#[macro_use]
mod macros;

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod meta;
pub mod omni;
pub mod paths;
pub mod registry;
pub mod typed;
pub mod types;
pub mod value;

pub use builder::MapperBuilder;
pub use config::MapperConfig;
pub use engine::{ConversionDecision, Mapper};
pub use error::{ConvertError, MapperError, MapperResult};
pub use meta::{PropertyDescriptor, PropertyInfo, Record, RecordBuilder, RecordType, enum_type, record_type};
pub use omni::Omni;
pub use registry::{Converter, ConverterRegistry, ConverterTable, TypePair, converter};
pub use typed::Typed;
pub use types::{EnumType, Enumeration, ValueType};
pub use value::{EnumValue, ListRef, MapRef, RecordRef, Value};

/// Common imports.
pub mod prelude {
    pub use crate::{
        ConvertError, Enumeration, MapRef, Mapper, MapperError, MapperResult, Omni, Record,
        RecordBuilder, Typed, Value, ValueType, impl_typed_enum, impl_typed_record, value_map,
    };
}
