//! Bridge between Rust types and [`Value`].
//!
//! [`Typed`] gives a Rust type its [`ValueType`] and strict conversions to
//! and from [`Value`]. Extraction never converts: a `Value::I32` is not an
//! `i64`. Use the mapper to convert first.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{MapperError, MapperResult};
use crate::meta::{Record, enum_type};
use crate::types::{Enumeration, ValueType};
use crate::value::{EnumValue, ListRef, MapRef, Value, extract_record};

/// A Rust type with a [`ValueType`] and a strict mapping to [`Value`].
pub trait Typed: Sized {
    /// Descriptor used when this type is a conversion target or a declared
    /// property type.
    fn value_type() -> ValueType;

    fn into_value(self) -> Value;

    /// Extracts `Self` from a value of exactly the matching variant.
    fn from_value(value: Value) -> MapperResult<Self>;
}

macro_rules! impl_typed_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> MapperResult<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

impl_typed_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => Timestamp,
    MapRef => Map,
    ListRef => List,
}

impl Typed for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> MapperResult<Self> {
        Ok(value)
    }
}

/// `None` maps to [`Value::Null`].
impl<T: Typed> Typed for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }

    fn from_value(value: Value) -> MapperResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::list_of(T::value_type())
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> MapperResult<Self> {
        match value {
            Value::List(list) => list.items().into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

fn mismatch<T: Typed>(actual: &Value) -> MapperError {
    MapperError::type_mismatch(T::value_type(), actual.type_name())
}

/// `value_type` for records; used by [`impl_typed_record!`](crate::impl_typed_record).
#[doc(hidden)]
pub fn record_value_type<T: Record>() -> ValueType {
    ValueType::Record(crate::meta::record_type::<T>())
}

/// `from_value` for records; used by [`impl_typed_record!`](crate::impl_typed_record).
#[doc(hidden)]
pub fn record_from_value<T: Record>(value: Value) -> MapperResult<T> {
    extract_record::<T>(&value)
}

/// `value_type` for enums; used by [`impl_typed_enum!`](crate::impl_typed_enum).
#[doc(hidden)]
pub fn enum_value_type<E: Enumeration>() -> ValueType {
    ValueType::Enum(enum_type::<E>())
}

/// `from_value` for enums; used by [`impl_typed_enum!`](crate::impl_typed_enum).
#[doc(hidden)]
pub fn enum_from_value<E: Enumeration>(value: Value) -> MapperResult<E> {
    value
        .as_enum()
        .and_then(EnumValue::to_variant::<E>)
        .ok_or_else(|| MapperError::type_mismatch(E::type_name(), value.type_name()))
}
