//! Dynamic value model.
//!
//! [`Value`] is the currency of the mapper. Scalars are stored inline;
//! maps, lists and records are shared handles, so cloning a `Value` never
//! copies the container and every mutation is visible through every handle.

mod json;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{MapperError, MapperResult};
use crate::meta::{Record, RecordType, enum_type, record_type};
use crate::types::{EnumType, Enumeration, ValueType};

/// Canonical text format of [`Value::DateTime`].
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Canonical text format of [`Value::Date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// VALUE
// ============================================================================

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Enum(EnumValue),
    List(ListRef),
    Map(MapRef),
    Record(RecordRef),
}

impl Value {
    /// Creates a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Wraps a record instance in a fresh shared handle.
    pub fn record<T: Record>(record: T) -> Self {
        Self::Record(RecordRef::new(record))
    }

    /// Creates an enum value from a Rust enum variant.
    pub fn enumeration<E: Enumeration>(variant: E) -> Self {
        Self::Enum(EnumValue::of(variant))
    }

    /// Runtime type descriptor of this value.
    ///
    /// Lists report [`ValueType::List`]; element types are not tracked.
    pub fn runtime_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Any,
            Self::Bool(_) => ValueType::Bool,
            Self::Char(_) => ValueType::Char,
            Self::I8(_) => ValueType::I8,
            Self::I16(_) => ValueType::I16,
            Self::I32(_) => ValueType::I32,
            Self::I64(_) => ValueType::I64,
            Self::U8(_) => ValueType::U8,
            Self::U16(_) => ValueType::U16,
            Self::U32(_) => ValueType::U32,
            Self::U64(_) => ValueType::U64,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
            Self::Decimal(_) => ValueType::Decimal,
            Self::Text(_) => ValueType::Text,
            Self::Date(_) => ValueType::Date,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Timestamp(_) => ValueType::Timestamp,
            Self::Enum(e) => ValueType::Enum(e.enum_type().clone()),
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
            Self::Record(r) => ValueType::Record(r.record_type().clone()),
        }
    }

    /// Name of the runtime type, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            other => other.runtime_type().to_string(),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value of any signed or unsigned integer variant that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I8(v) => Some(i64::from(v)),
            Self::I16(v) => Some(i64::from(v)),
            Self::I32(v) => Some(i64::from(v)),
            Self::I64(v) => Some(v),
            Self::U8(v) => Some(i64::from(v)),
            Self::U16(v) => Some(i64::from(v)),
            Self::U32(v) => Some(i64::from(v)),
            Self::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Floating-point view of any numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            Self::U64(v) => Some(*v as f64),
            Self::Decimal(d) => d.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub const fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub const fn as_list(&self) -> Option<&ListRef> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub const fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub const fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` when both values are the same shared container.
    ///
    /// Scalars are never "the same reference"; use `==` for them.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Record(a), Self::Record(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Address of the shared container, if this value is one.
    pub(crate) fn container_addr(&self) -> Option<usize> {
        match self {
            Self::Map(m) => Some(m.addr()),
            Self::List(l) => Some(l.addr()),
            Self::Record(r) => Some(r.addr()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b) || a.items() == b.items(),
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b) || a.entries() == b.entries(),
            (Self::Record(a), Self::Record(b)) => a.ptr_eq(b) || a.same_properties(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Self::DateTime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
            Self::Timestamp(v) => f.write_str(&v.to_rfc3339()),
            Self::Enum(v) => f.write_str(v.name()),
            Self::List(_) | Self::Map(_) | Self::Record(_) => write!(f, "{}", self.to_json()),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
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
    EnumValue => Enum,
    ListRef => List,
    MapRef => Map,
    RecordRef => Record,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(ListRef::from_vec(v))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(MapRef::from_map(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// ENUM VALUE
// ============================================================================

/// A member of an enumeration type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: EnumType,
    ordinal: usize,
}

impl EnumValue {
    pub(crate) fn new(ty: EnumType, ordinal: usize) -> Self {
        Self { ty, ordinal }
    }

    /// Converts a Rust enum variant.
    ///
    /// `variant` must be listed by [`Enumeration::variants`]. Debug builds
    /// panic otherwise; release builds log an error and use the first member.
    pub fn of<E: Enumeration>(variant: E) -> Self {
        let ordinal = E::variants().iter().position(|v| *v == variant);
        debug_assert!(
            ordinal.is_some(),
            "variant of {} is missing from Enumeration::variants()",
            E::type_name()
        );
        let ordinal = ordinal.unwrap_or_else(|| {
            tracing::error!(
                enumeration = E::type_name(),
                "variant missing from Enumeration::variants(); using the first member"
            );
            0
        });
        Self::new(enum_type::<E>(), ordinal)
    }

    pub fn enum_type(&self) -> &EnumType {
        &self.ty
    }

    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Member name.
    pub fn name(&self) -> &'static str {
        self.ty.member_name(self.ordinal).unwrap_or_default()
    }

    /// Converts back into the Rust enum, if this member belongs to `E`.
    pub fn to_variant<E: Enumeration>(&self) -> Option<E> {
        if self.ty.type_id() != std::any::TypeId::of::<E>() {
            return None;
        }
        E::variants().get(self.ordinal).copied()
    }
}

// ============================================================================
// MAP
// ============================================================================

/// Shared handle to an insertion-ordered `String -> Value` map.
#[derive(Clone, Default)]
pub struct MapRef(Arc<RwLock<IndexMap<String, Value>>>);

impl MapRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: IndexMap<String, Value>) -> Self {
        Self(Arc::new(RwLock::new(map)))
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRef")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("keys", &self.keys())
            .finish()
    }
}

impl FromIterator<(String, Value)> for MapRef {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

// ============================================================================
// LIST
// ============================================================================

/// Shared handle to a growable list of values.
#[derive(Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    /// Replaces the element at `index`. Returns `false` when out of bounds.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Snapshot of the elements.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListRef")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("len", &self.len())
            .finish()
    }
}

impl FromIterator<Value> for ListRef {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

// ============================================================================
// RECORD
// ============================================================================

pub(crate) type Instance = Box<dyn Any + Send + Sync>;

/// Shared handle to a record instance together with its metadata.
#[derive(Clone)]
pub struct RecordRef {
    ty: RecordType,
    inner: Arc<RwLock<Instance>>,
}

impl RecordRef {
    /// Wraps `record` in a fresh handle.
    pub fn new<T: Record>(record: T) -> Self {
        Self::from_parts(record_type::<T>(), Box::new(record))
    }

    pub(crate) fn from_parts(ty: RecordType, instance: Instance) -> Self {
        Self {
            ty,
            inner: Arc::new(RwLock::new(instance)),
        }
    }

    pub fn record_type(&self) -> &RecordType {
        &self.ty
    }

    /// Reads a declared property. `Ok(None)` when the name is not declared.
    pub fn read_property(&self, name: &str) -> MapperResult<Option<Value>> {
        let guard = self.inner.read();
        self.ty.read(&**guard, name)
    }

    /// Writes a declared property. `Ok(false)` when the property is not
    /// declared or not writable.
    ///
    /// The value must already be of the property's declared type.
    pub fn write_property(&self, name: &str, value: Value) -> MapperResult<bool> {
        let Some(prepared) = self.ty.prepare_write(name, value)? else {
            return Ok(false);
        };
        let mut guard = self.inner.write();
        prepared.apply(&mut **guard)?;
        Ok(true)
    }

    /// Clones the instance out as `T`, projecting through declared parents
    /// when `T` is an ancestor.
    pub fn extract<T: Record>(&self) -> Option<T> {
        let guard = self.inner.read();
        if let Some(found) = (**guard).downcast_ref::<T>() {
            return Some(found.clone());
        }
        self.ty
            .upcast(std::any::TypeId::of::<T>(), &**guard)
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn ptr_eq(&self, other: &RecordRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }

    fn same_properties(&self, other: &RecordRef) -> bool {
        if self.ty != other.ty {
            return false;
        }
        self.ty.readable_names().iter().all(|name| {
            match (self.read_property(name), other.read_property(name)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        })
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRef")
            .field("type", &self.ty.name())
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

/// Extracts a record of type `T`, failing with [`MapperError::TypeMismatch`].
pub(crate) fn extract_record<T: Record>(value: &Value) -> MapperResult<T> {
    value
        .as_record()
        .and_then(RecordRef::extract::<T>)
        .ok_or_else(|| MapperError::type_mismatch(record_type::<T>().name(), value.type_name()))
}
