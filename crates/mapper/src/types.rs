//! Type descriptors.
//!
//! A [`ValueType`] names the target of a conversion. Scalars and containers
//! are built in; enumerations and records are nominal types identified by
//! their Rust [`TypeId`]. Subtyping is explicit:
//!
//! ```text
//! Any
//! ├── Number ── i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 decimal
//! ├── Mapping ── Map
//! ├── Sequence ── List ── ListOf(T)
//! ├── bool char text date datetime timestamp
//! ├── Enum(E)
//! └── Record(R) ── Record(child extending R) ...
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::meta::RecordType;
use crate::value::{EnumValue, Value};

// ============================================================================
// VALUE TYPE
// ============================================================================

/// Descriptor of a conversion target (and of a value's runtime type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Supertype of every type.
    Any,
    /// Supertype of every numeric type.
    Number,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Arbitrary-precision decimal.
    Decimal,
    Text,
    /// Calendar date without a time zone.
    Date,
    /// Local date-time without a time zone.
    DateTime,
    /// Absolute instant in UTC.
    Timestamp,
    /// Any mapping; canonically implemented by [`ValueType::Map`].
    Mapping,
    /// Insertion-ordered `String -> Value` map.
    Map,
    /// Any ordered sequence; canonically implemented by [`ValueType::List`].
    Sequence,
    /// Growable list with untyped elements.
    List,
    /// Growable list whose elements are converted to the given type.
    ListOf(Arc<ValueType>),
    Enum(EnumType),
    Record(RecordType),
}

impl ValueType {
    /// Creates a `ListOf` descriptor.
    pub fn list_of(element: ValueType) -> Self {
        Self::ListOf(Arc::new(element))
    }

    /// Numeric types in declaration order.
    pub const NUMERIC: [ValueType; 11] = [
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::Decimal,
    ];

    /// Whether this is a concrete numeric type.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::F32
                | Self::F64
                | Self::Decimal
        )
    }

    /// Whether this is a capability rather than an instantiable type.
    pub const fn is_abstract(&self) -> bool {
        matches!(self, Self::Any | Self::Number | Self::Mapping | Self::Sequence)
    }

    /// Canonical concrete implementation of an abstract capability.
    ///
    /// `Any` and `Number` have none; instantiating them fails later.
    pub fn canonical_impl(&self) -> Option<ValueType> {
        match self {
            Self::Mapping => Some(Self::Map),
            Self::Sequence => Some(Self::List),
            _ => None,
        }
    }

    /// Zero value of a primitive type.
    pub fn zero_value(&self) -> Option<Value> {
        let zero = match self {
            Self::Bool => Value::Bool(false),
            Self::Char => Value::Char('\0'),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            _ => return None,
        };
        Some(zero)
    }

    /// Returns `true` when a value of type `other` can be used where `self`
    /// is expected (`self` is `other` or one of its supertypes).
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        if self == other {
            return true;
        }
        match self {
            Self::Any => true,
            Self::Number => other.is_numeric(),
            Self::Mapping => matches!(other, Self::Map),
            Self::Sequence => matches!(other, Self::List | Self::ListOf(_)),
            Self::List => matches!(other, Self::ListOf(_)),
            Self::Record(parent) => match other {
                Self::Record(child) => child.extends(parent),
                _ => false,
            },
            _ => false,
        }
    }

    /// Depth in the type hierarchy; larger means more specific.
    pub fn specificity(&self) -> usize {
        match self {
            Self::Any => 0,
            Self::Number | Self::Mapping | Self::Sequence => 1,
            Self::Map | Self::List => 2,
            Self::ListOf(_) => 3,
            Self::Record(record) => 1 + record.ancestry_depth(),
            t if t.is_numeric() => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Mapping => "mapping",
            Self::Map => "map",
            Self::Sequence => "sequence",
            Self::List => "list",
            Self::ListOf(element) => return write!(f, "list<{element}>"),
            Self::Enum(e) => e.name(),
            Self::Record(r) => r.name(),
        };
        f.write_str(name)
    }
}

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// A Rust enum whose variants can be mapped to and from their names.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Role { Visitor, Admin }
///
/// impl Enumeration for Role {
///     fn variants() -> &'static [Self] { &[Role::Visitor, Role::Admin] }
///     fn name(self) -> &'static str {
///         match self { Role::Visitor => "visitor", Role::Admin => "admin" }
///     }
/// }
/// ```
pub trait Enumeration: Copy + PartialEq + Send + Sync + 'static {
    /// Every variant, in ordinal order.
    fn variants() -> &'static [Self];

    /// Member name used for textual conversion.
    fn name(self) -> &'static str;

    /// Type name used in diagnostics.
    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }
}

/// Descriptor of an enumeration type.
///
/// Equality and hashing use the Rust type identity only.
#[derive(Clone)]
pub struct EnumType(Arc<EnumMeta>);

struct EnumMeta {
    name: &'static str,
    type_id: TypeId,
    members: Vec<&'static str>,
}

impl EnumType {
    /// Builds the descriptor for `E`. Prefer [`crate::meta::enum_type`],
    /// which caches it.
    pub(crate) fn build<E: Enumeration>() -> Self {
        Self(Arc::new(EnumMeta {
            name: E::type_name(),
            type_id: TypeId::of::<E>(),
            members: E::variants().iter().map(|v| v.name()).collect(),
        }))
    }

    /// Enum type name.
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Rust type identity.
    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    /// Member names in ordinal order.
    pub fn members(&self) -> &[&'static str] {
        &self.0.members
    }

    /// Looks up a member by exact name.
    pub fn member(&self, name: &str) -> Option<EnumValue> {
        self.0
            .members
            .iter()
            .position(|m| *m == name)
            .map(|ordinal| EnumValue::new(self.clone(), ordinal))
    }

    /// Member name at `ordinal`.
    pub fn member_name(&self, ordinal: usize) -> Option<&'static str> {
        self.0.members.get(ordinal).copied()
    }
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_id == other.0.type_id
    }
}

impl Eq for EnumType {}

impl Hash for EnumType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.type_id.hash(state);
    }
}

impl fmt::Debug for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumType")
            .field("name", &self.0.name)
            .field("members", &self.0.members)
            .finish()
    }
}

/// Last path segment of `std::any::type_name`, e.g. `User` for
/// `my_app::model::User`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    impl Enumeration for Color {
        fn variants() -> &'static [Self] {
            &[Color::Red, Color::Green]
        }

        fn name(self) -> &'static str {
            match self {
                Color::Red => "red",
                Color::Green => "green",
            }
        }
    }

    #[test]
    fn number_is_supertype_of_numerics_only() {
        for numeric in &ValueType::NUMERIC {
            assert!(ValueType::Number.is_assignable_from(numeric));
            assert!(ValueType::Any.is_assignable_from(numeric));
        }
        assert!(!ValueType::Number.is_assignable_from(&ValueType::Text));
        assert!(!ValueType::I64.is_assignable_from(&ValueType::Number));
    }

    #[test]
    fn containers_follow_capabilities() {
        assert!(ValueType::Mapping.is_assignable_from(&ValueType::Map));
        assert!(ValueType::Sequence.is_assignable_from(&ValueType::list_of(ValueType::I64)));
        assert!(ValueType::List.is_assignable_from(&ValueType::list_of(ValueType::Text)));
        assert!(!ValueType::list_of(ValueType::I64).is_assignable_from(&ValueType::List));
        assert_eq!(ValueType::Mapping.canonical_impl(), Some(ValueType::Map));
        assert_eq!(ValueType::Sequence.canonical_impl(), Some(ValueType::List));
        assert_eq!(ValueType::Any.canonical_impl(), None);
        assert!(ValueType::Number.is_abstract());
        assert!(ValueType::Sequence.is_abstract());
        assert!(!ValueType::Map.is_abstract());
        assert!(!ValueType::list_of(ValueType::Any).is_abstract());
    }

    #[test]
    fn specificity_orders_hierarchy() {
        assert!(ValueType::Any.specificity() < ValueType::Number.specificity());
        assert!(ValueType::Number.specificity() < ValueType::I64.specificity());
        assert!(ValueType::List.specificity() < ValueType::list_of(ValueType::I8).specificity());
    }

    #[test]
    fn primitives_have_zero_values() {
        assert_eq!(ValueType::I32.zero_value(), Some(Value::I32(0)));
        assert_eq!(ValueType::Bool.zero_value(), Some(Value::Bool(false)));
        assert_eq!(ValueType::Text.zero_value(), None);
        assert_eq!(ValueType::Decimal.zero_value(), None);
        assert_eq!(ValueType::Char.zero_value(), Some(Value::Char('\0')));
    }

    #[test]
    fn enum_type_identity_and_members() {
        let a = EnumType::build::<Color>();
        let b = EnumType::build::<Color>();
        assert_eq!(a, b);
        assert_eq!(a.name(), "Color");
        assert_eq!(a.members(), &["red", "green"]);
        assert_eq!(a.member("green").map(|m| m.ordinal()), Some(1));
        assert!(a.member("Green").is_none());
    }

    #[test]
    fn display_names() {
        assert_eq!(ValueType::list_of(ValueType::I64).to_string(), "list<i64>");
        assert_eq!(ValueType::DateTime.to_string(), "datetime");
    }

    #[test]
    fn short_names_strip_paths_and_generics() {
        assert_eq!(short_type_name::<Color>(), "Color");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }
}
