//! Declarative helpers.

/// Implements [`Typed`](crate::Typed) and `Into<Value>` for a
/// [`Record`](crate::Record) type.
///
/// ```rust,ignore
/// impl Record for User { /* ... */ }
/// impl_typed_record!(User);
///
/// let user: User = mapper.to(value_map! { "username" => "johnd" })?;
/// ```
#[macro_export]
macro_rules! impl_typed_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Typed for $ty {
                fn value_type() -> $crate::ValueType {
                    $crate::typed::record_value_type::<$ty>()
                }

                fn into_value(self) -> $crate::Value {
                    $crate::Value::record(self)
                }

                fn from_value(value: $crate::Value) -> $crate::MapperResult<Self> {
                    $crate::typed::record_from_value::<$ty>(value)
                }
            }

            impl ::core::convert::From<$ty> for $crate::Value {
                fn from(record: $ty) -> Self {
                    $crate::Value::record(record)
                }
            }
        )+
    };
}

/// Implements [`Typed`](crate::Typed) and `Into<Value>` for an
/// [`Enumeration`](crate::Enumeration).
#[macro_export]
macro_rules! impl_typed_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Typed for $ty {
                fn value_type() -> $crate::ValueType {
                    $crate::typed::enum_value_type::<$ty>()
                }

                fn into_value(self) -> $crate::Value {
                    $crate::Value::enumeration(self)
                }

                fn from_value(value: $crate::Value) -> $crate::MapperResult<Self> {
                    $crate::typed::enum_from_value::<$ty>(value)
                }
            }

            impl ::core::convert::From<$ty> for $crate::Value {
                fn from(variant: $ty) -> Self {
                    $crate::Value::enumeration(variant)
                }
            }
        )+
    };
}

/// Builds a [`Value::Map`](crate::Value::Map) from `key => value` pairs.
///
/// ```rust,ignore
/// let payload = value_map! {
///     "username" => "johnd",
///     "since" => "1997",
/// };
/// ```
#[macro_export]
macro_rules! value_map {
    () => {
        $crate::Value::Map($crate::MapRef::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let map = $crate::MapRef::new();
        $(
            map.insert($key, $crate::Value::from($value));
        )+
        $crate::Value::Map(map)
    }};
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn value_map_preserves_order() {
        let value = value_map! { "b" => 1i64, "a" => "x" };
        let map = value.as_map().unwrap();
        assert_eq!(map.keys(), vec!["b", "a"]);
        assert_eq!(map.get("a"), Some(Value::text("x")));
    }

    #[test]
    fn empty_value_map() {
        let empty = value_map! {};
        assert!(empty.as_map().unwrap().is_empty());
    }
}
