//! Bridge between [`Value`] and [`serde_json::Value`].

use serde_json::{Map as JsonMap, Number, Value as Json};

use super::{ListRef, MapRef, Value};

/// Containers nested deeper than this render as `null`, so that
/// self-containing maps still print.
const MAX_RENDER_DEPTH: usize = 64;

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => number_to_value(&n),
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::List(items.into_iter().map(Value::from).collect::<ListRef>()),
            Json::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<MapRef>(),
            ),
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::I64(i)
    } else if let Some(u) = n.as_u64() {
        Value::U64(u)
    } else {
        n.as_f64().map_or(Value::Null, Value::F64)
    }
}

impl Value {
    /// Converts to a [`serde_json::Value`].
    ///
    /// Decimals, temporal values and chars become strings, enums their
    /// member name, and records an object of their readable properties.
    /// Non-finite floats become `null`.
    pub fn to_json(&self) -> Json {
        to_json_at(self, 0)
    }
}

fn to_json_at(value: &Value, depth: usize) -> Json {
    if depth > MAX_RENDER_DEPTH {
        return Json::Null;
    }
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::I8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::U8(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::U64(v) => Json::from(*v),
        Value::F32(v) => Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
        Value::F64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Char(_)
        | Value::Decimal(_)
        | Value::Text(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::Timestamp(_)
        | Value::Enum(_) => Json::String(value.to_string()),
        Value::List(list) => Json::Array(
            list.items()
                .iter()
                .map(|item| to_json_at(item, depth + 1))
                .collect(),
        ),
        Value::Map(map) => Json::Object(
            map.entries()
                .iter()
                .map(|(k, v)| (k.clone(), to_json_at(v, depth + 1)))
                .collect::<JsonMap<_, _>>(),
        ),
        Value::Record(record) => {
            let mut object = JsonMap::new();
            for name in record.record_type().readable_names() {
                match record.read_property(&name) {
                    Ok(Some(v)) => {
                        object.insert(name, to_json_at(&v, depth + 1));
                    }
                    Ok(None) => {}
                    Err(error) => tracing::warn!(
                        record = record.record_type().name(),
                        property = %name,
                        %error,
                        "skipping unreadable property in JSON output"
                    ),
                }
            }
            Json::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{Record, RecordBuilder, record_type};
    use crate::value::RecordRef;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_numbers_pick_narrowest_variant() {
        assert_eq!(Value::from(json!(-3)), Value::I64(-3));
        assert_eq!(Value::from(json!(u64::MAX)), Value::U64(u64::MAX));
        assert_eq!(Value::from(json!(1.5)), Value::F64(1.5));
    }

    #[test]
    fn objects_keep_key_order() {
        let value = Value::from(json!({"b": 1, "a": [true, null]}));
        let map = value.as_map().expect("map");
        assert_eq!(map.keys(), vec!["b".to_owned(), "a".to_owned()]);
        assert_eq!(value.to_json(), json!({"b": 1, "a": [true, null]}));
    }

    #[test]
    fn self_containing_map_renders() {
        let map = MapRef::new();
        map.insert("self", Value::Map(map.clone()));
        let rendered = Value::Map(map).to_string();
        assert!(rendered.starts_with(r#"{"self":{"self":"#));
    }

    #[test]
    fn non_finite_float_is_null() {
        assert_eq!(Value::F64(f64::NAN).to_json(), Json::Null);
    }

    #[derive(Debug, Clone, Default)]
    struct Tag {
        label: String,
    }

    impl Record for Tag {
        fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
            builder
                .default_constructor()
                .field("label", |t| &t.label, |t| &mut t.label)
        }
    }

    #[test]
    fn records_render_readable_properties() {
        let tag = RecordRef::new(Tag {
            label: "red".to_owned(),
        });
        assert_eq!(Value::Record(tag).to_json(), json!({"label": "red"}));
    }

    #[test]
    fn failing_reader_is_skipped() {
        let mismatched = RecordRef::from_parts(record_type::<Tag>(), Box::new(7u8));
        assert_eq!(Value::Record(mismatched).to_json(), json!({}));
    }
}
