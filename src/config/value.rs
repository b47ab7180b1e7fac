//! The in-memory configuration tree.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Number;

/// A node of a loaded configuration document.
///
/// Every document format is normalized into this shape by its loader, so
/// lookups and conversions only ever deal with one representation. Numbers
/// keep their source text, so large or long literals are not rounded, and
/// mappings keep their document key order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Returns the child stored under `key` if this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns `true` for an explicit `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Generic truthiness: null, `false`, zero, and empty text or collections
    /// are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Mapping(map) => !map.is_empty(),
        }
    }

    /// Returns the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the entries of a mapping value, in document order.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

/// Strings render verbatim; everything else renders as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", serde_json::Value::from(other)),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            // JSON numbers cannot hold NaN or infinities
            toml::Value::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => Value::Mapping(
                table.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(i.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from(0i64).is_truthy());
        assert!(!Value::from(json!(0.0)).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(json!([])).is_truthy());
        assert!(!Value::from(json!({})).is_truthy());

        assert!(Value::from(true).is_truthy());
        assert!(Value::from(-3i64).is_truthy());
        assert!(Value::from("false").is_truthy());
        assert!(Value::from(json!([0])).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("plain text").to_string(), "plain text");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(json!(1.5)).to_string(), "1.5");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::from(json!({"b": [1, "x"], "a": null})).to_string(),
            r#"{"b":[1,"x"],"a":null}"#
        );
    }

    #[test]
    fn test_from_toml() {
        let table: toml::Table = toml::from_str(
            r#"
            name = "app"
            ratio = 0.25
            created = 1979-05-27T07:32:00Z

            [server]
            ports = [80, 443]
            "#,
        )
        .unwrap();
        let value = Value::from(toml::Value::Table(table));

        assert_eq!(value.get("name"), Some(&Value::from("app")));
        assert_eq!(value.get("ratio"), Some(&Value::from(json!(0.25))));
        assert_eq!(
            value.get("created"),
            Some(&Value::from("1979-05-27T07:32:00Z"))
        );
        let server = value.get("server").unwrap();
        assert_eq!(server.get("ports"), Some(&Value::from(json!([80, 443]))));
    }

    #[test]
    fn test_accessors() {
        let value = Value::from(json!({"zeta": "last", "alpha": null}));

        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(value.get("zeta").and_then(Value::as_str), Some("last"));
        assert!(value.get("alpha").unwrap().is_null());
        assert_eq!(Value::from(1i64).as_str(), None);
        assert_eq!(Value::from("x").as_mapping(), None);
    }

    #[test]
    fn test_toml_keeps_key_order() {
        let table: toml::Table = toml::from_str("zeta = 1\nalpha = 2\n").unwrap();
        let value = Value::from(toml::Value::Table(table));

        assert_eq!(value.to_string(), r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_get_on_non_mapping() {
        assert_eq!(Value::from("x").get("x"), None);
        assert_eq!(Value::from(json!([1])).get("0"), None);
    }
}
