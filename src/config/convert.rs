//! Conversion of raw tree values into typed values.
//!
//! A [`ConversionRegistry`] maps a [`ConversionKind`] to a [`Handler`]. Every
//! registry starts with handlers for the four built-in kinds; callers may
//! override them or add their own kinds at runtime.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde_json::Number;

use super::error::BoxError;
use super::value::Value;
use super::ConfigError;

/// Identifies a conversion handler in a [`ConversionRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Integer,
    Decimal,
    Bool,
    String,
    /// A caller-defined kind, registered with [`ConversionRegistry::register`].
    Custom(String),
}

impl ConversionKind {
    /// Returns the kind named `name`.
    ///
    /// The built-in names `integer`, `decimal`, `bool` and `string` map to
    /// their own variants; every other name is a [`Custom`](Self::Custom) kind.
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "integer" => ConversionKind::Integer,
            "decimal" => ConversionKind::Decimal,
            "bool" => ConversionKind::Bool,
            "string" => ConversionKind::String,
            _ => ConversionKind::Custom(name),
        }
    }

    /// Folds a `Custom` kind spelled like a built-in into that built-in.
    pub(crate) fn normalize(self) -> Self {
        match self {
            ConversionKind::Custom(name) => ConversionKind::custom(name),
            builtin => builtin,
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionKind::Integer => f.write_str("integer"),
            ConversionKind::Decimal => f.write_str("decimal"),
            ConversionKind::Bool => f.write_str("bool"),
            ConversionKind::String => f.write_str("string"),
            ConversionKind::Custom(name) => f.write_str(name),
        }
    }
}

impl FromStr for ConversionKind {
    type Err = std::convert::Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(ConversionKind::custom(name))
    }
}

impl From<&str> for ConversionKind {
    fn from(name: &str) -> Self {
        ConversionKind::custom(name)
    }
}

impl From<String> for ConversionKind {
    fn from(name: String) -> Self {
        ConversionKind::custom(name)
    }
}

/// The typed result of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Int(i64),
    Decimal(BigDecimal),
    Bool(bool),
    String(String),
    /// Escape hatch for custom handlers that reshape the tree itself.
    Value(Value),
}

impl Converted {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Converted::Int(_) => "integer",
            Converted::Decimal(_) => "decimal",
            Converted::Bool(_) => "bool",
            Converted::String(_) => "string",
            Converted::Value(_) => "value",
        }
    }
}

impl fmt::Display for Converted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converted::Int(i) => write!(f, "{i}"),
            Converted::Decimal(d) => write!(f, "{d}"),
            Converted::Bool(b) => write!(f, "{b}"),
            Converted::String(s) => f.write_str(s),
            Converted::Value(v) => write!(f, "{v}"),
        }
    }
}

/// A conversion function from a raw tree value to a typed value.
pub type Handler = Arc<dyn Fn(&Value) -> Result<Converted, BoxError> + Send + Sync>;

/// Table of conversion handlers keyed by kind.
#[derive(Clone)]
pub struct ConversionRegistry {
    handlers: HashMap<ConversionKind, Handler>,
}

impl ConversionRegistry {
    /// Creates a registry holding only the built-in handlers.
    pub fn new() -> Self {
        let mut handlers: HashMap<ConversionKind, Handler> = HashMap::new();
        handlers.insert(ConversionKind::Integer, Arc::new(to_integer));
        handlers.insert(ConversionKind::Decimal, Arc::new(to_decimal));
        handlers.insert(ConversionKind::Bool, Arc::new(to_bool));
        handlers.insert(ConversionKind::String, Arc::new(to_string));
        Self { handlers }
    }

    /// Registers `handler` under `kind`.
    ///
    /// An existing handler for the same kind is replaced and a warning is logged.
    pub fn register<F>(&mut self, kind: impl Into<ConversionKind>, handler: F)
    where
        F: Fn(&Value) -> Result<Converted, BoxError> + Send + Sync + 'static,
    {
        self.register_shared(kind, Arc::new(handler));
    }

    /// Registers an already shared handler, such as one obtained from
    /// [`handler_for`](Self::handler_for), under `kind`.
    pub fn register_shared(&mut self, kind: impl Into<ConversionKind>, handler: Handler) {
        let kind = kind.into().normalize();
        if self.handlers.contains_key(&kind) {
            tracing::warn!(%kind, "conversion handler already registered, overwriting");
        }
        self.handlers.insert(kind, handler);
    }

    /// Returns the handler registered for `kind`.
    pub fn handler_for(&self, kind: &ConversionKind) -> Result<&Handler, ConfigError> {
        let kind = kind.clone().normalize();
        self.handlers
            .get(&kind)
            .ok_or(ConfigError::UnknownConversionKind(kind))
    }

    /// Iterates over the registered kinds, in no particular order.
    pub fn kinds(&self) -> impl Iterator<Item = &ConversionKind> {
        self.handlers.keys()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

fn to_integer(value: &Value) -> Result<Converted, BoxError> {
    let int = match value {
        Value::String(s) => s.trim().parse::<i64>()?,
        Value::Number(n) => number_to_integer(n)?,
        Value::Bool(b) => i64::from(*b),
        other => return Err(unsupported(other, "integer")),
    };
    Ok(Converted::Int(int))
}

/// Integral numbers convert exactly; fractional ones truncate toward zero.
fn number_to_integer(n: &Number) -> Result<i64, BoxError> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    match n.as_f64() {
        Some(f) if !n.is_u64() && f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        _ => Err(format!("{n} is out of range for a 64-bit integer").into()),
    }
}

fn to_decimal(value: &Value) -> Result<Converted, BoxError> {
    let decimal = match value {
        Value::String(s) => BigDecimal::from_str(s.trim())?,
        Value::Number(n) => BigDecimal::from_str(&n.to_string())?,
        Value::Bool(b) => BigDecimal::from(i64::from(*b)),
        other => return Err(unsupported(other, "decimal")),
    };
    Ok(Converted::Decimal(decimal))
}

fn to_bool(value: &Value) -> Result<Converted, BoxError> {
    let flag = match value {
        Value::String(s) if s.eq_ignore_ascii_case("true") => true,
        Value::String(s) if s.eq_ignore_ascii_case("false") => false,
        other => other.is_truthy(),
    };
    Ok(Converted::Bool(flag))
}

fn to_string(value: &Value) -> Result<Converted, BoxError> {
    Ok(Converted::String(value.to_string()))
}

fn unsupported(value: &Value, target: &str) -> BoxError {
    format!("cannot convert a {} to {target}", value.type_name()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn convert(kind: ConversionKind, value: impl Into<Value>) -> Result<Converted, BoxError> {
        let registry = ConversionRegistry::new();
        let handler = registry.handler_for(&kind).unwrap();
        handler(&value.into())
    }

    #[test]
    fn test_integer_handler() {
        assert_eq!(
            convert(ConversionKind::Integer, "5432").unwrap(),
            Converted::Int(5432)
        );
        assert_eq!(
            convert(ConversionKind::Integer, " -17 ").unwrap(),
            Converted::Int(-17)
        );
        assert_eq!(
            convert(ConversionKind::Integer, 12i64).unwrap(),
            Converted::Int(12)
        );
        assert_eq!(
            convert(ConversionKind::Integer, json!(3.9)).unwrap(),
            Converted::Int(3)
        );
        assert_eq!(
            convert(ConversionKind::Integer, true).unwrap(),
            Converted::Int(1)
        );
    }

    #[test]
    fn test_integer_handler_rejects_non_numeric() {
        assert!(convert(ConversionKind::Integer, "abc").is_err());
        assert!(convert(ConversionKind::Integer, "1.5").is_err());
        assert!(convert(ConversionKind::Integer, json!({"a": 1})).is_err());
        assert!(convert(ConversionKind::Integer, json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_decimal_handler() {
        let expected = BigDecimal::from_str("19.99").unwrap();
        assert_eq!(
            convert(ConversionKind::Decimal, "19.99").unwrap(),
            Converted::Decimal(expected.clone())
        );
        assert_eq!(
            convert(ConversionKind::Decimal, json!(19.99)).unwrap(),
            Converted::Decimal(expected)
        );
        assert_eq!(
            convert(ConversionKind::Decimal, "123456789012345678901234567890.5").unwrap(),
            Converted::Decimal(BigDecimal::from_str("123456789012345678901234567890.5").unwrap())
        );
        assert!(convert(ConversionKind::Decimal, "twelve").is_err());
        assert!(convert(ConversionKind::Decimal, json!([1])).is_err());
    }

    #[test]
    fn test_bool_handler() {
        assert_eq!(
            convert(ConversionKind::Bool, "false").unwrap(),
            Converted::Bool(false)
        );
        assert_eq!(
            convert(ConversionKind::Bool, "TRUE").unwrap(),
            Converted::Bool(true)
        );
        assert_eq!(
            convert(ConversionKind::Bool, "yes").unwrap(),
            Converted::Bool(true)
        );
        assert_eq!(
            convert(ConversionKind::Bool, "").unwrap(),
            Converted::Bool(false)
        );
        assert_eq!(
            convert(ConversionKind::Bool, 0i64).unwrap(),
            Converted::Bool(false)
        );
        assert_eq!(
            convert(ConversionKind::Bool, false).unwrap(),
            Converted::Bool(false)
        );
    }

    #[test]
    fn test_string_handler() {
        assert_eq!(
            convert(ConversionKind::String, 8080i64).unwrap(),
            Converted::String("8080".into())
        );
        assert_eq!(
            convert(ConversionKind::String, json!(["a", 1])).unwrap(),
            Converted::String(r#"["a",1]"#.into())
        );
    }

    #[test]
    fn test_decimal_keeps_full_precision() {
        let tree: serde_json::Value = serde_json::from_str(
            r#"{"big": 123456789012345678901234567890, "pi": 3.14159265358979323846264}"#,
        )
        .unwrap();
        let tree = Value::from(tree);

        assert_eq!(
            convert(ConversionKind::Decimal, tree.get("big").unwrap().clone()).unwrap(),
            Converted::Decimal(BigDecimal::from_str("123456789012345678901234567890").unwrap())
        );
        assert_eq!(
            convert(ConversionKind::Decimal, tree.get("pi").unwrap().clone()).unwrap(),
            Converted::Decimal(BigDecimal::from_str("3.14159265358979323846264").unwrap())
        );

        let err = convert(ConversionKind::Integer, tree.get("big").unwrap().clone()).unwrap_err();
        assert!(err
            .to_string()
            .contains("123456789012345678901234567890 is out of range"));
    }

    #[test]
    fn test_builtin_names_map_to_builtin_kinds() {
        assert_eq!(ConversionKind::from("integer"), ConversionKind::Integer);
        assert_eq!(ConversionKind::from("decimal".to_string()), ConversionKind::Decimal);
        assert_eq!("bool".parse::<ConversionKind>().unwrap(), ConversionKind::Bool);
        assert_eq!(ConversionKind::custom("string"), ConversionKind::String);
        assert_eq!(
            ConversionKind::from("upper"),
            ConversionKind::Custom("upper".into())
        );

        let registry = ConversionRegistry::new();
        assert!(registry
            .handler_for(&ConversionKind::Custom("integer".into()))
            .is_ok());
    }

    #[test]
    #[traced_test]
    fn test_register_builtin_by_name_overwrites() {
        let mut registry = ConversionRegistry::new();
        registry.register("integer", |_: &Value| Ok(Converted::Int(-1)));

        assert_eq!(registry.kinds().count(), 4);
        let handler = registry.handler_for(&ConversionKind::Integer).unwrap();
        assert_eq!(handler(&Value::from("5")).unwrap(), Converted::Int(-1));
        assert!(logs_contain("overwriting"));
    }

    #[test]
    fn test_register_shared_alias() {
        let mut registry = ConversionRegistry::new();
        let handler = Arc::clone(registry.handler_for(&ConversionKind::Integer).unwrap());
        registry.register_shared("port", handler);

        let alias = registry.handler_for(&"port".into()).unwrap();
        assert_eq!(alias(&Value::from("8080")).unwrap(), Converted::Int(8080));
    }

    #[test]
    fn test_unknown_kind() {
        let registry = ConversionRegistry::new();
        let result = registry.handler_for(&ConversionKind::custom("upper"));

        assert!(matches!(
            result,
            Err(ConfigError::UnknownConversionKind(ConversionKind::Custom(ref name))) if name == "upper"
        ));
    }

    #[test]
    fn test_register_custom_kind() {
        let mut registry = ConversionRegistry::new();
        registry.register("upper", |value: &Value| {
            Ok(Converted::String(value.to_string().to_uppercase()))
        });

        let handler = registry.handler_for(&"upper".into()).unwrap();
        assert_eq!(
            handler(&Value::from("hi")).unwrap(),
            Converted::String("HI".into())
        );
        assert_eq!(registry.kinds().count(), 5);
    }

    #[test]
    #[traced_test]
    fn test_register_overwrite_warns_once() {
        let mut registry = ConversionRegistry::new();
        registry.register(ConversionKind::Integer, |_: &Value| Ok(Converted::Int(-1)));

        let handler = registry.handler_for(&ConversionKind::Integer).unwrap();
        assert_eq!(handler(&Value::from("5")).unwrap(), Converted::Int(-1));
        logs_assert(|lines: &[&str]| {
            let warnings = lines
                .iter()
                .filter(|line| line.contains("WARN") && line.contains("overwriting"))
                .count();
            match warnings {
                1 => Ok(()),
                n => Err(format!("expected one overwrite warning, found {n}")),
            }
        });
    }

    #[test]
    #[traced_test]
    fn test_register_new_kind_does_not_warn() {
        let mut registry = ConversionRegistry::new();
        registry.register("noop", |v: &Value| Ok(Converted::Value(v.clone())));

        assert!(!logs_contain("overwriting"));
    }
}
