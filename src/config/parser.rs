use std::path::{Path, PathBuf};

use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;

use super::convert::{ConversionKind, ConversionRegistry, Converted, Handler};
use super::error::BoxError;
use super::loader::{DocumentLoader, JsonLoader};
use super::path::resolve;
use super::value::Value;
use super::ConfigError;

/// Dotted-path access to a loaded configuration document.
///
/// The document is loaded once, when the parser is constructed, and never
/// modified afterwards. Values are looked up with paths such as
/// `system.database.port` and can optionally be passed through a conversion
/// handler from the parser's [`ConversionRegistry`].
///
/// A path resolves to nothing when any segment is missing, when it would have
/// to descend into something other than a mapping, or when the value found is
/// `null`. Present values are returned as-is even when they are falsy, so
/// `false`, `0` and `""` are never replaced by a default.
///
/// ## Example
///
/// ```no_run
/// use confpath::ConfigParser;
///
/// let config = ConfigParser::open("config/app.json")?;
///
/// let port = config.get_int("system.database.port")?.unwrap_or(5432);
/// let debug = config.get_bool("system.debug")?.unwrap_or(false);
/// # Ok::<(), confpath::ConfigError>(())
/// ```
///
/// ## Custom conversions
///
/// ```
/// use confpath::{ConfigParser, Converted, Value};
/// use serde_json::json;
///
/// let mut config = ConfigParser::from_tree(Value::from(json!({"a": {"b": "hi"}})));
/// config.register_handler("upper", |value: &Value| {
///     Ok(Converted::String(value.to_string().to_uppercase()))
/// });
///
/// assert_eq!(
///     config.get_converted("a.b", "upper")?,
///     Some(Converted::String("HI".into()))
/// );
/// # Ok::<(), confpath::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct ConfigParser {
    source: Option<PathBuf>,
    tree: Value,
    registry: ConversionRegistry,
}

impl ConfigParser {
    /// Loads a JSON document from `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::new(path, JsonLoader::new)
    }

    /// Loads the document at `path` with the loader built by `factory`.
    ///
    /// ```no_run
    /// use confpath::{ConfigParser, TomlLoader};
    ///
    /// let config = ConfigParser::new("config/app.toml", TomlLoader::new)?;
    /// # Ok::<(), confpath::ConfigError>(())
    /// ```
    pub fn new<L, F>(path: impl AsRef<Path>, factory: F) -> Result<Self, ConfigError>
    where
        L: DocumentLoader,
        F: FnOnce(PathBuf) -> L,
    {
        let loader = factory(path.as_ref().to_path_buf());
        let tree = loader.load()?;
        tracing::debug!(path = %loader.path().display(), ?loader, "loaded configuration");

        Ok(Self {
            source: Some(loader.path().to_path_buf()),
            tree,
            registry: ConversionRegistry::new(),
        })
    }

    /// Wraps an already-built tree.
    pub fn from_tree(tree: Value) -> Self {
        Self {
            source: None,
            tree,
            registry: ConversionRegistry::new(),
        }
    }

    /// The location the document was loaded from, if it came from a loader.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The root of the loaded document.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// The conversion handlers available to [`get_converted`](Self::get_converted).
    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    /// Registers a conversion handler, replacing (with a warning) any handler
    /// already registered under the same kind.
    pub fn register_handler<F>(&mut self, kind: impl Into<ConversionKind>, handler: F)
    where
        F: Fn(&Value) -> Result<Converted, BoxError> + Send + Sync + 'static,
    {
        self.registry.register(kind, handler);
    }

    /// Registers a shared [`Handler`], e.g. to alias an existing kind.
    ///
    /// ```
    /// use confpath::{ConfigParser, ConversionKind, Converted, Value};
    /// use serde_json::json;
    ///
    /// let mut config = ConfigParser::from_tree(Value::from(json!({"port": "8080"})));
    /// let integer = config.handler_for(&ConversionKind::Integer)?.clone();
    /// config.register_shared_handler("port", integer);
    ///
    /// assert_eq!(config.get_converted("port", "port")?, Some(Converted::Int(8080)));
    /// # Ok::<(), confpath::ConfigError>(())
    /// ```
    pub fn register_shared_handler(&mut self, kind: impl Into<ConversionKind>, handler: Handler) {
        self.registry.register_shared(kind, handler);
    }

    /// Returns the handler registered for `kind`, failing with
    /// [`ConfigError::UnknownConversionKind`] if there is none.
    pub fn handler_for(&self, kind: &ConversionKind) -> Result<&Handler, ConfigError> {
        self.registry.handler_for(kind)
    }

    /// Returns `true` if `path` resolves to a value.
    pub fn has_param(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns the value at `path`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        resolve(&self.tree, path).filter(|value| !value.is_null())
    }

    /// Returns the value at `path`, or `default` if it does not resolve.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Resolves `path` and converts the value with the handler for `kind`.
    ///
    /// Returns `Ok(None)` without consulting the registry when the path does
    /// not resolve. Fails with [`ConfigError::UnknownConversionKind`] if no
    /// handler is registered for `kind`, and with
    /// [`ConfigError::ConversionTypeError`] if the handler rejects the value.
    pub fn get_converted(
        &self,
        path: &str,
        kind: impl Into<ConversionKind>,
    ) -> Result<Option<Converted>, ConfigError> {
        let kind = kind.into().normalize();
        let Some(value) = self.get(path) else {
            return Ok(None);
        };

        let handler = self.handler_for(&kind)?;
        handler(value)
            .map(Some)
            .map_err(|source| ConfigError::ConversionTypeError { kind, source })
    }

    /// Like [`get_converted`](Self::get_converted), with `default` in place of `None`.
    pub fn get_converted_or(
        &self,
        path: &str,
        kind: impl Into<ConversionKind>,
        default: Converted,
    ) -> Result<Converted, ConfigError> {
        Ok(self.get_converted(path, kind)?.unwrap_or(default))
    }

    /// Converts the value at `path` with the `Integer` handler.
    pub fn get_int(&self, path: &str) -> Result<Option<i64>, ConfigError> {
        self.get_typed(path, ConversionKind::Integer, |converted| match converted {
            Converted::Int(i) => Ok(i),
            other => Err(other),
        })
    }

    /// Converts the value at `path` with the `Decimal` handler. Numbers are
    /// taken from their document text, so no precision is lost.
    pub fn get_decimal(&self, path: &str) -> Result<Option<BigDecimal>, ConfigError> {
        self.get_typed(path, ConversionKind::Decimal, |converted| match converted {
            Converted::Decimal(d) => Ok(d),
            other => Err(other),
        })
    }

    /// Converts with the `Bool` handler: the text `"true"`/`"false"` (in any
    /// case) maps to the matching boolean, anything else by truthiness.
    pub fn get_bool(&self, path: &str) -> Result<Option<bool>, ConfigError> {
        self.get_typed(path, ConversionKind::Bool, |converted| match converted {
            Converted::Bool(b) => Ok(b),
            other => Err(other),
        })
    }

    /// Converts the value at `path` with the `String` handler. Strings come
    /// back verbatim, other values as compact JSON.
    pub fn get_string(&self, path: &str) -> Result<Option<String>, ConfigError> {
        self.get_typed(path, ConversionKind::String, |converted| match converted {
            Converted::String(s) => Ok(s),
            other => Err(other),
        })
    }

    /// Deserializes the subtree at `path` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        self.get(path)
            .map(|value| {
                serde_json::from_value(serde_json::Value::from(value)).map_err(|source| {
                    ConfigError::DeserializeError {
                        path: path.to_string(),
                        source,
                    }
                })
            })
            .transpose()
    }

    /// Runs a built-in kind and unwraps its output, which an overriding
    /// handler may have replaced with a different variant.
    fn get_typed<T>(
        &self,
        path: &str,
        kind: ConversionKind,
        extract: fn(Converted) -> Result<T, Converted>,
    ) -> Result<Option<T>, ConfigError> {
        let Some(converted) = self.get_converted(path, kind.clone())? else {
            return Ok(None);
        };

        extract(converted).map(Some).map_err(|other| {
            ConfigError::ConversionTypeError {
                source: format!("handler for '{kind}' produced a {} value", other.type_name())
                    .into(),
                kind,
            }
        })
    }
}
