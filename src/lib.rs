//! Typed, dotted-path access to hierarchical configuration documents.
//!
//! ```no_run
//! use confpath::ConfigParser;
//!
//! let config = ConfigParser::open("config.json")?;
//! let name = config.get_string("system.database.name")?;
//! # Ok::<(), confpath::ConfigError>(())
//! ```

pub mod config;

pub use bigdecimal::BigDecimal;
pub use config::{
    BoxError, ConfigError, ConfigParser, ConversionKind, ConversionRegistry, Converted,
    DocumentLoader, Handler, JsonLoader, TomlLoader, Value,
};
