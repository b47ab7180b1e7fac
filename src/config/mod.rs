//! Configuration loading, dotted-path lookup and value conversion.

mod convert;
mod error;
mod loader;
mod parser;
mod path;
mod value;

pub use convert::{ConversionKind, ConversionRegistry, Converted, Handler};
pub use error::{BoxError, ConfigError};
pub use loader::{DocumentLoader, JsonLoader, TomlLoader};
pub use parser::ConfigParser;
pub use value::Value;
