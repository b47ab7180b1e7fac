//! Document loaders that turn a file on disk into a [`Value`] tree.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::value::Value;
use super::ConfigError;

/// Produces the configuration tree for one source.
///
/// [`ConfigParser`](super::ConfigParser) calls [`load`](Self::load) exactly
/// once, while it is being constructed.
pub trait DocumentLoader: Send + Sync + std::fmt::Debug {
    /// Reads and parses the source. The root of the returned tree is always a mapping.
    fn load(&self) -> Result<Value, ConfigError>;

    /// The location this loader reads from.
    fn path(&self) -> &Path;
}

/// Loads a JSON document. This is the default loader.
#[derive(Debug, Clone)]
pub struct JsonLoader {
    path: PathBuf,
}

impl JsonLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DocumentLoader for JsonLoader {
    fn load(&self) -> Result<Value, ConfigError> {
        let reader = BufReader::new(open_config_file(&self.path)?);
        let json: serde_json::Value =
            serde_json::from_reader(reader).map_err(|e| ConfigError::JsonError {
                path: self.path.clone(),
                source: e,
            })?;
        expect_mapping(Value::from(json), &self.path)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Loads a TOML document.
#[derive(Debug, Clone)]
pub struct TomlLoader {
    path: PathBuf,
}

impl TomlLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DocumentLoader for TomlLoader {
    fn load(&self) -> Result<Value, ConfigError> {
        let mut contents = String::new();
        open_config_file(&self.path)?
            .read_to_string(&mut contents)
            .map_err(|e| ConfigError::ReadError {
                path: self.path.clone(),
                source: e,
            })?;
        let table: toml::Table = toml::from_str(&contents).map_err(|e| ConfigError::TomlError {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(Value::from(toml::Value::Table(table)))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Opens a config file, mapping a missing file to [`ConfigError::FileNotFound`].
///
/// The handle is owned by the caller's scope and closed when it returns,
/// whether or not parsing succeeded.
fn open_config_file(path: &Path) -> Result<File, ConfigError> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn expect_mapping(value: Value, path: &Path) -> Result<Value, ConfigError> {
    match value {
        Value::Mapping(_) => Ok(value),
        _ => Err(ConfigError::RootNotMapping(path.to_path_buf())),
    }
}
