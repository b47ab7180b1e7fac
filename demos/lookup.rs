use confpath::{ConfigParser, Converted, Value};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Database {
    host: String,
    port: String,
}

fn main() -> Result<(), confpath::ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = ConfigParser::open("demos/config.json")?;

    let port = config.get_int("system.database.port")?.unwrap_or(5432);
    let debug = config.get_bool("system.debug")?.unwrap_or(true);
    let timeout = config.get_decimal("system.database.pool_timeout")?;
    let replicas = config.get_int("system.database.replicas")?.unwrap_or(1);

    println!("port={port} debug={debug} replicas={replicas}");
    if let Some(timeout) = timeout {
        println!("pool timeout: {timeout}s");
    }

    let database: Option<Database> = config.get_as("system.database")?;
    println!("database: {database:?}");

    config.register_handler("upper", |value: &Value| {
        Ok(Converted::String(value.to_string().to_uppercase()))
    });
    if let Some(name) = config.get_converted("system.name", "upper")? {
        println!("name: {name}");
    }

    Ok(())
}
