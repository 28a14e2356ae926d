use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub web: WebConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// JSON file holding every reservation record.
    pub data_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebConfig {
    /// Directory of static assets served outside `/api`. Disabled when unset.
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

pub const DEFAULT_LOG_FILTER: &str =
    "agenda_api=debug,agenda_core=debug,agenda_store=debug,tower_http=debug";

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("storage.data_file", "data/agendamentos.json")?
            .set_default("log.filter", DEFAULT_LOG_FILTER)?
            // Every file layer is optional so the binary runs with built-in defaults
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `AGENDA__SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("AGENDA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_files() {
        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.data_file, PathBuf::from("data/agendamentos.json"));
        assert!(config.web.static_dir.is_none());
        assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
    }
}
