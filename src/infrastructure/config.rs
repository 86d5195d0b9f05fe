use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::path::Path;

pub const MAX_WINDOW_LEN: usize = 10_000;
pub const MAX_TRACKED_ENTITIES: usize = 1_000;
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub server: ServerSettings,
    pub source: SourceSettings,
    pub window: WindowSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Stdin,
    File,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    #[serde(default)]
    pub path: Option<String>,
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindowSettings {
    pub max_len: usize,
    pub max_entities: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("source.kind = \"file\" requires source.path")]
    MissingSourcePath,

    #[error("telemetry file {path} is not readable: {source}")]
    UnreadableSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{key} = {value} exceeds the limit of {max}")]
    TooLarge {
        key: &'static str,
        value: usize,
        max: usize,
    },
}

fn check_range(key: &'static str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero(key));
    }
    if value > max {
        return Err(ConfigError::TooLarge { key, value, max });
    }
    Ok(())
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("window.max_len", self.window.max_len, MAX_WINDOW_LEN)?;
        check_range(
            "window.max_entities",
            self.window.max_entities,
            MAX_TRACKED_ENTITIES,
        )?;
        check_range(
            "source.channel_capacity",
            self.source.channel_capacity,
            MAX_CHANNEL_CAPACITY,
        )?;

        if self.source.kind == SourceKind::File {
            let path = self
                .source
                .path
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or(ConfigError::MissingSourcePath)?;
            std::fs::metadata(Path::new(path)).map_err(|source| ConfigError::UnreadableSource {
                path: path.to_string(),
                source,
            })?;
        }

        Ok(())
    }
}

/// Defaults, then `config/relay.*`, then `RELAY__SECTION__KEY` variables, then `PORT`.
pub fn load_relay_config() -> Result<RelayConfig, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config/relay").required(false))
        .add_source(
            config::Environment::with_prefix("RELAY")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("server.port", std::env::var("PORT").ok())?;

    build_relay_config(builder)
}

pub fn build_relay_config(
    builder: ConfigBuilder<DefaultState>,
) -> Result<RelayConfig, ConfigError> {
    let settings = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000_i64)?
        .set_default("source.kind", "http")?
        .set_default("source.channel_capacity", 1024_i64)?
        .set_default("window.max_len", 50_i64)?
        .set_default("window.max_entities", 5_i64)?
        .set_default("log.filter", "info")?
        .build()?;

    let relay: RelayConfig = settings.try_deserialize()?;
    relay.validate()?;
    Ok(relay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> Result<RelayConfig, ConfigError> {
        let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        build_relay_config(builder)
    }

    #[test]
    fn test_defaults() {
        let relay = from_toml("").unwrap();

        assert_eq!(relay.server.host, "0.0.0.0");
        assert_eq!(relay.server.port, 3000);
        assert_eq!(relay.source.kind, SourceKind::Http);
        assert_eq!(relay.source.channel_capacity, 1024);
        assert_eq!(relay.window.max_len, 50);
        assert_eq!(relay.window.max_entities, 5);
        assert_eq!(relay.log.filter, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let relay = from_toml(
            r#"
            [server]
            port = 8080

            [source]
            kind = "stdin"

            [window]
            max_len = 120
            "#,
        )
        .unwrap();

        assert_eq!(relay.server.port, 8080);
        assert_eq!(relay.source.kind, SourceKind::Stdin);
        assert_eq!(relay.window.max_len, 120);
        assert_eq!(relay.window.max_entities, 5);
    }

    #[test]
    fn test_file_source_requires_path() {
        let err = from_toml("[source]\nkind = \"file\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSourcePath));
    }

    #[test]
    fn test_file_source_must_exist() {
        let toml = "[source]\nkind = \"file\"\npath = \"/definitely/not/here.ndjson\"";
        let err = from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnreadableSource { .. }));
    }

    #[test]
    fn test_zero_capacities_are_fatal() {
        let err = from_toml("[window]\nmax_len = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Zero("window.max_len")));

        let err = from_toml("[window]\nmax_entities = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Zero("window.max_entities")));
    }

    #[test]
    fn test_oversized_capacities_are_fatal() {
        let err = from_toml("[window]\nmax_len = 1099511627776").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooLarge { key: "window.max_len", value: 1_099_511_627_776, .. }
        ));

        let err = from_toml("[window]\nmax_entities = 1000001").unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { key: "window.max_entities", .. }));

        let err = from_toml("[source]\nchannel_capacity = 4294967296").unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { key: "source.channel_capacity", .. }));
    }

    #[test]
    fn test_limits_themselves_are_accepted() {
        let relay = from_toml(&format!(
            "[window]\nmax_len = {}\nmax_entities = {}",
            MAX_WINDOW_LEN, MAX_TRACKED_ENTITIES
        ))
        .unwrap();

        assert_eq!(relay.window.max_len, MAX_WINDOW_LEN);
        assert_eq!(relay.window.max_entities, MAX_TRACKED_ENTITIES);
    }

    #[test]
    fn test_unknown_source_kind_fails_to_load() {
        let err = from_toml("[source]\nkind = \"kafka\"").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
