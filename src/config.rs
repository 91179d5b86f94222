//! TOML configuration for cartlog.
//!
//! Layered model: compiled-in defaults, optionally replaced by a TOML file
//! (explicit path, `CARTLOG_CONFIG`, or `./cartlog.toml`), with CLI/env flags
//! applied on top by `main`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::history::record::{TimeFormat, DEFAULT_TIME_FORMAT};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CARTLOG_CONFIG";

/// Config file picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "cartlog.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartlogConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub board: BoardConfig,
    pub logging: LoggingConfig,
    /// strftime pattern for the `time` field of new records.
    pub time_format: String,
}

impl Default for CartlogConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            board: BoardConfig::default(),
            logging: LoggingConfig::default(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl CartlogConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration in order:
    /// 1. `explicit`, when given.
    /// 2. The file named by `CARTLOG_CONFIG`.
    /// 3. `./cartlog.toml`, if it exists.
    /// 4. Compiled-in defaults.
    ///
    /// A file that is named but unreadable is an error, not a silent fallback.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, ConfigSource::File(path.to_path_buf())));
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            let config = Self::load(&path).with_context(|| format!("{CONFIG_ENV} is set"))?;
            return Ok((config, ConfigSource::File(path)));
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok((Self::load(local)?, ConfigSource::File(local.to_path_buf())));
        }

        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Reject settings that would fail later at request time.
    pub fn validate(&self) -> Result<()> {
        self.time_format()?;
        self.board.validate()?;
        if self.storage.file_name.trim().is_empty() {
            bail!("storage.file_name must not be empty");
        }
        Ok(())
    }

    pub fn time_format(&self) -> Result<TimeFormat> {
        Ok(TimeFormat::new(self.time_format.clone())?)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `0.0.0.0` or `127.0.0.1`.
    pub host: String,
    pub port: u16,
    /// Directory served for static assets (scripts, stylesheets).
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("invalid server.host: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the history file.
    pub persistent_dir: PathBuf,
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persistent_dir: PathBuf::from("."),
            file_name: "history.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn history_path(&self) -> PathBuf {
        self.persistent_dir.join(&self.file_name)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub cart_count: usize,
    /// Carts are named `<prefix> 1` .. `<prefix> <cart_count>`.
    pub cart_prefix: String,
    pub status_options: Vec<String>,
    /// Status every cart starts in. Must be one of `status_options`.
    pub default_status: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cart_count: 40,
            cart_prefix: "Cart".to_string(),
            status_options: [
                "Charging",
                "Ready for Walk up",
                "Being used by Guest",
                "Out of Service",
                "Other",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            default_status: "Ready for Walk up".to_string(),
        }
    }
}

impl BoardConfig {
    pub fn cart_names(&self) -> Vec<String> {
        (1..=self.cart_count)
            .map(|i| format!("{} {}", self.cart_prefix, i))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.status_options.is_empty() {
            bail!("board.status_options must not be empty");
        }
        if !self.status_options.contains(&self.default_status) {
            bail!(
                "board.default_status {:?} is not one of board.status_options",
                self.default_status
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = CartlogConfig::default();

        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.static_dir, PathBuf::from("static"));
        assert_eq!(cfg.storage.history_path(), PathBuf::from("./history.json"));
        assert_eq!(cfg.board.cart_names().len(), 40);
        assert_eq!(cfg.board.status_options.len(), 5);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
        assert!(cfg.validate().is_ok());
        assert_eq!(
            cfg.server.socket_addr().unwrap(),
            "0.0.0.0:3000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_parse_example_toml() {
        let toml_str = r#"
time_format = "%I:%M:%S %p"

[server]
host = "127.0.0.1"
port = 8088
static_dir = "/srv/cartlog/static"

[storage]
persistent_dir = "/var/lib/cartlog"

[board]
cart_count = 12
cart_prefix = "SunCart"
status_options = ["Charging", "Ready", "Out of Service"]
default_status = "Ready"

[logging]
level = "debug"
json = true
"#;

        let cfg: CartlogConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.validate().is_ok());

        assert_eq!(cfg.server.socket_addr().unwrap().port(), 8088);
        assert_eq!(
            cfg.storage.history_path(),
            PathBuf::from("/var/lib/cartlog/history.json")
        );
        assert_eq!(cfg.board.cart_names()[11], "SunCart 12");
        assert_eq!(cfg.time_format().unwrap().as_str(), "%I:%M:%S %p");
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: CartlogConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.board.cart_count, 40);
        assert_eq!(cfg.time_format, DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut cfg = CartlogConfig::default();
        cfg.board.default_status = "Parked".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = CartlogConfig::default();
        cfg.time_format = "%Q".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = CartlogConfig::default();
        cfg.server.host = "localhost:80".to_string();
        assert!(cfg.server.socket_addr().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cartlog.toml");
        std::fs::write(&path, "[storage]\nfile_name = \"carts.json\"\n").unwrap();

        let (cfg, source) = CartlogConfig::resolve(Some(&path)).unwrap();
        assert_eq!(source, ConfigSource::File(path.clone()));
        assert_eq!(cfg.storage.file_name, "carts.json");

        assert!(CartlogConfig::resolve(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
