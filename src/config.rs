/// Application configuration
///
/// Values are layered: command line, then environment (both through clap),
/// then an optional TOML file, then compiled defaults.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::state::session::{SessionSettings, DEFAULT_ADVANCE_DELAY, DEFAULT_PREFIX};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Command-line arguments for vin-tagger
#[derive(Parser, Debug, Default)]
#[command(name = "vin-tagger")]
#[command(about = "Tag vehicle photos with the last 6 characters of their VIN")]
#[command(version)]
pub struct Args {
    /// Base URL of the tagging backend
    #[arg(short, long, env = "VIN_TAGGER_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Pause after a successful save before moving to the next image (ms)
    #[arg(long, env = "VIN_TAGGER_ADVANCE_DELAY_MS")]
    pub advance_delay_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, env = "VIN_TAGGER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Rename prefix shown in success messages
    #[arg(long)]
    pub prefix: Option<String>,

    /// Config file (defaults to <config dir>/vin-tagger/config.toml)
    #[arg(short, long, env = "VIN_TAGGER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// On-disk config. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub advance_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub rename_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub advance_delay: Duration,
    pub request_timeout: Duration,
    pub rename_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            request_timeout: DEFAULT_TIMEOUT,
            rename_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Resolve the effective configuration for `args`.
    ///
    /// A missing default config file is fine; a missing file named with
    /// `--config` is an error.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_file(&path)?,
                _ => FileConfig::default(),
            },
        };
        Ok(Self::merge(args, file))
    }

    pub fn merge(args: &Args, file: FileConfig) -> Self {
        let defaults = Self::default();

        let backend_url = args
            .backend_url
            .clone()
            .or(file.backend_url)
            .unwrap_or(defaults.backend_url);
        let advance_delay = args
            .advance_delay_ms
            .or(file.advance_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.advance_delay);
        let request_timeout = args
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let rename_prefix = args
            .prefix
            .clone()
            .or(file.rename_prefix)
            .unwrap_or(defaults.rename_prefix);

        Self {
            backend_url,
            advance_delay,
            request_timeout,
            rename_prefix,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            advance_delay: self.advance_delay,
            rename_prefix: self.rename_prefix.clone(),
        }
    }
}

/// Read and parse a TOML config file
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// `<config dir>/vin-tagger/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vin-tagger").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::merge(&Args::default(), FileConfig::default());
        assert_eq!(config, Config::default());
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.advance_delay, Duration::from_millis(500));
        assert_eq!(config.rename_prefix, "VIN-B1024-");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = config_file(
            r#"
backend_url = "http://tagger.local:9000"
advance_delay_ms = 0
"#,
        );
        let args = Args::parse_from(["vin-tagger", "--config", file.path().to_str().unwrap()]);
        let config = Config::resolve(&args).unwrap();

        assert_eq!(config.backend_url, "http://tagger.local:9000");
        assert_eq!(config.advance_delay, Duration::ZERO);
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = config_file("backend_url = \"http://from-file\"\ntimeout_secs = 3\n");
        let args = Args::parse_from([
            "vin-tagger",
            "--backend-url",
            "http://from-cli",
            "--config",
            file.path().to_str().unwrap(),
        ]);
        let config = Config::resolve(&args).unwrap();

        assert_eq!(config.backend_url, "http://from-cli");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            config: Some(dir.path().join("absent.toml")),
            ..Args::default()
        };
        assert!(matches!(Config::resolve(&args), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let file = config_file("advance_delay_ms = \"soon\"");
        assert!(matches!(
            load_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_session_settings() {
        let config = Config {
            advance_delay: Duration::from_millis(250),
            rename_prefix: "VIN-X-".to_string(),
            ..Config::default()
        };
        let settings = config.session_settings();
        assert_eq!(settings.advance_delay, Duration::from_millis(250));
        assert_eq!(settings.rename_prefix, "VIN-X-");
    }
}
