use crate::scoring::{ScoringConfig, ScoringError};
use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let scoring = match env::var("SCORING_CONFIG") {
            Ok(path) if !path.trim().is_empty() => load_scoring_config(Path::new(path.trim()))?,
            _ => ScoringConfig::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring,
        })
    }
}

/// Reads a JSON scoring override. Omitted keys keep their defaults.
pub fn load_scoring_config(path: &Path) -> Result<ScoringConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ScoringFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ScoringConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::ScoringFormat {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate().map_err(ConfigError::Scoring)?;
    Ok(config)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    ScoringFile {
        path: PathBuf,
        source: std::io::Error,
    },
    ScoringFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    Scoring(ScoringError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::ScoringFile { path, .. } => {
                write!(f, "SCORING_CONFIG file {} could not be read", path.display())
            }
            ConfigError::ScoringFormat { path, source } => {
                write!(f, "SCORING_CONFIG file {} is not valid: {source}", path.display())
            }
            ConfigError::Scoring(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ScoringFile { source, .. } => Some(source),
            ConfigError::ScoringFormat { source, .. } => Some(source),
            ConfigError::Scoring(err) => Some(err),
        }
    }
}
