use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::rules::compiler::DuplicatePolicy;
use crate::session::SessionContext;

const DEFAULT_COMPANY_ID: u64 = 44;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

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
    pub rule_engine: RuleEngineConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            rule_engine: RuleEngineConfig::from_env()?,
        })
    }
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

/// Connection and session settings for the remote rule engine.
#[derive(Debug, Clone)]
pub struct RuleEngineConfig {
    /// Base URL of the rule engine API; `None` runs the service against in-memory adapters.
    pub base_url: Option<String>,
    pub access_token: String,
    pub loyalty_type_id: String,
    pub company_id: u64,
    pub timeout: Duration,
    pub duplicate_policy: DuplicatePolicy,
}

impl RuleEngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("RULE_ENGINE_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let company_id = match env::var("RULE_ENGINE_COMPANY_ID") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidCompanyId)?,
            Err(_) => DEFAULT_COMPANY_ID,
        };

        let timeout_secs = match env::var("RULE_ENGINE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let duplicate_policy = match env::var("RULE_DUPLICATE_POLICY") {
            Ok(raw) => DuplicatePolicy::parse(&raw)
                .ok_or(ConfigError::InvalidDuplicatePolicy { value: raw })?,
            Err(_) => DuplicatePolicy::default(),
        };

        Ok(Self {
            base_url,
            access_token: env::var("RULE_ENGINE_ACCESS_TOKEN").unwrap_or_default(),
            loyalty_type_id: env::var("RULE_ENGINE_LOYALTY_TYPE_ID").unwrap_or_default(),
            company_id,
            timeout: Duration::from_secs(timeout_secs),
            duplicate_policy,
        })
    }

    pub fn session(&self) -> SessionContext {
        SessionContext {
            access_token: self.access_token.clone(),
            loyalty_type_id: self.loyalty_type_id.clone(),
            company_id: self.company_id,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCompanyId,
    InvalidTimeout,
    InvalidDuplicatePolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCompanyId => {
                write!(f, "RULE_ENGINE_COMPANY_ID must be a positive integer")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "RULE_ENGINE_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidDuplicatePolicy { value } => write!(
                f,
                "RULE_DUPLICATE_POLICY '{value}' must be compare_value or condition_signature"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
