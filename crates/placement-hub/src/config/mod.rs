use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::placement::recommendation::{MatchPolicy, RecommendationOrder};

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

/// Top-level configuration for the portal host.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub matching: MatchingConfig,
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

        let min_match_percent = match env::var("APP_MIN_MATCH_PERCENT") {
            Ok(raw) => parse_match_percent(&raw)?,
            Err(_) => MatchPolicy::DEFAULT_MIN_MATCH_PERCENT,
        };

        let order = match env::var("APP_RECOMMENDATION_ORDER") {
            Ok(raw) => parse_order(&raw)?,
            Err(_) => RecommendationOrder::CatalogOrder,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching: MatchingConfig {
                min_match_percent,
                order,
            },
        })
    }
}

fn parse_match_percent(raw: &str) -> Result<u8, ConfigError> {
    match raw.trim().parse::<u8>() {
        Ok(value) if (1..=100).contains(&value) => Ok(value),
        _ => Err(ConfigError::InvalidMatchPercent {
            value: raw.to_string(),
        }),
    }
}

fn parse_order(raw: &str) -> Result<RecommendationOrder, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "catalog" | "catalog_order" => Ok(RecommendationOrder::CatalogOrder),
        "ranked" => Ok(RecommendationOrder::Ranked),
        _ => Err(ConfigError::InvalidRecommendationOrder {
            value: raw.to_string(),
        }),
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

/// Recommendation threshold and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingConfig {
    pub min_match_percent: u8,
    pub order: RecommendationOrder,
}

impl MatchingConfig {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            min_match_percent: self.min_match_percent,
            order: self.order,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMatchPercent { value: String },
    InvalidRecommendationOrder { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMatchPercent { value } => write!(
                f,
                "APP_MIN_MATCH_PERCENT must be an integer between 1 and 100 (found '{value}')"
            ),
            ConfigError::InvalidRecommendationOrder { value } => write!(
                f,
                "APP_RECOMMENDATION_ORDER must be 'catalog' or 'ranked' (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMatchPercent { .. }
            | ConfigError::InvalidRecommendationOrder { .. } => None,
        }
    }
}
