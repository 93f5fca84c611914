//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `REPLATE_HOST` - Bind address (default: 127.0.0.1)
//! - `REPLATE_PORT` - Listen port (default: 3000)
//! - `REPLATE_BASE_URL` - Public URL, decides Secure cookies (default: <http://localhost:3000>)
//! - `REPLATE_SIMULATED_LATENCY_MS` - Simulated round trip for submissions (default: 1500)
//! - `REPLATE_SEED_DEMO` - Seed the in-memory backend with demo data (default: true)
//! - `REPLATE_RETRY_ATTEMPTS` - Attempts per backend call (default: 3)
//! - `REPLATE_RETRY_BASE_MS` - First retry delay, doubled per attempt (default: 200)
//! - `REPLATE_MAX_PORTALS` - Client portals kept in memory at once (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::services::task::{RetryPolicy, TaskSettings};

const DEFAULT_LATENCY_MS: u64 = 1500;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 200;
const DEFAULT_MAX_PORTALS: u64 = 10_000;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Delay applied before each submission reaches the backend
    pub simulated_latency: Duration,
    /// Whether the in-memory backend starts with the demo dataset
    pub seed_demo: bool,
    /// Retry policy for backend calls
    pub retry: RetryPolicy,
    /// Upper bound on client portals held in memory
    pub max_portals: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            simulated_latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            seed_demo: true,
            retry: RetryPolicy::new(
                DEFAULT_RETRY_ATTEMPTS,
                Duration::from_millis(DEFAULT_RETRY_BASE_MS),
                RETRY_MAX_DELAY,
            ),
            max_portals: DEFAULT_MAX_PORTALS,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let env = Env(lookup);

        let host = env.parse_or("REPLATE_HOST", defaults.host)?;
        let port = env.parse_or("REPLATE_PORT", defaults.port)?;
        let base_url = env
            .get("REPLATE_BASE_URL")
            .unwrap_or(defaults.base_url);
        let latency_ms = env.parse_or("REPLATE_SIMULATED_LATENCY_MS", DEFAULT_LATENCY_MS)?;
        let seed_demo = env.bool_or("REPLATE_SEED_DEMO", defaults.seed_demo)?;

        let attempts = env.parse_or("REPLATE_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?;
        if attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "REPLATE_RETRY_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let retry_base_ms = env.parse_or("REPLATE_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)?;
        let max_portals = env.parse_or("REPLATE_MAX_PORTALS", defaults.max_portals)?;

        let sentry_dsn = env.get("SENTRY_DSN").filter(|dsn| !dsn.is_empty());
        let sentry_environment = env.get("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.sentry_sample_rate);
        let sentry_traces_sample_rate = env
            .get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.sentry_traces_sample_rate);

        Ok(Self {
            host,
            port,
            base_url,
            simulated_latency: Duration::from_millis(latency_ms),
            seed_demo,
            retry: RetryPolicy::new(
                attempts,
                Duration::from_millis(retry_base_ms),
                RETRY_MAX_DELAY,
            ),
            max_portals,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the portal is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Timing applied to simulated round trips and backend calls.
    #[must_use]
    pub const fn task_settings(&self) -> TaskSettings {
        TaskSettings {
            latency: self.simulated_latency,
            retry: self.retry,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Parse a variable, falling back to `default` when it is unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}
