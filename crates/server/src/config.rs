//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET` - HS256 signing secret (min 32 chars, high entropy)
//! - `ZOHO_CLIENT_ID` - Zoho OAuth client ID
//! - `ZOHO_CLIENT_SECRET` - Zoho OAuth client secret
//! - `ZOHO_REFRESH_TOKEN` - Long-lived Zoho refresh token
//! - `ZOHO_ORGANIZATION_ID` - Zoho Inventory organization ID
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8000)
//! - `ZOHO_ACCOUNTS_URL` - OAuth host (default: <https://accounts.zoho.com>)
//! - `ZOHO_API_URL` - Inventory API base (default: <https://inventory.zoho.com/api/v1>)
//! - `ZOHO_PAGE_SIZE` - Records per page, 1..=200 (default: 200)
//! - `ZOHO_PAGE_DELAY_MS` - Pause between pages (default: 500)
//! - `SYNC_ENABLED` - Run the cron scheduler (default: true)
//! - `SYNC_COMMIT_MODE` - `strict` or `best_effort` (default: strict)
//! - `SYNC_SCHEDULE_<RESOURCE>` - 6-field cron expression or `off`
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origin list
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::sync::CommitMode;
use crate::zoho::resources::{self, ResourceDescriptor};

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const MAX_PAGE_SIZE: u32 = 200;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
pub const DEFAULT_API_URL: &str = "https://inventory.zoho.com/api/v1";

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "https://kool-portal.azurewebsites.net",
    "http://localhost:8000",
];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// JWT signing secret
    pub jwt_secret: SecretString,
    /// Zoho Inventory API configuration
    pub zoho: ZohoConfig,
    /// Scheduled sync configuration
    pub sync: SyncConfig,
    /// Origins allowed by the CORS layer
    pub cors_allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Zoho Inventory API configuration.
///
/// Implements `Debug` manually to redact the OAuth credentials.
#[derive(Clone)]
pub struct ZohoConfig {
    /// OAuth host, without trailing slash
    pub accounts_url: String,
    /// Inventory API base, without trailing slash
    pub api_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
    pub organization_id: String,
    /// Records requested per page (at most 200)
    pub page_size: u32,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
    /// Retry policy for the token exchange
    pub token_retry: RetryPolicy,
}

impl std::fmt::Debug for ZohoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZohoConfig")
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("organization_id", &self.organization_id)
            .field("page_size", &self.page_size)
            .field("page_delay", &self.page_delay)
            .field("token_retry", &self.token_retry)
            .finish()
    }
}

/// Bounded retry with a fixed delay, applied to connect/timeout failures only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retry.
    pub const NONE: Self = Self {
        attempts: 1,
        delay: Duration::ZERO,
    };

    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Scheduled sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Whether the cron scheduler runs at all
    pub enabled: bool,
    /// How a batch write is committed
    pub commit_mode: CommitMode,
    /// One entry per enabled resource
    pub schedules: Vec<JobSchedule>,
}

/// A resource paired with its cron schedule.
#[derive(Debug, Clone)]
pub struct JobSchedule {
    pub resource: &'static ResourceDescriptor,
    pub schedule: cron::Schedule,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let zoho = ZohoConfig::from_env()?;
        let sync = SyncConfig::from_env()?;
        let cors_allowed_origins = parse_origins(get_optional_env("CORS_ALLOWED_ORIGINS"));

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            zoho,
            sync,
            cors_allowed_origins,
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
}

impl ZohoConfig {
    /// Load the Zoho section only.
    ///
    /// The CLI uses this directly, since one-shot syncs need no JWT secret.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a credential is missing or a URL/number is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let accounts_url = get_base_url("ZOHO_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL)?;
        let api_url = get_base_url("ZOHO_API_URL", DEFAULT_API_URL)?;

        let page_size = get_env_or_default("ZOHO_PAGE_SIZE", "200")
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar("ZOHO_PAGE_SIZE".to_string(), e.to_string()))?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "ZOHO_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let page_delay_ms = get_env_or_default("ZOHO_PAGE_DELAY_MS", "500")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ZOHO_PAGE_DELAY_MS".to_string(), e.to_string())
            })?;

        Ok(Self {
            accounts_url,
            api_url,
            client_id: get_required_env("ZOHO_CLIENT_ID")?,
            client_secret: get_required_secret("ZOHO_CLIENT_SECRET")?,
            refresh_token: get_required_secret("ZOHO_REFRESH_TOKEN")?,
            organization_id: get_required_env("ZOHO_ORGANIZATION_ID")?,
            page_size,
            page_delay: Duration::from_millis(page_delay_ms),
            token_retry: RetryPolicy::new(3, Duration::from_secs(5)),
        })
    }
}

impl SyncConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let enabled = parse_bool("SYNC_ENABLED", &get_env_or_default("SYNC_ENABLED", "true"))?;
        let commit_mode = get_env_or_default("SYNC_COMMIT_MODE", "strict")
            .parse::<CommitMode>()
            .map_err(|e| ConfigError::InvalidEnvVar("SYNC_COMMIT_MODE".to_string(), e))?;

        let mut schedules = Vec::with_capacity(resources::ALL.len());
        for resource in resources::ALL {
            let key = schedule_env_key(resource);
            let expr = get_env_or_default(&key, resource.default_schedule);
            if let Some(schedule) = parse_schedule(&key, &expr)? {
                schedules.push(JobSchedule { resource, schedule });
            }
        }

        Ok(Self {
            enabled,
            commit_mode,
            schedules,
        })
    }
}

/// Environment key holding the cron expression for a resource.
#[must_use]
pub fn schedule_env_key(resource: &ResourceDescriptor) -> String {
    format!("SYNC_SCHEDULE_{}", resource.name.to_uppercase())
}

/// Parse a cron expression; `off` disables the job.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the expression does not parse.
pub fn parse_schedule(key: &str, expr: &str) -> Result<Option<cron::Schedule>, ConfigError> {
    let expr = expr.trim();
    if expr.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    cron::Schedule::from_str(expr)
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_origins(raw: Option<String>) -> Vec<String> {
    match raw {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => DEFAULT_CORS_ORIGINS.iter().map(|s| (*s).to_string()).collect(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an absolute http(s) URL, normalized without a trailing slash.
fn get_base_url(key: &str, default: &str) -> Result<String, ConfigError> {
    let raw = get_env_or_default(key, default);
    let parsed = url::Url::parse(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn zoho_config() -> ZohoConfig {
        ZohoConfig {
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            client_id: "1000.ABCDEF".to_string(),
            client_secret: SecretString::from("zoho_client_secret_value"),
            refresh_token: SecretString::from("1000.refresh.token.value"),
            organization_id: "812345678".to_string(),
            page_size: 200,
            page_delay: Duration::from_millis(500),
            token_retry: RetryPolicy::new(3, Duration::from_secs(5)),
        }
    }

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        let err = validate_secret_strength("your-jwt-key-goes-here", "JWT_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "JWT_SECRET").is_err());
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        let err = validate_secret_strength(&"ab".repeat(20), "JWT_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("k".repeat(32)), "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_zoho_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", zoho_config());

        assert!(debug_output.contains("1000.ABCDEF"));
        assert!(debug_output.contains("812345678"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("zoho_client_secret_value"));
        assert!(!debug_output.contains("1000.refresh.token.value"));
    }

    #[test]
    fn test_parse_schedule() {
        assert!(parse_schedule("K", "off").unwrap().is_none());
        assert!(parse_schedule("K", " OFF ").unwrap().is_none());
        assert!(parse_schedule("K", "0 */15 * * * *").unwrap().is_some());
        assert!(matches!(
            parse_schedule("K", "every tuesday"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_default_schedules_parse() {
        for resource in resources::ALL {
            let key = schedule_env_key(resource);
            assert!(
                parse_schedule(&key, resource.default_schedule)
                    .unwrap()
                    .is_some(),
                "{key} default should parse"
            );
        }
    }

    #[test]
    fn test_schedule_env_key() {
        assert_eq!(
            schedule_env_key(&resources::SALES_ORDERS),
            "SYNC_SCHEDULE_SALES_ORDERS"
        );
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins(None).len(), 3);
        assert_eq!(
            parse_origins(Some("https://a.example, ,https://b.example".to_string())),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/kool_data_hub"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            jwt_secret: SecretString::from("k".repeat(32)),
            zoho: zoho_config(),
            sync: SyncConfig {
                enabled: false,
                commit_mode: CommitMode::Strict,
                schedules: Vec::new(),
            },
            cors_allowed_origins: parse_origins(None),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }
}
