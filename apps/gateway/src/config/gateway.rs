use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::{RuntimeEnv, ServiceUrls};
use crate::error::AppError;
use crate::rate_limit::{ClientKeySource, RateClass, RateLimitPolicy, RateLimitSettings};
use crate::state::security_config::SecurityConfig;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
/// Longest token lifetime `JWT_EXPIRATION` may ask for.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Everything the gateway reads from its environment, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub env: RuntimeEnv,
    pub security: SecurityConfig,
    pub services: ServiceUrls,
    /// Shared counter store; in-memory counters when absent
    pub redis_url: Option<String>,
    pub rate_limits: RateLimitSettings,
    pub client_key: ClientKeySource,
    pub downstream_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub expose_diagnostics: bool,
}

impl GatewayConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(security: SecurityConfig) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            env: RuntimeEnv::default(),
            security,
            services: ServiceUrls::default(),
            redis_url: None,
            rate_limits: RateLimitSettings::default(),
            client_key: ClientKeySource::default(),
            downstream_timeout: DEFAULT_DOWNSTREAM_TIMEOUT,
            cors_origins: Vec::new(),
            expose_diagnostics: false,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let secret = var("JWT_SECRET").ok_or_else(|| {
            AppError::config("Required environment variable 'JWT_SECRET' is not set")
        })?;
        let mut security = SecurityConfig::new(secret.into_bytes());
        if let Some(raw) = var("JWT_EXPIRATION") {
            let ttl = parse_ttl(&raw).ok_or_else(|| {
                AppError::config(format!("JWT_EXPIRATION is not a valid duration: '{raw}'"))
            })?;
            security = security.with_token_ttl(ttl);
        }

        let mut config = Self::new(security);

        if let Some(host) = var("GATEWAY_HOST") {
            config.host = host;
        }
        if let Some(port) = parsed::<u16>(&var, "GATEWAY_PORT")? {
            config.port = port;
        }
        if let Some(raw) = var("GATEWAY_ENV") {
            config.env = RuntimeEnv::parse(&raw).ok_or_else(|| {
                AppError::config(format!("GATEWAY_ENV has unknown value '{raw}'"))
            })?;
        }

        let defaults = ServiceUrls::default();
        config.services = ServiceUrls::new(
            var("USER_SERVICE_URL").unwrap_or(defaults.users),
            var("PRODUCT_SERVICE_URL").unwrap_or(defaults.products),
            var("ORDER_SERVICE_URL").unwrap_or(defaults.orders),
        );

        config.redis_url = var("REDIS_URL");

        for class in [RateClass::Api, RateClass::Auth, RateClass::Search] {
            let prefix = format!("RATE_LIMIT_{}", class.as_str().to_ascii_uppercase());
            let current = config.rate_limits.policy(class);
            let window = parsed::<u64>(&var, &format!("{prefix}_WINDOW_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(current.window);
            let max = parsed::<u64>(&var, &format!("{prefix}_MAX"))?
                .unwrap_or(current.max_requests);
            if window.is_zero() {
                return Err(AppError::config(format!(
                    "{prefix}_WINDOW_SECS must be greater than zero"
                )));
            }
            config
                .rate_limits
                .set(class, RateLimitPolicy::new(window, max));
        }

        if let Some(raw) = var("RATE_LIMIT_KEY") {
            config.client_key = ClientKeySource::parse(&raw).ok_or_else(|| {
                AppError::config(format!("RATE_LIMIT_KEY has unknown value '{raw}'"))
            })?;
        }

        if let Some(ms) = parsed::<u64>(&var, "DOWNSTREAM_TIMEOUT_MS")? {
            config.downstream_timeout = Duration::from_millis(ms.max(1));
        }

        config.cors_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        config.expose_diagnostics = var("EXPOSE_ERROR_DIAGNOSTICS")
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }

    /// Build from a fixed map; used by tests.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, AppError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    /// Error envelopes carry internal detail only outside production, and only on request.
    pub fn diagnostics_enabled(&self) -> bool {
        self.expose_diagnostics && !self.env.is_production()
    }
}

fn parsed<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    var(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                AppError::config(format!("{name} must be a non-negative integer, got '{raw}'"))
            })
        })
        .transpose()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}

/// Parse a token lifetime: bare seconds (`3600`) or a number with an
/// `s`, `m`, `h` or `d` suffix (`30m`, `24h`, `7d`). Zero and anything
/// above [`MAX_TOKEN_TTL`] are rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let amount: u64 = digits.trim().parse().ok()?;
    let secs = match unit {
        's' => amount,
        'm' => amount.checked_mul(60)?,
        'h' => amount.checked_mul(60 * 60)?,
        'd' => amount.checked_mul(24 * 60 * 60)?,
        _ => return None,
    };
    (secs > 0 && secs <= MAX_TOKEN_TTL.as_secs()).then(|| Duration::from_secs(secs))
}
