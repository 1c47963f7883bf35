//! Configuration loaded from `SPESA_*` environment variables.
//!
//! Sensible defaults for local development, overridable in production.

use std::env;
use std::path::PathBuf;
use tracing::info;

fn is_production() -> bool {
    env::var("SPESA_ENV")
        .map(|v| {
            let v = v.to_lowercase();
            v == "production" || v == "prod"
        })
        .unwrap_or(false)
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    pub allowed_origins: Vec<String>,
    /// Max age for preflight cache (seconds)
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 86400,
        }
    }
}

impl CorsConfig {
    /// Load from environment, warning when production runs with permissive
    /// CORS.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("SPESA_CORS_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(val) = env::var("SPESA_CORS_MAX_AGE") {
            if let Ok(n) = val.parse() {
                config.max_age_seconds = n;
            }
        }

        if is_production() && config.allowed_origins.is_empty() {
            tracing::warn!(
                "PRODUCTION WARNING: CORS allows all origins. Set SPESA_CORS_ORIGINS for security."
            );
        }

        config
    }

    /// Convert to a tower-http CorsLayer
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowOrigin, Any, CorsLayer};

        let mut layer = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(std::time::Duration::from_secs(self.max_age_seconds));

        if self.allowed_origins.is_empty() {
            layer = layer.allow_origin(Any);
        } else {
            let mut valid = Vec::new();
            for origin in &self.allowed_origins {
                match origin.parse::<axum::http::HeaderValue>() {
                    Ok(v) => valid.push(v),
                    Err(_) => tracing::warn!("CORS: Invalid origin '{}' - skipping", origin),
                }
            }
            // Never fall back to permissive when all configured origins are
            // malformed; an empty list rejects all cross-origin requests.
            layer = layer.allow_origin(AllowOrigin::list(valid));
        }

        layer
    }
}

/// SMTP configuration for transactional email
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    /// Base URL used in email links
    pub app_url: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "noreply@spesa.local".to_string(),
            app_url: "http://localhost:3000".to_string(),
        }
    }
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("SPESA_SMTP_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("SPESA_SMTP_PORT") {
            if let Ok(n) = port.parse() {
                config.port = n;
            }
        }
        if let Ok(user) = env::var("SPESA_SMTP_USER") {
            config.username = user;
        }
        if let Ok(password) = env::var("SPESA_SMTP_PASSWORD") {
            config.password = password;
        }
        config.from = env::var("SPESA_SMTP_FROM").unwrap_or_else(|_| {
            if config.username.is_empty() {
                config.from.clone()
            } else {
                config.username.clone()
            }
        });
        if let Ok(url) = env::var("SPESA_APP_URL") {
            config.app_url = url;
        }

        config
    }

    /// Email sending is enabled only when credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Server configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host (default: 127.0.0.1)
    pub host: String,
    /// Bind port (default: 3001)
    pub port: u16,
    /// Base directory for all RocksDB stores
    pub storage_path: PathBuf,
    /// Session lifetime in days (default: 7, matching the session cookie)
    pub session_ttl_days: i64,
    /// When true, login requires a verified email address
    pub require_email_verification: bool,
    /// Maximum in-flight requests
    pub max_concurrent_requests: usize,
    pub cors: CorsConfig,
    pub smtp: SmtpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            storage_path: PathBuf::from("./spesa_data"),
            session_ttl_days: 7,
            require_email_verification: false,
            max_concurrent_requests: 256,
            cors: CorsConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("SPESA_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("SPESA_PORT") {
            if let Ok(n) = port.parse() {
                config.port = n;
            }
        }
        if let Ok(path) = env::var("SPESA_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Ok(days) = env::var("SPESA_SESSION_TTL_DAYS") {
            if let Ok(n) = days.parse() {
                config.session_ttl_days = n;
            }
        }
        if let Ok(val) = env::var("SPESA_REQUIRE_VERIFICATION") {
            config.require_email_verification = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = env::var("SPESA_MAX_CONCURRENT_REQUESTS") {
            if let Ok(n) = val.parse() {
                config.max_concurrent_requests = n;
            }
        }

        config.cors = CorsConfig::from_env();
        config.smtp = SmtpConfig::from_env();

        if is_production() && config.require_email_verification && !config.smtp.is_configured() {
            tracing::warn!(
                "Email verification is required but SMTP is not configured; \
                 new users will not receive their codes"
            );
        }

        info!(
            host = %config.host,
            port = config.port,
            storage_path = %config.storage_path.display(),
            smtp_configured = config.smtp.is_configured(),
            "Loaded server configuration"
        );

        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
