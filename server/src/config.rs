//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables, falling back to
//! development-friendly defaults.

use std::env;
use std::time::Duration;

use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "default-secret-key";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// HS256 key shared with the identity service that issues dashboard tokens
    pub jwt_secret: String,

    /// Lifetime of tokens issued by this service, in seconds
    pub jwt_expires_secs: u64,

    /// Origins allowed to call the dashboard API from a browser
    pub frontend_origins: Vec<String>,

    /// Externally reachable base URL, used when rendering embed snippets
    pub public_base_url: String,

    /// Bound on a single outbound webhook request in milliseconds
    pub webhook_timeout_ms: u64,

    /// Gemini API key; sentiment analysis is disabled when unset
    pub gemini_api_key: Option<String>,

    /// Gemini model used for sentiment classification
    pub gemini_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expires_secs: 7 * 24 * 60 * 60,
            frontend_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            public_base_url: "http://localhost:8080".to_string(),
            webhook_timeout_ms: 10_000,
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let port = parse_number("PORT", defaults.port);

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        Config {
            port,

            jwt_secret,

            jwt_expires_secs: parse_number("JWT_EXPIRES_SECS", defaults.jwt_expires_secs),

            frontend_origins: parse_csv("FRONTEND_ORIGINS").unwrap_or(defaults.frontend_origins),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            webhook_timeout_ms: parse_number("WEBHOOK_TIMEOUT_MS", defaults.webhook_timeout_ms),

            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),

            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
        }
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.webhook_timeout_ms)
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// Parse a numeric variable, warning and falling back on garbage.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid number, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
