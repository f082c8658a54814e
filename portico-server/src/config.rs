//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;

/// Origins allowed to issue cross-origin requests when `ALLOWED_ORIGINS` is unset.
///
/// Local development UIs run against port 4000 and Apollo Studio is the
/// hosted GraphQL explorer, so both are trusted out of the box.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] =
    ["http://localhost:4000", "https://studio.apollographql.com"];

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 4000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Origins permitted by the cross-origin policy. Loaded once at startup
    /// and immutable for the process lifetime. An empty list denies every
    /// browser origin while still admitting origin-less clients.
    pub allowed_origins: Vec<String>,
    /// Key-value store connection string (default: local Redis)
    pub redis_url: String,
    /// Document store connection string (default: local MongoDB)
    pub mongodb_url: String,
    /// Request body limit in MB (default: 2)
    pub body_limit_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            host: [127, 0, 0, 1],
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            mongodb_url: "mongodb://127.0.0.1:27017".to_string(),
            body_limit_mb: 2,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        // Setting ALLOWED_ORIGINS to an empty string is a valid way to deny
        // every browser origin; only an unset variable falls back to defaults.
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|origins| parse_origins(&origins))
            .unwrap_or(defaults.allowed_origins);

        let redis_url = std::env::var("REDIS_URL").unwrap_or(defaults.redis_url);

        let mongodb_url = std::env::var("MONGODB_URL").unwrap_or(defaults.mongodb_url);

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.body_limit_mb);

        Self {
            port,
            host,
            allowed_origins,
            redis_url,
            mongodb_url,
            body_limit_mb,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

/// Split a comma-separated origin list, trimming whitespace and dropping
/// empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
