//! Application configuration loaded from environment variables.

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `DATABASE_URL`: Postgres connection string; unset selects the in-memory
///   store
/// - `JWT_SECRET`: HS256 signing secret; unset selects an insecure dev
///   default
///
/// The fallbacks for the two optional values are applied (and warned about)
/// in `main`, so tests can construct configs without touching the process
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: std::env::var("DATABASE_URL").ok(),
            jwt_secret: std::env::var("JWT_SECRET").ok(),
        }
    }

    /// The `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            jwt_secret: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_all_interfaces_on_8080() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.database_url.is_none());
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn addr_formats_host_and_port() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }
}
