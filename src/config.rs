//! Application settings for the bias diagnostics service
//!
//! Settings are constructed once at startup from built-in defaults overlaid
//! with `BIASCOPE_`-prefixed environment variables, then passed by reference
//! to the components that need them. They are never mutated afterwards.

use crate::error::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Process-wide configuration, immutable after load
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path to the SQLite database file (":memory:" for ephemeral storage)
    pub database_url: String,
    /// Bind address for the HTTP server
    pub api_host: String,
    /// Bind port for the HTTP server
    pub api_port: u16,
    /// Comma-separated list of allowed CORS origins
    pub cors_origins: String,
    /// Lower bound for evaluation iteration counts
    pub min_iterations: u32,
    /// Upper bound for evaluation iteration counts
    pub max_iterations: u32,
    /// Expose internal error details in 500 responses
    pub debug: bool,
}

impl Settings {
    /// Load settings from defaults and the environment
    ///
    /// Environment variables use the `BIASCOPE_` prefix, e.g.
    /// `BIASCOPE_API_PORT=9000` or `BIASCOPE_DATABASE_URL=/var/lib/biascope.db`.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .set_default("database_url", "biascope.db")?
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 8000)?
            .set_default(
                "cors_origins",
                "http://localhost:3000,http://localhost:5173",
            )?
            .set_default("min_iterations", 10)?
            .set_default("max_iterations", 100)?
            .set_default("debug", false)?
            .add_source(Environment::with_prefix("BIASCOPE"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Split the comma-separated CORS origins into a list
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("default settings must be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api_port, 8000);
        assert_eq!(settings.min_iterations, 10);
        assert_eq!(settings.max_iterations, 100);
        assert!(!settings.debug);
    }

    #[test]
    fn test_cors_origins_list() {
        let settings = Settings {
            cors_origins: "http://a.example, http://b.example ,".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            settings.cors_origins_list(),
            vec!["http://a.example", "http://b.example"]
        );
    }
}
