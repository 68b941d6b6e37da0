//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` but can be given with the `-f` flag or the `CATALOG_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Sources are merged in this order (later sources override earlier ones):
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`)
//! 2. **Environment variables** - variables prefixed with `CATALOG_` override YAML values
//! 3. **DATABASE_URI** - special case: overrides `database.url` if set
//!
//! Nested values use double underscores, e.g. `CATALOG_DATABASE__POOL__MAX_CONNECTIONS=5`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use catalog::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! CATALOG_PORT=9000
//! DATABASE_URI="sqlite:///var/lib/catalog/catalog.db"
//! CATALOG_ENABLE_METRICS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CATALOG_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables; every field has a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URI` environment variable; folded into `database.url` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_uri: Option<String>,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    /// Expose Prometheus metrics at `/internal/metrics`
    pub enable_metrics: bool,
    /// Export traces over OTLP (configured through the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
}

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://catalog.db` or `sqlite::memory:`
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://catalog.db".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool parameters passed to SQLx.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600, // 10 minutes
        }
    }
}

impl PoolSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
///
/// The admin UI is served from the same origin as the API, so no origins are allowed by default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: false,
            max_age: Some(3600), // Cache preflight for 1 hour
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://admin.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_uri: None,
            database: DatabaseConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URI wins over the file and CATALOG_DATABASE__URL, keeping pool settings
        if let Some(url) = config.database_uri.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let url = self.database.url.trim();
        if url.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database.url is empty. Set it in the config file or through DATABASE_URI."
                    .to_string(),
            });
        }
        if !url.starts_with("sqlite:") {
            return Err(Error::Internal {
                operation: format!("Config validation: database.url must be a sqlite URL, got '{url}'"),
            });
        }

        if self.database.pool.max_connections == 0 {
            return Err(Error::Internal {
                operation: "Config validation: database.pool.max_connections must be at least 1".to_string(),
            });
        }
        if self.database.pool.min_connections > self.database.pool.max_connections {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: database.pool.min_connections ({}) cannot be greater than max_connections ({})",
                    self.database.pool.min_connections, self.database.pool.max_connections
                ),
            });
        }

        if self.cors.allow_credentials && self.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
            return Err(Error::Internal {
                operation: "Config validation: cors.allow_credentials cannot be combined with a wildcard origin".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // CATALOG_CONFIG names the file itself, so it is not a config key
            .merge(Env::prefixed("CATALOG_").ignore(&["config"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URI"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 8080);
            assert_eq!(config.database.url, "sqlite://catalog.db");
            assert_eq!(config.database.pool.max_connections, 5);
            assert!(!config.enable_metrics);
            assert!(config.cors.allowed_origins.is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_yaml_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 127.0.0.1
port: 9000
enable_metrics: true
database:
  url: sqlite://data/products.db
  pool:
    max_connections: 2
cors:
  allowed_origins:
    - https://admin.example.com
  max_age: 60
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.bind_address(), "127.0.0.1:9000");
            assert!(config.enable_metrics);
            assert_eq!(config.database.url, "sqlite://data/products.db");
            assert_eq!(config.database.pool.max_connections, 2);
            // unspecified pool values keep their defaults
            assert_eq!(config.database.pool.acquire_timeout_secs, 30);
            assert_eq!(
                config.cors.allowed_origins,
                vec![CorsOrigin::Url(Url::parse("https://admin.example.com").unwrap())]
            );
            assert_eq!(config.cors.max_age, Some(60));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 9000\n")?;

            jail.set_env("CATALOG_HOST", "127.0.0.1");
            jail.set_env("CATALOG_PORT", "8081");
            jail.set_env("CATALOG_DATABASE__POOL__MAX_CONNECTIONS", "3");
            jail.set_env("CATALOG_CONFIG", "test.yaml");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8081);
            assert_eq!(config.database.pool.max_connections, 3);

            Ok(())
        });
    }

    #[test]
    fn test_database_uri_overrides_url() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
database:
  url: sqlite://from-file.db
  pool:
    max_connections: 7
"#,
            )?;
            jail.set_env("CATALOG_DATABASE__URL", "sqlite://from-prefixed-env.db");
            jail.set_env("DATABASE_URI", "sqlite://from-database-uri.db");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.database.url, "sqlite://from-database-uri.db");
            assert_eq!(config.database.pool.max_connections, 7);
            assert!(config.database_uri.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "colour: blue\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_wildcard_origin_parses() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
cors:
  allowed_origins: ["*"]
"#,
            )?;
            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.cors.allowed_origins, vec![CorsOrigin::Wildcard]);
            Ok(())
        });
    }

    #[test]
    fn test_config_validation_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_database_url() {
        let mut config = Config::default();
        config.database.url = "  ".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("database.url is empty"));
    }

    #[test]
    fn test_config_validation_non_sqlite_url() {
        let mut config = Config::default();
        config.database.url = "postgres://localhost/catalog".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("must be a sqlite URL"));
    }

    #[test]
    fn test_config_validation_zero_connections() {
        let mut config = Config::default();
        config.database.pool.max_connections = 0;

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("max_connections"));
    }

    #[test]
    fn test_config_validation_wildcard_with_credentials() {
        let mut config = Config::default();
        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.cors.allow_credentials = true;

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("wildcard"));
    }

    #[test]
    fn test_pool_timeouts() {
        let mut pool = PoolSettings::default();
        assert_eq!(pool.acquire_timeout(), Duration::from_secs(30));
        assert_eq!(pool.idle_timeout(), Some(Duration::from_secs(600)));

        pool.idle_timeout_secs = 0;
        assert_eq!(pool.idle_timeout(), None);
    }
}
