use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("DEALDB_ENV", "development"))?;

    // `PORT` is honoured for hosting platforms that inject it; an explicit
    // bind address still wins.
    let default_bind = match lookup("PORT") {
        Ok(port) => format!("0.0.0.0:{port}"),
        Err(_) => "0.0.0.0:8080".to_string(),
    };
    let bind_addr = or_default("DEALDB_BIND_ADDR", &default_bind)
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "DEALDB_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("DEALDB_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default("DEALDB_SOURCES_PATH", "./config/sources.yaml"));

    let catalog_ttl_secs = parse_u64("DEALDB_CATALOG_TTL_SECS", "14400")?;
    let upstream_timeout_secs = parse_u64("DEALDB_UPSTREAM_TIMEOUT_SECS", "30")?;
    if upstream_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DEALDB_UPSTREAM_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let upstream_connect_timeout_secs = parse_u64("DEALDB_UPSTREAM_CONNECT_TIMEOUT_SECS", "10")?;
    let upstream_user_agent = or_default(
        "DEALDB_UPSTREAM_USER_AGENT",
        "dealdb/0.1 (discount-aggregator)",
    );
    let refresh_cron = lookup("DEALDB_REFRESH_CRON")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sources_path,
        catalog_ttl_secs,
        upstream_timeout_secs,
        upstream_connect_timeout_secs,
        upstream_user_agent,
        refresh_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DEALDB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
