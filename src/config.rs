use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Limits for pushing events to live listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySettings {
    /// Upper bound on a single push to a single listener
    pub push_timeout: Duration,
    /// Upper bound on closing a listener's stream
    pub close_timeout: Duration,
    /// Events that may wait for the notification worker
    pub queue_capacity: usize,
    /// Publishes the worker runs at once
    pub max_in_flight: usize,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            push_timeout: Duration::from_millis(5000),
            close_timeout: Duration::from_millis(1000),
            queue_capacity: 1024,
            max_in_flight: 64,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// In-memory store when unset
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub delivery: DeliverySettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = DeliverySettings::default();

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            delivery: DeliverySettings {
                push_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "PUSH_TIMEOUT_MS",
                    defaults.push_timeout.as_millis() as u64,
                )?),
                close_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "CLOSE_TIMEOUT_MS",
                    defaults.close_timeout.as_millis() as u64,
                )?),
                queue_capacity: parse_or(
                    &lookup,
                    "NOTIFY_QUEUE_CAPACITY",
                    defaults.queue_capacity,
                )?,
                max_in_flight: parse_or(&lookup, "NOTIFY_MAX_IN_FLIGHT", defaults.max_in_flight)?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.delivery, DeliverySettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/ama"),
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("PUSH_TIMEOUT_MS", "250"),
            ("CLOSE_TIMEOUT_MS", "50"),
            ("NOTIFY_QUEUE_CAPACITY", "16"),
            ("NOTIFY_MAX_IN_FLIGHT", "4"),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/ama"));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.delivery.push_timeout, Duration::from_millis(250));
        assert_eq!(config.delivery.close_timeout, Duration::from_millis(50));
        assert_eq!(config.delivery.queue_capacity, 16);
        assert_eq!(config.delivery.max_in_flight, 4);
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let error = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(error.to_string().contains("PORT"));
    }

    #[test]
    fn test_empty_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.database_url, None);
    }
}
