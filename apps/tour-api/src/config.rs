use std::{env, fmt, num::NonZeroU32, str::FromStr, time::Duration};

use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024;
pub const DEFAULT_RATE_LIMIT_MAX: NonZeroU32 = match NonZeroU32::new(100) {
    Some(max) => max,
    None => panic!("rate limit must be non-zero"),
};
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Deployment mode. Decides how much of an error the caller gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Verbose errors with the raw failure and its trace.
    Development,
    /// Only operational messages reach the caller.
    Production,
}

impl Environment {
    /// Anything unrecognised is treated as production so internals never leak.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("development") => Environment::Development,
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            Some(other) => {
                warn!("Unknown APP_ENV {:?}, falling back to production", other);
                Environment::Production
            }
            None => {
                warn!("APP_ENV not set, falling back to production");
                Environment::Production
            }
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub port: u16,
    pub jwt_secret: String,
    pub body_limit_bytes: usize,
    /// Requests one client may make per `rate_limit_window`.
    pub rate_limit_max: NonZeroU32,
    pub rate_limit_window: Duration,
}

impl Config {
    /// Reads configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = Environment::from_setting(lookup("APP_ENV").as_deref());
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let body_limit_bytes =
            parse_or("BODY_LIMIT_BYTES", lookup("BODY_LIMIT_BYTES"), DEFAULT_BODY_LIMIT_BYTES)?;
        let rate_limit_max =
            parse_or("RATE_LIMIT_MAX", lookup("RATE_LIMIT_MAX"), DEFAULT_RATE_LIMIT_MAX)?;
        let window_secs = parse_or(
            "RATE_LIMIT_WINDOW_SECS",
            lookup("RATE_LIMIT_WINDOW_SECS"),
            DEFAULT_RATE_LIMIT_WINDOW.as_secs(),
        )?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_WINDOW_SECS",
                value: window_secs.to_string(),
            });
        }
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Config {
            environment,
            port,
            jwt_secret,
            body_limit_bytes,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(window_secs),
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.body_limit_bytes, DEFAULT_BODY_LIMIT_BYTES);
        assert_eq!(config.rate_limit_max.get(), 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(3600));
    }

    #[test]
    fn reads_rate_limit() {
        let config = Config::from_lookup(lookup(&[
            ("RATE_LIMIT_MAX", "5"),
            ("RATE_LIMIT_WINDOW_SECS", "60"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.rate_limit_max.get(), 5);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let err = Config::from_lookup(lookup(&[("RATE_LIMIT_MAX", "0"), ("JWT_SECRET", "x")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "RATE_LIMIT_MAX",
                value: "0".into()
            }
        );
        let err =
            Config::from_lookup(lookup(&[("RATE_LIMIT_WINDOW_SECS", "0"), ("JWT_SECRET", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "RATE_LIMIT_WINDOW_SECS", .. }));
    }

    #[test]
    fn reads_development_mode() {
        let config = Config::from_lookup(lookup(&[
            ("APP_ENV", "development"),
            ("PORT", "8080"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn unknown_mode_is_production() {
        assert_eq!(Environment::from_setting(Some("staging")), Environment::Production);
        assert_eq!(Environment::from_setting(None), Environment::Production);
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn bad_port_is_reported() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty"), ("JWT_SECRET", "x")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".into()
            }
        );
    }
}
