use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use std::{env, fmt};

use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::cors::AllowedOrigins;

lazy_static! {
    // "15m", "7d", "3600", "1.5h", "500ms"
    static ref DURATION_REGEX: Regex =
        Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(ms|s|m|h|d|w|y)?\s*$").unwrap();
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "Missing environment variable: {}", name),
            ConfigError::Invalid { name, value } => {
                write!(f, "Invalid value for {}: {:?}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Signing secrets and lifetimes of both token classes.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// At most `max_requests` per `window` for one client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Quota {
    /// Interval after which one spent request is given back.
    pub fn replenish_period(&self) -> std::time::Duration {
        self.window.to_std().unwrap_or_default() / self.max_requests.max(1)
    }
}

/// Quotas for the whole `/api` tree and for `POST /api/auth/login` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub api: Quota,
    pub login: Quota,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub app_env: String,
    pub cors_origin: AllowedOrigins,
    pub bcrypt_cost: u32,
    pub jwt: JwtSettings,
    pub rate_limits: RateLimitSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let duration = |name: &'static str, default: &str| {
            let value = lookup(name).unwrap_or_else(|| default.to_string());
            parse_duration(&value).ok_or(ConfigError::Invalid { name, value })
        };

        let access_secret = required("JWT_ACCESS_SECRET")?;
        let refresh_secret = required("JWT_REFRESH_SECRET")?;
        if access_secret == refresh_secret {
            return Err(ConfigError::Invalid {
                name: "JWT_REFRESH_SECRET",
                value: "<same as JWT_ACCESS_SECRET>".into(),
            });
        }

        let jwt = JwtSettings {
            access_secret,
            refresh_secret,
            access_ttl: duration("JWT_ACCESS_EXPIRES_IN", "15m")?,
            refresh_ttl: duration("JWT_REFRESH_EXPIRES_IN", "7d")?,
        };

        let server_port = parse_var(&lookup, "SERVER_PORT", 4000u16)?;
        let database_max_connections = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
        let bcrypt_cost = parse_var(&lookup, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let quota = |max_name: &'static str,
                     max: u32,
                     window_name: &'static str,
                     window: &str|
         -> Result<Quota, ConfigError> {
            let max_requests = parse_var(&lookup, max_name, max)?;
            if max_requests == 0 {
                return Err(ConfigError::Invalid {
                    name: max_name,
                    value: "0".into(),
                });
            }
            let window = duration(window_name, window)?;
            if window <= Duration::zero() {
                return Err(ConfigError::Invalid {
                    name: window_name,
                    value: window.to_string(),
                });
            }
            Ok(Quota {
                max_requests,
                window,
            })
        };
        let rate_limits = RateLimitSettings {
            api: quota("RATE_LIMIT_API_MAX", 300, "RATE_LIMIT_API_WINDOW", "15m")?,
            login: quota("RATE_LIMIT_LOGIN_MAX", 10, "RATE_LIMIT_LOGIN_WINDOW", "10m")?,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections,
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            app_env: lookup("APP_ENV")
                .or_else(|| lookup("NODE_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            cors_origin: AllowedOrigins::parse(
                &lookup("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
            ),
            bcrypt_cost,
            jwt,
            rate_limits,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Parses `<number><unit>` spans such as `15m` or `7d`. A bare number is seconds.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let caps = DURATION_REGEX.captures(input)?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let millis_per_unit: f64 = match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => 1.0,
        None | Some("s") => 1_000.0,
        Some("m") => 60_000.0,
        Some("h") => 3_600_000.0,
        Some("d") => 86_400_000.0,
        Some("w") => 604_800_000.0,
        Some("y") => 31_557_600_000.0,
        Some(_) => return None,
    };
    Some(Duration::milliseconds((amount * millis_per_unit).round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://test"),
        ("JWT_ACCESS_SECRET", "access-secret"),
        ("JWT_REFRESH_SECRET", "refresh-secret"),
    ];

    #[test]
    fn test_config_defaults() {
        let config = Config::from_vars(vars(&REQUIRED)).unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.jwt.access_ttl, Duration::minutes(15));
        assert_eq!(config.jwt.refresh_ttl, Duration::days(7));
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.cors_origin, AllowedOrigins::Any);
        assert_eq!(config.app_env, "development");
        assert!(!config.is_production());
        assert_eq!(
            config.rate_limits.api,
            Quota {
                max_requests: 300,
                window: Duration::minutes(15)
            }
        );
        assert_eq!(config.rate_limits.login.max_requests, 10);
        assert_eq!(config.rate_limits.login.window, Duration::minutes(10));
    }

    #[test]
    fn test_app_env_falls_back_to_node_env() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("NODE_ENV", "production"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert!(config.is_production());

        pairs.push(("APP_ENV", "staging"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.app_env, "staging");
        assert!(!config.is_production());
    }

    #[test]
    fn test_quota_replenish_period() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("RATE_LIMIT_LOGIN_MAX", "5"), ("RATE_LIMIT_LOGIN_WINDOW", "1m")]);
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(
            config.rate_limits.login.replenish_period(),
            std::time::Duration::from_secs(12)
        );
        assert_eq!(
            config.rate_limits.api.replenish_period(),
            std::time::Duration::from_secs(3)
        );
    }

    #[test]
    fn test_zero_quota_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RATE_LIMIT_API_MAX", "0"));
        let err = Config::from_vars(vars(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "RATE_LIMIT_API_MAX",
                value: "0".into()
            }
        );
    }

    #[test]
    fn test_config_custom_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("APP_ENV", "production"),
            ("JWT_ACCESS_EXPIRES_IN", "30s"),
            ("CORS_ORIGIN", "https://a.dev, https://b.dev"),
        ]);
        let config = Config::from_vars(vars(&pairs)).unwrap();

        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
        assert!(config.is_production());
        assert_eq!(config.jwt.access_ttl, Duration::seconds(30));
        assert_eq!(
            config.cors_origin,
            AllowedOrigins::List(vec!["https://a.dev".into(), "https://b.dev".into()])
        );
    }

    #[test]
    fn test_missing_secrets_fail() {
        let err = Config::from_vars(vars(&[("DATABASE_URL", "postgres://test")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_ACCESS_SECRET"));

        let err = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_ACCESS_SECRET", "a"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_REFRESH_SECRET"));
    }

    #[test]
    fn test_identical_secrets_are_rejected() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_ACCESS_SECRET", "same"),
            ("JWT_REFRESH_SECRET", "same"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "JWT_REFRESH_SECRET",
                ..
            })
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_duration("7d"), Some(Duration::days(7)));
        assert_eq!(parse_duration("2h"), Some(Duration::hours(2)));
        assert_eq!(parse_duration("900"), Some(Duration::seconds(900)));
        assert_eq!(parse_duration("250ms"), Some(Duration::milliseconds(250)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("0"), Some(Duration::zero()));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("10 parsecs"), None);
    }
}
