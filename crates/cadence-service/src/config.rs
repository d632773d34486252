//! Service configuration from `CADENCE_*` environment variables.
//!
//! | variable                       | default        |
//! |--------------------------------|----------------|
//! | `CADENCE_LISTEN_ADDR`          | `0.0.0.0:8080` |
//! | `CADENCE_BACKEND`              | `memory`       |
//! | `CADENCE_BACKEND_URL`          | required for `http` |
//! | `CADENCE_BACKEND_EMAIL`        | none           |
//! | `CADENCE_BACKEND_PASSWORD`     | none           |
//! | `CADENCE_SESSION_FILE`         | `<config dir>/cadence/session.json` |
//! | `CADENCE_SWEEP_INTERVAL_SECS`  | `300`          |
//! | `CADENCE_TIME_ZONE`            | `UTC`          |
//! | `CADENCE_JWT_SECRET`           | required       |
//! | `CADENCE_HTTP_TIMEOUT_SECS`    | `30`           |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use jiff::tz::TimeZone;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub enum BackendKind {
    Memory,
    Http {
        base_url: String,
        /// Used to sign in when no stored session is found.
        credentials: Option<Credentials>,
        session_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub backend: BackendKind,
    pub sweep_interval: Duration,
    pub time_zone: TimeZone,
    pub jwt_secret: String,
    pub http_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let listen_addr = match get("CADENCE_LISTEN_ADDR") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                var: "CADENCE_LISTEN_ADDR",
                reason: format!("{raw}: {e}"),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let backend = match get("CADENCE_BACKEND").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("memory") => BackendKind::Memory,
            Some("http") => {
                let base_url = get("CADENCE_BACKEND_URL").ok_or(ConfigError::Missing {
                    var: "CADENCE_BACKEND_URL",
                })?;
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(ConfigError::Invalid {
                        var: "CADENCE_BACKEND_URL",
                        reason: format!("{base_url} is not an http(s) URL"),
                    });
                }
                let credentials = match (get("CADENCE_BACKEND_EMAIL"), get("CADENCE_BACKEND_PASSWORD")) {
                    (Some(email), Some(password)) => Some(Credentials { email, password }),
                    (None, None) => None,
                    (Some(_), None) => {
                        return Err(ConfigError::Missing {
                            var: "CADENCE_BACKEND_PASSWORD",
                        });
                    }
                    (None, Some(_)) => {
                        return Err(ConfigError::Missing {
                            var: "CADENCE_BACKEND_EMAIL",
                        });
                    }
                };
                BackendKind::Http {
                    base_url,
                    credentials,
                    session_file: get("CADENCE_SESSION_FILE").map(PathBuf::from),
                }
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "CADENCE_BACKEND",
                    reason: format!("expected memory or http, got {other}"),
                });
            }
        };

        let sweep_interval = seconds(get("CADENCE_SWEEP_INTERVAL_SECS"), "CADENCE_SWEEP_INTERVAL_SECS", 300)?;
        let http_timeout = seconds(get("CADENCE_HTTP_TIMEOUT_SECS"), "CADENCE_HTTP_TIMEOUT_SECS", 30)?;

        let time_zone = match get("CADENCE_TIME_ZONE") {
            Some(name) => TimeZone::get(&name).map_err(|e| ConfigError::Invalid {
                var: "CADENCE_TIME_ZONE",
                reason: e.to_string(),
            })?,
            None => TimeZone::UTC,
        };

        let jwt_secret = get("CADENCE_JWT_SECRET").ok_or(ConfigError::Missing {
            var: "CADENCE_JWT_SECRET",
        })?;

        Ok(Self {
            listen_addr,
            backend,
            sweep_interval,
            time_zone,
            jwt_secret,
            http_timeout,
        })
    }
}

fn seconds(raw: Option<String>, var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: format!("{raw}: {e}"),
        }),
    }
}
