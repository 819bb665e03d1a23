//! Hub configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`):
//!
//! | Variable             | Default        |
//! |----------------------|----------------|
//! | `LISTEN_ADDR`        | `0.0.0.0:3399` |
//! | `WS_PATH`            | `/ws/v1`       |
//! | `REAP_INTERVAL_SECS` | `30` (`0` = off) |
//! | `LOG_FORMAT`         | `text` or `json` |

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::HubError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the listener to.
    pub listen_addr: SocketAddr,

    /// Route of the WebSocket upgrade endpoint.
    pub ws_path: String,

    /// Period of the background liveness sweep; `None` disables it.
    pub reap_interval: Option<Duration>,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] if `LISTEN_ADDR` cannot be parsed as a
    /// [`SocketAddr`] or `WS_PATH` does not start with `/`.
    pub fn from_env() -> Result<Self, HubError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HubConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HubError> {
        let raw_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3399".to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|_| HubError::Config(format!("invalid LISTEN_ADDR: {raw_addr}")))?;

        let ws_path = lookup("WS_PATH").unwrap_or_else(|| "/ws/v1".to_string());
        if !ws_path.starts_with('/') {
            return Err(HubError::Config(format!(
                "WS_PATH must start with '/': {ws_path}"
            )));
        }

        let reap_secs: u64 = parse_or(lookup("REAP_INTERVAL_SECS"), 30);
        let reap_interval = (reap_secs > 0).then(|| Duration::from_secs(reap_secs));

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            ws_path,
            reap_interval,
            log_format,
        })
    }
}

/// Parses `value` as `T`, returning `default` on missing or invalid input.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
