//! Console configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default so the console
//! starts against a local broker and API without any setup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level console configuration.
///
/// Loaded once at startup via [`ConsoleConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Socket address the status API binds to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// WebSocket URL of the topic broker.
    pub broker_url: String,

    /// Upper bound on a single broker connection attempt, in milliseconds.
    pub broker_connect_timeout_ms: u64,

    /// First reconnect delay, in milliseconds.
    pub broker_reconnect_base_ms: u64,

    /// Cap on the reconnect delay, in milliseconds.
    pub broker_reconnect_max_ms: u64,

    /// Capacity of the outbound publish queue.
    pub broker_outbox_capacity: usize,

    /// Capacity of the EventBus observer channel.
    pub event_bus_capacity: usize,

    /// Base URL of the HTTP collaborator (e.g. `http://localhost:8080`).
    pub api_base_url: String,

    /// Bearer token sent to the HTTP collaborator, if any.
    pub api_token: Option<String>,

    /// Seconds between HTTP refreshes (0 = only at startup).
    pub api_refresh_secs: u64,

    /// `limit` query parameter for `GET /api/events`.
    pub api_events_limit: u32,

    /// Camera id the local capture publishes under.
    pub capture_id: String,

    /// Directory of JPEG stills used as the capture source, if any.
    pub capture_dir: Option<PathBuf>,

    /// Fallback render interval when the source reports no frame rate.
    pub capture_render_interval_ms: u64,

    /// Minimum interval between two published frames.
    pub capture_publish_interval_ms: u64,

    /// Whether publishing is enabled when capture starts.
    pub capture_publish_enabled: bool,

    /// Start capturing immediately at boot.
    pub capture_autostart: bool,
}

impl ConsoleConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let broker_url =
            std::env::var("BROKER_URL").unwrap_or_else(|_| "ws://localhost:9001/ws".to_string());
        let broker_connect_timeout_ms = parse_env("BROKER_CONNECT_TIMEOUT_MS", 10_000);
        let broker_reconnect_base_ms = parse_env("BROKER_RECONNECT_BASE_MS", 500);
        let broker_reconnect_max_ms = parse_env("BROKER_RECONNECT_MAX_MS", 30_000);
        let broker_outbox_capacity = parse_env("BROKER_OUTBOX_CAPACITY", 64);
        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 10_000);

        let api_base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let api_token = std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty());
        let api_refresh_secs = parse_env("API_REFRESH_SECS", 30);
        let api_events_limit = parse_env("API_EVENTS_LIMIT", 100);

        let capture_id =
            std::env::var("CAPTURE_ID").unwrap_or_else(|_| "webcam-local".to_string());
        let capture_dir = std::env::var("CAPTURE_DIR")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);
        let capture_render_interval_ms = parse_env("CAPTURE_RENDER_INTERVAL_MS", 100);
        let capture_publish_interval_ms = parse_env("CAPTURE_PUBLISH_INTERVAL_MS", 300);
        let capture_publish_enabled = parse_env_bool("CAPTURE_PUBLISH_ENABLED", false);
        let capture_autostart = parse_env_bool("CAPTURE_AUTOSTART", false);

        Ok(Self {
            listen_addr,
            broker_url,
            broker_connect_timeout_ms,
            broker_reconnect_base_ms,
            broker_reconnect_max_ms,
            broker_outbox_capacity,
            event_bus_capacity,
            api_base_url,
            api_token,
            api_refresh_secs,
            api_events_limit,
            capture_id,
            capture_dir,
            capture_render_interval_ms,
            capture_publish_interval_ms,
            capture_publish_enabled,
            capture_autostart,
        })
    }

    /// Timeout applied to each broker connection attempt.
    #[must_use]
    pub const fn broker_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.broker_connect_timeout_ms)
    }

    /// Fallback render tick interval.
    #[must_use]
    pub const fn capture_render_interval(&self) -> Duration {
        Duration::from_millis(self.capture_render_interval_ms)
    }

    /// Minimum interval between published frames.
    #[must_use]
    pub const fn capture_publish_interval(&self) -> Duration {
        Duration::from_millis(self.capture_publish_interval_ms)
    }
}

/// Output format of the tracing subscriber, chosen with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT` (after loading `.env`); anything but `json` is
    /// [`LogFormat::Pretty`].
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Ok("true" | "1") => true,
        Ok("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("VIGIL_TEST_UNSET_KEY_7F3A", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_env_bool_falls_back_on_missing_key() {
        assert!(parse_env_bool("VIGIL_TEST_UNSET_BOOL_7F3A", true));
        assert!(!parse_env_bool("VIGIL_TEST_UNSET_BOOL_7F3A", false));
    }

    #[test]
    fn log_format_is_json_only_when_asked() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[test]
    fn defaults_are_usable() {
        let Ok(config) = ConsoleConfig::from_env() else {
            panic!("default configuration must load");
        };
        assert!(config.broker_reconnect_base_ms <= config.broker_reconnect_max_ms);
        assert!(config.broker_outbox_capacity > 0);
        assert!(config.capture_publish_interval() > Duration::ZERO);
    }
}
