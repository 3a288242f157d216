//! Process-wide configuration, parsed once at startup.
//!
//! Modeled on the teacher's `ServerConfig::parse()` — a single
//! `clap::Parser` struct read once in `main`, with every field settable by
//! flag or environment variable (`env` feature) so deployment doesn't
//! require a flags file.

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "signal-hub", about = "Peer-discovery and signaling relay")]
pub struct HubConfig {
    /// Address to bind the HTTP/WebSocket listener on.
    #[arg(long, env = "SIGNAL_HUB_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// HTTP path the signaling WebSocket is upgraded from. Requests to any
    /// other path never reach the hub's session logic.
    #[arg(long, env = "SIGNAL_HUB_PATH", default_value = "/api/signaling")]
    pub signaling_path: String,

    /// Maximum size, in bytes, of a single inbound or outbound frame.
    #[arg(long, env = "SIGNAL_HUB_MAX_FRAME_BYTES", default_value_t = 16 * 1024)]
    pub max_frame_bytes: usize,

    /// Maximum length, in characters, of a display name.
    #[arg(long, env = "SIGNAL_HUB_MAX_NAME_LEN", default_value_t = 64)]
    pub max_name_len: usize,

    /// Depth of each session's bounded outbound queue.
    #[arg(long, env = "SIGNAL_HUB_OUTBOUND_QUEUE_DEPTH", default_value_t = 64)]
    pub outbound_queue_depth: usize,

    /// How long a write may go un-drained before the session is torn down.
    #[arg(long, env = "SIGNAL_HUB_WRITE_TIMEOUT_SECS", default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// How long a session may go without an inbound frame before it is
    /// torn down. Zero disables the idle timeout.
    #[arg(long, env = "SIGNAL_HUB_READ_IDLE_TIMEOUT_SECS", default_value_t = 120)]
    pub read_idle_timeout_secs: u64,

    /// Comma-separated list of allowed CORS origins. Empty allows any
    /// origin (acceptable for a relay with no cookie-based auth).
    #[arg(long, env = "SIGNAL_HUB_ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long, env = "SIGNAL_HUB_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl HubConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn read_idle_timeout(&self) -> Option<Duration> {
        if self.read_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.read_idle_timeout_secs))
        }
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .as_deref()
            .map(|s| s.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
            .unwrap_or_default()
    }

    /// A config with all defaults, for unit/integration tests that don't
    /// care about CLI/env wiring.
    #[cfg(any(test, feature = "test-util"))]
    pub fn for_test() -> Self {
        Self::parse_from(["signal-hub"])
    }
}
