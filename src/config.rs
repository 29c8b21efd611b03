//! Environment-driven configuration for the server and the sync agent.
//!
//! `.env` is loaded by the binaries before any of these are read.

use crate::types::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: at least one judge is required")]
    NoJudges,

    #[error("Invalid configuration: threshold {threshold} is above the maximum of {max_votes} votes")]
    UnreachableThreshold { threshold: u32, max_votes: u32 },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Read and parse an env var, falling back to `default` (with a warning) on bad input
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = raw.as_str(), "Unparseable value, using default");
                default
            }
        },
        _ => default,
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub rules: GameRules,
    pub judge_names: Vec<String>,
    /// Snapshot file for the ledger (None = in-memory only)
    pub state_file: Option<PathBuf>,
    pub snapshot_interval: Duration,
    pub request_timeout: Duration,
    /// Pulses allowed per judge per window (0 disables throttling)
    pub pulse_rate_max: u32,
    pub pulse_rate_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8787)),
            rules: GameRules::default(),
            judge_names: Vec::new(),
            state_file: None,
            snapshot_interval: Duration::from_secs(5),
            request_timeout: Duration::from_millis(5000),
            pulse_rate_max: 5,
            pulse_rate_window: Duration::from_millis(2000),
        }
    }
}

impl ServerConfig {
    /// Load server config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let judge_names: Vec<String> = env_string("IPPON_JUDGE_NAMES")
            .map(|names| names.split(',').map(|n| n.trim().to_string()).collect())
            .unwrap_or_default();

        let config = Self {
            bind: env_or("IPPON_BIND", defaults.bind),
            rules: GameRules {
                judge_count: env_or("IPPON_JUDGE_COUNT", defaults.rules.judge_count),
                threshold: env_or("IPPON_THRESHOLD", defaults.rules.threshold),
            },
            judge_names,
            state_file: env_string("IPPON_STATE_FILE").map(PathBuf::from),
            snapshot_interval: Duration::from_secs(env_or("IPPON_SNAPSHOT_SECS", 5)),
            request_timeout: Duration::from_millis(env_or("IPPON_REQUEST_TIMEOUT_MS", 5000)),
            pulse_rate_max: env_or("IPPON_PULSE_RATE_MAX", defaults.pulse_rate_max),
            pulse_rate_window: Duration::from_millis(env_or("IPPON_PULSE_RATE_WINDOW_MS", 2000)),
        };

        config.validate()?;

        tracing::info!(
            bind = %config.bind,
            judges = config.rules.judge_count,
            threshold = config.rules.threshold,
            persistence = config.state_file.is_some(),
            "Server config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.judge_count == 0 {
            return Err(ConfigError::NoJudges);
        }
        let max_votes = self.rules.max_votes();
        if self.rules.threshold > max_votes {
            return Err(ConfigError::UnreachableThreshold {
                threshold: self.rules.threshold,
                max_votes,
            });
        }
        Ok(())
    }

    pub fn roster(&self) -> JudgeRoster {
        JudgeRoster::new(self.rules.judge_count, &self.judge_names)
    }
}

/// Which side effects a device drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    /// Judge device: vote controls and personal count
    Submitter { judge_id: JudgeId },
    /// Shared display: aggregate board, banner and audio
    Observer,
}

/// Sync agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub server_url: String,
    pub role: AgentRole,
    pub poll_interval: Duration,
    /// Separate cadence for `GET latestPulse` (observers only, None = status poll only)
    pub pulse_poll_interval: Option<Duration>,
    pub http_timeout: Duration,
}

impl AgentConfig {
    pub fn observer(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            role: AgentRole::Observer,
            poll_interval: Duration::from_millis(250),
            pulse_poll_interval: None,
            http_timeout: Duration::from_millis(2000),
        }
    }

    pub fn submitter(server_url: impl Into<String>, judge_id: JudgeId) -> Self {
        Self {
            server_url: server_url.into(),
            role: AgentRole::Submitter { judge_id },
            poll_interval: Duration::from_millis(3000),
            pulse_poll_interval: None,
            http_timeout: Duration::from_millis(2000),
        }
    }

    /// Load agent config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url =
            env_string("IPPON_SERVER_URL").unwrap_or_else(|| "http://127.0.0.1:8787".to_string());

        let mut config = match env_string("IPPON_AGENT_ROLE").as_deref() {
            None | Some("observer") | Some("display") => Self::observer(server_url),
            Some("submitter") | Some("judge") => {
                let judge_id = env_string("IPPON_JUDGE_ID")
                    .ok_or_else(|| {
                        ConfigError::Invalid("IPPON_JUDGE_ID is required for submitters".into())
                    })?
                    .parse::<JudgeId>()
                    .map_err(|e| ConfigError::Invalid(format!("IPPON_JUDGE_ID: {}", e)))?;
                Self::submitter(server_url, judge_id)
            }
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "IPPON_AGENT_ROLE must be observer or submitter, got '{}'",
                    other
                )))
            }
        };

        let poll_ms = env_or("IPPON_POLL_MS", config.poll_interval.as_millis() as u64);
        config.poll_interval = Duration::from_millis(poll_ms.max(1));
        // 0 turns the separate pulse cadence off
        let pulse_ms = env_or(
            "IPPON_PULSE_POLL_MS",
            config
                .pulse_poll_interval
                .map_or(0, |every| every.as_millis() as u64),
        );
        config.pulse_poll_interval = (pulse_ms > 0).then(|| Duration::from_millis(pulse_ms));
        config.http_timeout = Duration::from_millis(env_or(
            "IPPON_HTTP_TIMEOUT_MS",
            config.http_timeout.as_millis() as u64,
        ));

        tracing::info!(
            server = config.server_url.as_str(),
            role = ?config.role,
            poll_ms = config.poll_interval.as_millis() as u64,
            "Agent config loaded"
        );
        Ok(config)
    }
}
