mod http;
mod local;

use async_trait::async_trait;
use std::time::Duration;

use crate::protocol::*;
use crate::types::JudgeId;

pub use http::HttpClient;
pub use local::LocalClient;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors a device can see when talking to the server
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Rejected: {}", .0.message)]
    Rejected(ErrorBody),

    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl ClientError {
    /// Transient failures are retried on the next tick and never surfaced
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Server { .. } | Self::Decode(_)
        )
    }

    pub fn rejection(&self) -> Option<&ErrorBody> {
        match self {
            Self::Rejected(body) => Some(body),
            _ => None,
        }
    }
}

/// Everything a device needs from the server
#[async_trait]
pub trait GameClient: Send + Sync {
    async fn status(&self) -> ClientResult<StatusSnapshot>;

    async fn latest_pulse(&self, after: Option<u64>) -> ClientResult<LatestPulseResponse>;

    async fn vote(&self, request: &VoteRequest) -> ClientResult<VoteResponse>;

    async fn pulse(&self, judge_id: JudgeId) -> ClientResult<PulseResponse>;

    async fn reset(&self) -> ClientResult<ResetResponse>;
}
