use crate::protocol::{ErrorBody, ErrorCode};
use crate::types::{JudgeId, SessionId};

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Rejections raised by the session/vote/pulse ledger
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("No active session")]
    NoActiveSession,

    #[error("Vote was for session {requested}, but session {active_session_id} is active")]
    SessionMismatch {
        requested: SessionId,
        active_session_id: SessionId,
    },

    #[error("Unknown judge {0}")]
    UnknownJudge(JudgeId),

    #[error("Maximum 3 votes per judge")]
    VoteCapExceeded { current_points: u8 },

    #[error("Requested points must be between 0 and 3, got {0}")]
    InvalidPoints(u8),

    #[error("Too many pulses from judge {0}, slow down")]
    RateLimited(JudgeId),
}

/// How a caller should treat a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unknown input; never retried automatically
    Input,
    /// Valid input that conflicts with current state; carries the authoritative value
    StateConflict,
    /// Throttled; safe to try again later
    Throttled,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownJudge(_) | Self::InvalidPoints(_) => ErrorKind::Input,
            Self::NoActiveSession | Self::SessionMismatch { .. } | Self::VoteCapExceeded { .. } => {
                ErrorKind::StateConflict
            }
            Self::RateLimited(_) => ErrorKind::Throttled,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoActiveSession => ErrorCode::NoActiveSession,
            Self::SessionMismatch { .. } => ErrorCode::SessionMismatch,
            Self::UnknownJudge(_) => ErrorCode::UnknownJudge,
            Self::VoteCapExceeded { .. } => ErrorCode::VoteCapExceeded,
            Self::InvalidPoints(_) => ErrorCode::InvalidPoints,
            Self::RateLimited(_) => ErrorCode::RateLimited,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let current_points = match self {
            Self::VoteCapExceeded { current_points } => Some(*current_points),
            _ => None,
        };
        let active_session_id = match self {
            Self::SessionMismatch {
                active_session_id, ..
            } => Some(*active_session_id),
            _ => None,
        };
        ErrorBody {
            ok: false,
            error: self.code(),
            message: self.to_string(),
            current_points,
            active_session_id,
        }
    }
}
