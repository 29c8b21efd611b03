//! Request and response bodies shared by the HTTP API and the sync clients.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time aggregate of the active session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub session_id: Option<SessionId>,
    pub round_number: u32,
    pub total_votes: u32,
    pub max_votes: u32,
    pub threshold: u32,
    pub per_judge_votes: BTreeMap<JudgeId, u8>,
    pub threshold_reached: bool,
    pub latest_pulse: Option<PulseRef>,
}

impl StatusSnapshot {
    pub fn points_of(&self, judge_id: JudgeId) -> u8 {
        self.per_judge_votes.get(&judge_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PulseRef {
    pub id: PulseId,
    pub judge_id: JudgeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_requested_points() -> u8 {
    1
}

/// Older judge pages send `judgeNumber` / `voteCount`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(alias = "judgeNumber")]
    pub judge_id: JudgeId,
    #[serde(alias = "voteCount", default = "default_requested_points")]
    pub requested_points: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Round the device saw when the vote was pressed; a vote for an older
    /// round is refused instead of landing in the current one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub ok: bool,
    pub resulting_points: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PulseRequest {
    #[serde(alias = "judgeNumber")]
    pub judge_id: JudgeId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PulseResponse {
    pub ok: bool,
    pub pulse_id: PulseId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub ok: bool,
    pub round_number: u32,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatestPulseQuery {
    /// Only report a pulse newer than this id
    pub after: Option<PulseId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatestPulseResponse {
    pub has_pulse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_id: Option<PulseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_id: Option<JudgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_name: Option<String>,
}

impl LatestPulseResponse {
    pub fn none() -> Self {
        Self {
            has_pulse: false,
            session_id: None,
            pulse_id: None,
            judge_id: None,
            judge_name: None,
        }
    }

    pub fn pulse_ref(&self) -> Option<PulseRef> {
        match (self.has_pulse, self.pulse_id, self.judge_id) {
            (true, Some(id), Some(judge_id)) => Some(PulseRef {
                id,
                judge_id,
                created_at: None,
            }),
            _ => None,
        }
    }
}

/// Machine-readable error codes carried in every error body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    NoActiveSession,
    SessionMismatch,
    UnknownJudge,
    VoteCapExceeded,
    InvalidPoints,
    RateLimited,
    InvalidImport,
    BadRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub ok: bool,
    pub error: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_points: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<SessionId>,
}

impl ErrorBody {
    /// A rejection without the cap or session details
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error,
            message: message.into(),
            current_points: None,
            active_session_id: None,
        }
    }
}
