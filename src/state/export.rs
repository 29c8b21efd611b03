//! Ledger export/import.
//!
//! Serializable snapshot of sessions, votes and pulses, used for the
//! on-disk snapshot file and the host's manual backup/restore endpoints.

use super::{AppState, Ledger};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Schema version for export format compatibility
/// Version 1: sessions, votes keyed by (session, judge), pulses
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("Export schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("Export has {0} active sessions, at most one is allowed")]
    MultipleActiveSessions(usize),

    #[error("Session id {0} appears more than once")]
    DuplicateSession(SessionId),

    #[error("Pulse id {0} appears more than once")]
    DuplicatePulse(PulseId),

    #[error("{0} references session {1} which doesn't exist")]
    UnknownSession(String, SessionId),

    #[error("Vote record for judge {judge_id} is filed under session {key} but names session {record}")]
    MisfiledVote {
        judge_id: JudgeId,
        key: SessionId,
        record: SessionId,
    },

    #[error("Judge {judge_id} holds {points} points, more than the cap of 3")]
    PointsOverCap { judge_id: JudgeId, points: u8 },

    #[error("{0} names judge {1}, who is not on this panel")]
    UnknownJudge(String, JudgeId),
}

/// A serializable snapshot of the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub votes: HashMap<SessionId, HashMap<JudgeId, VoteRecord>>,
    #[serde(default)]
    pub pulses: Vec<PulseEvent>,
}

impl LedgerExport {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            sessions: ledger.sessions.clone(),
            votes: ledger.votes.clone(),
            pulses: ledger.pulses.clone(),
        }
    }

    /// Validate the export before import. Every vote and pulse must name a
    /// judge on `roster`, the panel this server is running with.
    pub fn validate(&self, roster: &JudgeRoster) -> Result<(), ImportError> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(ImportError::UnsupportedSchema {
                found: self.schema_version,
                supported: EXPORT_SCHEMA_VERSION,
            });
        }

        let active = self.sessions.iter().filter(|s| s.is_active).count();
        if active > 1 {
            return Err(ImportError::MultipleActiveSessions(active));
        }

        let mut session_ids = HashSet::new();
        for session in &self.sessions {
            if !session_ids.insert(session.id) {
                return Err(ImportError::DuplicateSession(session.id));
            }
        }

        for (session_id, votes) in &self.votes {
            if !session_ids.contains(session_id) {
                return Err(ImportError::UnknownSession(
                    "Vote table".to_string(),
                    *session_id,
                ));
            }
            for (judge_id, record) in votes {
                if record.session_id != *session_id || record.judge_id != *judge_id {
                    return Err(ImportError::MisfiledVote {
                        judge_id: *judge_id,
                        key: *session_id,
                        record: record.session_id,
                    });
                }
                if !roster.contains(*judge_id) {
                    return Err(ImportError::UnknownJudge(
                        format!("Vote record in session {}", session_id),
                        *judge_id,
                    ));
                }
                if record.points > MAX_POINTS_PER_JUDGE {
                    return Err(ImportError::PointsOverCap {
                        judge_id: *judge_id,
                        points: record.points,
                    });
                }
            }
        }

        let mut pulse_ids = HashSet::new();
        for pulse in &self.pulses {
            if !session_ids.contains(&pulse.session_id) {
                return Err(ImportError::UnknownSession(
                    format!("Pulse {}", pulse.id),
                    pulse.session_id,
                ));
            }
            if !roster.contains(pulse.judge_id) {
                return Err(ImportError::UnknownJudge(
                    format!("Pulse {}", pulse.id),
                    pulse.judge_id,
                ));
            }
            if !pulse_ids.insert(pulse.id) {
                return Err(ImportError::DuplicatePulse(pulse.id));
            }
        }

        Ok(())
    }

    fn into_ledger(self) -> Ledger {
        let mut sessions = self.sessions;
        sessions.sort_by_key(|s| s.id);
        let mut pulses = self.pulses;
        pulses.sort_by_key(|p| p.id);

        Ledger {
            sessions,
            votes: self.votes,
            pulses,
            version: 0,
        }
    }
}

impl AppState {
    pub async fn export_ledger(&self) -> LedgerExport {
        LedgerExport::from_ledger(&*self.ledger.read().await)
    }

    /// Replace the whole ledger with a validated export
    pub async fn import_ledger(&self, export: LedgerExport) -> Result<(), ImportError> {
        export.validate(&self.roster)?;

        let sessions = export.sessions.len();
        let pulses = export.pulses.len();
        let mut imported = export.into_ledger();

        let mut ledger = self.ledger.write().await;
        imported.version = ledger.version + 1;
        *ledger = imported;

        tracing::info!(sessions, pulses, "Ledger imported");
        Ok(())
    }
}
