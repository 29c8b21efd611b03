pub mod export;
mod pulse;
mod session;
mod status;
mod vote;

use crate::abuse::PulseThrottle;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The three durable relations. Kept behind a single lock so that a round
/// switch is one indivisible step for every reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub sessions: Vec<Session>,
    pub votes: HashMap<SessionId, HashMap<JudgeId, VoteRecord>>,
    pub pulses: Vec<PulseEvent>,
    /// Bumped on every mutation; lets the snapshot writer skip idle periods
    pub version: u64,
}

impl Ledger {
    /// Newest active session. There is at most one.
    pub fn active_session(&self) -> Option<&Session> {
        self.sessions.iter().rev().find(|s| s.is_active)
    }

    /// Newest pulse in a session; pulses are appended in id order
    pub fn latest_pulse_in(&self, session_id: SessionId) -> Option<&PulseEvent> {
        self.pulses.iter().rev().find(|p| p.session_id == session_id)
    }

    fn next_session_id(&self) -> SessionId {
        self.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    fn next_pulse_id(&self) -> PulseId {
        self.pulses.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub roster: Arc<JudgeRoster>,
    pub rules: GameRules,
    /// Per-judge pulse throttle applied at the HTTP boundary (None = disabled)
    pub pulse_throttle: Option<PulseThrottle>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_roster(JudgeRoster::default(), GameRules::default())
    }

    pub fn with_roster(roster: JudgeRoster, rules: GameRules) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger::default())),
            roster: Arc::new(roster),
            rules,
            pulse_throttle: None,
        }
    }

    pub fn with_pulse_throttle(mut self, throttle: PulseThrottle) -> Self {
        self.pulse_throttle = Some(throttle);
        self
    }

    /// Current mutation counter of the ledger
    pub async fn version(&self) -> u64 {
        self.ledger.read().await.version
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
