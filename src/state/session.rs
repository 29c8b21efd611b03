use super::{now, AppState};
use crate::types::*;

impl AppState {
    /// Start a new round.
    ///
    /// Deactivates every session and inserts the next one under a single
    /// write lock, so readers see either the old round or the new one.
    pub async fn reset(&self) -> Session {
        let mut ledger = self.ledger.write().await;

        let next_round = ledger
            .sessions
            .iter()
            .map(|s| s.round_number)
            .max()
            .unwrap_or(0)
            + 1;

        for session in ledger.sessions.iter_mut() {
            session.is_active = false;
        }

        let session = Session {
            id: ledger.next_session_id(),
            round_number: next_round,
            is_active: true,
            created_at: now(),
        };
        ledger.sessions.push(session.clone());
        ledger.version += 1;

        tracing::info!(
            session_id = session.id,
            round = session.round_number,
            "New round started"
        );
        session
    }

    /// Current round, if one was ever started
    pub async fn active_session(&self) -> Option<Session> {
        self.ledger.read().await.active_session().cloned()
    }
}
