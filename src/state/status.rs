use super::AppState;
use crate::protocol::{PulseRef, StatusSnapshot};
use std::collections::BTreeMap;

impl AppState {
    /// Aggregate the active round into a fresh snapshot.
    ///
    /// Read-only and never cached. Taken under one read lock, so every field
    /// describes the same session.
    pub async fn snapshot(&self) -> StatusSnapshot {
        let ledger = self.ledger.read().await;

        let mut per_judge_votes: BTreeMap<_, _> = self.roster.ids().map(|id| (id, 0u8)).collect();

        let Some(session) = ledger.active_session() else {
            return StatusSnapshot {
                session_id: None,
                round_number: 0,
                total_votes: 0,
                max_votes: self.rules.max_votes(),
                threshold: self.rules.threshold,
                per_judge_votes,
                threshold_reached: false,
                latest_pulse: None,
            };
        };

        if let Some(votes) = ledger.votes.get(&session.id) {
            // Only the configured panel counts toward the total
            for record in votes.values() {
                if let Some(points) = per_judge_votes.get_mut(&record.judge_id) {
                    *points = record.points;
                }
            }
        }
        let total_votes: u32 = per_judge_votes.values().map(|&p| u32::from(p)).sum();

        let latest_pulse = ledger.latest_pulse_in(session.id).map(|p| PulseRef {
            id: p.id,
            judge_id: p.judge_id,
            created_at: Some(p.created_at.clone()),
        });

        StatusSnapshot {
            session_id: Some(session.id),
            round_number: session.round_number,
            total_votes,
            max_votes: self.rules.max_votes(),
            threshold: self.rules.threshold,
            per_judge_votes,
            threshold_reached: self.rules.is_threshold_reached(total_votes),
            latest_pulse,
        }
    }
}
