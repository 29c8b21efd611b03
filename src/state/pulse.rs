use super::{now, AppState};
use crate::error::{LedgerError, LedgerResult};
use crate::protocol::LatestPulseResponse;
use crate::types::*;

impl AppState {
    /// Record a cheer from a judge in the active round
    pub async fn append_pulse(&self, judge_id: JudgeId) -> LedgerResult<PulseId> {
        let mut ledger = self.ledger.write().await;

        let session_id = ledger
            .active_session()
            .map(|s| s.id)
            .ok_or(LedgerError::NoActiveSession)?;

        if !self.roster.contains(judge_id) {
            return Err(LedgerError::UnknownJudge(judge_id));
        }

        let pulse = PulseEvent {
            id: ledger.next_pulse_id(),
            session_id,
            judge_id,
            created_at: now(),
        };
        let id = pulse.id;
        ledger.pulses.push(pulse);
        ledger.version += 1;

        tracing::debug!(session_id, judge_id, pulse_id = id, "Pulse recorded");
        Ok(id)
    }

    /// Newest pulse of the active round, if its id is past `marker`
    pub async fn latest_pulse_since(&self, marker: Option<PulseId>) -> Option<PulseEvent> {
        let ledger = self.ledger.read().await;
        let session = ledger.active_session()?;
        ledger
            .latest_pulse_in(session.id)
            .filter(|p| marker.map_or(true, |m| p.id > m))
            .cloned()
    }

    /// Latest pulse with the judge's display name, for the display's pulse cadence
    pub async fn latest_pulse(&self, marker: Option<PulseId>) -> LatestPulseResponse {
        match self.latest_pulse_since(marker).await {
            Some(pulse) => LatestPulseResponse {
                has_pulse: true,
                session_id: Some(pulse.session_id),
                pulse_id: Some(pulse.id),
                judge_id: Some(pulse.judge_id),
                judge_name: self.roster.name_of(pulse.judge_id).map(str::to_string),
            },
            None => LatestPulseResponse::none(),
        }
    }
}
