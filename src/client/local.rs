use super::*;
use crate::state::AppState;
use std::sync::Arc;

/// In-process client that calls the ledger directly.
///
/// Used by tests and single-process setups; bypasses the HTTP-level pulse throttle.
#[derive(Clone)]
pub struct LocalClient {
    state: Arc<AppState>,
}

impl LocalClient {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl GameClient for LocalClient {
    async fn status(&self) -> ClientResult<StatusSnapshot> {
        Ok(self.state.snapshot().await)
    }

    async fn latest_pulse(&self, after: Option<u64>) -> ClientResult<LatestPulseResponse> {
        Ok(self.state.latest_pulse(after).await)
    }

    async fn vote(&self, request: &VoteRequest) -> ClientResult<VoteResponse> {
        let resulting_points = self
            .state
            .apply_vote(request.clone())
            .await
            .map_err(|e| ClientError::Rejected(e.to_body()))?;
        Ok(VoteResponse {
            ok: true,
            resulting_points,
        })
    }

    async fn pulse(&self, judge_id: JudgeId) -> ClientResult<PulseResponse> {
        let pulse_id = self
            .state
            .append_pulse(judge_id)
            .await
            .map_err(|e| ClientError::Rejected(e.to_body()))?;
        Ok(PulseResponse { ok: true, pulse_id })
    }

    async fn reset(&self) -> ClientResult<ResetResponse> {
        let session = self.state.reset().await;
        Ok(ResetResponse {
            ok: true,
            round_number: session.round_number,
            session_id: session.id,
        })
    }
}
