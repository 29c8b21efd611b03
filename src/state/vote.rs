use super::{now, AppState};
use crate::error::{LedgerError, LedgerResult};
use crate::protocol::VoteRequest;
use crate::types::*;

impl AppState {
    /// Add `requested_points` to a judge's tally for the active round.
    ///
    /// The new value is derived from the stored record only, clamped to the
    /// per-judge cap. A judge already at the cap is rejected. A retry carrying
    /// the `request_id` of the last applied vote returns the stored points
    /// without applying anything.
    pub async fn submit_vote(
        &self,
        judge_id: JudgeId,
        requested_points: u8,
        request_id: Option<String>,
    ) -> LedgerResult<u8> {
        self.apply_vote(VoteRequest {
            judge_id,
            requested_points,
            request_id,
            session_id: None,
        })
        .await
    }

    /// Like `submit_vote`, but a request naming a session other than the
    /// active one is refused with `SessionMismatch`.
    pub async fn apply_vote(&self, request: VoteRequest) -> LedgerResult<u8> {
        let VoteRequest {
            judge_id,
            requested_points,
            request_id,
            session_id: expected_session,
        } = request;

        if requested_points > MAX_POINTS_PER_JUDGE {
            return Err(LedgerError::InvalidPoints(requested_points));
        }

        let mut ledger = self.ledger.write().await;

        let session_id = ledger
            .active_session()
            .map(|s| s.id)
            .ok_or(LedgerError::NoActiveSession)?;

        if let Some(requested) = expected_session.filter(|&id| id != session_id) {
            return Err(LedgerError::SessionMismatch {
                requested,
                active_session_id: session_id,
            });
        }

        if !self.roster.contains(judge_id) {
            return Err(LedgerError::UnknownJudge(judge_id));
        }

        let votes = ledger.votes.entry(session_id).or_default();
        let existing = votes.get(&judge_id);

        if let (Some(record), Some(id)) = (existing, request_id.as_ref()) {
            if record.last_request_id.as_ref() == Some(id) {
                tracing::debug!(judge_id, request_id = %id, "Duplicate vote request, not re-applied");
                return Ok(record.points);
            }
        }

        let current_points = existing.map(|r| r.points).unwrap_or(0);
        if current_points >= MAX_POINTS_PER_JUDGE {
            return Err(LedgerError::VoteCapExceeded { current_points });
        }

        let new_points = current_points
            .saturating_add(requested_points)
            .min(MAX_POINTS_PER_JUDGE);

        votes.insert(
            judge_id,
            VoteRecord {
                session_id,
                judge_id,
                points: new_points,
                last_voted_at: now(),
                last_request_id: request_id,
            },
        );
        ledger.version += 1;

        tracing::info!(session_id, judge_id, points = new_points, "Vote recorded");
        Ok(new_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_vote_requires_active_session() {
        let state = AppState::new();
        let result = state.submit_vote(1, 1, None).await;
        assert_eq!(result, Err(LedgerError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_vote_rejects_unknown_judge() {
        let state = AppState::new();
        state.reset().await;

        assert_eq!(
            state.submit_vote(0, 1, None).await,
            Err(LedgerError::UnknownJudge(0))
        );
        assert_eq!(
            state.submit_vote(6, 1, None).await,
            Err(LedgerError::UnknownJudge(6))
        );
    }

    #[tokio::test]
    async fn test_vote_rejects_out_of_range_points() {
        let state = AppState::new();
        state.reset().await;

        assert_eq!(
            state.submit_vote(1, 4, None).await,
            Err(LedgerError::InvalidPoints(4))
        );
    }

    #[tokio::test]
    async fn test_votes_accumulate_and_clamp() {
        let state = AppState::new();
        state.reset().await;

        assert_eq!(state.submit_vote(1, 1, None).await, Ok(1));
        assert_eq!(state.submit_vote(1, 1, None).await, Ok(2));
        // 2 + 3 is clamped to the cap
        assert_eq!(state.submit_vote(1, 3, None).await, Ok(3));
    }

    #[tokio::test]
    async fn test_vote_at_cap_always_fails() {
        let state = AppState::new();
        state.reset().await;

        assert_eq!(state.submit_vote(2, 3, None).await, Ok(3));
        for requested in 0..=3 {
            assert_eq!(
                state.submit_vote(2, requested, None).await,
                Err(LedgerError::VoteCapExceeded { current_points: 3 })
            );
        }
    }

    #[tokio::test]
    async fn test_points_never_exceed_cap_for_any_sequence() {
        let sequences: &[&[u8]] = &[
            &[1, 1, 1, 1],
            &[2, 2],
            &[0, 3, 1],
            &[1, 0, 2, 3],
            &[3],
            &[0, 0, 0],
        ];

        for sequence in sequences {
            let state = AppState::new();
            state.reset().await;

            for &requested in sequence.iter() {
                match state.submit_vote(3, requested, None).await {
                    Ok(points) => assert!(points <= MAX_POINTS_PER_JUDGE),
                    Err(e) => {
                        assert_eq!(e, LedgerError::VoteCapExceeded { current_points: 3 })
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_zero_point_vote_leaves_tally_unchanged() {
        let state = AppState::new();
        state.reset().await;

        assert_eq!(state.submit_vote(4, 0, None).await, Ok(0));
        assert_eq!(state.submit_vote(4, 2, None).await, Ok(2));
        assert_eq!(state.submit_vote(4, 0, None).await, Ok(2));
    }

    #[tokio::test]
    async fn test_retry_with_same_request_id_is_not_reapplied() {
        let state = AppState::new();
        state.reset().await;

        let request_id = Some("01HZXAMPLE".to_string());
        assert_eq!(state.submit_vote(1, 1, request_id.clone()).await, Ok(1));
        assert_eq!(state.submit_vote(1, 1, request_id.clone()).await, Ok(1));
        assert_eq!(state.submit_vote(1, 1, request_id).await, Ok(1));

        // A fresh request is applied normally
        assert_eq!(
            state.submit_vote(1, 1, Some("01HZOTHER".to_string())).await,
            Ok(2)
        );
    }

    #[tokio::test]
    async fn test_retry_of_capping_vote_does_not_report_cap() {
        let state = AppState::new();
        state.reset().await;

        let request_id = Some("cap-request".to_string());
        assert_eq!(state.submit_vote(5, 3, request_id.clone()).await, Ok(3));
        assert_eq!(state.submit_vote(5, 3, request_id).await, Ok(3));
    }

    #[tokio::test]
    async fn test_votes_are_scoped_to_session() {
        let state = AppState::new();
        state.reset().await;
        state.submit_vote(1, 3, None).await.unwrap();

        state.reset().await;
        assert_eq!(state.submit_vote(1, 1, None).await, Ok(1));
    }

    #[tokio::test]
    async fn test_concurrent_votes_for_different_judges_are_independent() {
        let state = Arc::new(AppState::new());
        state.reset().await;

        let a = {
            let state = state.clone();
            tokio::spawn(async move {
                let mut last = 0;
                for _ in 0..3 {
                    last = state.submit_vote(1, 1, None).await.unwrap();
                }
                last
            })
        };
        let b = {
            let state = state.clone();
            tokio::spawn(async move { state.submit_vote(2, 1, None).await.unwrap() })
        };

        assert_eq!(a.await.unwrap(), 3);
        assert_eq!(b.await.unwrap(), 1);

        // Judge 1 at the cap does not affect judge 2
        assert!(state.submit_vote(1, 1, None).await.is_err());
        assert_eq!(state.submit_vote(2, 1, None).await, Ok(2));
    }

    #[tokio::test]
    async fn test_vote_for_previous_session_is_refused() {
        let state = AppState::new();
        let first = state.reset().await;
        let second = state.reset().await;

        let stale = VoteRequest {
            judge_id: 2,
            requested_points: 3,
            request_id: Some("pressed-in-round-1".to_string()),
            session_id: Some(first.id),
        };
        assert_eq!(
            state.apply_vote(stale).await,
            Err(LedgerError::SessionMismatch {
                requested: first.id,
                active_session_id: second.id,
            })
        );
        assert_eq!(state.snapshot().await.points_of(2), 0);

        let current = VoteRequest {
            judge_id: 2,
            requested_points: 2,
            request_id: None,
            session_id: Some(second.id),
        };
        assert_eq!(state.apply_vote(current).await, Ok(2));
    }
}
