//! Per-device view state and the pure reconciliation step.
//!
//! Every transition of a device's view goes through one of the functions in
//! this module. None of them touch the network or a clock, so the whole
//! side-effect policy is testable with plain snapshots.

use crate::config::AgentRole;
use crate::protocol::{ErrorBody, ErrorCode, LatestPulseResponse, PulseRef, StatusSnapshot};
use crate::types::*;
use std::collections::BTreeMap;

/// Something the presentation layer should do exactly once
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// A different round (or no round) is now shown; all per-round UI was cleared
    SessionStarted {
        session_id: Option<SessionId>,
        round_number: u32,
    },
    /// Total votes went up within the current round
    VoteChime { total_votes: u32 },
    /// IPPON: play the threshold audio
    ThresholdReached { total_votes: u32 },
    /// Play the cheer sound for a pulse
    PlayPulse { pulse_id: PulseId, judge_id: JudgeId },
    /// Disable the vote buttons
    ControlsLocked { points: u8 },
    /// Re-enable the vote buttons
    ControlsUnlocked,
    VoteAccepted { points: u8 },
    VoteRejected { reason: String },
}

/// Judge device flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitterPhase {
    Idle,
    /// A vote is in flight or waiting to be re-sent with the same request id
    Submitting { points: u8, request_id: String },
    Submitted,
}

/// Display flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverPhase {
    Idle,
    /// This display asked for a reset; the next snapshot settles it
    AwaitingNextPoll,
}

/// How a vote submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Accepted(u8),
    Rejected(ErrorBody),
    /// Transport failure: keep the request and re-send it
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub role: AgentRole,
    /// False until the first snapshot has been applied
    pub synced: bool,
    pub last_seen_session_id: Option<SessionId>,
    pub round_number: u32,
    pub last_seen_total_votes: u32,
    pub has_announced_threshold: bool,
    pub banner_visible: bool,
    pub last_played_pulse_id: Option<PulseId>,
    pub judge_votes: BTreeMap<JudgeId, u8>,
    pub submitter: SubmitterPhase,
    pub observer: ObserverPhase,
}

impl ViewState {
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            synced: false,
            last_seen_session_id: None,
            round_number: 0,
            last_seen_total_votes: 0,
            has_announced_threshold: false,
            banner_visible: false,
            last_played_pulse_id: None,
            judge_votes: BTreeMap::new(),
            submitter: SubmitterPhase::Idle,
            observer: ObserverPhase::Idle,
        }
    }

    pub fn has_submitted_this_session(&self) -> bool {
        self.submitter == SubmitterPhase::Submitted
    }

    /// Vote buttons are disabled while submitting and after a vote landed
    pub fn controls_locked(&self) -> bool {
        self.submitter != SubmitterPhase::Idle
    }

    pub fn own_points(&self) -> Option<u8> {
        match self.role {
            AgentRole::Submitter { judge_id } => {
                Some(self.judge_votes.get(&judge_id).copied().unwrap_or(0))
            }
            AgentRole::Observer => None,
        }
    }

    /// The vote that still has to reach the server, if any
    pub fn pending_vote(&self) -> Option<(JudgeId, u8, &str)> {
        match (&self.role, &self.submitter) {
            (AgentRole::Submitter { judge_id }, SubmitterPhase::Submitting { points, request_id }) => {
                Some((*judge_id, *points, request_id.as_str()))
            }
            _ => None,
        }
    }

    fn is_observer(&self) -> bool {
        self.role == AgentRole::Observer
    }

    /// The user pressed a vote button
    pub fn request_vote(&self, points: u8, request_id: String) -> (ViewState, Vec<SideEffect>) {
        if !matches!(self.role, AgentRole::Submitter { .. }) {
            return (self.clone(), Vec::new());
        }

        match self.submitter {
            SubmitterPhase::Idle => {
                let mut next = self.clone();
                next.submitter = SubmitterPhase::Submitting { points, request_id };
                (next, vec![SideEffect::ControlsLocked { points: 0 }])
            }
            SubmitterPhase::Submitting { .. } => (self.clone(), Vec::new()),
            SubmitterPhase::Submitted => (
                self.clone(),
                vec![SideEffect::VoteRejected {
                    reason: "Already voted this round".to_string(),
                }],
            ),
        }
    }

    /// The server answered (or failed to answer) the pending vote
    pub fn settle_vote(&self, outcome: VoteOutcome) -> (ViewState, Vec<SideEffect>) {
        if !matches!(self.submitter, SubmitterPhase::Submitting { .. }) {
            return (self.clone(), Vec::new());
        }

        let mut next = self.clone();
        let mut effects = Vec::new();

        match outcome {
            VoteOutcome::Accepted(points) => {
                if let AgentRole::Submitter { judge_id } = self.role {
                    next.judge_votes.insert(judge_id, points);
                }
                effects.push(SideEffect::VoteAccepted { points });
                if points > 0 {
                    next.submitter = SubmitterPhase::Submitted;
                } else {
                    next.submitter = SubmitterPhase::Idle;
                    effects.push(SideEffect::ControlsUnlocked);
                }
            }
            VoteOutcome::Rejected(body) => {
                // A cap rejection is locked again by the next snapshot
                if let (ErrorCode::VoteCapExceeded, Some(points), AgentRole::Submitter { judge_id }) =
                    (body.error, body.current_points, self.role)
                {
                    next.judge_votes.insert(judge_id, points);
                }
                next.submitter = SubmitterPhase::Idle;
                effects.push(SideEffect::VoteRejected {
                    reason: body.message,
                });
                effects.push(SideEffect::ControlsUnlocked);
            }
            VoteOutcome::Failed => {}
        }

        (next, effects)
    }

    /// The display's reset button was pressed
    pub fn request_reset(&self) -> ViewState {
        let mut next = self.clone();
        if next.is_observer() {
            next.observer = ObserverPhase::AwaitingNextPoll;
        }
        next
    }
}

/// Fold a fresh status snapshot into the view.
///
/// A change of session id wipes the view before any other rule runs, and
/// nothing that depends on the jump in totals fires on that tick.
pub fn reconcile(prev: &ViewState, snapshot: &StatusSnapshot) -> (ViewState, Vec<SideEffect>) {
    let boundary = !prev.synced || prev.last_seen_session_id != snapshot.session_id;

    let mut next = if boundary {
        ViewState::new(prev.role)
    } else {
        prev.clone()
    };
    if !prev.synced {
        // A vote pressed before the first snapshot is not tied to a stale round
        next.submitter = prev.submitter.clone();
    }
    next.synced = true;
    next.last_seen_session_id = snapshot.session_id;
    next.round_number = snapshot.round_number;
    next.judge_votes = snapshot.per_judge_votes.clone();

    let mut effects = Vec::new();
    if boundary {
        effects.push(SideEffect::SessionStarted {
            session_id: snapshot.session_id,
            round_number: snapshot.round_number,
        });
    }

    match prev.role {
        AgentRole::Submitter { judge_id } => {
            if snapshot.points_of(judge_id) > 0 {
                next.submitter = SubmitterPhase::Submitted;
            }
            match (prev.controls_locked(), next.controls_locked()) {
                (false, true) => effects.push(SideEffect::ControlsLocked {
                    points: snapshot.points_of(judge_id),
                }),
                (true, false) => effects.push(SideEffect::ControlsUnlocked),
                _ => {}
            }
        }
        AgentRole::Observer => {
            if boundary {
                // Baseline the new round; a stale threshold flag or a jump in
                // totals is not a crossing.
                next.last_seen_total_votes = snapshot.total_votes;
                next.banner_visible = false;
                if prev.synced {
                    apply_pulse_rule(&mut next, snapshot.latest_pulse.as_ref(), &mut effects);
                } else {
                    next.last_played_pulse_id = snapshot.latest_pulse.as_ref().map(|p| p.id);
                }
            } else {
                if snapshot.total_votes > prev.last_seen_total_votes {
                    effects.push(SideEffect::VoteChime {
                        total_votes: snapshot.total_votes,
                    });
                }
                next.last_seen_total_votes = snapshot.total_votes;

                if snapshot.threshold_reached {
                    next.banner_visible = true;
                    if !prev.has_announced_threshold && prev.observer == ObserverPhase::Idle {
                        next.has_announced_threshold = true;
                        effects.push(SideEffect::ThresholdReached {
                            total_votes: snapshot.total_votes,
                        });
                    }
                } else {
                    next.banner_visible = false;
                }

                apply_pulse_rule(&mut next, snapshot.latest_pulse.as_ref(), &mut effects);
            }
            next.observer = ObserverPhase::Idle;
        }
    }

    (next, effects)
}

/// Fold a pulse fetched on the display's separate pulse cadence into the view.
///
/// Pulses from a session the status poll has not reached yet are left for it.
pub fn reconcile_pulse(prev: &ViewState, latest: &LatestPulseResponse) -> (ViewState, Vec<SideEffect>) {
    if !prev.is_observer() || !prev.synced || prev.last_seen_session_id.is_none() {
        return (prev.clone(), Vec::new());
    }
    if latest.session_id.is_some() && latest.session_id != prev.last_seen_session_id {
        return (prev.clone(), Vec::new());
    }

    let mut next = prev.clone();
    let mut effects = Vec::new();
    apply_pulse_rule(&mut next, latest.pulse_ref().as_ref(), &mut effects);
    (next, effects)
}

fn apply_pulse_rule(view: &mut ViewState, latest: Option<&PulseRef>, effects: &mut Vec<SideEffect>) {
    if let Some(pulse) = latest {
        if view.last_played_pulse_id != Some(pulse.id) {
            view.last_played_pulse_id = Some(pulse.id);
            effects.push(SideEffect::PlayPulse {
                pulse_id: pulse.id,
                judge_id: pulse.judge_id,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(session_id: Option<SessionId>, points: [u8; 5], pulse: Option<(PulseId, JudgeId)>) -> StatusSnapshot {
        let per_judge_votes: BTreeMap<JudgeId, u8> =
            (1..=5u8).zip(points.iter().copied()).collect();
        let total_votes: u32 = points.iter().map(|&p| u32::from(p)).sum();
        StatusSnapshot {
            session_id,
            round_number: session_id.map(|id| id as u32).unwrap_or(0),
            total_votes,
            max_votes: 15,
            threshold: 8,
            per_judge_votes,
            threshold_reached: total_votes >= 8,
            latest_pulse: pulse.map(|(id, judge_id)| PulseRef {
                id,
                judge_id,
                created_at: None,
            }),
        }
    }

    fn run(view: ViewState, snapshots: &[StatusSnapshot]) -> (ViewState, Vec<SideEffect>) {
        let mut view = view;
        let mut all = Vec::new();
        for s in snapshots {
            let (next, effects) = reconcile(&view, s);
            view = next;
            all.extend(effects);
        }
        (view, all)
    }

    fn count(effects: &[SideEffect], pred: impl Fn(&SideEffect) -> bool) -> usize {
        effects.iter().filter(|e| pred(e)).count()
    }

    fn observer() -> ViewState {
        ViewState::new(AgentRole::Observer)
    }

    fn submitter(judge_id: JudgeId) -> ViewState {
        ViewState::new(AgentRole::Submitter { judge_id })
    }

    #[test]
    fn test_first_snapshot_is_a_quiet_boundary() {
        let (view, effects) = reconcile(&observer(), &snapshot(Some(1), [3, 3, 2, 0, 0], Some((40, 2))));

        assert_eq!(
            effects,
            vec![SideEffect::SessionStarted {
                session_id: Some(1),
                round_number: 1
            }]
        );
        assert!(view.synced);
        assert_eq!(view.last_seen_total_votes, 8);
        assert_eq!(view.last_played_pulse_id, Some(40));
        assert!(!view.has_announced_threshold);
        assert!(!view.banner_visible);
    }

    #[test]
    fn test_threshold_fires_once_per_session() {
        let (view, effects) = run(
            observer(),
            &[
                snapshot(Some(1), [0, 0, 0, 0, 0], None),
                snapshot(Some(1), [3, 2, 2, 0, 0], None),
                snapshot(Some(1), [3, 2, 2, 1, 0], None),
                snapshot(Some(1), [3, 3, 2, 1, 0], None),
            ],
        );

        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::ThresholdReached { .. })),
            1
        );
        assert!(view.has_announced_threshold);
        assert!(view.banner_visible);
    }

    #[test]
    fn test_threshold_drop_hides_banner_without_effect() {
        let (view, _) = run(
            observer(),
            &[
                snapshot(Some(1), [0, 0, 0, 0, 0], None),
                snapshot(Some(1), [3, 3, 2, 0, 0], None),
            ],
        );
        assert!(view.banner_visible);

        let (view, effects) = reconcile(&view, &snapshot(Some(1), [3, 3, 1, 0, 0], None));
        assert!(!view.banner_visible);
        assert!(effects.is_empty());

        // Coming back above the line in the same round only shows the banner
        let (view, effects) = reconcile(&view, &snapshot(Some(1), [3, 3, 2, 0, 0], None));
        assert!(view.banner_visible);
        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::ThresholdReached { .. })),
            0
        );
    }

    #[test]
    fn test_session_change_suppresses_threshold_from_stale_totals() {
        let (view, _) = run(observer(), &[snapshot(Some(1), [1, 0, 0, 0, 0], None)]);

        // New session id, but residual data already above the threshold
        let (view, effects) = reconcile(&view, &snapshot(Some(2), [3, 3, 3, 0, 0], None));

        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::ThresholdReached { .. })),
            0
        );
        assert_eq!(count(&effects, |e| matches!(e, SideEffect::VoteChime { .. })), 0);
        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::SessionStarted { .. })),
            1
        );
        assert!(!view.has_announced_threshold);
        assert_eq!(view.last_seen_session_id, Some(2));
    }

    #[test]
    fn test_threshold_can_fire_again_in_next_session() {
        let (_, effects) = run(
            observer(),
            &[
                snapshot(Some(1), [0, 0, 0, 0, 0], None),
                snapshot(Some(1), [3, 3, 3, 0, 0], None),
                snapshot(Some(2), [0, 0, 0, 0, 0], None),
                snapshot(Some(2), [3, 3, 2, 0, 0], None),
            ],
        );

        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::ThresholdReached { .. })),
            2
        );
    }

    #[test]
    fn test_vote_chime_on_increase_only() {
        let (_, effects) = run(
            observer(),
            &[
                snapshot(Some(1), [0, 0, 0, 0, 0], None),
                snapshot(Some(1), [1, 0, 0, 0, 0], None),
                snapshot(Some(1), [1, 0, 0, 0, 0], None),
                snapshot(Some(1), [1, 2, 0, 0, 0], None),
            ],
        );

        assert_eq!(
            effects
                .iter()
                .filter_map(|e| match e {
                    SideEffect::VoteChime { total_votes } => Some(*total_votes),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_two_pulses_play_exactly_twice() {
        let (view, effects) = run(
            observer(),
            &[
                snapshot(Some(1), [0; 5], None),
                snapshot(Some(1), [0; 5], Some((101, 1))),
                snapshot(Some(1), [0; 5], Some((101, 1))),
                snapshot(Some(1), [0; 5], Some((101, 1))),
                snapshot(Some(1), [0; 5], Some((102, 4))),
                snapshot(Some(1), [0; 5], Some((102, 4))),
            ],
        );

        let played: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::PlayPulse { pulse_id, .. } => Some(*pulse_id),
                _ => None,
            })
            .collect();
        assert_eq!(played, vec![101, 102]);
        assert_eq!(view.last_played_pulse_id, Some(102));
    }

    #[test]
    fn test_pulse_in_new_session_plays_after_boundary() {
        let (_, effects) = run(
            observer(),
            &[
                snapshot(Some(1), [0; 5], Some((10, 1))),
                snapshot(Some(2), [0; 5], Some((11, 3))),
                snapshot(Some(2), [0; 5], Some((11, 3))),
            ],
        );

        let played: Vec<_> = effects
            .iter()
            .filter(|e| matches!(e, SideEffect::PlayPulse { .. }))
            .collect();
        assert_eq!(
            played,
            vec![&SideEffect::PlayPulse {
                pulse_id: 11,
                judge_id: 3
            }]
        );
    }

    #[test]
    fn test_separate_pulse_cadence_shares_dedup() {
        let (view, _) = run(observer(), &[snapshot(Some(1), [0; 5], None)]);

        let latest = LatestPulseResponse {
            has_pulse: true,
            session_id: Some(1),
            pulse_id: Some(101),
            judge_id: Some(2),
            judge_name: Some("Judge 2".to_string()),
        };
        let (view, effects) = reconcile_pulse(&view, &latest);
        assert_eq!(effects.len(), 1);

        let (view, effects) = reconcile_pulse(&view, &latest);
        assert!(effects.is_empty());

        // The status poll then reports the same pulse: still no replay
        let (_, effects) = reconcile(&view, &snapshot(Some(1), [0; 5], Some((101, 2))));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_pulse_cadence_ignores_pulses_from_unseen_session() {
        let (view, _) = run(observer(), &[snapshot(Some(1), [0; 5], None)]);
        let latest = LatestPulseResponse {
            has_pulse: true,
            session_id: Some(2),
            pulse_id: Some(7),
            judge_id: Some(1),
            judge_name: None,
        };

        let (next, effects) = reconcile_pulse(&view, &latest);
        assert!(effects.is_empty());
        assert_eq!(next, view);
    }

    #[test]
    fn test_reset_request_suppresses_threshold_until_next_poll() {
        let (view, _) = run(observer(), &[snapshot(Some(1), [3, 3, 0, 0, 0], None)]);
        let view = view.request_reset();
        assert_eq!(view.observer, ObserverPhase::AwaitingNextPoll);

        // The poll right after pressing reset still sees the old round crossing
        let (view, effects) = reconcile(&view, &snapshot(Some(1), [3, 3, 2, 0, 0], None));
        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::ThresholdReached { .. })),
            0
        );
        assert_eq!(view.observer, ObserverPhase::Idle);

        let (view, effects) = reconcile(&view, &snapshot(Some(2), [0; 5], None));
        assert_eq!(view.observer, ObserverPhase::Idle);
        assert_eq!(
            count(&effects, |e| matches!(e, SideEffect::SessionStarted { .. })),
            1
        );
    }

    #[test]
    fn test_submitter_locks_once_own_points_land() {
        let view = submitter(2);
        let (view, effects) = reconcile(&view, &snapshot(Some(1), [0; 5], None));
        assert!(!view.controls_locked());
        assert!(!effects.iter().any(|e| matches!(e, SideEffect::ControlsLocked { .. })));

        let (view, effects) = reconcile(&view, &snapshot(Some(1), [0, 2, 0, 0, 0], None));
        assert!(view.has_submitted_this_session());
        assert_eq!(effects, vec![SideEffect::ControlsLocked { points: 2 }]);

        let (view, effects) = reconcile(&view, &snapshot(Some(1), [3, 2, 0, 0, 0], None));
        assert!(view.has_submitted_this_session());
        assert!(effects.is_empty());
        assert_eq!(view.own_points(), Some(2));
    }

    #[test]
    fn test_submitter_unlocks_on_new_session() {
        let (view, _) = run(
            submitter(1),
            &[
                snapshot(Some(1), [0; 5], None),
                snapshot(Some(1), [1, 0, 0, 0, 0], None),
            ],
        );
        assert!(view.controls_locked());

        let (view, effects) = reconcile(&view, &snapshot(Some(2), [0; 5], None));
        assert!(!view.has_submitted_this_session());
        assert!(!view.controls_locked());
        assert!(effects.contains(&SideEffect::ControlsUnlocked));
    }

    #[test]
    fn test_submitter_never_drives_display_effects() {
        let (_, effects) = run(
            submitter(5),
            &[
                snapshot(Some(1), [0; 5], None),
                snapshot(Some(1), [3, 3, 3, 0, 0], Some((9, 1))),
            ],
        );

        assert!(!effects.iter().any(|e| matches!(
            e,
            SideEffect::ThresholdReached { .. } | SideEffect::PlayPulse { .. } | SideEffect::VoteChime { .. }
        )));
    }

    #[test]
    fn test_vote_request_flow() {
        let (view, _) = reconcile(&submitter(3), &snapshot(Some(1), [0; 5], None));

        let (view, effects) = view.request_vote(2, "req-1".to_string());
        assert_eq!(view.pending_vote(), Some((3, 2, "req-1")));
        assert_eq!(effects, vec![SideEffect::ControlsLocked { points: 0 }]);

        // Double press while in flight is ignored
        let (view, effects) = view.request_vote(3, "req-2".to_string());
        assert_eq!(view.pending_vote(), Some((3, 2, "req-1")));
        assert!(effects.is_empty());

        // Transport failure keeps the same request for a retry
        let (view, effects) = view.settle_vote(VoteOutcome::Failed);
        assert_eq!(view.pending_vote(), Some((3, 2, "req-1")));
        assert!(effects.is_empty());

        let (view, effects) = view.settle_vote(VoteOutcome::Accepted(2));
        assert!(view.has_submitted_this_session());
        assert_eq!(view.own_points(), Some(2));
        assert_eq!(effects, vec![SideEffect::VoteAccepted { points: 2 }]);

        let (_, effects) = view.request_vote(1, "req-3".to_string());
        assert!(matches!(effects[0], SideEffect::VoteRejected { .. }));
    }

    #[test]
    fn test_rejected_vote_unlocks_controls() {
        let (view, _) = reconcile(&submitter(1), &snapshot(None, [0; 5], None));
        let (view, _) = view.request_vote(1, "req".to_string());

        let (view, effects) = view.settle_vote(VoteOutcome::Rejected(ErrorBody {
            ok: false,
            error: ErrorCode::NoActiveSession,
            message: "No active session".to_string(),
            current_points: None,
            active_session_id: None,
        }));

        assert_eq!(view.submitter, SubmitterPhase::Idle);
        assert_eq!(
            effects,
            vec![
                SideEffect::VoteRejected {
                    reason: "No active session".to_string()
                },
                SideEffect::ControlsUnlocked
            ]
        );
    }

    #[test]
    fn test_cap_rejection_is_locked_by_next_snapshot() {
        let (view, _) = reconcile(&submitter(1), &snapshot(Some(1), [0; 5], None));
        let (view, _) = view.request_vote(1, "req".to_string());

        let (view, _) = view.settle_vote(VoteOutcome::Rejected(ErrorBody {
            ok: false,
            error: ErrorCode::VoteCapExceeded,
            message: "Maximum 3 votes per judge".to_string(),
            current_points: Some(3),
            active_session_id: None,
        }));
        assert_eq!(view.submitter, SubmitterPhase::Idle);
        assert_eq!(view.own_points(), Some(3));

        let (view, effects) = reconcile(&view, &snapshot(Some(1), [3, 0, 0, 0, 0], None));
        assert!(view.has_submitted_this_session());
        assert_eq!(effects, vec![SideEffect::ControlsLocked { points: 3 }]);
    }

    #[test]
    fn test_vote_landing_before_response_settles_from_snapshot() {
        let (view, _) = reconcile(&submitter(4), &snapshot(Some(1), [0; 5], None));
        let (view, _) = view.request_vote(1, "req".to_string());

        // Response lost, but the next poll shows the vote applied
        let (view, effects) = reconcile(&view, &snapshot(Some(1), [0, 0, 0, 1, 0], None));
        assert!(view.has_submitted_this_session());
        assert!(view.pending_vote().is_none());
        // Controls were already locked while submitting
        assert!(effects.is_empty());
    }

    #[test]
    fn test_vote_pressed_before_first_snapshot_survives_it() {
        let (view, _) = submitter(2).request_vote(1, "early".to_string());
        let (view, effects) = reconcile(&view, &snapshot(Some(1), [0; 5], None));

        assert_eq!(view.pending_vote(), Some((2, 1, "early")));
        assert!(!effects.contains(&SideEffect::ControlsUnlocked));
    }

    #[test]
    fn test_pending_vote_is_dropped_at_session_boundary() {
        let (view, _) = reconcile(&submitter(4), &snapshot(Some(1), [0; 5], None));
        let (view, _) = view.request_vote(1, "req".to_string());

        let (view, effects) = reconcile(&view, &snapshot(Some(2), [0; 5], None));
        assert!(view.pending_vote().is_none());
        assert!(effects.contains(&SideEffect::ControlsUnlocked));
    }
}
