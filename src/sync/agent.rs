use super::view::*;
use crate::client::GameClient;
use crate::config::AgentRole;
use crate::protocol::{ErrorBody, ErrorCode, VoteRequest};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;

/// User input forwarded into the agent loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Vote { points: u8 },
    Pulse,
    Reset,
}

/// Keeps one device's view in step with the server.
///
/// Effects are published on a broadcast channel; the latest view is
/// available through a watch channel for anything that renders state.
pub struct SyncAgent<C: GameClient> {
    client: C,
    view: ViewState,
    effects_tx: broadcast::Sender<SideEffect>,
    view_tx: watch::Sender<ViewState>,
}

impl<C: GameClient> SyncAgent<C> {
    pub fn new(client: C, role: AgentRole) -> Self {
        let view = ViewState::new(role);
        let (effects_tx, _) = broadcast::channel(256);
        let (view_tx, _) = watch::channel(view.clone());

        Self {
            client,
            view,
            effects_tx,
            view_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SideEffect> {
        self.effects_tx.subscribe()
    }

    pub fn watch_view(&self) -> watch::Receiver<ViewState> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    fn apply(&mut self, next: ViewState, effects: Vec<SideEffect>) -> Vec<SideEffect> {
        self.view = next;
        for effect in &effects {
            tracing::debug!(?effect, "Side effect");
            // Ignore send errors (nobody listening is fine)
            let _ = self.effects_tx.send(effect.clone());
        }
        self.view_tx.send_replace(self.view.clone());
        effects
    }

    /// One status tick. Failures leave the view untouched.
    pub async fn poll_status(&mut self) -> Vec<SideEffect> {
        let snapshot = match self.client.status().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Status poll failed: {}", e);
                return Vec::new();
            }
        };

        let (next, effects) = reconcile(&self.view, &snapshot);
        let mut effects = self.apply(next, effects);

        if self.view.pending_vote().is_some() {
            effects.extend(self.send_pending_vote().await);
        }
        effects
    }

    /// One tick of the display's separate pulse cadence
    pub async fn poll_pulse(&mut self) -> Vec<SideEffect> {
        if self.view.role != AgentRole::Observer {
            return Vec::new();
        }

        let latest = match self.client.latest_pulse(self.view.last_played_pulse_id).await {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!("Pulse poll failed: {}", e);
                return Vec::new();
            }
        };

        let (next, effects) = reconcile_pulse(&self.view, &latest);
        self.apply(next, effects)
    }

    async fn send_pending_vote(&mut self) -> Vec<SideEffect> {
        let Some((judge_id, points, request_id)) = self.view.pending_vote() else {
            return Vec::new();
        };
        // Pinned to the round on screen so a resend never lands in a later one
        let request = VoteRequest {
            judge_id,
            requested_points: points,
            request_id: Some(request_id.to_string()),
            session_id: self.view.last_seen_session_id,
        };

        let outcome = match self.client.vote(&request).await {
            Ok(response) => VoteOutcome::Accepted(response.resulting_points),
            Err(e) if e.is_transient() => {
                tracing::warn!(judge_id, "Vote not delivered, will resend: {}", e);
                VoteOutcome::Failed
            }
            Err(e) => {
                let body = e
                    .rejection()
                    .cloned()
                    .unwrap_or_else(|| ErrorBody::new(ErrorCode::BadRequest, e.to_string()));
                tracing::info!(judge_id, "Vote rejected: {}", body.message);
                VoteOutcome::Rejected(body)
            }
        };

        let (next, effects) = self.view.settle_vote(outcome);
        self.apply(next, effects)
    }

    pub async fn handle(&mut self, command: Command) -> Vec<SideEffect> {
        match command {
            Command::Vote { points } => {
                let request_id = ulid::Ulid::new().to_string();
                let (next, mut effects) = self.view.request_vote(points, request_id);
                effects = self.apply(next, effects);
                if self.view.pending_vote().is_some() {
                    effects.extend(self.send_pending_vote().await);
                }
                effects
            }
            Command::Pulse => {
                let AgentRole::Submitter { judge_id } = self.view.role else {
                    return Vec::new();
                };
                match self.client.pulse(judge_id).await {
                    Ok(response) => {
                        tracing::debug!(judge_id, pulse_id = response.pulse_id, "Pulse sent")
                    }
                    Err(e) => tracing::warn!(judge_id, "Pulse failed: {}", e),
                }
                Vec::new()
            }
            Command::Reset => {
                let next = self.view.request_reset();
                self.apply(next, Vec::new());
                match self.client.reset().await {
                    Ok(response) => tracing::info!(
                        round_number = response.round_number,
                        "Reset requested"
                    ),
                    Err(e) => tracing::warn!("Reset failed: {}", e),
                }
                Vec::new()
            }
        }
    }

    /// Drive the agent until the command channel closes. Returns the final view.
    pub async fn run(
        mut self,
        poll_interval: Duration,
        pulse_interval: Option<Duration>,
        mut commands: mpsc::Receiver<Command>,
    ) -> ViewState {
        let mut status_tick = tokio::time::interval(poll_interval);
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pulse_tick = pulse_interval
            .filter(|_| self.view.role == AgentRole::Observer)
            .map(|every| {
                let mut tick = tokio::time::interval(every);
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                tick
            });

        tracing::info!(role = ?self.view.role, ?poll_interval, ?pulse_interval, "Sync agent started");

        loop {
            tokio::select! {
                _ = status_tick.tick() => {
                    self.poll_status().await;
                }

                _ = async {
                    match &mut pulse_tick {
                        Some(tick) => {
                            tick.tick().await;
                        }
                        // No separate pulse cadence: wait forever
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    self.poll_pulse().await;
                }

                command = commands.recv() => {
                    match command {
                        Some(command) => {
                            self.handle(command).await;
                        }
                        None => {
                            tracing::info!("Command channel closed, stopping sync agent");
                            break;
                        }
                    }
                }
            }
        }

        self.view
    }
}
