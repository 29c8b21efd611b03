//! Per-judge throttling of cheer pulses.
//!
//! Pulses are unscored but trigger audio on the display, so a stuck button
//! or a looping script should not be able to flood the log.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::types::JudgeId;

/// Pulses a judge has sent in the current window
#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: Instant,
    pulses: u32,
}

impl Window {
    fn open(now: Instant) -> Self {
        Self {
            opened_at: now,
            pulses: 1,
        }
    }

    fn is_expired(&self, now: Instant, length: Duration) -> bool {
        now.duration_since(self.opened_at) >= length
    }
}

/// Fixed-window pulse budget, one window per judge
#[derive(Debug, Clone)]
pub struct PulseThrottle {
    windows: Arc<RwLock<HashMap<JudgeId, Window>>>,
    max_pulses: u32,
    window: Duration,
}

impl Default for PulseThrottle {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }
}

impl PulseThrottle {
    pub fn new(max_pulses: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_pulses,
            window,
        }
    }

    /// Count a pulse from `judge_id`. False once the judge's budget for the
    /// current window is spent; the refused pulse is not counted.
    pub async fn allow(&self, judge_id: JudgeId) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        match windows.get_mut(&judge_id) {
            Some(window) if window.is_expired(now, self.window) => {
                *window = Window::open(now);
                true
            }
            Some(window) if window.pulses >= self.max_pulses => false,
            Some(window) => {
                window.pulses += 1;
                true
            }
            None => {
                windows.insert(judge_id, Window::open(now));
                true
            }
        }
    }

    /// Forget judges whose last window ended a while ago
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| !window.is_expired(now, self.window * 2));
    }

    pub async fn tracked_judges(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Periodically prune the throttle so idle judges don't accumulate entries
pub fn spawn_throttle_pruning(throttle: PulseThrottle, every: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            throttle.prune().await;
        }
    });
}
