use serde::{Deserialize, Serialize};

/// Server-assigned, monotonic identifiers
pub type SessionId = u64;
pub type PulseId = u64;
/// Judges are small integers handed out of band (1-based)
pub type JudgeId = u8;

/// Maximum points a single judge can hold in one session
pub const MAX_POINTS_PER_JUDGE: u8 = 3;
pub const DEFAULT_JUDGE_COUNT: u8 = 5;
/// Total votes needed for an IPPON (out of 15 with five judges)
pub const DEFAULT_THRESHOLD: u32 = 8;

/// Scoring rules for a game. Fixed for the lifetime of a server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    pub judge_count: u8,
    pub threshold: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            judge_count: DEFAULT_JUDGE_COUNT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl GameRules {
    pub fn max_votes(&self) -> u32 {
        u32::from(self.judge_count) * u32::from(MAX_POINTS_PER_JUDGE)
    }

    pub fn is_threshold_reached(&self, total_votes: u32) -> bool {
        total_votes >= self.threshold
    }
}

/// One scored contest instance. Only `is_active` ever changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub round_number: u32,
    pub is_active: bool,
    pub created_at: String,
}

/// A judge's current points for one session, keyed by (session_id, judge_id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub session_id: SessionId,
    pub judge_id: JudgeId,
    pub points: u8,
    pub last_voted_at: String,
    /// Client-chosen id of the last applied request, used to absorb retries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request_id: Option<String>,
}

/// Immutable cheer event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PulseEvent {
    pub id: PulseId,
    pub session_id: SessionId,
    pub judge_id: JudgeId,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Judge {
    pub id: JudgeId,
    pub name: String,
}

/// The fixed set of judges allowed to vote and cheer
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeRoster {
    judges: Vec<Judge>,
}

impl JudgeRoster {
    /// Judges numbered 1..=count. Missing names default to "Judge N".
    pub fn new(count: u8, names: &[String]) -> Self {
        let judges = (1..=count)
            .map(|id| Judge {
                id,
                name: names
                    .get(usize::from(id - 1))
                    .cloned()
                    .unwrap_or_else(|| format!("Judge {}", id)),
            })
            .collect();
        Self { judges }
    }

    pub fn contains(&self, judge_id: JudgeId) -> bool {
        self.judges.iter().any(|j| j.id == judge_id)
    }

    pub fn name_of(&self, judge_id: JudgeId) -> Option<&str> {
        self.judges
            .iter()
            .find(|j| j.id == judge_id)
            .map(|j| j.name.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = JudgeId> + '_ {
        self.judges.iter().map(|j| j.id)
    }

    pub fn len(&self) -> usize {
        self.judges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judges.is_empty()
    }
}

impl Default for JudgeRoster {
    fn default() -> Self {
        Self::new(DEFAULT_JUDGE_COUNT, &[])
    }
}
