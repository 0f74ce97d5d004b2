//! Remote profile snapshots and best-effort persistence types.
//!
//! The profile store is an opaque collaborator. Every read is allowed to
//! fail without consequence: a failed poll leaves the previous snapshot in
//! place and gameplay continues from in-memory state. Writes are
//! fire-and-forget at the engine level.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ENERGY;
use crate::profile::PlayerStats;

/// One row of the shared profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default = "default_energy")]
    pub energy: i32,
    #[serde(default)]
    pub completed_levels: Vec<u32>,
    #[serde(default)]
    pub current_node_index: usize,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub updated_at_ms: u64,
}

const fn default_energy() -> i32 {
    MAX_ENERGY
}

impl Default for ProfileRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            email: String::new(),
            full_name: String::new(),
            avatar_url: None,
            school: String::new(),
            score: 0,
            energy: MAX_ENERGY,
            completed_levels: Vec::new(),
            current_node_index: 0,
            is_guest: false,
            updated_at_ms: 0,
        }
    }
}

/// Identity payload handed over by the auth flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Partial update pushed after progress changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub energy: Option<i32>,
    #[serde(default)]
    pub completed_levels: Option<Vec<u32>>,
    #[serde(default)]
    pub current_node_index: Option<usize>,
    #[serde(default)]
    pub updated_at_ms: Option<u64>,
}

impl ProfileUpdate {
    /// Snapshot the persisted slice of the player state.
    #[must_use]
    pub fn from_stats(stats: &PlayerStats, now_ms: u64) -> Self {
        Self {
            score: Some(stats.progress.score),
            energy: Some(stats.progress.energy),
            completed_levels: Some(stats.completed_levels.clone()),
            current_node_index: Some(stats.progress.current_node_index),
            updated_at_ms: Some(now_ms),
        }
    }
}

/// Latest successfully polled roster of real participants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteRoster {
    records: Vec<ProfileRecord>,
    last_poll_ms: u64,
}

impl RemoteRoster {
    #[must_use]
    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    #[must_use]
    pub const fn last_poll_ms(&self) -> u64 {
        self.last_poll_ms
    }

    /// Fold a poll outcome into the snapshot. Failures keep prior state.
    pub fn apply_poll<E: std::error::Error>(
        &mut self,
        outcome: Result<Vec<ProfileRecord>, E>,
        now_ms: u64,
    ) {
        match outcome {
            Ok(records) => {
                self.records = records;
                self.last_poll_ms = now_ms;
            }
            Err(err) => {
                log::warn!("roster poll failed, keeping previous snapshot: {err}");
            }
        }
    }
}

/// Aggregate figures for the supervisor dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdminOverview {
    pub total_players: usize,
    pub sso_players: usize,
    pub guest_players: usize,
    pub average_score: u32,
}

/// Summarize a profile listing.
#[must_use]
pub fn admin_overview(records: &[ProfileRecord]) -> AdminOverview {
    let total_players = records.len();
    let guest_players = records.iter().filter(|record| record.is_guest).count();
    let total_score: u64 = records.iter().map(|record| u64::from(record.score)).sum();
    let average_score = if total_players == 0 {
        0
    } else {
        u32::try_from(total_score / total_players as u64).unwrap_or(u32::MAX)
    };
    AdminOverview {
        total_players,
        sso_players: total_players - guest_players,
        guest_players,
        average_score,
    }
}
