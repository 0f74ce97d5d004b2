//! Score ranking as a pure projection.
//!
//! The ranking is recomputed from current state on every request and never
//! cached. Tie-break rule: stable sort over a fixed insertion order —
//! classmates in roster order, then the human entry, then remote snapshots
//! in store order. Equal scores therefore keep that relative order across
//! repeated computations.

use serde::{Deserialize, Serialize};

use crate::bots::Classmate;
use crate::profile::PlayerStats;
use crate::remote::ProfileRecord;

/// Participant id reserved for the human player's ranking entry.
pub const PLAYER_PARTICIPANT_ID: &str = "player";

/// Ephemeral, derived leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub participant_id: String,
    pub display_name: String,
    pub score: u32,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Project every participant into a score-descending leaderboard.
#[must_use]
pub fn compute_ranking(
    player: &PlayerStats,
    classmates: &[Classmate],
    remote: &[ProfileRecord],
) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> =
        Vec::with_capacity(classmates.len() + remote.len() + 1);
    entries.extend(classmates.iter().map(|mate| RankingEntry {
        participant_id: mate.id.clone(),
        display_name: mate.name.clone(),
        score: mate.progress.score,
        avatar_url: Some(mate.avatar_url.clone()),
    }));
    entries.push(RankingEntry {
        participant_id: PLAYER_PARTICIPANT_ID.to_string(),
        display_name: player.name.clone(),
        score: player.progress.score,
        avatar_url: player.avatar_url.clone(),
    });
    entries.extend(
        remote
            .iter()
            .filter(|record| player.user_id.as_deref() != Some(record.id.as_str()))
            .map(|record| RankingEntry {
                participant_id: record.id.clone(),
                display_name: record.full_name.clone(),
                score: record.score,
                avatar_url: record.avatar_url.clone(),
            }),
    );
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

/// 1-based rank of the human player within a computed ranking.
#[must_use]
pub fn player_rank(ranking: &[RankingEntry]) -> Option<usize> {
    ranking
        .iter()
        .position(|entry| entry.participant_id == PLAYER_PARTICIPANT_ID)
        .map(|index| index + 1)
}
