//! The human participant's identity and run state.

use serde::{Deserialize, Serialize};

use crate::data::Artifact;
use crate::progress::Progression;

/// Identity plus progression for the human player. This is the in-memory
/// source of truth for the session; the remote profile store only ever
/// receives best-effort copies of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub completed_levels: Vec<u32>,
    #[serde(default)]
    pub progress: Progression,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            name: "Cadet".to_string(),
            email: String::new(),
            school: String::new(),
            avatar_url: None,
            user_id: None,
            artifacts: Vec::new(),
            completed_levels: Vec::new(),
            progress: Progression::default(),
        }
    }
}

impl PlayerStats {
    /// Record a completed level exactly once.
    pub fn record_completed_level(&mut self, level_id: u32) {
        if !self.completed_levels.contains(&level_id) {
            self.completed_levels.push(level_id);
        }
    }

    /// Add an artifact unless an identical reward was already granted.
    pub fn grant_artifact(&mut self, artifact: Artifact) {
        if !self.artifacts.iter().any(|owned| owned.id == artifact.id) {
            self.artifacts.push(artifact);
        }
    }
}
