//! Campaign content: level configs, the board, the classmate roster,
//! dynasty briefings and artifact rewards.
//!
//! Content is data, not code. The crate embeds a default campaign under
//! `assets/data/`; hosts may supply their own JSON with the same shape.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::map::MapNode;
use crate::question::QuestionBank;
use crate::session::Dynasty;

/// One selectable campaign level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub era: String,
    pub location: String,
    #[serde(default)]
    pub required_level_id: Option<u32>,
}

/// Briefing text shown before a dynasty campaign starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DynastyBriefing {
    pub title: String,
    pub subtitle: String,
    pub history: String,
    #[serde(default)]
    pub key_facts: Vec<String>,
    pub leader: String,
    pub objective: String,
}

/// Reward granted when a level is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub obtained_at_level: u32,
}

/// Validation failures for campaign content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CampaignError {
    #[error("campaign has no map nodes")]
    EmptyMap,
    #[error("campaign defines no levels")]
    NoLevels,
    #[error("fallback question bank is empty")]
    EmptyQuestionBank,
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),
    #[error("node `{node}` references unknown question `{question}`")]
    UnknownQuestionRef { node: String, question: String },
    #[error("dynasty `{dynasty}` starts at index {index} on a {len}-node board")]
    StartIndexOutOfRange {
        dynasty: &'static str,
        index: usize,
        len: usize,
    },
}

/// Container for all static campaign content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CampaignData {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub nodes: Vec<MapNode>,
    #[serde(default)]
    pub roster: Vec<String>,
    #[serde(default)]
    pub dynasties: HashMap<String, DynastyBriefing>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl CampaignData {
    /// Create empty campaign data (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load campaign data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into campaign data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The campaign shipped with the crate.
    pub fn builtin() -> &'static Self {
        static CAMPAIGN: OnceLock<CampaignData> = OnceLock::new();
        CAMPAIGN.get_or_init(|| {
            Self::from_json(include_str!("../assets/data/campaign.json"))
                .unwrap_or_else(|_| Self::empty())
        })
    }

    #[must_use]
    pub fn level(&self, id: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|level| level.id == id)
    }

    /// A level is playable once its prerequisite has been completed.
    #[must_use]
    pub fn level_unlocked(&self, id: u32, completed_levels: &[u32]) -> bool {
        self.level(id).is_some_and(|level| {
            level
                .required_level_id
                .is_none_or(|required| completed_levels.contains(&required))
        })
    }

    #[must_use]
    pub fn briefing(&self, dynasty: Dynasty) -> Option<&DynastyBriefing> {
        self.dynasties.get(dynasty.as_str())
    }

    #[must_use]
    pub fn artifact_for_level(&self, level_id: u32) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.obtained_at_level == level_id)
    }

    /// Check the structural invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self, bank: &QuestionBank) -> Result<(), CampaignError> {
        if self.nodes.is_empty() {
            return Err(CampaignError::EmptyMap);
        }
        if self.levels.is_empty() {
            return Err(CampaignError::NoLevels);
        }
        if bank.is_empty() {
            return Err(CampaignError::EmptyQuestionBank);
        }
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(CampaignError::DuplicateNodeId(node.id.clone()));
            }
            if let crate::map::NodeKind::Quiz {
                question_ref: Some(question),
            } = &node.kind
                && bank.by_ref(question).is_none()
            {
                return Err(CampaignError::UnknownQuestionRef {
                    node: node.id.clone(),
                    question: question.clone(),
                });
            }
        }
        for dynasty in [Dynasty::Umayyah1, Dynasty::Umayyah2] {
            let index = dynasty.start_node_index();
            if index >= self.nodes.len() {
                return Err(CampaignError::StartIndexOutOfRange {
                    dynasty: dynasty.as_str(),
                    index,
                    len: self.nodes.len(),
                });
            }
        }
        Ok(())
    }
}

/// Parse and validate a full content set from host-supplied JSON.
///
/// # Errors
///
/// Returns an error when either document fails to parse or the combined
/// content violates a campaign invariant.
pub fn load_campaign(
    campaign_json: &str,
    questions_json: &str,
) -> anyhow::Result<(CampaignData, QuestionBank)> {
    let data = CampaignData::from_json(campaign_json).context("parse campaign data")?;
    let bank = QuestionBank::from_json(questions_json).context("parse question bank")?;
    data.validate(&bank).context("validate campaign content")?;
    Ok((data, bank))
}
