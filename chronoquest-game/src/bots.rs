//! Classmate simulation.
//!
//! Keeps the board and leaderboard feeling populated without real
//! opponents. Each classmate advances along the shared board through a
//! probabilistic per-tick model; the whole roster re-sorts by score after
//! every tick so ranking falls out of the simulation as a side effect.
//!
//! The model is intentionally asymmetric with the human rules: classmates
//! earn a small cosmetic score bonus on every advance and are never
//! eliminated at zero energy. They display exhaustion, nothing more.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BOT_BONUS_POINTS_MAX, MATERIAL_ADVANCE_THRESHOLD, MATERIAL_POINTS, MONITOR_FEED_CAP,
    QUIZ_ADVANCE_THRESHOLD, QUIZ_FAIL_THRESHOLD, QUIZ_POINTS,
};
use crate::map::{NodeGraph, NodeKind};
use crate::progress::{AnswerStatus, Progression};

const AVATAR_SERVICE: &str = "https://api.dicebear.com/7.x/lorelei/svg";
const AVATAR_PALETTE: &str = "b6e3f4,c0aede,d1d4f9";

/// Presence shown in the online panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    #[default]
    Online,
    Offline,
    Playing,
}

impl Presence {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Playing => "playing",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrative status attached to each classmate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    #[default]
    StudyingMap,
    MovingToward { label: String },
    Analyzing { label: String },
    SearchingArchive,
    ComputingStrategy,
    AnsweringQuiz,
    Retrying { label: String },
    MissionComplete,
}

impl Activity {
    /// Human-readable line for the activity feed.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::StudyingMap => "Studying the map...".to_string(),
            Self::MovingToward { label } => format!("Moving toward {label}..."),
            Self::Analyzing { label } => format!("Analyzing tactics at {label}..."),
            Self::SearchingArchive => "Searching the archive for answers...".to_string(),
            Self::ComputingStrategy => "Working out a travel strategy...".to_string(),
            Self::AnsweringQuiz => "Answering a temporal quiz...".to_string(),
            Self::Retrying { label } => {
                format!("Failed the question at {label}. Trying again...")
            }
            Self::MissionComplete => "Mission complete (waiting at base)".to_string(),
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// One simulated competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classmate {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    #[serde(default)]
    pub presence: Presence,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub progress: Progression,
}

impl Classmate {
    /// Seed a classmate from a roster name. The avatar derives
    /// deterministically from the name, so the same roster always renders
    /// the same faces.
    #[must_use]
    pub fn seeded(name: &str, roster_index: usize) -> Self {
        Self {
            id: format!("bot-{roster_index}"),
            name: name.to_string(),
            avatar_url: avatar_url_for(name, roster_index),
            presence: Presence::Online,
            activity: Activity::StudyingMap,
            progress: Progression::default(),
        }
    }
}

/// Deterministic avatar URL for a roster entry.
#[must_use]
pub fn avatar_url_for(name: &str, roster_index: usize) -> String {
    let seed: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{AVATAR_SERVICE}?seed={seed}{roster_index}&backgroundColor={AVATAR_PALETTE}")
}

/// What one classmate did during a tick; feeds the monitor log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickMove {
    pub classmate_id: String,
    pub name: String,
    pub node_label: String,
    pub status: AnswerStatus,
    pub advanced: bool,
    pub activity: String,
}

/// The periodic simulation over the whole roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassmateSim {
    roster: Vec<Classmate>,
    #[serde(skip)]
    rng: Option<ChaCha20Rng>,
}

impl ClassmateSim {
    /// Build the roster and bind the simulation RNG stream for `seed`.
    #[must_use]
    pub fn from_roster(names: &[String], seed: u64) -> Self {
        let roster = names
            .iter()
            .enumerate()
            .map(|(index, name)| Classmate::seeded(name, index))
            .collect();
        Self {
            roster,
            rng: Some(crate::rng::sim_rng(seed)),
        }
    }

    #[must_use]
    pub fn classmates(&self) -> &[Classmate] {
        &self.roster
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.roster.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Classmate> {
        self.roster.iter().find(|mate| mate.id == id)
    }

    /// Advance the roster one tick using the owned RNG stream.
    pub fn tick(&mut self, graph: &NodeGraph, now_ms: u64) -> Vec<TickMove> {
        let mut rng = self
            .rng
            .take()
            .unwrap_or_else(|| crate::rng::sim_rng(now_ms));
        let moves = self.tick_with(graph, now_ms, &mut rng);
        self.rng = Some(rng);
        moves
    }

    /// Advance the roster one tick drawing from `rng`.
    ///
    /// Draw order per classmate is fixed: one advancement roll, then a
    /// bonus roll only on advance, or one flavor roll only on an idle
    /// outcome. Feeding the same draw sequence replays the same updates.
    pub fn tick_with(
        &mut self,
        graph: &NodeGraph,
        now_ms: u64,
        rng: &mut impl Rng,
    ) -> Vec<TickMove> {
        if graph.is_empty() {
            return Vec::new();
        }
        let final_index = graph.final_index();
        let mut moves = Vec::new();
        for mate in &mut self.roster {
            if mate.progress.current_node_index >= final_index {
                mate.activity = Activity::MissionComplete;
                mate.presence = Presence::Online;
                continue;
            }
            let Some(node) = graph.node_at(mate.progress.current_node_index) else {
                continue;
            };
            let next_index = mate.progress.current_node_index + 1;

            let roll: f64 = rng.r#gen();
            let mut advanced = false;
            let mut status = AnswerStatus::None;
            match &node.kind {
                NodeKind::Material { .. } => {
                    if roll > MATERIAL_ADVANCE_THRESHOLD {
                        advanced = true;
                    }
                }
                NodeKind::Quiz { .. } => {
                    if roll > QUIZ_ADVANCE_THRESHOLD {
                        advanced = true;
                        status = AnswerStatus::Correct;
                    } else if roll < QUIZ_FAIL_THRESHOLD {
                        status = AnswerStatus::Wrong;
                    }
                }
            }

            if advanced {
                let base = if node.kind.is_quiz() {
                    QUIZ_POINTS
                } else {
                    MATERIAL_POINTS
                };
                let bonus = rng.gen_range(0..BOT_BONUS_POINTS_MAX);
                mate.progress.award(base + bonus);
                mate.progress.advance();
                let toward = graph
                    .node_at(next_index)
                    .map_or_else(|| "the finale".to_string(), |next| next.label.clone());
                mate.activity = Activity::MovingToward { label: toward };
            } else if status == AnswerStatus::Wrong {
                mate.progress.spend_energy();
                mate.activity = Activity::Retrying {
                    label: node.label.clone(),
                };
            } else {
                mate.activity = match rng.gen_range(0..4u32) {
                    0 => Activity::Analyzing {
                        label: node.label.clone(),
                    },
                    1 => Activity::SearchingArchive,
                    2 => Activity::ComputingStrategy,
                    _ => Activity::AnsweringQuiz,
                };
            }
            mate.progress.mark(status, now_ms);
            moves.push(TickMove {
                classmate_id: mate.id.clone(),
                name: mate.name.clone(),
                node_label: node.label.clone(),
                status,
                advanced,
                activity: mate.activity.describe(),
            });
        }
        // Ranking is a side effect of the tick. Stable sort keeps roster
        // order as the tie-break.
        self.roster
            .sort_by(|a, b| b.progress.score.cmp(&a.progress.score));
        moves
    }
}

/// One line in the live monitor feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorEntry {
    pub at_ms: u64,
    pub text: String,
}

/// Bounded feed of classmate movements for the monitor panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorFeed {
    entries: VecDeque<MonitorEntry>,
}

impl MonitorFeed {
    fn push(&mut self, text: String, now_ms: u64) {
        self.entries.push_front(MonitorEntry { at_ms: now_ms, text });
        self.entries.truncate(MONITOR_FEED_CAP);
    }

    /// Record this tick's movements, newest first.
    pub fn record_moves(&mut self, moves: &[TickMove], now_ms: u64) {
        for mv in moves {
            let text = match mv.status {
                AnswerStatus::Correct => {
                    format!("{} answered CORRECTLY at {}", mv.name, mv.node_label)
                }
                AnswerStatus::Wrong => {
                    format!("{} answered WRONG at {}", mv.name, mv.node_label)
                }
                AnswerStatus::None => format!("{} is busy: {}", mv.name, mv.activity),
            };
            self.push(text, now_ms);
        }
    }

    /// Pinned broadcast from the class supervisor.
    pub fn broadcast(&mut self, text: &str, now_ms: u64) {
        self.push(format!("SUPERVISOR: {text}"), now_ms);
    }

    #[must_use]
    pub fn entries(&self) -> impl Iterator<Item = &MonitorEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
