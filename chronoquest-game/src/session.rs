//! Outer application flow and per-session state.
//!
//! `ScreenFlow` owns the transition discipline: a requested switch passes
//! through a fixed exiting phase before the new screen commits, then a
//! short settle phase before interaction re-enables, and a request made
//! while a transition is in flight is a no-op rather than a queued
//! follow-up. `GameSession` aggregates every mutable state slice the
//! engine orchestrates.

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::bots::{ClassmateSim, MonitorEntry, MonitorFeed};
use crate::chat::{ChatFeed, ChatMessage};
use crate::constants::FALLBACK_FACT;
use crate::data::CampaignData;
use crate::map::NodeGraph;
use crate::mission::{MissionPhase, MissionRun};
use crate::profile::PlayerStats;
use crate::progress::AnswerStatus;
use crate::ranking::{self, RankingEntry};
use crate::remote::RemoteRoster;
use crate::rng;
use crate::sched::Scheduler;

/// Application screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Start,
    DynastySelect,
    DynastyBriefing,
    LevelSelect,
    Playing,
    GameOver,
    Victory,
    Admin,
    AuthCallback,
}

impl Screen {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DynastySelect => "dynasty_select",
            Self::DynastyBriefing => "dynasty_briefing",
            Self::LevelSelect => "level_select",
            Self::Playing => "playing",
            Self::GameOver => "game_over",
            Self::Victory => "victory",
            Self::Admin => "admin",
            Self::AuthCallback => "auth_callback",
        }
    }

    /// Screens where the classmate simulation keeps running. Menus,
    /// briefings and administrative screens suspend it.
    #[must_use]
    pub const fn is_active_play(self) -> bool {
        matches!(self, Self::Playing | Self::GameOver | Self::Victory)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectable campaign dynasty. The second campaign drops the learner
/// onto the western half of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynasty {
    Umayyah1,
    Umayyah2,
}

impl Dynasty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Umayyah1 => "umayyah1",
            Self::Umayyah2 => "umayyah2",
        }
    }

    /// Board index where this campaign starts.
    #[must_use]
    pub const fn start_node_index(self) -> usize {
        match self {
            Self::Umayyah1 => 0,
            Self::Umayyah2 => 6,
        }
    }
}

impl fmt::Display for Dynasty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dynasty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "umayyah1" => Ok(Self::Umayyah1),
            "umayyah2" => Ok(Self::Umayyah2),
            _ => Err(()),
        }
    }
}

/// Screen transition machine. At most one transition is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenFlow {
    current: Screen,
    pending: Option<Screen>,
    settling: bool,
}

impl ScreenFlow {
    #[must_use]
    pub const fn new(initial: Screen) -> Self {
        Self {
            current: initial,
            pending: None,
            settling: false,
        }
    }

    /// The committed screen. During the exiting phase this is still the
    /// old screen; rendering follows it.
    #[must_use]
    pub const fn current(&self) -> Screen {
        self.current
    }

    /// Whether interaction is currently disabled.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.pending.is_some() || self.settling
    }

    /// Request a switch. Returns `false` (no-op) for a same-screen request
    /// or while another transition is in flight.
    pub(crate) fn request(&mut self, target: Screen) -> bool {
        if target == self.current || self.is_transitioning() {
            return false;
        }
        self.pending = Some(target);
        true
    }

    /// Commit the pending transition, returning `(previous, committed)`.
    pub(crate) fn commit(&mut self) -> Option<(Screen, Screen)> {
        let target = self.pending.take()?;
        let previous = self.current;
        self.current = target;
        self.settling = true;
        Some((previous, target))
    }

    /// End the settle phase; interaction re-enables.
    pub(crate) fn settle(&mut self) {
        self.settling = false;
    }
}

impl Default for ScreenFlow {
    fn default() -> Self {
        Self::new(Screen::Start)
    }
}

/// Timer payloads dispatched by the engine clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TransitionCommit,
    TransitionSettle,
    SimTick,
    RosterPoll,
    ChatGreeting,
    ChatBeat,
    ChatReply { classmate_id: String, text: String },
    ReturnToMap,
    DefeatCommit,
    ArtifactReveal,
}

/// Everything mutable about one play session. Collaborator-free: the
/// engine owns the collaborators and drives this state.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub(crate) seed: u64,
    pub(crate) player: PlayerStats,
    pub(crate) dynasty: Option<Dynasty>,
    pub(crate) active_level: u32,
    pub(crate) flow: ScreenFlow,
    pub(crate) board: NodeGraph,
    pub(crate) mission: Option<MissionRun>,
    pub(crate) sim: ClassmateSim,
    pub(crate) monitor: MonitorFeed,
    pub(crate) roster: RemoteRoster,
    pub(crate) chat: ChatFeed,
    pub(crate) chat_rng: SmallRng,
    pub(crate) sched: Scheduler<SessionEvent>,
    pub(crate) fact: String,
}

impl GameSession {
    /// Fresh session on the given campaign content.
    #[must_use]
    pub fn new(seed: u64, data: &CampaignData) -> Self {
        let player = PlayerStats {
            school: data.school.clone(),
            ..PlayerStats::default()
        };
        Self {
            seed,
            player,
            dynasty: None,
            active_level: 1,
            flow: ScreenFlow::new(Screen::Start),
            board: NodeGraph::new(data.nodes.clone()),
            mission: None,
            sim: ClassmateSim::from_roster(&data.roster, seed),
            monitor: MonitorFeed::default(),
            roster: RemoteRoster::default(),
            chat: ChatFeed::default(),
            chat_rng: rng::chat_rng(seed),
            sched: Scheduler::new(),
            fact: FALLBACK_FACT.to_string(),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn player(&self) -> &PlayerStats {
        &self.player
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.flow.current()
    }

    #[must_use]
    pub const fn flow(&self) -> &ScreenFlow {
        &self.flow
    }

    #[must_use]
    pub const fn dynasty(&self) -> Option<Dynasty> {
        self.dynasty
    }

    #[must_use]
    pub const fn active_level(&self) -> u32 {
        self.active_level
    }

    #[must_use]
    pub const fn board(&self) -> &NodeGraph {
        &self.board
    }

    #[must_use]
    pub const fn mission(&self) -> Option<&MissionRun> {
        self.mission.as_ref()
    }

    #[must_use]
    pub const fn classmate_sim(&self) -> &ClassmateSim {
        &self.sim
    }

    #[must_use]
    pub const fn remote_roster(&self) -> &RemoteRoster {
        &self.roster
    }

    #[must_use]
    pub const fn monitor(&self) -> &MonitorFeed {
        &self.monitor
    }

    #[must_use]
    pub const fn chat(&self) -> &ChatFeed {
        &self.chat
    }

    #[must_use]
    pub fn fact(&self) -> &str {
        &self.fact
    }

    /// Number of pending timers; exposed for host diagnostics.
    #[must_use]
    pub const fn pending_timers(&self) -> usize {
        self.sched.len()
    }

    /// Immutable projection for the display surface.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let ranking =
            ranking::compute_ranking(&self.player, self.sim.classmates(), self.roster.records());
        let player_rank = ranking::player_rank(&ranking);
        let activities = self
            .sim
            .classmates()
            .iter()
            .map(|mate| CompetitorActivity {
                id: mate.id.clone(),
                name: mate.name.clone(),
                activity: mate.activity.describe(),
                score: mate.progress.score,
                energy: mate.progress.energy,
                node_index: mate.progress.current_node_index,
                last_outcome: mate.progress.last_outcome,
            })
            .collect();
        let online_count = self
            .sim
            .classmates()
            .iter()
            .filter(|mate| mate.presence == crate::bots::Presence::Online)
            .count()
            + 1;
        Snapshot {
            screen: self.flow.current(),
            transitioning: self.flow.is_transitioning(),
            dynasty: self.dynasty,
            active_level: self.active_level,
            player: self.player.clone(),
            mission_phase: self.mission.as_ref().map(|run| run.phase().clone()),
            board_length: self.board.len(),
            ranking,
            player_rank,
            activities,
            monitor: self.monitor.entries().cloned().collect(),
            chat: self.chat.messages().to_vec(),
            fact: self.fact.clone(),
            online_count,
        }
    }
}

/// One classmate's row in the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitorActivity {
    pub id: String,
    pub name: String,
    pub activity: String,
    pub score: u32,
    pub energy: i32,
    pub node_index: usize,
    pub last_outcome: AnswerStatus,
}

/// Immutable render snapshot. Recomputed on demand, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub screen: Screen,
    pub transitioning: bool,
    pub dynasty: Option<Dynasty>,
    pub active_level: u32,
    pub player: PlayerStats,
    pub mission_phase: Option<MissionPhase>,
    pub board_length: usize,
    pub ranking: Vec<RankingEntry>,
    pub player_rank: Option<usize>,
    pub activities: Vec<CompetitorActivity>,
    pub monitor: Vec<MonitorEntry>,
    pub chat: Vec<ChatMessage>,
    pub fact: String,
    pub online_count: usize,
}
