//! ChronoQuest Game Engine
//!
//! Platform-agnostic core game logic for the ChronoQuest history-quiz
//! adventure. This crate provides the progression state machine, the
//! classmate simulation and the session flow without UI or
//! platform-specific dependencies. Time, randomness and every external
//! collaborator (question generation, profile persistence, chat replies)
//! are injected, so the whole engine is deterministic under test.

pub mod bots;
pub mod chat;
pub mod constants;
pub mod data;
pub mod map;
pub mod mission;
pub mod profile;
pub mod progress;
pub mod question;
pub mod ranking;
pub mod remote;
pub mod rng;
pub mod sched;
pub mod session;

// Re-export commonly used types
pub use bots::{Activity, Classmate, ClassmateSim, MonitorEntry, MonitorFeed, Presence, TickMove};
pub use chat::{ChatFeed, ChatMessage};
pub use constants::{MAX_ENERGY, MATERIAL_POINTS, QUIZ_POINTS, SIM_TICK_MS};
pub use data::{
    Artifact, CampaignData, CampaignError, DynastyBriefing, LevelConfig, load_campaign,
};
pub use map::{MapNode, MaterialContent, NodeGraph, NodeKind};
pub use mission::{
    ActiveQuestion, Activation, AnswerDisposition, AnswerFeedback, MaterialOutcome, MissionPhase,
    MissionRun,
};
pub use profile::PlayerStats;
pub use progress::{AnswerStatus, Progression};
pub use question::{Difficulty, Question, QuestionBank};
pub use ranking::{PLAYER_PARTICIPANT_ID, RankingEntry, compute_ranking, player_rank};
pub use remote::{
    AdminOverview, AuthUser, ProfileRecord, ProfileUpdate, RemoteRoster, admin_overview,
};
pub use sched::{Scheduler, TimerId, TimerOwner};
pub use session::{
    CompetitorActivity, Dynasty, GameSession, Screen, ScreenFlow, SessionEvent, Snapshot,
};

use constants::{
    ADVANCE_DELAY_MS, ARTIFACT_DELAY_MS, CHAT_BEAT_CHANCE, CHAT_BEAT_MS, CHAT_GREETING,
    CHAT_GREETING_DELAY_MS, CHAT_REPLY_DELAY_MS, CHAT_REPLY_JITTER_MS, DEFEAT_DELAY_MS,
    FALLBACK_REPLY, RETRY_DELAY_MS, ROSTER_POLL_MS, TRANSITION_EXIT_MS, TRANSITION_SETTLE_MS,
};
use rand::Rng;

/// Trait for the external quiz-content generator.
/// The engine tolerates unavailability; the embedded bank backs it up.
pub trait QuestionSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce a fresh question for the given level.
    ///
    /// # Errors
    ///
    /// Returns an error when the generator is unreachable or returns
    /// malformed content. The caller falls back to the static pool.
    fn generate_question(
        &self,
        level_id: u32,
        context_hints: &[String],
    ) -> Result<Question, Self::Error>;

    /// One-line historical flavor fact for the HUD.
    ///
    /// # Errors
    ///
    /// Returns an error when the generator is unreachable.
    fn historical_fact(&self) -> Result<String, Self::Error>;
}

/// Trait for the remote profile store.
/// Every call is fallible; the engine logs failures and plays on from
/// in-memory state.
pub trait ProfileStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch one profile by participant id.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn fetch_profile(&self, id: &str) -> Result<Option<ProfileRecord>, Self::Error>;

    /// Insert a freshly created profile.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects or cannot reach the write.
    fn insert_profile(&self, record: &ProfileRecord) -> Result<(), Self::Error>;

    /// Apply a partial update to an existing profile.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects or cannot reach the write.
    fn update_profile(&self, id: &str, patch: &ProfileUpdate) -> Result<(), Self::Error>;

    /// Profiles updated after the given timestamp, ordered by score
    /// descending.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn roster_since(&self, updated_after_ms: u64) -> Result<Vec<ProfileRecord>, Self::Error>;

    /// Every profile, ordered by score descending.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn all_profiles(&self) -> Result<Vec<ProfileRecord>, Self::Error>;
}

/// Trait for the cosmetic chat-reply generator.
pub trait ReplyGenerator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reply in the voice of `persona_name` to an incoming message.
    ///
    /// # Errors
    ///
    /// Returns an error when the generator is unreachable; callers fall
    /// back to a fixed placeholder line.
    fn generate_reply(&self, persona_name: &str, incoming: &str) -> Result<String, Self::Error>;
}

/// Main game engine binding campaign content to the collaborators.
///
/// The engine itself is stateless across sessions; all mutable state lives
/// in [`GameSession`]. Engine methods take the session plus the current
/// monotonic time in milliseconds, and [`GameEngine::advance`] drives every
/// scheduled callback.
pub struct GameEngine<Q, P, R>
where
    Q: QuestionSource,
    P: ProfileStore,
    R: ReplyGenerator,
{
    questions: Q,
    profiles: P,
    replies: R,
    data: CampaignData,
    bank: QuestionBank,
}

impl<Q, P, R> GameEngine<Q, P, R>
where
    Q: QuestionSource,
    P: ProfileStore,
    R: ReplyGenerator,
{
    /// Create an engine over explicit campaign content.
    pub const fn new(
        questions: Q,
        profiles: P,
        replies: R,
        data: CampaignData,
        bank: QuestionBank,
    ) -> Self {
        Self {
            questions,
            profiles,
            replies,
            data,
            bank,
        }
    }

    /// Create an engine over the campaign embedded in the crate.
    pub fn with_builtin_content(questions: Q, profiles: P, replies: R) -> Self {
        Self::new(
            questions,
            profiles,
            replies,
            CampaignData::builtin().clone(),
            QuestionBank::builtin().clone(),
        )
    }

    #[must_use]
    pub const fn data(&self) -> &CampaignData {
        &self.data
    }

    #[must_use]
    pub const fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Start a new session with the given seed.
    #[must_use]
    pub fn create_session(&self, seed: u64) -> GameSession {
        GameSession::new(seed, &self.data)
    }

    // ---- Screen navigation ------------------------------------------------

    /// Guest registration from the start screen.
    pub fn register_player(
        &self,
        session: &mut GameSession,
        name: &str,
        email: &str,
        avatar_url: Option<&str>,
        now_ms: u64,
    ) {
        if session.flow.current() != Screen::Start || session.flow.is_transitioning() {
            return;
        }
        session.player.name = name.to_string();
        session.player.email = email.to_string();
        session.player.avatar_url = avatar_url.map(str::to_string);
        self.switch_screen(session, Screen::DynastySelect, now_ms);
    }

    /// Fold a finished sign-in into the session. The stored profile wins
    /// over the auth payload where present; a missing profile is created
    /// best-effort. Store failures are logged and play continues with
    /// in-memory state.
    pub fn complete_sign_in(&self, session: &mut GameSession, user: &AuthUser, now_ms: u64) {
        match self.profiles.fetch_profile(&user.id) {
            Ok(Some(record)) => {
                let player = &mut session.player;
                player.name = if record.full_name.is_empty() {
                    user.full_name.clone().unwrap_or_else(|| "Agent".to_string())
                } else {
                    record.full_name.clone()
                };
                player.email = if record.email.is_empty() {
                    user.email.clone()
                } else {
                    record.email.clone()
                };
                player.avatar_url = record.avatar_url.clone().or_else(|| user.avatar_url.clone());
                player.progress.score = record.score;
                player.progress.energy = record.energy.clamp(0, MAX_ENERGY);
                player.completed_levels = record.completed_levels.clone();
                player.user_id = Some(user.id.clone());
            }
            Ok(None) => {
                let record = ProfileRecord {
                    id: user.id.clone(),
                    email: user.email.clone(),
                    full_name: user
                        .full_name
                        .clone()
                        .unwrap_or_else(|| "New Agent".to_string()),
                    avatar_url: user.avatar_url.clone(),
                    school: self.data.school.clone(),
                    updated_at_ms: now_ms,
                    ..ProfileRecord::default()
                };
                if let Err(err) = self.profiles.insert_profile(&record) {
                    log::warn!("failed to create profile, continuing in-memory: {err}");
                }
                let player = &mut session.player;
                player.name = record.full_name;
                player.email = record.email;
                player.avatar_url = record.avatar_url;
                player.user_id = Some(user.id.clone());
            }
            Err(err) => {
                log::warn!("profile fetch failed, continuing in-memory: {err}");
                let player = &mut session.player;
                if let Some(name) = &user.full_name {
                    player.name = name.clone();
                }
                player.email = user.email.clone();
                player.user_id = Some(user.id.clone());
            }
        }
        if matches!(
            session.flow.current(),
            Screen::Start | Screen::AuthCallback
        ) {
            self.switch_screen(session, Screen::DynastySelect, now_ms);
        }
    }

    /// Enter the post-OAuth interstitial.
    pub fn begin_auth_callback(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() == Screen::Start && !session.flow.is_transitioning() {
            self.switch_screen(session, Screen::AuthCallback, now_ms);
        }
    }

    pub fn select_dynasty(&self, session: &mut GameSession, dynasty: Dynasty, now_ms: u64) {
        if session.flow.current() != Screen::DynastySelect || session.flow.is_transitioning() {
            return;
        }
        session.dynasty = Some(dynasty);
        self.switch_screen(session, Screen::DynastyBriefing, now_ms);
    }

    /// Back out of the briefing without starting.
    pub fn back_to_dynasty_select(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() == Screen::DynastyBriefing && !session.flow.is_transitioning() {
            self.switch_screen(session, Screen::DynastySelect, now_ms);
        }
    }

    pub fn open_level_select(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() == Screen::DynastySelect && !session.flow.is_transitioning() {
            self.switch_screen(session, Screen::LevelSelect, now_ms);
        }
    }

    /// Launch the briefed campaign. The dynasty decides the start node.
    pub fn start_mission(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() != Screen::DynastyBriefing || session.flow.is_transitioning() {
            return;
        }
        let Some(dynasty) = session.dynasty else {
            return;
        };
        session.active_level = 1;
        session.mission = Some(MissionRun::new(
            1,
            session.board.clone(),
            dynasty.start_node_index(),
            &mut session.player.progress,
        ));
        self.switch_screen(session, Screen::Playing, now_ms);
    }

    /// Launch a level from the level-select screen, honoring prerequisites.
    pub fn select_level(&self, session: &mut GameSession, level_id: u32, now_ms: u64) {
        if session.flow.current() != Screen::LevelSelect || session.flow.is_transitioning() {
            return;
        }
        if !self
            .data
            .level_unlocked(level_id, &session.player.completed_levels)
        {
            return;
        }
        session.active_level = level_id;
        session.mission = Some(MissionRun::new(
            level_id,
            session.board.clone(),
            0,
            &mut session.player.progress,
        ));
        self.switch_screen(session, Screen::Playing, now_ms);
    }

    pub fn enter_admin(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() == Screen::Start && !session.flow.is_transitioning() {
            self.switch_screen(session, Screen::Admin, now_ms);
        }
    }

    pub fn leave_admin(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() == Screen::Admin && !session.flow.is_transitioning() {
            self.switch_screen(session, Screen::Start, now_ms);
        }
    }

    /// Aggregate view over every stored profile, for the admin screen.
    ///
    /// # Errors
    ///
    /// Returns the store error when the listing cannot be fetched.
    pub fn admin_overview(&self) -> Result<(Vec<ProfileRecord>, AdminOverview), P::Error> {
        let records = self.profiles.all_profiles()?;
        let overview = admin_overview(&records);
        Ok((records, overview))
    }

    /// Retry after a defeat: energy and position reset, score preserved.
    pub fn retry_mission(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() != Screen::GameOver || session.flow.is_transitioning() {
            return;
        }
        if let Some(mission) = &mut session.mission {
            mission.restart(&mut session.player.progress);
        }
        self.switch_screen(session, Screen::Playing, now_ms);
    }

    /// Leave the end-of-run overlay for the campaign portal.
    pub fn return_to_portal(&self, session: &mut GameSession, now_ms: u64) {
        if matches!(
            session.flow.current(),
            Screen::GameOver | Screen::Victory
        ) && !session.flow.is_transitioning()
        {
            self.switch_screen(session, Screen::DynastySelect, now_ms);
        }
    }

    /// Abandon the mission from the in-game header.
    pub fn exit_mission(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() == Screen::Playing && !session.flow.is_transitioning() {
            self.switch_screen(session, Screen::DynastySelect, now_ms);
        }
    }

    // ---- Mission interaction ----------------------------------------------

    /// Interact with the node at `index`. Quiz nodes resolve a question
    /// through the triple fallback; the quiz UI is never left empty.
    pub fn activate_node(&self, session: &mut GameSession, index: usize) {
        if session.flow.current() != Screen::Playing || session.flow.is_transitioning() {
            return;
        }
        let Some(mission) = &mut session.mission else {
            return;
        };
        let label = mission
            .current_node(&session.player.progress)
            .map(|node| node.label.clone())
            .unwrap_or_default();
        match mission.activate(&session.player.progress, index) {
            Activation::Ignored | Activation::Material => {}
            Activation::NeedsQuestion { question_ref } => {
                match self.resolve_question(
                    session.active_level,
                    index,
                    question_ref.as_deref(),
                    &label,
                ) {
                    Some(question) => mission.begin_question(question),
                    None => log::warn!("no question available for node {index}"),
                }
            }
        }
    }

    /// Submit an answer for the active question. Repeat submissions are
    /// no-ops; the returned feedback drives the result display.
    pub fn submit_answer(
        &self,
        session: &mut GameSession,
        selected: usize,
        now_ms: u64,
    ) -> Option<AnswerFeedback> {
        if session.flow.current() != Screen::Playing || session.flow.is_transitioning() {
            return None;
        }
        let mission = session.mission.as_mut()?;
        let feedback = mission.submit_answer(&mut session.player.progress, selected, now_ms)?;
        match feedback.disposition {
            AnswerDisposition::Advance => {
                session.sched.schedule_in(
                    TimerOwner::Mission,
                    SessionEvent::ReturnToMap,
                    now_ms,
                    ADVANCE_DELAY_MS,
                );
                self.sync_profile(session, now_ms);
            }
            AnswerDisposition::Completes => {
                session.sched.schedule_in(
                    TimerOwner::Mission,
                    SessionEvent::ArtifactReveal,
                    now_ms,
                    ARTIFACT_DELAY_MS,
                );
                self.sync_profile(session, now_ms);
            }
            AnswerDisposition::Retry => {
                session.sched.schedule_in(
                    TimerOwner::Mission,
                    SessionEvent::ReturnToMap,
                    now_ms,
                    RETRY_DELAY_MS,
                );
            }
            AnswerDisposition::Defeat => {
                session.sched.schedule_in(
                    TimerOwner::Mission,
                    SessionEvent::DefeatCommit,
                    now_ms,
                    DEFEAT_DELAY_MS,
                );
            }
        }
        Some(feedback)
    }

    /// Close the open reading material: unconditional award, immediate
    /// advance.
    pub fn close_material(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() != Screen::Playing || session.flow.is_transitioning() {
            return;
        }
        let Some(mission) = &mut session.mission else {
            return;
        };
        match mission.close_material(&mut session.player.progress, now_ms) {
            MaterialOutcome::Ignored => {}
            MaterialOutcome::Advanced => {
                self.sync_profile(session, now_ms);
                self.refresh_fact(session);
            }
            MaterialOutcome::Completes => {
                session.sched.schedule_in(
                    TimerOwner::Mission,
                    SessionEvent::ArtifactReveal,
                    now_ms,
                    ARTIFACT_DELAY_MS,
                );
                self.sync_profile(session, now_ms);
            }
        }
    }

    /// Close the artifact modal: record the completed level and celebrate.
    pub fn claim_artifact(&self, session: &mut GameSession, now_ms: u64) {
        if session.flow.current() != Screen::Playing || session.flow.is_transitioning() {
            return;
        }
        let Some(mission) = &session.mission else {
            return;
        };
        if *mission.phase() != MissionPhase::Completed {
            return;
        }
        let level_id = mission.level_id();
        session.player.record_completed_level(level_id);
        self.sync_profile(session, now_ms);
        self.switch_screen(session, Screen::Victory, now_ms);
    }

    // ---- Chat & monitor ---------------------------------------------------

    /// Player chat send; a random classmate replies after a short delay.
    pub fn send_chat(&self, session: &mut GameSession, text: &str, now_ms: u64) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        session.chat.push_player(&session.player, text, now_ms);
        if session.sim.is_empty() {
            return;
        }
        let index = session.chat_rng.gen_range(0..session.sim.len());
        let mate = session.sim.classmates()[index].clone();
        let reply = match self.replies.generate_reply(&mate.name, text) {
            Ok(reply) => reply,
            Err(err) => {
                log::debug!("reply generator unavailable, using placeholder: {err}");
                FALLBACK_REPLY.to_string()
            }
        };
        let jitter = session.chat_rng.gen_range(0..CHAT_REPLY_JITTER_MS);
        session.sched.schedule_in(
            TimerOwner::Chat,
            SessionEvent::ChatReply {
                classmate_id: mate.id,
                text: reply,
            },
            now_ms,
            CHAT_REPLY_DELAY_MS + jitter,
        );
    }

    /// Pin a supervisor broadcast into the monitor feed.
    pub fn broadcast_message(&self, session: &mut GameSession, text: &str, now_ms: u64) {
        session.monitor.broadcast(text, now_ms);
    }

    // ---- Clock ------------------------------------------------------------

    /// Drive every timer due at `now_ms`. This is the only place deferred
    /// state transitions commit, which keeps the session single-threaded
    /// and deterministic.
    pub fn advance(&self, session: &mut GameSession, now_ms: u64) {
        for event in session.sched.advance(now_ms) {
            self.dispatch(session, event, now_ms);
        }
    }

    fn dispatch(&self, session: &mut GameSession, event: SessionEvent, now_ms: u64) {
        match event {
            SessionEvent::TransitionCommit => {
                if let Some((previous, committed)) = session.flow.commit() {
                    self.on_screen_committed(session, previous, committed, now_ms);
                    session.sched.schedule_in(
                        TimerOwner::Session,
                        SessionEvent::TransitionSettle,
                        now_ms,
                        TRANSITION_SETTLE_MS,
                    );
                }
            }
            SessionEvent::TransitionSettle => session.flow.settle(),
            SessionEvent::SimTick => {
                let moves = session.sim.tick(&session.board, now_ms);
                session.monitor.record_moves(&moves, now_ms);
            }
            SessionEvent::RosterPoll => {
                let outcome = self.profiles.roster_since(session.roster.last_poll_ms());
                session.roster.apply_poll(outcome, now_ms);
            }
            SessionEvent::ChatGreeting => session.chat.push_system(CHAT_GREETING, now_ms),
            SessionEvent::ChatBeat => {
                let roll: f64 = session.chat_rng.r#gen();
                if roll > 1.0 - CHAT_BEAT_CHANCE && !session.sim.is_empty() {
                    let index = session.chat_rng.gen_range(0..session.sim.len());
                    let mate = session.sim.classmates()[index].clone();
                    let line = chat::AMBIENT_LINES
                        [session.chat_rng.gen_range(0..chat::AMBIENT_LINES.len())];
                    session.chat.push_classmate(&mate, line, now_ms);
                }
            }
            SessionEvent::ChatReply {
                classmate_id,
                text,
            } => {
                if let Some(mate) = session.sim.find(&classmate_id).cloned() {
                    session.chat.push_classmate(&mate, &text, now_ms);
                }
            }
            SessionEvent::ReturnToMap => {
                if let Some(mission) = &mut session.mission {
                    mission.commit_return_to_map();
                }
                self.refresh_fact(session);
            }
            SessionEvent::DefeatCommit => {
                if let Some(mission) = &mut session.mission {
                    mission.commit_defeat(&session.player.progress);
                    if *mission.phase() == MissionPhase::Failed {
                        self.switch_screen(session, Screen::GameOver, now_ms);
                    }
                }
            }
            SessionEvent::ArtifactReveal => {
                if let Some(mission) = &mut session.mission
                    && mission.commit_completion(&session.player.progress)
                    && let Some(artifact) = self.data.artifact_for_level(mission.level_id())
                {
                    session.player.grant_artifact(artifact.clone());
                }
            }
        }
    }

    fn on_screen_committed(
        &self,
        session: &mut GameSession,
        previous: Screen,
        committed: Screen,
        now_ms: u64,
    ) {
        if previous.is_active_play() && !committed.is_active_play() {
            session.sched.cancel_owner(TimerOwner::Classmates);
            session.sched.cancel_owner(TimerOwner::Roster);
            session.sched.cancel_owner(TimerOwner::Chat);
            session.sched.cancel_owner(TimerOwner::Mission);
            session.mission = None;
        }
        if committed.is_active_play() && !previous.is_active_play() {
            session.sched.schedule_every(
                TimerOwner::Classmates,
                SessionEvent::SimTick,
                now_ms,
                SIM_TICK_MS,
            );
            session.sched.schedule_every(
                TimerOwner::Roster,
                SessionEvent::RosterPoll,
                now_ms,
                ROSTER_POLL_MS,
            );
            session.sched.schedule_in(
                TimerOwner::Chat,
                SessionEvent::ChatGreeting,
                now_ms,
                CHAT_GREETING_DELAY_MS,
            );
            session.sched.schedule_every(
                TimerOwner::Chat,
                SessionEvent::ChatBeat,
                now_ms,
                CHAT_BEAT_MS,
            );
            self.refresh_fact(session);
        }
    }

    fn switch_screen(&self, session: &mut GameSession, target: Screen, now_ms: u64) {
        if session.flow.request(target) {
            session.sched.schedule_in(
                TimerOwner::Session,
                SessionEvent::TransitionCommit,
                now_ms,
                TRANSITION_EXIT_MS,
            );
        }
    }

    /// Explicit per-node reference first, then the generator, then the
    /// pool by index modulo. A populated bank makes this infallible.
    fn resolve_question(
        &self,
        level_id: u32,
        node_index: usize,
        question_ref: Option<&str>,
        label: &str,
    ) -> Option<Question> {
        if let Some(reference) = question_ref
            && let Some(question) = self.bank.by_ref(reference)
        {
            return Some(question.clone());
        }
        let hints = vec![format!("Current location: {label}")];
        match self.questions.generate_question(level_id, &hints) {
            Ok(question) => return Some(question),
            Err(err) => {
                log::debug!("question generator unavailable, falling back to pool: {err}");
            }
        }
        self.bank.by_index_modulo(node_index).cloned()
    }

    /// Fire-and-forget profile write. Never blocks progression.
    fn sync_profile(&self, session: &GameSession, now_ms: u64) {
        let Some(user_id) = &session.player.user_id else {
            return;
        };
        let update = ProfileUpdate::from_stats(&session.player, now_ms);
        if let Err(err) = self.profiles.update_profile(user_id, &update) {
            log::warn!("failed to save progress: {err}");
        }
    }

    fn refresh_fact(&self, session: &mut GameSession) {
        match self.questions.historical_fact() {
            Ok(fact) if !fact.is_empty() => session.fact = fact,
            Ok(_) => {}
            Err(err) => {
                log::debug!("fact source unavailable, keeping previous line: {err}");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    //! In-memory collaborator fakes shared by the unit tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::fmt;

    /// Error used by fakes configured to be unreachable.
    #[derive(Debug, Clone, Copy)]
    pub struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("collaborator unreachable")
        }
    }

    impl std::error::Error for Unreachable {}

    /// Question source that always fails, forcing pool fallbacks.
    #[derive(Clone, Copy, Default)]
    pub struct OfflineQuestions;

    impl QuestionSource for OfflineQuestions {
        type Error = Unreachable;

        fn generate_question(
            &self,
            _level_id: u32,
            _context_hints: &[String],
        ) -> Result<Question, Self::Error> {
            Err(Unreachable)
        }

        fn historical_fact(&self) -> Result<String, Self::Error> {
            Err(Unreachable)
        }
    }

    /// In-memory profile store with togglable outage.
    #[derive(Clone, Default)]
    pub struct MemoryProfiles {
        pub records: RefCell<HashMap<String, ProfileRecord>>,
        pub offline: RefCell<bool>,
        pub writes: RefCell<usize>,
    }

    impl MemoryProfiles {
        pub fn set_offline(&self, offline: bool) {
            *self.offline.borrow_mut() = offline;
        }

        fn guard(&self) -> Result<(), Unreachable> {
            if *self.offline.borrow() {
                Err(Unreachable)
            } else {
                Ok(())
            }
        }
    }

    impl ProfileStore for MemoryProfiles {
        type Error = Unreachable;

        fn fetch_profile(&self, id: &str) -> Result<Option<ProfileRecord>, Self::Error> {
            self.guard()?;
            Ok(self.records.borrow().get(id).cloned())
        }

        fn insert_profile(&self, record: &ProfileRecord) -> Result<(), Self::Error> {
            self.guard()?;
            *self.writes.borrow_mut() += 1;
            self.records
                .borrow_mut()
                .insert(record.id.clone(), record.clone());
            Ok(())
        }

        fn update_profile(&self, id: &str, patch: &ProfileUpdate) -> Result<(), Self::Error> {
            self.guard()?;
            *self.writes.borrow_mut() += 1;
            let mut records = self.records.borrow_mut();
            let record = records.entry(id.to_string()).or_insert_with(|| {
                ProfileRecord {
                    id: id.to_string(),
                    ..ProfileRecord::default()
                }
            });
            if let Some(score) = patch.score {
                record.score = score;
            }
            if let Some(energy) = patch.energy {
                record.energy = energy;
            }
            if let Some(levels) = &patch.completed_levels {
                record.completed_levels = levels.clone();
            }
            if let Some(index) = patch.current_node_index {
                record.current_node_index = index;
            }
            if let Some(at) = patch.updated_at_ms {
                record.updated_at_ms = at;
            }
            Ok(())
        }

        fn roster_since(&self, updated_after_ms: u64) -> Result<Vec<ProfileRecord>, Self::Error> {
            self.guard()?;
            let mut records: Vec<ProfileRecord> = self
                .records
                .borrow()
                .values()
                .filter(|record| record.updated_at_ms > updated_after_ms)
                .cloned()
                .collect();
            records.sort_by(|a, b| b.score.cmp(&a.score));
            Ok(records)
        }

        fn all_profiles(&self) -> Result<Vec<ProfileRecord>, Self::Error> {
            self.guard()?;
            let mut records: Vec<ProfileRecord> =
                self.records.borrow().values().cloned().collect();
            records.sort_by(|a, b| b.score.cmp(&a.score));
            Ok(records)
        }
    }

    /// Reply generator with a fixed script.
    #[derive(Clone, Copy, Default)]
    pub struct CannedReplies;

    impl ReplyGenerator for CannedReplies {
        type Error = Infallible;

        fn generate_reply(
            &self,
            persona_name: &str,
            _incoming: &str,
        ) -> Result<String, Self::Error> {
            Ok(format!("{persona_name}: almost past your score!"))
        }
    }

    /// Reply generator that always fails.
    #[derive(Clone, Copy, Default)]
    pub struct OfflineReplies;

    impl ReplyGenerator for OfflineReplies {
        type Error = Unreachable;

        fn generate_reply(
            &self,
            _persona_name: &str,
            _incoming: &str,
        ) -> Result<String, Self::Error> {
            Err(Unreachable)
        }
    }

    pub type TestEngine = GameEngine<OfflineQuestions, MemoryProfiles, CannedReplies>;

    pub fn offline_engine() -> TestEngine {
        GameEngine::with_builtin_content(
            OfflineQuestions,
            MemoryProfiles::default(),
            CannedReplies,
        )
    }

    /// Drive the session straight into the playing screen.
    pub fn enter_playing<Q, P, R>(
        engine: &GameEngine<Q, P, R>,
        session: &mut GameSession,
        dynasty: Dynasty,
    ) -> u64
    where
        Q: QuestionSource,
        P: ProfileStore,
        R: ReplyGenerator,
    {
        let mut now = 0;
        engine.register_player(session, "Tester", "t@example.com", None, now);
        now = settle(engine, session, now);
        engine.select_dynasty(session, dynasty, now);
        now = settle(engine, session, now);
        engine.start_mission(session, now);
        settle(engine, session, now)
    }

    /// Let the in-flight transition commit and settle, returning the new
    /// time cursor.
    pub fn settle<Q, P, R>(
        engine: &GameEngine<Q, P, R>,
        session: &mut GameSession,
        now: u64,
    ) -> u64
    where
        Q: QuestionSource,
        P: ProfileStore,
        R: ReplyGenerator,
    {
        let commit = now + TRANSITION_EXIT_MS;
        engine.advance(session, commit);
        let settled = commit + TRANSITION_SETTLE_MS;
        engine.advance(session, settled);
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::testkit::{
        CannedReplies, MemoryProfiles, OfflineQuestions, enter_playing, offline_engine, settle,
    };
    use super::*;

    #[test]
    fn engine_boots_a_session_into_the_start_screen() {
        let engine = offline_engine();
        let session = engine.create_session(0xC0DE);
        assert_eq!(session.screen(), Screen::Start);
        assert!(session.mission().is_none());
        assert_eq!(
            session.classmate_sim().len(),
            engine.data().roster.len()
        );
    }

    #[test]
    fn quiz_node_resolves_via_explicit_reference_when_generator_is_down() {
        let engine = offline_engine();
        let mut session = engine.create_session(1);
        let _now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);
        engine.activate_node(&mut session, 0);
        match session.mission().unwrap().phase() {
            MissionPhase::InQuestion(active) => {
                // Node 0 carries the explicit `f1` reference.
                assert_eq!(active.question.id, "f1");
                assert!(active.selected.is_none());
            }
            phase => panic!("expected an active question, got {phase:?}"),
        }
    }

    #[test]
    fn unreferenced_quiz_node_falls_back_to_pool_by_modulo() {
        let engine = offline_engine();
        let bank_len = engine.bank().len();
        let question = engine.resolve_question(1, 3, None, "Jerusalem").unwrap();
        let expected = engine.bank().by_index_modulo(3 % bank_len).unwrap();
        assert_eq!(question.id, expected.id);
    }

    #[test]
    fn sign_in_creates_a_profile_and_moves_to_dynasty_select() {
        let engine = offline_engine();
        let mut session = engine.create_session(5);
        let user = AuthUser {
            id: "uid-1".into(),
            email: "cadet@example.com".into(),
            full_name: Some("Cadet One".into()),
            avatar_url: None,
        };
        engine.complete_sign_in(&mut session, &user, 0);
        assert_eq!(session.player().name, "Cadet One");
        assert_eq!(session.player().user_id.as_deref(), Some("uid-1"));
        assert!(session.flow().is_transitioning());
        let now = settle(&engine, &mut session, 0);
        assert_eq!(session.screen(), Screen::DynastySelect);

        // Second sign-in finds the stored record and prefers it.
        let mut fresh = engine.create_session(6);
        engine.complete_sign_in(&mut fresh, &user, now);
        assert_eq!(fresh.player().name, "Cadet One");
    }

    #[test]
    fn sign_in_survives_a_dead_store() {
        let profiles = MemoryProfiles::default();
        profiles.set_offline(true);
        let engine =
            GameEngine::with_builtin_content(OfflineQuestions, profiles, CannedReplies);
        let mut session = engine.create_session(5);
        let user = AuthUser {
            id: "uid-2".into(),
            email: "ghost@example.com".into(),
            full_name: Some("Ghost".into()),
            avatar_url: None,
        };
        engine.complete_sign_in(&mut session, &user, 0);
        assert_eq!(session.player().name, "Ghost");
        assert_eq!(session.player().user_id.as_deref(), Some("uid-2"));
        assert!(session.flow().is_transitioning());
    }

    #[test]
    fn chat_reply_falls_back_when_the_generator_is_down() {
        let engine = GameEngine::with_builtin_content(
            OfflineQuestions,
            MemoryProfiles::default(),
            super::testkit::OfflineReplies,
        );
        let mut session = engine.create_session(11);
        let now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);
        engine.send_chat(&mut session, "anyone got the answer?", now);
        // Reply lands within the base delay plus jitter.
        engine.advance(&mut session, now + 3_000);
        let messages = session.chat().messages();
        assert!(messages.iter().any(|m| m.is_me));
        assert!(
            messages
                .iter()
                .any(|m| !m.is_me && m.text == constants::FALLBACK_REPLY)
        );
    }

    #[test]
    fn blank_chat_sends_are_ignored() {
        let engine = offline_engine();
        let mut session = engine.create_session(11);
        let now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);
        engine.send_chat(&mut session, "   ", now);
        // The greeting may be present; no player message must be.
        assert!(session.chat().messages().iter().all(|m| !m.is_me));
    }

    #[test]
    fn admin_overview_reads_the_store() {
        let profiles = MemoryProfiles::default();
        profiles.records.borrow_mut().insert(
            "a".into(),
            ProfileRecord {
                id: "a".into(),
                score: 120,
                ..ProfileRecord::default()
            },
        );
        let engine =
            GameEngine::with_builtin_content(OfflineQuestions, profiles, CannedReplies);
        let (records, overview) = engine.admin_overview().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(overview.total_players, 1);
        assert_eq!(overview.average_score, 120);
    }
}
