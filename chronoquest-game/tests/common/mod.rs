//! Shared collaborator fakes and drive helpers for the integration suites.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use chronoquest_game::{
    AuthUser, Dynasty, GameEngine, GameSession, ProfileRecord, ProfileStore, ProfileUpdate,
    Question, QuestionSource, ReplyGenerator, Screen,
};

pub const EXIT_MS: u64 = 500;
pub const SETTLE_MS: u64 = 50;

/// Error for collaborators configured to be unreachable.
#[derive(Debug, Clone, Copy)]
pub struct Unreachable;

impl fmt::Display for Unreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("collaborator unreachable")
    }
}

impl std::error::Error for Unreachable {}

/// Question source that always fails, forcing the static-pool fallbacks.
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

/// In-memory profile store with a togglable outage, shared across clones.
#[derive(Clone, Default)]
pub struct MemoryProfiles {
    records: Rc<RefCell<HashMap<String, ProfileRecord>>>,
    offline: Rc<RefCell<bool>>,
}

impl MemoryProfiles {
    pub fn set_offline(&self, offline: bool) {
        *self.offline.borrow_mut() = offline;
    }

    pub fn seed_record(&self, record: ProfileRecord) {
        self.records
            .borrow_mut()
            .insert(record.id.clone(), record);
    }

    pub fn record(&self, id: &str) -> Option<ProfileRecord> {
        self.records.borrow().get(id).cloned()
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
        self.records
            .borrow_mut()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn update_profile(&self, id: &str, patch: &ProfileUpdate) -> Result<(), Self::Error> {
        self.guard()?;
        let mut records = self.records.borrow_mut();
        let record = records.entry(id.to_string()).or_insert_with(|| ProfileRecord {
            id: id.to_string(),
            ..ProfileRecord::default()
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
        let mut records: Vec<ProfileRecord> = self.records.borrow().values().cloned().collect();
        records.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(records)
    }
}

/// Reply generator with a deterministic script.
#[derive(Clone, Copy, Default)]
pub struct CannedReplies;

impl ReplyGenerator for CannedReplies {
    type Error = Infallible;

    fn generate_reply(&self, persona_name: &str, _incoming: &str) -> Result<String, Self::Error> {
        Ok(format!("{persona_name}: race you to Cordoba!"))
    }
}

pub type TestEngine = GameEngine<OfflineQuestions, MemoryProfiles, CannedReplies>;

pub fn engine_with_profiles() -> (TestEngine, MemoryProfiles) {
    let profiles = MemoryProfiles::default();
    let engine = GameEngine::with_builtin_content(
        OfflineQuestions,
        profiles.clone(),
        CannedReplies,
    );
    (engine, profiles)
}

pub fn offline_engine() -> TestEngine {
    engine_with_profiles().0
}

/// Let the in-flight transition commit and settle; returns the new cursor.
pub fn settle(engine: &TestEngine, session: &mut GameSession, now: u64) -> u64 {
    let commit = now + EXIT_MS;
    engine.advance(session, commit);
    let settled = commit + SETTLE_MS;
    engine.advance(session, settled);
    settled
}

/// Drive a fresh session into the playing screen, returning the cursor.
pub fn enter_playing(
    engine: &TestEngine,
    session: &mut GameSession,
    dynasty: Dynasty,
) -> u64 {
    let mut now = 0;
    engine.register_player(session, "Tester", "tester@example.com", None, now);
    now = settle(engine, session, now);
    assert_eq!(session.screen(), Screen::DynastySelect);
    engine.select_dynasty(session, dynasty, now);
    now = settle(engine, session, now);
    engine.start_mission(session, now);
    let now = settle(engine, session, now);
    assert_eq!(session.screen(), Screen::Playing);
    now
}

/// Sign in with a throwaway identity so profile writes have a target.
pub fn signed_in_user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        full_name: Some(format!("Agent {id}")),
        avatar_url: None,
    }
}
