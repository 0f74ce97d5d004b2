//! In-memory collaborators so sessions run fully offline.

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;

use thiserror::Error;

use chronoquest_game::{
    ProfileRecord, ProfileStore, ProfileUpdate, Question, QuestionSource, ReplyGenerator,
};

/// The sweep exercises the engine's fallback paths on purpose.
#[derive(Debug, Clone, Copy, Error)]
#[error("collaborator offline")]
pub struct Offline;

/// Question source that is always down; the engine falls back to the
/// embedded bank, which keeps every run deterministic.
#[derive(Clone, Copy, Default)]
pub struct OfflineQuestions;

impl QuestionSource for OfflineQuestions {
    type Error = Offline;

    fn generate_question(
        &self,
        _level_id: u32,
        _context_hints: &[String],
    ) -> Result<Question, Self::Error> {
        Err(Offline)
    }

    fn historical_fact(&self) -> Result<String, Self::Error> {
        Err(Offline)
    }
}

/// Profile store backed by a plain map.
#[derive(Clone, Default)]
pub struct MemoryProfiles {
    records: RefCell<HashMap<String, ProfileRecord>>,
}

impl ProfileStore for MemoryProfiles {
    type Error = Infallible;

    fn fetch_profile(&self, id: &str) -> Result<Option<ProfileRecord>, Self::Error> {
        Ok(self.records.borrow().get(id).cloned())
    }

    fn insert_profile(&self, record: &ProfileRecord) -> Result<(), Self::Error> {
        self.records
            .borrow_mut()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn update_profile(&self, id: &str, patch: &ProfileUpdate) -> Result<(), Self::Error> {
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
        let mut records: Vec<ProfileRecord> =
            self.records.borrow().values().cloned().collect();
        records.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(records)
    }
}

/// Deterministic chat replies.
#[derive(Clone, Copy, Default)]
pub struct CannedReplies;

impl ReplyGenerator for CannedReplies {
    type Error = Infallible;

    fn generate_reply(&self, persona_name: &str, _incoming: &str) -> Result<String, Self::Error> {
        Ok(format!("{persona_name}: good luck out there!"))
    }
}
