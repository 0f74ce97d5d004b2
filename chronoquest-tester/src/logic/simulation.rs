//! Deterministic session drive loop.
//!
//! One simulated second per step; the engine clock does the rest. Every
//! run is a pure function of (seed, policy, tick budget), which makes a
//! sweep diffable across code changes.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::Serialize;

use chronoquest_game::{
    Dynasty, GameEngine, GameSession, MissionPhase, Question, Screen,
};

use crate::logic::fixtures::{CannedReplies, MemoryProfiles, OfflineQuestions};

type TestEngine = GameEngine<OfflineQuestions, MemoryProfiles, CannedReplies>;

const STEP_MS: u64 = 1_000;
const TRANSITION_MS: u64 = 550;

/// Scripted player behavior for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPolicy {
    /// Always answers correctly
    Perfect,
    /// First try wrong, second try correct, on every quiz node
    Mixed,
    /// Never answers correctly
    Reckless,
}

impl PlayerPolicy {
    fn choose(self, question: &Question, attempt: u32) -> usize {
        let wrong = (question.correct_index + 1) % question.options.len().max(1);
        match self {
            Self::Perfect => question.correct_index,
            Self::Mixed => {
                if attempt % 2 == 0 {
                    wrong
                } else {
                    question.correct_index
                }
            }
            Self::Reckless => wrong,
        }
    }
}

/// Configuration for one simulated session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub ticks: u64,
    pub policy: PlayerPolicy,
    pub retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Victory,
    Defeat,
    TimedOut,
}

/// Result of one driven session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub seed: u64,
    pub dynasty: String,
    pub policy: PlayerPolicy,
    pub outcome: SessionOutcome,
    pub ticks_used: u64,
    pub final_score: u32,
    pub final_rank: Option<usize>,
    pub final_energy: i32,
    pub retries_used: u32,
    pub competitors_finished: usize,
    pub top_competitor: String,
    pub top_competitor_score: u32,
}

/// Aggregate figures over a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct SweepSummary {
    pub sessions: usize,
    pub victories: usize,
    pub defeats: usize,
    pub timeouts: usize,
    pub average_score: u32,
    pub average_rank: f64,
}

fn settle(engine: &TestEngine, session: &mut GameSession, now: u64) -> u64 {
    let settled = now + TRANSITION_MS;
    engine.advance(session, settled);
    settled
}

/// Drive one full session to victory, defeat or the tick budget.
pub fn run_session(config: &SimulationConfig) -> SessionReport {
    let engine = GameEngine::with_builtin_content(
        OfflineQuestions,
        MemoryProfiles::default(),
        CannedReplies,
    );
    let mut session = engine.create_session(config.seed);

    let dynasty = if config.seed % 2 == 0 {
        Dynasty::Umayyah1
    } else {
        Dynasty::Umayyah2
    };
    let mut now = 0;
    engine.register_player(&mut session, "QA Cadet", "qa@example.com", None, now);
    now = settle(&engine, &mut session, now);
    engine.select_dynasty(&mut session, dynasty, now);
    now = settle(&engine, &mut session, now);
    engine.start_mission(&mut session, now);
    now = settle(&engine, &mut session, now);
    debug_assert_eq!(session.screen(), Screen::Playing);

    let started_at = now;
    let deadline = now + config.ticks * STEP_MS;
    let mut retries_used = 0;
    let mut attempts: HashMap<usize, u32> = HashMap::new();
    let mut outcome = SessionOutcome::TimedOut;

    while now < deadline {
        now += STEP_MS;
        engine.advance(&mut session, now);

        match session.screen() {
            Screen::Victory => {
                outcome = SessionOutcome::Victory;
                break;
            }
            Screen::GameOver => {
                if session.flow().is_transitioning() {
                    continue;
                }
                if retries_used >= config.retries {
                    outcome = SessionOutcome::Defeat;
                    break;
                }
                retries_used += 1;
                attempts.clear();
                engine.retry_mission(&mut session, now);
                continue;
            }
            Screen::Playing if !session.flow().is_transitioning() => {}
            _ => continue,
        }

        let Some(run) = session.mission() else {
            continue;
        };
        match run.phase().clone() {
            MissionPhase::AtNode => {
                let index = session.player().progress.current_node_index;
                engine.activate_node(&mut session, index);
                if let Some(MissionPhase::InMaterial(_)) =
                    session.mission().map(|run| run.phase())
                {
                    engine.close_material(&mut session, now);
                }
            }
            MissionPhase::InQuestion(active) => {
                if active.selected.is_none() {
                    let index = session.player().progress.current_node_index;
                    let attempt = attempts.entry(index).or_insert(0);
                    let selected = config.policy.choose(&active.question, *attempt);
                    *attempt += 1;
                    engine.submit_answer(&mut session, selected, now);
                }
            }
            MissionPhase::InMaterial(_) => engine.close_material(&mut session, now),
            MissionPhase::Completed => engine.claim_artifact(&mut session, now),
            MissionPhase::Advancing | MissionPhase::Failed => {}
        }
    }

    let snapshot = session.snapshot();
    let final_index = session.board().final_index();
    let competitors_finished = session
        .classmate_sim()
        .classmates()
        .iter()
        .filter(|mate| mate.progress.current_node_index >= final_index)
        .count();
    let top = session.classmate_sim().classmates().first();

    SessionReport {
        seed: config.seed,
        dynasty: dynasty.to_string(),
        policy: config.policy,
        outcome,
        ticks_used: (now - started_at) / STEP_MS,
        final_score: snapshot.player.progress.score,
        final_rank: snapshot.player_rank,
        final_energy: snapshot.player.progress.energy,
        retries_used,
        competitors_finished,
        top_competitor: top.map_or_else(String::new, |mate| mate.name.clone()),
        top_competitor_score: top.map_or(0, |mate| mate.progress.score),
    }
}

/// Summarize a finished sweep.
pub fn aggregate(reports: &[SessionReport]) -> SweepSummary {
    let sessions = reports.len();
    if sessions == 0 {
        return SweepSummary::default();
    }
    let victories = reports
        .iter()
        .filter(|r| r.outcome == SessionOutcome::Victory)
        .count();
    let defeats = reports
        .iter()
        .filter(|r| r.outcome == SessionOutcome::Defeat)
        .count();
    let timeouts = sessions - victories - defeats;
    let total_score: u64 = reports.iter().map(|r| u64::from(r.final_score)).sum();
    let ranked: Vec<usize> = reports.iter().filter_map(|r| r.final_rank).collect();
    let average_rank = if ranked.is_empty() {
        0.0
    } else {
        ranked.iter().sum::<usize>() as f64 / ranked.len() as f64
    };
    SweepSummary {
        sessions,
        victories,
        defeats,
        timeouts,
        average_score: u32::try_from(total_score / sessions as u64).unwrap_or(u32::MAX),
        average_rank,
    }
}
