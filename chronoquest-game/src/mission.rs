//! The human participant's traversal state machine.
//!
//! One `MissionRun` governs one attempt at a campaign board. The machine
//! only ever moves through its methods; guard violations (activating a
//! distant node, answering twice, closing material that is not open) are
//! silent no-ops because they indicate caller misuse, not recoverable
//! runtime conditions. The worst reachable outcome is the `Failed` phase,
//! which is an expected terminal state rather than an error.

use serde::{Deserialize, Serialize};

use crate::constants::{MATERIAL_POINTS, QUIZ_POINTS};
use crate::map::{MapNode, MaterialContent, NodeGraph, NodeKind};
use crate::progress::{AnswerStatus, Progression};
use crate::question::Question;

/// A resolved question plus its single-answer lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveQuestion {
    pub question: Question,
    /// `Some` once an answer has been accepted; later submissions no-op.
    pub selected: Option<usize>,
}

/// Where the run currently stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum MissionPhase {
    /// Viewing the map, eligible to interact with the current node.
    #[default]
    AtNode,
    /// Quiz UI active, awaiting (or displaying the result of) an answer.
    InQuestion(ActiveQuestion),
    /// Reading-material UI active.
    InMaterial(MaterialContent),
    /// Correct answer accepted; waiting out the display delay.
    Advancing,
    /// Energy exhausted. Terminal until an explicit restart.
    Failed,
    /// Board finished and reward granted. Terminal for the run.
    Completed,
}

/// What a node activation asks of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Guard rejected the interaction.
    Ignored,
    /// Material is now open for reading.
    Material,
    /// A question must be resolved and fed back via `begin_question`.
    NeedsQuestion { question_ref: Option<String> },
}

/// Where an accepted answer sends the run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerDisposition {
    /// Advance to the next node after the short display delay.
    Advance,
    /// That was the final node: completion ritual, then victory.
    Completes,
    /// Wrong, but energy remains; same node retries after the delay.
    Retry,
    /// Wrong and out of energy; the run fails after the delay.
    Defeat,
}

/// Result surface of an accepted answer, for the feedback display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub verdict: AnswerStatus,
    pub correct_index: usize,
    pub explanation: String,
    pub disposition: AnswerDisposition,
}

/// Outcome of closing a material node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialOutcome {
    Ignored,
    Advanced,
    Completes,
}

/// One attempt at a campaign board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRun {
    level_id: u32,
    start_index: usize,
    graph: NodeGraph,
    phase: MissionPhase,
    completion_fired: bool,
}

impl MissionRun {
    /// Begin a run at `start_index`, refilling energy while keeping the
    /// participant's accumulated score.
    #[must_use]
    pub fn new(
        level_id: u32,
        graph: NodeGraph,
        start_index: usize,
        progress: &mut Progression,
    ) -> Self {
        let start = start_index.min(graph.final_index());
        progress.reset_for_restart(start);
        Self {
            level_id,
            start_index: start,
            graph,
            phase: MissionPhase::AtNode,
            completion_fired: false,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &MissionPhase {
        &self.phase
    }

    #[must_use]
    pub const fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    #[must_use]
    pub const fn level_id(&self) -> u32 {
        self.level_id
    }

    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    #[must_use]
    pub fn current_node(&self, progress: &Progression) -> Option<&MapNode> {
        self.graph.node_at(progress.current_node_index)
    }

    /// Try to interact with the node at `index`. Interaction is only
    /// permitted with the current node while viewing the map.
    pub fn activate(&mut self, progress: &Progression, index: usize) -> Activation {
        if self.phase != MissionPhase::AtNode || index != progress.current_node_index {
            return Activation::Ignored;
        }
        match self.graph.node_at(index).map(|node| &node.kind) {
            Some(NodeKind::Material { content }) => {
                let content = content.clone();
                self.phase = MissionPhase::InMaterial(content);
                Activation::Material
            }
            Some(NodeKind::Quiz { question_ref }) => Activation::NeedsQuestion {
                question_ref: question_ref.clone(),
            },
            None => Activation::Ignored,
        }
    }

    /// Enter the quiz with a resolved question. Only valid from the map.
    pub fn begin_question(&mut self, question: Question) {
        if self.phase == MissionPhase::AtNode {
            self.phase = MissionPhase::InQuestion(ActiveQuestion {
                question,
                selected: None,
            });
        }
    }

    /// Accept at most one answer for the active question.
    ///
    /// Returns `None` when no question is active, the question was already
    /// answered, or `selected` is not a valid option index.
    pub fn submit_answer(
        &mut self,
        progress: &mut Progression,
        selected: usize,
        now_ms: u64,
    ) -> Option<AnswerFeedback> {
        let MissionPhase::InQuestion(active) = &mut self.phase else {
            return None;
        };
        if active.selected.is_some() || selected >= active.question.options.len() {
            return None;
        }
        active.selected = Some(selected);
        let question = active.question.clone();

        if question.is_correct(selected) {
            progress.award(QUIZ_POINTS);
            let next = progress.advance();
            progress.mark(AnswerStatus::Correct, now_ms);
            let disposition = if next >= self.graph.len() {
                AnswerDisposition::Completes
            } else {
                AnswerDisposition::Advance
            };
            self.phase = MissionPhase::Advancing;
            Some(AnswerFeedback {
                verdict: AnswerStatus::Correct,
                correct_index: question.correct_index,
                explanation: question.explanation,
                disposition,
            })
        } else {
            progress.spend_energy();
            progress.mark(AnswerStatus::Wrong, now_ms);
            let disposition = if progress.is_exhausted() {
                AnswerDisposition::Defeat
            } else {
                AnswerDisposition::Retry
            };
            Some(AnswerFeedback {
                verdict: AnswerStatus::Wrong,
                correct_index: question.correct_index,
                explanation: question.explanation,
                disposition,
            })
        }
    }

    /// Close the reading material: unconditional award and advance.
    pub fn close_material(
        &mut self,
        progress: &mut Progression,
        now_ms: u64,
    ) -> MaterialOutcome {
        if !matches!(self.phase, MissionPhase::InMaterial(_)) {
            return MaterialOutcome::Ignored;
        }
        progress.award(MATERIAL_POINTS);
        let next = progress.advance();
        progress.mark(AnswerStatus::None, now_ms);
        if next >= self.graph.len() {
            self.phase = MissionPhase::Advancing;
            MaterialOutcome::Completes
        } else {
            self.phase = MissionPhase::AtNode;
            MaterialOutcome::Advanced
        }
    }

    /// Return to the map after the feedback display delay. Valid after an
    /// accepted answer, whether it advanced or asks for a retry.
    pub fn commit_return_to_map(&mut self) {
        match &self.phase {
            MissionPhase::Advancing => self.phase = MissionPhase::AtNode,
            MissionPhase::InQuestion(active) if active.selected.is_some() => {
                self.phase = MissionPhase::AtNode;
            }
            _ => {}
        }
    }

    /// Commit the deferred defeat after its display delay.
    pub fn commit_defeat(&mut self, progress: &Progression) {
        if progress.is_exhausted()
            && matches!(&self.phase, MissionPhase::InQuestion(active) if active.selected.is_some())
        {
            self.phase = MissionPhase::Failed;
        }
    }

    /// Commit completion exactly once. Returns whether the reward ritual
    /// should fire.
    pub fn commit_completion(&mut self, progress: &Progression) -> bool {
        if self.completion_fired || progress.current_node_index < self.graph.len() {
            return false;
        }
        self.completion_fired = true;
        self.phase = MissionPhase::Completed;
        true
    }

    /// Restart after a defeat: full energy, back to the board start.
    /// Identity and accumulated score are untouched.
    pub fn restart(&mut self, progress: &mut Progression) {
        if self.phase == MissionPhase::Failed {
            progress.reset_for_restart(0);
            self.phase = MissionPhase::AtNode;
            self.completion_fired = false;
        }
    }
}
