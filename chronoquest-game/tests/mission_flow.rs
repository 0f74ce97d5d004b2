//! End-to-end progression scenarios driven through the engine clock.

mod common;

use chronoquest_game::{
    AnswerDisposition, AnswerStatus, Dynasty, GameSession, MAX_ENERGY, MissionPhase, QUIZ_POINTS,
    Screen,
};
use common::{TestEngine, enter_playing, offline_engine, settle};

/// Answer the active question with the given correctness, reading the
/// resolved question from the session itself.
fn answer(
    engine: &TestEngine,
    session: &mut GameSession,
    correctly: bool,
    now: u64,
) -> AnswerDisposition {
    let MissionPhase::InQuestion(active) = session.mission().unwrap().phase().clone() else {
        panic!("no active question");
    };
    let correct = active.question.correct_index;
    let wrong = (correct + 1) % active.question.options.len();
    let selected = if correctly { correct } else { wrong };
    engine
        .submit_answer(session, selected, now)
        .expect("answer accepted")
        .disposition
}

#[test]
fn wrong_twice_then_correct_costs_two_energy_and_advances() {
    let engine = offline_engine();
    let mut session = engine.create_session(42);
    let mut now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);

    for _ in 0..2 {
        engine.activate_node(&mut session, 0);
        assert_eq!(answer(&engine, &mut session, false, now), AnswerDisposition::Retry);
        // Retry display delay, then back on the map at the same node.
        now += 3_000;
        engine.advance(&mut session, now);
        assert_eq!(*session.mission().unwrap().phase(), MissionPhase::AtNode);
        assert_eq!(session.player().progress.current_node_index, 0);
    }

    engine.activate_node(&mut session, 0);
    assert_eq!(answer(&engine, &mut session, true, now), AnswerDisposition::Advance);
    now += 2_000;
    engine.advance(&mut session, now);

    let progress = &session.player().progress;
    assert_eq!(progress.energy, 1);
    assert_eq!(progress.score, QUIZ_POINTS);
    assert_eq!(progress.current_node_index, 1);
    assert_eq!(progress.last_outcome, AnswerStatus::Correct);
}

#[test]
fn three_wrong_answers_end_the_run_in_game_over() {
    let engine = offline_engine();
    let mut session = engine.create_session(42);
    let mut now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);

    for attempt in 0..3 {
        engine.activate_node(&mut session, 0);
        let disposition = answer(&engine, &mut session, false, now);
        if attempt < 2 {
            assert_eq!(disposition, AnswerDisposition::Retry);
            now += 3_000;
            engine.advance(&mut session, now);
        } else {
            assert_eq!(disposition, AnswerDisposition::Defeat);
        }
    }
    assert_eq!(session.player().progress.energy, 0);

    // Defeat commits after its display delay, then the screen follows.
    now += 2_000;
    engine.advance(&mut session, now);
    assert_eq!(*session.mission().unwrap().phase(), MissionPhase::Failed);
    now = settle(&engine, &mut session, now);
    assert_eq!(session.screen(), Screen::GameOver);
}

#[test]
fn retry_after_defeat_resets_position_and_energy_but_keeps_identity_and_score() {
    let engine = offline_engine();
    let mut session = engine.create_session(7);
    let mut now = enter_playing(&engine, &mut session, Dynasty::Umayyah2);

    // Start of the western campaign: board index 6.
    assert_eq!(session.player().progress.current_node_index, 6);

    // Clear one node for score, then burn out on the next.
    engine.activate_node(&mut session, 6);
    answer(&engine, &mut session, true, now);
    now += 2_000;
    engine.advance(&mut session, now);
    let score_before = session.player().progress.score;
    assert_eq!(score_before, QUIZ_POINTS);

    // Node 7 is reading material; close it, then fail out on node 8.
    engine.activate_node(&mut session, 7);
    engine.close_material(&mut session, now);
    for _ in 0..3 {
        engine.activate_node(&mut session, 8);
        answer(&engine, &mut session, false, now);
        now += 3_000;
        engine.advance(&mut session, now);
    }
    now = settle(&engine, &mut session, now);
    assert_eq!(session.screen(), Screen::GameOver);

    let name_before = session.player().name.clone();
    engine.retry_mission(&mut session, now);
    now = settle(&engine, &mut session, now);

    assert_eq!(session.screen(), Screen::Playing);
    let player = session.player();
    assert_eq!(player.name, name_before);
    assert_eq!(player.progress.energy, MAX_ENERGY);
    assert_eq!(player.progress.current_node_index, 0);
    assert_eq!(player.progress.score, score_before + 50);
}

#[test]
fn material_node_awards_fifty_and_advances_without_a_failure_path() {
    let engine = offline_engine();
    let mut session = engine.create_session(9);
    let mut now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);

    // Clear the first quiz to stand on the material node (index 1).
    engine.activate_node(&mut session, 0);
    answer(&engine, &mut session, true, now);
    now += 2_000;
    engine.advance(&mut session, now);
    let score_before = session.player().progress.score;
    let energy_before = session.player().progress.energy;

    engine.activate_node(&mut session, 1);
    assert!(matches!(
        session.mission().unwrap().phase(),
        MissionPhase::InMaterial(_)
    ));
    engine.close_material(&mut session, now);

    let progress = &session.player().progress;
    assert_eq!(progress.score, score_before + 50);
    assert_eq!(progress.energy, energy_before);
    assert_eq!(progress.current_node_index, 2);
    assert_eq!(*session.mission().unwrap().phase(), MissionPhase::AtNode);
}

#[test]
fn skipping_ahead_and_revisiting_are_no_ops() {
    let engine = offline_engine();
    let mut session = engine.create_session(3);
    let now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);

    engine.activate_node(&mut session, 4);
    assert_eq!(*session.mission().unwrap().phase(), MissionPhase::AtNode);

    engine.activate_node(&mut session, 0);
    answer(&engine, &mut session, true, now);
    engine.advance(&mut session, now + 2_000);
    // Node 0 is behind the learner now.
    engine.activate_node(&mut session, 0);
    assert_eq!(*session.mission().unwrap().phase(), MissionPhase::AtNode);
}

#[test]
fn double_submission_is_idempotent_through_the_engine() {
    let engine = offline_engine();
    let mut session = engine.create_session(3);
    let now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);

    engine.activate_node(&mut session, 0);
    let first = engine.submit_answer(&mut session, 1, now);
    assert!(first.is_some());
    let progress_after_first = session.player().progress.clone();
    assert!(engine.submit_answer(&mut session, 2, now).is_none());
    assert_eq!(session.player().progress, progress_after_first);
}

#[test]
fn completing_the_board_grants_the_artifact_once_and_reaches_victory() {
    let engine = offline_engine();
    let mut session = engine.create_session(64);
    let mut now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);

    let board_length = session.board().len();
    loop {
        let index = session.player().progress.current_node_index;
        if index >= board_length {
            break;
        }
        engine.activate_node(&mut session, index);
        match session.mission().unwrap().phase().clone() {
            MissionPhase::InQuestion(_) => {
                let disposition = answer(&engine, &mut session, true, now);
                now += 2_000;
                engine.advance(&mut session, now);
                if disposition == AnswerDisposition::Completes {
                    break;
                }
            }
            MissionPhase::InMaterial(_) => {
                engine.close_material(&mut session, now);
            }
            phase => panic!("unexpected phase {phase:?}"),
        }
    }

    assert_eq!(session.player().progress.current_node_index, board_length);
    // The artifact ritual fired during the post-answer advance above.
    assert_eq!(*session.mission().unwrap().phase(), MissionPhase::Completed);
    assert_eq!(session.player().artifacts.len(), 1);

    // A stray second reveal changes nothing.
    engine.advance(&mut session, now + 10_000);
    assert_eq!(session.player().artifacts.len(), 1);

    engine.claim_artifact(&mut session, now);
    now = settle(&engine, &mut session, now);
    assert_eq!(session.screen(), Screen::Victory);
    assert_eq!(session.player().completed_levels, vec![1]);

    engine.return_to_portal(&mut session, now);
    let _ = settle(&engine, &mut session, now);
    assert_eq!(session.screen(), Screen::DynastySelect);
    assert!(session.mission().is_none());
}

#[test]
fn progression_invariants_hold_under_a_noisy_drive() {
    let engine = offline_engine();
    let mut session = engine.create_session(1_234);
    let mut now = enter_playing(&engine, &mut session, Dynasty::Umayyah1);
    let board_length = session.board().len();

    let mut last_score = 0;
    for step in 0..200u64 {
        let index = session.player().progress.current_node_index;
        engine.activate_node(&mut session, index.min(board_length - 1));
        // Alternate wrong and correct answers, with stray double-submits.
        if matches!(
            session.mission().unwrap().phase(),
            MissionPhase::InQuestion(_)
        ) {
            let _ = engine.submit_answer(&mut session, (step % 4) as usize, now);
            let _ = engine.submit_answer(&mut session, 0, now);
        } else if matches!(
            session.mission().unwrap().phase(),
            MissionPhase::InMaterial(_)
        ) {
            engine.close_material(&mut session, now);
        }
        now += 1_000;
        engine.advance(&mut session, now);

        let progress = &session.player().progress;
        assert!(progress.energy >= 0 && progress.energy <= MAX_ENERGY);
        assert!(progress.current_node_index <= board_length);
        assert!(progress.score >= last_score, "score must never decrease");
        last_score = progress.score;

        match session.screen() {
            Screen::GameOver => {
                engine.retry_mission(&mut session, now);
                now = settle(&engine, &mut session, now);
            }
            Screen::Victory => break,
            _ => {}
        }
        if session.mission().is_none() {
            break;
        }
    }
}
