//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across generated scripts and
//! arbitrary learner action sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::illustration::placeholder_image;
use crate::script::{mia_story, CorrectOption, Question, Script, Step, WrongOption};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn question(id: u32) -> Question {
    Question {
        question_id: id,
        correct: CorrectOption {
            text: format!("right {id}"),
            prompt: format!("picture {id}"),
            response: format!("yes {id}"),
        },
        wrong: WrongOption {
            text: format!("wrong {id}"),
            explanation: format!("reread {id}"),
        },
    }
}

/// Opening, then blocks of 0-3 narration steps each followed by a question,
/// optionally ending with a closing step. Empty blocks put questions back to
/// back, so a retry can lead through an already answered question.
fn arb_script() -> impl Strategy<Value = Script> {
    (proptest::collection::vec(0usize..4, 1..5), any::<bool>()).prop_map(|(blocks, closing)| {
        let mut steps = vec![Step::narration("opening", "Start")];
        for (i, narrations) in blocks.iter().enumerate() {
            for n in 0..*narrations {
                steps.push(Step::narration(format!("story {i}.{n}"), "Next"));
            }
            let id = u32::try_from(i + 1).unwrap();
            steps.push(Step::question(format!("question {id}?"), question(id)));
        }
        if closing {
            steps.push(Step::closing("the end", "Play Again"));
        }
        Script::new(steps).unwrap()
    })
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Advance,
    AnswerCorrect,
    AnswerWrong,
    Reread,
    Repeat,
    Deliver,
    Restart,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => Just(Action::Advance),
        3 => Just(Action::AnswerCorrect),
        2 => Just(Action::AnswerWrong),
        1 => Just(Action::Reread),
        1 => Just(Action::Repeat),
        3 => Just(Action::Deliver),
        1 => Just(Action::Restart),
    ]
}

// ============================================================================
// Helpers
// ============================================================================

fn slot(order: OptionOrder, correct: bool) -> OptionSlot {
    if order.is_correct(OptionSlot::First) == correct {
        OptionSlot::First
    } else {
        OptionSlot::Second
    }
}

/// Turn an abstract action into a concrete event for the current phase
fn to_event(session: &Session, action: Action) -> Event {
    match (action, &session.phase) {
        (Action::AnswerCorrect, Phase::AwaitingAnswer { order, .. }) => Event::Answer {
            slot: slot(*order, true),
        },
        (Action::AnswerWrong, Phase::AwaitingAnswer { order, .. }) => Event::Answer {
            slot: slot(*order, false),
        },
        (Action::AnswerCorrect | Action::AnswerWrong, _) => Event::Answer {
            slot: OptionSlot::First,
        },
        (Action::Deliver, Phase::AwaitingImage { question_id }) => Event::IllustrationReady {
            question_id: *question_id,
            image: placeholder_image(*question_id, "prop"),
        },
        (Action::Deliver, _) => Event::IllustrationReady {
            question_id: 99,
            image: placeholder_image(99, "prop"),
        },
        (Action::Advance, _) => Event::Advance,
        (Action::Reread, _) => Event::RereadStory,
        (Action::Repeat, _) => Event::RepeatQuestion,
        (Action::Restart, _) => Event::Restart,
    }
}

fn check_invariants(session: &Session, script: &Script) -> Result<(), TestCaseError> {
    prop_assert!(session.cursor <= script.len());
    prop_assert!(session.answered_count <= script.total_questions());
    prop_assert_eq!(session.answered_count, session.image_by_question.len());
    for (i, message) in session.transcript.iter().enumerate() {
        prop_assert_eq!(message.sequence_id, i);
    }
    if let Some(target) = session.pending_retry() {
        prop_assert!(target < session.cursor);
        prop_assert!(script.step_at(target).unwrap().is_narration());
    }
    match &session.phase {
        Phase::AwaitingAnswer { question_id, .. }
        | Phase::AwaitingImage { question_id }
        | Phase::OfferingRetry { question_id, .. } => {
            let q = script.step_at(session.cursor).and_then(|s| s.as_question());
            prop_assert_eq!(q.map(|q| q.question_id), Some(*question_id));
        }
        Phase::Narrating => {
            prop_assert!(script.step_at(session.cursor).unwrap().is_narration());
        }
        Phase::Finished => {
            prop_assert!(script
                .step_at(session.cursor)
                .map_or(true, |s| !s.is_narration() && s.as_question().is_none()));
        }
    }
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Invariants hold after every accepted transition; rejected events
    /// leave nothing to check because the caller keeps the old session
    #[test]
    fn prop_invariants_hold(
        script in arb_script(),
        actions in proptest::collection::vec(arb_action(), 0..60),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = start_session(&script, &mut rng);
        check_invariants(&session, &script)?;

        for action in actions {
            let event = to_event(&session, action);
            let restart = matches!(event, Event::Restart);
            if let Ok(result) = transition(&session, &script, event, &mut rng) {
                let next = result.new_session;
                check_invariants(&next, &script)?;
                if !restart {
                    prop_assert!(next.transcript.starts_with(&session.transcript));
                    for (id, image) in &session.image_by_question {
                        prop_assert_eq!(next.image_by_question.get(id), Some(image));
                    }
                }
                session = next;
            }
        }
    }

    /// Advancing through narration moves exactly one step and one message
    #[test]
    fn prop_advance_moves_one_step(script in arb_script(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = start_session(&script, &mut rng);
        while session.phase == Phase::Narrating {
            let next = transition(&session, &script, Event::Advance, &mut rng)
                .unwrap()
                .new_session;
            prop_assert_eq!(next.cursor, session.cursor + 1);
            prop_assert_eq!(next.transcript.len(), session.transcript.len() + 1);
            session = next;
        }
    }

    /// Correct answer plus delivery records one image and one point
    #[test]
    fn prop_correct_answer_records_image(script in arb_script(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = start_session(&script, &mut rng);
        while session.phase == Phase::Narrating {
            session = transition(&session, &script, Event::Advance, &mut rng).unwrap().new_session;
        }
        let Phase::AwaitingAnswer { question_id, order } = session.phase else {
            return Err(TestCaseError::fail("first question not reached"));
        };

        let answer = Event::Answer { slot: slot(order, true) };
        let waiting = transition(&session, &script, answer, &mut rng)
            .unwrap()
            .new_session;
        prop_assert_eq!(waiting.active_generation(), Some(question_id));
        prop_assert_eq!(waiting.answered_count, session.answered_count);

        let done = transition(
            &waiting,
            &script,
            Event::IllustrationReady { question_id, image: placeholder_image(question_id, "p") },
            &mut rng,
        )
        .unwrap()
        .new_session;
        prop_assert_eq!(done.answered_count, session.answered_count + 1);
        prop_assert_eq!(done.image_by_question.len(), session.image_by_question.len() + 1);
        prop_assert!(done.image_by_question.contains_key(&question_id));
        prop_assert_eq!(done.cursor, session.cursor + 1);
        prop_assert_eq!(done.active_generation(), None);
    }

    /// Wrong answer keeps the score and points back to earlier narration;
    /// reread jumps there, repeat stays put
    #[test]
    fn prop_wrong_answer_retry_paths(script in arb_script(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = start_session(&script, &mut rng);
        while session.phase == Phase::Narrating {
            session = transition(&session, &script, Event::Advance, &mut rng).unwrap().new_session;
        }
        let Phase::AwaitingAnswer { order, .. } = session.phase else {
            return Err(TestCaseError::fail("first question not reached"));
        };

        let answer = Event::Answer { slot: slot(order, false) };
        let retry = transition(&session, &script, answer, &mut rng)
            .unwrap()
            .new_session;
        prop_assert_eq!(retry.answered_count, session.answered_count);
        let target = retry.pending_retry().unwrap();
        prop_assert!(target < session.cursor);

        let reread = transition(&retry, &script, Event::RereadStory, &mut rng).unwrap().new_session;
        prop_assert_eq!(reread.cursor, target);
        prop_assert_eq!(reread.pending_retry(), None);

        let repeat = transition(&retry, &script, Event::RepeatQuestion, &mut rng)
            .unwrap()
            .new_session;
        prop_assert_eq!(repeat.cursor, retry.cursor);
        prop_assert_eq!(repeat.pending_retry(), None);
        prop_assert!(
            matches!(repeat.phase, Phase::AwaitingAnswer { .. }),
            "repeat should re-offer the question"
        );
    }
}

// ============================================================================
// Option order
// ============================================================================

#[test]
fn test_option_order_varies_across_presentations() {
    let script = mia_story();
    let mut rng = StdRng::seed_from_u64(42);
    let session = transition(
        &start_session(&script, &mut rng),
        &script,
        Event::Advance,
        &mut rng,
    )
    .unwrap()
    .new_session;

    // Wrong answer, then repeat, many times over; each repeat re-rolls
    let mut first = 0;
    let mut second = 0;
    let mut current = session;
    for _ in 0..200 {
        let Phase::AwaitingAnswer { order, .. } = current.phase else {
            panic!("expected a question");
        };
        match order {
            OptionOrder::CorrectFirst => first += 1,
            OptionOrder::CorrectSecond => second += 1,
        }
        let retry = transition(
            &current,
            &script,
            Event::Answer {
                slot: slot(order, false),
            },
            &mut rng,
        )
        .unwrap()
        .new_session;
        current = transition(&retry, &script, Event::RepeatQuestion, &mut rng)
            .unwrap()
            .new_session;
    }

    assert!(first > 0, "correct option never shown first");
    assert!(second > 0, "correct option never shown second");
}
