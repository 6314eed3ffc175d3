//! Unit tests for the workout sequencer driven by a parsed document.

use coachvoice::audio::{NarrationCategory, NarrationQueue};
use coachvoice::workouts::{parse_workout, SequencerSettings, TimerKind, WorkoutSequencer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

const SAMPLE_WORKOUT: &str = include_str!("../fixtures/hiit_workout.md");

fn create_sequencer(seed: u64) -> WorkoutSequencer {
    let workout = parse_workout(SAMPLE_WORKOUT).expect("Should parse sample workout");
    let mut sequencer = WorkoutSequencer::new(
        NarrationQueue::new(),
        SequencerSettings::default(),
        StdRng::seed_from_u64(seed),
    );
    sequencer.load(Arc::new(workout));
    sequencer
}

fn current_name(sequencer: &WorkoutSequencer) -> String {
    sequencer
        .current_exercise()
        .map(|e| e.name.clone())
        .unwrap_or_default()
}

#[test]
fn test_start_queues_instruction_set_in_order() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();

    let categories: Vec<NarrationCategory> = sequencer
        .queue()
        .pending()
        .into_iter()
        .map(|item| item.category)
        .collect();
    assert_eq!(
        categories,
        vec![
            NarrationCategory::PhaseStart,
            NarrationCategory::Main,
            NarrationCategory::Count
        ]
    );
    assert_eq!(current_name(&sequencer), "Movement 1: Arm Circles");

    // Arm circles are rep-based
    assert!(sequencer.take_timer_request().is_none());
}

#[test]
fn test_full_instruction_set_queue_order() {
    let doc = r#"---
title: "Single Exercise"
---
# Warm-up
### Movement 1: Lunges
- reps: 10
**[VOICE_MOTIVATION]**: ["Strong legs!"]
**[VOICE_COUNT]**: "One, two, three"
**[VOICE_FORM]**: "Knee over ankle."
**[VOICE]**: "Alternating lunges."
**[VOICE_START]**: "Get ready to lunge."
"#;
    let mut sequencer = WorkoutSequencer::new(
        NarrationQueue::new(),
        SequencerSettings::default(),
        StdRng::seed_from_u64(5),
    );
    sequencer.load(Arc::new(parse_workout(doc).unwrap()));
    sequencer.start();

    let items: Vec<(NarrationCategory, String)> = sequencer
        .queue()
        .pending()
        .into_iter()
        .map(|item| (item.category, item.text))
        .collect();
    assert_eq!(
        items,
        vec![
            (NarrationCategory::Start, "Get ready to lunge.".to_string()),
            (NarrationCategory::Main, "Alternating lunges.".to_string()),
            (NarrationCategory::Form, "Knee over ankle.".to_string()),
            (NarrationCategory::Count, "One, two, three".to_string()),
            (NarrationCategory::Motivation, "Strong legs!".to_string()),
        ]
    );
}

#[test]
fn test_six_advances_reach_second_circuit() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();

    for _ in 0..6 {
        sequencer.advance_exercise();
    }

    let state = sequencer.state();
    assert_eq!(state.current_phase_index, 1);
    assert_eq!(state.current_circuit_index, 1);
    assert_eq!(state.current_exercise_index, 0);
    assert_eq!(current_name(&sequencer), "Exercise 3: Push-Ups");
}

#[test]
fn test_entering_circuit_announces_it() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();
    for _ in 0..5 {
        sequencer.advance_exercise();
    }
    sequencer.queue().clear();

    sequencer.advance_exercise();
    let items = sequencer.queue().pending();

    assert_eq!(items[0].text, "Starting circuit 2");
    assert_eq!(items[0].category, NarrationCategory::Circuit);
    assert_eq!(
        items[1].text,
        "Second circuit! Upper body focus - let's build that strength!"
    );
    assert_eq!(
        items[2].text,
        "Push-up time! Modified version is perfectly fine."
    );
    assert_eq!(items[3].category, NarrationCategory::Form);
    assert_eq!(items[4].category, NarrationCategory::Motivation);
    assert_eq!(items.len(), 5);
}

#[test]
fn test_advance_within_container_changes_only_exercise_index() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();
    for _ in 0..4 {
        sequencer.advance_exercise();
    }
    let before = sequencer.state();
    assert_eq!(current_name(&sequencer), "Exercise 1: Bodyweight Squats");

    sequencer.advance_exercise();
    let after = sequencer.state();
    assert_eq!(after.current_phase_index, before.current_phase_index);
    assert_eq!(after.current_circuit_index, before.current_circuit_index);
    assert_eq!(after.current_exercise_index, before.current_exercise_index + 1);
}

#[test]
fn test_terminal_property() {
    let mut sequencer = create_sequencer(1);
    let total = sequencer.workout().unwrap().exercise_count();
    sequencer.start();

    for _ in 0..total - 1 {
        sequencer.advance_exercise();
        assert!(sequencer.is_playing());
    }
    assert_eq!(current_name(&sequencer), "Stretch 4: Final Relaxation");
    sequencer.queue().clear();

    sequencer.advance_exercise();
    assert!(!sequencer.is_playing());

    let items = sequencer.queue().pending();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category, NarrationCategory::WorkoutEnd);
    assert!(items[0].text.starts_with("You absolutely crushed it today!"));
}

#[test]
fn test_motivation_drawn_from_pool() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let squats = &workout.phases[1].circuits()[0].exercises[0];
    let pool = squats.voice_instructions.motivation.clone().unwrap();

    for seed in 0..20 {
        let mut sequencer = create_sequencer(seed);
        sequencer.start();
        sequencer.advance_phase();

        let motivation: Vec<String> = sequencer
            .queue()
            .pending()
            .into_iter()
            .filter(|item| item.category == NarrationCategory::Motivation)
            .map(|item| item.text)
            .collect();
        assert_eq!(motivation.len(), 1);
        assert!(pool.contains(&motivation[0]));
    }
}

#[test]
fn test_seeded_sessions_are_reproducible() {
    let run = |seed| {
        let mut sequencer = create_sequencer(seed);
        sequencer.start();
        for _ in 0..15 {
            sequencer.advance_exercise();
        }
        sequencer
            .queue()
            .pending()
            .into_iter()
            .map(|item| item.text)
            .collect::<Vec<_>>()
    };

    assert_eq!(run(42), run(42));
}

#[test]
fn test_advance_phase_is_user_driven_only() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();
    sequencer.advance_phase();
    sequencer.advance_phase();

    assert_eq!(sequencer.state().current_phase_index, 2);
    assert_eq!(current_name(&sequencer), "Stretch 1: Quad Stretch");
    // Stretch 1 is timed, but a phase skip never arms the completion timer
    assert!(sequencer.armed_timer().is_none());

    sequencer.advance_phase();
    assert_eq!(sequencer.state().current_phase_index, 2);
}

#[test]
fn test_timed_exercise_arms_completion_timer() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();
    for _ in 0..3 {
        sequencer.advance_exercise();
    }
    assert_eq!(current_name(&sequencer), "Movement 4: High Knees");

    let timer = sequencer.take_timer_request().unwrap();
    assert_eq!(timer.kind, TimerKind::ExerciseComplete);
    assert_eq!(timer.delay, Duration::from_secs(31));

    assert!(sequencer.fire_timer(timer.token));
    let advance = sequencer.take_timer_request().unwrap();
    assert_eq!(advance.kind, TimerKind::AdvanceAfterEnd);

    sequencer.stop();
    assert!(!sequencer.fire_timer(advance.token));
    assert!(!sequencer.is_playing());
}

#[test]
fn test_stop_twice_matches_stop_once() {
    let mut once = create_sequencer(1);
    once.start();
    once.stop();

    let mut twice = create_sequencer(1);
    twice.start();
    twice.stop();
    twice.stop();

    assert_eq!(once.state(), twice.state());
    assert_eq!(once.position(), twice.position());
    assert_eq!(once.queue().is_idle(), twice.queue().is_idle());
    assert_eq!(once.queue().generation(), twice.queue().generation());
}

#[test]
fn test_position_reports_names() {
    let mut sequencer = create_sequencer(1);
    sequencer.start();
    for _ in 0..6 {
        sequencer.advance_exercise();
    }

    let position = sequencer.position();
    assert_eq!(position.total_phases, 3);
    assert!((position.progress - 1.0 / 3.0).abs() < f32::EPSILON);
    assert_eq!(position.phase_name.as_deref(), Some("Main Workout Phase"));
    assert_eq!(
        position.circuit_name.as_deref(),
        Some("Circuit 2: Upper Body Power")
    );
    assert_eq!(position.exercise_name.as_deref(), Some("Exercise 3: Push-Ups"));
}
