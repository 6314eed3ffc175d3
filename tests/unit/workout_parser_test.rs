//! Unit tests for the workout document parser, run against a complete
//! generated workout document.

use coachvoice::workouts::types::{MetadataValue, Reps, TempoBreakdown, TimeRange};
use coachvoice::workouts::{
    parse_workout, ParserOptions, PhaseContent, WorkoutParseError, WorkoutParser,
};

const SAMPLE_WORKOUT: &str = include_str!("../fixtures/hiit_workout.md");

#[test]
fn test_parse_metadata() {
    let workout = parse_workout(SAMPLE_WORKOUT).expect("Should parse sample workout");

    assert_eq!(workout.title.as_deref(), Some("30-Minute High Intensity Training"));
    assert_eq!(workout.duration, Some(30));

    let outline: Vec<(&str, Option<u32>)> = workout
        .metadata
        .phases
        .iter()
        .map(|p| (p.name.as_str(), p.duration))
        .collect();
    assert_eq!(
        outline,
        vec![
            ("Warm-up", Some(5)),
            ("Main Workout", Some(20)),
            ("Cool Down", Some(5))
        ]
    );

    assert_eq!(
        workout.metadata.extra.get("difficulty").and_then(|v| v.as_str()),
        Some("Intermediate")
    );
    assert_eq!(
        workout.metadata.extra.get("calories").and_then(|v| v.as_u64()),
        Some(300)
    );
}

#[test]
fn test_phase_structure() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();

    let names: Vec<&str> = workout.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Warm-up Phase", "Main Workout Phase", "Cool Down Phase"]);

    assert!(matches!(workout.phases[0].content, PhaseContent::Exercises(_)));
    assert!(matches!(workout.phases[1].content, PhaseContent::Circuits(_)));
    assert!(matches!(workout.phases[2].content, PhaseContent::Exercises(_)));

    assert_eq!(workout.phases[0].exercises().len(), 4);
    assert_eq!(workout.phases[1].circuits().len(), 4);
    assert!(workout.phases[1]
        .circuits()
        .iter()
        .all(|c| c.exercises.len() == 2));
    assert_eq!(workout.phases[2].exercises().len(), 4);
    assert_eq!(workout.exercise_count(), 16);
}

#[test]
fn test_subsections_do_not_create_exercises() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let warmup = &workout.phases[0];

    let names: Vec<&str> = warmup.exercises().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Movement 1: Arm Circles",
            "Movement 2: Hip Rotations",
            "Movement 3: Jumping Jacks",
            "Movement 4: High Knees"
        ]
    );

    // "## Light Cardio" carries "- duration: 2"; it must not leak into Movement 2
    assert_eq!(warmup.exercises()[1].duration, None);
}

#[test]
fn test_phase_metadata() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();

    assert_eq!(workout.phases[0].duration, Some(5));

    let main = &workout.phases[1];
    assert_eq!(main.duration, Some(20));
    assert_eq!(main.circuit_count, Some(4));
    assert_eq!(
        main.extra.get("restBetweenCircuits"),
        Some(&MetadataValue::Integer(60))
    );
}

#[test]
fn test_squats_details() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let circuit = &workout.phases[1].circuits()[0];
    let squats = &circuit.exercises[0];

    assert_eq!(circuit.name, "Circuit 1: Lower Body Focus");
    assert_eq!(circuit.rounds, Some(3));
    assert_eq!(circuit.work_duration, Some(40));
    assert_eq!(circuit.rest_duration, Some(20));

    assert_eq!(squats.name, "Exercise 1: Bodyweight Squats");
    assert_eq!(squats.exercise_type.as_deref(), Some("strength"));
    assert_eq!(squats.sets, Some(3));
    assert_eq!(squats.reps_per_set, Some(Reps::Count(15)));
    assert_eq!(squats.rest_between_sets, Some(20));
    assert_eq!(squats.tempo.as_deref(), Some("2-1-1-0"));
    assert_eq!(
        squats.tempo_breakdown,
        Some(TempoBreakdown {
            eccentric: Some(2),
            bottom_hold: Some(1),
            concentric: Some(1),
            top_hold: Some(0),
        })
    );
    assert_eq!(squats.timing, Some(TimeRange { start: 300, end: 340 }));
    assert_eq!(
        squats.form_cues,
        vec!["feet shoulder-width apart", "chest up", "knees tracking toes"]
    );
}

#[test]
fn test_exercise_voice_instructions() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let squats = &workout.phases[1].circuits()[0].exercises[0];
    let voice = &squats.voice_instructions;

    assert_eq!(
        voice.main.as_deref(),
        Some("Starting with squats. Keep your chest up and back straight.")
    );
    assert_eq!(
        voice.form.as_deref(),
        Some("Drive through your heels as you push up.")
    );
    let pool = voice.motivation.as_ref().unwrap();
    assert_eq!(pool.len(), 5);
    assert_eq!(pool[0], "These legs were made for squatting! You've got this!");
    assert_eq!(pool[4], "Your form is fantastic! Keep that energy high!");
}

#[test]
fn test_count_instruction() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let arm_circles = &workout.phases[0].exercises()[0];

    assert_eq!(
        arm_circles.voice_instructions.count.as_deref(),
        Some("Forward... 2... 3... 4... 5... 6... 7... 8... 9... 10... Now backward...")
    );
    assert_eq!(
        arm_circles.extra.get("side"),
        Some(&MetadataValue::Text("each_direction".to_string()))
    );
    assert_eq!(arm_circles.timing, Some(TimeRange { start: 0, end: 30 }));
}

#[test]
fn test_continuous_reps_and_durations() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();

    let high_knees = &workout.phases[0].exercises()[3];
    assert_eq!(high_knees.reps, Some(Reps::Continuous));
    assert_eq!(high_knees.timed_duration(), Some(30));

    let climbers = &workout.phases[1].circuits()[1].exercises[1];
    assert_eq!(climbers.duration_per_set, Some(30));
    assert_eq!(climbers.rest_between_sets, Some(10));
    assert!(climbers.tempo_breakdown.is_none());
    assert!(climbers.form_cues.is_empty());
}

#[test]
fn test_phase_voice_instructions() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();

    assert_eq!(
        workout.phases[0].voice_instructions.start.as_deref(),
        Some("Welcome to your 30-minute high-intensity workout! Let's start with some dynamic stretches to warm up your muscles.")
    );
    assert_eq!(
        workout.phases[1].voice_instructions.start.as_deref(),
        Some("Now for the main workout. We'll do four circuits, three rounds each. First circuit focuses on lower body.")
    );

    let cool_down = &workout.phases[2];
    assert_eq!(
        cool_down.voice_instructions.start.as_deref(),
        Some("Excellent work! Let's cool down with some stretches.")
    );
    assert_eq!(
        cool_down.voice_instructions.end.as_deref(),
        Some("You absolutely crushed it today! This workout was intense, and you showed up with everything you had!")
    );

    // The phase-level end must not also become the last stretch's end
    let last = cool_down.exercises().last().unwrap();
    assert_eq!(last.name, "Stretch 4: Final Relaxation");
    assert!(last.voice_instructions.end.is_none());
}

#[test]
fn test_circuit_voice_start() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let circuits = workout.phases[1].circuits();

    assert_eq!(
        circuits[1].voice_start.as_deref(),
        Some("Second circuit! Upper body focus - let's build that strength!")
    );
    assert_eq!(
        circuits[3].voice_start.as_deref(),
        Some("Final circuit! Give it everything you've got!")
    );
    assert_eq!(circuits[1].exercises[0].name, "Exercise 3: Push-Ups");
}

#[test]
fn test_parse_is_deterministic() {
    let first = parse_workout(SAMPLE_WORKOUT).unwrap();
    let second = parse_workout(SAMPLE_WORKOUT).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_front_matter_is_fatal() {
    let body = SAMPLE_WORKOUT
        .splitn(3, "---")
        .nth(2)
        .expect("Sample has a body after the front matter");

    let result = parse_workout(body);
    assert!(matches!(result, Err(WorkoutParseError::MissingFrontMatter)));
}

#[test]
fn test_compatibility_mode_accepts_same_document() {
    let strict = parse_workout(SAMPLE_WORKOUT).unwrap();
    let compat = WorkoutParser::new(ParserOptions::compatibility())
        .parse(SAMPLE_WORKOUT)
        .unwrap();

    assert_eq!(compat.title, strict.title);
    assert_eq!(compat.duration, strict.duration);
    assert_eq!(compat.phases, strict.phases);
}

#[test]
fn test_json_uses_camel_case() {
    let workout = parse_workout(SAMPLE_WORKOUT).unwrap();
    let json = serde_json::to_value(&workout.phases[1].circuits()[0].exercises[0]).unwrap();

    assert_eq!(json["repsPerSet"], 15);
    assert_eq!(json["tempoBreakdown"]["bottomHold"], 1);
    assert_eq!(json["timing"]["start"], 300);
}
