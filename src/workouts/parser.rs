//! Workout document parser.
//!
//! Turns a document into a [`Workout`] tree:
//!
//! 1. split front matter from body ([`split_document`])
//! 2. decode the front matter ([`decode_metadata`])
//! 3. split the body into phases at `# ` headings
//! 4. split each phase into circuits (`## Circuit N:`, main-workout phases
//!    only) and exercises (`### `)
//! 5. attach `- key: value` metadata and voice instructions to each block
//!
//! Malformed values never abort the parse; they are logged and the affected
//! field is left unset or defaulted.

use std::ops::Range;
use std::path::Path;

use crate::workouts::document::{split_document, FrontMatterPolicy};
use crate::workouts::metadata::{decode_metadata, MetadataNotation};
use crate::workouts::types::{
    Circuit, Exercise, ExerciseVoice, MetadataValue, Phase, PhaseContent, Reps, Workout,
    WorkoutMetadata, WorkoutParseError,
};
use crate::workouts::values::{
    camel_case, coerce_value, leading_integer, parse_tempo, parse_time_range, split_key_value,
    unquote,
};
use crate::workouts::voice::{
    scan_voice, VoiceEntry, VoiceTag, DEFAULT_MOTIVATION, DEFAULT_PHASE_END,
};

const PHASE_MARKER: &str = "# ";
const CIRCUIT_MARKER: &str = "## ";
const EXERCISE_MARKER: &str = "### ";

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserOptions {
    pub front_matter: FrontMatterPolicy,
    pub metadata: MetadataNotation,
}

impl ParserOptions {
    /// Permissive front matter with line-scanned metadata.
    pub fn compatibility() -> Self {
        Self {
            front_matter: FrontMatterPolicy::Permissive,
            metadata: MetadataNotation::LineScan,
        }
    }
}

/// Stateless workout parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkoutParser {
    options: ParserOptions,
}

impl WorkoutParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parse document text.
    pub fn parse(&self, text: &str) -> Result<Workout, WorkoutParseError> {
        let split = split_document(text, self.options.front_matter)?;
        let metadata = decode_metadata(&split.front_matter, self.options.metadata);

        let lines: Vec<&str> = split.body.lines().collect();
        let phases = build_phases(&lines, &metadata);

        let workout = Workout {
            title: metadata.title.clone(),
            duration: metadata.duration,
            metadata,
            phases,
        };

        tracing::info!(
            "Parsed workout '{}': {} phases, {} exercises",
            workout.display_title(),
            workout.phases.len(),
            workout.exercise_count()
        );

        Ok(workout)
    }

    /// Read and parse a UTF-8 document file.
    pub fn parse_file(&self, path: &Path) -> Result<Workout, WorkoutParseError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| WorkoutParseError::IoError(format!("{}: {}", path.display(), e)))?;
        self.parse(&text)
    }
}

/// Parse document text with the default (strict) options.
pub fn parse_workout(text: &str) -> Result<Workout, WorkoutParseError> {
    WorkoutParser::default().parse(text)
}

/// Read and parse a document file with the default options.
pub fn parse_workout_file(path: impl AsRef<Path>) -> Result<Workout, WorkoutParseError> {
    WorkoutParser::default().parse_file(path.as_ref())
}

fn build_phases(lines: &[&str], metadata: &WorkoutMetadata) -> Vec<Phase> {
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with(PHASE_MARKER))
        .map(|(idx, _)| idx)
        .collect();

    let leading = starts.first().copied().unwrap_or(lines.len());
    if lines[..leading].iter().any(|l| !l.trim().is_empty()) {
        tracing::debug!("Ignoring {} lines before the first phase heading", leading);
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(lines.len());
            let name = lines[start][PHASE_MARKER.len()..].trim();
            build_phase(name, &lines[start + 1..end], metadata)
        })
        .collect()
}

fn build_phase(name: &str, lines: &[&str], metadata: &WorkoutMetadata) -> Phase {
    tracing::debug!("Found phase '{}'", name);

    let voice = scan_voice(lines);
    let mut voice_lines = vec![false; lines.len()];
    for entry in &voice {
        for covered in voice_lines.iter_mut().skip(entry.line).take(entry.span) {
            *covered = true;
        }
    }

    let mut phase = Phase {
        name: name.to_string(),
        ..Default::default()
    };
    read_phase_metadata(&mut phase, lines, &voice_lines);
    if phase.duration.is_none() {
        phase.duration = metadata.phase_duration(name);
    }

    let spans = exercise_spans(lines);
    let mut exercises: Vec<Exercise> = spans
        .iter()
        .map(|span| build_exercise(lines[span.start], &lines[span.start + 1..span.end]))
        .collect();

    let first_exercise = spans.first().map(|s| s.start).unwrap_or(lines.len());
    let mut unowned = Vec::new();

    for entry in voice {
        let owner = spans.iter().position(|s| s.contains(&entry.line));
        match (owner, entry.tag) {
            (Some(_), VoiceTag::End) if entry.is_bracketed() => {
                phase.voice_instructions.end = phase_end_text(&entry);
            }
            (Some(idx), _) => apply_exercise_voice(&mut exercises[idx].voice_instructions, entry),
            (None, VoiceTag::Start) => {
                if entry.line < first_exercise && phase.voice_instructions.start.is_none() {
                    phase.voice_instructions.start = text_value(&entry);
                }
                unowned.push(entry);
            }
            (None, VoiceTag::End) => {
                phase.voice_instructions.end = phase_end_text(&entry);
            }
            (None, tag) => {
                tracing::debug!(
                    "Ignoring {} outside an exercise in phase '{}'",
                    tag.marker(),
                    name
                );
            }
        }
    }

    phase.content = if Phase::is_main_workout_name(name) {
        PhaseContent::Circuits(build_circuits(name, lines, &spans, exercises, &unowned))
    } else {
        PhaseContent::Exercises(exercises)
    };

    phase
}

/// Flat `key: value` lines before the first heading of a phase.
fn read_phase_metadata(phase: &mut Phase, lines: &[&str], voice_lines: &[bool]) {
    for (idx, line) in lines.iter().enumerate() {
        if line.starts_with('#') {
            break;
        }
        let line = line.trim();
        if voice_lines[idx] || line.starts_with("- ") || line.starts_with("**[") {
            continue;
        }
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        if !is_identifier(key) {
            continue;
        }

        match normalize_key(key).as_str() {
            "duration" => phase.duration = leading_integer(unquote(value)),
            "circuits" => phase.circuit_count = leading_integer(unquote(value)),
            _ => {
                phase.extra.insert(camel_case(key), coerce_value(value));
            }
        }
    }
}

/// Line ranges of `### ` blocks; each runs to the next heading of any level.
fn exercise_spans(lines: &[&str]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if !line.starts_with(EXERCISE_MARKER) {
            continue;
        }
        let end = next_heading(lines, idx + 1);
        spans.push(idx..end);
    }
    spans
}

fn next_heading(lines: &[&str], from: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| line.starts_with('#'))
        .map(|(idx, _)| idx)
        .unwrap_or(lines.len())
}

/// `## Circuit <N>:` heading text, if the line is one.
fn circuit_heading(line: &str) -> Option<&str> {
    let heading = line.strip_prefix(CIRCUIT_MARKER)?.trim();
    let keyword = heading.get(..7)?;
    if !keyword.eq_ignore_ascii_case("circuit") {
        return None;
    }

    let rest = heading[7..].trim_start();
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let after = rest[digits..].trim_start();
    if after.is_empty() || after.starts_with(':') {
        Some(heading)
    } else {
        None
    }
}

fn build_circuits(
    phase_name: &str,
    lines: &[&str],
    spans: &[Range<usize>],
    exercises: Vec<Exercise>,
    unowned: &[VoiceEntry],
) -> Vec<Circuit> {
    let mut starts = Vec::new();
    let mut preambles = Vec::new();
    let mut circuits = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if let Some(heading) = circuit_heading(line) {
            tracing::debug!("Found circuit '{}'", heading);
            let preamble = idx + 1..next_heading(lines, idx + 1);
            circuits.push(build_circuit(heading, &lines[preamble.clone()]));
            starts.push(idx);
            preambles.push(preamble);
        }
    }

    for entry in unowned.iter().filter(|e| e.tag == VoiceTag::Start) {
        let found = preambles.iter().position(|p| p.contains(&entry.line));
        if let Some(idx) = found {
            if circuits[idx].voice_start.is_none() {
                circuits[idx].voice_start = text_value(entry);
            }
        }
    }

    for (span, exercise) in spans.iter().zip(exercises) {
        match starts.iter().rposition(|&start| start < span.start) {
            Some(idx) => circuits[idx].exercises.push(exercise),
            None => tracing::warn!(
                "Exercise '{}' in '{}' is not inside a circuit; skipped",
                exercise.name,
                phase_name
            ),
        }
    }

    circuits
}

fn build_circuit(heading: &str, preamble: &[&str]) -> Circuit {
    let mut circuit = Circuit {
        name: heading.to_string(),
        ..Default::default()
    };

    for line in preamble {
        let Some((key, raw)) = line.strip_prefix("- ").and_then(split_key_value) else {
            continue;
        };
        let value = coerce_value(raw);
        let assigned = match normalize_key(key).as_str() {
            "rounds" => assign(&mut circuit.rounds, value.as_u32()),
            "work_duration" => assign(&mut circuit.work_duration, seconds(&value)),
            "rest_duration" => assign(&mut circuit.rest_duration, seconds(&value)),
            _ => {
                circuit.extra.insert(camel_case(key), value);
                continue;
            }
        };
        if !assigned {
            tracing::warn!(
                "Circuit '{}': unexpected value '{}' for {}; kept as metadata",
                circuit.name,
                raw,
                key
            );
            circuit.extra.insert(camel_case(key), value);
        }
    }

    circuit
}

fn build_exercise(heading: &str, body: &[&str]) -> Exercise {
    let name = heading[EXERCISE_MARKER.len()..].trim();
    tracing::debug!("Found exercise '{}'", name);

    let mut exercise = Exercise {
        name: name.to_string(),
        ..Default::default()
    };
    let mut in_form_cues = false;

    for line in body {
        if in_form_cues {
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with(char::is_whitespace) {
                if let Some(cue) = line.trim().strip_prefix("- ") {
                    exercise.form_cues.push(unquote(cue).to_string());
                }
                continue;
            }
            in_form_cues = false;
        }

        let Some(item) = line.strip_prefix("- ") else {
            continue;
        };
        let item = item.trim();

        if item.starts_with("form_cues:") {
            in_form_cues = true;
            continue;
        }

        if let Some((key, value)) = split_key_value(item) {
            apply_exercise_field(&mut exercise, key, value);
        }
    }

    exercise
}

fn apply_exercise_field(exercise: &mut Exercise, key: &str, raw: &str) {
    let value = coerce_value(raw);

    let assigned = match normalize_key(key).as_str() {
        "exercise_type" => {
            exercise.exercise_type = Some(value.to_string());
            true
        }
        "sets" => assign(&mut exercise.sets, value.as_u32()),
        "reps" => assign(&mut exercise.reps, reps(&value)),
        "reps_per_set" => assign(&mut exercise.reps_per_set, reps(&value)),
        "duration" => assign(&mut exercise.duration, seconds(&value)),
        "duration_per_set" => assign(&mut exercise.duration_per_set, seconds(&value)),
        "rest_between_sets" => assign(&mut exercise.rest_between_sets, seconds(&value)),
        "tempo" => {
            let tempo = value.to_string();
            let (breakdown, error) = parse_tempo(&tempo);
            if let Some(e) = error {
                tracing::warn!("{} in '{}'; breakdown left incomplete", e, exercise.name);
            }
            exercise.tempo = Some(tempo);
            exercise.tempo_breakdown = Some(breakdown);
            true
        }
        "timing" => match parse_time_range(&value.to_string()) {
            Ok(range) => {
                exercise.timing = Some(range);
                true
            }
            Err(e) => {
                tracing::warn!("{} in '{}'", e, exercise.name);
                false
            }
        },
        _ => {
            exercise.extra.insert(camel_case(key), value);
            return;
        }
    };

    if !assigned {
        tracing::warn!(
            "Exercise '{}': unexpected value '{}' for {}; kept as metadata",
            exercise.name,
            raw,
            key
        );
        exercise.extra.insert(camel_case(key), value);
    }
}

fn apply_exercise_voice(voice: &mut ExerciseVoice, entry: VoiceEntry) {
    if entry.tag == VoiceTag::Motivation {
        voice.motivation = Some(motivation_pool(entry));
        return;
    }

    let text = text_value(&entry);
    let slot = match entry.tag {
        VoiceTag::Main => &mut voice.main,
        VoiceTag::Start => &mut voice.start,
        VoiceTag::Form => &mut voice.form,
        VoiceTag::Count => &mut voice.count,
        VoiceTag::End => &mut voice.end,
        VoiceTag::Motivation => return,
    };
    if text.is_some() {
        *slot = text;
    }
}

fn motivation_pool(entry: VoiceEntry) -> Vec<String> {
    match entry.value {
        Ok(value) => {
            let pool = value.into_list();
            if pool.is_empty() {
                tracing::warn!("Empty VOICE_MOTIVATION array; using default message");
                vec![DEFAULT_MOTIVATION.to_string()]
            } else {
                pool
            }
        }
        Err(e) => {
            tracing::warn!("{}; using default message", e);
            vec![DEFAULT_MOTIVATION.to_string()]
        }
    }
}

/// Scalar text of an entry; arrays yield their first item.
fn text_value(entry: &VoiceEntry) -> Option<String> {
    match &entry.value {
        Ok(value) => value.first().map(str::to_string),
        Err(e) => {
            tracing::warn!("{}; {} ignored", e, entry.tag.marker());
            None
        }
    }
}

fn phase_end_text(entry: &VoiceEntry) -> Option<String> {
    match &entry.value {
        Ok(value) => value.first().map(str::to_string),
        Err(e) => {
            tracing::warn!("{}; using default phase end", e);
            Some(DEFAULT_PHASE_END.to_string())
        }
    }
}

fn assign<T>(slot: &mut Option<T>, decoded: Option<T>) -> bool {
    match decoded {
        Some(value) => {
            *slot = Some(value);
            true
        }
        None => false,
    }
}

fn reps(value: &MetadataValue) -> Option<Reps> {
    match value {
        MetadataValue::Text(text) if text.trim().eq_ignore_ascii_case("continuous") => {
            Some(Reps::Continuous)
        }
        _ => value.as_u32().map(Reps::Count),
    }
}

/// Whole seconds; a unit suffix such as `30 seconds` is tolerated.
fn seconds(value: &MetadataValue) -> Option<u32> {
    match value {
        MetadataValue::Text(text) => leading_integer(text),
        _ => value.as_u32(),
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['-', ' '], "_")
}

fn is_identifier(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_alphabetic())
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
}
