//! Workout document types.
//!
//! The parsed tree is `Workout -> Phase -> (Circuit ->) Exercise`. Insertion
//! order of every sequence is playback order. Fields that are absent in the
//! source document stay `None`; the only defaulted field is
//! [`Exercise::form_cues`], which is empty when no `form_cues` block exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A coerced scalar from a `key: value` metadata line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Unsigned digit run, e.g. `15`
    Integer(i64),
    /// Decimal, e.g. `0.75`
    Float(f64),
    /// Anything else, quotes stripped (includes the `continuous` keyword)
    Text(String),
}

impl MetadataValue {
    /// Integer view of the value; quoted digit runs are accepted too.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(n) => Some(*n),
            MetadataValue::Text(s) => s.trim().parse().ok(),
            MetadataValue::Float(_) => None,
        }
    }

    /// Integer view narrowed to `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_integer().and_then(|n| u32::try_from(n).ok())
    }

    /// Text view of the value (only for `Text`).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Integer(n) => write!(f, "{}", n),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Repetition target of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reps {
    /// Fixed repetition count
    Count(u32),
    /// The literal `continuous` (work for the whole duration)
    Continuous,
}

impl std::fmt::Display for Reps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reps::Count(n) => write!(f, "{}", n),
            Reps::Continuous => write!(f, "continuous"),
        }
    }
}

impl Serialize for Reps {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reps::Count(n) => serializer.serialize_u32(*n),
            Reps::Continuous => serializer.serialize_str("continuous"),
        }
    }
}

impl<'de> Deserialize<'de> for Reps {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Reps::Count(n)),
            Raw::Text(s) if s == "continuous" => Ok(Reps::Continuous),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a count or \"continuous\", got {:?}",
                s
            ))),
        }
    }
}

/// A `start - end` window in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    /// Window length in seconds.
    pub fn length(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// Four-part repetition tempo (`E-B-C-T`) in seconds.
///
/// A component is `None` when the tempo string has fewer than four parts or
/// the part is not an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoBreakdown {
    /// Lowering phase
    pub eccentric: Option<u32>,
    /// Pause at the bottom
    pub bottom_hold: Option<u32>,
    /// Rising phase
    pub concentric: Option<u32>,
    /// Pause at the top
    pub top_hold: Option<u32>,
}

impl TempoBreakdown {
    /// True when all four components decoded.
    pub fn is_complete(&self) -> bool {
        self.eccentric.is_some()
            && self.bottom_hold.is_some()
            && self.concentric.is_some()
            && self.top_hold.is_some()
    }

    /// Seconds per repetition, when every component is known.
    pub fn seconds_per_rep(&self) -> Option<u32> {
        Some(self.eccentric? + self.bottom_hold? + self.concentric? + self.top_hold?)
    }
}

/// Narration attached to an exercise.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseVoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<String>,
    /// Pool of messages; one is drawn at random per visit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl ExerciseVoice {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.main.is_none()
            && self.form.is_none()
            && self.count.is_none()
            && self.motivation.is_none()
            && self.end.is_none()
    }
}

/// Narration attached to a phase.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseVoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Leaf unit of work.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Exercise {
    /// Full heading text, e.g. "Exercise 3: Push-Ups"
    pub name: String,
    /// Free-form tag such as "strength" or "dynamic_stretch"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<Reps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps_per_set: Option<Reps>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_per_set: Option<u32>,
    /// Raw `E-B-C-T` string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo_breakdown: Option<TempoBreakdown>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_between_sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimeRange>,
    pub form_cues: Vec<String>,
    #[serde(skip_serializing_if = "ExerciseVoice::is_empty")]
    pub voice_instructions: ExerciseVoice,
    /// Remaining declared keys, camelCased
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, MetadataValue>,
}

impl Exercise {
    /// Duration that drives the auto-advance timer, in seconds.
    pub fn timed_duration(&self) -> Option<u32> {
        self.duration.or(self.duration_per_set).filter(|d| *d > 0)
    }

    /// Repetition target, whichever key declared it.
    pub fn rep_target(&self) -> Option<Reps> {
        self.reps_per_set.or(self.reps)
    }
}

/// Repeatable block inside a main-workout phase.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Circuit {
    /// Full heading text, e.g. "Circuit 1: Lower Body Focus"
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_duration: Option<u32>,
    /// `VOICE_START` narration from the circuit preamble
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_start: Option<String>,
    pub exercises: Vec<Exercise>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, MetadataValue>,
}

/// Primary content of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseContent {
    /// Plain phase: exercises directly
    Exercises(Vec<Exercise>),
    /// Main-workout phase: circuits of exercises
    Circuits(Vec<Circuit>),
}

impl Default for PhaseContent {
    fn default() -> Self {
        PhaseContent::Exercises(Vec::new())
    }
}

/// Named top-level segment of a workout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Phase {
    pub name: String,
    /// Minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Declared `circuits:` count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_count: Option<u32>,
    pub voice_instructions: PhaseVoice,
    pub content: PhaseContent,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, MetadataValue>,
}

impl Phase {
    /// Case-insensitive "main workout" match on a phase name.
    pub fn is_main_workout_name(name: &str) -> bool {
        name.to_lowercase().contains("main workout")
    }

    pub fn is_main_workout(&self) -> bool {
        matches!(self.content, PhaseContent::Circuits(_))
    }

    pub fn circuits(&self) -> &[Circuit] {
        match &self.content {
            PhaseContent::Circuits(circuits) => circuits,
            PhaseContent::Exercises(_) => &[],
        }
    }

    /// Exercises of a plain phase (empty for circuit phases).
    pub fn exercises(&self) -> &[Exercise] {
        match &self.content {
            PhaseContent::Exercises(exercises) => exercises,
            PhaseContent::Circuits(_) => &[],
        }
    }

    /// Number of structural containers: circuits, or 1 for a plain phase.
    pub fn container_count(&self) -> usize {
        match &self.content {
            PhaseContent::Exercises(_) => 1,
            PhaseContent::Circuits(circuits) => circuits.len(),
        }
    }

    /// Exercises of the container at `circuit_index`.
    pub fn container(&self, circuit_index: usize) -> &[Exercise] {
        match &self.content {
            PhaseContent::Exercises(exercises) if circuit_index == 0 => exercises,
            PhaseContent::Exercises(_) => &[],
            PhaseContent::Circuits(circuits) => circuits
                .get(circuit_index)
                .map(|c| c.exercises.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Total exercises across all containers.
    pub fn exercise_count(&self) -> usize {
        match &self.content {
            PhaseContent::Exercises(exercises) => exercises.len(),
            PhaseContent::Circuits(circuits) => circuits.iter().map(|c| c.exercises.len()).sum(),
        }
    }

    /// All exercises in playback order.
    pub fn all_exercises(&self) -> impl Iterator<Item = &Exercise> + '_ {
        let (plain, circuits): (&[Exercise], &[Circuit]) = match &self.content {
            PhaseContent::Exercises(exercises) => (exercises, &[]),
            PhaseContent::Circuits(circuits) => (&[], circuits),
        };
        plain
            .iter()
            .chain(circuits.iter().flat_map(|c| c.exercises.iter()))
    }
}

/// Phase outline as declared in the front matter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseOutline {
    pub name: String,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// Decoded front matter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub phases: Vec<PhaseOutline>,
    /// Free-form keys (difficulty, calories, equipment, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl WorkoutMetadata {
    /// Declared duration of the outline phase matching `phase_name`.
    ///
    /// A heading such as "Warm-up Phase" matches the outline name "Warm-up".
    pub fn phase_duration(&self, phase_name: &str) -> Option<u32> {
        let wanted = phase_name.trim().to_lowercase();
        let stripped = wanted
            .strip_suffix("phase")
            .map(str::trim_end)
            .unwrap_or(&wanted);
        self.phases
            .iter()
            .find(|p| {
                let name = p.name.trim().to_lowercase();
                name == wanted || name == stripped
            })
            .and_then(|p| p.duration)
    }
}

/// A parsed workout document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Workout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub metadata: WorkoutMetadata,
    pub phases: Vec<Phase>,
}

impl Workout {
    /// Total exercises across all phases and circuits.
    pub fn exercise_count(&self) -> usize {
        self.phases.iter().map(Phase::exercise_count).sum()
    }

    /// All exercises in playback order.
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> + '_ {
        self.phases.iter().flat_map(Phase::all_exercises)
    }

    /// Display title, falling back to a placeholder.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Workout")
    }
}

/// Errors that abort a parse call.
#[derive(Debug, Error)]
pub enum WorkoutParseError {
    /// Document does not open with a `---` front-matter block
    #[error("Invalid workout document format: missing front-matter delimiters")]
    MissingFrontMatter,

    /// IO error reading a document file
    #[error("IO error: {0}")]
    IoError(String),
}

/// Recoverable decode failures.
///
/// These never escape a parse call; the builder logs them and substitutes a
/// default for the affected field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Front-matter structured data could not be decoded
    #[error("Invalid front matter: {0}")]
    Metadata(String),

    /// Bracketed voice array could not be decoded
    #[error("Invalid {tag} array: {reason}")]
    VoiceArray { tag: String, reason: String },

    /// Tempo string is not four dash-separated integers
    #[error("Invalid tempo notation: {0}")]
    Tempo(String),

    /// Time range is not `M:SS - M:SS`
    #[error("Invalid time range: {0}")]
    TimeRange(String),
}
