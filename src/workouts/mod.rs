//! Workout module: voice-annotated workout documents and their playback.

pub mod document;
pub mod engine;
pub mod metadata;
pub mod parser;
pub mod types;
pub mod values;
pub mod voice;

pub use document::{split_document, FrontMatterPolicy, SplitDocument};
pub use engine::{
    PlaybackPosition, PlaybackState, SequencerSettings, TimerKind, TimerRequest, WorkoutSequencer,
};
pub use metadata::{decode_metadata, MetadataNotation};
pub use parser::{parse_workout, parse_workout_file, ParserOptions, WorkoutParser};
pub use types::{
    Circuit, DecodeError, Exercise, ExerciseVoice, MetadataValue, Phase, PhaseContent,
    PhaseOutline, PhaseVoice, Reps, TempoBreakdown, TimeRange, Workout, WorkoutMetadata,
    WorkoutParseError,
};
pub use voice::{VoiceTag, DEFAULT_MOTIVATION, DEFAULT_PHASE_END};
