//! CoachVoice - Voice-Guided Workout Playback
//!
//! Parses voice-annotated workout documents (YAML front matter plus a
//! Markdown-like body of phases, circuits and exercises) and plays them back
//! as a timed sequence of spoken coaching cues.

pub mod audio;
pub mod config;
pub mod session;
pub mod workouts;

// Re-export commonly used types
pub use audio::{NarrationPlayer, NarrationQueue};
pub use config::AppConfig;
pub use session::PlaybackSession;
pub use workouts::{parse_workout, parse_workout_file, Workout, WorkoutParser, WorkoutSequencer};
