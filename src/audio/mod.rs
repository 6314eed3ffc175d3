//! Narration Audio Module
//!
//! Queues narration produced by the workout sequencer and plays it one item
//! at a time through injected speech-synthesis and audio-output
//! capabilities.

pub mod cues;
pub mod engine;
pub mod queue;
pub mod tts;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use cues::{circuit_announcement, pick_motivation, CueTemplate};
pub use engine::NarrationPlayer;
pub use queue::{NarrationQueue, NarrationTicket};
pub use tts::{
    AudioClip, AudioOutput, ConsoleSynthesizer, SimulatedOutput, SpeechSynthesizer,
    VoiceCredentials,
};

/// Errors that can occur during narration playback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Speech synthesis credentials are not configured")]
    MissingCredentials,
}

/// Moment in the workout a narration item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationCategory {
    /// Phase introduction
    PhaseStart,
    /// "Starting circuit N" and the circuit introduction
    Circuit,
    /// Exercise start instruction
    Start,
    /// Main exercise instruction
    Main,
    /// Form instruction
    Form,
    /// Rep counting
    Count,
    /// One line drawn from the motivation pool
    Motivation,
    /// Exercise wrap-up
    ExerciseEnd,
    /// Closing narration of the final phase
    WorkoutEnd,
}

/// A queued piece of narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationItem {
    pub text: String,
    pub category: NarrationCategory,
}

impl NarrationItem {
    pub fn new(text: impl Into<String>, category: NarrationCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Narration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Master enable for narration
    pub enabled: bool,
    /// Voice identifier handed to the synthesizer
    pub voice_id: Option<String>,
    /// API key handed to the synthesizer
    pub api_key: Option<String>,
    /// Pause between consecutive items in milliseconds
    pub item_gap_ms: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            voice_id: None,
            api_key: None,
            item_gap_ms: 100,
        }
    }
}

impl NarrationConfig {
    pub fn credentials(&self) -> VoiceCredentials {
        VoiceCredentials {
            voice_id: self.voice_id.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// Narration events for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    /// An item started playing
    Started {
        text: String,
        category: NarrationCategory,
    },
    /// An item finished playing
    Completed { category: NarrationCategory },
    /// Synthesis or playback failed; the item was dropped
    Error { message: String },
    /// Playback was stopped and the queue cleared
    QueueCleared,
}
