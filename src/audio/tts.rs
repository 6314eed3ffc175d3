//! Speech Synthesis and Audio Output
//!
//! The narration player depends on two injected capabilities:
//! - [`SpeechSynthesizer`]: turns text into a playable [`AudioClip`]
//! - [`AudioOutput`]: plays one clip at a time and reports when it ended
//!
//! [`ConsoleSynthesizer`] and [`SimulatedOutput`] are the built-in
//! implementations used for rehearsals; they log instead of producing sound.

use super::AudioError;
use std::future::Future;
use std::time::Duration;

/// Credentials handed to the synthesizer with every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCredentials {
    /// Voice identifier
    pub voice_id: Option<String>,
    /// Service API key
    pub api_key: Option<String>,
}

impl VoiceCredentials {
    /// The API key, or [`AudioError::MissingCredentials`].
    pub fn require_api_key(&self) -> Result<&str, AudioError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AudioError::MissingCredentials)
    }
}

/// Synthesized speech
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    /// e.g. "audio/mpeg"
    pub mime_type: String,
}

/// Trait for speech synthesis providers
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into a playable clip
    fn synthesize(
        &self,
        text: &str,
        credentials: &VoiceCredentials,
    ) -> impl Future<Output = Result<AudioClip, AudioError>> + Send;
}

/// Trait for a single-channel audio output
pub trait AudioOutput: Send {
    /// Load the clip to play next
    fn set_source(&mut self, clip: AudioClip) -> Result<(), AudioError>;

    /// Start playback; resolves once playback has started
    fn play(&mut self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Resolves when the current clip finished, or with the playback error
    fn ended(&mut self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Pause playback
    fn pause(&mut self);

    /// Rewind to the start and drop the current clip
    fn reset(&mut self);
}

/// Synthesizer that logs the text and returns it as a plain-text clip
#[derive(Debug, Clone, Default)]
pub struct ConsoleSynthesizer;

impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        credentials: &VoiceCredentials,
    ) -> Result<AudioClip, AudioError> {
        if text.is_empty() {
            return Err(AudioError::SynthesisFailed("empty text".to_string()));
        }

        tracing::info!(
            voice = credentials.voice_id.as_deref().unwrap_or("default"),
            "Coach: {}",
            text
        );

        Ok(AudioClip {
            bytes: text.as_bytes().to_vec(),
            mime_type: "text/plain".to_string(),
        })
    }
}

/// Output that "plays" a clip by sleeping for a time proportional to its
/// length
#[derive(Debug, Clone)]
pub struct SimulatedOutput {
    source: Option<AudioClip>,
    playing: bool,
    speed: f64,
}

impl Default for SimulatedOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self {
            source: None,
            playing: false,
            speed: 1.0,
        }
    }

    /// Play back faster (`speed > 1`) or slower than real time
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
        self
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Simulated length of the loaded clip
    pub fn clip_duration(&self) -> Duration {
        let bytes = self.source.as_ref().map(|c| c.bytes.len()).unwrap_or(0);
        let millis = (bytes as u64 * 50).min(10_000);
        Duration::from_millis(millis).div_f64(self.speed)
    }
}

impl AudioOutput for SimulatedOutput {
    fn set_source(&mut self, clip: AudioClip) -> Result<(), AudioError> {
        if clip.bytes.is_empty() {
            return Err(AudioError::PlaybackFailed("empty clip".to_string()));
        }
        self.source = Some(clip);
        Ok(())
    }

    async fn play(&mut self) -> Result<(), AudioError> {
        if self.source.is_none() {
            return Err(AudioError::PlaybackFailed("no source loaded".to_string()));
        }
        self.playing = true;
        Ok(())
    }

    async fn ended(&mut self) -> Result<(), AudioError> {
        if !self.playing {
            return Err(AudioError::PlaybackFailed("not playing".to_string()));
        }
        tokio::time::sleep(self.clip_duration()).await;
        self.playing = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn reset(&mut self) {
        self.playing = false;
        self.source = None;
    }
}

/// Utility functions for text preprocessing
pub mod text_utils {
    const SPOKEN_COUNTS: [&str; 10] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    ];

    /// Pause marker understood by the speech service
    pub const COUNT_BREAK: &str = "<break time=\"1.0s\" />";

    const LOG_PREVIEW_CHARS: usize = 30;

    /// Insert a one-second pause after every count in a counting cue.
    ///
    /// A count is a digit run or one of the words one..ten, followed by
    /// whitespace, a period or a comma.
    pub fn insert_count_breaks(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut result = String::with_capacity(text.len() + 32);
        let mut idx = 0;

        while idx < chars.len() {
            let count_len = count_at(&chars, idx);

            if count_len == 0 {
                result.push(chars[idx]);
                idx += 1;
                continue;
            }

            let end = idx + count_len;
            let followed_by_separator = chars
                .get(end)
                .is_some_and(|c| c.is_whitespace() || *c == '.' || *c == ',');

            result.extend(&chars[idx..end]);
            if followed_by_separator {
                result.push_str(COUNT_BREAK);
            }
            idx = end;
        }

        result
    }

    /// Length of a count token starting at `idx`, or 0.
    fn count_at(chars: &[char], idx: usize) -> usize {
        let previous = idx.checked_sub(1).map(|p| chars[p]);

        if chars[idx].is_ascii_digit() {
            if previous.is_some_and(|c| c.is_ascii_digit()) {
                return 0;
            }
            return chars[idx..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
        }

        if previous.is_some_and(|c| c.is_alphanumeric()) {
            return 0;
        }

        for word in SPOKEN_COUNTS {
            let len = word.chars().count();
            let Some(candidate) = chars.get(idx..idx + len) else {
                continue;
            };
            let matches = candidate
                .iter()
                .zip(word.chars())
                .all(|(a, b)| a.to_ascii_lowercase() == b);
            let whole_word = chars
                .get(idx + len)
                .map_or(true, |c| !c.is_alphanumeric());
            if matches && whole_word {
                return len;
            }
        }

        0
    }

    /// Shorten narration for log lines.
    pub fn truncate_for_log(text: &str) -> String {
        if text.chars().count() <= LOG_PREVIEW_CHARS {
            text.to_string()
        } else {
            let preview: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
            format!("{}...", preview)
        }
    }

    /// Format duration for speech
    pub fn format_duration(seconds: u32) -> String {
        if seconds < 60 {
            format!("{} seconds", seconds)
        } else if seconds < 3600 {
            let mins = seconds / 60;
            let secs = seconds % 60;
            if secs == 0 {
                format!("{} minutes", mins)
            } else {
                format!("{} minutes and {} seconds", mins, secs)
            }
        } else {
            let hours = seconds / 3600;
            let mins = (seconds % 3600) / 60;
            if mins == 0 {
                format!("{} hours", hours)
            } else {
                format!("{} hours and {} minutes", hours, mins)
            }
        }
    }
}
