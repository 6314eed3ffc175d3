//! Cue Templates and Message Selection
//!
//! Synthesized announcements (e.g. "Starting circuit 2") and random
//! selection from an exercise's motivation pool.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default circuit announcement
pub const CIRCUIT_ANNOUNCEMENT: &str = "Starting circuit {number}";

/// Template for a cue message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueTemplate {
    /// Template string with placeholders like {number}
    pub template: String,
    /// Alternative templates for variety
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

impl CueTemplate {
    /// Create a simple template with no alternatives
    pub fn simple(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            alternatives: Vec::new(),
        }
    }

    /// Create a template with alternatives
    pub fn with_alternatives(template: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            template: template.into(),
            alternatives,
        }
    }

    /// Pick the template or one of its alternatives
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        if self.alternatives.is_empty() {
            return &self.template;
        }
        match rng.gen_range(0..=self.alternatives.len()) {
            0 => &self.template,
            idx => &self.alternatives[idx - 1],
        }
    }

    /// Expand `{key}` placeholders
    pub fn render(template: &str, values: &[(&str, String)]) -> String {
        values
            .iter()
            .fold(template.to_string(), |text, (key, value)| {
                text.replace(&format!("{{{}}}", key), value)
            })
    }
}

impl Default for CueTemplate {
    fn default() -> Self {
        Self::simple(CIRCUIT_ANNOUNCEMENT)
    }
}

/// Announcement for entering circuit `number` (1-based)
pub fn circuit_announcement<R: Rng + ?Sized>(
    template: &CueTemplate,
    number: usize,
    rng: &mut R,
) -> String {
    CueTemplate::render(template.choose(rng), &[("number", number.to_string())])
}

/// Draw one message uniformly from a motivation pool
pub fn pick_motivation<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> Option<&'a str> {
    pool.choose(rng).map(String::as_str)
}
