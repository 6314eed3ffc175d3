//! Front-matter decoding.
//!
//! Two notations are supported:
//! - [`MetadataNotation::Structured`]: full YAML, including nested
//!   `phases` lists and arbitrary extra keys
//! - [`MetadataNotation::LineScan`]: recognizes only `title:`, `duration:`
//!   and a `phases:` block of two-line `- name:` / `duration:` entries
//!
//! Neither notation fails the parse. A block that cannot be decoded yields
//! an empty [`WorkoutMetadata`] and a logged warning.

use serde::{Deserialize, Serialize};

use crate::workouts::types::{DecodeError, PhaseOutline, WorkoutMetadata};
use crate::workouts::values::leading_integer;

/// Front-matter notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataNotation {
    #[default]
    Structured,
    LineScan,
}

/// Decode front-matter text with the given notation.
pub fn decode_metadata(text: &str, notation: MetadataNotation) -> WorkoutMetadata {
    match notation {
        MetadataNotation::Structured => match decode_structured(text) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("{}; using empty metadata", e);
                WorkoutMetadata::default()
            }
        },
        MetadataNotation::LineScan => decode_line_scan(text),
    }
}

/// Decode YAML front matter.
pub fn decode_structured(text: &str) -> Result<WorkoutMetadata, DecodeError> {
    if text.trim().is_empty() {
        return Ok(WorkoutMetadata::default());
    }

    serde_yaml::from_str(text).map_err(|e| DecodeError::Metadata(e.to_string()))
}

/// Decode the restricted line-scanning notation.
///
/// Unmatched lines are ignored.
pub fn decode_line_scan(text: &str) -> WorkoutMetadata {
    let lines: Vec<&str> = text.lines().collect();
    let mut metadata = WorkoutMetadata::default();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx].trim();

        if let Some(value) = line.strip_prefix("title:") {
            metadata.title = Some(value.trim().replace('"', ""));
        } else if let Some(value) = line.strip_prefix("duration:") {
            if let Some(minutes) = leading_integer(value) {
                metadata.duration = Some(minutes);
            }
        } else if line.starts_with("phases:") {
            let (phases, consumed) = scan_phase_outline(&lines[idx + 1..]);
            metadata.phases = phases;
            idx += consumed;
        }

        idx += 1;
    }

    metadata
}

/// Read `phases:` entries, returning the outlines and the number of lines
/// consumed.
fn scan_phase_outline(lines: &[&str]) -> (Vec<PhaseOutline>, usize) {
    let mut phases = Vec::new();
    let mut idx = 0;

    while idx < lines.len() && lines[idx].starts_with("  ") {
        let entry = lines[idx].trim();
        let Some(name) = entry
            .strip_prefix('-')
            .map(str::trim)
            .and_then(|rest| rest.strip_prefix("name:"))
        else {
            idx += 1;
            continue;
        };

        let name = name.trim().replace('"', "");
        let duration = lines
            .get(idx + 1)
            .map(|l| l.trim())
            .and_then(|l| l.strip_prefix("duration:"))
            .and_then(leading_integer);

        match duration {
            Some(minutes) => {
                phases.push(PhaseOutline {
                    name,
                    duration: Some(minutes),
                });
                idx += 2;
            }
            None => {
                tracing::debug!("Phase outline '{}' has no duration line; skipped", name);
                idx += 1;
            }
        }
    }

    (phases, idx)
}
