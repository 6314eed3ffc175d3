//! Front-matter / body splitting.
//!
//! A workout document opens with a `---` delimited front-matter block:
//!
//! ```text
//! ---
//! title: "..."
//! ---
//! # Warm-up Phase
//! ```

use serde::{Deserialize, Serialize};

use crate::workouts::types::WorkoutParseError;

const DELIMITER: &str = "---";

/// How strictly the front-matter delimiters are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontMatterPolicy {
    /// The document must open with `---`; anything else is a format error.
    #[default]
    Strict,
    /// Compatibility mode: delimiters toggle front matter positionally and
    /// a document without them is all body.
    Permissive,
}

/// A document split into its two blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitDocument {
    /// Raw front-matter text, without delimiters
    pub front_matter: String,
    /// Body text, trimmed
    pub body: String,
}

/// Split raw document text into front matter and body.
pub fn split_document(
    text: &str,
    policy: FrontMatterPolicy,
) -> Result<SplitDocument, WorkoutParseError> {
    let normalized = text.replace("\r\n", "\n");

    match policy {
        FrontMatterPolicy::Strict => split_strict(&normalized),
        FrontMatterPolicy::Permissive => Ok(split_permissive(&normalized)),
    }
}

fn split_strict(text: &str) -> Result<SplitDocument, WorkoutParseError> {
    let mut lines = text.split('\n');

    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => return Err(WorkoutParseError::MissingFrontMatter),
    }

    let mut front_matter = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == DELIMITER {
            closed = true;
            break;
        }
        front_matter.push(line);
    }

    if !closed {
        return Err(WorkoutParseError::MissingFrontMatter);
    }

    let body: Vec<&str> = lines.collect();

    Ok(SplitDocument {
        front_matter: front_matter.join("\n"),
        body: body.join("\n").trim().to_string(),
    })
}

fn split_permissive(text: &str) -> SplitDocument {
    let mut front_matter = Vec::new();
    let mut body = Vec::new();
    let mut in_front_matter = false;

    for line in text.split('\n') {
        if line.trim() == DELIMITER {
            in_front_matter = !in_front_matter;
            continue;
        }
        if in_front_matter {
            front_matter.push(line);
        } else {
            body.push(line);
        }
    }

    SplitDocument {
        front_matter: front_matter.join("\n"),
        body: body.join("\n").trim().to_string(),
    }
}
