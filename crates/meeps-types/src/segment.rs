use std::fmt;

use serde::{Deserialize, Serialize};

/// One atomic unit of message content.
///
/// Mentions are a distinct variant so a renderer never has to ask whether a
/// link-looking node is really a mention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Text { value: String },
    Mention { slug: String },
}

impl Segment {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text { value: value.into() }
    }

    pub fn mention(slug: impl Into<String>) -> Self {
        Self::Mention { slug: slug.into() }
    }

    pub fn as_mention(&self) -> Option<&str> {
        match self {
            Self::Mention { slug } => Some(slug),
            Self::Text { .. } => None,
        }
    }
}

/// Writes the segment back in its source form (`@slug` for mentions).
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { value } => f.write_str(value),
            Self::Mention { slug } => write!(f, "@{}", slug),
        }
    }
}

/// Concatenate segments back into the original content.
pub fn reconstruct(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.to_string()).collect()
}
