//! Story data model
//!
//! A [`Segment`] is one unit of narrative with outgoing [`Choice`]s. Segments
//! are authored once; only `audio_url` is filled in lazily after narration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of a segment or choice identifier
pub const MAX_ID_LEN: usize = 128;

/// Vote counts for one segment, keyed by choice id
pub type VoteCounts = BTreeMap<String, u64>;

/// A labeled option on a segment linking to a target segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub choice_id: String,
    pub label: String,
    pub target_segment_id: String,
}

impl Choice {
    pub fn new(
        choice_id: impl Into<String>,
        label: impl Into<String>,
        target_segment_id: impl Into<String>,
    ) -> Self {
        Self {
            choice_id: choice_id.into(),
            label: label.into(),
            target_segment_id: target_segment_id.into(),
        }
    }
}

/// One story segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Ordered choices; empty for a terminal segment
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Present only once the search index has been built over this segment
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Segment {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            choices: Vec::new(),
            embedding: None,
            audio_url: None,
        }
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Look up a choice on this segment by id
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.choice_id == choice_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    /// Case-insensitive substring match against title and content
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }

    /// Text fed to the embedder when indexing this segment
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Check that an identifier is safe to use in a URL path and a file name
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// One search result
///
/// Lexical hits carry no score; semantic hits carry the similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub segment: Segment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl SearchHit {
    pub fn lexical(segment: Segment) -> Self {
        Self { segment, score: None }
    }

    pub fn scored(segment: Segment, score: f32) -> Self {
        Self {
            segment,
            score: Some(score),
        }
    }
}

/// Search strategy, chosen explicitly in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive substring match on title and content
    #[default]
    Lexical,
    /// Nearest neighbours over precomputed embeddings
    Semantic,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Lexical => "lexical",
            SearchMode::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(SearchMode::Lexical),
            "semantic" => Ok(SearchMode::Semantic),
            other => Err(format!(
                "unknown search mode '{}' (expected 'lexical' or 'semantic')",
                other
            )),
        }
    }
}
