//! Feedback artifacts produced for an idea.
//!
//! An artifact is written once by the run that produced it and never mutated.
//! Reprocessing the same idea produces a new artifact under a new stem.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text and audio feedback for one idea, keyed by slug and processing time
#[derive(Debug, Clone)]
pub struct FeedbackArtifact {
    /// Slug of the idea the feedback is about
    pub slug: String,

    /// When processing of the idea started
    pub processed_at: DateTime<Utc>,

    /// Critique returned by the analysis model
    pub text: String,

    /// WAV bytes, absent when synthesis failed
    pub audio: Option<Vec<u8>>,
}

impl FeedbackArtifact {
    pub fn new(slug: impl Into<String>, processed_at: DateTime<Utc>, text: String) -> Self {
        Self {
            slug: slug.into(),
            processed_at,
            text,
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Default file stem: `<slug>_<YYYYmmdd_HHMMSS>`
    pub fn stem(&self) -> String {
        format!("{}_{}", self.slug, self.processed_at.format("%Y%m%d_%H%M%S"))
    }
}

/// Where the artifacts of one idea ended up on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Stem actually reserved (may carry a `-N` collision suffix)
    pub stem: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
}
