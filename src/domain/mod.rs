//! Domain types for idea review.
//!
//! - Idea: queue documents and their lifecycle state
//! - Artifact: feedback produced for an idea
//! - Voice: speech delivery styles
//! - Run: per-idea outcomes and run reports

pub mod artifact;
pub mod idea;
pub mod run;
pub mod voice;

// Re-export commonly used types
pub use artifact::{ArtifactPaths, FeedbackArtifact};
pub use idea::{slugify, IdeaDocument, QueueState};
pub use run::{DeliveryRecord, IdeaOutcome, IdeaResult, RunCounts, RunReport};
pub use voice::VoiceStyle;
