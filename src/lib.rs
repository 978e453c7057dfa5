//! idea-review - spoken AI feedback on business ideas
//!
//! Reads business ideas from a directory-based queue, asks a language model
//! for a critique, turns the critique into speech, optionally emails both,
//! and archives the idea.
//!
//! # Architecture
//!
//! The queue is the state: an idea lives in exactly one of `drafting/`,
//! `pending/` or `evaluated/`, and only a successful review moves it out of
//! `pending/`. Each idea is processed in isolation, so one failure never
//! affects the rest of the run.
//!
//! # Modules
//!
//! - `adapters`: External services (Gemini analysis and speech, Resend email)
//! - `core`: Orchestration (Orchestrator, FeedbackArchive, RunJournal, RunLock)
//! - `domain`: Data structures (IdeaDocument, FeedbackArtifact, RunReport)
//! - `queue`: Idea storage (FsIdeaStore, MemoryIdeaStore)
//! - `config`: Config file, environment and delivery resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Review every pending idea
//! idea-review --voice-style serious
//!
//! # Move a draft into the queue
//! idea-review promote my-idea.md
//!
//! # Queue counts and the last run
//! idea-review status
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod queue;

// Re-export main types at crate root for convenience
pub use adapters::{AnalysisClient, Notifier, ServiceError, SpeechClient};
pub use core::{FeedbackArchive, Orchestrator, RunSettings};
pub use domain::{IdeaDocument, IdeaOutcome, QueueState, RunReport, VoiceStyle};
pub use queue::{FsIdeaStore, IdeaStore, MemoryIdeaStore, StoreError};
