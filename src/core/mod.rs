//! Core review logic.
//!
//! This module contains:
//! - Orchestrator: drives each pending idea through the pipeline
//! - FeedbackArchive: writes feedback artifacts
//! - RunJournal: append-only log of runs
//! - RunLock: keeps concurrent runs apart
//! - RetryPolicy and the instruction prompt

pub mod archive;
pub mod journal;
pub mod lock;
pub mod orchestrator;
pub mod prompts;
pub mod retry;

// Re-export commonly used types
pub use archive::FeedbackArchive;
pub use journal::{content_hash, JournalEntry, RunJournal};
pub use lock::RunLock;
pub use orchestrator::{Orchestrator, RunSettings};
pub use prompts::{load_prompt, DEFAULT_PROMPT};
pub use retry::RetryPolicy;
