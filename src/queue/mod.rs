//! Filesystem-backed idea queue.
//!
//! Ideas live in one of three sibling directories, and moving a file between
//! them is the only state transition:
//!
//! ```text
//! drafting ──promote──▶ pending ──mark_evaluated──▶ evaluated
//!                          ▲                            │
//!                          └──────────requeue───────────┘
//! ```
//!
//! The store is passed into the orchestrator as a trait object so tests can
//! swap in [`MemoryIdeaStore`].

pub mod fs_store;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{IdeaDocument, QueueState};

pub use fs_store::FsIdeaStore;
pub use memory::MemoryIdeaStore;

/// Errors that can occur with the idea queue
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Idea not found: {0}")]
    NotFound(String),

    #[error("Idea '{name}' already exists in {state}")]
    Collision { name: String, state: QueueState },

    #[error("Invalid include pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage for idea documents across the three queue states
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Create any missing state directories
    async fn ensure_layout(&self) -> Result<(), StoreError>;

    /// Ideas currently in `state`, in storage order, computed fresh each call
    async fn list(&self, state: QueueState) -> Result<Vec<IdeaDocument>, StoreError>;

    /// Whether an idea with this name currently sits in `state`
    async fn contains(&self, name: &str, state: QueueState) -> Result<bool, StoreError>;

    /// Raw text of an idea; `NotFound` if it vanished since listing
    async fn read(&self, doc: &IdeaDocument) -> Result<String, StoreError>;

    /// Move an idea between states, content untouched.
    ///
    /// Nothing moves on error: a missing source is `NotFound`, an occupied
    /// destination is `Collision`.
    async fn move_idea(
        &self,
        name: &str,
        from: QueueState,
        to: QueueState,
    ) -> Result<IdeaDocument, StoreError>;

    async fn list_pending(&self) -> Result<Vec<IdeaDocument>, StoreError> {
        self.list(QueueState::Pending).await
    }

    async fn mark_evaluated(&self, doc: &IdeaDocument) -> Result<IdeaDocument, StoreError> {
        self.move_idea(&doc.name, QueueState::Pending, QueueState::Evaluated)
            .await
    }

    /// Explicit user action: drafting → pending
    async fn promote(&self, name: &str) -> Result<IdeaDocument, StoreError> {
        self.move_idea(name, QueueState::Drafting, QueueState::Pending)
            .await
    }

    /// The only way to get an idea reviewed again: evaluated → pending
    async fn requeue(&self, name: &str) -> Result<IdeaDocument, StoreError> {
        self.move_idea(name, QueueState::Evaluated, QueueState::Pending)
            .await
    }
}
