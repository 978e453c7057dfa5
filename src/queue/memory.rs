//! In-memory idea store, for tests and dry experiments.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{IdeaStore, StoreError};
use crate::domain::{IdeaDocument, QueueState};

#[derive(Debug, Clone)]
struct StoredIdea {
    content: String,
    created_at: DateTime<Utc>,
}

/// Idea store that keeps everything in a map keyed by (state, name)
#[derive(Default)]
pub struct MemoryIdeaStore {
    ideas: Mutex<BTreeMap<(QueueState, String), StoredIdea>>,
}

impl MemoryIdeaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an idea directly into a state (test setup)
    pub fn insert(&self, state: QueueState, name: impl Into<String>, content: impl Into<String>) {
        let stored = StoredIdea {
            content: content.into(),
            created_at: Utc::now(),
        };
        self.lock().insert((state, name.into()), stored);
    }

    /// Drop an idea regardless of state (simulates external deletion)
    pub fn remove(&self, name: &str) {
        self.lock().retain(|(_, n), _| n != name);
    }

    /// States the named idea is currently in (should be at most one)
    pub fn states_of(&self, name: &str) -> Vec<QueueState> {
        self.lock()
            .keys()
            .filter(|(_, n)| n == name)
            .map(|(s, _)| *s)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(QueueState, String), StoredIdea>> {
        // A poisoned map is still structurally valid
        self.ideas.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl IdeaStore for MemoryIdeaStore {
    async fn ensure_layout(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self, state: QueueState) -> Result<Vec<IdeaDocument>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|((s, _), _)| *s == state)
            .map(|((s, name), stored)| IdeaDocument::new(name.clone(), *s, stored.created_at))
            .collect())
    }

    async fn contains(&self, name: &str, state: QueueState) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(&(state, name.to_string())))
    }

    async fn read(&self, doc: &IdeaDocument) -> Result<String, StoreError> {
        self.lock()
            .get(&(doc.state, doc.name.clone()))
            .map(|stored| stored.content.clone())
            .ok_or_else(|| StoreError::NotFound(doc.name.clone()))
    }

    async fn move_idea(
        &self,
        name: &str,
        from: QueueState,
        to: QueueState,
    ) -> Result<IdeaDocument, StoreError> {
        let mut ideas = self.lock();

        if !ideas.contains_key(&(from, name.to_string())) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        if ideas.contains_key(&(to, name.to_string())) {
            return Err(StoreError::Collision {
                name: name.to_string(),
                state: to,
            });
        }

        let stored = ideas
            .remove(&(from, name.to_string()))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let doc = IdeaDocument::new(name, to, stored.created_at);
        ideas.insert((to, name.to_string()), stored);

        Ok(doc)
    }
}
