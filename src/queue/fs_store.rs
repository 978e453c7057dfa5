//! Directory-per-state idea store on the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use tokio::fs;
use tracing::debug;

use super::{IdeaStore, StoreError};
use crate::domain::{IdeaDocument, QueueState};

/// Idea store rooted at a directory holding `drafting/`, `pending/` and
/// `evaluated/`
pub struct FsIdeaStore {
    /// Parent of the three state directories
    root: PathBuf,

    /// File name patterns that count as ideas
    include: Vec<Pattern>,
}

impl FsIdeaStore {
    /// Create a store that treats every non-hidden file as an idea
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
        }
    }

    /// Restrict ideas to file names matching any of the glob patterns
    pub fn with_include(mut self, patterns: &[String]) -> Result<Self, StoreError> {
        self.include = patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| StoreError::InvalidPattern(format!("{}: {}", p, e))))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Directory for a given state
    pub fn state_dir(&self, state: QueueState) -> PathBuf {
        self.root.join(state.dir_name())
    }

    fn is_idea_name(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| p.matches(name))
    }

    async fn document_at(path: &Path, name: &str, state: QueueState) -> Result<IdeaDocument, StoreError> {
        let metadata = fs::metadata(path).await?;
        let created_at = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(IdeaDocument::new(name, state, created_at))
    }
}

/// Reject anything that could escape a state directory
fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(StoreError::NotFound(name.to_string()));
    }
    Ok(())
}

async fn exists(path: &Path) -> Result<bool, std::io::Error> {
    match fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl IdeaStore for FsIdeaStore {
    async fn ensure_layout(&self) -> Result<(), StoreError> {
        for state in QueueState::ALL {
            fs::create_dir_all(self.state_dir(state)).await?;
        }
        Ok(())
    }

    async fn list(&self, state: QueueState) -> Result<Vec<IdeaDocument>, StoreError> {
        let dir = self.state_dir(state);
        let mut ideas = Vec::new();

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ideas),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };

            if !self.is_idea_name(&name) {
                continue;
            }

            match Self::document_at(&entry.path(), &name, state).await {
                Ok(doc) => ideas.push(doc),
                // Removed between read_dir and stat
                Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(ideas)
    }

    async fn contains(&self, name: &str, state: QueueState) -> Result<bool, StoreError> {
        validate_name(name)?;
        Ok(exists(&self.state_dir(state).join(name)).await?)
    }

    async fn read(&self, doc: &IdeaDocument) -> Result<String, StoreError> {
        validate_name(&doc.name)?;
        let path = self.state_dir(doc.state).join(&doc.name);

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(doc.name.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn move_idea(
        &self,
        name: &str,
        from: QueueState,
        to: QueueState,
    ) -> Result<IdeaDocument, StoreError> {
        validate_name(name)?;

        let source = self.state_dir(from).join(name);
        let target_dir = self.state_dir(to);
        let target = target_dir.join(name);

        if !exists(&source).await? {
            return Err(StoreError::NotFound(name.to_string()));
        }
        if exists(&target).await? {
            return Err(StoreError::Collision {
                name: name.to_string(),
                state: to,
            });
        }

        fs::create_dir_all(&target_dir).await?;
        fs::rename(&source, &target).await?;
        debug!(idea = %name, %from, %to, "Moved idea");

        Self::document_at(&target, name, to).await
    }
}
