//! Idea documents and their queue states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of an idea, one directory per stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    /// Being written by the user, never touched by a run
    Drafting,

    /// Waiting for the next run
    Pending,

    /// Reviewed; only `requeue` brings it back
    Evaluated,
}

impl QueueState {
    /// All states in lifecycle order
    pub const ALL: [QueueState; 3] = [Self::Drafting, Self::Pending, Self::Evaluated];

    /// Directory name holding ideas in this state
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Drafting => "drafting",
            Self::Pending => "pending",
            Self::Evaluated => "evaluated",
        }
    }
}

impl std::fmt::Display for QueueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A user-authored idea file as seen by the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaDocument {
    /// File name, unique within a state directory
    pub name: String,

    /// Kebab-case key used to name feedback artifacts
    pub slug: String,

    /// Directory the file currently lives in
    pub state: QueueState,

    /// Creation time from filesystem metadata
    pub created_at: DateTime<Utc>,
}

impl IdeaDocument {
    pub fn new(name: impl Into<String>, state: QueueState, created_at: DateTime<Utc>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            name,
            slug,
            state,
            created_at,
        }
    }
}

/// Derive a slug from a file name: stem only, lowercase, runs of anything
/// that isn't ASCII alphanumeric collapsed into a single `-`.
pub fn slugify(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };

    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "idea".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("foo.md"), "foo");
        assert_eq!(slugify("AI Fitness Coach.md"), "ai-fitness-coach");
        assert_eq!(slugify("smart_plant__monitor.txt"), "smart-plant-monitor");
        assert_eq!(slugify("no-extension"), "no-extension");
        assert_eq!(slugify("archive.tar.gz"), "archive-tar");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify("???.md"), "idea");
        assert_eq!(slugify(".md"), "md");
        assert_eq!(slugify(""), "idea");
    }

    #[test]
    fn test_state_dirs() {
        let names: Vec<&str> = QueueState::ALL.iter().map(|s| s.dir_name()).collect();
        assert_eq!(names, vec!["drafting", "pending", "evaluated"]);
    }
}
