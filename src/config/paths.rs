//! Canonical paths under the queue root.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ```text
//! <root>/
//!   .idea-review.lock
//!   user-ideas/{drafting,pending,evaluated}/
//!   feedback/
//!     runs.jsonl
//! ```

use std::path::{Path, PathBuf};

use crate::core::RunLock;

pub const IDEAS_DIR: &str = "user-ideas";
pub const FEEDBACK_DIR: &str = "feedback";
pub const JOURNAL_FILE: &str = "runs.jsonl";

/// Parent of the three queue state directories
pub fn ideas_dir(root: &Path) -> PathBuf {
    root.join(IDEAS_DIR)
}

/// Where feedback artifacts and the journal go
pub fn feedback_dir(root: &Path) -> PathBuf {
    root.join(FEEDBACK_DIR)
}

pub fn journal_path(root: &Path) -> PathBuf {
    feedback_dir(root).join(JOURNAL_FILE)
}

pub fn lock_path(root: &Path) -> PathBuf {
    root.join(RunLock::FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let root = Path::new("/data/agent");
        assert_eq!(ideas_dir(root), PathBuf::from("/data/agent/user-ideas"));
        assert_eq!(feedback_dir(root), PathBuf::from("/data/agent/feedback"));
        assert_eq!(
            journal_path(root),
            PathBuf::from("/data/agent/feedback/runs.jsonl")
        );
        assert_eq!(lock_path(root), PathBuf::from("/data/agent/.idea-review.lock"));
    }
}
