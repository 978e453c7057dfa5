//! Append-only run journal.
//!
//! Each run appends JSONL records to `feedback/runs.jsonl`: one when it
//! starts, one per idea, one when it finishes. The journal is a log, not
//! state: the queue directories alone decide what gets processed next.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{ArtifactPaths, DeliveryRecord, IdeaOutcome, RunCounts, VoiceStyle};

/// One line of the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEntry {
    RunStarted {
        run_id: Uuid,
        at: DateTime<Utc>,
        voice_style: VoiceStyle,
        delivery_enabled: bool,
    },
    IdeaProcessed {
        run_id: Uuid,
        at: DateTime<Utc>,
        idea: String,
        /// SHA256(content)[0:16], absent when the file couldn't be read
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_hash: Option<String>,
        outcome: IdeaOutcome,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifacts: Option<ArtifactPaths>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery: Option<DeliveryRecord>,
    },
    RunFinished {
        run_id: Uuid,
        at: DateTime<Utc>,
        counts: RunCounts,
    },
}

impl JournalEntry {
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::IdeaProcessed { run_id, .. }
            | Self::RunFinished { run_id, .. } => *run_id,
        }
    }
}

/// JSONL journal file
pub struct RunJournal {
    path: PathBuf,
}

impl RunJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry with file locking
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open journal: {}", self.path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire file lock on journal")?;

        let json = serde_json::to_string(entry).context("Failed to serialize journal entry")?;

        let mut file = file;
        writeln!(file, "{}", json).context("Failed to write journal entry")?;
        file.flush().context("Failed to flush journal")?;

        // Lock is released when file is dropped
        Ok(())
    }

    /// Read every entry in append order. Unparsable lines are skipped.
    pub fn replay(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open journal: {}", self.path.display()))?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable journal line"),
            }
        }

        Ok(entries)
    }

    /// The most recent completed run: its id, finish time and counters
    pub fn last_finished(&self) -> Result<Option<(Uuid, DateTime<Utc>, RunCounts)>> {
        let entries = self.replay()?;
        Ok(entries.into_iter().rev().find_map(|entry| match entry {
            JournalEntry::RunFinished { run_id, at, counts } => Some((run_id, at, counts)),
            _ => None,
        }))
    }
}

/// Hash idea content (first 16 hex chars of SHA256)
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn finished(run_id: Uuid, evaluated: usize) -> JournalEntry {
        JournalEntry::RunFinished {
            run_id,
            at: Utc::now(),
            counts: RunCounts {
                evaluated,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_append_and_replay_order() {
        let temp = TempDir::new().unwrap();
        let journal = RunJournal::new(temp.path().join("runs.jsonl"));
        let run_id = Uuid::new_v4();

        journal
            .append(&JournalEntry::RunStarted {
                run_id,
                at: Utc::now(),
                voice_style: VoiceStyle::Serious,
                delivery_enabled: false,
            })
            .unwrap();
        journal
            .append(&JournalEntry::IdeaProcessed {
                run_id,
                at: Utc::now(),
                idea: "foo.md".to_string(),
                content_hash: Some(content_hash("Idea A")),
                outcome: IdeaOutcome::Evaluated,
                artifacts: None,
                delivery: None,
            })
            .unwrap();
        journal.append(&finished(run_id, 1)).unwrap();

        let entries = journal.replay().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0], JournalEntry::RunStarted { .. }));
        assert!(matches!(
            &entries[1],
            JournalEntry::IdeaProcessed { idea, .. } if idea == "foo.md"
        ));
        assert!(entries.iter().all(|e| e.run_id() == run_id));
    }

    #[test]
    fn test_last_finished() {
        let temp = TempDir::new().unwrap();
        let journal = RunJournal::new(temp.path().join("runs.jsonl"));
        assert!(journal.last_finished().unwrap().is_none());

        let older = Uuid::new_v4();
        let newer = Uuid::new_v4();
        journal.append(&finished(older, 1)).unwrap();
        journal.append(&finished(newer, 3)).unwrap();

        let (run_id, _, counts) = journal.last_finished().unwrap().unwrap();
        assert_eq!(run_id, newer);
        assert_eq!(counts.evaluated, 3);
    }

    #[test]
    fn test_replay_skips_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runs.jsonl");
        std::fs::write(&path, "not json\n\n").unwrap();

        let journal = RunJournal::new(path);
        journal.append(&finished(Uuid::new_v4(), 0)).unwrap();
        assert_eq!(journal.replay().unwrap().len(), 1);
    }

    #[test]
    fn test_content_hash() {
        let hash = content_hash("Idea A");
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, content_hash("Idea A"));
        assert_ne!(hash, content_hash("Idea B"));
    }
}
