//! Queue Lifecycle Integration Tests
//!
//! drafting -> pending -> evaluated -> pending, as driven by the CLI.

mod common;

use std::sync::Arc;

use common::{ScriptedAnalysis, ScriptedSpeech, Workspace};
use idea_review::config::paths;
use idea_review::core::RunLock;
use idea_review::domain::{IdeaOutcome, QueueState};
use idea_review::queue::{IdeaStore, StoreError};

#[tokio::test]
async fn test_drafts_are_left_alone_until_promoted() {
    let ws = Workspace::new();
    ws.write_idea(QueueState::Drafting, "draft.md", "Half an idea");
    let analysis = Arc::new(ScriptedAnalysis::new());
    let speech = Arc::new(ScriptedSpeech::new(b"RIFF"));

    let report = ws
        .orchestrator(analysis.clone(), speech.clone())
        .run()
        .await
        .unwrap();
    assert!(report.is_empty());
    assert!(ws.exists(QueueState::Drafting, "draft.md"));

    let doc = ws.store().promote("draft.md").await.unwrap();
    assert_eq!(doc.state, QueueState::Pending);
    assert_eq!(doc.slug, "draft");

    let report = ws.orchestrator(analysis.clone(), speech).run().await.unwrap();
    assert_eq!(report.outcome_of("draft.md"), Some(&IdeaOutcome::Evaluated));
    assert!(ws.exists(QueueState::Evaluated, "draft.md"));
    assert_eq!(analysis.calls(), 1);
}

#[tokio::test]
async fn test_evaluated_ideas_are_not_reprocessed() {
    let ws = Workspace::new();
    ws.write_idea(QueueState::Pending, "foo.md", "Idea A");
    let analysis = Arc::new(ScriptedAnalysis::new());
    let speech = Arc::new(ScriptedSpeech::new(b"RIFF"));

    ws.orchestrator(analysis.clone(), speech.clone())
        .run()
        .await
        .unwrap();
    let second = ws.orchestrator(analysis.clone(), speech).run().await.unwrap();

    assert!(second.is_empty());
    assert_eq!(analysis.calls(), 1);
}

#[tokio::test]
async fn test_requeue_collision_keeps_both_copies() {
    let ws = Workspace::new();
    ws.write_idea(QueueState::Evaluated, "foo.md", "Old idea");
    ws.write_idea(QueueState::Pending, "foo.md", "New idea");

    let err = ws.store().requeue("foo.md").await.unwrap_err();
    assert!(matches!(err, StoreError::Collision { state: QueueState::Pending, .. }));

    let old = std::fs::read_to_string(ws.state_dir(QueueState::Evaluated).join("foo.md")).unwrap();
    let new = std::fs::read_to_string(ws.state_dir(QueueState::Pending).join("foo.md")).unwrap();
    assert_eq!(old, "Old idea");
    assert_eq!(new, "New idea");
}

#[tokio::test]
async fn test_promote_unknown_idea() {
    let ws = Workspace::new();
    let err = ws.store().promote("missing.md").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn test_concurrent_runs_are_refused() {
    let ws = Workspace::new();

    let held = RunLock::acquire(&ws.root()).unwrap();
    assert_eq!(held.path(), paths::lock_path(&ws.root()).as_path());

    let err = RunLock::acquire(&ws.root()).unwrap_err();
    assert!(err.to_string().contains("Another idea-review run"));
}
