//! Scripted fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use idea_review::adapters::{AnalysisClient, Notifier, ServiceError, SpeechClient};
use idea_review::config::{paths, DeliveryPlan};
use idea_review::core::{FeedbackArchive, Orchestrator, RetryPolicy, RunJournal, RunSettings};
use idea_review::domain::{DeliveryRecord, QueueState, VoiceStyle};
use idea_review::queue::FsIdeaStore;
use tempfile::TempDir;

/// Analysis client answering from a script keyed by idea text.
/// Unscripted ideas get `Feedback on <idea>`.
#[derive(Default)]
pub struct ScriptedAnalysis {
    script: Mutex<HashMap<String, Result<String, ServiceError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, idea: &str, response: Result<&str, ServiceError>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(idea.to_string(), response.map(str::to_string));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisClient for ScriptedAnalysis {
    fn name(&self) -> &str {
        "scripted-analysis"
    }

    async fn generate(&self, _prompt: &str, idea_text: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().get(idea_text) {
            Some(response) => response.clone(),
            None => Ok(format!("Feedback on {}", idea_text)),
        }
    }
}

/// Speech client returning fixed bytes, failing for feedback containing
/// any of the configured markers
pub struct ScriptedSpeech {
    audio: Vec<u8>,
    fail_on: Vec<String>,
    styles: Mutex<Vec<VoiceStyle>>,
    pub calls: AtomicUsize,
}

impl ScriptedSpeech {
    pub fn new(audio: &[u8]) -> Self {
        Self {
            audio: audio.to_vec(),
            fail_on: Vec::new(),
            styles: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on.push(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn styles(&self) -> Vec<VoiceStyle> {
        self.styles.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechClient for ScriptedSpeech {
    fn name(&self) -> &str {
        "scripted-speech"
    }

    async fn synthesize(&self, text: &str, style: VoiceStyle) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.styles.lock().unwrap().push(style);
        if self.fail_on.iter().any(|m| text.contains(m.as_str())) {
            return Err(ServiceError::Permanent("voice rejected".to_string()));
        }
        Ok(self.audio.clone())
    }
}

/// Notifier that records every call
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: AtomicUsize,
    pub sent: Mutex<Vec<(String, bool)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(
        &self,
        _feedback_text: &str,
        audio: Option<&[u8]>,
        recipient: &str,
    ) -> Result<DeliveryRecord, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Transient("mail server down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), audio.is_some()));
        Ok(DeliveryRecord {
            recipient: recipient.to_string(),
            delivered: true,
            message_id: Some("msg-1".to_string()),
        })
    }
}

/// Queue root in a temp directory plus helpers to build orchestrators over it
pub struct Workspace {
    pub temp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("agent")
    }

    pub fn store(&self) -> FsIdeaStore {
        FsIdeaStore::new(paths::ideas_dir(&self.root()))
    }

    pub fn state_dir(&self, state: QueueState) -> PathBuf {
        self.store().state_dir(state)
    }

    pub fn feedback_dir(&self) -> PathBuf {
        paths::feedback_dir(&self.root())
    }

    pub fn journal(&self) -> RunJournal {
        RunJournal::new(paths::journal_path(&self.root()))
    }

    pub fn write_idea(&self, state: QueueState, name: &str, content: &str) {
        let dir = self.state_dir(state);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    pub fn exists(&self, state: QueueState, name: &str) -> bool {
        self.state_dir(state).join(name).exists()
    }

    /// Feedback files whose name starts with `<slug>_` and ends with `suffix`
    pub fn artifacts(&self, slug: &str, suffix: &str) -> Vec<PathBuf> {
        let dir = self.feedback_dir();
        if !dir.exists() {
            return Vec::new();
        }
        let prefix = format!("{}_", slug);
        let mut found: Vec<PathBuf> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                let name = file_name(p);
                name.starts_with(&prefix) && name.ends_with(suffix)
            })
            .collect();
        found.sort();
        found
    }

    pub fn orchestrator(
        &self,
        analysis: Arc<ScriptedAnalysis>,
        speech: Arc<ScriptedSpeech>,
    ) -> Orchestrator {
        Orchestrator::new(
            Arc::new(self.store()),
            analysis,
            speech,
            FeedbackArchive::new(self.feedback_dir()),
            RunSettings::new("Critique this idea").with_retry(RetryPolicy::none()),
        )
        .with_journal(self.journal())
    }
}

/// Attach the notifier only when the plan enables delivery
pub fn apply_plan(
    orchestrator: Orchestrator,
    plan: DeliveryPlan,
    notifier: Arc<RecordingNotifier>,
) -> Orchestrator {
    match plan {
        DeliveryPlan::Enabled { recipient, .. } => orchestrator.with_delivery(notifier, recipient),
        DeliveryPlan::Disabled { .. } => orchestrator,
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
