//! Main orchestrator for a review run.
//!
//! Drains the pending queue one idea at a time: analysis, feedback on disk,
//! speech, optional delivery, then the move to `evaluated`. Failures stay
//! inside the idea that caused them.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{AnalysisClient, Notifier, ServiceError, SpeechClient};
use crate::domain::{
    ArtifactPaths, DeliveryRecord, FeedbackArtifact, IdeaDocument, IdeaOutcome, QueueState,
    RunReport, VoiceStyle,
};
use crate::queue::{IdeaStore, StoreError};

use super::archive::FeedbackArchive;
use super::journal::{content_hash, JournalEntry, RunJournal};
use super::retry::RetryPolicy;

/// Per-run settings that don't depend on any collaborator
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Instruction prompt sent with every idea
    pub prompt: String,

    pub voice_style: VoiceStyle,

    pub retry: RetryPolicy,
}

impl RunSettings {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            voice_style: VoiceStyle::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_voice_style(mut self, style: VoiceStyle) -> Self {
        self.voice_style = style;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Notifier plus the address it sends to
struct Delivery {
    notifier: Arc<dyn Notifier>,
    recipient: String,
}

/// Everything that happened to one idea
struct Processed {
    outcome: IdeaOutcome,
    content_hash: Option<String>,
    artifacts: Option<ArtifactPaths>,
    delivery: Option<DeliveryRecord>,
}

impl Processed {
    fn bare(outcome: IdeaOutcome) -> Self {
        Self {
            outcome,
            content_hash: None,
            artifacts: None,
            delivery: None,
        }
    }
}

/// Review pipeline over an idea store
pub struct Orchestrator {
    store: Arc<dyn IdeaStore>,
    analysis: Arc<dyn AnalysisClient>,
    speech: Arc<dyn SpeechClient>,
    delivery: Option<Delivery>,
    archive: FeedbackArchive,
    journal: Option<RunJournal>,
    settings: RunSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn IdeaStore>,
        analysis: Arc<dyn AnalysisClient>,
        speech: Arc<dyn SpeechClient>,
        archive: FeedbackArchive,
        settings: RunSettings,
    ) -> Self {
        Self {
            store,
            analysis,
            speech,
            delivery: None,
            archive,
            journal: None,
            settings,
        }
    }

    /// Enable delivery. Without this the notifier is never called.
    pub fn with_delivery(mut self, notifier: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        self.delivery = Some(Delivery {
            notifier,
            recipient: recipient.into(),
        });
        self
    }

    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn delivery_enabled(&self) -> bool {
        self.delivery.is_some()
    }

    /// Process every pending idea once.
    ///
    /// Errors are returned only for problems that prevent the run from
    /// starting (layout, listing). Per-idea failures end up in the report.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty, voice_style = %self.settings.voice_style))]
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", &tracing::field::display(run_id));

        self.store
            .ensure_layout()
            .await
            .context("Failed to prepare queue directories")?;
        self.archive.ensure_dir().await?;

        let pending = self
            .store
            .list_pending()
            .await
            .context("Failed to list pending ideas")?;

        let mut report = RunReport::new(run_id);

        if pending.is_empty() {
            info!("Nothing to process");
            report.finish();
            return Ok(report);
        }

        info!(%run_id, count = pending.len(), "Starting review run");
        self.journal(JournalEntry::RunStarted {
            run_id,
            at: report.started_at,
            voice_style: self.settings.voice_style,
            delivery_enabled: self.delivery_enabled(),
        });

        for doc in &pending {
            let started = Instant::now();
            let processed = self.process_idea(doc).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match &processed.outcome {
                IdeaOutcome::Evaluated => {
                    info!(idea = %doc.name, duration_ms, "Idea evaluated")
                }
                IdeaOutcome::Partial { issues } => {
                    warn!(idea = %doc.name, duration_ms, issues = ?issues, "Idea evaluated with issues")
                }
                IdeaOutcome::Skipped { reason } => {
                    warn!(idea = %doc.name, %reason, "Idea skipped")
                }
                IdeaOutcome::Failed { reason } => {
                    error!(idea = %doc.name, duration_ms, %reason, "Idea failed, left in pending")
                }
            }

            self.journal(JournalEntry::IdeaProcessed {
                run_id,
                at: Utc::now(),
                idea: doc.name.clone(),
                content_hash: processed.content_hash,
                outcome: processed.outcome.clone(),
                artifacts: processed.artifacts,
                delivery: processed.delivery,
            });

            report.record(doc.name.clone(), processed.outcome);
        }

        report.finish();
        let counts = report.counts();
        info!(
            evaluated = counts.evaluated,
            partial = counts.partial,
            skipped = counts.skipped,
            failed = counts.failed,
            "Review run finished"
        );
        self.journal(JournalEntry::RunFinished {
            run_id,
            at: report.finished_at.unwrap_or_else(Utc::now),
            counts,
        });

        Ok(report)
    }

    /// Run the stages for one idea. Never returns an error: every failure
    /// becomes part of the outcome.
    #[instrument(skip(self, doc), fields(idea = %doc.name))]
    async fn process_idea(&self, doc: &IdeaDocument) -> Processed {
        let processed_at = Utc::now();

        let idea_text = match self.store.read(doc).await {
            Ok(text) => text,
            Err(e) => {
                return Processed::bare(IdeaOutcome::Failed {
                    reason: format!("read failed: {}", e),
                })
            }
        };
        let hash = content_hash(&idea_text);

        if idea_text.trim().is_empty() {
            return Processed {
                content_hash: Some(hash),
                ..Processed::bare(IdeaOutcome::Skipped {
                    reason: "idea file is empty".to_string(),
                })
            };
        }

        let failed = |reason: String, artifacts: Option<ArtifactPaths>| Processed {
            outcome: IdeaOutcome::Failed { reason },
            content_hash: Some(hash.clone()),
            artifacts,
            delivery: None,
        };

        // Refuse before any service call when the final move would collide
        match self.store.contains(&doc.name, QueueState::Evaluated).await {
            Ok(false) => {}
            Ok(true) => {
                let collision = StoreError::Collision {
                    name: doc.name.clone(),
                    state: QueueState::Evaluated,
                };
                return failed(format!("cannot archive: {}", collision), None);
            }
            Err(e) => return failed(format!("checking evaluated failed: {}", e), None),
        }

        // Analysis
        let analysis = &self.analysis;
        let prompt = self.settings.prompt.as_str();
        let text = match self
            .call_with_retry(analysis.name(), || analysis.generate(prompt, &idea_text))
            .await
        {
            Ok(text) => text,
            Err(e) => return failed(format!("analysis failed: {}", e), None),
        };
        debug!(chars = text.len(), "Analysis received");

        // Feedback text, reserved stem
        let mut artifact = FeedbackArtifact::new(doc.slug.clone(), processed_at, text);
        let (stem, text_path) = match self.archive.write_text(&artifact).await {
            Ok(written) => written,
            Err(e) => return failed(format!("writing feedback failed: {:#}", e), None),
        };

        let mut paths = ArtifactPaths {
            stem: stem.clone(),
            text: Some(text_path),
            ..Default::default()
        };
        let mut issues = Vec::new();

        match self.archive.write_report(&stem, &idea_text, &artifact).await {
            Ok(path) => paths.report = Some(path),
            Err(e) => issues.push(format!("report: {:#}", e)),
        }

        // Speech
        let speech = &self.speech;
        let style = self.settings.voice_style;
        let synthesized = {
            let feedback = artifact.text.as_str();
            self.call_with_retry(speech.name(), || speech.synthesize(feedback, style))
                .await
        };
        match synthesized {
            Ok(audio) => artifact = artifact.with_audio(audio),
            Err(e) => issues.push(format!("speech: {}", e)),
        }

        match self.archive.write_audio(&stem, &artifact).await {
            Ok(path) => paths.audio = path,
            Err(e) => issues.push(format!("audio: {:#}", e)),
        }

        // Delivery
        let delivery = match &self.delivery {
            Some(Delivery {
                notifier,
                recipient,
            }) => {
                let feedback = artifact.text.as_str();
                let audio = artifact.audio.as_deref();
                match self
                    .call_with_retry(notifier.name(), || {
                        notifier.send(feedback, audio, recipient)
                    })
                    .await
                {
                    Ok(record) => Some(record),
                    Err(e) => {
                        issues.push(format!("delivery: {}", e));
                        Some(DeliveryRecord {
                            recipient: recipient.clone(),
                            delivered: false,
                            message_id: None,
                        })
                    }
                }
            }
            None => None,
        };

        // Archive the idea
        if let Err(e) = self.store.mark_evaluated(doc).await {
            return Processed {
                delivery,
                ..failed(format!("move to evaluated failed: {}", e), Some(paths))
            };
        }

        let outcome = if issues.is_empty() {
            IdeaOutcome::Evaluated
        } else {
            IdeaOutcome::Partial { issues }
        };

        Processed {
            outcome,
            content_hash: Some(hash),
            artifacts: Some(paths),
            delivery,
        }
    }

    /// Call a service, retrying transient failures per the retry policy
    async fn call_with_retry<T, F, Fut>(&self, service: &str, mut call: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let policy = &self.settings.retry;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && policy.should_retry(attempt) => {
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(
                        service,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Service call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!(service, attempt, error = %e, "Service call failed");
                    return Err(e);
                }
            }
        }
    }

    fn journal(&self, entry: JournalEntry) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(&entry) {
                warn!(error = %e, "Failed to append to run journal");
            }
        }
    }
}
