//! Command-line interface for idea-review.
//!
//! Running with no subcommand reviews every pending idea. Subcommands
//! inspect the queue and move ideas between states.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::adapters::{GeminiClient, ResendNotifier};
use crate::config::{self, paths, resolve_delivery, Credentials, DeliveryPlan, ResolvedConfig};
use crate::core::{load_prompt, FeedbackArchive, Orchestrator, RunJournal, RunLock, RunSettings};
use crate::domain::{IdeaOutcome, QueueState, RunReport, VoiceStyle};
use crate::queue::{FsIdeaStore, IdeaStore};

/// idea-review - spoken AI feedback on business ideas
#[derive(Parser, Debug)]
#[command(name = "idea-review")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Tone of the spoken feedback
    #[arg(long, value_enum, default_value_t = VoiceArg::Upbeat)]
    pub voice_style: VoiceArg,

    /// Don't email the feedback, even if Resend is configured
    #[arg(long)]
    pub no_email: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show queue counts and the last run
    Status,

    /// Move an idea from drafting to pending
    Promote {
        /// File name of the idea
        name: String,
    },

    /// Move an evaluated idea back to pending for another review
    Requeue {
        /// File name of the idea
        name: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Voice style for CLI (maps to VoiceStyle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoiceArg {
    /// Encouraging infomercial host
    Upbeat,

    /// Judge delivering a verdict
    Serious,

    /// Resigned and defeatist
    Flippant,
}

impl From<VoiceArg> for VoiceStyle {
    fn from(v: VoiceArg) -> Self {
        match v {
            VoiceArg::Upbeat => VoiceStyle::Upbeat,
            VoiceArg::Serious => VoiceStyle::Serious,
            VoiceArg::Flippant => VoiceStyle::Flippant,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            None => run_review(self.voice_style.into(), self.no_email).await,
            Some(Commands::Status) => show_status().await,
            Some(Commands::Promote { name }) => promote(&name).await,
            Some(Commands::Requeue { name }) => requeue(&name).await,
            Some(Commands::Config) => show_config().await,
        }
    }
}

fn open_store(cfg: &ResolvedConfig) -> Result<FsIdeaStore> {
    FsIdeaStore::new(cfg.ideas_dir())
        .with_include(&cfg.include)
        .context("Invalid queue.include pattern in config")
}

/// Review every pending idea
async fn run_review(voice_style: VoiceStyle, no_email: bool) -> Result<()> {
    let cfg = config::config()?;
    let creds = Credentials::from_env();

    // Fatal checks happen before the queue is touched
    let gemini_key = creds.require_gemini_key()?;
    let plan = resolve_delivery(
        no_email,
        creds.resend_api_key.as_deref(),
        creds.user_email.as_deref(),
    )?;
    let prompt = load_prompt(Some(cfg.prompt_file.as_path()))?;
    let store = open_store(cfg)?;

    let _lock = RunLock::acquire(&cfg.root)?;

    let gemini = Arc::new(GeminiClient::new(gemini_key, cfg.gemini.clone())?);
    let settings = RunSettings::new(prompt)
        .with_voice_style(voice_style)
        .with_retry(cfg.retry.clone());

    let mut orchestrator = Orchestrator::new(
        Arc::new(store),
        gemini.clone(),
        gemini,
        FeedbackArchive::new(cfg.feedback_dir()),
        settings,
    )
    .with_journal(RunJournal::new(cfg.journal_path()));

    match plan {
        DeliveryPlan::Enabled { api_key, recipient } => {
            info!(%recipient, "Email delivery enabled");
            let notifier = ResendNotifier::new(api_key, cfg.email.clone())?;
            orchestrator = orchestrator.with_delivery(Arc::new(notifier), recipient);
        }
        DeliveryPlan::Disabled { reason } => {
            info!(%reason, "Email delivery disabled");
        }
    }

    let report = orchestrator.run().await?;
    print_report(&report);

    Ok(())
}

/// Console summary of a run
fn print_report(report: &RunReport) {
    if report.is_empty() {
        println!("Nothing to process: no pending ideas.");
        return;
    }

    println!("{:<40} {:<10} {}", "IDEA", "OUTCOME", "DETAILS");
    println!("{}", "-".repeat(75));

    for result in &report.results {
        let details = match &result.outcome {
            IdeaOutcome::Evaluated => String::new(),
            IdeaOutcome::Partial { issues } => issues.join("; "),
            IdeaOutcome::Skipped { reason } | IdeaOutcome::Failed { reason } => reason.clone(),
        };
        println!(
            "{:<40} {:<10} {}",
            result.idea,
            result.outcome.label(),
            details
        );
    }

    let counts = report.counts();
    eprintln!(
        "\n[Run {}: {} evaluated, {} partial, {} skipped, {} failed]",
        report.run_id, counts.evaluated, counts.partial, counts.skipped, counts.failed
    );
}

/// Show queue counts, pending ideas and the last completed run
async fn show_status() -> Result<()> {
    let cfg = config::config()?;
    let store = open_store(cfg)?;

    println!("Queue: {}", cfg.ideas_dir().display());
    for state in QueueState::ALL {
        let ideas = store.list(state).await?;
        println!("  {:<10} {}", state.dir_name(), ideas.len());
    }

    let pending = store.list_pending().await?;
    if !pending.is_empty() {
        println!("\nPending:");
        for doc in &pending {
            println!("  {}", doc.name);
        }
    }

    let journal = RunJournal::new(cfg.journal_path());
    match journal.last_finished()? {
        Some((run_id, at, counts)) => {
            println!("\nLast run: {} ({})", run_id, at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!(
                "  {} evaluated, {} partial, {} skipped, {} failed",
                counts.evaluated, counts.partial, counts.skipped, counts.failed
            );
        }
        None => println!("\nNo runs recorded"),
    }

    Ok(())
}

async fn promote(name: &str) -> Result<()> {
    let cfg = config::config()?;
    let store = open_store(cfg)?;

    let doc = store
        .promote(name)
        .await
        .with_context(|| format!("Failed to promote '{}'", name))?;
    println!("Promoted {} to {}", doc.name, doc.state);

    Ok(())
}

async fn requeue(name: &str) -> Result<()> {
    let cfg = config::config()?;
    let store = open_store(cfg)?;

    let doc = store
        .requeue(name)
        .await
        .with_context(|| format!("Failed to requeue '{}'", name))?;
    println!("Requeued {} to {}", doc.name, doc.state);

    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;
    let creds = Credentials::from_env();
    let set = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };

    println!("idea-review configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Root:      {}", cfg.root.display());
    println!("  Ideas:     {}", cfg.ideas_dir().display());
    println!("  Feedback:  {}", cfg.feedback_dir().display());
    println!("  Journal:   {}", cfg.journal_path().display());
    println!("  Lock:      {}", paths::lock_path(&cfg.root).display());
    println!(
        "  Prompt:    {}{}",
        cfg.prompt_file.display(),
        if cfg.prompt_file.exists() { "" } else { " (missing, using built-in)" }
    );
    println!();
    println!(
        "Include patterns: {}",
        if cfg.include.is_empty() {
            "*".to_string()
        } else {
            cfg.include.join(", ")
        }
    );
    println!();
    println!("Gemini:");
    println!("  Analysis model: {}", cfg.gemini.analysis_model);
    println!("  Speech model:   {}", cfg.gemini.speech_model);
    println!("  Voice:          {}", cfg.gemini.voice_name);
    println!("  Timeout:        {}s", cfg.gemini.timeout.as_secs());
    println!();
    println!("Email:");
    println!("  From:    {}", cfg.email.from);
    println!("  Subject: {}", cfg.email.subject);
    println!();
    println!("Retry:");
    println!("  Max attempts:  {}", cfg.retry.max_attempts);
    println!("  Initial delay: {}ms", cfg.retry.initial_delay_ms);
    println!();
    println!("Credentials:");
    println!("  {}: {}", config::ENV_GEMINI_KEY, set(&creds.gemini_api_key));
    println!("  {}: {}", config::ENV_RESEND_KEY, set(&creds.resend_api_key));
    println!(
        "  {}: {}",
        config::ENV_USER_EMAIL,
        creds.user_email.as_deref().unwrap_or("unset")
    );

    Ok(())
}
