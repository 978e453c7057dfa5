//! File-based storage for feedback artifacts.
//!
//! All artifacts of one idea share a stem, `<slug>_<YYYYmmdd_HHMMSS>`:
//!
//! ```text
//! feedback/
//!   foo_20250307_090501_analysis.txt   feedback text, verbatim
//!   foo_20250307_090501_analysis.md    report: original idea + feedback
//!   foo_20250307_090501_audio.wav      spoken feedback
//! ```
//!
//! The stem is reserved by creating the `.txt` file exclusively. When two
//! ideas with the same slug land in the same second, the later one gets
//! `-2`, `-3`, ... appended to its stem. Existing artifacts are never
//! overwritten.

use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::domain::FeedbackArtifact;

/// Upper bound on collision suffixes tried for one stem
const MAX_STEM_SUFFIX: u32 = 1000;

/// Output directory for feedback artifacts
pub struct FeedbackArchive {
    dir: PathBuf,
}

impl FeedbackArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the output directory if absent
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create feedback directory: {}", self.dir.display()))
    }

    pub fn text_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}_analysis.txt", stem))
    }

    pub fn report_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}_analysis.md", stem))
    }

    pub fn audio_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}_audio.wav", stem))
    }

    /// Write the feedback text under a freshly reserved stem.
    ///
    /// Returns the stem actually used and the path of the text file.
    pub async fn write_text(&self, artifact: &FeedbackArtifact) -> Result<(String, PathBuf)> {
        let base = artifact.stem();

        for n in 1..=MAX_STEM_SUFFIX {
            let stem = if n == 1 {
                base.clone()
            } else {
                format!("{}-{}", base, n)
            };
            let path = self.text_path(&stem);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to create artifact: {}", path.display()))
                }
            };

            file.write_all(artifact.text.as_bytes())
                .await
                .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
            file.flush().await?;

            return Ok((stem, path));
        }

        anyhow::bail!(
            "No free artifact name for '{}' after {} attempts",
            base,
            MAX_STEM_SUFFIX
        )
    }

    /// Write the Markdown report for a reserved stem
    pub async fn write_report(
        &self,
        stem: &str,
        idea_text: &str,
        artifact: &FeedbackArtifact,
    ) -> Result<PathBuf> {
        let path = self.report_path(stem);
        let content = render_report(idea_text, artifact);

        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        Ok(path)
    }

    /// Write the artifact's audio for a reserved stem.
    ///
    /// Returns `None` when the artifact carries no audio.
    pub async fn write_audio(&self, stem: &str, artifact: &FeedbackArtifact) -> Result<Option<PathBuf>> {
        let Some(audio) = artifact.audio.as_deref() else {
            return Ok(None);
        };
        let path = self.audio_path(stem);

        fs::write(&path, audio)
            .await
            .with_context(|| format!("Failed to write audio: {}", path.display()))?;

        Ok(Some(path))
    }
}

/// Markdown report: original idea followed by the feedback
pub fn render_report(idea_text: &str, artifact: &FeedbackArtifact) -> String {
    format!(
        "# Business Idea Analysis\n\n\
         **Idea**: {}  \n\
         **Date**: {}\n\n\
         ## Original Business Idea\n\n{}\n\n\
         ## Analysis & Feedback\n\n{}\n",
        artifact.slug,
        artifact.processed_at.format("%B %d, %Y at %H:%M UTC"),
        idea_text.trim(),
        artifact.text.trim()
    )
}
