//! Instruction prompt for the analysis model.

use std::path::Path;

use anyhow::{Context, Result};

/// Used when no prompt file is configured or present
pub const DEFAULT_PROMPT: &str = "\
You are a friendly and candid business refinement agent. Analyse the business \
idea below and give structured feedback: what is promising, the biggest risks, \
who the first customers would be, how it could make money, and three concrete \
next steps to validate it. Write in a conversational style, addressing the \
author directly.";

/// Load the instruction prompt, falling back to [`DEFAULT_PROMPT`] when the
/// file does not exist. An unreadable or empty file is an error.
pub fn load_prompt(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(DEFAULT_PROMPT.to_string());
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "Prompt file not found, using built-in prompt");
        return Ok(DEFAULT_PROMPT.to_string());
    }

    let prompt = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

    let prompt = prompt.trim();
    if prompt.is_empty() {
        anyhow::bail!("Prompt file is empty: {}", path.display());
    }

    Ok(prompt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_default() {
        let temp = TempDir::new().unwrap();
        let prompt = load_prompt(Some(&temp.path().join("nope.md"))).unwrap();
        assert_eq!(prompt, DEFAULT_PROMPT);
        assert_eq!(load_prompt(None).unwrap(), DEFAULT_PROMPT);
    }

    #[test]
    fn test_file_is_trimmed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prompt.md");
        std::fs::write(&path, "\n  Be brutal.  \n").unwrap();
        assert_eq!(load_prompt(Some(&path)).unwrap(), "Be brutal.");
    }

    #[test]
    fn test_empty_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prompt.md");
        std::fs::write(&path, "   ").unwrap();
        assert!(load_prompt(Some(&path)).is_err());
    }
}
