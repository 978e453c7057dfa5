//! Voice styles for spoken feedback.

use serde::{Deserialize, Serialize};

/// Delivery tone applied to every idea in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceStyle {
    #[default]
    Upbeat,
    Serious,
    Flippant,
}

impl VoiceStyle {
    /// Instruction prepended to the text sent to the speech model
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Upbeat => {
                "Read this text in a highly encouraging and upbeat tone of voice, \
                 the kind you might hear in a cheesy radio infomercial."
            }
            Self::Serious => {
                "Read this text in a stern and authoritative voice. Emulate the cadence \
                 and tone of a judge delivering a verdict."
            }
            Self::Flippant => {
                "Read this text with a sense of sadness and defeatism, as if you are \
                 delivering hopeless news to somebody."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upbeat => "upbeat",
            Self::Serious => "serious",
            Self::Flippant => "flippant",
        }
    }
}

impl std::fmt::Display for VoiceStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_upbeat() {
        assert_eq!(VoiceStyle::default(), VoiceStyle::Upbeat);
    }

    #[test]
    fn test_instructions_differ() {
        assert_ne!(VoiceStyle::Upbeat.instruction(), VoiceStyle::Serious.instruction());
        assert_ne!(VoiceStyle::Serious.instruction(), VoiceStyle::Flippant.instruction());
        assert!(VoiceStyle::Serious.instruction().contains("verdict"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&VoiceStyle::Flippant).unwrap();
        assert_eq!(json, "\"flippant\"");
    }
}
