//! Interview Script
//!
//! The ordered question bank a session walks through, plus the fixed phrases
//! the interviewer uses around it (greeting, re-prompt and closing remark).

use anyhow::Context;
use std::path::Path;

/// Opening line spoken before the first question.
pub const GREETING: &str = "Hello! I'm your AI interviewer today. Let's get started. ";

/// Spoken when an answer is finished without any recognized speech.
pub const REPROMPT: &str = "I didn't hear anything. Could you please repeat that?";

/// Spoken once the last question has been answered. No answer is solicited.
pub const CLOSING_REMARK: &str = "Thank you for your time. The interview is now complete. We will review your responses and get back to you.";

const DEFAULT_QUESTIONS: [&str; 5] = [
    "Tell me about yourself and your background.",
    "What is your greatest strength and how do you use it?",
    "Describe a challenging situation you faced and how you handled it.",
    "Where do you see yourself in five years?",
    "Why do you want to work for our company?",
];

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("An interview script needs at least one question")]
    Empty,
}

/// An immutable, non-empty sequence of interview prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewScript {
    prompts: Vec<String>,
}

impl InterviewScript {
    /// Builds a script from the given prompts, rejecting an empty list.
    pub fn new<I, S>(prompts: I) -> Result<Self, ScriptError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prompts: Vec<String> = prompts.into_iter().map(Into::into).collect();
        if prompts.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self { prompts })
    }

    /// Loads a script from a text file with one question per non-blank line.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read interview script {}", path.display()))?;
        let prompts = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string);
        Self::new(prompts)
            .with_context(|| format!("Interview script {} has no questions", path.display()))
    }

    /// The prompt at `index`, if the index is inside the script.
    pub fn prompt(&self, index: usize) -> Option<&str> {
        self.prompts.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Index of the final question.
    pub fn last_index(&self) -> usize {
        self.prompts.len() - 1
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Default for InterviewScript {
    fn default() -> Self {
        Self {
            prompts: DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_script_has_five_questions() {
        let script = InterviewScript::default();
        assert_eq!(script.len(), 5);
        assert_eq!(
            script.prompt(0),
            Some("Tell me about yourself and your background.")
        );
        assert_eq!(script.last_index(), 4);
        assert!(script.prompt(5).is_none());
    }

    #[test]
    fn test_empty_script_is_rejected() {
        let result = InterviewScript::new(Vec::<String>::new());
        assert!(matches!(result, Err(ScriptError::Empty)));
    }

    #[test]
    fn test_from_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "First question?").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   Second question?  ").unwrap();

        let script = InterviewScript::from_file(file.path()).unwrap();
        assert_eq!(script.prompts(), ["First question?", "Second question?"]);
    }

    #[test]
    fn test_from_file_with_only_blank_lines_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let err = InterviewScript::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("has no questions"));
    }

    #[test]
    fn test_from_missing_file_fails() {
        let err = InterviewScript::from_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read interview script"));
    }
}
