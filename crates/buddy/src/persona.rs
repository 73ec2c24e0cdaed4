use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::pdf;
use crate::prompt_template::render_prompt_file;

/// Who the assistant speaks as. Loaded once, then shared read-only by every conversation.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaContext {
    pub name: String,
    pub summary: String,
    pub profile: String,
}

impl PersonaContext {
    pub fn new<N, S, P>(name: N, summary: S, profile: P) -> Self
    where
        N: Into<String>,
        S: Into<String>,
        P: Into<String>,
    {
        Self {
            name: name.into(),
            summary: summary.into(),
            profile: profile.into(),
        }
    }

    /// Read the summary text file and the profile PDF. Paths may contain `~` and `$VARS`.
    pub fn load(name: &str, summary_path: &str, profile_path: &str) -> Result<Self> {
        let summary_path = expand(summary_path)?;
        let profile_path = expand(profile_path)?;

        let summary = std::fs::read_to_string(&summary_path)
            .with_context(|| format!("Failed to read summary {}", summary_path.display()))?;
        let profile = pdf::extract_text_from_path(&profile_path, "")?;

        tracing::info!(
            persona = name,
            summary_chars = summary.len(),
            profile_chars = profile.len(),
            "Loaded persona"
        );
        Ok(Self::new(name, summary, profile))
    }

    pub fn system_prompt(&self) -> Result<String> {
        let prompt = render_prompt_file("persona.md", self)?;
        Ok(prompt.trim_end().to_string())
    }
}

fn expand(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| format!("Invalid path {}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::pdf_with_pages;
    use indoc::indoc;

    #[test]
    fn test_system_prompt() -> Result<()> {
        let persona = PersonaContext::new(
            "kapilesh",
            "Backend engineer who likes compilers.",
            "Experience: Platform Engineer",
        );

        let expected = indoc! {"
            You are acting as kapilesh, answering questions about kapilesh's career, skills, and background. Stay professional and engaging.

            ## Summary:
            Backend engineer who likes compilers.

            ## LinkedIn Profile:
            Experience: Platform Engineer

            If you don't know something, use record_unknown_question. Encourage users to share their email and record it with record_user_details."};
        assert_eq!(persona.system_prompt()?, expected);
        Ok(())
    }

    #[test]
    fn test_load_from_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let summary_path = dir.path().join("summary.txt");
        let profile_path = dir.path().join("linkedin.pdf");
        std::fs::write(&summary_path, "I build things.")?;
        std::fs::write(&profile_path, pdf_with_pages(&[Some("Engineer"), Some("Rustacean")]))?;

        let persona = PersonaContext::load(
            "kapilesh",
            summary_path.to_str().unwrap(),
            profile_path.to_str().unwrap(),
        )?;

        assert_eq!(persona.summary, "I build things.");
        assert!(persona.profile.contains("Engineer"));
        assert!(persona.profile.contains("Rustacean"));
        assert!(persona.system_prompt()?.contains("I build things."));
        Ok(())
    }

    #[test]
    fn test_load_missing_summary() {
        let result = PersonaContext::load("x", "/nonexistent/summary.txt", "/nonexistent/p.pdf");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to read summary"));
    }
}
