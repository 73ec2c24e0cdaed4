//! Report pipelines.
//!
//! Each pipeline is a lazy stream of progress strings whose last item is the finished markdown
//! report. Nothing runs until the stream is polled, and each step completes before the next
//! progress message is produced.

pub mod manager;
pub mod pdf_report;
pub mod search;
pub mod writer;

use anyhow::Result;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use manager::WebResearchManager;
pub use pdf_report::{pdf_report, PdfUpload};
pub use search::{OpenAiWebSearcher, WebSearcher};
pub use writer::ReportWriter;

/// Progress messages followed by the report
pub type ProgressStream = BoxStream<'static, Result<String>>;

/// Runs a complete research job for a query
pub trait ResearchManager: Send + Sync {
    fn run(&self, query: String) -> ProgressStream;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(default)]
    pub short_summary: String,
    pub markdown_report: String,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

impl ReportData {
    /// A report made of unstructured markdown only
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            short_summary: String::new(),
            markdown_report: markdown.into(),
            follow_up_questions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchItem {
    #[serde(default)]
    pub reason: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchPlan {
    pub searches: Vec<WebSearchItem>,
}

/// Parse a JSON object out of a model reply. Models often wrap JSON in a markdown code fence or
/// surround it with a sentence, so both are tolerated.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Option<T> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(value) = serde_json::from_str(unfenced) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}
