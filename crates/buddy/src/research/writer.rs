use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use super::{parse_json_reply, ReportData};
use crate::models::message::Message;
use crate::prompt_template::render_prompt_file;
use crate::providers::base::Provider;

/// Turns gathered material into a markdown report
pub struct ReportWriter {
    provider: Arc<dyn Provider>,
}

impl ReportWriter {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Ask the model for a report on `input`, which holds the original query and the material
    /// gathered for it. A reply that is not the expected JSON becomes the report as-is.
    pub async fn write(&self, input: &str) -> Result<ReportData> {
        let instructions = render_prompt_file("writer.md", &json!({}))?;
        let (reply, usage) = self
            .provider
            .complete(&instructions, &[Message::user().with_text(input)], &[])
            .await?;
        tracing::debug!(total_tokens = ?usage.total_tokens, "Report written");

        let text = reply.text();
        Ok(parse_json_reply(&text).unwrap_or_else(|| {
            tracing::debug!("Writer reply was not structured, using it as the report");
            ReportData::from_markdown(text)
        }))
    }
}
