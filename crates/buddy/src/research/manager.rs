use anyhow::{anyhow, Result};
use serde_json::json;
use std::sync::Arc;

use super::{
    parse_json_reply, ProgressStream, ReportWriter, ResearchManager, WebSearchItem, WebSearchPlan,
    WebSearcher,
};
use crate::models::message::Message;
use crate::prompt_template::render_prompt_file;
use crate::providers::base::Provider;

pub const DEFAULT_SEARCH_COUNT: usize = 5;

/// Plans web searches for a query, runs them, and writes a report from their summaries
#[derive(Clone)]
pub struct WebResearchManager {
    provider: Arc<dyn Provider>,
    searcher: Arc<dyn WebSearcher>,
    writer: Arc<ReportWriter>,
    search_count: usize,
}

impl WebResearchManager {
    pub fn new(
        provider: Arc<dyn Provider>,
        searcher: Arc<dyn WebSearcher>,
        writer: Arc<ReportWriter>,
    ) -> Self {
        Self {
            provider,
            searcher,
            writer,
            search_count: DEFAULT_SEARCH_COUNT,
        }
    }

    pub fn with_search_count(mut self, search_count: usize) -> Self {
        self.search_count = search_count;
        self
    }

    async fn plan_searches(&self, query: &str) -> Result<Vec<WebSearchItem>> {
        let instructions =
            render_prompt_file("planner.md", &json!({"search_count": self.search_count}))?;
        let (reply, _) = self
            .provider
            .complete(
                &instructions,
                &[Message::user().with_text(format!("Query: {}", query))],
                &[],
            )
            .await?;

        let plan: WebSearchPlan = parse_json_reply(&reply.text())
            .ok_or_else(|| anyhow!("Planner reply was not a search plan"))?;
        let mut searches = plan.searches;
        searches.truncate(self.search_count);
        tracing::info!(searches = searches.len(), "Searches planned");
        Ok(searches)
    }
}

impl ResearchManager for WebResearchManager {
    fn run(&self, query: String) -> ProgressStream {
        let manager = self.clone();

        Box::pin(async_stream::try_stream! {
            tracing::info!(query = %query, "Web research started");
            yield "Starting research...".to_string();

            let searches = manager.plan_searches(&query).await?;
            yield "Searches planned, starting to search...".to_string();

            let total = searches.len();
            let mut results = Vec::with_capacity(total);
            for (done, item) in searches.iter().enumerate() {
                match manager.searcher.search(item).await {
                    Ok(summary) => results.push(summary),
                    Err(e) => tracing::warn!(search = %item.query, "Search failed: {:#}", e),
                }
                yield format!("Searching... {}/{} completed", done + 1, total);
            }

            yield "Searches complete, writing report...".to_string();
            let input = format!(
                "Original query: {}\nSummarized search results: {:?}",
                query, results
            );
            let report = manager.writer.write(&input).await?;
            yield "Report written".to_string();

            yield report.markdown_report;
        })
    }
}
