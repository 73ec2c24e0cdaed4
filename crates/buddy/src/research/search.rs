use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::WebSearchItem;
use crate::prompt_template::render_prompt_file;
use crate::providers::configs::OpenAiProviderConfig;

/// Searches the web for one planned search and summarizes what it found
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, item: &WebSearchItem) -> Result<String>;
}

/// Web search through the OpenAI responses API and its hosted search tool
pub struct OpenAiWebSearcher {
    client: Client,
    host: String,
    api_key: String,
    model: String,
}

impl OpenAiWebSearcher {
    pub fn new(config: &OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn output_text(data: &Value) -> Option<String> {
        let parts: Vec<&str> = data
            .get("output")?
            .as_array()?
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
            .filter_map(|item| item.get("content").and_then(Value::as_array))
            .flatten()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }
}

#[async_trait]
impl WebSearcher for OpenAiWebSearcher {
    async fn search(&self, item: &WebSearchItem) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "instructions": render_prompt_file("search.md", &json!({}))?,
            "input": format!("Search term: {}\nReason for searching: {}", item.query, item.reason),
            "tools": [{"type": "web_search_preview", "search_context_size": "low"}],
            "tool_choice": "required",
        });

        let response = self
            .client
            .post(format!("{}/v1/responses", self.host))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Search request failed: {}\n{}", status, body));
        }

        let data: Value = response.json().await?;
        Self::output_text(&data)
            .ok_or_else(|| anyhow!("Search response for '{}' had no text output", item.query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn searcher_for(server: &MockServer) -> OpenAiWebSearcher {
        let mut config = OpenAiProviderConfig::new("test_api_key");
        config.host = server.uri();
        OpenAiWebSearcher::new(&config).unwrap()
    }

    fn item() -> WebSearchItem {
        WebSearchItem {
            reason: "background".to_string(),
            query: "rust async runtimes".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_collects_output_text() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(header("Authorization", "Bearer test_api_key"))
            .and(body_partial_json(json!({
                "tools": [{"type": "web_search_preview"}],
                "input": "Search term: rust async runtimes\nReason for searching: background"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": [
                    {"type": "web_search_call", "id": "ws_1", "status": "completed"},
                    {
                        "type": "message",
                        "role": "assistant",
                        "content": [
                            {"type": "output_text", "text": "Tokio dominates. ", "annotations": []},
                            {"type": "output_text", "text": "Smol is lighter.", "annotations": []}
                        ]
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = searcher_for(&server).search(&item()).await?;
        assert_eq!(summary, "Tokio dominates. Smol is lighter.");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = searcher_for(&server).search(&item()).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_search_without_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": []})))
            .mount(&server)
            .await;

        assert!(searcher_for(&server).search(&item()).await.is_err());
    }
}
