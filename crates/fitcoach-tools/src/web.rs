//! Web search tools.
//!
//! Unlike the other tools, these never return `Err` for upstream problems:
//! a missing key, a failed request, or a bad response all land in the
//! `error` field of the JSON output so the agent can see and report the
//! failure instead of aborting the turn.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Value, json};

use fitcoach_core::config::WebSearchConfig;
use fitcoach_core::error::Result;
use fitcoach_core::traits::Tool;
use fitcoach_core::types::{ToolDefinition, ToolResult};

pub struct WebSearchTool {
    provider: String,
    tavily_api_key: String,
    serpapi_api_key: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(web: &WebSearchConfig) -> Self {
        Self {
            provider: web.provider.clone(),
            tavily_api_key: web.tavily_api_key.clone(),
            serpapi_api_key: web.serpapi_api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn search_tavily(&self, query: &str, max_results: usize) -> Result<Vec<Value>> {
        let resp = self
            .client
            .post("https://api.tavily.com/search")
            .json(&json!({
                "api_key": self.tavily_api_key,
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await
            .map_err(|e| fitcoach_core::error::FitCoachError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| fitcoach_core::error::FitCoachError::Http(e.to_string()))?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| fitcoach_core::error::FitCoachError::Http(e.to_string()))?;
        let results = body["results"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|it| {
                        json!({
                            "title": it["title"],
                            "url": it["url"],
                            "snippet": it["content"],
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }

    async fn search_serpapi(&self, query: &str, max_results: usize) -> Result<Vec<Value>> {
        let num = max_results.to_string();
        let resp = self
            .client
            .get("https://serpapi.com/search.json")
            .query(&[
                ("q", query),
                ("api_key", self.serpapi_api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| fitcoach_core::error::FitCoachError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| fitcoach_core::error::FitCoachError::Http(e.to_string()))?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| fitcoach_core::error::FitCoachError::Http(e.to_string()))?;
        let results = body["organic_results"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .take(max_results)
                    .map(|it| {
                        json!({
                            "title": it["title"],
                            "url": it["link"],
                            "snippet": it["snippet"],
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "web_search".into(),
            description: "Search the web via the configured provider (Tavily or SerpAPI) and return results as JSON. Input is a JSON string.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "max_results": { "type": "integer", "description": "Max results (default 5)" }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let start = Instant::now();
        let args: Value = serde_json::from_str(arguments)?;
        let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
        let max_results =
            args.get("max_results").and_then(|v| v.as_u64()).unwrap_or(5) as usize;

        let mut used = false;
        let mut results: Vec<Value> = Vec::new();
        let mut error: Option<String> = None;

        match self.provider.as_str() {
            "tavily" if !self.tavily_api_key.is_empty() => {
                used = true;
                match self.search_tavily(query, max_results).await {
                    Ok(r) => results = r,
                    Err(e) => error = Some(e.to_string()),
                }
            }
            "serpapi" if !self.serpapi_api_key.is_empty() => {
                used = true;
                match self.search_serpapi(query, max_results).await {
                    Ok(r) => results = r,
                    Err(e) => error = Some(e.to_string()),
                }
            }
            _ => error = Some("No provider/key configured".into()),
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if let Some(e) = &error {
            tracing::warn!(provider = %self.provider, error = %e, "web search unavailable");
        }

        let mut output = json!({
            "used": used,
            "provider": self.provider,
            "elapsed_ms": elapsed_ms,
            "results": results,
            "count": results.len(),
        });
        if let Some(e) = error {
            output["error"] = json!(e);
        }
        Ok(ToolResult { output: output.to_string() })
    }
}

/// Wraps `web_search`: given a question and a draft answer, gather web
/// evidence the agent can use to corroborate (or correct) the draft.
pub struct CorroborateAnswerTool {
    web: WebSearchTool,
}

impl CorroborateAnswerTool {
    pub fn new(web_config: &WebSearchConfig) -> Self {
        Self { web: WebSearchTool::new(web_config) }
    }
}

#[async_trait]
impl Tool for CorroborateAnswerTool {
    fn name(&self) -> &str {
        "corroborate_answer"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "corroborate_answer".into(),
            description: "Collect web evidence for a question and a draft answer. Returns the evidence with search metadata. Input is a JSON string.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string" },
                    "draft": { "type": "string" },
                    "max_results": { "type": "integer", "description": "Max evidence items (default 3)" }
                },
                "required": ["question", "draft"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let start = Instant::now();
        let args: Value = serde_json::from_str(arguments)?;
        let question = args.get("question").and_then(|v| v.as_str()).unwrap_or("");
        let draft = args.get("draft").and_then(|v| v.as_str()).unwrap_or("");
        let max_results =
            args.get("max_results").and_then(|v| v.as_u64()).unwrap_or(3);

        let web_args = json!({ "query": question, "max_results": max_results }).to_string();
        let web_raw = self.web.execute(&web_args).await?;
        let web: Value = serde_json::from_str(&web_raw.output)?;
        let wrapper_elapsed_ms = start.elapsed().as_millis() as u64;

        let output = json!({
            "question": question,
            "draft": draft,
            "evidence": web["results"],
            "meta": {
                "used": web["used"],
                "provider": web["provider"],
                "elapsed_ms": web["elapsed_ms"],
                "error": web.get("error").cloned().unwrap_or(Value::Null),
                "count": web["count"],
                "wrapper_elapsed_ms": wrapper_elapsed_ms,
            },
        });
        Ok(ToolResult { output: output.to_string() })
    }
}
