//! Azure OpenAI chat-completion provider.
//!
//! Speaks the standard OpenAI chat format against an Azure deployment URL
//! (`{endpoint}/openai/deployments/{deployment}/chat/completions`), with the
//! `api-key` header auth style. Upstream failures are surfaced as provider
//! errors and never retried at this layer.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitcoach_core::config::AzureConfig;
use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Provider;
use fitcoach_core::types::{
    FunctionCall, GenerateParams, Message, ProviderResponse, ToolCall, ToolDefinition, Usage,
};

pub struct AzureChatProvider {
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    client: reqwest::Client,
}

impl AzureChatProvider {
    pub fn new(azure: &AzureConfig) -> Result<Self> {
        if azure.endpoint.is_empty() {
            return Err(FitCoachError::Config("Azure endpoint is not configured".into()));
        }
        if azure.api_key.is_empty() {
            return Err(FitCoachError::Config("Azure API key is not configured".into()));
        }
        if azure.chat_deployment.is_empty() {
            return Err(FitCoachError::Config("Azure chat deployment is not configured".into()));
        }

        Ok(Self {
            endpoint: azure.endpoint.trim_end_matches('/').to_string(),
            api_key: azure.api_key.clone(),
            api_version: azure.api_version.clone(),
            deployment: azure.chat_deployment.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl Provider for AzureChatProvider {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        let mut body = json!({
            "messages": serde_json::to_value(messages)?,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        if !tools.is_empty() {
            let tool_defs: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tool_defs);
        }

        let url = self.chat_url();
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FitCoachError::Http(format!("chat connection failed ({url}): {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(FitCoachError::Provider(format!("chat API error {status}: {text}")));
        }

        let json: Value = resp.json().await.map_err(|e| FitCoachError::Http(e.to_string()))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| FitCoachError::Provider("No choices in response".into()))?;

        let content = choice["message"]["content"].as_str().map(String::from);

        let tool_calls = if let Some(tc) = choice["message"]["tool_calls"].as_array() {
            tc.iter()
                .filter_map(|t| {
                    Some(ToolCall {
                        id: t["id"].as_str().unwrap_or("").to_string(),
                        call_type: "function".to_string(),
                        function: FunctionCall {
                            name: t["function"]["name"].as_str()?.to_string(),
                            arguments: t["function"]["arguments"].as_str()?.to_string(),
                        },
                    })
                })
                .collect()
        } else {
            vec![]
        };

        let usage = json["usage"].as_object().map(|u| Usage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0)
                as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ProviderResponse {
            content,
            tool_calls,
            finish_reason: choice["finish_reason"].as_str().map(String::from),
            usage,
        })
    }
}
