//! Azure OpenAI embedding backend.
//!
//! Bound at construction to the deployment configured for one model size.
//! Inputs are embedded in fixed-size batches; the response order matches the
//! input order.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitcoach_core::config::AzureConfig;
use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Embedder;
use fitcoach_core::types::ModelSize;

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 16;

pub struct AzureEmbeddingProvider {
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    size: ModelSize,
    client: reqwest::Client,
}

impl AzureEmbeddingProvider {
    pub fn new(azure: &AzureConfig, size: ModelSize) -> Result<Self> {
        if azure.endpoint.is_empty() {
            return Err(FitCoachError::Config("Azure endpoint is not configured".into()));
        }
        if azure.api_key.is_empty() {
            return Err(FitCoachError::Config("Azure API key is not configured".into()));
        }
        let deployment = azure.embedding_deployment(size)?.to_string();

        Ok(Self {
            endpoint: azure.endpoint.trim_end_matches('/').to_string(),
            api_key: azure.api_key.clone(),
            api_version: azure.api_version.clone(),
            deployment,
            size,
            client: reqwest::Client::new(),
        })
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.embeddings_url();
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("api-key", &self.api_key)
            .json(&json!({ "input": batch }))
            .send()
            .await
            .map_err(|e| FitCoachError::Http(format!("embedding connection failed ({url}): {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(FitCoachError::Embedding(format!("embedding API error {status}: {text}")));
        }

        let json: Value = resp.json().await.map_err(|e| FitCoachError::Http(e.to_string()))?;
        let data = json["data"]
            .as_array()
            .ok_or_else(|| FitCoachError::Embedding("No data in embedding response".into()))?;

        let mut vectors = Vec::with_capacity(data.len());
        for item in data {
            let vec: Vec<f32> = item["embedding"]
                .as_array()
                .ok_or_else(|| FitCoachError::Embedding("Missing embedding vector".into()))?
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            vectors.push(vec);
        }

        if vectors.len() != batch.len() {
            return Err(FitCoachError::Embedding(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for AzureEmbeddingProvider {
    fn name(&self) -> &str {
        "azure-openai-embeddings"
    }

    fn model_size(&self) -> ModelSize {
        self.size
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            tracing::debug!(batch = batch.len(), deployment = %self.deployment, "embedding batch");
            all.extend(self.embed_batch(batch).await?);
        }
        Ok(all)
    }
}
