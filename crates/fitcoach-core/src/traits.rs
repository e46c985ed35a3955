//! Trait seams between the core and its pluggable backends.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    GenerateParams, Message, ModelSize, ProviderResponse, ToolDefinition, ToolResult,
};

/// A chat-completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Run one chat completion. Tool definitions are advertised to the model;
    /// upstream failures are not retried here.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse>;
}

/// An embedding backend bound to one deployment of one model size.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// The model size this backend was configured for.
    fn model_size(&self) -> ModelSize;

    /// Embed a batch of texts. Returns one vector per input, same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// A callable tool exposed to agents.
///
/// External contract: `arguments` is one JSON-encoded string and
/// `ToolResult::output` is one JSON-encoded string.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, arguments: &str) -> Result<ToolResult>;
}
