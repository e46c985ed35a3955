//! # FitCoach Providers
//!
//! Hosted model backends: an Azure OpenAI chat-completion provider and the
//! embedding adapter that maps a model-size selector to its configured
//! deployment.

pub mod chat;
pub mod embeddings;

use fitcoach_core::FitCoachConfig;
use fitcoach_core::error::Result;
use fitcoach_core::traits::{Embedder, Provider};
use fitcoach_core::types::ModelSize;

/// Create the chat provider from configuration. Fails fast on missing
/// endpoint, key, or deployment.
pub fn create_chat_provider(config: &FitCoachConfig) -> Result<Box<dyn Provider>> {
    Ok(Box::new(chat::AzureChatProvider::new(&config.azure)?))
}

/// Create the embedding backend for `size`. Fails with a configuration error
/// when the corresponding deployment is unset; never falls back to the other
/// size.
pub fn create_embedder(config: &FitCoachConfig, size: ModelSize) -> Result<Box<dyn Embedder>> {
    Ok(Box::new(embeddings::AzureEmbeddingProvider::new(&config.azure, size)?))
}
