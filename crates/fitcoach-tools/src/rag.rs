//! Corpus retrieval tools.
//!
//! `search_papers` ensures the corpus index exists, embeds the query, and
//! ranks against the single aggregate index, restricted by the session's
//! retrieval scope. When a scoped query fails, it retries unfiltered and
//! logs the degradation rather than failing the agent turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use fitcoach_core::config::RagConfig;
use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::{Embedder, Tool};
use fitcoach_core::types::{ToolDefinition, ToolResult};
use fitcoach_knowledge::{CorpusManager, QueryMethod, RetrievalScope, SharedScope, VectorIndex};

/// Retrieved text is capped before being handed to the model.
const SNIPPET_MAX_CHARS: usize = 1200;

pub struct SearchPapersTool {
    corpus: Arc<CorpusManager>,
    embedder: Arc<dyn Embedder>,
    scope: SharedScope,
    default_k: usize,
    score_threshold: f32,
}

impl SearchPapersTool {
    pub fn new(
        corpus: Arc<CorpusManager>,
        embedder: Arc<dyn Embedder>,
        scope: SharedScope,
        rag: &RagConfig,
    ) -> Self {
        Self {
            corpus,
            embedder,
            scope,
            default_k: rag.default_k,
            score_threshold: rag.score_threshold,
        }
    }
}

#[async_trait]
impl Tool for SearchPapersTool {
    fn name(&self) -> &str {
        "search_papers"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_papers".into(),
            description: "Search the document corpus for evidence on training, nutrition, or supplement questions. Respects the session's retrieval scope. Input is a JSON string.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "k": { "type": "integer", "description": "Number of results (default 6)" },
                    "method": { "type": "string", "description": "mmr|similarity|similarity_with_threshold (default mmr)" }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let args: Value = serde_json::from_str(arguments)?;
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FitCoachError::Tool("Missing field: query".into()))?;
        let k = args.get("k").and_then(|v| v.as_u64()).unwrap_or(self.default_k as u64) as usize;
        let method: QueryMethod = args
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("mmr")
            .to_lowercase()
            .parse()?;

        let index = self.corpus.ensure_index(self.embedder.as_ref()).await?;
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| FitCoachError::Embedding("No embedding for query".into()))?;

        let filter = self.scope.read().await.filter();
        let hits = match index.query(&query_vec, k, method, filter.as_ref(), self.score_threshold)
        {
            Ok(hits) => hits,
            Err(e) if filter.is_some() => {
                tracing::warn!(error = %e, "scoped query failed, retrying unfiltered");
                index.query(&query_vec, k, method, None, self.score_threshold)?
            }
            Err(e) => return Err(e),
        };

        let out: Vec<Value> = hits
            .iter()
            .map(|h| {
                json!({
                    "text": h.text.chars().take(SNIPPET_MAX_CHARS).collect::<String>(),
                    "source": h.metadata.source,
                    "page": h.metadata.page,
                    "score": h.score,
                })
            })
            .collect();
        Ok(ToolResult { output: Value::Array(out).to_string() })
    }
}

/// Debug tool: current corpus paths, scope, and index presence.
pub struct CorpusInfoTool {
    corpus: Arc<CorpusManager>,
    scope: SharedScope,
}

impl CorpusInfoTool {
    pub fn new(corpus: Arc<CorpusManager>, scope: SharedScope) -> Self {
        Self { corpus, scope }
    }
}

#[async_trait]
impl Tool for CorpusInfoTool {
    fn name(&self) -> &str {
        "corpus_info"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "corpus_info".into(),
            description: "Report the corpus index location, resources directory, current retrieval scope, and whether the index exists.".into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, _arguments: &str) -> Result<ToolResult> {
        let scope = match &*self.scope.read().await {
            RetrievalScope::Corpus => json!({ "mode": "corpus" }),
            RetrievalScope::File(path) => {
                json!({ "mode": "file", "file": path.display().to_string() })
            }
        };
        let output = json!({
            "index": self.corpus.index_dir().display().to_string(),
            "resources": self.corpus.resources_dir().display().to_string(),
            "scope": scope,
            "index_exists": VectorIndex::exists(self.corpus.index_dir()),
        });
        Ok(ToolResult { output: output.to_string() })
    }
}
