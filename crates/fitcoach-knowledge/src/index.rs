//! Embedding-backed vector index.
//!
//! Records live in `index.json` next to a `manifest.json` that pins the
//! embedding model size and dimensionality; loading with a different size
//! is an error, never a silent re-embed. Search is brute-force cosine over
//! all records, optionally restricted to one source file by exact match
//! before ranking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Embedder;
use fitcoach_core::types::ModelSize;

use crate::chunker::Chunk;
use crate::loader::UnitMetadata;
use crate::scope::ScopeFilter;

const INDEX_FILE: &str = "index.json";
const MANIFEST_FILE: &str = "manifest.json";

/// MMR candidate-pool floor.
const MMR_MIN_FETCH: usize = 20;
/// MMR relevance/diversity balance.
const MMR_LAMBDA: f32 = 0.5;

/// How a query ranks candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    /// Top-k by cosine similarity.
    Similarity,
    /// Top-k by cosine similarity, dropping hits below the threshold.
    SimilarityWithThreshold,
    /// Max-marginal-relevance reranking over a wider candidate pool.
    Mmr,
}

impl FromStr for QueryMethod {
    type Err = FitCoachError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "similarity" => Ok(Self::Similarity),
            "similarity_with_threshold" => Ok(Self::SimilarityWithThreshold),
            "mmr" => Ok(Self::Mmr),
            other => Err(FitCoachError::InvalidMethod(other.to_string())),
        }
    }
}

/// One retrieved chunk. `score` is the cosine similarity for the two
/// similarity methods and `None` for MMR, whose rerank values are not
/// comparable to raw similarities.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub metadata: UnitMetadata,
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    vector: Vec<f32>,
    text: String,
    metadata: UnitMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    model_size: ModelSize,
    dimension: usize,
    records: usize,
    built_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct VectorIndex {
    model_size: ModelSize,
    dimension: usize,
    records: Vec<IndexRecord>,
}

impl VectorIndex {
    /// Both artifacts present on disk.
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file() && dir.join(MANIFEST_FILE).is_file()
    }

    /// Embed `chunks` and persist the index under `dir`. Whitespace-only
    /// chunks are dropped first; an input that leaves nothing to embed is
    /// an error.
    pub async fn build(chunks: &[Chunk], embedder: &dyn Embedder, dir: &Path) -> Result<Self> {
        let kept: Vec<&Chunk> = chunks.iter().filter(|c| !c.text.trim().is_empty()).collect();
        if kept.is_empty() {
            return Err(FitCoachError::NoChunks);
        }

        let texts: Vec<String> = kept.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
        for v in &vectors {
            if v.len() != dimension {
                return Err(FitCoachError::Embedding(format!(
                    "Non-uniform embedding dimensions: {} vs {}",
                    dimension,
                    v.len()
                )));
            }
        }

        let records: Vec<IndexRecord> = kept
            .iter()
            .zip(vectors)
            .map(|(c, vector)| IndexRecord {
                vector,
                text: c.text.clone(),
                metadata: c.metadata.clone(),
            })
            .collect();

        let index = Self { model_size: embedder.model_size(), dimension, records };
        index.save(dir)?;
        tracing::info!(
            records = index.records.len(),
            dimension,
            model_size = %index.model_size,
            dir = %dir.display(),
            "vector index built"
        );
        Ok(index)
    }

    fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let manifest = Manifest {
            model_size: self.model_size,
            dimension: self.dimension,
            records: self.records.len(),
            built_at: chrono::Utc::now(),
        };
        std::fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;
        std::fs::write(dir.join(INDEX_FILE), serde_json::to_vec(&self.records)?)?;
        Ok(())
    }

    /// Load a persisted index, verifying it was built with `model_size`.
    pub fn load(dir: &Path, model_size: ModelSize) -> Result<Self> {
        if !Self::exists(dir) {
            return Err(FitCoachError::IndexMissing(dir.to_path_buf()));
        }
        let manifest: Manifest =
            serde_json::from_slice(&std::fs::read(dir.join(MANIFEST_FILE))?)?;
        if manifest.model_size != model_size {
            return Err(FitCoachError::ModelSizeMismatch {
                found: manifest.model_size,
                requested: model_size,
            });
        }
        let records: Vec<IndexRecord> =
            serde_json::from_slice(&std::fs::read(dir.join(INDEX_FILE))?)?;
        Ok(Self { model_size, dimension: manifest.dimension, records })
    }

    pub fn model_size(&self) -> ModelSize {
        self.model_size
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct source paths in the index, sorted.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> =
            self.records.iter().map(|r| r.metadata.source.clone()).collect();
        sources.sort();
        sources.dedup();
        sources
    }

    /// Rank records against a query vector. The filter restricts candidates
    /// before ranking, so a filtered query competes only within one file.
    pub fn query(
        &self,
        query_vec: &[f32],
        k: usize,
        method: QueryMethod,
        filter: Option<&ScopeFilter>,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>> {
        if query_vec.len() != self.dimension {
            return Err(FitCoachError::DimensionMismatch {
                index_dims: self.dimension,
                query_dims: query_vec.len(),
            });
        }

        let candidates: Vec<&IndexRecord> = self
            .records
            .iter()
            .filter(|r| filter.is_none_or(|f| r.metadata.source == f.source))
            .collect();

        let mut scored: Vec<(f32, &IndexRecord)> = candidates
            .iter()
            .map(|r| (cosine_sim(query_vec, &r.vector), *r))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let hits = match method {
            QueryMethod::Similarity => scored
                .into_iter()
                .take(k)
                .map(|(score, r)| SearchHit {
                    text: r.text.clone(),
                    metadata: r.metadata.clone(),
                    score: Some(score),
                })
                .collect(),
            QueryMethod::SimilarityWithThreshold => scored
                .into_iter()
                .take_while(|(score, _)| *score >= score_threshold)
                .take(k)
                .map(|(score, r)| SearchHit {
                    text: r.text.clone(),
                    metadata: r.metadata.clone(),
                    score: Some(score),
                })
                .collect(),
            QueryMethod::Mmr => {
                let fetch_k = (k * 4).max(MMR_MIN_FETCH);
                let pool: Vec<(f32, &IndexRecord)> = scored.into_iter().take(fetch_k).collect();
                mmr_select(&pool, k)
                    .into_iter()
                    .map(|r| SearchHit {
                        text: r.text.clone(),
                        metadata: r.metadata.clone(),
                        score: None,
                    })
                    .collect()
            }
        };
        Ok(hits)
    }
}

/// Greedy max-marginal-relevance selection over a similarity-ranked pool.
fn mmr_select<'a>(pool: &[(f32, &'a IndexRecord)], k: usize) -> Vec<&'a IndexRecord> {
    let mut selected: Vec<&IndexRecord> = Vec::with_capacity(k.min(pool.len()));
    let mut remaining: Vec<(f32, &IndexRecord)> = pool.to_vec();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (i, (relevance, record)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| cosine_sim(&record.vector, &s.vector))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if redundancy.is_finite() { redundancy } else { 0.0 };
            let score = MMR_LAMBDA * relevance - (1.0 - MMR_LAMBDA) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }
        selected.push(remaining.remove(best_idx).1);
    }
    selected
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// Process-wide cache of loaded indexes, keyed by directory and model size.
/// Rebuilds must invalidate their entry so the next read sees fresh records.
#[derive(Default)]
pub struct IndexCache {
    entries: RwLock<HashMap<(PathBuf, ModelSize), Arc<VectorIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, dir: &Path, model_size: ModelSize) -> Result<Arc<VectorIndex>> {
        let key = (dir.to_path_buf(), model_size);
        if let Some(index) = self.entries.read().ok().and_then(|m| m.get(&key).cloned()) {
            return Ok(index);
        }
        let index = Arc::new(VectorIndex::load(dir, model_size)?);
        if let Ok(mut map) = self.entries.write() {
            map.insert(key, index.clone());
        }
        Ok(index)
    }

    pub fn invalidate(&self, dir: &Path) {
        if let Ok(mut map) = self.entries.write() {
            map.retain(|(d, _), _| d.as_path() != dir);
        }
    }
}
