//! Index lifecycle: lazy builds, cached loads, forced rebuilds.
//!
//! Two kinds of index share one manager: the whole-corpus index at the
//! configured directory, and one index per (source file, model size) pair
//! in sibling directories named `<slug>__<size>`. Builds are serialized
//! behind one async lock so two callers cannot race to embed the same
//! documents; loads go through the shared [`IndexCache`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use fitcoach_core::config::RagConfig;
use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Embedder;
use fitcoach_core::types::ModelSize;

use crate::chunker::chunk_units;
use crate::index::{IndexCache, VectorIndex};
use crate::loader::{DocumentUnit, list_supported_files, load_document};
use crate::ocr::OcrEngine;

pub struct CorpusManager {
    resources_dir: PathBuf,
    index_dir: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    text_ratio_threshold: f64,
    ocr: Box<dyn OcrEngine>,
    cache: IndexCache,
    build_lock: Mutex<()>,
}

impl CorpusManager {
    pub fn new(rag: &RagConfig, ocr: Box<dyn OcrEngine>) -> Self {
        Self {
            resources_dir: rag.resources_dir.clone(),
            index_dir: rag.index_dir.clone(),
            chunk_size: rag.chunk_size,
            chunk_overlap: rag.chunk_overlap,
            text_ratio_threshold: rag.text_ratio_threshold,
            ocr,
            cache: IndexCache::new(),
            build_lock: Mutex::new(()),
        }
    }

    pub fn resources_dir(&self) -> &std::path::Path {
        &self.resources_dir
    }

    pub fn index_dir(&self) -> &std::path::Path {
        &self.index_dir
    }

    /// Return the corpus index, building it from the resources directory
    /// only when no persisted index exists yet.
    pub async fn ensure_index(&self, embedder: &dyn Embedder) -> Result<Arc<VectorIndex>> {
        let _guard = self.build_lock.lock().await;
        if VectorIndex::exists(&self.index_dir) {
            return self.cache.get_or_load(&self.index_dir, embedder.model_size());
        }
        tracing::info!(dir = %self.index_dir.display(), "corpus index absent, building");
        self.build(embedder).await
    }

    /// Rebuild from scratch, replacing the persisted artifacts and dropping
    /// any cached copy.
    pub async fn rebuild(&self, embedder: &dyn Embedder) -> Result<Arc<VectorIndex>> {
        let _guard = self.build_lock.lock().await;
        self.build(embedder).await
    }

    async fn build(&self, embedder: &dyn Embedder) -> Result<Arc<VectorIndex>> {
        let files = list_supported_files(&self.resources_dir)?;
        if files.is_empty() {
            return Err(FitCoachError::EmptyResources(self.resources_dir.clone()));
        }

        let mut units: Vec<DocumentUnit> = Vec::new();
        for file in &files {
            tracing::debug!(file = %file.display(), "loading document");
            units.extend(load_document(file, self.ocr.as_ref(), self.text_ratio_threshold)?);
        }

        let chunks = chunk_units(&units, self.chunk_size, self.chunk_overlap);
        VectorIndex::build(&chunks, embedder, &self.index_dir).await?;
        self.cache.invalidate(&self.index_dir);
        self.cache.get_or_load(&self.index_dir, embedder.model_size())
    }

    /// Where the single-file index for `file` lives: a sibling of the
    /// corpus directory named `<slug>__<size>`.
    pub fn file_index_dir(&self, file: &Path, size: ModelSize) -> PathBuf {
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
        self.index_root().join(format!("{}__{size}", slugify(stem)))
    }

    /// Return the index for one source file, building it only when no
    /// persisted index exists for that (file, model size) pair.
    pub async fn ensure_file_index(
        &self,
        file: &Path,
        embedder: &dyn Embedder,
    ) -> Result<Arc<VectorIndex>> {
        let _guard = self.build_lock.lock().await;
        let dir = self.file_index_dir(file, embedder.model_size());
        if VectorIndex::exists(&dir) {
            return self.cache.get_or_load(&dir, embedder.model_size());
        }
        tracing::info!(file = %file.display(), dir = %dir.display(), "file index absent, building");
        self.build_file(file, &dir, embedder).await
    }

    /// Rebuild one file's index from scratch.
    pub async fn rebuild_file_index(
        &self,
        file: &Path,
        embedder: &dyn Embedder,
    ) -> Result<Arc<VectorIndex>> {
        let _guard = self.build_lock.lock().await;
        let dir = self.file_index_dir(file, embedder.model_size());
        self.build_file(file, &dir, embedder).await
    }

    async fn build_file(
        &self,
        file: &Path,
        dir: &Path,
        embedder: &dyn Embedder,
    ) -> Result<Arc<VectorIndex>> {
        let units = load_document(file, self.ocr.as_ref(), self.text_ratio_threshold)?;
        let chunks = chunk_units(&units, self.chunk_size, self.chunk_overlap);
        VectorIndex::build(&chunks, embedder, dir).await?;
        self.cache.invalidate(dir);
        self.cache.get_or_load(dir, embedder.model_size())
    }

    fn index_root(&self) -> &Path {
        match self.index_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("vectorstore"),
        }
    }
}

/// Directory-name slug for a file stem: alphanumerics, `-` and `_` kept
/// (lowercased), every other run of characters collapsed to one `_`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
