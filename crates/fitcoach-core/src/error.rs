//! Error taxonomy for FitCoach.
//!
//! Configuration and input errors fail fast; empty-result conditions are NOT
//! errors (tools return explicit sentinels instead); upstream service
//! failures propagate unretried to the caller.

use std::path::PathBuf;

use crate::types::ModelSize;

/// Workspace-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum FitCoachError {
    /// Missing or invalid configuration (deployment name, credential, endpoint).
    #[error("Configuration error: {0}")]
    Config(String),

    /// File extension the loader does not handle.
    #[error("Unsupported file format: .{0}")]
    UnsupportedFormat(String),

    /// Invalid retrieval scope request (bad mode, missing file path).
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Unknown retrieval method string.
    #[error("Unsupported retrieval method: {0}")]
    InvalidMethod(String),

    /// Persisted index artifacts are absent at the expected path.
    #[error("Index missing at {0}")]
    IndexMissing(PathBuf),

    /// A persisted index was built with a different embedding model size.
    #[error("Index model size mismatch: index was built with '{found}', requested '{requested}'")]
    ModelSizeMismatch { found: ModelSize, requested: ModelSize },

    /// Embedding dimensionality does not match the index.
    #[error("Embedding dimension mismatch: index has {index_dims}, got {query_dims}")]
    DimensionMismatch { index_dims: usize, query_dims: usize },

    /// Nothing left to index after filtering empty chunks.
    #[error("No chunks to persist")]
    NoChunks,

    /// The resources directory contains no supported files.
    #[error("Resources directory is empty: {0}")]
    EmptyResources(PathBuf),

    /// PDF parsing failure.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// OCR engine failure (engine unavailable, raster failure — not empty text).
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Embedding API failure.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Chat model API failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Tool execution failure.
    #[error("Tool error: {0}")]
    Tool(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FitCoachError>;
