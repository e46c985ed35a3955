//! # FitCoach Knowledge
//!
//! The document-grounded retrieval layer:
//!
//! - **loader** — classifies and parses PDFs (text / scanned / mixed) and
//!   CSVs into page- or row-level text units with source metadata
//! - **chunker** — deterministic fixed-size chunking with overlap
//! - **index** — embedding-backed vector index with similarity, threshold,
//!   and max-marginal-relevance queries plus exact-match source filtering
//! - **scope** — per-session corpus vs. single-file retrieval scope
//! - **corpus** — lazy, idempotent maintenance of the aggregate corpus index
//!
//! Nearest-neighbor search is brute-force cosine over the persisted records;
//! the index is small (a personal document corpus, not a database).

pub mod chunker;
pub mod corpus;
pub mod index;
pub mod loader;
pub mod ocr;
pub mod scope;

pub use chunker::{Chunk, chunk_units};
pub use corpus::CorpusManager;
pub use index::{IndexCache, QueryMethod, SearchHit, VectorIndex};
pub use loader::{DocumentUnit, UnitMetadata, list_supported_files, load_document};
pub use ocr::{OcrEngine, PopplerTesseract};
pub use scope::{RetrievalScope, ScopeFilter, SharedScope};
