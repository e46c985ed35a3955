//! # FitCoach Tools
//!
//! Every tool takes one JSON-encoded argument string and returns one
//! JSON-encoded output string, so agents and tools agree on a single wire
//! contract regardless of which side produced the payload.
//!
//! - **fitness** — deterministic calculators (TDEE, macros, exercise
//!   selection, contraindication warnings); pure functions behind the tool
//!   trait
//! - **rag** — corpus retrieval scoped to the current session
//! - **web** — external web search and answer corroboration
//! - **registry** — name-based lookup and per-agent tool allow-lists

pub mod fitness;
pub mod rag;
pub mod registry;
pub mod web;

pub use fitness::{ContraindicationCheckTool, EstimateTdeeTool, ExercisePickerTool, MacroPlanTool};
pub use rag::{CorpusInfoTool, SearchPapersTool};
pub use registry::{ToolRegistry, validate_args};
pub use web::{CorroborateAnswerTool, WebSearchTool};
