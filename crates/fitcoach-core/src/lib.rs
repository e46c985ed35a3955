//! # FitCoach Core
//!
//! Shared foundation for the FitCoach workspace: configuration, the error
//! taxonomy, chat/tool message types, and the provider/embedder/tool traits
//! every other crate plugs into.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::FitCoachConfig;
pub use error::{FitCoachError, Result};
