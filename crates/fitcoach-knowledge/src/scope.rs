//! Per-session retrieval scope.
//!
//! Scope is session state, not process state: each conversation holds its
//! own handle, so concurrent sessions cannot clobber each other's focus.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use fitcoach_core::error::{FitCoachError, Result};

use crate::loader::absolute_str;

/// What the retrieval tools search: the whole corpus, or one file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetrievalScope {
    #[default]
    Corpus,
    File(PathBuf),
}

/// Exact-match source restriction derived from a file scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    /// Absolute path string, compared byte-for-byte against record sources.
    pub source: String,
}

impl RetrievalScope {
    /// Parse a scope request. `mode` is `"corpus"` or `"file"`; the latter
    /// requires a path, resolved to absolute immediately so later matching
    /// is unambiguous.
    pub fn parse(mode: &str, file_path: Option<&str>) -> Result<Self> {
        match mode {
            "corpus" => Ok(Self::Corpus),
            "file" => match file_path {
                Some(p) if !p.trim().is_empty() => {
                    Ok(Self::File(PathBuf::from(absolute_str(Path::new(p)))))
                }
                _ => Err(FitCoachError::InvalidScope(
                    "mode 'file' requires a file_path".into(),
                )),
            },
            other => Err(FitCoachError::InvalidScope(format!(
                "unknown mode '{other}' (expected 'corpus' or 'file')"
            ))),
        }
    }

    /// The source filter this scope implies, if any.
    pub fn filter(&self) -> Option<ScopeFilter> {
        match self {
            Self::Corpus => None,
            Self::File(path) => Some(ScopeFilter { source: path.display().to_string() }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Corpus => "corpus".to_string(),
            Self::File(path) => format!("file: {}", path.display()),
        }
    }
}

/// Shared handle to one session's scope.
pub type SharedScope = Arc<RwLock<RetrievalScope>>;

pub fn shared_scope() -> SharedScope {
    Arc::new(RwLock::new(RetrievalScope::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_ignores_path() {
        assert_eq!(RetrievalScope::parse("corpus", Some("/x.pdf")).unwrap(), RetrievalScope::Corpus);
        assert_eq!(RetrievalScope::parse("corpus", None).unwrap(), RetrievalScope::Corpus);
    }

    #[test]
    fn test_parse_file_requires_path() {
        assert!(matches!(
            RetrievalScope::parse("file", None),
            Err(FitCoachError::InvalidScope(_))
        ));
        assert!(matches!(
            RetrievalScope::parse("file", Some("  ")),
            Err(FitCoachError::InvalidScope(_))
        ));
    }

    #[test]
    fn test_parse_unknown_mode() {
        let err = RetrievalScope::parse("folder", None).unwrap_err();
        assert!(err.to_string().contains("folder"));
    }

    #[test]
    fn test_file_scope_is_absolute() {
        let scope = RetrievalScope::parse("file", Some("docs/plan.pdf")).unwrap();
        let RetrievalScope::File(path) = &scope else { panic!("expected file scope") };
        assert!(path.is_absolute());

        let filter = scope.filter().unwrap();
        assert_eq!(filter.source, path.display().to_string());
    }

    #[test]
    fn test_corpus_has_no_filter() {
        assert!(RetrievalScope::Corpus.filter().is_none());
    }

    #[tokio::test]
    async fn test_sessions_hold_independent_scopes() {
        let a = shared_scope();
        let b = shared_scope();

        *a.write().await = RetrievalScope::parse("file", Some("/tmp/a.pdf")).unwrap();
        assert_eq!(*b.read().await, RetrievalScope::Corpus);
        assert_ne!(*a.read().await, *b.read().await);
    }
}
