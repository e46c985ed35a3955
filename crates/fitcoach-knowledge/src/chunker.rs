//! Deterministic fixed-window chunking with overlap.
//!
//! Chunks never cross unit boundaries, so every chunk carries exactly one
//! source page or row. Windows are measured in characters and snapped to
//! char boundaries.

use serde::{Deserialize, Serialize};

use crate::loader::{DocumentUnit, UnitMetadata};

/// One indexable piece of text with inherited source attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: UnitMetadata,
}

/// Split units into chunks of at most `size` chars, consecutive chunks of a
/// unit sharing `overlap` chars. Whitespace-only units produce no chunks.
///
/// An overlap of `size` or more would never advance; it is clamped to
/// `size - 1`.
pub fn chunk_units(units: &[DocumentUnit], size: usize, overlap: usize) -> Vec<Chunk> {
    let size = size.max(1);
    let overlap = overlap.min(size - 1);
    let stride = size - overlap;

    let mut chunks = Vec::new();
    for unit in units {
        if unit.text.trim().is_empty() {
            continue;
        }
        let chars: Vec<char> = unit.text.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            chunks.push(Chunk {
                text: chars[start..end].iter().collect(),
                metadata: unit.metadata.clone(),
            });
            if end == chars.len() {
                break;
            }
            start += stride;
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str) -> DocumentUnit {
        DocumentUnit { text: text.into(), metadata: UnitMetadata::page("/tmp/a.pdf", 1) }
    }

    #[test]
    fn test_chunk_sizes_and_overlap() {
        let text = "abcdefghij"; // 10 chars
        let chunks = chunk_units(&[unit(text)], 4, 2);

        // stride 2: [0..4] [2..6] [4..8] [6..10]
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "cdef", "efgh", "ghij"]);
        for c in &chunks {
            assert!(c.text.chars().count() <= 4);
            assert_eq!(c.metadata, UnitMetadata::page("/tmp/a.pdf", 1));
        }
    }

    #[test]
    fn test_reconstruction_after_stripping_overlap() {
        let text = "The quick brown fox jumps over the lazy dog, twice around the yard.";
        let (size, overlap) = (20, 5);
        let chunks = chunk_units(&[unit(text)], size, overlap);

        let mut rebuilt = chunks[0].text.clone();
        for c in &chunks[1..] {
            rebuilt.extend(c.text.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_short_unit_yields_single_chunk() {
        let chunks = chunk_units(&[unit("short")], 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
    }

    #[test]
    fn test_whitespace_units_skipped() {
        let units = vec![unit("   \n\t "), unit(""), unit("real content")];
        let chunks = chunk_units(&units, 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "real content");
    }

    #[test]
    fn test_chunks_never_cross_units() {
        let units = vec![
            DocumentUnit { text: "page one".into(), metadata: UnitMetadata::page("/a.pdf", 1) },
            DocumentUnit { text: "page two".into(), metadata: UnitMetadata::page("/a.pdf", 2) },
        ];
        let chunks = chunk_units(&units, 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.page, Some(1));
        assert_eq!(chunks[1].metadata.page, Some(2));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "héllo wörld émoji 🏋️ done";
        let chunks = chunk_units(&[unit(text)], 7, 3);
        // No panic on char boundaries; content fully covered
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.text.chars().count() <= 7);
        }
        let mut rebuilt = chunks[0].text.clone();
        for c in &chunks[1..] {
            rebuilt.extend(c.text.chars().skip(3));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        // overlap >= size must still terminate
        let chunks = chunk_units(&[unit("abcdef")], 3, 5);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0].text, "abc");
    }

    #[test]
    fn test_deterministic() {
        let units = vec![unit("some content to split repeatedly into stable chunks")];
        let a = chunk_units(&units, 16, 4);
        let b = chunk_units(&units, 16, 4);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.text, y.text);
        }
    }
}
