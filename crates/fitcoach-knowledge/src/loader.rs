//! Document loader: source discovery, PDF classification, and parsing.
//!
//! A PDF is classified by the ratio of "true" text pages (extractable text
//! longer than 10 chars after trimming) to total pages. Fully-text documents
//! are extracted directly; scanned documents go through the OCR engine one
//! page at a time; mixed documents fall back to direct extraction. CSVs
//! produce one unit per row. Classification is recomputed on every call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fitcoach_core::error::{FitCoachError, Result};

use crate::ocr::OcrEngine;

/// Minimum trimmed text length for a PDF page to count as a text page.
const TEXT_PAGE_MIN_CHARS: usize = 10;

/// Source attribution carried by every unit and inherited by every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    /// Absolute path of the originating file.
    pub source: String,
    /// 1-based page number (PDF only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// 1-based row number (CSV only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Set to "ocr" when the text came from the OCR engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_via: Option<String>,
}

impl UnitMetadata {
    pub fn page(source: impl Into<String>, page: u32) -> Self {
        Self { source: source.into(), page: Some(page), row: None, extracted_via: None }
    }

    pub fn row(source: impl Into<String>, row: usize) -> Self {
        Self { source: source.into(), page: None, row: Some(row), extracted_via: None }
    }
}

/// One page (PDF) or one row (CSV) of extracted text. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub text: String,
    pub metadata: UnitMetadata,
}

/// PDF document classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfKind {
    /// Every page has extractable text.
    Text,
    /// (Almost) no page has extractable text; scanned document.
    Image,
    /// Partially extractable.
    Mixed,
}

/// List every supported file (`.pdf`, `.csv`) under `dir`, recursively,
/// sorted by path. Deterministic for unchanged directory contents.
pub fn list_supported_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(extension_of(p).as_deref(), Some("pdf") | Some("csv")))
        .collect();
    files.sort();
    Ok(files)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase())
}

/// Classify a page ratio into a [`PdfKind`]. Zero-page documents classify
/// as `Text`.
pub fn classify_ratio(text_pages: usize, total_pages: usize, threshold: f64) -> PdfKind {
    if total_pages == 0 {
        return PdfKind::Text;
    }
    let ratio = text_pages as f64 / total_pages as f64;
    if ratio >= 1.0 {
        PdfKind::Text
    } else if ratio <= threshold {
        PdfKind::Image
    } else {
        PdfKind::Mixed
    }
}

/// Open a PDF and classify it by its text-page ratio. A page whose text
/// extraction fails counts as having no text.
pub fn detect_pdf_kind(path: &Path, threshold: f64) -> Result<PdfKind> {
    let doc = lopdf::Document::load(path).map_err(|e| FitCoachError::Pdf(e.to_string()))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let text_pages = pages
        .iter()
        .filter(|&&n| {
            doc.extract_text(&[n]).map(|t| t.trim().len() > TEXT_PAGE_MIN_CHARS).unwrap_or(false)
        })
        .count();
    Ok(classify_ratio(text_pages, pages.len(), threshold))
}

/// Load a file into ordered [`DocumentUnit`]s. Dispatches on extension;
/// anything other than `.pdf`/`.csv` is an unsupported-format error.
pub fn load_document(
    path: &Path,
    ocr: &dyn OcrEngine,
    text_ratio_threshold: f64,
) -> Result<Vec<DocumentUnit>> {
    match extension_of(path).as_deref() {
        Some("pdf") => load_pdf(path, ocr, text_ratio_threshold),
        Some("csv") => load_csv(path),
        other => Err(FitCoachError::UnsupportedFormat(other.unwrap_or("?").to_string())),
    }
}

fn load_pdf(path: &Path, ocr: &dyn OcrEngine, threshold: f64) -> Result<Vec<DocumentUnit>> {
    let kind = detect_pdf_kind(path, threshold)?;
    let source = absolute_str(path);

    match kind {
        PdfKind::Text | PdfKind::Mixed => {
            let doc = lopdf::Document::load(path).map_err(|e| FitCoachError::Pdf(e.to_string()))?;
            let mut units = Vec::new();
            for (&page, _) in doc.get_pages().iter() {
                // Extraction failure on one page yields an empty unit rather
                // than failing the whole document.
                let text = doc.extract_text(&[page]).unwrap_or_default();
                units.push(DocumentUnit { text, metadata: UnitMetadata::page(&source, page) });
            }
            Ok(units)
        }
        PdfKind::Image => {
            let doc = lopdf::Document::load(path).map_err(|e| FitCoachError::Pdf(e.to_string()))?;
            let mut units = Vec::new();
            for (&page, _) in doc.get_pages().iter() {
                // Empty OCR output is a valid (empty) unit, not an error.
                let text = ocr.ocr_page(path, page)?;
                let mut metadata = UnitMetadata::page(&source, page);
                metadata.extracted_via = Some("ocr".into());
                units.push(DocumentUnit { text, metadata });
            }
            tracing::info!(source = %source, pages = units.len(), "extracted scanned PDF via OCR");
            Ok(units)
        }
    }
}

/// One unit per CSV row, rendered as `header: value` lines.
fn load_csv(path: &Path) -> Result<Vec<DocumentUnit>> {
    let source = absolute_str(path);
    let mut reader = csv::Reader::from_path(path).map_err(|e| FitCoachError::Csv(e.to_string()))?;
    let headers = reader.headers().map_err(|e| FitCoachError::Csv(e.to_string()))?.clone();

    let mut units = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| FitCoachError::Csv(e.to_string()))?;
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| format!("{h}: {v}"))
            .collect::<Vec<_>>()
            .join("\n");
        units.push(DocumentUnit { text, metadata: UnitMetadata::row(&source, i + 1) });
    }
    Ok(units)
}

/// Resolve to an absolute path string without requiring the file to exist.
pub fn absolute_str(path: &Path) -> String {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::tests::StubOcr;
    use std::fs;

    #[test]
    fn test_classify_ratio_monotonic() {
        // Every page has text
        assert_eq!(classify_ratio(10, 10, 0.1), PdfKind::Text);
        // No page has text
        assert_eq!(classify_ratio(0, 10, 0.1), PdfKind::Image);
        // At the threshold exactly: still image
        assert_eq!(classify_ratio(1, 10, 0.1), PdfKind::Image);
        // Strictly between threshold and 1.0
        assert_eq!(classify_ratio(5, 10, 0.1), PdfKind::Mixed);
        assert_eq!(classify_ratio(9, 10, 0.1), PdfKind::Mixed);
        // Empty document defaults to text
        assert_eq!(classify_ratio(0, 0, 0.1), PdfKind::Text);
    }

    #[test]
    fn test_list_supported_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        fs::write(dir.path().join("a.csv"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.PDF"), b"x").unwrap();

        let files = list_supported_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.pdf", "sub/c.PDF"]);

        // Deterministic across runs
        assert_eq!(files, list_supported_files(dir.path()).unwrap());
    }

    #[test]
    fn test_unsupported_extension_errors() {
        let err = load_document(Path::new("plan.docx"), &StubOcr::default(), 0.1).unwrap_err();
        assert!(matches!(err, FitCoachError::UnsupportedFormat(ref ext) if ext == "docx"));
    }

    #[test]
    fn test_load_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.csv");
        fs::write(&path, "name,muscle\nBarbell Row,Back\nFront Squat,Legs\n").unwrap();

        let units = load_document(&path, &StubOcr::default(), 0.1).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text, "name: Barbell Row\nmuscle: Back");
        assert_eq!(units[0].metadata.row, Some(1));
        assert_eq!(units[1].metadata.row, Some(2));
        assert!(units[0].metadata.page.is_none());
        assert_eq!(units[0].metadata.source, absolute_str(&path));
    }

    #[test]
    fn test_detect_pdf_kind_blank_pages_classify_image() {
        // A PDF whose pages carry no text streams has ratio 0.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_blank_pdf(&path, 2);

        assert_eq!(detect_pdf_kind(&path, 0.1).unwrap(), PdfKind::Image);
    }

    #[test]
    fn test_load_scanned_pdf_tags_ocr_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_blank_pdf(&path, 3);

        let ocr = StubOcr::with_text("lifted text");
        let units = load_document(&path, &ocr, 0.1).unwrap();
        assert_eq!(units.len(), 3);
        for (i, u) in units.iter().enumerate() {
            assert_eq!(u.text, "lifted text");
            assert_eq!(u.metadata.page, Some(i as u32 + 1));
            assert_eq!(u.metadata.extracted_via.as_deref(), Some("ocr"));
        }
    }

    #[test]
    fn test_load_scanned_pdf_accepts_empty_ocr_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_blank_pdf(&path, 1);

        let units = load_document(&path, &StubOcr::default(), 0.1).unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].text.is_empty());
        assert_eq!(units[0].metadata.extracted_via.as_deref(), Some("ocr"));
    }

    /// Build a minimal valid PDF with `n` empty pages using lopdf.
    fn write_blank_pdf(path: &Path, n: usize) {
        use lopdf::dictionary;
        use lopdf::{Document, Object};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..n)
            .map(|_| {
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                });
                page_id.into()
            })
            .collect();
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }
}
