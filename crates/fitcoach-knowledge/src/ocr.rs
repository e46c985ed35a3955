//! OCR engine seam for scanned PDFs.
//!
//! Extraction internals are an external collaborator: the default engine
//! shells out to poppler's `pdftoppm` to rasterize one page and to
//! `tesseract` to read it. An empty result is valid output (a blank page),
//! not an error; only raster or engine failures error.

use std::path::Path;
use std::process::Command;

use fitcoach_core::error::{FitCoachError, Result};

/// Raster resolution for OCR input. 144 dpi is a fixed 2x upscale of the
/// 72 dpi PDF user space.
const OCR_DPI: u32 = 144;

pub trait OcrEngine: Send + Sync {
    /// Extract text from one page (1-based) of a PDF.
    fn ocr_page(&self, pdf: &Path, page: u32) -> Result<String>;
}

/// `pdftoppm` + `tesseract` pipeline.
pub struct PopplerTesseract {
    dpi: u32,
}

impl Default for PopplerTesseract {
    fn default() -> Self {
        Self { dpi: OCR_DPI }
    }
}

impl OcrEngine for PopplerTesseract {
    fn ocr_page(&self, pdf: &Path, page: u32) -> Result<String> {
        let prefix = std::env::temp_dir()
            .join(format!("fitcoach_ocr_{}_{}", std::process::id(), page));

        let raster = Command::new("pdftoppm")
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| FitCoachError::Ocr(format!("pdftoppm failed to start: {e}")))?;

        if !raster.status.success() {
            return Err(FitCoachError::Ocr(format!(
                "pdftoppm failed on page {page}: {}",
                String::from_utf8_lossy(&raster.stderr).trim()
            )));
        }

        let image = prefix.with_extension("png");
        let result = Command::new("tesseract")
            .arg(&image)
            .arg("stdout")
            .output()
            .map_err(|e| FitCoachError::Ocr(format!("tesseract failed to start: {e}")));
        let _ = std::fs::remove_file(&image);
        let output = result?;

        if !output.status.success() {
            return Err(FitCoachError::Ocr(format!(
                "tesseract failed on page {page}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tracing::debug!(page, dpi = self.dpi, "OCR page extracted");
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
