#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF text extraction into line streams.
//!
//! C&P forms are only published as PDFs. This crate pulls the text out of
//! each page with pure-Rust extraction ([`pdf_extract`]), splits it into
//! lines, trims every line, and concatenates the pages in order. The result
//! is the flat line list the field extractor walks.

use std::path::Path;

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads a PDF file and returns its text as trimmed lines, page by page.
///
/// # Errors
///
/// * [`PdfError::Io`] if the file cannot be read
/// * [`PdfError::Extraction`] if the PDF cannot be decoded
pub fn lines_from_pdf(path: &Path) -> Result<Vec<String>, PdfError> {
    let bytes = std::fs::read(path)?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    lines_from_pdf_bytes(&bytes)
}

/// Extracts trimmed lines from an in-memory PDF.
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the PDF cannot be decoded.
pub fn lines_from_pdf_bytes(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

    log::debug!("Extracted text from {} page(s)", pages.len());

    Ok(merge_pages(&pages))
}

/// Splits a plain-text dump into trimmed lines (treated as one page).
#[must_use]
pub fn lines_from_text(text: &str) -> Vec<String> {
    merge_pages(&[text])
}

/// Splits each page on `\n`, trims every line, and concatenates the pages
/// in order.
///
/// Blank lines are kept; the extractor treats them as filler.
#[must_use]
pub fn merge_pages<S: AsRef<str>>(pages: &[S]) -> Vec<String> {
    pages
        .iter()
        .flat_map(|page| page.as_ref().split('\n'))
        .map(|line| line.trim().to_owned())
        .collect()
}
