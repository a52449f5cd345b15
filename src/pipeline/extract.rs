//! Text extraction with pdfium.
//!
//! pdfium is a C++ library with thread-local state, so every call here runs
//! inside `tokio::task::spawn_blocking` and binds its own [`Pdfium`]
//! instance. The library is looked up in this order: the file named by
//! `PDFIUM_LIB_PATH`, the working directory, then the system library path.

use crate::error::PdfTranslateError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text and metadata read from a source PDF.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Page texts joined with blank lines, trimmed. Never empty.
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract the text of every page, in page order.
///
/// Fails with [`PdfTranslateError::EmptyDocument`] when the document has no
/// extractable text (for example a scan without an OCR layer).
pub async fn extract_document(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedDocument, PdfTranslateError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_blocking(&path, password.as_deref()))
        .await
        .map_err(|e| PdfTranslateError::Internal(format!("Extraction task panicked: {e}")))?
}

/// Read document metadata without extracting any text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, PdfTranslateError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path, password.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| PdfTranslateError::Internal(format!("Metadata task panicked: {e}")))?
}

fn extract_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedDocument, PdfTranslateError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    let metadata = read_metadata(&document);
    info!("PDF loaded: {} pages", metadata.page_count);

    let mut page_texts = Vec::with_capacity(metadata.page_count);
    for (index, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| PdfTranslateError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {e:?}", index + 1),
            })?
            .all();
        debug!("Page {}: {} chars", index + 1, text.chars().count());
        page_texts.push(text);
    }

    let text = require_text(join_pages(&page_texts), pdf_path)?;
    Ok(ExtractedDocument { text, metadata })
}

/// Append a blank line after every page and trim the result.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut joined = String::new();
    for page in pages {
        joined.push_str(page.as_ref());
        joined.push_str("\n\n");
    }
    joined.trim().to_string()
}

/// Reject documents with nothing to translate.
pub fn require_text(text: String, pdf_path: &Path) -> Result<String, PdfTranslateError> {
    if text.trim().is_empty() {
        Err(PdfTranslateError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        })
    } else {
        Ok(text)
    }
}

/// Bind to the pdfium shared library.
pub fn bind_pdfium() -> Result<Pdfium, PdfTranslateError> {
    let from_env = std::env::var("PDFIUM_LIB_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .and_then(|path| match Pdfium::bind_to_library(&path) {
            Ok(bindings) => Some(bindings),
            Err(e) => {
                warn!("PDFIUM_LIB_PATH '{}' could not be loaded: {:?}", path, e);
                None
            }
        });

    let bindings = match from_env {
        Some(bindings) => bindings,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfTranslateError::PdfiumBindingFailed(format!("{e:?}")))?,
    };

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfTranslateError> {
    pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path.to_path_buf(), password.is_some()))
}

fn map_load_error(err: PdfiumError, path: PathBuf, had_password: bool) -> PdfTranslateError {
    let password_error = matches!(
        err,
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError)
    );
    match (password_error, had_password) {
        (true, true) => PdfTranslateError::WrongPassword { path },
        (true, false) => PdfTranslateError::PasswordRequired { path },
        (false, _) => PdfTranslateError::CorruptPdf {
            path,
            detail: format!("{err:?}"),
        },
    }
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();
    let tag = |kind: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(kind)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: tag(PdfDocumentMetadataTagType::Title),
        author: tag(PdfDocumentMetadataTagType::Author),
        subject: tag(PdfDocumentMetadataTagType::Subject),
        creator: tag(PdfDocumentMetadataTagType::Creator),
        producer: tag(PdfDocumentMetadataTagType::Producer),
        creation_date: tag(PdfDocumentMetadataTagType::CreationDate),
        modification_date: tag(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}
