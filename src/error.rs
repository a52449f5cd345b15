//! Error types for the edgequake-pdf-translate library.
//!
//! Two error types match the two ways a translation can go wrong:
//!
//! * [`PdfTranslateError`]: **Fatal**: the pipeline stops (no credential,
//!   unreadable input, empty document, a chunk the service refused to
//!   translate). Returned as `Err(PdfTranslateError)` from the top-level
//!   `translate*` functions. No output file is left behind.
//!
//! * [`ParagraphError`]: **Non-fatal**: one paragraph of the translated text
//!   could not be rendered into the output PDF. It is skipped, counted, and
//!   listed in [`crate::output::RenderReport`]; the document is still written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-translate library.
#[derive(Debug, Error)]
pub enum PdfTranslateError {
    // ── Credential / config errors ────────────────────────────────────────
    /// No credential is configured for the translation service.
    #[error("No credential configured for translation provider '{provider}'.\n{hint}")]
    MissingCredential { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a usable path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP download of a URL input failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read but does not start with the `%PDF` header.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF structure is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Extraction yielded no text (scanned or image-only PDF).
    #[error("No text could be extracted from '{path}'.\nScanned or image-only PDFs must be OCR'd before translation.")]
    EmptyDocument { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Translation errors ────────────────────────────────────────────────
    /// The translation service failed for one chunk (network, auth, quota,
    /// malformed response, timeout). Aborts the whole document.
    #[error("Translation failed for chunk {chunk}/{total}: {detail}")]
    TranslationService {
        chunk: usize,
        total: usize,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output PDF could not be serialised.
    #[error("Failed to build output PDF: {0}")]
    PdfSerialization(String),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Config,
    Input,
    Extract,
    Translate,
    Render,
    Internal,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Config => "config",
            PipelineStage::Input => "input",
            PipelineStage::Extract => "extract",
            PipelineStage::Translate => "translate",
            PipelineStage::Render => "render",
            PipelineStage::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl PdfTranslateError {
    /// The stage that produced this error.
    pub fn stage(&self) -> PipelineStage {
        use PdfTranslateError::*;
        match self {
            MissingCredential { .. } | InvalidConfig(_) => PipelineStage::Config,
            FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidInput { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. }
            | NotAPdf { .. } => PipelineStage::Input,
            CorruptPdf { .. }
            | PasswordRequired { .. }
            | WrongPassword { .. }
            | EmptyDocument { .. }
            | PdfiumBindingFailed(_) => PipelineStage::Extract,
            TranslationService { .. } => PipelineStage::Translate,
            PdfSerialization(_) | OutputWriteFailed { .. } => PipelineStage::Render,
            Internal(_) => PipelineStage::Internal,
        }
    }

    /// 1-based index of the chunk that failed, for translation errors.
    pub fn failed_chunk(&self) -> Option<usize> {
        match self {
            PdfTranslateError::TranslationService { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}

/// A non-fatal error for a single paragraph of the output document.
///
/// `paragraph` is the 1-based position among the non-empty paragraphs of the
/// translated text.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ParagraphError {
    /// The paragraph contains a character the output font cannot encode.
    #[error("Paragraph {paragraph}: character {ch:?} (U+{code:04X}) is not supported by the output font", code = code_point(.ch))]
    UnsupportedCharacter { paragraph: usize, ch: char },

    /// The paragraph could not be laid out on the page.
    #[error("Paragraph {paragraph}: layout failed: {detail}")]
    Layout { paragraph: usize, detail: String },
}

fn code_point(ch: &char) -> u32 {
    u32::from(*ch)
}

impl ParagraphError {
    pub fn paragraph(&self) -> usize {
        match self {
            ParagraphError::UnsupportedCharacter { paragraph, .. }
            | ParagraphError::Layout { paragraph, .. } => *paragraph,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_service_display_names_chunk() {
        let e = PdfTranslateError::TranslationService {
            chunk: 2,
            total: 3,
            detail: "HTTP 429".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("2/3"), "got: {msg}");
        assert!(msg.contains("HTTP 429"));
        assert_eq!(e.stage(), PipelineStage::Translate);
        assert_eq!(e.failed_chunk(), Some(2));
    }

    #[test]
    fn missing_credential_is_config_stage() {
        let e = PdfTranslateError::MissingCredential {
            provider: "openai".into(),
            hint: "Set OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert_eq!(e.stage(), PipelineStage::Config);
        assert_eq!(e.failed_chunk(), None);
    }

    #[test]
    fn empty_document_is_extract_stage() {
        let e = PdfTranslateError::EmptyDocument {
            path: PathBuf::from("scan.pdf"),
        };
        assert!(e.to_string().contains("scan.pdf"));
        assert_eq!(e.stage(), PipelineStage::Extract);
    }

    #[test]
    fn unsupported_character_display() {
        let e = ParagraphError::UnsupportedCharacter {
            paragraph: 4,
            ch: '漢',
        };
        let msg = e.to_string();
        assert!(msg.contains("Paragraph 4"), "got: {msg}");
        assert!(msg.contains("U+6F22"), "got: {msg}");
        assert_eq!(e.paragraph(), 4);
    }

    #[test]
    fn stage_display() {
        assert_eq!(PipelineStage::Translate.to_string(), "translate");
        assert_eq!(PipelineStage::Render.to_string(), "render");
    }
}
