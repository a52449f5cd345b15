//! Result types returned by the translation entry points.

use crate::error::ParagraphError;
use serde::{Deserialize, Serialize};

/// Everything a finished translation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// The reassembled translation handed to the renderer.
    pub translated_text: String,
    /// Per-chunk results in chunk order.
    pub chunks: Vec<ChunkResult>,
    /// What the renderer wrote and skipped.
    pub render: RenderReport,
    /// Metadata of the source PDF.
    pub metadata: DocumentMetadata,
    pub stats: TranslationStats,
}

/// Result of a text-only translation (no PDF in or out).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextTranslation {
    pub translated_text: String,
    pub chunks: Vec<ChunkResult>,
}

impl TextTranslation {
    pub fn total_input_tokens(&self) -> u64 {
        self.chunks.iter().map(|c| c.input_tokens).sum()
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.chunks.iter().map(|c| c.output_tokens).sum()
    }
}

/// One translated chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 1-indexed chunk number.
    pub chunk_num: usize,
    /// Characters in the source chunk.
    pub source_chars: usize,
    /// Translated text after cleanup.
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Outcome of rendering the translated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    /// Paragraphs placed in the output.
    pub paragraphs_written: usize,
    /// Paragraphs dropped because they could not be rendered.
    pub paragraphs_skipped: usize,
    /// Pages in the output PDF (at least 1).
    pub pages: usize,
    /// Why each skipped paragraph was dropped.
    pub skipped: Vec<ParagraphError>,
}

/// PDF document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Counters and timings for a full PDF translation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationStats {
    /// Pages in the source PDF.
    pub source_pages: usize,
    /// Characters of extracted text.
    pub source_chars: usize,
    pub chunk_count: usize,
    /// Characters of reassembled translation.
    pub translated_chars: usize,
    pub paragraphs_written: usize,
    pub paragraphs_skipped: usize,
    pub output_pages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub extract_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}
