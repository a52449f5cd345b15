//! # edgequake-pdf-translate
//!
//! Translate the text of a PDF into another language with an LLM and write
//! the result as a new, plain-text PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file, URL download or in-memory buffer
//!  ├─ 2. Extract    page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Chunk      fixed windows of ≤ chunk_size characters
//!  ├─ 4. Translate  one LLM request per chunk, reassembled in chunk order
//!  ├─ 5. Render     paragraphs laid out in Helvetica, paginated (lopdf)
//!  └─ 6. Commit     single atomic write of the output PDF
//! ```
//!
//! The output keeps paragraphs and line breaks but not the source layout:
//! no images, tables, columns or fonts are carried over.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_translate::{translate_pdf, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = TranslationConfig::builder()
//!         .target_language("French")
//!         .build()?;
//!     let output = translate_pdf("report.pdf", "report_French.pdf", &config).await?;
//!     eprintln!(
//!         "{} paragraphs written, {} skipped; tokens: {} in / {} out",
//!         output.render.paragraphs_written,
//!         output.render.paragraphs_skipped,
//!         output.stats.total_input_tokens,
//!         output.stats.total_output_tokens
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-translate` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf-translate = { version = "0.1", default-features = false }
//! ```
//!
//! ## Output Font
//!
//! The output uses the built-in Helvetica font, which covers Latin-1 and a
//! few typographic extras. Curly quotes, em-dashes and ellipses are replaced
//! by ASCII (see [`PunctuationTable`]); a paragraph with any other character
//! outside that set (CJK, Cyrillic, emoji, ...) is skipped and reported in
//! [`RenderReport::skipped`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod substitutions;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageLayout, TranslationConfig, TranslationConfigBuilder};
pub use error::{ParagraphError, PdfTranslateError, PipelineStage};
pub use output::{
    ChunkResult, DocumentMetadata, RenderReport, TextTranslation, TranslationOutput,
    TranslationStats,
};
pub use pipeline::llm::{ChunkTranslation, ChunkTranslator, LlmTranslator, TranslationRequest};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use provider::{require_credential, resolve_provider};
pub use substitutions::PunctuationTable;
pub use translate::{
    inspect, inspect_with, render_text, translate_pdf, translate_pdf_bytes, translate_pdf_sync,
    translate_pdf_with, translate_text, translate_text_with,
};
