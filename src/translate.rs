//! Translation entry points.
//!
//! [`translate_pdf`] runs the whole pipeline: credential check, input
//! resolution, extraction, chunked translation and rendering. The output file
//! is only written at the very end, in one atomic rename, so a failure at any
//! earlier step leaves nothing behind at the output path.
//!
//! The `_with` variants take a caller-supplied [`ChunkTranslator`] instead of
//! building an LLM provider from the configuration.

use crate::config::TranslationConfig;
use crate::error::PdfTranslateError;
use crate::output::{DocumentMetadata, RenderReport, TextTranslation, TranslationOutput, TranslationStats};
use crate::pipeline::chunk::split_into_chunks;
use crate::pipeline::extract::{self, ExtractedDocument};
use crate::pipeline::input::PdfSource;
use crate::pipeline::llm::{self, ChunkTranslator, LlmTranslator};
use crate::pipeline::render;
use crate::provider::resolve_provider;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Translate a PDF file or URL and write the translated PDF to `output`.
///
/// # Errors
/// Fails before touching `input` when no LLM credential is available.
/// Every other failure aborts the run; `output` is never partially written.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf_translate::{translate_pdf, TranslationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TranslationConfig::builder().target_language("German").build()?;
/// let output = translate_pdf("paper.pdf", "paper_German.pdf", &config).await?;
/// eprintln!("{} chunks, {} pages", output.stats.chunk_count, output.stats.output_pages);
/// # Ok(())
/// # }
/// ```
pub async fn translate_pdf(
    input: impl AsRef<str>,
    output: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, PdfTranslateError> {
    config.validate()?;
    let translator = LlmTranslator::new(resolve_provider(config)?);
    translate_pdf_with(&translator, input, output, config).await
}

/// [`translate_pdf`] with a caller-supplied translation backend.
pub async fn translate_pdf_with<T: ChunkTranslator>(
    translator: &T,
    input: impl AsRef<str>,
    output: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, PdfTranslateError> {
    config.validate()?;
    let input = input.as_ref();
    info!("Starting translation: {} → {}", input, config.target_language);

    let source = PdfSource::resolve(input, config.download_timeout_secs).await?;
    // `source` owns any temporary copy and removes it when dropped here.
    run_pipeline(translator, &source, output.as_ref(), config).await
}

/// Translate a PDF held in memory.
///
/// The bytes are spilled to a managed temporary file for pdfium, which is
/// removed on return.
pub async fn translate_pdf_bytes(
    bytes: &[u8],
    output: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, PdfTranslateError> {
    config.validate()?;
    let translator = LlmTranslator::new(resolve_provider(config)?);
    let source = PdfSource::from_bytes(bytes)?;
    run_pipeline(&translator, &source, output.as_ref(), config).await
}

/// Blocking wrapper around [`translate_pdf`].
///
/// Creates a tokio runtime internally; do not call from async code.
pub fn translate_pdf_sync(
    input: impl AsRef<str>,
    output: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, PdfTranslateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfTranslateError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(translate_pdf(input, output, config))
}

/// Translate plain text; no PDF is read or written.
pub async fn translate_text(
    text: &str,
    config: &TranslationConfig,
) -> Result<TextTranslation, PdfTranslateError> {
    config.validate()?;
    let translator = LlmTranslator::new(resolve_provider(config)?);
    translate_text_with(&translator, text, config).await
}

/// [`translate_text`] with a caller-supplied translation backend.
///
/// Blank text fails with [`PdfTranslateError::EmptyDocument`] without a
/// single request.
pub async fn translate_text_with<T: ChunkTranslator>(
    translator: &T,
    text: &str,
    config: &TranslationConfig,
) -> Result<TextTranslation, PdfTranslateError> {
    config.validate()?;
    let text = text.trim();
    if text.is_empty() {
        return Err(PdfTranslateError::EmptyDocument {
            path: PathBuf::from("<text>"),
        });
    }

    let chunks = split_into_chunks(text, config.chunk_size);
    let results = llm::translate_chunks(translator, &chunks, config).await?;
    Ok(TextTranslation {
        translated_text: llm::reassemble(&results),
        chunks: results,
    })
}

/// Render `text` as a PDF at `output` using the layout and punctuation
/// table of `config`. No translation happens.
pub async fn render_text(
    text: &str,
    output: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<RenderReport, PdfTranslateError> {
    let text = text.to_string();
    let path = output.as_ref().to_path_buf();
    let layout = config.layout;
    let punctuation = config.punctuation.clone();

    let report = tokio::task::spawn_blocking(move || {
        render::render_pdf(&text, &path, &layout, &punctuation)
    })
    .await
    .map_err(|e| PdfTranslateError::Internal(format!("Render task panicked: {e}")))??;

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(report.paragraphs_written, report.paragraphs_skipped, report.pages);
    }
    Ok(report)
}

/// Read PDF metadata without translating. Needs no LLM credential.
pub async fn inspect(input: impl AsRef<str>) -> Result<DocumentMetadata, PdfTranslateError> {
    inspect_with(input, &TranslationConfig::default()).await
}

/// [`inspect`] honouring the password and download timeout of `config`.
pub async fn inspect_with(
    input: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<DocumentMetadata, PdfTranslateError> {
    let source = PdfSource::resolve(input.as_ref(), config.download_timeout_secs).await?;
    extract::extract_metadata(source.path(), config.password.as_deref()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline<T: ChunkTranslator>(
    translator: &T,
    source: &PdfSource,
    output: &Path,
    config: &TranslationConfig,
) -> Result<TranslationOutput, PdfTranslateError> {
    let total_start = Instant::now();

    // ── Step 1: Extract ──────────────────────────────────────────────────
    let extract_start = Instant::now();
    let ExtractedDocument { text, metadata } =
        extract::extract_document(source.path(), config.password.as_deref()).await?;
    let source_chars = text.chars().count();
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars from {} pages in {}ms",
        source_chars, metadata.page_count, extract_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(metadata.page_count, source_chars);
    }

    // ── Step 2: Chunk + translate ────────────────────────────────────────
    let translate_start = Instant::now();
    let chunks = split_into_chunks(&text, config.chunk_size);
    debug!("Split into {} chunks of ≤{} chars", chunks.len(), config.chunk_size);
    let results = llm::translate_chunks(translator, &chunks, config).await?;
    let translated_text = llm::reassemble(&results);
    let translate_duration_ms = translate_start.elapsed().as_millis() as u64;
    info!(
        "Translated {} chunks in {}ms",
        results.len(),
        translate_duration_ms
    );

    // ── Step 3: Render + commit ──────────────────────────────────────────
    let render_start = Instant::now();
    let report = render_text(&translated_text, output, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = TranslationStats {
        source_pages: metadata.page_count,
        source_chars,
        chunk_count: results.len(),
        translated_chars: translated_text.chars().count(),
        paragraphs_written: report.paragraphs_written,
        paragraphs_skipped: report.paragraphs_skipped,
        output_pages: report.pages,
        total_input_tokens: results.iter().map(|r| r.input_tokens).sum(),
        total_output_tokens: results.iter().map(|r| r.output_tokens).sum(),
        extract_duration_ms,
        translate_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Translation complete: {} paragraphs ({} skipped) on {} pages → {}, {}ms total",
        stats.paragraphs_written,
        stats.paragraphs_skipped,
        stats.output_pages,
        output.display(),
        stats.total_duration_ms
    );

    Ok(TranslationOutput {
        translated_text,
        chunks: results,
        render: report,
        metadata,
        stats,
    })
}
