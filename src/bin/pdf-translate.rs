//! CLI binary for edgequake-pdf-translate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_translate::{
    inspect_with, translate_pdf, ProgressCallback, TranslationConfig, TranslationProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the PDF is read, then a bar over the
/// translation chunks with one log line per chunk.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Extracting text…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, chunk_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&chunk_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_extraction_complete(&self, page_count: usize, char_count: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracted {char_count} characters from {page_count} pages"))
        ));
    }

    fn on_translation_start(&self, total_chunks: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_chunks as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Translating");
        self.bar.reset_eta();
    }

    fn on_chunk_start(&self, chunk_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(chunk_num, Instant::now());
        }
        self.bar.set_message(format!("chunk {chunk_num}"));
    }

    fn on_chunk_complete(&self, chunk_num: usize, total: usize, translated_len: usize) {
        let secs = self.elapsed_secs(chunk_num);
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            chunk_num,
            total,
            dim(&format!("{translated_len:>6} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, chunk_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(chunk_num);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}  {}",
            red("✗"),
            chunk_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_render_complete(&self, written: usize, skipped: usize, pages: usize) {
        self.bar.finish_and_clear();
        eprintln!("{}", render_summary(written, skipped, pages));
    }
}

/// One-line render outcome; skip reasons are listed separately.
fn render_summary(written: usize, skipped: usize, pages: usize) -> String {
    if skipped == 0 {
        format!(
            "{} {} paragraphs rendered on {} pages",
            green("✔"),
            bold(&written.to_string()),
            pages
        )
    } else {
        format!(
            "{} {} paragraphs rendered on {} pages  ({} skipped)",
            cyan("⚠"),
            bold(&written.to_string()),
            pages,
            red(&skipped.to_string()),
        )
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate into Spanish (default), writes report_Spanish.pdf
  pdf-translate report.pdf

  # Translate into German with an explicit output path
  pdf-translate report.pdf -t German -o out/report_de.pdf

  # Translate a PDF from a URL with Anthropic
  pdf-translate https://arxiv.org/pdf/1706.03762 -t French --provider anthropic

  # Four requests in flight, smaller chunks
  pdf-translate book.pdf -t Italian --concurrency 4 --chunk-size 8000

  # Keep the translated text and a JSON report
  pdf-translate paper.pdf --save-text paper.txt --json > report.json

  # Inspect PDF metadata (no API key needed)
  pdf-translate --inspect-only document.pdf

OUTPUT FONT:
  The output PDF uses built-in Helvetica (Latin-1). Curly quotes, dashes and
  ellipses are replaced with ASCII. Paragraphs containing other characters
  (CJK, Cyrillic, Greek, emoji, ...) are skipped and counted in the report.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  MISTRAL_API_KEY         Mistral API key
  EDGEQUAKE_LLM_PROVIDER  Provider used when --provider is not given
  EDGEQUAKE_MODEL         Model used with EDGEQUAKE_LLM_PROVIDER
  PDFIUM_LIB_PATH         Path to the pdfium shared library
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Translate PDF documents into another language using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-translate",
    version,
    about = "Translate PDF documents into another language using LLMs",
    long_about = "Extract the text of a PDF (local file or URL), translate it chunk by chunk \
with an LLM, and write the translation as a new PDF. Supports OpenAI, Anthropic, Google Gemini, \
Mistral, Azure OpenAI and local models through Ollama or LM Studio.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output PDF path. Default: <input-stem>_<language>.pdf (lowercase language) in the current directory.
    #[arg(short, long, env = "PDF_TRANSLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Target language, by name.
    #[arg(short = 't', long = "target-language", env = "PDF_TRANSLATE_TARGET_LANGUAGE", default_value = "Spanish")]
    target_language: String,

    /// Source language; detected by the model when omitted.
    #[arg(long, env = "PDF_TRANSLATE_SOURCE_LANGUAGE")]
    source_language: Option<String>,

    /// LLM provider: openai, anthropic, gemini, mistral, azure, ollama, lmstudio.
    #[arg(
        long,
        env = "PDF_TRANSLATE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set."
    )]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4o-mini, claude-3-5-haiku-latest).
    #[arg(long, env = "PDF_TRANSLATE_MODEL")]
    model: Option<String>,

    /// Maximum characters per translation request.
    #[arg(long, env = "PDF_TRANSLATE_CHUNK_SIZE", default_value_t = edgequake_pdf_translate::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Number of translation requests in flight (1 = sequential).
    #[arg(short, long, env = "PDF_TRANSLATE_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF_TRANSLATE_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per chunk. Default: provider default.
    #[arg(long, env = "PDF_TRANSLATE_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_TRANSLATE_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt ({language} is substituted).
    #[arg(long, env = "PDF_TRANSLATE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Per-request LLM timeout in seconds (0 = none).
    #[arg(long, env = "PDF_TRANSLATE_API_TIMEOUT", default_value_t = 0)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_TRANSLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output font size in points.
    #[arg(long, env = "PDF_TRANSLATE_FONT_SIZE", default_value_t = 11.0)]
    font_size: f32,

    /// Also write the translated text to this file.
    #[arg(long, env = "PDF_TRANSLATE_SAVE_TEXT")]
    save_text: Option<PathBuf>,

    /// Print the full report (TranslationOutput) as JSON on stdout.
    #[arg(long, env = "PDF_TRANSLATE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_TRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no translation.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_TRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_TRANSLATE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would tear the progress bar, so they are hidden while it runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None).await?;
        let meta = inspect_with(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, &config.target_language));

    // ── Run translation ──────────────────────────────────────────────────
    let output = translate_pdf(&cli.input, &output_path, &config)
        .await
        .context("Translation failed")?;

    if let Some(ref text_path) = cli.save_text {
        tokio::fs::write(text_path, &output.translated_text)
            .await
            .with_context(|| format!("Failed to write translated text to {}", text_path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &output.stats;
        if !show_progress && !cli.json {
            eprintln!(
                "Rendered {} paragraphs ({} skipped) on {} pages",
                stats.paragraphs_written, stats.paragraphs_skipped, stats.output_pages
            );
        }
        if !cli.json {
            eprintln!(
                "{}  {} chunks  {}ms  →  {}",
                if stats.paragraphs_skipped == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                stats.chunk_count,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&stats.total_input_tokens.to_string()),
                dim(&stats.total_output_tokens.to_string()),
            );
            for skipped in &output.render.skipped {
                eprintln!("   {} {}", red("skipped"), skipped);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `TranslationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = TranslationConfig::builder()
        .target_language(&cli.target_language)
        .chunk_size(cli.chunk_size)
        .concurrency(cli.concurrency)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .font_size(cli.font_size);

    if let Some(ref lang) = cli.source_language {
        builder = builder.source_language(lang);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `<stem>_<language>.pdf` in the current directory, language lowercased.
fn default_output_path(input: &str, language: &str) -> PathBuf {
    let name = input
        .split(['?', '#'])
        .next()
        .unwrap_or(input)
        .trim_end_matches('/');
    let file_name = Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    // Only a `.pdf` suffix is an extension; arXiv ids keep their dot.
    let stem = match file_name.len().checked_sub(4) {
        Some(cut)
            if file_name.is_char_boundary(cut)
                && file_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &file_name[..cut]
        }
        _ => file_name,
    };
    let stem = if stem.is_empty() { "document" } else { stem };
    let language: String = language
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    PathBuf::from(format!("{stem}_{language}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_from_local_path() {
        assert_eq!(
            default_output_path("docs/report.pdf", "German"),
            PathBuf::from("report_german.pdf")
        );
        assert_eq!(
            default_output_path("SCAN.PDF", "French"),
            PathBuf::from("SCAN_french.pdf")
        );
        assert_eq!(
            default_output_path("notes.v2.pdf", "Italian"),
            PathBuf::from("notes.v2_italian.pdf")
        );
    }

    #[test]
    fn default_output_from_url() {
        assert_eq!(
            default_output_path("https://arxiv.org/pdf/1706.03762?x=1", "Brazilian Portuguese"),
            PathBuf::from("1706.03762_brazilian_portuguese.pdf")
        );
        assert_eq!(
            default_output_path("https://example.com/", "German"),
            PathBuf::from("example.com_german.pdf")
        );
    }

    #[test]
    fn render_summary_does_not_guess_skip_reason() {
        let line = render_summary(3, 2, 1);
        assert!(line.contains("skipped"), "got: {line}");
        assert!(!line.contains("unsupported"), "got: {line}");
        assert!(!render_summary(3, 0, 1).contains("skipped"));
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::try_parse_from(["pdf-translate", "in.pdf"]).unwrap();
        assert_eq!(cli.target_language, "Spanish");
        assert_eq!(cli.chunk_size, 15_000);
        assert_eq!(cli.concurrency, 1);
        assert!(cli.output.is_none());
    }

    #[tokio::test]
    async fn zero_chunk_size_rejected() {
        let cli = Cli::try_parse_from(["pdf-translate", "in.pdf", "--chunk-size", "0"]).unwrap();
        assert!(build_config(&cli, None).await.is_err());
    }

    #[tokio::test]
    async fn flags_reach_config() {
        let cli = Cli::try_parse_from([
            "pdf-translate",
            "in.pdf",
            "-t",
            "German",
            "--source-language",
            "English",
            "--concurrency",
            "4",
            "--font-size",
            "9",
            "--max-tokens",
            "2048",
        ])
        .unwrap();
        let config = build_config(&cli, None).await.unwrap();
        assert_eq!(config.target_language, "German");
        assert_eq!(config.source_language.as_deref(), Some("English"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.layout.font_size, 9.0);
        assert_eq!(config.max_tokens, Some(2048));
    }
}
