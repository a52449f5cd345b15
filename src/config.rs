//! Configuration types for PDF translation.
//!
//! All translation behaviour is controlled through [`TranslationConfig`],
//! built via its [`TranslationConfigBuilder`]. The service client is never
//! global state: it is either passed in through
//! [`TranslationConfigBuilder::provider`] or constructed from the named
//! provider when a translation starts.

use crate::error::PdfTranslateError;
use crate::progress::ProgressCallback;
use crate::substitutions::PunctuationTable;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 15_000;

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a PDF translation.
///
/// # Example
/// ```rust
/// use edgequake_pdf_translate::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .target_language("Spanish")
///     .chunk_size(10_000)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Language to translate into, by name (e.g. "Spanish"). Default: "Spanish".
    pub target_language: String,

    /// Language of the source document. `None` lets the model detect it.
    pub source_language: Option<String>,

    /// Maximum characters per translation request. Default: 15 000.
    ///
    /// Chunks are cut at plain character offsets and may split words.
    pub chunk_size: usize,

    /// Number of chunk requests in flight. Default: 1 (strictly sequential).
    ///
    /// Values above 1 run a bounded worker pool; results are still
    /// reassembled in chunk order.
    pub concurrency: usize,

    /// LLM model identifier. If None, the chosen provider's default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per chunk. Default: provider default.
    pub max_tokens: Option<usize>,

    /// Per-request timeout in seconds. 0 disables it. Default: 0.
    pub api_timeout_secs: u64,

    /// Custom system prompt. `{language}` is replaced with the target language.
    pub system_prompt: Option<String>,

    /// Strip fences and invisible characters from model responses. Default: true.
    pub clean_output: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Output page geometry and typography.
    pub layout: PageLayout,

    /// Characters replaced before rendering.
    pub punctuation: PunctuationTable,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: "Spanish".to_string(),
            source_language: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: 1,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: None,
            api_timeout_secs: 0,
            system_prompt: None,
            clean_output: true,
            password: None,
            download_timeout_secs: 120,
            layout: PageLayout::default(),
            punctuation: PunctuationTable::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("target_language", &self.target_language)
            .field("source_language", &self.source_language)
            .field("chunk_size", &self.chunk_size)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("clean_output", &self.clean_output)
            .field("layout", &self.layout)
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the invariants the builder enforces.
    pub fn validate(&self) -> Result<(), PdfTranslateError> {
        if self.target_language.trim().is_empty() {
            return Err(PdfTranslateError::InvalidConfig(
                "Target language must not be empty".into(),
            ));
        }
        if let Some(ref source) = self.source_language {
            if source.trim().eq_ignore_ascii_case(self.target_language.trim()) {
                return Err(PdfTranslateError::InvalidConfig(format!(
                    "Source and target language are both '{}'",
                    self.target_language
                )));
            }
        }
        if self.chunk_size == 0 {
            return Err(PdfTranslateError::InvalidConfig(
                "Chunk size must be ≥ 1 character".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(PdfTranslateError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        self.layout.validate()
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn target_language(mut self, language: impl Into<String>) -> Self {
        self.config.target_language = language.into();
        self
    }

    pub fn source_language(mut self, language: impl Into<String>) -> Self {
        self.config.source_language = Some(language.into());
        self
    }

    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn font_size(mut self, pt: f32) -> Self {
        self.config.layout.font_size = pt;
        self
    }

    pub fn punctuation(mut self, table: PunctuationTable) -> Self {
        self.config.punctuation = table;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, PdfTranslateError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Page layout ──────────────────────────────────────────────────────────

/// Geometry and typography of the output PDF, in PDF points (1/72 inch).
///
/// Defaults: A4 portrait, 1 cm side/top margins, 1.5 cm bottom margin,
/// 11 pt Helvetica on a 6 mm line, 4 mm gap after each paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub paragraph_gap: f32,
}

const MM: f32 = 72.0 / 25.4;

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_width: 210.0 * MM,
            page_height: 297.0 * MM,
            margin_left: 10.0 * MM,
            margin_right: 10.0 * MM,
            margin_top: 10.0 * MM,
            margin_bottom: 15.0 * MM,
            font_size: 11.0,
            line_height: 6.0 * MM,
            paragraph_gap: 4.0 * MM,
        }
    }
}

impl PageLayout {
    /// US Letter with the default margins and typography.
    pub fn letter() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            ..Self::default()
        }
    }

    /// Width available for text between the side margins.
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// y coordinate of the top of the text area.
    pub fn content_top(&self) -> f32 {
        self.page_height - self.margin_top
    }

    pub fn validate(&self) -> Result<(), PdfTranslateError> {
        let fields = [
            ("page width", self.page_width),
            ("page height", self.page_height),
            ("left margin", self.margin_left),
            ("right margin", self.margin_right),
            ("top margin", self.margin_top),
            ("bottom margin", self.margin_bottom),
            ("font size", self.font_size),
            ("line height", self.line_height),
            ("paragraph gap", self.paragraph_gap),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(PdfTranslateError::InvalidConfig(format!(
                "Layout {name} must be a finite, non-negative number (got {value})"
            )));
        }
        if self.font_size <= 0.0 || self.line_height <= 0.0 {
            return Err(PdfTranslateError::InvalidConfig(
                "Font size and line height must be positive".into(),
            ));
        }
        if self.content_width() < self.font_size {
            return Err(PdfTranslateError::InvalidConfig(format!(
                "Side margins leave {:.1}pt for text; need at least {:.1}pt",
                self.content_width(),
                self.font_size
            )));
        }
        if self.page_height - self.margin_top - self.margin_bottom < self.line_height {
            return Err(PdfTranslateError::InvalidConfig(
                "Top and bottom margins leave no room for a line of text".into(),
            ));
        }
        Ok(())
    }
}
