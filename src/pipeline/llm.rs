//! Chunk translation: one LLM request per chunk, gathered in chunk order.
//!
//! The backend sits behind [`ChunkTranslator`] so the ordering, timeout and
//! error rules here can be exercised without a network. [`LlmTranslator`] is
//! the production implementation over an `edgequake_llm` provider.
//!
//! ## Scheduling
//!
//! With `concurrency == 1` chunks are translated strictly one after another:
//! chunk `i + 1` is not sent before chunk `i` has answered, and the first
//! failure stops the run. With `concurrency > 1` up to that many requests run
//! through `buffer_unordered`; every result carries its chunk number and the
//! set is sorted before reassembly, so completion order never leaks into the
//! output. Once a chunk fails no further requests are started; the ones
//! already in flight are awaited and the lowest failing chunk number is
//! reported.
//!
//! There is no retry. A failed, timed-out or empty response aborts the
//! translation with [`PdfTranslateError::TranslationService`].

use crate::config::TranslationConfig;
use crate::error::PdfTranslateError;
use crate::output::ChunkResult;
use crate::pipeline::chunk::Chunk;
use crate::pipeline::postprocess;
use crate::prompts;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything needed to translate one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// 1-indexed chunk number.
    pub chunk_num: usize,
    pub total_chunks: usize,
    pub source_text: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

/// Raw answer from a backend, before cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkTranslation {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A backend able to translate one chunk.
///
/// Errors are plain strings; the pipeline wraps them with the chunk position.
pub trait ChunkTranslator: Send + Sync {
    fn translate(
        &self,
        request: &TranslationRequest,
    ) -> impl Future<Output = Result<ChunkTranslation, String>> + Send;
}

/// [`ChunkTranslator`] backed by an `edgequake_llm` chat provider.
#[derive(Clone)]
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmTranslator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }
}

impl ChunkTranslator for LlmTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<ChunkTranslation, String> {
        let messages = vec![
            ChatMessage::system(request.system_prompt.as_str()),
            ChatMessage::user(request.user_prompt.as_str()),
        ];
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| e.to_string())?;

        Ok(ChunkTranslation {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

fn build_options(request: &TranslationRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: request.max_tokens,
        ..Default::default()
    }
}

/// Build the request for every chunk, in chunk order.
pub fn build_requests(chunks: &[Chunk<'_>], config: &TranslationConfig) -> Vec<TranslationRequest> {
    let system_prompt = prompts::system_prompt(
        &config.target_language,
        config.source_language.as_deref(),
        config.system_prompt.as_deref(),
    );

    chunks
        .iter()
        .map(|chunk| TranslationRequest {
            chunk_num: chunk.number(),
            total_chunks: chunk.total,
            source_text: chunk.text.to_string(),
            system_prompt: system_prompt.clone(),
            user_prompt: prompts::chunk_prompt(
                &config.target_language,
                chunk.number(),
                chunk.total,
                chunk.text,
            ),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
        .collect()
}

/// Translate every chunk and return the results sorted by chunk number.
pub async fn translate_chunks<T: ChunkTranslator>(
    translator: &T,
    chunks: &[Chunk<'_>],
    config: &TranslationConfig,
) -> Result<Vec<ChunkResult>, PdfTranslateError> {
    let requests = build_requests(chunks, config);
    let total = requests.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_translation_start(total);
    }
    info!(
        "Translating {} chunks into {} (concurrency {})",
        total, config.target_language, config.concurrency
    );

    if config.concurrency <= 1 {
        let mut results = Vec::with_capacity(total);
        for request in &requests {
            results.push(translate_one(translator, request, config).await?);
        }
        return Ok(results);
    }

    // Set by the first failure; queued chunks see it and are never sent.
    let aborted = AtomicBool::new(false);
    let mut outcomes: Vec<(usize, Option<Result<ChunkResult, PdfTranslateError>>)> =
        stream::iter(requests.iter().map(|request| {
            let aborted = &aborted;
            async move {
                if aborted.load(Ordering::SeqCst) {
                    return (request.chunk_num, None);
                }
                let outcome = translate_one(translator, request, config).await;
                if outcome.is_err() {
                    aborted.store(true, Ordering::SeqCst);
                }
                (request.chunk_num, Some(outcome))
            }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    outcomes.sort_by_key(|(chunk_num, _)| *chunk_num);
    let mut results = Vec::with_capacity(total);
    for (_, outcome) in outcomes {
        match outcome {
            Some(Ok(result)) => results.push(result),
            Some(Err(e)) => return Err(e),
            None => {}
        }
    }
    Ok(results)
}

/// Send one request and turn its answer into a [`ChunkResult`].
async fn translate_one<T: ChunkTranslator>(
    translator: &T,
    request: &TranslationRequest,
    config: &TranslationConfig,
) -> Result<ChunkResult, PdfTranslateError> {
    let chunk_num = request.chunk_num;
    let total = request.total_chunks;
    let source_chars = request.source_text.chars().count();
    let start = Instant::now();

    if let Some(ref cb) = config.progress_callback {
        cb.on_chunk_start(chunk_num, total);
    }

    let outcome = match config.api_timeout_secs {
        0 => translator.translate(request).await,
        secs => tokio::time::timeout(Duration::from_secs(secs), translator.translate(request))
            .await
            .unwrap_or_else(|_| Err(format!("request timed out after {secs}s"))),
    };

    let outcome = outcome.and_then(|raw| {
        let text = if config.clean_output {
            postprocess::clean_translation(&raw.text)
        } else {
            raw.text
        };
        // A blank answer is only acceptable for a blank window.
        if text.trim().is_empty() && !request.source_text.trim().is_empty() {
            Err("malformed response: the model returned no text".to_string())
        } else {
            Ok(ChunkTranslation { text, ..raw })
        }
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(translation) => {
            debug!(
                "Chunk {}/{}: {} input tokens, {} output tokens, {}ms",
                chunk_num, total, translation.input_tokens, translation.output_tokens, duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_chunk_complete(chunk_num, total, translation.text.chars().count());
            }
            Ok(ChunkResult {
                chunk_num,
                source_chars,
                text: translation.text,
                input_tokens: translation.input_tokens,
                output_tokens: translation.output_tokens,
                duration_ms,
            })
        }
        Err(detail) => {
            warn!("Chunk {}/{} failed: {}", chunk_num, total, detail);
            if let Some(ref cb) = config.progress_callback {
                cb.on_chunk_error(chunk_num, total, &detail);
            }
            Err(PdfTranslateError::TranslationService {
                chunk: chunk_num,
                total,
                detail,
            })
        }
    }
}

/// Join translated chunks in order, separated by a blank line.
pub fn reassemble(chunks: &[ChunkResult]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
