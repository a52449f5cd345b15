//! Offline integration tests for the translation pipeline.
//!
//! A scripted in-process translator stands in for the LLM, so these run
//! without network access or API keys. Tests that need pdfium live in
//! `tests/e2e.rs`.

use edgequake_pdf_translate::pipeline::chunk::split_into_chunks;
use edgequake_pdf_translate::{
    render_text, require_credential, translate_pdf, translate_text_with, ChunkTranslation,
    ChunkTranslator, PdfTranslateError, PipelineStage, TranslationConfig,
    TranslationProgressCallback, TranslationRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns a canned answer per chunk and records every request.
#[derive(Default)]
struct Scripted {
    answers: Vec<Result<String, String>>,
    seen: Mutex<Vec<TranslationRequest>>,
    /// Delay chunk `n` by `(total - n) * step` so later chunks finish first.
    reverse_step_ms: u64,
}

impl Scripted {
    fn answering(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<usize> {
        self.seen.lock().unwrap().iter().map(|r| r.chunk_num).collect()
    }
}

impl ChunkTranslator for Scripted {
    async fn translate(&self, request: &TranslationRequest) -> Result<ChunkTranslation, String> {
        self.seen.lock().unwrap().push(request.clone());
        if self.reverse_step_ms > 0 {
            let steps = (request.total_chunks - request.chunk_num) as u64;
            tokio::time::sleep(Duration::from_millis(steps * self.reverse_step_ms)).await;
        }
        let answer = self
            .answers
            .get(request.chunk_num - 1)
            .cloned()
            .unwrap_or_else(|| Ok(format!("<{}>", request.chunk_num)))?;
        Ok(ChunkTranslation {
            text: answer,
            input_tokens: request.source_text.len() as u64,
            output_tokens: 7,
        })
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    completed: AtomicUsize,
}

impl TranslationProgressCallback for Recorder {
    fn on_translation_start(&self, total_chunks: usize) {
        self.events.lock().unwrap().push(format!("start {total_chunks}"));
    }
    fn on_chunk_complete(&self, chunk_num: usize, _total: usize, _len: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("done {chunk_num}"));
    }
    fn on_chunk_error(&self, chunk_num: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {chunk_num}"));
    }
    fn on_render_complete(&self, written: usize, skipped: usize, pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("render {written}/{skipped}/{pages}"));
    }
}

fn config(chunk_size: usize) -> TranslationConfig {
    TranslationConfig::builder()
        .target_language("Spanish")
        .chunk_size(chunk_size)
        .build()
        .unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn short_text_is_one_call_and_two_blocks() {
    let cfg = config(1000);
    let translator = Scripted::answering(&["Hola mundo.\n\nSegundo párrafo."]);

    let out = translate_text_with(&translator, "Hello world.\n\nSecond paragraph.", &cfg)
        .await
        .unwrap();

    assert_eq!(translator.calls(), vec![1]);
    assert_eq!(out.translated_text, "Hola mundo.\n\nSegundo párrafo.");

    let seen = translator.seen.lock().unwrap();
    assert_eq!(seen[0].source_text, "Hello world.\n\nSecond paragraph.");
    assert!(seen[0].system_prompt.contains("Spanish"));
    assert!(seen[0].user_prompt.contains("part 1 of 1"));
    drop(seen);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let report = render_text(&out.translated_text, &path, &cfg).await.unwrap();
    assert_eq!(report.paragraphs_written, 2);
    assert_eq!(report.paragraphs_skipped, 0);
    assert_eq!(report.pages, 1);
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn long_text_is_three_calls_in_order() {
    let cfg = config(15_000);
    let text = "0123456789".repeat(3_200);
    let chunks = split_into_chunks(&text, 15_000);
    assert_eq!(
        chunks.iter().map(|c| c.char_count()).collect::<Vec<_>>(),
        vec![15_000, 15_000, 2_000]
    );

    let translator = Scripted::answering(&["uno", "dos", "tres"]);
    let out = translate_text_with(&translator, &text, &cfg).await.unwrap();

    assert_eq!(translator.calls(), vec![1, 2, 3]);
    assert_eq!(out.translated_text, "uno\n\ndos\n\ntres");
    assert_eq!(out.total_input_tokens(), 32_000);
    assert_eq!(out.total_output_tokens(), 21);
}

#[tokio::test]
async fn pool_completion_order_does_not_leak() {
    let cfg = TranslationConfig::builder()
        .chunk_size(5)
        .concurrency(4)
        .build()
        .unwrap();
    let translator = Scripted {
        reverse_step_ms: 10,
        ..Default::default()
    };

    let out = translate_text_with(&translator, &"x".repeat(40), &cfg)
        .await
        .unwrap();

    let expected: Vec<String> = (1..=8).map(|n| format!("<{n}>")).collect();
    assert_eq!(out.translated_text, expected.join("\n\n"));
    assert_eq!(
        out.chunks.iter().map(|c| c.chunk_num).collect::<Vec<_>>(),
        (1..=8).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn failing_chunk_reports_its_index() {
    let recorder = Arc::new(Recorder::default());
    let cfg = TranslationConfig::builder()
        .chunk_size(4)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let translator = Scripted {
        answers: vec![Ok("a".into()), Err("HTTP 429 Too Many Requests".into())],
        ..Default::default()
    };

    let err = translate_text_with(&translator, "abcdefghijkl", &cfg)
        .await
        .unwrap_err();

    assert_eq!(err.failed_chunk(), Some(2));
    assert_eq!(err.stage(), PipelineStage::Translate);
    assert!(err.to_string().contains("2/3"), "got: {err}");
    assert!(err.to_string().contains("429"), "got: {err}");
    // Sequential mode never starts chunk 3.
    assert_eq!(translator.calls(), vec![1, 2]);
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["start 3", "done 1", "error 2"]
    );
}

#[tokio::test]
async fn blank_text_is_empty_document_without_calls() {
    let translator = Scripted::default();
    let err = translate_text_with(&translator, "  \n\n \t ", &config(100))
        .await
        .unwrap_err();
    assert!(matches!(err, PdfTranslateError::EmptyDocument { .. }));
    assert!(translator.calls().is_empty());
}

#[tokio::test]
async fn typographic_punctuation_renders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotes.pdf");
    let text = "\u{201C}Hola,\u{201D} dijo \u{2014} \u{2018}adiós\u{2019}\u{2026}";
    let report = render_text(text, &path, &config(100)).await.unwrap();
    assert_eq!(report.paragraphs_written, 1);
    assert_eq!(report.paragraphs_skipped, 0);
}

#[tokio::test]
async fn unrenderable_paragraph_skipped_rest_written() {
    let recorder = Arc::new(Recorder::default());
    let cfg = TranslationConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.pdf");

    let text = "Primer párrafo.\n\nПривет мир\n\nTercer párrafo.\n\n你好";
    let report = render_text(text, &path, &cfg).await.unwrap();

    assert_eq!(report.paragraphs_written, 2);
    assert_eq!(report.paragraphs_skipped, 2);
    assert_eq!(
        report.skipped.iter().map(|e| e.paragraph()).collect::<Vec<_>>(),
        vec![2, 4]
    );
    assert_eq!(report.pages, 1);
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["render 2/2/1".to_string()]
    );
}

#[test]
fn render_text_from_blocking_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("many.pdf");
    let text = (1..=120)
        .map(|i| format!("Paragraph {i} with a little text to wrap."))
        .collect::<Vec<_>>()
        .join("\n\n");

    let report = tokio_test::block_on(render_text(&text, &path, &config(100))).unwrap();

    assert_eq!(report.paragraphs_written, 120);
    assert!(report.pages > 1);
}

#[test]
fn output_serialises_to_json() {
    let out = tokio_test::block_on(translate_text_with(
        &Scripted::answering(&["Hola"]),
        "Hello",
        &config(100),
    ))
    .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["translated_text"], "Hola");
    assert_eq!(json["chunks"][0]["chunk_num"], 1);
}

// ── Credentials ──────────────────────────────────────────────────────────────

#[test]
fn credential_lookup_is_injectable() {
    let err = require_credential("gemini", |_| None).unwrap_err();
    assert!(matches!(err, PdfTranslateError::MissingCredential { .. }));
    assert_eq!(err.stage(), PipelineStage::Config);
    assert!(require_credential("gemini", |_| Some("key".into())).is_ok());
}

#[tokio::test]
async fn missing_credential_reported_before_input() {
    if std::env::var("MISTRAL_API_KEY").is_ok() {
        println!("SKIP: MISTRAL_API_KEY is set");
        return;
    }
    let cfg = TranslationConfig::builder()
        .provider_name("mistral")
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never.pdf");

    let err = translate_pdf("/no/such/input.pdf", &out, &cfg)
        .await
        .unwrap_err();

    // Credential failure wins over the missing input file.
    assert!(matches!(err, PdfTranslateError::MissingCredential { .. }), "got: {err}");
    assert!(!out.exists());
}

#[test]
fn callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Recorder>();
    assert_send_sync::<edgequake_pdf_translate::NoopProgressCallback>();
}
