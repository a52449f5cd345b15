//! Progress-callback trait for translation pipeline events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! events as the pipeline extracts, translates each chunk, and renders.
//! The CLI drives its progress bar from these events; a web front-end can
//! forward them to a channel or socket instead.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_translate::{TranslationConfig, TranslationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl TranslationProgressCallback for CountingCallback {
//!     fn on_chunk_complete(&self, chunk_num: usize, total_chunks: usize, translated_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Chunk {}/{} done ({} chars)", chunk_num, total_chunks, translated_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(counter as Arc<dyn TranslationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the translation pipeline as it works through a document.
///
/// All methods have default no-op implementations. When `concurrency > 1`,
/// the chunk events may arrive from several in-flight requests interleaved,
/// so implementations must synchronise shared state.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once text extraction has finished.
    ///
    /// # Arguments
    /// * `page_count`: pages in the source PDF
    /// * `char_count`: characters of extracted text
    fn on_extraction_complete(&self, page_count: usize, char_count: usize) {
        let _ = (page_count, char_count);
    }

    /// Called once before the first chunk request.
    fn on_translation_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before the request for a chunk is sent (1-indexed).
    fn on_chunk_start(&self, chunk_num: usize, total_chunks: usize) {
        let _ = (chunk_num, total_chunks);
    }

    /// Called when a chunk comes back translated.
    ///
    /// # Arguments
    /// * `translated_len`: character count of the cleaned translation
    fn on_chunk_complete(&self, chunk_num: usize, total_chunks: usize, translated_len: usize) {
        let _ = (chunk_num, total_chunks, translated_len);
    }

    /// Called when a chunk request fails. The pipeline aborts afterwards.
    fn on_chunk_error(&self, chunk_num: usize, total_chunks: usize, error: &str) {
        let _ = (chunk_num, total_chunks, error);
    }

    /// Called after the output document has been laid out.
    ///
    /// # Arguments
    /// * `written`: paragraphs placed in the output
    /// * `skipped`: paragraphs that could not be rendered
    /// * `pages`:   pages in the output PDF
    fn on_render_complete(&self, written: usize, skipped: usize, pages: usize) {
        let _ = (written, skipped, pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        total: AtomicUsize,
        skipped: AtomicUsize,
    }

    impl TranslationProgressCallback for TrackingCallback {
        fn on_translation_start(&self, total_chunks: usize) {
            self.total.store(total_chunks, Ordering::SeqCst);
        }

        fn on_chunk_start(&self, _chunk_num: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_complete(&self, _chunk_num: usize, _total: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_error(&self, _chunk_num: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_render_complete(&self, _written: usize, skipped: usize, _pages: usize) {
            self.skipped.store(skipped, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_complete(3, 1200);
        cb.on_translation_start(2);
        cb.on_chunk_start(1, 2);
        cb.on_chunk_complete(1, 2, 42);
        cb.on_chunk_error(2, 2, "boom");
        cb.on_render_complete(5, 0, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_translation_start(3);
        tracker.on_chunk_start(1, 3);
        tracker.on_chunk_complete(1, 3, 100);
        tracker.on_chunk_start(2, 3);
        tracker.on_chunk_error(2, 3, "HTTP 500");
        tracker.on_render_complete(4, 1, 2);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_translation_start(10);
        cb.on_chunk_complete(1, 10, 512);
    }
}
