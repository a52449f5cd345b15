//! Pipeline stages for PDF translation.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ llm ──▶ postprocess ──▶ render
//! (URL/path) (pdfium)  (windows) (LLM)   (cleanup)      (lopdf)
//! ```
//!
//! 1. [`input`]   canonicalises the user-supplied path, URL or buffer to a local file
//! 2. [`extract`] pulls page text out with pdfium inside `spawn_blocking`
//! 3. [`chunk`]   cuts the text into fixed character windows
//! 4. [`llm`]     sends one request per window and gathers them in order;
//!    the only stage with network I/O besides URL downloads
//! 5. [`postprocess`] removes response artefacts (fences, zero-width chars)
//! 6. [`render`]  lays the translation out with [`font`] metrics and writes
//!    the new PDF atomically

pub mod chunk;
pub mod extract;
pub mod font;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
