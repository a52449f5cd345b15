//! Input resolution: turn a path, URL or byte buffer into a local PDF file.
//!
//! pdfium opens documents from a file-system path, so every input ends up as
//! a file on disk. Downloads and in-memory buffers live in temporary storage
//! owned by the [`PdfSource`]; dropping the source deletes them, whether the
//! translation succeeded or not. The `%PDF` magic is checked up front so a
//! wrong file fails with [`PdfTranslateError::NotAPdf`] instead of a pdfium
//! load error.

use crate::error::PdfTranslateError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A readable PDF on the local file system.
#[derive(Debug)]
pub enum PdfSource {
    /// A file the caller already had.
    Local(PathBuf),
    /// Downloaded from a URL; the directory is removed on drop.
    Downloaded { path: PathBuf, _dir: TempDir },
    /// Written from an in-memory buffer; the file is removed on drop.
    Buffered(NamedTempFile),
}

impl PdfSource {
    /// Resolve `input` as a URL (`http://`, `https://`) or a local path.
    pub async fn resolve(input: &str, download_timeout_secs: u64) -> Result<Self, PdfTranslateError> {
        if input.trim().is_empty() {
            return Err(PdfTranslateError::InvalidInput {
                input: input.to_string(),
            });
        }
        if is_url(input) {
            download(input, download_timeout_secs).await
        } else {
            open_local(Path::new(input))
        }
    }

    /// Spill a PDF held in memory to a temporary file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfTranslateError> {
        let mut file = tempfile::Builder::new()
            .prefix("pdf-translate-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| PdfTranslateError::Internal(format!("Failed to create temp file: {e}")))?;
        check_magic(bytes, file.path())?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| PdfTranslateError::Internal(format!("Failed to write temp file: {e}")))?;
        debug!("Buffered {} bytes to {}", bytes.len(), file.path().display());
        Ok(PdfSource::Buffered(file))
    }

    pub fn path(&self) -> &Path {
        match self {
            PdfSource::Local(p) => p,
            PdfSource::Downloaded { path, .. } => path,
            PdfSource::Buffered(file) => file.path(),
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn check_magic(head: &[u8], path: &Path) -> Result<(), PdfTranslateError> {
    if head.len() >= 4 && &head[..4] == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(PdfTranslateError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

fn open_local(path: &Path) -> Result<PdfSource, PdfTranslateError> {
    let path = path.to_path_buf();
    if !path.is_file() {
        return Err(PdfTranslateError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfTranslateError::PermissionDenied { path });
        }
        Err(_) => return Err(PdfTranslateError::FileNotFound { path }),
    };

    let mut head = Vec::with_capacity(4);
    std::io::Read::by_ref(&mut file)
        .take(4)
        .read_to_end(&mut head)
        .map_err(|e| PdfTranslateError::CorruptPdf {
            path: path.clone(),
            detail: e.to_string(),
        })?;
    check_magic(&head, &path)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(PdfSource::Local(path))
}

async fn download(url: &str, timeout_secs: u64) -> Result<PdfSource, PdfTranslateError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| PdfTranslateError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let map_reqwest = |e: reqwest::Error| {
        if e.is_timeout() {
            PdfTranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let mut builder = reqwest::Client::builder();
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    let client = builder.build().map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(map_reqwest)?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(map_reqwest)?;

    let dir = TempDir::new()
        .map_err(|e| PdfTranslateError::Internal(format!("Failed to create temp dir: {e}")))?;
    let path = dir.path().join(filename_from_url(url));
    check_magic(&bytes, &path)?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| PdfTranslateError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(PdfSource::Downloaded { path, _dir: dir })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
