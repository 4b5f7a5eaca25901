//! Direct file streaming with HTTP range requests.
//!
//! Files are opened read-only (shared with other readers) and streamed in
//! 64 KiB chunks. The handle lives inside the response body, so it is closed
//! when the body finishes, errors, or is dropped on client disconnect.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use mediavault_common::{Error, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Chunk size for streamed bodies.
const CHUNK_SIZE: usize = 64 * 1024;

/// A local file that passed sandbox and MIME checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub mime_type: &'static str,
}

/// Outcome of interpreting a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range: serve everything with 200.
    Full,
    /// Inclusive byte span to serve with 206.
    Partial { start: u64, end: u64 },
    /// Well-formed but outside the file: 416.
    Unsatisfiable,
}

/// Parse an HTTP `Range` header.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500-
/// - bytes=-500 (last 500 bytes)
///
/// Malformed headers and multi-range requests are ignored (full response).
pub fn parse_range_header(header: &str, file_size: u64) -> RangeRequest {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return RangeRequest::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let Ok(suffix_len) = end.parse::<u64>() else {
                return RangeRequest::Full;
            };
            if suffix_len == 0 || file_size == 0 {
                return RangeRequest::Unsatisfiable;
            }
            RangeRequest::Partial {
                start: file_size.saturating_sub(suffix_len),
                end: file_size - 1,
            }
        }
        // bytes=500- (from 500 to end)
        (false, true) => {
            let Ok(start) = start.parse::<u64>() else {
                return RangeRequest::Full;
            };
            if start >= file_size {
                return RangeRequest::Unsatisfiable;
            }
            RangeRequest::Partial {
                start,
                end: file_size - 1,
            }
        }
        // bytes=0-499
        (false, false) => {
            let (Ok(start), Ok(end)) = (start.parse::<u64>(), end.parse::<u64>()) else {
                return RangeRequest::Full;
            };
            if start > end {
                return RangeRequest::Full;
            }
            if start >= file_size {
                return RangeRequest::Unsatisfiable;
            }
            RangeRequest::Partial {
                start,
                end: end.min(file_size - 1),
            }
        }
        // bytes=- (invalid)
        (true, true) => RangeRequest::Full,
    }
}

/// Serve `path` with range support.
pub async fn serve_file(
    path: &Path,
    content_type: &str,
    range_header: Option<&str>,
) -> Result<Response> {
    let mut file = File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::not_found("file", path.display()),
        _ => Error::from(e),
    })?;
    let file_size = file.metadata().await?.len();

    let range = range_header
        .map(|h| parse_range_header(h, file_size))
        .unwrap_or(RangeRequest::Full);

    match range {
        RangeRequest::Unsatisfiable => Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [
                (header::CONTENT_RANGE, format!("bytes */{file_size}")),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            Body::empty(),
        )
            .into_response()),
        RangeRequest::Partial { start, end } => {
            let length = end - start + 1;
            file.seek(SeekFrom::Start(start)).await?;

            let stream = ReaderStream::with_capacity(file.take(length), CHUNK_SIZE);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {start}-{end}/{file_size}"),
                    ),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }
        RangeRequest::Full => {
            let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, file_size.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }
    }
}

/// Serve a resolved local media file.
pub async fn serve_resolved(file: &ResolvedFile, range_header: Option<&str>) -> Result<Response> {
    serve_file(&file.path, file.mime_type, range_header).await
}
