//! Multipart upload route.
//!
//! Files land in the uploads directory as `<uuid>_<original name>` and are
//! then reachable under `/uploads/`. Bytes are streamed to a staging file and
//! renamed into place once complete, so a half-written upload is never
//! visible to the sandbox resolver.

use std::path::{Path, PathBuf};

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use mediavault_common::Error;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::error::AppError;
use super::AppContext;
use crate::config::UploadConfig;

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Slack on top of `max_bytes` for multipart framing.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Create upload routes.
pub fn upload_routes(config: &UploadConfig) -> Router<AppContext> {
    let limit = config.max_bytes.saturating_add(MULTIPART_OVERHEAD);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(limit))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

async fn upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::bad_request(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let uploads = ctx.config.storage.uploads_dir();
        let staging = ctx.config.storage.root.join(".staging");
        let saved_name = store_field(field, &ctx.config.upload, &uploads, &staging).await?;

        tracing::info!(file = %saved_name, "File uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/uploads/{saved_name}"),
            }),
        ));
    }

    Err(Error::bad_request("File is required.").into())
}

/// Validate and persist one file field, returning its stored name.
async fn store_field(
    mut field: Field<'_>,
    config: &UploadConfig,
    uploads: &Path,
    staging: &Path,
) -> Result<String, Error> {
    let original = field
        .file_name()
        .and_then(sanitize_file_name)
        .ok_or_else(|| Error::bad_request("File is required."))?;

    let first = next_chunk(&mut field).await?;
    let Some(first) = first.filter(|c| !c.is_empty()) else {
        return Err(Error::bad_request("File is null or empty."));
    };

    check_extension(&original, &config.allowed_extensions)?;

    let saved_name = format!("{}_{}", uuid::Uuid::new_v4(), original);
    tokio::fs::create_dir_all(uploads).await?;
    tokio::fs::create_dir_all(staging).await?;
    let partial = staging.join(format!("{saved_name}.part"));

    let result = write_chunks(&mut field, first, &partial, config.max_bytes).await;
    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }

    let target: PathBuf = uploads.join(&saved_name);
    if let Err(e) = tokio::fs::rename(&partial, &target).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }

    Ok(saved_name)
}

async fn next_chunk(field: &mut Field<'_>) -> Result<Option<bytes::Bytes>, Error> {
    field
        .chunk()
        .await
        .map_err(|e| Error::bad_request(e.body_text()))
}

async fn write_chunks(
    field: &mut Field<'_>,
    first: bytes::Bytes,
    path: &Path,
    max_bytes: u64,
) -> Result<(), Error> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    let mut chunk = Some(first);

    while let Some(bytes) = chunk {
        written += bytes.len() as u64;
        if written > max_bytes {
            return Err(Error::bad_request(format!(
                "File size exceeds limit of {max_bytes} bytes."
            )));
        }
        file.write_all(&bytes).await?;
        chunk = next_chunk(field).await?;
    }

    file.flush().await?;
    Ok(())
}

/// Keep only the final path component of a client-supplied name.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }
    Some(base.to_string())
}

/// Case-insensitive extension allow-list check.
pub fn check_extension(name: &str, allowed: &[String]) -> Result<(), Error> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) && !extension.is_empty() {
        Ok(())
    } else {
        Err(Error::UnsupportedMediaType(format!(
            "Extension '.{extension}' is not allowed."
        )))
    }
}
