//! Playback routes.
//!
//! Music and video share the same shape: a play-info descriptor and a
//! byte-range stream. Videos add thumbnails and on-demand HLS.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mediavault_av::actions::PLAYLIST_NAME;
use mediavault_common::{mime, Error, MediaId, MediaKind, PlaybackDescriptor};
use serde::Serialize;

use super::error::AppError;
use super::AppContext;
use crate::streaming::{serve_file, serve_resolved};

/// Create playback routes.
pub fn playback_routes() -> Router<AppContext> {
    Router::new()
        .route("/music/:id/play-info", get(music_play_info))
        .route("/music/:id/stream", get(music_stream))
        .route("/videos/:id/play-info", get(video_play_info))
        .route("/videos/:id/stream", get(video_stream))
        .route("/videos/:id/thumbnail", post(video_thumbnail))
        .route("/videos/:id/hls/:file", get(video_hls))
}

#[derive(Debug, Serialize)]
pub struct ThumbnailResponse {
    pub url: String,
}

/// Catalog ids start at 1; anything else is rejected before a lookup.
fn parse_id(raw: &str) -> Result<MediaId, AppError> {
    match raw.parse::<MediaId>() {
        Ok(id) if id.get() > 0 => Ok(id),
        _ => Err(Error::bad_request(format!("invalid media id: {raw}")).into()),
    }
}

fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::RANGE).and_then(|v| v.to_str().ok())
}

async fn play_info(
    ctx: &AppContext,
    kind: MediaKind,
    raw_id: &str,
) -> Result<Json<PlaybackDescriptor>, AppError> {
    let id = parse_id(raw_id)?;
    let descriptor = ctx.playback.play_info(kind, id).await?;
    Ok(Json(descriptor))
}

async fn music_play_info(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackDescriptor>, AppError> {
    play_info(&ctx, MediaKind::Audio, &id).await
}

async fn video_play_info(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackDescriptor>, AppError> {
    play_info(&ctx, MediaKind::Video, &id).await
}

async fn music_stream(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let file = ctx.playback.resolve_stream(MediaKind::Audio, id)?;
    Ok(serve_resolved(&file, range_header(&headers)).await?)
}

/// Stream a video and kick off its thumbnail in the background.
async fn video_stream(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let file = ctx.playback.resolve_stream(MediaKind::Video, id)?;
    ctx.playback.schedule_thumbnail(id, file.path.clone());
    Ok(serve_resolved(&file, range_header(&headers)).await?)
}

async fn video_thumbnail(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ThumbnailResponse>, AppError> {
    let id = parse_id(&id)?;
    let url = ctx.playback.generate_thumbnail(id).await?;
    Ok(Json(ThumbnailResponse { url }))
}

/// Serve the HLS playlist (building it on first request) or one of its
/// segments.
async fn video_hls(
    State(ctx): State<AppContext>,
    Path((id, file)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    if file == PLAYLIST_NAME {
        let rendition = ctx.playback.hls_playlist(id).await?;
        let mut response = serve_file(&rendition.playlist, mime::HLS_PLAYLIST, None).await?;
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
        return Ok(response.into_response());
    }

    let segment = ctx.playback.hls_segment(id, &file)?;
    Ok(serve_file(&segment, mime::HLS_SEGMENT, range_header(&headers)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_integers() {
        assert_eq!(parse_id("42").unwrap(), MediaId::new(42));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_id_rejects_non_positive() {
        for raw in ["0", "-3"] {
            let err = parse_id(raw).unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST, "{raw}");
        }
    }
}
