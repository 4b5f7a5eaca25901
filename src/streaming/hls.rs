//! On-demand HLS renditions cached on disk.
//!
//! A rendition lives in `hls/{id}/` and exists exactly when
//! `hls/{id}/output.m3u8` does. Builds are encoded into a private staging
//! directory and renamed into place on success, so a published directory is
//! always complete and a failed build leaves nothing behind. Concurrent first
//! requests for one id share a single encode.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mediavault_av::actions::PLAYLIST_NAME;
use mediavault_av::{hls_transcode_job, EncoderGateway, HlsSettings, ToolRegistry};
use mediavault_common::{Error, MediaId, Result};

use super::single_flight::SingleFlight;
use crate::sandbox::SafePathResolver;

/// A published rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsRendition {
    pub playlist: PathBuf,
    pub directory: PathBuf,
}

/// Builds and looks up HLS renditions keyed by media id.
pub struct HlsCacheManager {
    hls_root: PathBuf,
    resolver: Arc<SafePathResolver>,
    tools: Arc<ToolRegistry>,
    gateway: Arc<dyn EncoderGateway>,
    settings: HlsSettings,
    flights: SingleFlight<MediaId, HlsRendition>,
}

impl HlsCacheManager {
    pub fn new(
        hls_root: impl Into<PathBuf>,
        resolver: Arc<SafePathResolver>,
        tools: Arc<ToolRegistry>,
        gateway: Arc<dyn EncoderGateway>,
        settings: HlsSettings,
    ) -> Self {
        Self {
            hls_root: hls_root.into(),
            resolver,
            tools,
            gateway,
            settings,
            flights: SingleFlight::new(),
        }
    }

    /// Directory holding the rendition for `id`.
    pub fn rendition_dir(&self, id: MediaId) -> PathBuf {
        self.hls_root.join(id.to_string())
    }

    /// Return the rendition for `id`, encoding it from `locator` if absent.
    ///
    /// The source must resolve inside the video root even on a cache hit.
    pub async fn ensure_rendition(&self, id: MediaId, locator: &str) -> Result<HlsRendition> {
        let source = self.resolver.resolve(locator)?;

        let directory = self.rendition_dir(id);
        let playlist = directory.join(PLAYLIST_NAME);
        if playlist.is_file() {
            tracing::debug!(media_id = %id, "HLS cache hit");
            return Ok(HlsRendition {
                playlist,
                directory,
            });
        }

        tracing::info!(media_id = %id, source = %source.display(), "HLS cache miss, encoding");

        let build = BuildRendition {
            id,
            source,
            hls_root: self.hls_root.clone(),
            directory,
            tools: Arc::clone(&self.tools),
            gateway: Arc::clone(&self.gateway),
            settings: self.settings.clone(),
        };
        self.flights.run(id, move || build.run()).await
    }

    /// Path of a segment in the rendition for `id`.
    ///
    /// Names must be plain file names; anything that could address another
    /// directory is rejected before touching the filesystem.
    pub fn segment_path(&self, id: MediaId, name: &str) -> Result<PathBuf> {
        validate_segment_name(name)?;
        let path = self.rendition_dir(id).join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::not_found("segment", format!("{id}/{name}")))
        }
    }

    /// Number of encodes currently running.
    pub fn builds_in_flight(&self) -> usize {
        self.flights.in_flight()
    }
}

/// Reject segment names that are not a single plain file name.
pub fn validate_segment_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
        || name.contains('\0')
    {
        return Err(Error::bad_request(format!("invalid segment name: {name:?}")));
    }
    Ok(())
}

/// Owned state for one detached encode.
struct BuildRendition {
    id: MediaId,
    source: PathBuf,
    hls_root: PathBuf,
    directory: PathBuf,
    tools: Arc<ToolRegistry>,
    gateway: Arc<dyn EncoderGateway>,
    settings: HlsSettings,
}

impl BuildRendition {
    async fn run(self) -> Result<HlsRendition> {
        let playlist = self.directory.join(PLAYLIST_NAME);

        // A flight that finished just before this one started may have
        // published already.
        if playlist.is_file() {
            return Ok(HlsRendition {
                playlist,
                directory: self.directory,
            });
        }

        let ffmpeg = self.tools.require("ffmpeg")?.path.clone();

        tokio::fs::create_dir_all(&self.hls_root).await?;
        let staging = self
            .hls_root
            .join(format!(".{}.staging-{}", self.id, uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&staging).await?;

        let result = self.encode_and_publish(&ffmpeg, &staging).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(media_id = %self.id, staging = %staging.display(), error = %e, "Failed to remove staging directory");
                }
            }
        }
        result
    }

    async fn encode_and_publish(&self, ffmpeg: &Path, staging: &Path) -> Result<HlsRendition> {
        let job = hls_transcode_job(ffmpeg, &self.source, staging, &self.settings);
        let started = std::time::Instant::now();

        if let Err(e) = self.gateway.run(job).await {
            tracing::error!(media_id = %self.id, error = %e, "HLS encode failed");
            return Err(e);
        }

        let staged_playlist = staging.join(PLAYLIST_NAME);
        let produced = tokio::fs::metadata(&staged_playlist)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(Error::transcode(
                "ffmpeg",
                format!(
                    "encoder exited successfully but wrote no playlist to {}",
                    staged_playlist.display()
                ),
            ));
        }

        // Leftovers from an interrupted older layout would block the rename.
        if tokio::fs::metadata(&self.directory).await.is_ok() {
            tokio::fs::remove_dir_all(&self.directory).await?;
        }
        tokio::fs::rename(staging, &self.directory).await?;

        tracing::info!(
            media_id = %self.id,
            elapsed = ?started.elapsed(),
            "HLS rendition published"
        );

        Ok(HlsRendition {
            playlist: self.directory.join(PLAYLIST_NAME),
            directory: self.directory.clone(),
        })
    }
}
