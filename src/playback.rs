//! Playback orchestration.
//!
//! [`PlaybackService`] is what the HTTP handlers call. It looks the entry up
//! in the catalog, classifies the locator, and hands local files to the
//! sandbox, MIME checks, the range server or the cache managers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mediavault_av::{EncoderGateway, HlsSettings, ProcessGateway, ThumbnailSettings, ToolRegistry};
use mediavault_common::mime;
use mediavault_common::{Error, MediaId, MediaKind, PlaybackDescriptor, PlaybackType, Result};
use mediavault_db::queries::media;
use mediavault_db::{DbPool, MediaRecord};

use crate::config::Config;
use crate::locator::{classify_shape, LocatorClassifier, LocatorShape};
use crate::sandbox::SafePathResolver;
use crate::streaming::{HlsCacheManager, HlsRendition, ResolvedFile, ThumbnailCacheManager};

pub struct PlaybackService {
    db: DbPool,
    classifier: LocatorClassifier,
    audio: Arc<SafePathResolver>,
    video: Arc<SafePathResolver>,
    hls: HlsCacheManager,
    thumbnails: ThumbnailCacheManager,
}

impl PlaybackService {
    /// Build the service from configuration with the subprocess gateway.
    pub fn from_config(config: &Config, db: DbPool) -> Result<Self> {
        let gateway: Arc<dyn EncoderGateway> =
            Arc::new(ProcessGateway::new(config.transcode.max_concurrent));
        Self::with_gateway(config, db, tool_registry(config), gateway)
    }

    /// Build the service with an explicit tool registry and encoder gateway.
    pub fn with_gateway(
        config: &Config,
        db: DbPool,
        tools: ToolRegistry,
        gateway: Arc<dyn EncoderGateway>,
    ) -> Result<Self> {
        let fallback = config.sandbox.partial_name_fallback;
        let audio = Arc::new(SafePathResolver::new(config.audio_root(), fallback)?);
        let video = Arc::new(SafePathResolver::new(config.video_root(), fallback)?);
        let tools = Arc::new(tools);

        let hls_settings = HlsSettings {
            segment_seconds: config.transcode.segment_seconds,
            crf: config.transcode.crf,
            preset: config.transcode.preset.clone(),
            audio_codec: config.transcode.audio_codec.clone(),
            timeout: Duration::from_secs(config.transcode.timeout_secs),
        };
        let thumbnail_settings = ThumbnailSettings {
            seek: config.thumbnail.seek.clone(),
            timeout: Duration::from_secs(config.thumbnail.timeout_secs),
        };

        Ok(Self {
            db,
            classifier: LocatorClassifier::new(&config.remote)?,
            hls: HlsCacheManager::new(
                config.storage.hls_dir(),
                Arc::clone(&video),
                Arc::clone(&tools),
                Arc::clone(&gateway),
                hls_settings,
            ),
            thumbnails: ThumbnailCacheManager::new(
                config.storage.thumbnails_dir(),
                tools,
                gateway,
                thumbnail_settings,
            ),
            audio,
            video,
        })
    }

    fn resolver(&self, kind: MediaKind) -> &SafePathResolver {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }

    /// Fetch a catalog entry of the given kind.
    pub fn lookup(&self, kind: MediaKind, id: MediaId) -> Result<MediaRecord> {
        let conn = mediavault_db::get_conn(&self.db)?;
        media::get_media_of_kind(&conn, id, kind)?.ok_or_else(|| Error::not_found(kind.as_str(), id))
    }

    /// Describe how to play an entry.
    ///
    /// For local videos a thumbnail is generated first, best-effort; the
    /// descriptor then points at it if it exists.
    pub async fn play_info(&self, kind: MediaKind, id: MediaId) -> Result<PlaybackDescriptor> {
        let record = self.lookup(kind, id)?;
        let mut descriptor = self
            .classifier
            .describe(kind, id, &record.locator, record.thumbnail_url.as_deref())
            .await?;

        if kind == MediaKind::Video && descriptor.kind == PlaybackType::LocalStream {
            match self.video.resolve(&record.locator) {
                Ok(source) => {
                    self.thumbnails.ensure_best_effort(id, &source).await;
                }
                Err(e) => {
                    tracing::warn!(media_id = %id, error = %e, "Skipping thumbnail for unresolvable source");
                }
            }
            if self.thumbnails.exists(id) {
                descriptor.thumbnail_url = Some(ThumbnailCacheManager::public_url(id));
            }
        }

        Ok(descriptor)
    }

    /// Resolve an entry to a streamable local file.
    ///
    /// Only local locators stream through this process; YouTube and remote
    /// entries are played from their own URL.
    pub fn resolve_stream(&self, kind: MediaKind, id: MediaId) -> Result<ResolvedFile> {
        let record = self.lookup(kind, id)?;
        let locator = match classify_shape(&record.locator)? {
            LocatorShape::Local(locator) => locator,
            LocatorShape::YouTube(_) | LocatorShape::Remote(_) => {
                return Err(Error::bad_request(format!(
                    "{kind} {id} is not stored locally; use play-info"
                )))
            }
        };

        let path = self.resolver(kind).resolve(&locator)?;
        let mime_type = mime::mime_for_path(&path);
        if !mime::is_supported(kind, mime_type) {
            return Err(Error::UnsupportedMediaType(format!(
                "{mime_type} is not a supported {kind} type"
            )));
        }

        Ok(ResolvedFile { path, mime_type })
    }

    /// Generate the thumbnail for a local video in the background.
    pub fn schedule_thumbnail(self: &Arc<Self>, id: MediaId, source: PathBuf) {
        if self.thumbnails.exists(id) {
            return;
        }
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.thumbnails.ensure_best_effort(id, &source).await;
        });
    }

    /// Generate the thumbnail for a video, surfacing any failure.
    pub async fn generate_thumbnail(&self, id: MediaId) -> Result<String> {
        let file = self.resolve_stream(MediaKind::Video, id)?;
        self.thumbnails.ensure(id, &file.path).await?;
        Ok(ThumbnailCacheManager::public_url(id))
    }

    /// Return the HLS rendition for a video, encoding it on first request.
    pub async fn hls_playlist(&self, id: MediaId) -> Result<HlsRendition> {
        let record = self.lookup(MediaKind::Video, id)?;
        match classify_shape(&record.locator)? {
            LocatorShape::Local(locator) => self.hls.ensure_rendition(id, &locator).await,
            LocatorShape::YouTube(_) | LocatorShape::Remote(_) => Err(Error::bad_request(format!(
                "video {id} is not stored locally; HLS is only built for local files"
            ))),
        }
    }

    /// Look up a segment of an already built rendition.
    pub fn hls_segment(&self, id: MediaId, name: &str) -> Result<PathBuf> {
        self.hls.segment_path(id, name)
    }

    pub fn hls(&self) -> &HlsCacheManager {
        &self.hls
    }

    pub fn thumbnails(&self) -> &ThumbnailCacheManager {
        &self.thumbnails
    }
}

/// Discover external tools, honouring the configured ffmpeg path.
pub fn tool_registry(config: &Config) -> ToolRegistry {
    let mut overrides = std::collections::HashMap::new();
    if let Some(path) = &config.tools.ffmpeg_path {
        overrides.insert("ffmpeg".to_string(), path.clone());
    }
    ToolRegistry::discover(&overrides)
}
