//! On-demand video thumbnails cached as `thumbnails/{id}.jpg`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mediavault_av::{thumbnail_job, EncoderGateway, ThumbnailSettings, ToolRegistry};
use mediavault_common::{Error, MediaId, Result};

use super::single_flight::SingleFlight;

pub struct ThumbnailCacheManager {
    dir: PathBuf,
    tools: Arc<ToolRegistry>,
    gateway: Arc<dyn EncoderGateway>,
    settings: ThumbnailSettings,
    flights: SingleFlight<MediaId, PathBuf>,
}

impl ThumbnailCacheManager {
    pub fn new(
        dir: impl Into<PathBuf>,
        tools: Arc<ToolRegistry>,
        gateway: Arc<dyn EncoderGateway>,
        settings: ThumbnailSettings,
    ) -> Self {
        Self {
            dir: dir.into(),
            tools,
            gateway,
            settings,
            flights: SingleFlight::new(),
        }
    }

    pub fn target_path(&self, id: MediaId) -> PathBuf {
        self.dir.join(format!("{id}.jpg"))
    }

    /// Public URL of the thumbnail, whether or not it exists yet.
    pub fn public_url(id: MediaId) -> String {
        format!("/thumbnails/{id}.jpg")
    }

    pub fn exists(&self, id: MediaId) -> bool {
        self.target_path(id).is_file()
    }

    /// Extract one frame of `source` into the cache unless it is already there.
    ///
    /// `source` must already be a sandbox-resolved path.
    pub async fn ensure(&self, id: MediaId, source: &Path) -> Result<PathBuf> {
        let target = self.target_path(id);
        if target.is_file() {
            return Ok(target);
        }

        let ffmpeg = self.tools.require("ffmpeg")?.path.clone();
        let dir = self.dir.clone();
        let source = source.to_path_buf();
        let gateway = Arc::clone(&self.gateway);
        let settings = self.settings.clone();

        self.flights
            .run(id, move || async move {
                if target.is_file() {
                    return Ok(target);
                }
                tokio::fs::create_dir_all(&dir).await?;

                // ffmpeg picks the image muxer from the extension.
                let staging = dir.join(format!(".{id}-{}.jpg", uuid::Uuid::new_v4()));
                let job = thumbnail_job(&ffmpeg, &source, &staging, &settings);

                let outcome = gateway.run(job).await;
                let produced = staging.is_file();
                match outcome {
                    Ok(_) if produced => {
                        if let Err(e) = tokio::fs::rename(&staging, &target).await {
                            let _ = tokio::fs::remove_file(&staging).await;
                            return Err(e.into());
                        }
                        tracing::debug!(media_id = %id, "Thumbnail generated");
                        Ok(target)
                    }
                    Ok(_) => Err(Error::transcode(
                        "ffmpeg",
                        "encoder exited successfully but wrote no thumbnail",
                    )),
                    Err(e) => {
                        if produced {
                            let _ = tokio::fs::remove_file(&staging).await;
                        }
                        Err(e)
                    }
                }
            })
            .await
    }

    /// [`ensure`](Self::ensure), with failures logged and swallowed.
    pub async fn ensure_best_effort(&self, id: MediaId, source: &Path) -> bool {
        match self.ensure(id, source).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(media_id = %id, error = %e, "Thumbnail generation failed");
                false
            }
        }
    }
}
