//! Locator classification.
//!
//! A catalog record carries an opaque locator string. Its shape alone decides
//! how the item is played: a YouTube link, a direct remote URL, or a file
//! under the local sandbox root. Rules are evaluated in that order and the
//! first match wins.

mod remote;
pub mod youtube;

pub use remote::{parse_remote_url, RemoteProbe};

use mediavault_common::mime;
use mediavault_common::{Error, MediaId, MediaKind, PlaybackDescriptor, PlaybackType, Result};
use reqwest::Url;

use crate::config::RemoteConfig;

/// The shape of a locator, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorShape {
    /// Any YouTube form, already turned into its descriptor.
    YouTube(PlaybackDescriptor),
    /// An absolute http(s) URL on another host.
    Remote(Url),
    /// Anything else: a path under the sandbox root.
    Local(String),
}

/// Decide the shape of `locator`.
///
/// An empty locator is `NotFound`; a YouTube URL that carries neither a video
/// id, a playlist nor a channel page is `InvalidLocator`.
pub fn classify_shape(locator: &str) -> Result<LocatorShape> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(Error::not_found("locator", "no locator on record"));
    }

    if youtube::is_youtube_url(locator) {
        return youtube::describe(locator).map(LocatorShape::YouTube);
    }

    if let Some(url) = parse_remote_url(locator) {
        return Ok(LocatorShape::Remote(url));
    }

    Ok(LocatorShape::Local(locator.to_string()))
}

/// The URL clients call to stream a local item.
pub fn local_stream_url(kind: MediaKind, id: MediaId) -> String {
    match kind {
        MediaKind::Audio => format!("/api/music/{id}/stream"),
        MediaKind::Video => format!("/api/videos/{id}/stream"),
    }
}

/// Turns catalog entries into playback descriptors.
#[derive(Debug, Clone)]
pub struct LocatorClassifier {
    probe: RemoteProbe,
}

impl LocatorClassifier {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            probe: RemoteProbe::new(config)?,
        })
    }

    /// Describe how to play an entry.
    ///
    /// Remote audio is HEAD-probed and must report a supported audio type.
    /// Remote video is not probed. Local items get the stream endpoint URL;
    /// the stored thumbnail is passed through for everything but YouTube
    /// videos, which carry their own.
    pub async fn describe(
        &self,
        kind: MediaKind,
        id: MediaId,
        locator: &str,
        stored_thumbnail: Option<&str>,
    ) -> Result<PlaybackDescriptor> {
        let stored = stored_thumbnail.map(str::to_string);

        match classify_shape(locator)? {
            LocatorShape::YouTube(desc) => Ok(desc),
            LocatorShape::Remote(url) => {
                if kind == MediaKind::Audio {
                    let content_type = self.probe.content_type(&url).await;
                    match content_type {
                        Some(ct) if mime::is_supported_audio(&ct) => {}
                        Some(ct) => {
                            return Err(Error::UnsupportedMediaType(format!(
                                "remote content type {ct} is not a supported audio type"
                            )))
                        }
                        None => {
                            return Err(Error::UnsupportedMediaType(
                                "remote content type could not be determined".into(),
                            ))
                        }
                    }
                }
                Ok(PlaybackDescriptor::new(PlaybackType::RemoteUrl, url.as_str())
                    .with_thumbnail(stored))
            }
            LocatorShape::Local(_) => Ok(PlaybackDescriptor::new(
                PlaybackType::LocalStream,
                local_stream_url(kind, id),
            )
            .with_thumbnail(stored)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_locator_is_not_found() {
        for locator in ["", "   ", "\t\n"] {
            let err = classify_shape(locator).unwrap_err();
            assert_eq!(err.kind(), mediavault_common::ErrorKind::NotFound);
        }
    }

    #[test]
    fn youtube_before_remote() {
        let shape = classify_shape("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(matches!(shape, LocatorShape::YouTube(ref d) if d.kind == PlaybackType::Youtube));
    }

    #[test]
    fn invalid_youtube_does_not_fall_through_to_remote() {
        let err = classify_shape("https://www.youtube.com/results?search_query=x").unwrap_err();
        assert_eq!(err.kind(), mediavault_common::ErrorKind::BadRequest);
    }

    #[test]
    fn remote_url() {
        let shape = classify_shape("https://cdn.example.com/track.mp3").unwrap();
        assert!(matches!(shape, LocatorShape::Remote(ref u) if u.host_str() == Some("cdn.example.com")));
    }

    #[test]
    fn everything_else_is_local() {
        for locator in ["clip.mp4", "sub/dir/clip.mp4", "/srv/media/clip.mp4", "../etc/passwd"] {
            assert_eq!(
                classify_shape(locator).unwrap(),
                LocatorShape::Local(locator.to_string())
            );
        }
    }

    #[test]
    fn local_stream_urls() {
        assert_eq!(
            local_stream_url(MediaKind::Audio, MediaId::new(3)),
            "/api/music/3/stream"
        );
        assert_eq!(
            local_stream_url(MediaKind::Video, MediaId::new(7)),
            "/api/videos/7/stream"
        );
    }

    #[tokio::test]
    async fn id_42_youtu_be_scenario() {
        let classifier = LocatorClassifier::new(&RemoteConfig::default()).unwrap();
        let desc = classifier
            .describe(
                MediaKind::Video,
                MediaId::new(42),
                "https://youtu.be/dQw4w9WgXcQ",
                Some("ignored.jpg"),
            )
            .await
            .unwrap();
        assert_eq!(desc.kind, PlaybackType::Youtube);
        assert_eq!(desc.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(
            desc.thumbnail_url.as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg")
        );
    }

    #[tokio::test]
    async fn remote_video_is_not_probed() {
        // Nothing listens on this port; a probe would fail.
        let classifier = LocatorClassifier::new(&RemoteConfig::default()).unwrap();
        let desc = classifier
            .describe(
                MediaKind::Video,
                MediaId::new(1),
                "http://127.0.0.1:9/movie.mp4",
                Some("https://cdn.example.com/poster.jpg"),
            )
            .await
            .unwrap();
        assert_eq!(desc.kind, PlaybackType::RemoteUrl);
        assert_eq!(desc.url, "http://127.0.0.1:9/movie.mp4");
        assert_eq!(
            desc.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/poster.jpg")
        );
    }

    #[tokio::test]
    async fn unreachable_remote_audio_is_unsupported() {
        let config = RemoteConfig {
            probe_timeout_secs: 1,
            ..RemoteConfig::default()
        };
        let classifier = LocatorClassifier::new(&config).unwrap();
        let err = classifier
            .describe(MediaKind::Audio, MediaId::new(1), "http://127.0.0.1:9/a.mp3", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), mediavault_common::ErrorKind::UnsupportedMediaType);
    }
}
