//! Playback descriptors returned to clients.

use serde::{Deserialize, Serialize};

/// How a client should play a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackType {
    /// A single YouTube video.
    Youtube,
    /// A YouTube playlist.
    YoutubePlaylist,
    /// A channel's playlists page on YouTube.
    YoutubeChannelPage,
    /// A direct HTTP(S) URL to a media file on another host.
    RemoteUrl,
    /// A file on local storage served by this process.
    LocalStream,
}

impl PlaybackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "YOUTUBE",
            Self::YoutubePlaylist => "YOUTUBE_PLAYLIST",
            Self::YoutubeChannelPage => "YOUTUBE_CHANNEL_PAGE",
            Self::RemoteUrl => "REMOTE_URL",
            Self::LocalStream => "LOCAL_STREAM",
        }
    }

    /// Whether the item is hosted on YouTube in any form.
    pub fn is_youtube(&self) -> bool {
        matches!(
            self,
            Self::Youtube | Self::YoutubePlaylist | Self::YoutubeChannelPage
        )
    }
}

impl std::fmt::Display for PlaybackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `play-info` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackDescriptor {
    #[serde(rename = "type")]
    pub kind: PlaybackType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thumbnail_url: Option<String>,
}

impl PlaybackDescriptor {
    pub fn new(kind: PlaybackType, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            thumbnail_url: None,
        }
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }
}
