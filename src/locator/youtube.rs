//! YouTube locator recognition.
//!
//! A locator counts as YouTube when it is an absolute URL whose host mentions
//! `youtube.com` or `youtu.be`. Within that family the video id wins over a
//! playlist id, which wins over a channel's playlists page.

use std::sync::LazyLock;

use mediavault_common::{Error, PlaybackDescriptor, PlaybackType, Result};
use regex::Regex;
use reqwest::Url;

/// Positional forms carrying an 11-character video id: `youtu.be/`, `v/`,
/// `u/<c>/`, `embed/`, `watch?v=` and `&v=`.
static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]{11}).*")
        .expect("video id pattern is a valid literal")
});

static PLAYLIST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]list=([^#&]+)").expect("playlist pattern is a valid literal")
});

static CHANNEL_PLAYLISTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.youtube\.com/@[^/]+/playlists$")
        .expect("channel page pattern is a valid literal")
});

/// Whether `locator` is an absolute URL on a YouTube host.
pub fn is_youtube_url(locator: &str) -> bool {
    Url::parse(locator.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host.contains("youtube.com") || host.contains("youtu.be"))
}

/// Extract the 11-character video id.
pub fn extract_video_id(locator: &str) -> Option<&str> {
    VIDEO_ID
        .captures(locator)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

/// Extract the value of the `list=` query parameter.
pub fn extract_playlist_id(locator: &str) -> Option<&str> {
    PLAYLIST_ID
        .captures(locator)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether `locator` is a channel's playlists page (`/@handle/playlists`).
pub fn is_channel_playlists_page(locator: &str) -> bool {
    CHANNEL_PLAYLISTS.is_match(locator)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}

/// Build the descriptor for a locator already known to be on a YouTube host.
pub fn describe(locator: &str) -> Result<PlaybackDescriptor> {
    let locator = locator.trim();

    if let Some(id) = extract_video_id(locator) {
        return Ok(PlaybackDescriptor::new(PlaybackType::Youtube, watch_url(id))
            .with_thumbnail(Some(thumbnail_url(id))));
    }

    if let Some(list) = extract_playlist_id(locator) {
        return Ok(PlaybackDescriptor::new(
            PlaybackType::YoutubePlaylist,
            playlist_url(list),
        ));
    }

    if is_channel_playlists_page(locator) {
        return Ok(PlaybackDescriptor::new(
            PlaybackType::YoutubeChannelPage,
            locator,
        ));
    }

    Err(Error::InvalidLocator("invalid YouTube URL format".into()))
}
