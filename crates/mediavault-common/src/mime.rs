//! Content-type detection and the audio/video allow-lists.
//!
//! Local files are typed by extension only. Remote URLs are typed by the
//! `Content-Type` their host reports, which is checked against the same
//! allow-lists after stripping any parameters.

use crate::MediaKind;
use std::path::Path;

/// MIME type used when an extension is not in the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension to content-type table.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
    ("m4a", "audio/mp4"),
    ("webm", "audio/webm"),
    ("wma", "audio/x-ms-wma"),
    ("aiff", "audio/x-aiff"),
    ("mka", "audio/x-matroska"),
    ("mp4", "video/mp4"),
    ("mkv", "video/x-matroska"),
    ("ogv", "video/ogg"),
    ("avi", "video/x-msvideo"),
    ("wmv", "video/x-ms-wmv"),
    ("mov", "video/quicktime"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    ("ts", "video/MP2T"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Content types accepted for music entries.
const AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/flac",
    "audio/aac",
    "audio/mp4",
    "audio/webm",
    "audio/x-ms-wma",
    "audio/x-aiff",
    "audio/x-matroska",
];

/// Content types accepted for video entries.
///
/// `.webm` maps to `audio/webm` by extension, so `audio/webm` is allowed here
/// as well; a webm container is the common case for browser-recorded video.
const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "audio/webm",
    "video/x-matroska",
    "video/ogg",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/quicktime",
    "video/x-flv",
    "video/3gpp",
];

/// HLS playlist content type.
pub const HLS_PLAYLIST: &str = "application/vnd.apple.mpegurl";

/// HLS transport-stream segment content type.
pub const HLS_SEGMENT: &str = "video/MP2T";

/// Look up the content type for a path by its extension.
///
/// Unknown or missing extensions yield [`OCTET_STREAM`].
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediavault_common::mime::mime_for_path;
///
/// assert_eq!(mime_for_path(Path::new("song.MP3")), "audio/mpeg");
/// assert_eq!(mime_for_path(Path::new("setup.exe")), "application/octet-stream");
/// ```
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| {
            EXTENSION_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(OCTET_STREAM)
}

/// Strip parameters (`; charset=...`) and lowercase a content-type header value.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check a content type against the music allow-list.
pub fn is_supported_audio(content_type: &str) -> bool {
    let essence = essence(content_type);
    AUDIO_TYPES.iter().any(|t| t.eq_ignore_ascii_case(&essence))
}

/// Check a content type against the video allow-list.
pub fn is_supported_video(content_type: &str) -> bool {
    let essence = essence(content_type);
    VIDEO_TYPES.iter().any(|t| t.eq_ignore_ascii_case(&essence))
}

/// Check a content type against the allow-list for `kind`.
pub fn is_supported(kind: MediaKind, content_type: &str) -> bool {
    match kind {
        MediaKind::Audio => is_supported_audio(content_type),
        MediaKind::Video => is_supported_video(content_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_extensions_case_insensitively() {
        assert_eq!(mime_for_path(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("/x/y/B.FLAC")), "audio/flac");
        assert_eq!(mime_for_path(Path::new("movie.mkv")), "video/x-matroska");
        assert_eq!(mime_for_path(Path::new("clip.3gp")), "video/3gpp");
        assert_eq!(mime_for_path(Path::new("output3.ts")), HLS_SEGMENT);
        assert_eq!(mime_for_path(Path::new("output.m3u8")), HLS_PLAYLIST);
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(mime_for_path(Path::new("setup.exe")), OCTET_STREAM);
        assert_eq!(mime_for_path(Path::new("README")), OCTET_STREAM);
        assert!(!is_supported(MediaKind::Audio, OCTET_STREAM));
        assert!(!is_supported(MediaKind::Video, OCTET_STREAM));
    }

    #[test]
    fn audio_allow_list() {
        assert!(is_supported_audio("audio/mpeg"));
        assert!(is_supported_audio("Audio/MPEG; charset=binary"));
        assert!(!is_supported_audio("video/mp4"));
        assert!(!is_supported_audio("text/html"));
    }

    #[test]
    fn video_allow_list() {
        assert!(is_supported_video("video/mp4"));
        assert!(is_supported_video("video/quicktime"));
        assert!(!is_supported_video("audio/mpeg"));
        assert!(!is_supported_video("image/jpeg"));
    }

    #[test]
    fn webm_is_playable_as_video() {
        let mime = mime_for_path(Path::new("recording.webm"));
        assert_eq!(mime, "audio/webm");
        assert!(is_supported(MediaKind::Video, mime));
        assert!(is_supported(MediaKind::Audio, mime));
    }

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(essence("video/MP4 ; codecs=avc1"), "video/mp4");
        assert_eq!(essence(""), "");
    }
}
