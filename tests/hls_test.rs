//! Integration tests for on-demand HLS renditions.

mod common;

use std::time::Duration;

use common::TestHarness;
use mediavault_av::EncodeTarget;
use mediavault_common::MediaKind;

#[tokio::test]
async fn first_request_encodes_and_serves_playlist() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");

    let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"],
        "application/vnd.apple.mpegurl"
    );
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("#EXTM3U"));
    assert!(body.contains("output0.ts"));
    assert_eq!(h.gateway.calls(), 1);

    let published = h.hls_dir().join(id.to_string());
    assert!(published.join("output.m3u8").is_file());
    assert!(published.join("output0.ts").is_file());
}

#[tokio::test]
async fn cached_playlist_is_not_reencoded() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");
    let url = format!("http://{addr}/api/videos/{id}/hls/output.m3u8");

    for _ in 0..3 {
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(h.gateway.calls(), 1);
}

#[tokio::test]
async fn repeated_rendition_returns_identical_paths() {
    let h = TestHarness::new();
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");
    let hls = h.ctx.playback.hls();

    let first = hls.ensure_rendition(id, "movie.mp4").await.unwrap();
    let second = hls.ensure_rendition(id, "movie.mp4").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.playlist, first.directory.join("output.m3u8"));
    assert!(first.playlist.is_file());
    assert_eq!(h.gateway.calls(), 1);
}

#[tokio::test]
async fn concurrent_requests_share_one_encode() {
    let (h, addr) = TestHarness::with_server().await;
    h.gateway.set_delay(Duration::from_millis(300));
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");
    let url = format!("http://{addr}/api/videos/{id}/hls/output.m3u8");

    let client = reqwest::Client::new();
    let requests = (0..6).map(|_| client.get(&url).send());
    let responses = futures::future::join_all(requests).await;

    for resp in responses {
        let resp = resp.unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.text().await.unwrap().contains("#EXT-X-ENDLIST"));
    }
    assert_eq!(h.gateway.calls(), 1);
}

#[tokio::test]
async fn different_videos_encode_independently() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("a.mp4", b"a");
    h.write_upload("b.mp4", b"b");
    let a = h.add_media(MediaKind::Video, "a.mp4");
    let b = h.add_media(MediaKind::Video, "b.mp4");

    for id in [a, b] {
        let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(h.gateway.calls(), 2);
}

#[tokio::test]
async fn encode_job_targets_staging_directory() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");

    reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
        .await
        .unwrap();

    let jobs = h.gateway.jobs();
    assert_eq!(jobs.len(), 1);
    let EncodeTarget::HlsPlaylist(target) = &jobs[0].target else {
        panic!("expected an HLS job, got {:?}", jobs[0].target);
    };
    let staging = target.parent().unwrap();
    assert_ne!(staging, h.hls_dir().join(id.to_string()));
    assert!(!staging.exists(), "staging dir should be renamed away");
    assert!(jobs[0].args.iter().any(|a| a == "hls"));
}

#[tokio::test]
async fn segments_are_served_after_build() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");

    reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
        .await
        .unwrap();

    let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output1.ts"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "video/MP2T");
    assert_eq!(resp.bytes().await.unwrap().len(), 188 * 4);
}

#[tokio::test]
async fn segment_before_build_is_404() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");

    let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output0.ts"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn suspicious_segment_names_are_400() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");

    for name in [".hidden.ts", "x..ts", "..%2F..%2Fsecret.ts", "a%5Cb.ts"] {
        let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/{name}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "{name}");
    }
}

#[tokio::test]
async fn encoder_failure_surfaces_and_leaves_nothing_behind() {
    let (h, addr) = TestHarness::with_server().await;
    h.gateway.fail_with("moov atom not found\nmovie.mp4: Invalid data found when processing input");
    h.write_upload("movie.mp4", b"not really a video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");
    let url = format!("http://{addr}/api/videos/{id}/hls/output.m3u8");

    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "server_error");
    assert!(body["error"].as_str().unwrap().contains("Invalid data found"));

    let leftovers: Vec<_> = std::fs::read_dir(h.hls_dir())
        .map(|rd| rd.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "unexpected leftovers: {leftovers:?}");

    // Failures are not cached; the next request encodes again.
    h.gateway.succeed();
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(h.gateway.calls(), 2);
}

#[tokio::test]
async fn traversal_locator_is_rejected_before_encoding() {
    let (h, addr) = TestHarness::with_server().await;
    std::fs::write(h.storage_root().join("outside.mp4"), b"x").unwrap();
    let id = h.add_media(MediaKind::Video, "../outside.mp4");

    let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn remote_video_has_no_hls() {
    let (h, addr) = TestHarness::with_server().await;
    let id = h.add_media(MediaKind::Video, "https://cdn.example.com/movie.mp4");

    let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn missing_ffmpeg_is_server_error() {
    let (h, addr) = TestHarness::without_ffmpeg().serve().await;
    h.write_upload("movie.mp4", b"fake video");
    let id = h.add_media(MediaKind::Video, "movie.mp4");

    let resp = reqwest::get(format!("http://{addr}/api/videos/{id}/hls/output.m3u8"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("ffmpeg not found"));
    assert_eq!(h.gateway.calls(), 0);
}
