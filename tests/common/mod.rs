//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory catalog, a temporary
//! storage root, a recording [`FakeGateway`] in place of ffmpeg, and the full
//! [`AppContext`]. The [`TestHarness::with_server`] constructors start Axum on
//! a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediavault::config::Config;
use mediavault::playback::PlaybackService;
use mediavault::server::{create_router, AppContext};
use mediavault_av::gateway::failure_message;
use mediavault_av::{EncodeJob, EncodeOutput, EncodeTarget, EncoderGateway, ToolRegistry};
use mediavault_common::{Error, MediaId, MediaKind, Result};
use mediavault_db::queries::media;
use mediavault_db::{init_memory_pool, DbPool, PooledConnection};
use tempfile::TempDir;

/// Minimal JPEG start-of-image marker, enough for a file to exist.
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

/// Stand-in encoder that writes plausible output instead of running ffmpeg.
#[derive(Default)]
pub struct FakeGateway {
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    delay: Mutex<Duration>,
    jobs: Mutex<Vec<EncodeJob>>,
}

impl FakeGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following job fail with this stderr.
    pub fn fail_with(&self, stderr: &str) {
        *self.failure.lock().unwrap() = Some(stderr.to_string());
    }

    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn jobs(&self) -> Vec<EncodeJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EncoderGateway for FakeGateway {
    async fn run(&self, job: EncodeJob) -> Result<EncodeOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job.clone());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(stderr) = failure {
            return Err(Error::transcode(
                job.tool,
                failure_message("exit status: 1", &stderr),
            ));
        }

        match &job.target {
            EncodeTarget::HlsPlaylist(playlist) => {
                let dir = playlist.parent().unwrap();
                for i in 0..3 {
                    tokio::fs::write(dir.join(format!("output{i}.ts")), vec![0x47u8; 188 * 4])
                        .await?;
                }
                let manifest = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n\
                                #EXT-X-MEDIA-SEQUENCE:0\n#EXT-X-PLAYLIST-TYPE:VOD\n\
                                #EXTINF:10.0,\noutput0.ts\n#EXTINF:10.0,\noutput1.ts\n\
                                #EXTINF:4.0,\noutput2.ts\n#EXT-X-ENDLIST\n";
                tokio::fs::write(playlist, manifest).await?;
            }
            EncodeTarget::Thumbnail(path) => {
                tokio::fs::write(path, FAKE_JPEG).await?;
            }
        }

        Ok(EncodeOutput::default())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub config: Config,
    pub gateway: Arc<FakeGateway>,
    _storage: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration and a fake ffmpeg.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    ///
    /// The storage root is always replaced by a fresh temporary directory.
    pub fn with_config(config: Config) -> Self {
        let tools = ToolRegistry::default().with_tool("ffmpeg", "/usr/bin/ffmpeg");
        Self::build(config, tools)
    }

    /// Harness whose tool registry has no ffmpeg at all.
    pub fn without_ffmpeg() -> Self {
        Self::build(Config::default(), ToolRegistry::default())
    }

    fn build(mut config: Config, tools: ToolRegistry) -> Self {
        let storage = TempDir::new().expect("failed to create storage dir");
        config.storage.root = storage.path().to_path_buf();
        std::fs::create_dir_all(config.storage.uploads_dir()).unwrap();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let gateway = Arc::new(FakeGateway::default());
        let playback = PlaybackService::with_gateway(
            &config,
            db.clone(),
            tools,
            Arc::clone(&gateway) as Arc<dyn EncoderGateway>,
        )
        .expect("failed to build playback service");
        let ctx = AppContext::with_playback(config.clone(), playback);

        Self {
            ctx,
            db,
            config,
            gateway,
            _storage: storage,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::with_config(config).serve().await
    }

    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = create_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        self.db.get().expect("failed to get connection")
    }

    pub fn storage_root(&self) -> &Path {
        &self.config.storage.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.config.storage.uploads_dir()
    }

    pub fn hls_dir(&self) -> PathBuf {
        self.config.storage.hls_dir()
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.config.storage.thumbnails_dir()
    }

    /// Write a file into the uploads directory.
    pub fn write_upload(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.uploads_dir().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Insert a catalog entry and return its id.
    pub fn add_media(&self, kind: MediaKind, locator: &str) -> MediaId {
        self.add_media_with_thumbnail(kind, locator, None)
    }

    pub fn add_media_with_thumbnail(
        &self,
        kind: MediaKind,
        locator: &str,
        thumbnail: Option<&str>,
    ) -> MediaId {
        let conn = self.conn();
        media::create_media(&conn, kind, "Test entry", locator, thumbnail)
            .unwrap()
            .id
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
