use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub thumbnail: ThumbnailConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins (empty = allow any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// On-disk layout: `root` holds `uploads/`, `hls/` and `thumbnails/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./wwwroot")
}
fn default_db_path() -> PathBuf {
    PathBuf::from("./mediavault.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            db_path: default_db_path(),
        }
    }
}

impl StorageConfig {
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn hls_dir(&self) -> PathBuf {
        self.root.join("hls")
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join("thumbnails")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxConfig {
    /// Root for music locators (default: `<storage.root>/uploads`)
    #[serde(default)]
    pub audio_root: Option<PathBuf>,

    /// Root for video locators (default: `<storage.root>/uploads`)
    #[serde(default)]
    pub video_root: Option<PathBuf>,

    /// Match a missing file by partial file-stem when the exact path misses
    #[serde(default = "default_true")]
    pub partial_name_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            audio_root: None,
            video_root: None,
            partial_name_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: u32,

    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Maximum encoder processes running at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_transcode_timeout")]
    pub timeout_secs: u64,
}

fn default_segment_seconds() -> u32 {
    10
}
fn default_crf() -> u8 {
    23
}
fn default_preset() -> String {
    "veryfast".to_string()
}
fn default_audio_codec() -> String {
    "aac".to_string()
}
fn default_max_concurrent() -> usize {
    2
}
fn default_transcode_timeout() -> u64 {
    3600
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            segment_seconds: default_segment_seconds(),
            crf: default_crf(),
            preset: default_preset(),
            audio_codec: default_audio_codec(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_transcode_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    /// Seek position of the extracted frame
    #[serde(default = "default_seek")]
    pub seek: String,

    #[serde(default = "default_thumbnail_timeout")]
    pub timeout_secs: u64,
}

fn default_seek() -> String {
    "00:00:05".to_string()
}
fn default_thumbnail_timeout() -> u64 {
    60
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            seek: default_seek(),
            timeout_secs: default_thumbnail_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Timeout for the HEAD request that types a remote audio URL
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_probe_timeout() -> u64 {
    5
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; MediaVaultBot/1.0)".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload")]
    pub max_bytes: u64,

    /// Lowercase extensions without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_upload() -> u64 {
    50 * 1024 * 1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "mp4", "mp3", "avi", "mov"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Config {
    /// Sandbox root for music locators.
    pub fn audio_root(&self) -> PathBuf {
        self.sandbox
            .audio_root
            .clone()
            .unwrap_or_else(|| self.storage.uploads_dir())
    }

    /// Sandbox root for video locators.
    pub fn video_root(&self) -> PathBuf {
        self.sandbox
            .video_root
            .clone()
            .unwrap_or_else(|| self.storage.uploads_dir())
    }
}
