//! External tool detection.
//!
//! The [`ToolRegistry`] discovers and caches the location of the encoder
//! executable and provides lookup for the job builders.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mediavault_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

/// A discovered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Human-readable tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `-version` output, if the tool ran.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool locations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools, preferring configured paths over `PATH` lookup.
    ///
    /// An override that does not exist falls back to `PATH`. Tools that are
    /// not found are omitted; [`ToolRegistry::require`] reports them.
    pub fn discover(overrides: &HashMap<String, PathBuf>) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let resolved = match overrides.get(name) {
                Some(p) if p.exists() => Some(p.clone()),
                Some(p) => {
                    tracing::warn!(tool = name, path = %p.display(), "Configured tool path does not exist, searching PATH");
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tools.insert(
                    name.to_string(),
                    ToolConfig {
                        name: name.to_string(),
                        path,
                    },
                );
            }
        }

        Self { tools }
    }

    /// Build a registry with an explicit tool path, skipping discovery.
    #[must_use]
    pub fn with_tool(mut self, name: &str, path: impl AsRef<Path>) -> Self {
        self.tools.insert(
            name.to_string(),
            ToolConfig {
                name: name.to_string(),
                path: path.as_ref().to_path_buf(),
            },
        );
        self
    }

    /// Look up a tool, or fail with a transcode error naming it.
    pub fn require(&self, name: &str) -> Result<&ToolConfig> {
        self.tools.get(name).ok_or_else(|| {
            Error::transcode(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(&cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
