//! Sandboxed resolution of local locators.
//!
//! Every file the engine opens for a catalog entry must canonicalize to a
//! descendant of that media kind's root. Escapes are reported as `Forbidden`,
//! never as `NotFound`, so traversal attempts are distinguishable from
//! missing files.

use std::path::{Component, Path, PathBuf};

use mediavault_common::{Error, Result};

/// Maps locators to files inside one sandbox root.
#[derive(Debug, Clone)]
pub struct SafePathResolver {
    root: PathBuf,
    configured_root: PathBuf,
    partial_name_fallback: bool,
}

impl SafePathResolver {
    /// Canonicalize `root` once, creating it if it does not exist yet.
    pub fn new(root: impl AsRef<Path>, partial_name_fallback: bool) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            std::fs::create_dir_all(root)?;
        }
        let configured_root = if root.is_absolute() {
            normalize_lexically(root)
        } else {
            normalize_lexically(&std::env::current_dir()?.join(root))
        };
        Ok(Self {
            root: root.canonicalize()?,
            configured_root,
            partial_name_fallback,
        })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `locator` to an existing regular file under the root.
    ///
    /// Absolute locators must point inside the root. Existing files are judged
    /// by their canonical path, so a root reached through a symlink still
    /// accepts locators spelled with the configured path. Relative locators
    /// are joined to the root; if that misses and partial-name fallback is
    /// enabled, the root's top-level files are searched by file stem.
    pub fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(Error::not_found("file", "empty locator"));
        }

        let requested = Path::new(locator);
        let candidate = if requested.is_absolute() {
            normalize_lexically(requested)
        } else {
            normalize_lexically(&self.root.join(requested))
        };

        if candidate.is_file() {
            return self.confine(locator, &candidate);
        }

        if !is_within(&self.root, &candidate) && !is_within(&self.configured_root, &candidate) {
            tracing::warn!(locator, root = %self.root.display(), "Locator escapes sandbox root");
            return Err(Error::Forbidden(format!(
                "{locator} is outside the media root"
            )));
        }

        if !requested.is_absolute() && self.partial_name_fallback {
            if let Some(found) = self.find_by_partial_name(requested)? {
                tracing::warn!(
                    locator,
                    matched = %found.display(),
                    "Resolved locator by partial file name"
                );
                return self.confine(locator, &found);
            }
        }

        Err(Error::not_found("file", locator))
    }

    /// Canonicalize an existing path and re-check containment, catching
    /// symlinks that point out of the root.
    fn confine(&self, locator: &str, path: &Path) -> Result<PathBuf> {
        let canonical = path.canonicalize()?;
        if !is_within(&self.root, &canonical) {
            tracing::warn!(locator, target = %canonical.display(), "Locator resolves outside sandbox root");
            return Err(Error::Forbidden(format!(
                "{locator} resolves outside the media root"
            )));
        }
        Ok(canonical)
    }

    /// First top-level regular file, in file-name order, whose stem contains
    /// the locator's stem case-insensitively.
    fn find_by_partial_name(&self, requested: &Path) -> Result<Option<PathBuf>> {
        let needle = match requested.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.trim().is_empty() => stem.to_lowercase(),
            _ => return Ok(None),
        };

        let mut names: Vec<(String, PathBuf)> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_lowercase();
                Some((stem, path))
            })
            .collect();
        names.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));

        Ok(names
            .into_iter()
            .find(|(stem, _)| stem.contains(&needle))
            .map(|(_, path)| path))
    }
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` at the filesystem root stays at the root, as the OS does.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Component-wise containment check.
///
/// Comparison ignores case on platforms whose default filesystems do; a
/// plain string prefix would also accept siblings such as `/media-evil`.
pub fn is_within(root: &Path, path: &Path) -> bool {
    let mut path_components = path.components();
    for root_component in root.components() {
        match path_components.next() {
            Some(c) if components_equal(root_component, c) => {}
            _ => return false,
        }
    }
    true
}

fn components_equal(a: Component<'_>, b: Component<'_>) -> bool {
    if cfg!(any(windows, target_os = "macos")) {
        a.as_os_str()
            .to_string_lossy()
            .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
    } else {
        a == b
    }
}
