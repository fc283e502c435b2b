//! In-scope contract sources
//!
//! A [`ContractProject`] is the set of source files under a project root that
//! survive the exclusion rules. It is rebuilt fresh for every pipeline run.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::exclusion::ExclusionSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// A single contract source file.
///
/// Identity is the normalized relative path; the raw bytes are kept as read so
/// that files which are not valid UTF-8 can still be indexed.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    /// Normalized project-relative path (forward slashes, no `./`)
    pub path: String,

    /// Raw file content
    #[serde(skip)]
    pub raw: Vec<u8>,

    /// SHA-256 of the raw content
    pub checksum: String,
}

impl SourceFile {
    /// Create a source file, normalizing its path and hashing its content
    pub fn new(path: impl AsRef<Path>, raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        Self {
            path: normalize_relative(path.as_ref()),
            checksum: compute_checksum(&raw),
            raw,
        }
    }

    /// The content as UTF-8 text
    pub fn text(&self) -> CoreResult<&str> {
        std::str::from_utf8(&self.raw).map_err(|_| CoreError::NonUtf8Source {
            path: self.path.clone(),
        })
    }

    /// Size of the content in bytes
    pub fn byte_size(&self) -> usize {
        self.raw.len()
    }

    /// Number of newline characters in the content
    pub fn line_count(&self) -> usize {
        self.raw.iter().filter(|&&b| b == b'\n').count()
    }
}

/// The in-scope sources of one audit target
#[derive(Debug, Clone)]
pub struct ContractProject {
    root: PathBuf,
    files: BTreeMap<String, SourceFile>,
}

impl ContractProject {
    /// Discover all in-scope sources under `root`.
    ///
    /// Only files with one of `extensions` are considered; excluded paths are
    /// dropped before they are read. Unreadable files are skipped with a
    /// warning.
    pub fn load<S: AsRef<str>>(
        root: &Path,
        exclusions: &ExclusionSet,
        extensions: &[S],
    ) -> CoreResult<Self> {
        if !root.is_dir() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let mut files = BTreeMap::new();
        discover_sources_recursive(root, root, exclusions, extensions, &mut files)?;
        log::debug!(
            "Discovered {} in-scope source files under {}",
            files.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Build a project from already-loaded files; later duplicates of a path
    /// replace earlier ones
    pub fn from_files(root: impl Into<PathBuf>, sources: Vec<SourceFile>) -> Self {
        let files = sources
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect::<BTreeMap<_, _>>();
        Self {
            root: root.into(),
            files,
        }
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterate files in path order
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Look up a file by normalized relative path
    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(path)
    }

    /// Check whether a normalized relative path is in scope
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Normalized paths in lexical order
    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Walk `dir` collecting in-scope sources. Only a failure to read `root`
/// itself is an error; unreadable subdirectories are logged and skipped.
fn discover_sources_recursive<S: AsRef<str>>(
    root: &Path,
    dir: &Path,
    exclusions: &ExclusionSet,
    extensions: &[S],
    files: &mut BTreeMap<String, SourceFile>,
) -> CoreResult<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if dir == root => {
            return Err(CoreError::IoWithPath {
                path: dir.display().to_string(),
                source: e,
            });
        }
        Err(e) => {
            log::warn!("Cannot read directory {}: {}", dir.display(), e);
            return Ok(());
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Cannot read entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = normalize_relative(relative);

        if file_type.is_dir() {
            if exclusions.is_excluded_dir(&relative) {
                log::debug!("Skipping excluded directory {}", relative);
                continue;
            }
            discover_sources_recursive(root, &path, exclusions, extensions, files)?;
            continue;
        }

        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.as_ref() == ext));
        if !has_extension || !path.is_file() || exclusions.is_excluded(&relative) {
            continue;
        }

        match std::fs::read(&path) {
            Ok(raw) => {
                let file = SourceFile::new(&relative, raw);
                files.insert(file.path.clone(), file);
            }
            Err(e) => log::warn!("Cannot read {}: {}", path.display(), e),
        }
    }
    Ok(())
}

/// Normalize a relative path to forward slashes, dropping `.` components
pub fn normalize_relative(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();
    parts.join("/")
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
