//! Exclusion rules for library, vendor, build and cache paths

use crate::error::{CoreError, CoreResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// A compiled set of exclusion globs.
///
/// Globs are matched against project-relative paths using forward slashes,
/// so `lib/**` excludes everything under a top-level `lib` directory and
/// `**/lib/**` excludes any nested `lib` directory as well.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl ExclusionSet {
    /// Compile `patterns`; any malformed glob is a configuration error
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> CoreResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|e| CoreError::InvalidExcludePattern {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| CoreError::InvalidExcludePattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            set,
        })
    }

    /// An exclusion set that excludes nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// Check whether a normalized relative path is excluded
    pub fn is_excluded(&self, relative: &str) -> bool {
        !self.set.is_empty() && self.set.is_match(relative)
    }

    /// Check whether a whole directory is excluded, so a walk can skip it
    /// without reading anything beneath it
    pub fn is_excluded_dir(&self, relative: &str) -> bool {
        let relative = relative.trim_end_matches('/');
        self.is_excluded(relative) || self.is_excluded(&format!("{}/", relative))
    }

    /// Check whether a relative filesystem path is excluded
    pub fn is_excluded_path(&self, relative: &Path) -> bool {
        self.is_excluded(&crate::source::normalize_relative(relative))
    }

    /// The source patterns, in configuration order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
