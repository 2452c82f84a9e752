// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::dag::FileSelection;
use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;

/// Compiled include/exclude globs.
///
/// Patterns are evaluated against forward-slash paths relative to some base
/// directory (the project root for watch rules, `source_dir` or `build_dir`
/// for built-ins).
#[derive(Clone)]
pub struct FileMatcher {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for FileMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMatcher")
            .field("include", &self.include.len())
            .field("exclude", &self.exclude.as_ref().map(|s| s.len()))
            .finish()
    }
}

impl FileMatcher {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_globset(include).context("building include globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self {
            include: include_set,
            exclude: exclude_set,
        })
    }

    pub fn from_selection(selection: &FileSelection) -> Result<Self> {
        Self::new(&selection.include, &selection.exclude)
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile one pattern. `*` stays within a path segment; use `**` to cross
/// directories.
pub fn compile_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = compile_glob(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` whose root-relative path is accepted by
/// `matcher`. Sorted by path; empty when `root` is not a directory.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &FileMatcher,
) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(root) {
        return Ok(Vec::new());
    }

    let files = fs
        .walk_files(root)?
        .into_iter()
        .filter(|path| {
            relative_str(root, path)
                .map(|rel| matcher.matches(&rel))
                .unwrap_or(false)
        })
        .collect();

    Ok(files)
}
