// src/watch/hash.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Hex-encoded blake3 hash of a file's contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs.read(path)?;
    Ok(hash_bytes(&bytes))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Last-seen content hash per watched file.
///
/// Used with `use_hash = true` to drop change events (editor touch, save
/// without edits) whose content did not actually change.
#[derive(Debug, Default)]
pub struct ContentCache {
    hashes: HashMap<PathBuf, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current hash of `path` and report whether it differs from
    /// the previously recorded one.
    ///
    /// Unreadable (e.g. deleted) files count as changed and are forgotten.
    pub fn observe(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let hash = match compute_file_hash(fs, path) {
            Ok(h) => h,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "cannot hash file; treating as changed");
                self.hashes.remove(path);
                return true;
            }
        };

        match self.hashes.insert(path.to_path_buf(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(path = %path.display(), "content unchanged");
                false
            }
            _ => true,
        }
    }

    /// Seed the cache with the current contents of `paths`.
    pub fn prime<'a>(&mut self, fs: &dyn FileSystem, paths: impl IntoIterator<Item = &'a PathBuf>) {
        for path in paths {
            if let Ok(hash) = compute_file_hash(fs, path) {
                self.hashes.insert(path.clone(), hash);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
