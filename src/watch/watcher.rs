// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::model::ProjectLayout;
use crate::engine::RuntimeEvent;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::hash::ContentCache;
use crate::watch::path_utils::relative_str;

#[derive(Debug, Clone, Copy)]
pub struct WatcherOptions {
    /// Events closer together than this are coalesced into one batch.
    pub debounce: Duration,
    /// Drop paths whose content hash did not change.
    pub use_hash: bool,
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping the handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `layout.source_dir` recursively and send debounced
/// `RuntimeEvent::FilesChanged` batches with paths relative to
/// `layout.root`.
pub fn spawn_watcher(
    layout: &ProjectLayout,
    options: WatcherOptions,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = layout
        .root
        .canonicalize()
        .unwrap_or_else(|_| layout.root.clone());
    let source_dir = layout
        .source_dir
        .canonicalize()
        .with_context(|| format!("source directory {:?} does not exist", layout.source_dir))?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // No tracing subscriber guarantees inside notify's thread.
                    eprintln!("sitepipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&source_dir, RecursiveMode::Recursive)?;
    info!(path = %source_dir.display(), "file watcher started");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut cache = if options.use_hash {
        let mut cache = ContentCache::new();
        let existing = fs.walk_files(&source_dir).unwrap_or_default();
        cache.prime(fs.as_ref(), existing.iter());
        debug!(files = cache.len(), "primed content hash cache");
        Some(cache)
    } else {
        None
    };

    tokio::spawn(async move {
        while let Some(first) = event_rx.recv().await {
            let mut raw_paths = relevant_paths(first);

            // Keep absorbing events until the channel stays quiet for one
            // debounce window.
            loop {
                match tokio::time::timeout(options.debounce, event_rx.recv()).await {
                    Ok(Some(event)) => raw_paths.extend(relevant_paths(event)),
                    Ok(None) => break,
                    Err(_elapsed) => break,
                }
            }

            let paths = relativize_batch(fs.as_ref(), &root, raw_paths, cache.as_mut());
            if paths.is_empty() {
                continue;
            }

            debug!(?paths, "forwarding changed paths");
            if runtime_tx
                .send(RuntimeEvent::FilesChanged { paths })
                .await
                .is_err()
            {
                warn!("runtime channel closed; stopping watcher loop");
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn relevant_paths(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Access(_) | EventKind::Other => Vec::new(),
        _ => event.paths,
    }
}

/// Turn one debounced batch of absolute paths into unique, root-relative,
/// forward-slash paths in first-seen order.
///
/// Directories are dropped. With a cache, paths whose content hash did not
/// change are dropped too.
pub fn relativize_batch(
    fs: &dyn FileSystem,
    root: &Path,
    raw_paths: Vec<PathBuf>,
    mut cache: Option<&mut ContentCache>,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for path in raw_paths {
        if fs.is_dir(&path) {
            continue;
        }

        let Some(rel) = relative_str(root, &path) else {
            debug!(path = %path.display(), "ignoring path outside project root");
            continue;
        };

        if out.contains(&rel) {
            continue;
        }

        if let Some(cache) = cache.as_deref_mut() {
            if !cache.observe(fs, &path) {
                continue;
            }
        }

        out.push(rel);
    }

    out
}
