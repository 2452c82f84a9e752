// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Compiling include/exclude glob patterns ([`patterns`]).
//! - Mapping changed paths to task lists through watch rules ([`dispatcher`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) with
//!   debouncing ([`watcher`]).
//! - Optional content hashing so unchanged saves do not re-run tasks
//!   ([`hash`]).
//!
//! It does not run anything; it only turns filesystem changes into
//! `RuntimeEvent::FilesChanged` batches and dispatches.

pub mod dispatcher;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use dispatcher::{Dispatch, WatchDispatcher, WatchRule};
pub use hash::{compute_file_hash, ContentCache};
pub use patterns::{collect_matching_files, FileMatcher};
pub use watcher::{spawn_watcher, WatcherHandle, WatcherOptions};
