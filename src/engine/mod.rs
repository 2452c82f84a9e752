// src/engine/mod.rs

//! Orchestration engine for sitepipe.
//!
//! This module ties together:
//! - the plan runner (groups in order, parallel members joined, fail fast)
//! - the trigger queue (what happens when changes arrive while a run is active)
//! - the dev-mode event loop that reacts to:
//!   - file-watch batches
//!   - run completion
//!   - shutdown signals
//!
//! The pure dev-mode state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;
use std::path::PathBuf;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Why a task did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// External transform exited with a non-zero status (`-1` when killed
    /// by a signal or the process could not be spawned).
    Exit(i32),
    /// A required input file does not exist.
    MissingFile(PathBuf),
    /// A built-in transform rejected its input.
    Transform(String),
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Exit(code) => write!(f, "exited with status {code}"),
            TaskFailure::MissingFile(path) => write!(f, "missing file {}", path.display()),
            TaskFailure::Transform(msg) => write!(f, "{msg}"),
        }
    }
}

/// Outcome of a single task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Events flowing into the dev runtime from the watcher, runs and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Debounced batch of changed paths, relative to the project root.
    FilesChanged { paths: Vec<String> },
    /// A run started by the core has finished.
    RunFinished {
        run_id: u64,
        result: std::result::Result<RunReport, RunError>,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runner;
pub mod runtime;

pub use core::DevCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runner::{PlanRunner, RunError, RunReport, TaskReport};
pub use runtime::DevRuntime;
pub use crate::types::{RefreshKind, TriggerWhileRunningBehaviour};
