// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The plan runner talks to an `ExecutorBackend` instead of spawning work
//! itself. Production uses [`RealExecutorBackend`]; tests swap in a fake
//! that records start/finish order and scripts outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::model::ProjectLayout;
use crate::dag::{ScheduledTask, TaskAction};
use crate::engine::TaskOutcome;
use crate::fs::{FileSystem, RealFileSystem};

use super::builtin::run_builtin_blocking;
use super::command::run_command;

/// Trait abstracting how a single scheduled task is executed.
pub trait ExecutorBackend: Send + Sync {
    /// Run `task` to completion and report its outcome.
    ///
    /// Implementations never return early: the future resolves only once
    /// the task's work is finished.
    fn run_task(
        &self,
        task: ScheduledTask,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>>;
}

/// Production executor: shell commands via `tokio::process`, built-ins on
/// the blocking pool.
#[derive(Debug, Clone)]
pub struct RealExecutorBackend {
    layout: ProjectLayout,
    fs: Arc<dyn FileSystem>,
}

impl RealExecutorBackend {
    pub fn new(layout: ProjectLayout) -> Self {
        Self::with_fs(layout, Arc::new(RealFileSystem))
    }

    pub fn with_fs(layout: ProjectLayout, fs: Arc<dyn FileSystem>) -> Self {
        Self { layout, fs }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn run_task(
        &self,
        task: ScheduledTask,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        Box::pin(async move {
            match task.action {
                TaskAction::Command { cmd } => {
                    run_command(&task.name, task.run_id, &cmd, &self.layout.root).await
                }
                TaskAction::Builtin(action) => {
                    run_builtin_blocking(
                        Arc::clone(&self.fs),
                        self.layout.clone(),
                        action,
                        &task.name,
                        task.run_id,
                    )
                    .await
                }
            }
        })
    }
}
