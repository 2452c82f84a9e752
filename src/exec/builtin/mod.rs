// src/exec/builtin/mod.rs

//! In-process built-in actions.
//!
//! Every built-in works through a [`FileSystem`] against a
//! [`ProjectLayout`], so tests can drive them with `MockFileSystem`.

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::model::ProjectLayout;
use crate::dag::BuiltinAction;
use crate::engine::{TaskFailure, TaskOutcome};
use crate::fs::FileSystem;

pub mod clean;
pub mod copy;
pub mod html;
pub mod rev;
pub mod sprite;

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("missing file {}", .0.display())]
    MissingFile(PathBuf),

    #[error("{0}")]
    Transform(String),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl From<BuiltinError> for TaskFailure {
    fn from(err: BuiltinError) -> Self {
        match err {
            BuiltinError::MissingFile(path) => TaskFailure::MissingFile(path),
            BuiltinError::Transform(msg) => TaskFailure::Transform(msg),
            BuiltinError::Io(err) => TaskFailure::Transform(format!("{err:#}")),
        }
    }
}

pub type BuiltinResult<T> = std::result::Result<T, BuiltinError>;

pub(crate) fn regex(pattern: &str) -> BuiltinResult<Regex> {
    Regex::new(pattern).map_err(|e| BuiltinError::Transform(format!("bad pattern {pattern}: {e}")))
}

/// Run a built-in synchronously.
pub fn run_builtin(
    fs: &dyn FileSystem,
    layout: &ProjectLayout,
    action: &BuiltinAction,
) -> BuiltinResult<()> {
    match action {
        BuiltinAction::Clean => clean::run(fs, layout),
        BuiltinAction::Copy { files, dest } => copy::run(fs, layout, files, dest.as_deref()),
        BuiltinAction::Sprite { files, dest } => sprite::run(fs, layout, files, dest),
        BuiltinAction::Html { files } => html::run(fs, layout, files),
        BuiltinAction::Rev { files } => rev::run(fs, layout, files),
        BuiltinAction::Serve => Err(BuiltinError::Transform(
            "serve can only run as the final step of a plan".to_string(),
        )),
    }
}

/// Run a built-in on the blocking pool and convert the result into a
/// [`TaskOutcome`].
pub async fn run_builtin_blocking(
    fs: Arc<dyn FileSystem>,
    layout: ProjectLayout,
    action: BuiltinAction,
    task: &str,
    run_id: u64,
) -> TaskOutcome {
    debug!(task = %task, run_id, ?action, "running builtin");

    let joined =
        tokio::task::spawn_blocking(move || run_builtin(fs.as_ref(), &layout, &action)).await;

    match joined {
        Ok(Ok(())) => TaskOutcome::Success,
        Ok(Err(err)) => TaskOutcome::Failed(err.into()),
        Err(join_err) => {
            error!(task = %task, run_id, error = %join_err, "builtin panicked");
            TaskOutcome::Failed(TaskFailure::Transform(format!(
                "builtin task '{task}' panicked"
            )))
        }
    }
}
