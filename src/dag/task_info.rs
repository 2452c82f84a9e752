// src/dag/task_info.rs

//! Task actions and the per-run description handed to the executor.

use std::fmt;

use crate::config::model::{BuiltinKind, TaskConfig};
use crate::engine::TaskName;

/// Include/exclude globs selecting a built-in's input files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Built-in actions run in-process against the project layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinAction {
    /// Remove the build directory.
    Clean,
    /// Copy selected source files into the build directory.
    Copy {
        files: FileSelection,
        dest: Option<String>,
    },
    /// Aggregate selected SVGs into one `<symbol>` sprite at `dest`.
    Sprite { files: FileSelection, dest: String },
    /// Resolve `<include>` elements in selected HTML files.
    Html { files: FileSelection },
    /// Write content-hashed copies of selected build files plus a manifest.
    Rev { files: FileSelection },
    /// Dev server + watch mode.
    Serve,
}

pub const DEFAULT_SPRITE_DEST: &str = "img/sprite.svg";

/// What running a task actually does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// External transform run through the platform shell.
    Command { cmd: String },
    Builtin(BuiltinAction),
}

impl TaskAction {
    /// Build the action from a validated task config.
    ///
    /// Validation guarantees exactly one of `cmd` / `builtin` is set; if both
    /// were somehow present, `cmd` wins.
    pub fn from_config(cfg: &TaskConfig) -> Self {
        if let Some(cmd) = &cfg.cmd {
            return TaskAction::Command { cmd: cmd.clone() };
        }

        let files = FileSelection {
            include: cfg.include.clone(),
            exclude: cfg.exclude.clone(),
        };

        let builtin = match cfg.builtin.unwrap_or(BuiltinKind::Clean) {
            BuiltinKind::Clean => BuiltinAction::Clean,
            BuiltinKind::Copy => BuiltinAction::Copy {
                files,
                dest: cfg.dest.clone(),
            },
            BuiltinKind::Sprite => BuiltinAction::Sprite {
                files,
                dest: cfg
                    .dest
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SPRITE_DEST.to_string()),
            },
            BuiltinKind::Html => BuiltinAction::Html { files },
            BuiltinKind::Rev => BuiltinAction::Rev { files },
            BuiltinKind::Serve => BuiltinAction::Serve,
        };

        TaskAction::Builtin(builtin)
    }

    pub fn is_serve(&self) -> bool {
        matches!(self, TaskAction::Builtin(BuiltinAction::Serve))
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Command { cmd } => write!(f, "cmd: {cmd}"),
            TaskAction::Builtin(BuiltinAction::Clean) => write!(f, "builtin: clean"),
            TaskAction::Builtin(BuiltinAction::Copy { files, .. }) => {
                write!(f, "builtin: copy {:?}", files.include)
            }
            TaskAction::Builtin(BuiltinAction::Sprite { files, dest }) => {
                write!(f, "builtin: sprite {:?} -> {dest}", files.include)
            }
            TaskAction::Builtin(BuiltinAction::Html { files }) => {
                write!(f, "builtin: html {:?}", files.include)
            }
            TaskAction::Builtin(BuiltinAction::Rev { files }) => {
                write!(f, "builtin: rev {:?}", files.include)
            }
            TaskAction::Builtin(BuiltinAction::Serve) => write!(f, "builtin: serve"),
        }
    }
}

/// Description of a task that the runner wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: TaskAction,
    /// Monotonically increasing run identifier.
    ///
    /// All tasks that belong to the same plan run share the same `run_id`.
    pub run_id: u64,
}
