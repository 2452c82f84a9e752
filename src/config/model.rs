// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{RefreshKind, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [project]
/// source_dir = "source"
/// build_dir = "build"
///
/// [task.css]
/// cmd = "npx sass source/sass/style.scss build/css/style.min.css"
///
/// [task.sprite]
/// builtin = "sprite"
/// include = ["img/sprite/*.svg"]
///
/// [pipeline.build]
/// steps = ["clean", ["copy", "css"], "sprite"]
///
/// [[watch]]
/// glob = "source/sass/**/*.{scss,sass}"
/// tasks = ["css"]
/// refresh = "inject"
/// ```
///
/// All sections except `[task.*]` are optional and have defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub server: ServerSection,

    /// Watch-mode behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Named run plans from `[pipeline.<name>]`.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,

    /// Watch rules from `[[watch]]`, in file order.
    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see
/// `config::validate`), so holders can rely on the task graph being acyclic
/// and every name reference resolving.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    project: ProjectSection,
    server: ServerSection,
    config: ConfigSection,
    task: BTreeMap<String, TaskConfig>,
    pipeline: BTreeMap<String, PipelineConfig>,
    watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            project: raw.project,
            server: raw.server,
            config: raw.config,
            task: raw.task,
            pipeline: raw.pipeline,
            watch: raw.watch,
        }
    }

    pub fn project(&self) -> &ProjectSection {
        &self.project
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }

    pub fn pipelines(&self) -> &BTreeMap<String, PipelineConfig> {
        &self.pipeline
    }

    pub fn watch_rules(&self) -> &[WatchRuleConfig] {
        &self.watch
    }

    /// Override the dev server port (CLI `--port`).
    pub fn set_server_port(&mut self, port: u16) {
        self.server.port = port;
    }
}

/// `[project]` section: where sources live and where output goes.
///
/// Both paths are relative to the project root (the config file's directory).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("source")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            build_dir: default_build_dir(),
        }
    }
}

/// Resolved on-disk layout of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, project: &ProjectSection) -> Self {
        let root = root.into();
        Self {
            source_dir: root.join(&project.source_dir),
            build_dir: root.join(&project.build_dir),
            root,
        }
    }
}

/// `[server]` section for the dev server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[config]` section: watch-mode behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// `"queue"` (default) or `"cancel"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued batches to remember while a run is active.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,

    /// Window in which successive filesystem events are coalesced.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Skip change events whose file content hash did not change.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_queue_length() -> usize {
    1
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
            debounce_ms: default_debounce_ms(),
            use_hash: false,
        }
    }
}

/// Built-in actions that don't shell out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinKind {
    Clean,
    Copy,
    Sprite,
    Html,
    Rev,
    Serve,
}

impl BuiltinKind {
    /// Built-ins that select their inputs with `include` globs.
    pub fn requires_include(self) -> bool {
        matches!(
            self,
            BuiltinKind::Copy | BuiltinKind::Sprite | BuiltinKind::Html | BuiltinKind::Rev
        )
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Shell command for tasks that wrap an external transform.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Built-in action; mutually exclusive with `cmd`.
    #[serde(default)]
    pub builtin: Option<BuiltinKind>,

    /// Input globs for built-ins (relative to `source_dir`, or to
    /// `build_dir` for `rev`).
    #[serde(default)]
    pub include: Vec<String>,

    /// Globs removed from `include`.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Output location relative to `build_dir` (sprite file, copy subdir).
    #[serde(default)]
    pub dest: Option<String>,

    /// Dependency list: this task needs all tasks listed here to have run.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl TaskConfig {
    pub fn is_serve(&self) -> bool {
        self.builtin == Some(BuiltinKind::Serve)
    }
}

/// One pipeline step: a single task or a set of tasks run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StepConfig {
    Single(String),
    Parallel(Vec<String>),
}

impl StepConfig {
    pub fn task_names(&self) -> Vec<&str> {
        match self {
            StepConfig::Single(name) => vec![name.as_str()],
            StepConfig::Parallel(names) => names.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// `[pipeline.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub steps: Vec<StepConfig>,

    #[serde(default)]
    pub description: Option<String>,
}

/// `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchRuleConfig {
    /// Glob relative to the project root, e.g. `source/js/**/*.js`.
    pub glob: String,

    /// Tasks to run, in order, when a changed path matches.
    #[serde(default)]
    pub tasks: Vec<String>,

    #[serde(default)]
    pub refresh: RefreshKind,
}
