#![allow(dead_code)]

use sitepipe::config::{
    BuiltinKind, ConfigFile, ConfigSection, PipelineConfig, ProjectSection, RawConfigFile,
    StepConfig, TaskConfig, WatchRuleConfig,
};
use sitepipe::errors::Result;
use sitepipe::types::RefreshKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_pipeline(mut self, name: &str, steps: Vec<StepConfig>) -> Self {
        self.config.pipeline.insert(
            name.to_string(),
            PipelineConfig {
                steps,
                description: None,
            },
        );
        self
    }

    pub fn with_watch(mut self, glob: &str, tasks: &[&str], refresh: RefreshKind) -> Self {
        self.config.watch.push(WatchRuleConfig {
            glob: glob.to_string(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
            refresh,
        });
        self
    }

    pub fn with_config(mut self, section: ConfigSection) -> Self {
        self.config.config = section;
        self
    }

    pub fn with_project(mut self, source_dir: &str, build_dir: &str) -> Self {
        self.config.project = ProjectSection {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
        };
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// Task running a shell command.
    pub fn cmd(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// Task running a built-in action.
    pub fn builtin(kind: BuiltinKind) -> Self {
        Self {
            task: TaskConfig {
                builtin: Some(kind),
                ..TaskConfig::default()
            },
        }
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.task.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.task.dest = Some(dest.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

pub fn single(name: &str) -> StepConfig {
    StepConfig::Single(name.to_string())
}

pub fn parallel(names: &[&str]) -> StepConfig {
    StepConfig::Parallel(names.iter().map(|s| s.to_string()).collect())
}
