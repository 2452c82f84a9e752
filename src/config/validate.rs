// src/config/validate.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, StepConfig};
use crate::errors::{Result, SitepipeError};
use crate::watch::patterns::compile_glob;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every definition-time check. Any failure here is fatal before a
/// single task runs.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_actions(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_pipelines(cfg)?;
    validate_watch_rules(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SitepipeError {
    SitepipeError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(config_error("[config].queue_length must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_task_actions(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        match (&task.cmd, task.builtin) {
            (Some(_), Some(_)) => {
                return Err(config_error(format!(
                    "task '{name}' sets both `cmd` and `builtin`; pick one"
                )));
            }
            (None, None) => {
                return Err(config_error(format!(
                    "task '{name}' needs either `cmd` or `builtin`"
                )));
            }
            (Some(cmd), None) if cmd.trim().is_empty() => {
                return Err(config_error(format!("task '{name}' has an empty `cmd`")));
            }
            (None, Some(kind)) if kind.requires_include() && task.include.is_empty() => {
                return Err(config_error(format!(
                    "task '{name}' uses builtin {kind:?} which requires `include` globs"
                )));
            }
            _ => {}
        }

        for pat in task.include.iter().chain(task.exclude.iter()) {
            compile_glob(pat).map_err(|e| {
                config_error(format!("task '{name}' has invalid glob '{pat}': {e}"))
            })?;
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if cfg.task.get(dep).is_some_and(|d| d.is_serve()) {
                return Err(config_error(format!(
                    "task '{name}' cannot depend on serve task '{dep}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For `[task.B] after = ["A"]` we add A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SitepipeError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_pipelines(cfg: &RawConfigFile) -> Result<()> {
    for (pipeline_name, pipeline) in cfg.pipeline.iter() {
        if cfg.task.contains_key(pipeline_name) {
            return Err(config_error(format!(
                "pipeline '{pipeline_name}' has the same name as a task"
            )));
        }

        // Step index at which each task of this pipeline runs.
        let mut position: HashMap<&str, usize> = HashMap::new();
        let last = pipeline.steps.len().saturating_sub(1);

        for (idx, step) in pipeline.steps.iter().enumerate() {
            for task_name in step.task_names() {
                let Some(task) = cfg.task.get(task_name) else {
                    return Err(config_error(format!(
                        "pipeline '{pipeline_name}' references unknown task '{task_name}'"
                    )));
                };

                if task.is_serve() && !(idx == last && matches!(step, StepConfig::Single(_))) {
                    return Err(config_error(format!(
                        "pipeline '{pipeline_name}': serve task '{task_name}' must be the final single step"
                    )));
                }

                if position.insert(task_name, idx).is_some() {
                    return Err(config_error(format!(
                        "pipeline '{pipeline_name}' lists task '{task_name}' more than once"
                    )));
                }
            }
        }

        for (task_name, idx) in position.iter() {
            let Some(task) = cfg.task.get(*task_name) else {
                continue;
            };
            for dep in task.after.iter() {
                if let Some(dep_idx) = position.get(dep.as_str()) {
                    if dep_idx >= idx {
                        return Err(config_error(format!(
                            "pipeline '{pipeline_name}' runs '{task_name}' no later than its dependency '{dep}'"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (idx, rule) in cfg.watch.iter().enumerate() {
        compile_glob(&rule.glob).map_err(|e| {
            config_error(format!("watch rule #{idx} has invalid glob '{}': {e}", rule.glob))
        })?;

        for task_name in rule.tasks.iter() {
            match cfg.task.get(task_name) {
                None => {
                    return Err(config_error(format!(
                        "watch rule '{}' references unknown task '{task_name}'",
                        rule.glob
                    )));
                }
                Some(task) if task.is_serve() => {
                    return Err(config_error(format!(
                        "watch rule '{}' cannot trigger serve task '{task_name}'",
                        rule.glob
                    )));
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{BuiltinKind, PipelineConfig, TaskConfig, WatchRuleConfig};
    use crate::types::RefreshKind;

    fn cmd(c: &str) -> TaskConfig {
        TaskConfig {
            cmd: Some(c.to_string()),
            ..TaskConfig::default()
        }
    }

    fn raw_with(tasks: &[(&str, TaskConfig)]) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        for (name, task) in tasks {
            raw.task.insert(name.to_string(), task.clone());
        }
        raw
    }

    #[test]
    fn rejects_task_with_both_cmd_and_builtin() {
        let mut task = cmd("echo");
        task.builtin = Some(BuiltinKind::Clean);
        let err = ConfigFile::try_from(raw_with(&[("clean", task)])).unwrap_err();
        assert!(err.to_string().contains("both `cmd` and `builtin`"));
    }

    #[test]
    fn sprite_without_include_is_rejected() {
        let task = TaskConfig {
            builtin: Some(BuiltinKind::Sprite),
            ..TaskConfig::default()
        };
        let err = ConfigFile::try_from(raw_with(&[("sprite", task)])).unwrap_err();
        assert!(err.to_string().contains("requires `include`"));
    }

    #[test]
    fn pipeline_must_order_dependencies_first() {
        let mut html = cmd("echo html");
        html.after = vec!["sprite".into()];
        let mut raw = raw_with(&[("sprite", cmd("echo sprite")), ("html", html)]);
        raw.pipeline.insert(
            "build".into(),
            PipelineConfig {
                steps: vec![StepConfig::Parallel(vec!["sprite".into(), "html".into()])],
                description: None,
            },
        );

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("no later than its dependency 'sprite'"));
    }

    #[test]
    fn serve_must_be_last_single_step() {
        let serve = TaskConfig {
            builtin: Some(BuiltinKind::Serve),
            ..TaskConfig::default()
        };
        let mut raw = raw_with(&[("server", serve), ("css", cmd("echo css"))]);
        raw.pipeline.insert(
            "start".into(),
            PipelineConfig {
                steps: vec![
                    StepConfig::Single("server".into()),
                    StepConfig::Single("css".into()),
                ],
                description: None,
            },
        );

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("final single step"));
    }

    #[test]
    fn watch_rule_with_unknown_task_is_rejected() {
        let mut raw = raw_with(&[("css", cmd("echo css"))]);
        raw.watch.push(WatchRuleConfig {
            glob: "source/**/*.scss".into(),
            tasks: vec!["styles".into()],
            refresh: RefreshKind::Inject,
        });

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, SitepipeError::ConfigError(ref m) if m.contains("'styles'")));
    }

    #[test]
    fn empty_parallel_step_is_allowed() {
        let mut raw = raw_with(&[("css", cmd("echo css"))]);
        raw.pipeline.insert(
            "build".into(),
            PipelineConfig {
                steps: vec![StepConfig::Parallel(vec![]), StepConfig::Single("css".into())],
                description: None,
            },
        );
        assert!(ConfigFile::try_from(raw).is_ok());
    }
}
