// src/dag/plan.rs

//! Run plans: ordered sequences of single or parallel task groups.

use std::fmt;

use crate::config::model::{ConfigFile, StepConfig};
use crate::dag::graph::TaskGraph;
use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};

/// One group of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Single(TaskName),
    /// All members start together; the step ends when every member has.
    Parallel(Vec<TaskName>),
}

impl Step {
    pub fn task_names(&self) -> &[TaskName] {
        match self {
            Step::Single(name) => std::slice::from_ref(name),
            Step::Parallel(names) => names,
        }
    }

    fn from_layer(mut layer: Vec<TaskName>) -> Self {
        if layer.len() == 1 {
            Step::Single(layer.remove(0))
        } else {
            Step::Parallel(layer)
        }
    }
}

impl From<&StepConfig> for Step {
    fn from(cfg: &StepConfig) -> Self {
        match cfg {
            StepConfig::Single(name) => Step::Single(name.clone()),
            StepConfig::Parallel(names) => Step::Parallel(names.clone()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Single(name) => write!(f, "{name}"),
            Step::Parallel(names) => write!(f, "[{}]", names.join(" | ")),
        }
    }
}

/// Ordered groups executed strictly one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    steps: Vec<Step>,
}

impl RunPlan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// One task per step, in the given order.
    pub fn sequential<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            steps: tasks.into_iter().map(|t| Step::Single(t.into())).collect(),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All task names in plan order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .flat_map(|s| s.task_names().iter().map(|n| n.as_str()))
    }
}

impl fmt::Display for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "(empty)");
        }
        let parts: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(" -> "))
    }
}

/// Plan for a set of CLI targets, with the trailing serve step split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub plan: RunPlan,
    /// Name of the serve task to enter once `plan` succeeds, if any.
    pub serve: Option<TaskName>,
}

/// Resolve CLI targets into one plan.
///
/// - A pipeline name contributes its declared steps verbatim.
/// - A task name contributes its `after` closure as dependency layers.
/// - Plans of several targets are concatenated in target order.
///
/// A serve task is only accepted as the very last single step; it is removed
/// from the plan and reported in [`ResolvedPlan::serve`].
pub fn resolve_targets(
    cfg: &ConfigFile,
    graph: &TaskGraph,
    targets: &[String],
) -> Result<ResolvedPlan> {
    let mut steps: Vec<Step> = Vec::new();

    for target in targets {
        if let Some(pipeline) = cfg.pipelines().get(target) {
            steps.extend(pipeline.steps.iter().map(Step::from));
        } else if let Some(layers) = graph.dependency_layers(target) {
            steps.extend(layers.into_iter().map(Step::from_layer));
        } else {
            return Err(SitepipeError::TaskNotFound(target.clone()));
        }
    }

    let serve = match steps.last() {
        Some(Step::Single(name)) if is_serve(graph, name) => Some(name.clone()),
        _ => None,
    };
    if serve.is_some() {
        steps.pop();
    }

    if let Some(misplaced) = steps
        .iter()
        .flat_map(|s| s.task_names())
        .find(|name| is_serve(graph, name))
    {
        return Err(SitepipeError::ConfigError(format!(
            "serve task '{misplaced}' must be the last target"
        )));
    }

    Ok(ResolvedPlan {
        plan: RunPlan::new(steps),
        serve,
    })
}

fn is_serve(graph: &TaskGraph, name: &str) -> bool {
    graph.action_of(name).is_some_and(|a| a.is_serve())
}
