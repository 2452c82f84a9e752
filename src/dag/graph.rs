// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::config::model::ConfigFile;
use crate::dag::task_info::TaskAction;
use crate::engine::TaskName;

/// Internal node structure: stores the action plus immediate deps.
#[derive(Debug, Clone)]
struct DagNode {
    action: TaskAction,
    /// Direct dependencies: tasks that must run before this one.
    deps: Vec<TaskName>,
}

/// In-memory task graph keyed by task name.
///
/// Acyclicity and reference resolution are validated in `config::validate`,
/// so here we just keep adjacency information for planning and diagnostics.
/// Backed by a `BTreeMap` so iteration order is stable.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, DagNode>,
}

impl TaskGraph {
    /// Build the graph from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let nodes: BTreeMap<TaskName, DagNode> = cfg
            .tasks()
            .iter()
            .map(|(name, task)| {
                (
                    name.clone(),
                    DagNode {
                        action: TaskAction::from_config(task),
                        deps: task.after.clone(),
                    },
                )
            })
            .collect();

        Self { nodes }
    }

    /// Return all task names in sorted order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn action_of(&self, name: &str) -> Option<&TaskAction> {
        self.nodes.get(name).map(|n| &n.action)
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// The target plus its transitive dependencies, grouped into layers.
    ///
    /// Layer `n` holds the tasks whose longest dependency chain within the
    /// closure has length `n`, so every task lands strictly after all of its
    /// dependencies and tasks in one layer are independent of each other.
    /// Names inside a layer are sorted. Returns `None` for unknown targets.
    pub fn dependency_layers(&self, target: &str) -> Option<Vec<Vec<TaskName>>> {
        if !self.contains(target) {
            return None;
        }

        let mut closure: BTreeSet<&str> = BTreeSet::new();
        let mut stack = vec![target];
        while let Some(name) = stack.pop() {
            if closure.insert(name) {
                stack.extend(self.dependencies_of(name).iter().map(|s| s.as_str()));
            }
        }

        let mut depth: BTreeMap<&str, usize> = BTreeMap::new();
        for &name in closure.iter() {
            self.depth_of(name, &mut depth);
        }

        let max_depth = depth.values().copied().max().unwrap_or(0);
        let mut layers: Vec<Vec<TaskName>> = vec![Vec::new(); max_depth + 1];
        for (name, d) in depth {
            layers[d].push(name.to_string());
        }

        Some(layers)
    }

    fn depth_of<'a>(&'a self, name: &'a str, memo: &mut BTreeMap<&'a str, usize>) -> usize {
        if let Some(d) = memo.get(name) {
            return *d;
        }

        let d = self
            .dependencies_of(name)
            .iter()
            .map(|dep| self.depth_of(dep.as_str(), memo) + 1)
            .max()
            .unwrap_or(0);

        memo.insert(name, d);
        d
    }
}
