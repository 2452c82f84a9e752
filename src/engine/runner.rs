// src/engine/runner.rs

//! Plan runner.
//!
//! Executes a [`RunPlan`] strictly group by group. Members of a parallel
//! group are started together and joined with `futures::future::join_all`;
//! the next group starts only after every member of the current one has
//! finished. If any member failed, the run stops at that join barrier.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::dag::{RunPlan, ScheduledTask, Step, TaskGraph};
use crate::engine::{TaskFailure, TaskName, TaskOutcome};
use crate::errors::SitepipeError;
use crate::exec::ExecutorBackend;

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("task '{task}' failed: {failure}")]
    TaskFailed { task: TaskName, failure: TaskFailure },

    /// The plan names a task the graph does not know. Checked before any
    /// task starts.
    #[error("task '{0}' is not defined")]
    UnknownTask(TaskName),
}

impl From<RunError> for SitepipeError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::TaskFailed { task, failure } => SitepipeError::TaskFailed { task, failure },
            RunError::UnknownTask(name) => SitepipeError::TaskNotFound(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: TaskName,
    pub duration: Duration,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: u64,
    /// Executed tasks; groups in plan order, members of one group in
    /// completion order.
    pub tasks: Vec<TaskReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Runs plans against a task graph through an [`ExecutorBackend`].
pub struct PlanRunner {
    graph: Arc<TaskGraph>,
    executor: Arc<dyn ExecutorBackend>,
    next_run_id: AtomicU64,
}

impl std::fmt::Debug for PlanRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRunner")
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

impl PlanRunner {
    pub fn new(graph: Arc<TaskGraph>, executor: Arc<dyn ExecutorBackend>) -> Self {
        Self {
            graph,
            executor,
            next_run_id: AtomicU64::new(1),
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Allocate a fresh run identifier.
    pub fn next_run_id(&self) -> u64 {
        self.next_run_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn run(&self, plan: &RunPlan) -> Result<RunReport, RunError> {
        let run_id = self.next_run_id();
        self.run_with_id(plan, run_id).await
    }

    pub async fn run_with_id(&self, plan: &RunPlan, run_id: u64) -> Result<RunReport, RunError> {
        if let Some(unknown) = plan.task_names().find(|name| !self.graph.contains(name)) {
            return Err(RunError::UnknownTask(unknown.to_string()));
        }

        let started = Instant::now();
        info!(run_id, plan = %plan, "starting run");

        let mut tasks = Vec::new();
        for (idx, step) in plan.steps().iter().enumerate() {
            let reports = self.run_step(run_id, idx, step).await?;
            tasks.extend(reports);
        }

        let elapsed = started.elapsed();
        info!(run_id, elapsed_ms = elapsed.as_millis() as u64, "run finished");

        Ok(RunReport {
            run_id,
            tasks,
            elapsed,
        })
    }

    async fn run_step(
        &self,
        run_id: u64,
        idx: usize,
        step: &Step,
    ) -> Result<Vec<TaskReport>, RunError> {
        let names = step.task_names();
        if names.is_empty() {
            debug!(run_id, step = idx, "empty group; nothing to run");
            return Ok(Vec::new());
        }

        info!(run_id, step = idx, tasks = %step, "starting step");

        let futures = names.iter().map(|name| self.run_one(run_id, name));
        let results = join_all(futures).await;

        let mut first_failure: Option<RunError> = None;
        let mut finished = Vec::with_capacity(results.len());

        // `results` is in declaration order, so the first failure seen here is
        // the one reported.
        for (name, outcome, duration, finished_at) in results {
            match outcome {
                TaskOutcome::Success => finished.push((finished_at, TaskReport { name, duration })),
                TaskOutcome::Failed(failure) => {
                    error!(run_id, task = %name, %failure, "task failed");
                    if first_failure.is_none() {
                        first_failure = Some(RunError::TaskFailed {
                            task: name,
                            failure,
                        });
                    }
                }
            }
        }

        if let Some(err) = first_failure {
            info!(run_id, step = idx, "aborting run after failed step");
            return Err(err);
        }

        finished.sort_by_key(|(at, _)| *at);
        Ok(finished.into_iter().map(|(_, report)| report).collect())
    }

    async fn run_one(
        &self,
        run_id: u64,
        name: &str,
    ) -> (TaskName, TaskOutcome, Duration, Instant) {
        let started = Instant::now();

        let outcome = match self.graph.action_of(name) {
            Some(action) => {
                let task = ScheduledTask {
                    name: name.to_string(),
                    action: action.clone(),
                    run_id,
                };
                self.executor.run_task(task).await
            }
            // Checked up front in `run_with_id`.
            None => TaskOutcome::Failed(TaskFailure::Transform(format!(
                "task '{name}' is not defined"
            ))),
        };

        let duration = started.elapsed();
        debug!(
            run_id,
            task = %name,
            success = outcome.is_success(),
            duration_ms = duration.as_millis() as u64,
            "task finished"
        );

        (name.to_string(), outcome, duration, Instant::now())
    }
}
