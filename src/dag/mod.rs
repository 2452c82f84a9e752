// src/dag/mod.rs

//! Task graph representation and run planning.
//!
//! - [`graph`] holds the directed acyclic graph of tasks and their actions.
//! - [`plan`] turns CLI targets into an ordered sequence of single/parallel
//!   groups for the runner.
//! - [`task_info`] provides task actions and the scheduled-task type.

pub mod graph;
pub mod plan;
pub mod task_info;

pub use graph::TaskGraph;
pub use plan::{resolve_targets, ResolvedPlan, RunPlan, Step};
pub use task_info::{BuiltinAction, FileSelection, ScheduledTask, TaskAction};
