// src/engine/event_handlers.rs

//! Event handling logic for the dev core.

use tracing::{debug, info, warn};

use crate::dag::RunPlan;
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunError, RunReport};
use crate::types::RefreshKind;
use crate::watch::{Dispatch, WatchDispatcher};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Run `plan` under `run_id`, then report back with `RunFinished`.
    StartRun {
        run_id: u64,
        plan: RunPlan,
        refresh: RefreshKind,
    },
    /// Tell connected browsers to refresh.
    Refresh(RefreshKind),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActiveRun {
    pub run_id: u64,
    pub refresh: RefreshKind,
}

/// At most one active run plus the id counter for the next one.
#[derive(Debug)]
pub(crate) struct RunSlot {
    pub active: Option<ActiveRun>,
    next_run_id: u64,
}

impl RunSlot {
    pub fn new() -> Self {
        Self {
            active: None,
            next_run_id: 1,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    fn start(&mut self, dispatch: Dispatch) -> CoreCommand {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.active = Some(ActiveRun {
            run_id,
            refresh: dispatch.refresh,
        });

        info!(run_id, tasks = ?dispatch.tasks, "starting watch run");
        CoreCommand::StartRun {
            run_id,
            plan: RunPlan::sequential(dispatch.tasks),
            refresh: dispatch.refresh,
        }
    }
}

/// Handle a debounced batch of changed paths.
///
/// - Paths matching no rule are ignored.
/// - If no run is active the matched tasks start right away.
/// - Otherwise the dispatch is handed to the queue.
pub(crate) fn handle_files_changed(
    dispatcher: &WatchDispatcher,
    queue: &mut TriggerQueue,
    slot: &mut RunSlot,
    paths: &[String],
) -> CoreStep {
    let dispatch = dispatcher.on_changes(paths.iter().map(|p| p.as_str()));
    if dispatch.is_empty() {
        debug!(?paths, "changed paths matched no watch rule");
        return CoreStep::continue_with(Vec::new());
    }

    if slot.is_idle() {
        return CoreStep::continue_with(vec![slot.start(dispatch)]);
    }

    queue.record(dispatch);
    CoreStep::continue_with(Vec::new())
}

/// Handle the end of a run.
///
/// A successful run emits its refresh (unless it is `None`). A failed run is
/// logged and sends nothing. Either way, the oldest queued batch starts next.
pub(crate) fn handle_run_finished(
    queue: &mut TriggerQueue,
    slot: &mut RunSlot,
    run_id: u64,
    result: &Result<RunReport, RunError>,
) -> CoreStep {
    let Some(active) = slot.active.filter(|a| a.run_id == run_id) else {
        debug!(run_id, "ignoring completion of a run that is not active");
        return CoreStep::continue_with(Vec::new());
    };
    slot.active = None;

    let mut commands = Vec::new();
    match result {
        Ok(_) if active.refresh != RefreshKind::None => {
            commands.push(CoreCommand::Refresh(active.refresh));
        }
        Ok(_) => {}
        Err(err) => {
            warn!(run_id, error = %err, "watch run failed; waiting for the next change");
        }
    }

    if let Some(next) = queue.next_batch() {
        commands.push(slot.start(next));
    }

    CoreStep::continue_with(commands)
}
