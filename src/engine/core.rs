// src/engine/core.rs

//! Pure dev-mode state machine.
//!
//! [`DevCore`] consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::DevRuntime`) reads events from
//! channels, runs plans and pushes refresh signals to browsers. The core has
//! no channels, no Tokio types and performs no IO.
//!
//! [`CoreCommand`]: crate::engine::CoreCommand

use crate::engine::event_handlers::{handle_files_changed, handle_run_finished, CoreStep, RunSlot};
use crate::engine::queue::TriggerQueue;
use crate::engine::RuntimeEvent;
use crate::types::TriggerWhileRunningBehaviour;
use crate::watch::WatchDispatcher;

#[derive(Debug)]
pub struct DevCore {
    dispatcher: WatchDispatcher,
    queue: TriggerQueue,
    slot: RunSlot,
}

impl DevCore {
    pub fn new(
        dispatcher: WatchDispatcher,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
    ) -> Self {
        Self {
            dispatcher,
            queue: TriggerQueue::new(behaviour, queue_length),
            slot: RunSlot::new(),
        }
    }

    /// True when no run is active.
    pub fn is_idle(&self) -> bool {
        self.slot.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Id of the active run, if any.
    pub fn active_run(&self) -> Option<u64> {
        self.slot.active.map(|a| a.run_id)
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::FilesChanged { paths } => {
                handle_files_changed(&self.dispatcher, &mut self.queue, &mut self.slot, &paths)
            }
            RuntimeEvent::RunFinished { run_id, result } => {
                handle_run_finished(&mut self.queue, &mut self.slot, run_id, &result)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
