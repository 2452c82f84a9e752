// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::DevContext;
use crate::dag::RunPlan;
use crate::errors::Result;

use super::core::DevCore;
use super::runner::PlanRunner;
use super::{CoreCommand, RuntimeEvent};

/// Drives the dev-mode core in response to `RuntimeEvent`s.
///
/// This is a pure IO shell around [`DevCore`], which contains all the
/// watch-mode semantics. Runs are spawned on the shared [`PlanRunner`] and
/// report back through the same event channel; refresh signals go to the
/// reload hub in [`DevContext`].
pub struct DevRuntime {
    core: DevCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    runner: Arc<PlanRunner>,
    ctx: Arc<DevContext>,
}

impl fmt::Debug for DevRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl DevRuntime {
    /// `event_tx` must feed `event_rx`; it is used to report finished runs.
    pub fn new(
        core: DevCore,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        runner: Arc<PlanRunner>,
        ctx: Arc<DevContext>,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            runner,
            ctx,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core.
    /// - Executes commands returned by the core (start runs, refresh).
    pub async fn run(mut self) -> Result<()> {
        info!("dev runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("shutdown requested; stopping dev runtime");
                break;
            }
        }

        Ok(())
    }

    fn execute_command(&self, command: CoreCommand) {
        match command {
            CoreCommand::StartRun { run_id, plan, .. } => self.spawn_run(run_id, plan),
            CoreCommand::Refresh(kind) => {
                let receivers = self.ctx.reload().notify(kind);
                debug!(?kind, receivers, "refresh signal sent");
            }
        }
    }

    fn spawn_run(&self, run_id: u64, plan: RunPlan) {
        let runner = Arc::clone(&self.runner);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = runner.run_with_id(&plan, run_id).await;
            if tx
                .send(RuntimeEvent::RunFinished { run_id, result })
                .await
                .is_err()
            {
                warn!(run_id, "runtime stopped before run completion was delivered");
            }
        });
    }
}
