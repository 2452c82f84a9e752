use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitepipe::dag::ScheduledTask;
use sitepipe::engine::{TaskFailure, TaskOutcome};
use sitepipe::exec::ExecutorBackend;

/// What the fake executor observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
}

#[derive(Debug, Default)]
struct FakeState {
    events: Vec<ExecEvent>,
    run_ids: Vec<(String, u64)>,
    failures: HashMap<String, TaskFailure>,
    delays: HashMap<String, Duration>,
}

/// A fake executor that:
/// - records when each task starts and finishes
/// - optionally sleeps per task so overlap is observable
/// - reports scripted failures, and `Success` for everything else.
///
/// Clones share state, so a test can keep one handle and give another to
/// the runner.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    state: Arc<Mutex<FakeState>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self, task: &str, failure: TaskFailure) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(task.to_string(), failure);
        self
    }

    pub fn delay(self, task: &str, delay: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(task.to_string(), delay);
        self
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Task names in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(name) => Some(name),
                ExecEvent::Finished(_) => None,
            })
            .collect()
    }

    /// `(task, run_id)` pairs in start order.
    pub fn run_ids(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().run_ids.clone()
    }

    /// Position of `event` in the log, if recorded.
    pub fn position(&self, event: &ExecEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn run_task(
        &self,
        task: ScheduledTask,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let delay = {
                let mut guard = state.lock().unwrap();
                guard.events.push(ExecEvent::Started(task.name.clone()));
                guard.run_ids.push((task.name.clone(), task.run_id));
                guard.delays.get(&task.name).copied()
            };

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            } else {
                tokio::task::yield_now().await;
            }

            let mut guard = state.lock().unwrap();
            guard.events.push(ExecEvent::Finished(task.name.clone()));
            match guard.failures.get(&task.name) {
                Some(failure) => TaskOutcome::Failed(failure.clone()),
                None => TaskOutcome::Success,
            }
        })
    }
}
