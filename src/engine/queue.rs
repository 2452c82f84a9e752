// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::types::TriggerWhileRunningBehaviour;
use crate::watch::Dispatch;

/// Queue of dispatches that arrive while a run is already executing.
///
/// Semantics:
/// - Each queued entry is a *batch*: an ordered task list plus the refresh
///   to send once it has run. Every batch becomes its own run.
/// - `max_runs` (`queue_length`) is how many future runs may be pending.
///   Once that many are queued, further dispatches merge into the last one,
///   so no change is ever dropped.
/// - When the runtime becomes idle it takes the oldest batch with
///   [`next_batch`].
///
/// [`next_batch`]: TriggerQueue::next_batch
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<Dispatch>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Record a dispatch that arrived while a run is in progress.
    ///
    /// - `Queue`: append as a new batch while fewer than `max_runs` are
    ///   pending, otherwise merge into the last batch (order-preserving
    ///   union, max refresh).
    /// - `Cancel`: forget every queued batch and keep only this one.
    pub fn record(&mut self, dispatch: Dispatch) {
        if dispatch.is_empty() {
            return;
        }

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                if self.runs.len() < self.max_runs {
                    debug!(tasks = ?dispatch.tasks, pending = self.runs.len() + 1, "queued batch");
                    self.runs.push_back(dispatch);
                } else if let Some(last) = self.runs.back_mut() {
                    last.merge(dispatch);
                    debug!(
                        tasks = ?last.tasks,
                        max_runs = self.max_runs,
                        "queue full; merged dispatch into last batch"
                    );
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                debug!(tasks = ?dispatch.tasks, "replacing queued batches (cancel mode)");
                self.runs.clear();
                self.runs.push_back(dispatch);
            }
        }
    }

    /// Oldest pending batch, if any.
    pub fn next_batch(&mut self) -> Option<Dispatch> {
        let batch = self.runs.pop_front();
        if let Some(batch) = &batch {
            debug!(tasks = ?batch.tasks, remaining = self.runs.len(), "dequeued batch");
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefreshKind;

    fn dispatch(tasks: &[&str], refresh: RefreshKind) -> Dispatch {
        Dispatch {
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
            refresh,
        }
    }

    #[test]
    fn full_queue_merges_in_order_without_duplicates() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 1);
        q.record(dispatch(&["css"], RefreshKind::Inject));
        q.record(dispatch(&["html", "css"], RefreshKind::Reload));

        assert_eq!(q.len(), 1);
        let batch = q.next_batch().unwrap();
        assert_eq!(batch.tasks, vec!["css", "html"]);
        assert_eq!(batch.refresh, RefreshKind::Reload);
        assert!(q.next_batch().is_none());
    }

    #[test]
    fn longer_queue_keeps_separate_batches_in_arrival_order() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 2);
        q.record(dispatch(&["css"], RefreshKind::Inject));
        q.record(dispatch(&["js"], RefreshKind::Reload));
        q.record(dispatch(&["html"], RefreshKind::Reload));

        assert_eq!(q.len(), 2);
        assert_eq!(q.next_batch().unwrap(), dispatch(&["css"], RefreshKind::Inject));
        assert_eq!(
            q.next_batch().unwrap(),
            dispatch(&["js", "html"], RefreshKind::Reload)
        );
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_mode_keeps_only_latest_batch() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Cancel, 3);
        q.record(dispatch(&["css"], RefreshKind::Inject));
        q.record(dispatch(&["js"], RefreshKind::Reload));

        assert_eq!(q.len(), 1);
        assert_eq!(q.next_batch().unwrap().tasks, vec!["js"]);
    }

    #[test]
    fn empty_dispatch_is_not_queued() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 1);
        q.record(Dispatch::default());
        assert!(q.is_empty());
    }
}
