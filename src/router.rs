//! router.rs — maps scored signals onto durable queues.
//!
//! Pure delegation: the destination comes from the score alone, through the
//! same threshold ladder the scorer classified with, so the queue name and
//! the `action` field always agree.

use anyhow::Result;

use crate::signal::{ActionType, ScoredSignal};
use crate::storage::queue::{QueueName, QueueStore};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub signal_id: String,
    pub queue: QueueName,
    pub action: ActionType,
    pub score: f64,
}

pub struct QueueRouter<'a> {
    store: &'a QueueStore,
}

impl<'a> QueueRouter<'a> {
    pub fn new(store: &'a QueueStore) -> Self {
        Self { store }
    }

    pub fn route(&self, signal: ScoredSignal) -> Result<RouteResult> {
        let signal_id = signal.signal.id.clone();
        let action = signal.action;
        let score = signal.total_score;
        let queue = self.store.enqueue(signal)?;
        Ok(RouteResult {
            signal_id,
            queue,
            action,
            score,
        })
    }

    pub fn route_batch(&self, signals: Vec<ScoredSignal>) -> Result<Vec<RouteResult>> {
        signals.into_iter().map(|s| self.route(s)).collect()
    }
}
