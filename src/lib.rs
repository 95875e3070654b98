// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod monitors;
pub mod pipeline;
pub mod router;
pub mod scorer;
pub mod signal;
pub mod storage;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::pipeline::{run_radar, PipelinePaths, RunSummary};
pub use crate::router::{QueueRouter, RouteResult};
pub use crate::scorer::SignalScorer;
pub use crate::signal::{
    ActionType, EngagementMetrics, PriorityLevel, QueueEntry, QueueStatus, RubricScores,
    ScoredSignal, Signal, SignalSource,
};
pub use crate::storage::cache::DedupCache;
pub use crate::storage::queue::{QueueName, QueueStats, QueueStore};
