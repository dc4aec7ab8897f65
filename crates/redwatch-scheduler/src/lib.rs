pub mod cleanup;
pub mod context;
pub mod error;
pub mod pool;
pub mod scheduler;
pub mod services;
pub mod task;

pub use cleanup::{CleanupStats, RetentionCleaner};
pub use context::SchedulerContext;
pub use error::{AlertError, Result};
pub use pool::{PoolError, WorkerPool};
pub use scheduler::{AlertScheduler, AlertSweeper, SweepReport};
pub use services::AlertServices;
pub use task::{ClusterAlertTask, ClusterOutcome, GroupAlertTask, GroupOutcome};
