use crate::pool::WorkerPool;
use redwatch_config::PoolConfig;
use std::time::Duration;
use tracing::info;

/// 调度上下文
///
/// 进程启动时创建，持有工作池；进程退出前调用 `shutdown` 排空在途任务。
pub struct SchedulerContext {
    pool: WorkerPool,
}

impl SchedulerContext {
    pub fn new(max_workers: usize) -> Self {
        info!(max_workers, "Scheduler context created");
        Self {
            pool: WorkerPool::new(max_workers),
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.max_workers)
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// 关闭工作池并等待在途任务，返回是否在超时前排空
    pub async fn shutdown(&self, drain_timeout: Duration) -> bool {
        info!(
            in_flight = self.pool.in_flight(),
            "Shutting down scheduler context"
        );
        let drained = self.pool.drain(drain_timeout).await;
        if drained {
            info!("Scheduler context drained");
        }
        drained
    }
}
