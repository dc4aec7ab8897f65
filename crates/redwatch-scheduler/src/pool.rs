//! 有界工作池
//!
//! 提交时必须立即拿到空闲槽位，否则直接拒绝，不做排队。

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// 所有工作槽位都被占用
    #[error("Worker pool saturated ({max_workers} workers busy)")]
    Saturated { max_workers: usize },

    #[error("Worker pool is closed")]
    Closed,
}

pub struct WorkerPool {
    max_workers: usize,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
    rejected: AtomicU64,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            permits: Arc::new(Semaphore::new(max_workers)),
            closed: AtomicBool::new(false),
            rejected: AtomicU64::new(0),
        }
    }

    /// 尝试提交任务，没有空闲槽位时返回 `PoolError::Saturated`
    pub fn try_submit<F, T>(&self, task: F) -> Result<JoinHandle<T>, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                let rejected = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    max_workers = self.max_workers,
                    rejected_total = rejected,
                    "Worker pool saturated, task rejected"
                );
                return Err(PoolError::Saturated {
                    max_workers: self.max_workers,
                });
            }
            Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
        };

        Ok(tokio::spawn(async move {
            let _permit = permit;
            task.await
        }))
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// 正在执行的任务数
    pub fn in_flight(&self) -> usize {
        self.max_workers - self.permits.available_permits()
    }

    /// 累计拒绝次数
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 停止接收新任务，已提交的任务继续执行
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(in_flight = self.in_flight(), "Worker pool closed");
        }
    }

    /// 关闭并等待在途任务结束，超时返回 false
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.close();

        let all = self.max_workers as u32;
        match tokio::time::timeout(timeout, self.permits.acquire_many(all)).await {
            Ok(Ok(permits)) => {
                permits.forget();
                self.permits.close();
                true
            }
            Ok(Err(_)) => true,
            Err(_) => {
                warn!(
                    in_flight = self.in_flight(),
                    timeout_secs = timeout.as_secs(),
                    "Worker pool drain timed out"
                );
                self.permits.close();
                false
            }
        }
    }
}
