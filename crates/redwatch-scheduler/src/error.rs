use crate::pool::PoolError;
use redwatch_storage::StoreError;
use std::time::Duration;
use thiserror::Error;

/// 告警任务错误类型
#[derive(Error, Debug)]
pub enum AlertError {
    /// 存储访问失败
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// 工作池拒绝提交
    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// 分组任务超时
    #[error("Group task timed out after {0:?}")]
    Timeout(Duration),

    /// 保留天数超出可表示的时间范围
    #[error("Retention of {0} days is out of range")]
    RetentionOutOfRange(u32),

    /// 任务异常退出
    #[error("Task aborted: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, AlertError>;
