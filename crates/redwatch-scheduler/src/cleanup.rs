use crate::error::{AlertError, Result};
use chrono::{DateTime, Duration, Utc};
use redwatch_storage::RecordStore;
use std::sync::Arc;
use tracing::info;

/// 清理统计
#[derive(Debug, Clone)]
pub struct CleanupStats {
    pub cutoff: DateTime<Utc>,
    pub deleted_rows: u64,
    pub execution_time_ms: i64,
    pub executed_at: DateTime<Utc>,
}

/// 告警记录保留期清理
pub struct RetentionCleaner {
    records: Arc<dyn RecordStore>,
    keep_days: u32,
}

impl RetentionCleaner {
    pub fn new(records: Arc<dyn RecordStore>, keep_days: u32) -> Self {
        Self { records, keep_days }
    }

    pub fn keep_days(&self) -> u32 {
        self.keep_days
    }

    /// 早于该时间的记录会被删除；保留天数超出时间范围时返回 None
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(Duration::days(i64::from(self.keep_days)))
    }

    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<CleanupStats> {
        let started = Utc::now();
        let cutoff = self
            .cutoff(now)
            .ok_or(AlertError::RetentionOutOfRange(self.keep_days))?;

        let deleted_rows = self.records.delete_before(cutoff).await?;

        let stats = CleanupStats {
            cutoff,
            deleted_rows,
            execution_time_ms: (Utc::now() - started).num_milliseconds(),
            executed_at: now,
        };

        info!(
            keep_days = self.keep_days,
            cutoff = %cutoff,
            deleted_rows,
            "Alert record cleanup completed"
        );

        Ok(stats)
    }
}
