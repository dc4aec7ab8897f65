use anyhow::Result;
use async_trait::async_trait;
use redwatch_types::{AlertChannel, AlertRecord, ChannelType};

/// 通知结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyResult {
    pub success: bool,
    pub message: String,
    /// 投递成功的通道数
    pub delivered: usize,
    /// 投递失败的通道数
    pub failed: usize,
}

impl NotifyResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: "Notification sent successfully".to_string(),
            delivered: 0,
            failed: 0,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            delivered: 0,
            failed: 0,
        }
    }

    /// 没有通道或没有记录时不发送
    pub fn skipped() -> Self {
        Self {
            success: true,
            message: "Nothing to send".to_string(),
            delivered: 0,
            failed: 0,
        }
    }

    pub fn from_counts(delivered: usize, failed: usize) -> Self {
        let success = failed == 0;
        let message = if success {
            format!("Delivered to {} channel(s)", delivered)
        } else {
            format!("Delivered to {} channel(s), {} failed", delivered, failed)
        };
        Self {
            success,
            message,
            delivered,
            failed,
        }
    }
}

/// 通知器 trait，每种通道类型一个实现
///
/// 通道列表或记录列表为空时必须直接返回成功。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 向同一类型的全部通道发送这一批告警记录
    async fn notify(&self, channels: &[AlertChannel], records: &[AlertRecord]) -> Result<NotifyResult>;

    /// 通知器名称
    fn name(&self) -> &str;

    /// 负责的通道类型
    fn channel_type(&self) -> ChannelType;

    /// 是否启用
    fn is_enabled(&self) -> bool {
        true
    }
}
