use crate::classifier::ChannelClassification;
use crate::notifier::Notifier;
use redwatch_types::{AlertRecord, ChannelType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 一次分发的结果
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// 全部通道投递成功（或无需投递）的通道类型
    pub delivered: Vec<ChannelType>,
    /// 通知器正常返回，但部分通道投递失败
    pub partial: Vec<(ChannelType, String)>,
    /// 返回错误或异常退出的通道类型
    pub failed: Vec<(ChannelType, String)>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.partial.is_empty() && self.failed.is_empty()
    }
}

/// 通知分发器
///
/// 每种已知通道类型调用一次对应的通知器，各通知器相互独立。
pub struct NotificationDispatcher {
    notifiers: Arc<RwLock<HashMap<ChannelType, Arc<dyn Notifier>>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 注册通知器，同类型的旧通知器会被替换
    pub async fn register(&self, notifier: Arc<dyn Notifier>) {
        let mut notifiers = self.notifiers.write().await;
        info!(
            channel_type = %notifier.channel_type(),
            "Registered notifier: {}",
            notifier.name()
        );
        notifiers.insert(notifier.channel_type(), notifier);
    }

    pub async fn notifier_count(&self) -> usize {
        self.notifiers.read().await.len()
    }

    /// 向所有通道类型分发同一批记录
    ///
    /// 没有配置通道的类型也会被调用（通道列表为空）。
    pub async fn dispatch(
        &self,
        channels: &ChannelClassification,
        records: &[AlertRecord],
    ) -> DispatchReport {
        let records: Arc<Vec<AlertRecord>> = Arc::new(records.to_vec());
        let notifiers = self.notifiers.read().await;

        let mut handles = Vec::with_capacity(ChannelType::ALL.len());
        for channel_type in ChannelType::ALL {
            let Some(notifier) = notifiers.get(&channel_type) else {
                debug!(channel_type = %channel_type, "No notifier registered, skipping");
                continue;
            };
            if !notifier.is_enabled() {
                debug!(channel_type = %channel_type, "Notifier disabled, skipping");
                continue;
            }

            let notifier = notifier.clone();
            let targets = channels.get(channel_type).to_vec();
            let records = records.clone();
            let handle =
                tokio::spawn(async move { notifier.notify(&targets, &records).await });
            handles.push((channel_type, handle));
        }
        drop(notifiers);

        let mut report = DispatchReport::default();
        for (channel_type, handle) in handles {
            match handle.await {
                Ok(Ok(result)) => {
                    if result.success {
                        debug!(
                            channel_type = %channel_type,
                            delivered = result.delivered,
                            "Notification dispatched"
                        );
                        report.delivered.push(channel_type);
                    } else {
                        warn!(
                            channel_type = %channel_type,
                            delivered = result.delivered,
                            failed = result.failed,
                            "Notification partially failed: {}",
                            result.message
                        );
                        report.partial.push((channel_type, result.message));
                    }
                }
                Ok(Err(e)) => {
                    error!(channel_type = %channel_type, error = %e, "Notification error");
                    report.failed.push((channel_type, e.to_string()));
                }
                Err(e) => {
                    error!(channel_type = %channel_type, error = %e, "Notifier task aborted");
                    report.failed.push((channel_type, e.to_string()));
                }
            }
        }

        report
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
