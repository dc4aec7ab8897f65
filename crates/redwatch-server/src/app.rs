use crate::signal::SignalHandler;
use anyhow::Result;
use redwatch_config::AppConfig;
use redwatch_notify::{
    DingTalkWebhookNotifier, EmailNotifier, NotificationDispatcher, WeChatAppNotifier,
    WeChatWebhookNotifier,
};
use redwatch_scheduler::{AlertScheduler, AlertServices, CleanupStats, SchedulerContext, SweepReport};
use redwatch_storage::{MemoryStore, Seed};
use std::sync::Arc;
use tracing::{info, warn};

/// 告警服务
pub struct App {
    config: AppConfig,
    store: Arc<MemoryStore>,
    context: Arc<SchedulerContext>,
    scheduler: AlertScheduler,
}

impl App {
    pub async fn build(config: AppConfig) -> Result<Self> {
        let store = match &config.seed.path {
            Some(path) => {
                info!(path = %path.display(), "Loading seed data");
                Arc::new(MemoryStore::from_seed(Seed::load(path)?))
            }
            None => {
                warn!("No seed configured, starting with empty stores");
                Arc::new(MemoryStore::new())
            }
        };

        let dispatcher = Arc::new(build_dispatcher().await);
        let services = AlertServices::from_store(store.clone(), dispatcher);
        let context = Arc::new(SchedulerContext::from_config(&config.pool));
        let scheduler = AlertScheduler::new(services, context.clone(), &config.alert);

        Ok(Self {
            config,
            store,
            context,
            scheduler,
        })
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// 执行一轮评估和清理
    pub async fn run_once(&self) -> (SweepReport, Option<CleanupStats>) {
        let report = self.scheduler.collect().await;
        let cleanup = self.scheduler.cleanup().await;
        (report, cleanup)
    }

    /// 启动定时任务，收到关闭信号后停止并排空工作池
    pub async fn run(mut self, signals: &SignalHandler) -> Result<()> {
        self.scheduler.start().await?;
        info!("redwatch is running");

        let signal = signals.wait().await?;
        info!(signal = ?signal, "Shutting down");

        self.scheduler.stop().await?;
        let drained = self
            .context
            .shutdown(self.config.pool.drain_timeout())
            .await;
        if !drained {
            warn!("Some alert tasks were still running at shutdown");
        }

        info!("redwatch stopped");
        Ok(())
    }
}

/// 注册全部通道类型的通知器
pub async fn build_dispatcher() -> NotificationDispatcher {
    let dispatcher = NotificationDispatcher::new();
    dispatcher.register(Arc::new(EmailNotifier::new())).await;
    dispatcher.register(Arc::new(WeChatWebhookNotifier::new())).await;
    dispatcher.register(Arc::new(DingTalkWebhookNotifier::new())).await;
    dispatcher.register(Arc::new(WeChatAppNotifier::new())).await;
    dispatcher
}
