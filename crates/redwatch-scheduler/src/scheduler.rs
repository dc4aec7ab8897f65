use crate::cleanup::{CleanupStats, RetentionCleaner};
use crate::context::SchedulerContext;
use crate::error::AlertError;
use crate::services::AlertServices;
use crate::task::GroupAlertTask;
use chrono::{DateTime, Utc};
use redwatch_alert::RuleEvaluator;
use redwatch_config::AlertConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

/// 一轮告警评估的汇总
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub groups: usize,
    pub submitted: usize,
    /// 工作池饱和或已关闭而未执行的分组
    pub rejected: Vec<i64>,
    pub succeeded: usize,
    pub failed: Vec<(i64, String)>,
    pub records: usize,
    /// 分组列表加载失败
    pub error: Option<String>,
}

/// 执行评估与清理，可在定时任务之间共享
#[derive(Clone)]
pub struct AlertSweeper {
    services: AlertServices,
    context: Arc<SchedulerContext>,
    evaluator: RuleEvaluator,
    cleaner: Arc<RetentionCleaner>,
    task_timeout: Duration,
}

impl AlertSweeper {
    pub fn new(services: AlertServices, context: Arc<SchedulerContext>, config: &AlertConfig) -> Self {
        let cleaner = Arc::new(RetentionCleaner::new(
            services.records.clone(),
            config.data_keep_days,
        ));
        Self {
            services,
            context,
            evaluator: RuleEvaluator::new(config.equality_basis),
            cleaner,
            task_timeout: config.task_timeout(),
        }
    }

    pub async fn collect(&self) -> SweepReport {
        self.collect_at(Utc::now()).await
    }

    /// 每个分组提交一个任务，汇总所有结果
    pub async fn collect_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        let groups = match self.services.groups.list_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                error!(error = %e, "Failed to list groups");
                report.error = Some(e.to_string());
                return report;
            }
        };
        report.groups = groups.len();

        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let group_id = group.group_id;
            let task = GroupAlertTask::new(group, self.services.clone(), self.evaluator)
                .with_timeout(self.task_timeout);

            let submitted = self.context.pool().try_submit(task.run(now));

            match submitted {
                Ok(handle) => {
                    report.submitted += 1;
                    handles.push((group_id, handle));
                }
                Err(e) => {
                    error!(group_id, error = %e, "Group alert task rejected");
                    report.rejected.push(group_id);
                }
            }
        }

        for (group_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(AlertError::Aborted(e.to_string())),
            };

            match result {
                Ok(outcome) => {
                    debug!(
                        group_id,
                        clusters = outcome.clusters,
                        records = outcome.records,
                        failed_clusters = outcome.failed_clusters.len(),
                        "Group alert task finished"
                    );
                    report.succeeded += 1;
                    report.records += outcome.records;
                }
                Err(e) => {
                    error!(group_id, error = %e, "Group alert task failed");
                    report.failed.push((group_id, e.to_string()));
                }
            }
        }

        info!(
            groups = report.groups,
            submitted = report.submitted,
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            records = report.records,
            "Alert sweep completed"
        );

        report
    }

    /// 清理失败只记录日志
    pub async fn cleanup(&self) -> Option<CleanupStats> {
        match self.cleaner.cleanup(Utc::now()).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!(error = %e, "Alert record cleanup failed");
                None
            }
        }
    }
}

/// 告警调度器
///
/// 评估与清理各自按 Cron 触发，表达式为空则不启用。
pub struct AlertScheduler {
    sweeper: AlertSweeper,
    collect_cron: String,
    cleanup_cron: String,
    jobs: Option<JobScheduler>,
    job_ids: Vec<uuid::Uuid>,
}

impl AlertScheduler {
    pub fn new(services: AlertServices, context: Arc<SchedulerContext>, config: &AlertConfig) -> Self {
        Self {
            sweeper: AlertSweeper::new(services, context, config),
            collect_cron: config.collect_cron.trim().to_string(),
            cleanup_cron: config.cleanup_cron.trim().to_string(),
            jobs: None,
            job_ids: Vec::new(),
        }
    }

    pub fn sweeper(&self) -> &AlertSweeper {
        &self.sweeper
    }

    pub async fn collect(&self) -> SweepReport {
        self.sweeper.collect().await
    }

    pub async fn cleanup(&self) -> Option<CleanupStats> {
        self.sweeper.cleanup().await
    }

    /// 已注册的定时任务数
    pub fn job_count(&self) -> usize {
        self.job_ids.len()
    }

    /// 注册定时任务并启动
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let scheduler = JobScheduler::new().await?;

        if self.collect_cron.is_empty() {
            warn!("Alert collect cron is empty, alert sweep disabled");
        } else {
            let sweeper = self.sweeper.clone();
            let job = Job::new_async(self.collect_cron.as_str(), move |_uuid, _l| {
                let sweeper = sweeper.clone();
                Box::pin(async move {
                    sweeper.collect().await;
                })
            })?;
            let job_id = scheduler.add(job).await?;
            info!(cron = %self.collect_cron, job_id = %job_id, "Alert sweep scheduled");
            self.job_ids.push(job_id);
        }

        if self.cleanup_cron.is_empty() {
            warn!("Alert cleanup cron is empty, record cleanup disabled");
        } else {
            let sweeper = self.sweeper.clone();
            let job = Job::new_async(self.cleanup_cron.as_str(), move |_uuid, _l| {
                let sweeper = sweeper.clone();
                Box::pin(async move {
                    sweeper.cleanup().await;
                })
            })?;
            let job_id = scheduler.add(job).await?;
            info!(cron = %self.cleanup_cron, job_id = %job_id, "Record cleanup scheduled");
            self.job_ids.push(job_id);
        }

        scheduler.start().await?;
        self.jobs = Some(scheduler);
        info!("Alert scheduler started");
        Ok(())
    }

    /// 停止定时触发，在途任务由 `SchedulerContext::shutdown` 排空
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(mut scheduler) = self.jobs.take() {
            scheduler.shutdown().await?;
            self.job_ids.clear();
            info!("Alert scheduler stopped");
        }
        Ok(())
    }
}
