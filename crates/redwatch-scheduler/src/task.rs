//! 集群级与分组级告警任务

use crate::error::{AlertError, Result};
use crate::services::AlertServices;
use chrono::{DateTime, Utc};
use redwatch_alert::{AlertRecordBuilder, PreparedRule, RuleEvaluator};
use redwatch_notify::{ChannelClassifier, DispatchReport};
use redwatch_storage::NodeInfoQuery;
use redwatch_types::{AlertRecord, Cluster, Group};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// 单个集群一轮评估的结果
#[derive(Debug, Clone, Default)]
pub struct ClusterOutcome {
    /// 需要持久化检测时间的规则
    pub checkpoint_rule_ids: Vec<i64>,
    pub records: Vec<AlertRecord>,
    /// 未分发时为 None（没有记录或没有配置通道）
    pub dispatch: Option<DispatchReport>,
    /// 记录写入失败的原因，检测时间仍需推进
    pub persist_error: Option<String>,
}

/// 集群告警任务：评估、分发、持久化
pub struct ClusterAlertTask<'a> {
    services: &'a AlertServices,
    evaluator: RuleEvaluator,
}

impl<'a> ClusterAlertTask<'a> {
    pub fn new(services: &'a AlertServices, evaluator: RuleEvaluator) -> Self {
        Self {
            services,
            evaluator,
        }
    }

    pub async fn run(
        &self,
        group: &Group,
        cluster: &Cluster,
        now: DateTime<Utc>,
    ) -> Result<ClusterOutcome> {
        let mut rule_ids = cluster.rule_id_list();
        if rule_ids.is_empty() {
            debug!(cluster_id = cluster.cluster_id, "Cluster has no alert rules, skipping");
            return Ok(ClusterOutcome::default());
        }
        dedup_in_order(&mut rule_ids);

        let rules = self.services.rules.rules_by_ids(&rule_ids).await?;
        let mut rules = PreparedRule::prepare_all(rules);
        let nodes = self
            .services
            .node_infos
            .latest_node_infos(&NodeInfoQuery::latest_minute(cluster.cluster_id))
            .await?;

        let mut outcome = ClusterOutcome::default();

        // 规则优先、节点其次；命中后立即刷新该规则的检测时间
        for rule in rules.iter_mut() {
            for node in &nodes {
                let Some(observed) = self.evaluator.evaluate(node, rule, now) else {
                    continue;
                };

                debug!(
                    cluster_id = cluster.cluster_id,
                    rule_id = rule.rule_id(),
                    node = %node.node,
                    observed,
                    "Alert rule matched"
                );
                outcome.records.push(AlertRecordBuilder::build(
                    group, cluster, node, &rule.rule, observed, now,
                ));
                if !outcome.checkpoint_rule_ids.contains(&rule.rule_id()) {
                    outcome.checkpoint_rule_ids.push(rule.rule_id());
                }
                rule.mark_checked(now);
            }
        }

        if outcome.records.is_empty() {
            return Ok(outcome);
        }

        outcome.dispatch = self.notify(cluster, &outcome.records).await;

        // 通知已发出，写入失败也要返回待更新的规则，避免下一轮重复告警
        match self.services.records.add_records(&outcome.records).await {
            Ok(written) => info!(
                group_id = group.group_id,
                cluster_id = cluster.cluster_id,
                records = written,
                "Alert records saved"
            ),
            Err(e) => {
                error!(
                    group_id = group.group_id,
                    cluster_id = cluster.cluster_id,
                    records = outcome.records.len(),
                    error = %e,
                    "Failed to save alert records"
                );
                outcome.persist_error = Some(e.to_string());
            }
        }

        Ok(outcome)
    }

    /// 通道解析失败只影响通知，不影响记录持久化
    async fn notify(&self, cluster: &Cluster, records: &[AlertRecord]) -> Option<DispatchReport> {
        let channel_ids = cluster.channel_id_list();
        if channel_ids.is_empty() {
            debug!(cluster_id = cluster.cluster_id, "Cluster has no alert channels");
            return None;
        }

        let channels = match self.services.channels.channels_by_ids(&channel_ids).await {
            Ok(channels) => channels,
            Err(e) => {
                warn!(
                    cluster_id = cluster.cluster_id,
                    error = %e,
                    "Failed to load alert channels, notification skipped"
                );
                return None;
            }
        };

        let classification = ChannelClassifier::classify(channels);
        if classification.is_empty() {
            return None;
        }

        Some(self.services.dispatcher.dispatch(&classification, records).await)
    }
}

fn dedup_in_order(ids: &mut Vec<i64>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

/// 单个分组一轮评估的结果
#[derive(Debug, Clone, Default)]
pub struct GroupOutcome {
    pub group_id: i64,
    pub clusters: usize,
    /// 处理失败的集群，不影响同组其它集群
    pub failed_clusters: Vec<i64>,
    pub records: usize,
    /// 记录写入失败的集群
    pub unsaved_clusters: Vec<i64>,
    pub checkpointed: Vec<i64>,
    /// 检测时间更新失败的原因
    pub checkpoint_error: Option<String>,
}

/// 分组告警任务，组内集群按列表顺序串行处理
///
/// 设置了超时时，到期后不再处理剩余集群，已完成集群的检测时间照常更新，
/// 然后返回 `AlertError::Timeout`。
pub struct GroupAlertTask {
    group: Group,
    services: AlertServices,
    evaluator: RuleEvaluator,
    timeout: Option<Duration>,
}

impl GroupAlertTask {
    pub fn new(group: Group, services: AlertServices, evaluator: RuleEvaluator) -> Self {
        Self {
            group,
            services,
            evaluator,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn group_id(&self) -> i64 {
        self.group.group_id
    }

    pub async fn run(self, now: DateTime<Utc>) -> Result<GroupOutcome> {
        let group = &self.group;
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let timed_out = || AlertError::Timeout(self.timeout.unwrap_or_default());

        let clusters = within(deadline, self.services.clusters.clusters_by_group(group.group_id))
            .await
            .ok_or_else(timed_out)??;

        let mut outcome = GroupOutcome {
            group_id: group.group_id,
            clusters: clusters.len(),
            ..Default::default()
        };

        let task = ClusterAlertTask::new(&self.services, self.evaluator);
        let mut expired = false;
        for cluster in &clusters {
            let Some(result) = within(deadline, task.run(group, cluster, now)).await else {
                warn!(
                    group_id = group.group_id,
                    cluster_id = cluster.cluster_id,
                    "Group alert task deadline reached, remaining clusters skipped"
                );
                expired = true;
                break;
            };

            match result {
                Ok(cluster_outcome) => {
                    outcome.records += cluster_outcome.records.len();
                    if cluster_outcome.persist_error.is_some() {
                        outcome.unsaved_clusters.push(cluster.cluster_id);
                    }
                    outcome
                        .checkpointed
                        .extend(cluster_outcome.checkpoint_rule_ids);
                }
                Err(e) => {
                    error!(
                        group_id = group.group_id,
                        cluster_id = cluster.cluster_id,
                        error = %e,
                        "Cluster alert task failed"
                    );
                    outcome.failed_clusters.push(cluster.cluster_id);
                }
            }
        }

        if !outcome.checkpointed.is_empty() {
            if let Err(e) = self
                .services
                .rules
                .update_last_check_time(&outcome.checkpointed, now)
                .await
            {
                warn!(
                    group_id = group.group_id,
                    rule_ids = ?outcome.checkpointed,
                    error = %e,
                    "Failed to update rule last check time"
                );
                outcome.checkpoint_error = Some(e.to_string());
            }
        }

        if expired {
            return Err(timed_out());
        }

        Ok(outcome)
    }
}

/// 截止时间前完成返回 Some，否则返回 None
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use redwatch_notify::NotificationDispatcher;
    use redwatch_storage::{MemoryStore, NodeInfoStore, RecordStore, RuleStore, StoreError};
    use redwatch_types::{AlertRule, CompareOp, MetricKey, NodeInfo};
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    /// 指定集群的快照查询一直挂起
    struct HangingNodeInfos {
        inner: Arc<MemoryStore>,
        hang_cluster: i64,
    }

    #[async_trait]
    impl NodeInfoStore for HangingNodeInfos {
        async fn latest_node_infos(
            &self,
            query: &NodeInfoQuery,
        ) -> redwatch_storage::Result<Vec<NodeInfo>> {
            if query.cluster_id == self.hang_cluster {
                tokio::time::sleep(StdDuration::from_secs(3600)).await;
            }
            self.inner.latest_node_infos(query).await
        }
    }

    /// 写入记录总是失败
    struct FailingRecords {
        inner: Arc<MemoryStore>,
    }

    #[async_trait]
    impl RecordStore for FailingRecords {
        async fn add_records(&self, _records: &[AlertRecord]) -> redwatch_storage::Result<usize> {
            Err(StoreError::unavailable("record store down"))
        }

        async fn delete_before(&self, earliest: DateTime<Utc>) -> redwatch_storage::Result<u64> {
            self.inner.delete_before(earliest).await
        }

        async fn delete_by_ids(&self, record_ids: &[i64]) -> redwatch_storage::Result<u64> {
            self.inner.delete_by_ids(record_ids).await
        }

        async fn records_by_cluster(
            &self,
            cluster_id: i64,
        ) -> redwatch_storage::Result<Vec<AlertRecord>> {
            self.inner.records_by_cluster(cluster_id).await
        }
    }

    struct FailingNodeInfos {
        inner: Arc<MemoryStore>,
        fail_cluster: i64,
    }

    #[async_trait]
    impl NodeInfoStore for FailingNodeInfos {
        async fn latest_node_infos(
            &self,
            query: &NodeInfoQuery,
        ) -> redwatch_storage::Result<Vec<NodeInfo>> {
            if query.cluster_id == self.fail_cluster {
                return Err(StoreError::unavailable("metric store down"));
            }
            self.inner.latest_node_infos(query).await
        }
    }

    struct FailingCheckpoint {
        inner: Arc<MemoryStore>,
    }

    #[async_trait]
    impl RuleStore for FailingCheckpoint {
        async fn rules_by_ids(&self, rule_ids: &[i64]) -> redwatch_storage::Result<Vec<AlertRule>> {
            self.inner.rules_by_ids(rule_ids).await
        }

        async fn update_last_check_time(
            &self,
            _rule_ids: &[i64],
            _time: DateTime<Utc>,
        ) -> redwatch_storage::Result<()> {
            Err(StoreError::unavailable("rule store down"))
        }
    }

    fn services(store: &Arc<MemoryStore>) -> AlertServices {
        AlertServices::from_store(store.clone(), Arc::new(NotificationDispatcher::new()))
    }

    async fn seeded(now: DateTime<Utc>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_group(Group::new(1, "prod")).await;
        store
            .add_cluster(Cluster::new(10, 1, "cache-a").with_rule_ids("3"))
            .await;
        store
            .add_cluster(Cluster::new(11, 1, "cache-b").with_rule_ids("4"))
            .await;
        store
            .add_rule(
                AlertRule::new(3, "usedMemory", CompareOp::Greater, 100.0)
                    .with_last_check_time(now - Duration::minutes(6)),
            )
            .await;
        store
            .add_rule(
                AlertRule::new(4, "connected_clients", CompareOp::Less, 10.0)
                    .with_last_check_time(now - Duration::minutes(6)),
            )
            .await;
        store
            .push_node_info(NodeInfo::new("10.0.0.1:6379", 10).with_metric(MetricKey::UsedMemory, 50.0))
            .await;
        store
            .push_node_info(
                NodeInfo::new("10.0.0.2:6379", 11).with_metric(MetricKey::ConnectedClients, 20.0),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_empty_rule_ids_is_noop() {
        let now = Utc::now();
        let store = seeded(now).await;
        let services = services(&store);
        let cluster = Cluster::new(12, 1, "empty").with_rule_ids(" , ");

        let outcome = ClusterAlertTask::new(&services, RuleEvaluator::default())
            .run(&Group::new(1, "prod"), &cluster, now)
            .await
            .unwrap();

        assert!(outcome.records.is_empty());
        assert!(outcome.checkpoint_rule_ids.is_empty());
        assert!(store.all_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_matched_rule_throttles_later_nodes() {
        let now = Utc::now();
        let store = seeded(now).await;
        store
            .push_node_info(NodeInfo::new("10.0.0.3:6379", 10).with_metric(MetricKey::UsedMemory, 60.0))
            .await;
        let services = services(&store);
        let cluster = Cluster::new(10, 1, "cache-a").with_rule_ids("3,3");

        let outcome = ClusterAlertTask::new(&services, RuleEvaluator::default())
            .run(&Group::new(1, "prod"), &cluster, now)
            .await
            .unwrap();

        // 第一个节点命中后规则进入新周期，第二个节点不再命中
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].redis_node, "10.0.0.1:6379");
        assert_eq!(outcome.checkpoint_rule_ids, vec![3]);
        assert!(outcome.dispatch.is_none());
        assert_eq!(store.all_records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_cycle_matches_every_node() {
        let now = Utc::now();
        let store = seeded(now).await;
        store
            .add_rule(AlertRule::new(5, "used_memory", CompareOp::Greater, 100.0).with_check_cycle(0))
            .await;
        store
            .push_node_info(NodeInfo::new("10.0.0.3:6379", 10).with_metric(MetricKey::UsedMemory, 60.0))
            .await;
        let services = services(&store);
        let cluster = Cluster::new(10, 1, "cache-a").with_rule_ids("5");

        let outcome = ClusterAlertTask::new(&services, RuleEvaluator::default())
            .run(&Group::new(1, "prod"), &cluster, now)
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.checkpoint_rule_ids, vec![5]);
    }

    #[tokio::test]
    async fn test_group_task_checkpoints_matched_rules() {
        let now = Utc::now();
        let store = seeded(now).await;

        let outcome = GroupAlertTask::new(Group::new(1, "prod"), services(&store), RuleEvaluator::default())
            .run(now)
            .await
            .unwrap();

        assert_eq!(outcome.clusters, 2);
        assert_eq!(outcome.records, 2);
        assert_eq!(outcome.checkpointed, vec![3, 4]);
        assert!(outcome.failed_clusters.is_empty());
        assert_eq!(store.rule(3).await.unwrap().last_check_time, now);
        assert_eq!(store.rule(4).await.unwrap().last_check_time, now);
    }

    #[tokio::test]
    async fn test_cluster_failure_does_not_stop_siblings() {
        let now = Utc::now();
        let store = seeded(now).await;
        let mut services = services(&store);
        services.node_infos = Arc::new(FailingNodeInfos {
            inner: store.clone(),
            fail_cluster: 10,
        });

        let outcome = GroupAlertTask::new(Group::new(1, "prod"), services, RuleEvaluator::default())
            .run(now)
            .await
            .unwrap();

        assert_eq!(outcome.failed_clusters, vec![10]);
        assert_eq!(outcome.checkpointed, vec![4]);
        assert_eq!(store.records_by_cluster(11).await.unwrap().len(), 1);
        assert!(store.records_by_cluster(10).await.unwrap().is_empty());
        assert_ne!(store.rule(3).await.unwrap().last_check_time, now);
    }

    #[tokio::test]
    async fn test_checkpoint_failure_is_reported() {
        let now = Utc::now();
        let store = seeded(now).await;
        let mut services = services(&store);
        services.rules = Arc::new(FailingCheckpoint {
            inner: store.clone(),
        });

        let outcome = GroupAlertTask::new(Group::new(1, "prod"), services, RuleEvaluator::default())
            .run(now)
            .await
            .unwrap();

        assert!(outcome.checkpoint_error.is_some());
        // 记录仍然写入
        assert_eq!(store.all_records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_save_failure_still_checkpoints_rules() {
        let now = Utc::now();
        let store = seeded(now).await;
        let mut services = services(&store);
        services.records = Arc::new(FailingRecords {
            inner: store.clone(),
        });

        let outcome = GroupAlertTask::new(Group::new(1, "prod"), services, RuleEvaluator::default())
            .run(now)
            .await
            .unwrap();

        assert!(outcome.failed_clusters.is_empty());
        assert_eq!(outcome.unsaved_clusters, vec![10, 11]);
        assert_eq!(outcome.checkpointed, vec![3, 4]);
        assert_eq!(store.rule(3).await.unwrap().last_check_time, now);
        assert_eq!(store.rule(4).await.unwrap().last_check_time, now);
        assert!(store.all_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_deadline_keeps_checkpoints_of_finished_clusters() {
        let now = Utc::now();
        let store = seeded(now).await;
        let mut services = services(&store);
        services.node_infos = Arc::new(HangingNodeInfos {
            inner: store.clone(),
            hang_cluster: 11,
        });

        let result = GroupAlertTask::new(Group::new(1, "prod"), services, RuleEvaluator::default())
            .with_timeout(StdDuration::from_millis(200))
            .run(now)
            .await;

        assert!(matches!(result, Err(AlertError::Timeout(_))));
        // 第一个集群已完成：记录已写入，检测时间已推进
        assert_eq!(store.records_by_cluster(10).await.unwrap().len(), 1);
        assert_eq!(store.rule(3).await.unwrap().last_check_time, now);
        assert_ne!(store.rule(4).await.unwrap().last_check_time, now);
    }
}
