use crate::error::Result;
use crate::seed::Seed;
use crate::store::{
    ChannelStore, ClusterStore, GroupStore, NodeInfoQuery, NodeInfoStore, RecordStore, RuleStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redwatch_types::{AlertChannel, AlertRecord, AlertRule, Cluster, Group, NodeInfo};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 内存存储，实现全部存储接口
pub struct MemoryStore {
    groups: RwLock<Vec<Group>>,
    clusters: RwLock<Vec<Cluster>>,
    rules: RwLock<HashMap<i64, AlertRule>>,
    channels: RwLock<HashMap<i64, AlertChannel>>,
    node_infos: RwLock<Vec<NodeInfo>>,
    records: RwLock<Vec<AlertRecord>>,
    next_record_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(Vec::new()),
            clusters: RwLock::new(Vec::new()),
            rules: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            node_infos: RwLock::new(Vec::new()),
            records: RwLock::new(Vec::new()),
            next_record_id: AtomicI64::new(1),
        }
    }

    /// 从种子数据构建
    pub fn from_seed(seed: Seed) -> Self {
        info!(
            groups = seed.groups.len(),
            clusters = seed.clusters.len(),
            rules = seed.rules.len(),
            channels = seed.channels.len(),
            node_infos = seed.node_infos.len(),
            "Loading seed into memory store"
        );

        Self {
            groups: RwLock::new(seed.groups),
            clusters: RwLock::new(seed.clusters),
            rules: RwLock::new(seed.rules.into_iter().map(|r| (r.rule_id, r)).collect()),
            channels: RwLock::new(
                seed.channels
                    .into_iter()
                    .map(|c| (c.channel_id, c))
                    .collect(),
            ),
            node_infos: RwLock::new(seed.node_infos),
            records: RwLock::new(Vec::new()),
            next_record_id: AtomicI64::new(1),
        }
    }

    pub async fn add_group(&self, group: Group) {
        self.groups.write().await.push(group);
    }

    pub async fn add_cluster(&self, cluster: Cluster) {
        self.clusters.write().await.push(cluster);
    }

    pub async fn add_rule(&self, rule: AlertRule) {
        self.rules.write().await.insert(rule.rule_id, rule);
    }

    pub async fn add_channel(&self, channel: AlertChannel) {
        self.channels.write().await.insert(channel.channel_id, channel);
    }

    pub async fn push_node_info(&self, info: NodeInfo) {
        self.node_infos.write().await.push(info);
    }

    pub async fn rule(&self, rule_id: i64) -> Option<AlertRule> {
        self.rules.read().await.get(&rule_id).cloned()
    }

    pub async fn all_records(&self) -> Vec<AlertRecord> {
        self.records.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.read().await.clone())
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn clusters_by_group(&self, group_id: i64) -> Result<Vec<Cluster>> {
        let clusters = self.clusters.read().await;
        Ok(clusters
            .iter()
            .filter(|c| c.group_id == group_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn rules_by_ids(&self, rule_ids: &[i64]) -> Result<Vec<AlertRule>> {
        let rules = self.rules.read().await;
        Ok(rule_ids
            .iter()
            .filter_map(|id| rules.get(id).cloned())
            .collect())
    }

    async fn update_last_check_time(&self, rule_ids: &[i64], time: DateTime<Utc>) -> Result<()> {
        let mut rules = self.rules.write().await;
        for id in rule_ids {
            if let Some(rule) = rules.get_mut(id) {
                rule.last_check_time = time;
            }
        }
        debug!(rule_ids = ?rule_ids, "Rule last check time updated");
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn channels_by_ids(&self, channel_ids: &[i64]) -> Result<Vec<AlertChannel>> {
        let channels = self.channels.read().await;
        Ok(channel_ids
            .iter()
            .filter_map(|id| channels.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl NodeInfoStore for MemoryStore {
    async fn latest_node_infos(&self, query: &NodeInfoQuery) -> Result<Vec<NodeInfo>> {
        let node_infos = self.node_infos.read().await;

        let mut latest: BTreeMap<&str, &NodeInfo> = BTreeMap::new();
        for info in node_infos.iter().filter(|i| {
            i.cluster_id == query.cluster_id
                && i.data_type == query.data_type
                && i.time_type == query.time_type
        }) {
            let entry = latest.entry(info.node.as_str()).or_insert(info);
            if info.update_time > entry.update_time {
                *entry = info;
            }
        }

        Ok(latest.into_values().cloned().collect())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn add_records(&self, records: &[AlertRecord]) -> Result<usize> {
        let mut stored = self.records.write().await;
        for record in records {
            let mut record = record.clone();
            record.record_id = Some(self.next_record_id.fetch_add(1, Ordering::SeqCst));
            stored.push(record);
        }
        Ok(records.len())
    }

    async fn delete_before(&self, earliest: DateTime<Utc>) -> Result<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.update_time >= earliest);
        Ok((before - records.len()) as u64)
    }

    async fn delete_by_ids(&self, record_ids: &[i64]) -> Result<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.record_id.is_some_and(|id| record_ids.contains(&id)));
        Ok((before - records.len()) as u64)
    }

    async fn records_by_cluster(&self, cluster_id: i64) -> Result<Vec<AlertRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.cluster_id == cluster_id)
            .cloned()
            .collect())
    }
}
